//! 테스트 공용 도우미

use std::sync::Arc;

use axum::response::Response;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use wsg_core::auth::{ApiKey, ApiKeyToken, LoginType, OAuthConfigs};
use wsg_core::id::{
    ProvisionerJobId, TemplateId, UserId, WorkspaceAgentId, WorkspaceBuildId, WorkspaceId,
    WorkspaceResourceId,
};
use wsg_core::model::{
    ProvisionerJob, ProvisionerJobType, User, Workspace, WorkspaceAgent, WorkspaceBuild,
    WorkspaceResource, WorkspaceTransition,
};
use wsg_core::store::{MemoryStore, Store};

use crate::config::Config;
use crate::state::AppState;

pub fn test_state(store: Arc<MemoryStore>, config: Config) -> Arc<AppState> {
    Arc::new(AppState::new(config, store, OAuthConfigs::new()))
}

pub fn user(name: &str) -> User {
    User {
        id: UserId::new(),
        username: name.to_string(),
        email: format!("{}@example.com", name),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// 사용자와 유효한 비밀번호 세션 생성
pub async fn seed_session(store: &MemoryStore, username: &str) -> (String, User) {
    let user = user(username);
    store.insert_user(&user).await.unwrap();

    let token = ApiKeyToken::generate();
    store
        .insert_api_key(&ApiKey {
            id: token.key_id.clone(),
            hashed_secret: token.hashed_secret(),
            user_id: user.id,
            login_type: LoginType::Password,
            expires_at: Utc::now() + Duration::days(1),
            last_used: Utc::now(),
            ip_address: None,
            lifetime_seconds: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .await
        .unwrap();

    (token.to_string(), user)
}

/// 워크스페이스 + 빌드 + Job + 리소스별 에이전트 생성
pub async fn seed_workspace(
    store: &MemoryStore,
    owner: &User,
    name: &str,
    resources: &[(&str, &[&str])],
) -> Workspace {
    let workspace = Workspace {
        id: WorkspaceId::new(),
        owner_id: owner.id,
        template_id: TemplateId::new(),
        name: name.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        deleted: false,
    };
    store.insert_workspace(&workspace).await.unwrap();

    let job = ProvisionerJob {
        id: ProvisionerJobId::new(),
        job_type: ProvisionerJobType::WorkspaceBuild,
        created_at: Utc::now(),
    };
    store.insert_provisioner_job(&job).await.unwrap();
    store
        .insert_workspace_build(&WorkspaceBuild {
            id: WorkspaceBuildId::new(),
            workspace_id: workspace.id,
            job_id: job.id,
            build_number: 1,
            transition: WorkspaceTransition::Start,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    for (resource_name, agents) in resources {
        let resource = WorkspaceResource {
            id: WorkspaceResourceId::new(),
            job_id: job.id,
            name: resource_name.to_string(),
            resource_type: "docker_container".to_string(),
            created_at: Utc::now(),
        };
        store.insert_workspace_resource(&resource).await.unwrap();
        for agent in *agents {
            store
                .insert_workspace_agent(&WorkspaceAgent {
                    id: WorkspaceAgentId::new(),
                    resource_id: resource.id,
                    name: agent.to_string(),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
    }

    workspace
}

pub async fn body_json(resp: Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

//! 리소스 경로 해석
//!
//! 요청 경로의 `user`, `workspace`, `workspace_and_agent` 값을 저장소 레코드로 해석합니다.
//! HTTP 프레임워크와 무관하며, 게이트웨이 미들웨어가 이 함수들을 호출합니다.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::id::{UserId, WorkspaceId, WorkspaceResourceId};
use crate::model::{User, Workspace, WorkspaceAgent};
use crate::store::{Store, StoreError};

/// 현재 인증된 사용자를 가리키는 값
pub const ME: &str = "me";

/// 워크스페이스 이름과 에이전트 이름 구분자
pub const AGENT_SEPARATOR: char = '.';

// ─────────────────────────────────────────────────────────────────────────────
// Owner
// ─────────────────────────────────────────────────────────────────────────────

/// `user` 경로 값 해석
///
/// UUID, 사용자명, 또는 `me`(인증된 사용자)를 받습니다.
pub async fn resolve_user(
    store: &dyn Store,
    value: &str,
    authenticated: Option<&User>,
) -> Result<User> {
    if value.is_empty() {
        return Err(Error::MissingParam { param: "user" });
    }

    if value == ME {
        return authenticated
            .cloned()
            .ok_or_else(|| Error::invalid("\"me\" requires an authenticated session."));
    }

    let found = match Uuid::parse_str(value) {
        Ok(id) => store.get_user_by_id(&UserId(id)).await,
        Err(_) => store.get_user_by_username(value).await,
    };
    found.map_err(|e| not_found_or(e, "User not found."))
}

// ─────────────────────────────────────────────────────────────────────────────
// Workspace
// ─────────────────────────────────────────────────────────────────────────────

/// `workspace` 경로 값 해석
///
/// 소유자가 없으면 UUID만 받습니다. 소유자가 있으면 UUID는 ID로, 그 외는 소유자 범위 이름으로 조회합니다.
pub async fn resolve_workspace(
    store: &dyn Store,
    value: &str,
    owner: Option<&User>,
) -> Result<Workspace> {
    if value.is_empty() {
        return Err(Error::MissingParam { param: "workspace" });
    }

    match (Uuid::parse_str(value), owner) {
        (Ok(id), _) => store
            .get_workspace_by_id(&WorkspaceId(id))
            .await
            .map_err(|e| not_found_or(e, "Workspace not found.")),
        (Err(_), Some(owner)) => resolve_workspace_by_name(store, owner, value).await,
        (Err(_), None) => Err(Error::invalid("Invalid workspace id.")),
    }
}

/// 소유자 범위 이름으로 워크스페이스 조회 (삭제된 워크스페이스 제외)
pub async fn resolve_workspace_by_name(
    store: &dyn Store,
    owner: &User,
    name: &str,
) -> Result<Workspace> {
    store
        .get_workspace_by_owner_and_name(&owner.id, name)
        .await
        .map_err(|e| not_found_or(e, "Workspace not found."))
}

// ─────────────────────────────────────────────────────────────────────────────
// Workspace Agent
// ─────────────────────────────────────────────────────────────────────────────

/// `<workspace>` 또는 `<workspace>.<agent>` 분리
///
/// 첫 번째 `.`에서 나눕니다. 에이전트 이름이 비어 있으면 지정하지 않은 것으로 봅니다.
pub fn parse_workspace_and_agent(value: &str) -> (&str, Option<&str>) {
    match value.split_once(AGENT_SEPARATOR) {
        Some((workspace, agent)) if !agent.is_empty() => (workspace, Some(agent)),
        Some((workspace, _)) => (workspace, None),
        None => (value, None),
    }
}

/// `workspace_and_agent` 경로 값 해석
pub async fn resolve_workspace_agent(
    store: &dyn Store,
    owner: &User,
    value: &str,
) -> Result<(Workspace, WorkspaceAgent)> {
    if value.is_empty() {
        return Err(Error::MissingParam {
            param: "workspace_and_agent",
        });
    }

    let (workspace_name, agent_name) = parse_workspace_and_agent(value);
    let workspace = resolve_workspace_by_name(store, owner, workspace_name).await?;
    let agents = list_workspace_agents(store, &workspace).await?;
    let agent = select_agent(agents, agent_name)?;

    Ok((workspace, agent))
}

/// 최신 빌드의 Job이 만든 모든 리소스의 에이전트
async fn list_workspace_agents(
    store: &dyn Store,
    workspace: &Workspace,
) -> Result<Vec<WorkspaceAgent>> {
    let build = match store.get_latest_workspace_build(&workspace.id).await {
        Ok(build) => build,
        // 빌드가 없으면 리소스도 없음
        Err(StoreError::NotFound) => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let job = store.get_provisioner_job_by_id(&build.job_id).await?;
    let resources = store.list_workspace_resources_by_job(&job.id).await?;
    if resources.is_empty() {
        return Ok(Vec::new());
    }

    let resource_ids: Vec<WorkspaceResourceId> = resources.iter().map(|r| r.id).collect();
    Ok(store.list_workspace_agents_by_resources(&resource_ids).await?)
}

/// 에이전트 목록에서 하나 선택
///
/// 하나뿐이면 이름과 상관없이 선택합니다. 여러 개면 이름이 필요하고, 처음 일치하는 에이전트를 고릅니다.
pub fn select_agent(
    mut agents: Vec<WorkspaceAgent>,
    agent_name: Option<&str>,
) -> Result<WorkspaceAgent> {
    match agents.len() {
        0 => Err(Error::NoAgents),
        1 => Ok(agents.remove(0)),
        _ => {
            let name = agent_name.ok_or(Error::AgentNotSpecified)?;
            agents
                .into_iter()
                .find(|a| a.name == name)
                .ok_or_else(|| Error::UnknownAgent {
                    name: name.to_string(),
                })
        }
    }
}

fn not_found_or(error: StoreError, message: &str) -> Error {
    match error {
        StoreError::NotFound => Error::not_found(message),
        other => other.into(),
    }
}

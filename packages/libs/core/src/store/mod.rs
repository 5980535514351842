//! 저장소 추상화
//!
//! 인증/해석 단계가 의존하는 저장소 연산(조회, 삽입, 갱신, 부모 기준 목록)만 정의합니다.
//! 실제 백엔드(SQLite 등)는 이 트레이트를 구현합니다.

mod memory;

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::auth::{ApiKey, LoginType};
use crate::id::{ProvisionerJobId, UserId, WorkspaceId, WorkspaceResourceId};
use crate::model::{
    ProvisionerJob, User, UserLink, Workspace, WorkspaceAgent, WorkspaceBuild, WorkspaceResource,
};

pub use memory::MemoryStore;

/// 모든 저장소 백엔드가 공유하는 에러
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("backend error: {0}")]
    Backend(String),
}

/// API Key 갱신 파라미터
///
/// 검증 단계가 바꿀 수 있는 필드만 담습니다. 한 번의 쓰기로 반영됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateApiKeyParams {
    pub id: String,
    pub last_used: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<IpAddr>,
    pub updated_at: DateTime<Utc>,
}

impl UpdateApiKeyParams {
    pub fn from_key(key: &ApiKey, now: DateTime<Utc>) -> Self {
        Self {
            id: key.id.0.clone(),
            last_used: key.last_used,
            expires_at: key.expires_at,
            ip_address: key.ip_address,
            updated_at: now,
        }
    }
}

/// 외부 인증 연결 갱신 파라미터
#[derive(Clone, PartialEq, Eq)]
pub struct UpdateUserLinkParams {
    pub user_id: UserId,
    pub login_type: LoginType,
    pub oauth_access_token: String,
    pub oauth_refresh_token: String,
    pub oauth_expiry: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for UpdateUserLinkParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateUserLinkParams")
            .field("user_id", &self.user_id)
            .field("login_type", &self.login_type)
            .field("oauth_expiry", &self.oauth_expiry)
            .finish_non_exhaustive()
    }
}

/// 코어가 의존하는 저장소 트레이트
#[cfg_attr(any(test, feature = "test-support"), mockall::automock)]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // ───────────────────────────────────── API Keys ───────────────────────────────────────

    /// Key ID로 API Key 조회
    async fn get_api_key_by_id(&self, id: &str) -> Result<ApiKey, StoreError>;

    /// API Key 저장
    async fn insert_api_key(&self, key: &ApiKey) -> Result<(), StoreError>;

    /// 감사 필드/만료 시각 갱신
    async fn update_api_key(&self, params: &UpdateApiKeyParams) -> Result<(), StoreError>;

    // ───────────────────────────────────── Users ──────────────────────────────────────────

    async fn get_user_by_id(&self, id: &UserId) -> Result<User, StoreError>;

    /// 핸들로 사용자 조회
    async fn get_user_by_username(&self, username: &str) -> Result<User, StoreError>;

    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    // ───────────────────────────────────── User Links ─────────────────────────────────────

    /// 사용자 + 로그인 방식으로 외부 인증 연결 조회
    async fn get_user_link(
        &self,
        user_id: &UserId,
        login_type: LoginType,
    ) -> Result<UserLink, StoreError>;

    async fn insert_user_link(&self, link: &UserLink) -> Result<(), StoreError>;

    /// Refresh 결과 반영
    async fn update_user_link(&self, params: &UpdateUserLinkParams) -> Result<(), StoreError>;

    // ───────────────────────────────────── Workspaces ─────────────────────────────────────

    async fn get_workspace_by_id(&self, id: &WorkspaceId) -> Result<Workspace, StoreError>;

    /// 소유자 범위 이름으로 조회 (삭제된 워크스페이스 제외)
    async fn get_workspace_by_owner_and_name(
        &self,
        owner_id: &UserId,
        name: &str,
    ) -> Result<Workspace, StoreError>;

    async fn insert_workspace(&self, workspace: &Workspace) -> Result<(), StoreError>;

    // ───────────────────────────────────── Builds / Jobs ──────────────────────────────────

    /// 가장 최근에 생성된 빌드
    async fn get_latest_workspace_build(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<WorkspaceBuild, StoreError>;

    async fn insert_workspace_build(&self, build: &WorkspaceBuild) -> Result<(), StoreError>;

    async fn get_provisioner_job_by_id(
        &self,
        id: &ProvisionerJobId,
    ) -> Result<ProvisionerJob, StoreError>;

    async fn insert_provisioner_job(&self, job: &ProvisionerJob) -> Result<(), StoreError>;

    // ───────────────────────────────────── Resources / Agents ─────────────────────────────

    /// Job이 만든 리소스 목록 (생성 순)
    async fn list_workspace_resources_by_job(
        &self,
        job_id: &ProvisionerJobId,
    ) -> Result<Vec<WorkspaceResource>, StoreError>;

    async fn insert_workspace_resource(
        &self,
        resource: &WorkspaceResource,
    ) -> Result<(), StoreError>;

    /// 리소스들에 붙은 에이전트 목록 (리소스 순서, 생성 순)
    async fn list_workspace_agents_by_resources(
        &self,
        resource_ids: &[WorkspaceResourceId],
    ) -> Result<Vec<WorkspaceAgent>, StoreError>;

    async fn insert_workspace_agent(&self, agent: &WorkspaceAgent) -> Result<(), StoreError>;
}

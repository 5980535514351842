//! 요청 범위 Principal Context
//!
//! 미들웨어 단계가 해석한 레코드를 요청 extensions에 담아 다음 단계와 핸들러로 넘깁니다.
//! 접근자는 해당 값을 채우는 단계가 실행되지 않았으면 패닉합니다. 이는 요청 오류가 아니라
//! 라우터 구성 오류입니다.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use wsg_core::auth::ApiKey;
use wsg_core::model::{User, Workspace, WorkspaceAgent};

/// 요청 범위 컨텍스트
#[derive(Debug, Clone, Default)]
pub struct PrincipalContext {
    api_key: Option<ApiKey>,
    user: Option<User>,
    owner: Option<User>,
    workspace: Option<Workspace>,
    workspace_agent: Option<WorkspaceAgent>,
}

impl PrincipalContext {
    /// 요청에 붙은 컨텍스트 (없으면 빈 컨텍스트 생성)
    pub fn of(req: &mut Request) -> &mut Self {
        req.extensions_mut().get_or_insert_default::<Self>()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// 인증된 API Key
    #[track_caller]
    pub fn api_key(&self) -> &ApiKey {
        self.api_key
            .as_ref()
            .unwrap_or_else(|| not_resolved("api key", "extract_api_key"))
    }

    /// 인증된 사용자
    #[track_caller]
    pub fn user(&self) -> &User {
        self.user
            .as_ref()
            .unwrap_or_else(|| not_resolved("user", "extract_api_key"))
    }

    /// 경로의 `user`가 가리키는 소유자
    #[track_caller]
    pub fn owner(&self) -> &User {
        self.owner
            .as_ref()
            .unwrap_or_else(|| not_resolved("owner", "extract_user_param"))
    }

    #[track_caller]
    pub fn workspace(&self) -> &Workspace {
        self.workspace.as_ref().unwrap_or_else(|| {
            not_resolved("workspace", "extract_workspace_param or extract_workspace_agent_param")
        })
    }

    #[track_caller]
    pub fn workspace_agent(&self) -> &WorkspaceAgent {
        self.workspace_agent
            .as_ref()
            .unwrap_or_else(|| not_resolved("workspace agent", "extract_workspace_agent_param"))
    }

    /// 소유자가 해석됐으면 반환 (선택적 단계용)
    pub fn try_owner(&self) -> Option<&User> {
        self.owner.as_ref()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Setters (미들웨어 전용)
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn set_authenticated(&mut self, api_key: ApiKey, user: User) {
        self.api_key = Some(api_key);
        self.user = Some(user);
    }

    pub(crate) fn set_owner(&mut self, owner: User) {
        self.owner = Some(owner);
    }

    pub(crate) fn set_workspace(&mut self, workspace: Workspace) {
        self.workspace = Some(workspace);
    }

    pub(crate) fn set_workspace_agent(&mut self, workspace: Workspace, agent: WorkspaceAgent) {
        self.workspace = Some(workspace);
        self.workspace_agent = Some(agent);
    }
}

#[track_caller]
fn not_resolved(what: &str, stage: &str) -> ! {
    panic!("{what} is not resolved for this request; the {stage} middleware must run first")
}

impl<S: Send + Sync> FromRequestParts<S> for PrincipalContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<PrincipalContext>()
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wsg_core::id::UserId;

    fn user() -> User {
        User {
            id: UserId::new(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_set() {
        let mut ctx = PrincipalContext::default();
        assert!(ctx.try_owner().is_none());

        let alice = user();
        ctx.set_owner(alice.clone());
        assert_eq!(ctx.owner(), &alice);
    }

    #[test]
    #[should_panic(expected = "extract_api_key")]
    fn test_user_without_auth_stage_panics() {
        PrincipalContext::default().user();
    }

    #[test]
    #[should_panic(expected = "extract_workspace_agent_param")]
    fn test_agent_without_agent_stage_panics() {
        PrincipalContext::default().workspace_agent();
    }

    #[test]
    fn test_context_lives_in_request_extensions() {
        let mut req = Request::new(axum::body::Body::empty());
        let alice = user();
        PrincipalContext::of(&mut req).set_owner(alice.clone());

        let ctx = req.extensions().get::<PrincipalContext>().unwrap();
        assert_eq!(ctx.owner().id, alice.id);
    }
}

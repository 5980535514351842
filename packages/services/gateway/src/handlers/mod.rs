//! HTTP 핸들러
//!
//! 미들웨어 단계가 해석한 레코드를 그대로 돌려줍니다.

use axum::Json;
use serde::Serialize;
use wsg_core::model::{User, Workspace, WorkspaceAgent};

use crate::context::PrincipalContext;

/// 헬스 체크
pub async fn health_check() -> &'static str {
    "ok"
}

/// `GET /api/v2/users/{user}`
pub async fn get_user(ctx: PrincipalContext) -> Json<User> {
    Json(ctx.owner().clone())
}

/// `GET /api/v2/workspaces/{workspace}`, `GET /api/v2/users/{user}/workspace/{workspace}`
pub async fn get_workspace(ctx: PrincipalContext) -> Json<Workspace> {
    Json(ctx.workspace().clone())
}

#[derive(Debug, Serialize)]
pub struct WorkspaceAgentResponse {
    pub workspace: Workspace,
    pub agent: WorkspaceAgent,
}

/// `GET /api/v2/users/{user}/agents/{workspace_and_agent}`
pub async fn get_workspace_agent(ctx: PrincipalContext) -> Json<WorkspaceAgentResponse> {
    Json(WorkspaceAgentResponse {
        workspace: ctx.workspace().clone(),
        agent: ctx.workspace_agent().clone(),
    })
}

//! `workspace_and_agent` 경로 파라미터 해석 단계

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use wsg_core::resolve;

use super::path_param;
use crate::context::PrincipalContext;
use crate::error::Result;
use crate::state::AppState;

/// 워크스페이스 + 에이전트 해석
///
/// 소유자 단계(`extract_user_param`)가 먼저 실행되어야 합니다.
pub async fn extract_workspace_agent_param(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let value = path_param(&mut req, "workspace_and_agent").await;
    let owner = PrincipalContext::of(&mut req).owner().clone();

    let (workspace, agent) =
        resolve::resolve_workspace_agent(state.store.as_ref(), &owner, &value).await?;
    tracing::debug!(workspace_id = %workspace.id, agent_id = %agent.id, "resolved workspace agent");

    PrincipalContext::of(&mut req).set_workspace_agent(workspace, agent);
    Ok(next.run(req).await)
}

//! `workspace` 경로 파라미터 해석 단계

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use wsg_core::resolve;

use super::path_param;
use crate::context::PrincipalContext;
use crate::error::Result;
use crate::state::AppState;

/// 워크스페이스 해석
///
/// 소유자 단계가 먼저 실행됐으면 이름도 받고, 아니면 ID만 받습니다.
pub async fn extract_workspace_param(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let value = path_param(&mut req, "workspace").await;
    let owner = PrincipalContext::of(&mut req).try_owner().cloned();

    let workspace =
        resolve::resolve_workspace(state.store.as_ref(), &value, owner.as_ref()).await?;
    tracing::debug!(workspace_id = %workspace.id, "resolved workspace");

    PrincipalContext::of(&mut req).set_workspace(workspace);
    Ok(next.run(req).await)
}

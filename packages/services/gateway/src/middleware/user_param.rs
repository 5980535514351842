//! `user` 경로 파라미터 해석 단계

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use wsg_core::resolve;

use super::path_param;
use crate::context::PrincipalContext;
use crate::error::Result;
use crate::state::AppState;

/// 소유자 해석
///
/// `me`는 인증된 사용자를 가리키므로 세션 인증 단계가 먼저 실행되어야 합니다.
pub async fn extract_user_param(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let value = path_param(&mut req, "user").await;
    let ctx = PrincipalContext::of(&mut req);
    let me = (value == resolve::ME).then(|| ctx.user().clone());

    let owner = resolve::resolve_user(state.store.as_ref(), &value, me.as_ref()).await?;
    PrincipalContext::of(&mut req).set_owner(owner);
    Ok(next.run(req).await)
}

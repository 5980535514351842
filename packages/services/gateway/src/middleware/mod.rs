//! Gateway 미들웨어
//!
//! 요청 ID, 세션 인증, 경로 파라미터 해석 단계를 정의합니다.
//! 인증/해석 단계는 `PrincipalContext`에 결과를 붙이고 다음 단계로 넘깁니다.

pub mod api_key;
pub mod user_param;
pub mod workspace_agent_param;
pub mod workspace_param;

use std::collections::HashMap;

use axum::extract::{Path, Request};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use axum::RequestExt;
use uuid::Uuid;

pub use api_key::extract_api_key;
pub use user_param::extract_user_param;
pub use workspace_agent_param::extract_workspace_agent_param;
pub use workspace_param::extract_workspace_param;

/// 요청 ID 헤더
pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static REQUEST_ID: String;
}

/// 현재 요청의 ID (요청 범위 밖이면 `None`)
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(Clone::clone).ok()
}

/// 요청 ID 부여
///
/// 클라이언트가 보낸 `x-request-id`가 있으면 그대로 쓰고, 없으면 새로 만듭니다.
/// 에러 응답 본문과 응답 헤더에 같은 ID가 실립니다.
pub async fn request_id(req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut resp = REQUEST_ID.scope(id.clone(), next.run(req)).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        resp.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    resp
}

/// 매칭된 라우트의 경로 파라미터 (없으면 빈 문자열)
async fn path_param(req: &mut Request, name: &str) -> String {
    req.extract_parts::<Path<HashMap<String, String>>>()
        .await
        .ok()
        .and_then(|Path(mut params)| params.remove(name))
        .unwrap_or_default()
}

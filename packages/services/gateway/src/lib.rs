//! wsg-gateway: 세션 인증과 워크스페이스 경로 해석을 수행하는 HTTP 미들웨어
//!
//! 요청 흐름: `request_id` → `extract_api_key` → 경로 해석 단계들 → 핸들러.
//! 각 단계는 실패 시 상태 코드와 메시지로 거절하고, 성공 시 `PrincipalContext`에 결과를 붙입니다.

pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use context::PrincipalContext;
pub use routes::create_router;
pub use state::AppState;

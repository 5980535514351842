//! Gateway 에러 타입

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Gateway 에러
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 로그인 페이지로 보냄 (리다이렉트 모드의 인증 실패)
    #[error("redirect to {location}")]
    Redirect { location: String },

    #[error("core error: {0}")]
    Core(#[from] wsg_core::Error),
}

/// 에러 응답 JSON
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let request_id = crate::middleware::current_request_id();
        let (status, code, message) = match &self {
            GatewayError::Redirect { location } => {
                return (
                    StatusCode::TEMPORARY_REDIRECT,
                    [(header::LOCATION, location.clone())],
                )
                    .into_response();
            }
            GatewayError::Core(e) => {
                match e.status_code() {
                    500 => tracing::error!(request_id = ?request_id, "Store error: {}", e),
                    401 => tracing::debug!("Rejected credential: {}", e),
                    _ => {}
                }
                let status = StatusCode::from_u16(e.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, e.code(), e.public_message())
            }
        };

        let body = ErrorResponse {
            code: code.to_string(),
            message,
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

//! 공통 에러 타입
//!
//! 인증 단계와 리소스 경로 해석 단계가 공유하는 에러 타입을 정의합니다.

use thiserror::Error;

use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

/// wsgate 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Auth Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("missing session token")]
    MissingToken,

    #[error("malformed session token: {reason}")]
    MalformedToken { reason: &'static str },

    #[error("api key not found: {key_id}")]
    UnknownKey { key_id: String },

    #[error("api key secret mismatch: {key_id}")]
    SecretMismatch { key_id: String },

    #[error("api key expired: {key_id}")]
    TokenExpired { key_id: String },

    #[error("oauth refresh failed for {key_id}: {reason}")]
    RefreshFailed { key_id: String, reason: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Resource Path Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("\"{param}\" must be provided.")]
    MissingParam { param: &'static str },

    #[error("{message}")]
    InvalidParam { message: String },

    #[error("{message}")]
    ResourceNotFound { message: String },

    #[error("No agents exist")]
    NoAgents,

    #[error("More than one agent exists, but no agent specified.")]
    AgentNotSpecified,

    #[error("No agent exists with the name {name}.")]
    UnknownAgent { name: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Storage Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl Error {
    /// HTTP 상태 코드로 변환
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::MissingParam { .. }
            | Error::InvalidParam { .. }
            | Error::NoAgents
            | Error::AgentNotSpecified
            | Error::UnknownAgent { .. } => 400,

            // 401 Unauthorized
            Error::MissingToken
            | Error::MalformedToken { .. }
            | Error::UnknownKey { .. }
            | Error::SecretMismatch { .. }
            | Error::TokenExpired { .. }
            | Error::RefreshFailed { .. } => 401,

            // 404 Not Found
            Error::ResourceNotFound { .. } => 404,

            // 500 Internal Server Error
            Error::Store(_) => 500,
        }
    }

    /// 에러 코드 (클라이언트용)
    pub fn code(&self) -> &'static str {
        match self {
            // 실패 단계를 드러내지 않도록 인증 실패는 하나의 코드
            Error::MissingToken
            | Error::MalformedToken { .. }
            | Error::UnknownKey { .. }
            | Error::SecretMismatch { .. }
            | Error::TokenExpired { .. }
            | Error::RefreshFailed { .. } => "UNAUTHENTICATED",
            Error::MissingParam { .. } | Error::InvalidParam { .. } => "BAD_REQUEST",
            Error::ResourceNotFound { .. } => "NOT_FOUND",
            Error::NoAgents | Error::AgentNotSpecified | Error::UnknownAgent { .. } => {
                "AGENT_UNRESOLVED"
            }
            Error::Store(_) => "INTERNAL_ERROR",
        }
    }

    /// 인증 실패 여부
    pub fn is_unauthenticated(&self) -> bool {
        self.status_code() == 401
    }

    /// 클라이언트에 노출할 메시지
    ///
    /// 인증 실패는 어느 단계에서 실패했는지 드러내지 않도록 메시지를 통일합니다.
    /// 저장소 에러는 내부 정보를 숨깁니다.
    pub fn public_message(&self) -> String {
        match self {
            Error::MissingToken => "A session token must be provided.".to_string(),
            Error::MalformedToken { .. }
            | Error::UnknownKey { .. }
            | Error::SecretMismatch { .. }
            | Error::TokenExpired { .. }
            | Error::RefreshFailed { .. } => "Session token is invalid or expired.".to_string(),
            Error::Store(_) => "Internal error.".to_string(),
            other => other.to_string(),
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Error::ResourceNotFound {
            message: message.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidParam {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::MissingToken.status_code(), 401);
        assert_eq!(Error::NoAgents.status_code(), 400);
        assert_eq!(Error::not_found("Workspace not found.").status_code(), 404);
        assert_eq!(Error::Store(StoreError::Backend("boom".into())).status_code(), 500);
    }

    #[test]
    fn test_public_message_hides_auth_step() {
        let mismatch = Error::SecretMismatch {
            key_id: "abcdefghij".to_string(),
        };
        let expired = Error::TokenExpired {
            key_id: "abcdefghij".to_string(),
        };
        assert_eq!(mismatch.public_message(), expired.public_message());
        assert!(!mismatch.public_message().contains("abcdefghij"));
    }

    #[test]
    fn test_agent_messages() {
        assert_eq!(Error::NoAgents.public_message(), "No agents exist");
        assert_eq!(
            Error::UnknownAgent {
                name: "db".to_string()
            }
            .public_message(),
            "No agent exists with the name db."
        );
    }

    #[test]
    fn test_store_detail_hidden() {
        let err = Error::Store(StoreError::Backend("disk on fire".into()));
        assert_eq!(err.public_message(), "Internal error.");
    }
}

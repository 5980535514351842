//! 인증 관련 타입 및 로직
//!
//! # 개요
//!
//! 모든 요청은 세션 토큰(`{key_id}-{secret}`)을 제시합니다. 서버는 Key ID로 API Key 레코드를 찾고
//! Secret의 SHA-256 해시를 상수 시간 비교한 뒤 세션 수명 규칙을 적용합니다.
//!
//! # 로그인 방식
//!
//! - **Password**: 키 자체의 만료 시각을 따르며, 만료가 가까우면 슬라이딩 연장
//! - **OAuth (GitHub/OIDC)**: 연결된 외부 Access Token의 만료를 따르며, 만료 시 Refresh

mod api_key;
mod oauth;
mod session;
mod validator;

pub use api_key::{
    hash_secret, verify_secret, ApiKey, ApiKeyId, ApiKeyToken, LoginType, OAuthProvider,
    KEY_ID_LEN, SECRET_LEN, SEPARATOR,
};
pub use oauth::{OAuthConfigs, OAuthToken, RefreshError, TokenRefresher};
pub use session::SessionConfig;
pub use validator::{Authenticated, CredentialValidator};

//! 세션 API Key
//!
//! 세션 토큰(`{key_id}-{secret}`)의 파싱과 해시 비교, 저장되는 API Key 레코드를 다룹니다.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};
use crate::id::{random_string, UserId};
use crate::model::ParseEnumError;

/// Key ID 길이
pub const KEY_ID_LEN: usize = 10;

/// Secret 길이
pub const SECRET_LEN: usize = 22;

/// Key ID와 Secret 사이 구분자
pub const SEPARATOR: char = '-';

/// API Key ID
///
/// 로깅/조회에 사용되는 공개 식별자입니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApiKeyId(pub String);

impl ApiKeyId {
    /// 새 ID 생성
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 내부 값 참조
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// OAuth 제공자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthProvider {
    Github,
    Oidc,
}

/// 로그인 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginType {
    /// 로컬 비밀번호
    Password,

    /// GitHub OAuth
    Github,

    /// OpenID Connect
    Oidc,
}

impl LoginType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginType::Password => "password",
            LoginType::Github => "github",
            LoginType::Oidc => "oidc",
        }
    }

    /// OAuth 기반 로그인이면 해당 제공자 반환
    pub fn oauth_provider(&self) -> Option<OAuthProvider> {
        match self {
            LoginType::Password => None,
            LoginType::Github => Some(OAuthProvider::Github),
            LoginType::Oidc => Some(OAuthProvider::Oidc),
        }
    }
}

impl FromStr for LoginType {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "password" => Ok(LoginType::Password),
            "github" => Ok(LoginType::Github),
            "oidc" => Ok(LoginType::Oidc),
            _ => Err(ParseEnumError {
                kind: "login type",
                value: value.to_string(),
            }),
        }
    }
}

/// API Key 레코드
///
/// 세션 토큰의 서버 측 레코드입니다. Secret은 SHA-256 해시로만 저장됩니다.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    /// Key ID
    pub id: ApiKeyId,

    /// Secret 해시 (직렬화/로그에서 제외)
    #[serde(skip)]
    pub hashed_secret: Vec<u8>,

    /// 소유 사용자
    pub user_id: UserId,

    /// 로그인 방식
    pub login_type: LoginType,

    /// 만료 시각
    pub expires_at: DateTime<Utc>,

    /// 마지막 사용 시각
    pub last_used: DateTime<Utc>,

    /// 마지막 접속 주소
    pub ip_address: Option<IpAddr>,

    /// 키별 세션 수명 (초, 0이면 설정값 사용)
    pub lifetime_seconds: i64,

    /// 생성 시각
    pub created_at: DateTime<Utc>,

    /// 수정 시각
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("id", &self.id)
            .field("hashed_secret", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("login_type", &self.login_type)
            .field("expires_at", &self.expires_at)
            .field("last_used", &self.last_used)
            .field("ip_address", &self.ip_address)
            .field("lifetime_seconds", &self.lifetime_seconds)
            .finish()
    }
}

impl ApiKey {
    /// 주어진 시각 기준 만료 여부
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// 세션 토큰 (Key ID + Secret 평문)
///
/// 생성 시 1회만 평문으로 노출되며, 이후에는 요청에서 파싱될 때만 존재합니다.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKeyToken {
    /// Key ID
    pub key_id: ApiKeyId,

    /// Secret (평문)
    pub secret: String,
}

impl fmt::Debug for ApiKeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyToken")
            .field("key_id", &self.key_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for ApiKeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.key_id, SEPARATOR, self.secret)
    }
}

impl ApiKeyToken {
    /// 새 토큰 생성 (로그인/토큰 교환 시점)
    pub fn generate() -> Self {
        Self {
            key_id: ApiKeyId::new(random_string(KEY_ID_LEN)),
            secret: random_string(SECRET_LEN),
        }
    }

    /// `{key_id}-{secret}` 형식에서 파싱
    ///
    /// 첫 번째 구분자에서 나누고 각 부분의 길이를 검증합니다.
    pub fn parse(raw: &str) -> Result<Self> {
        let (key_id, secret) = raw.split_once(SEPARATOR).ok_or(Error::MalformedToken {
            reason: "missing separator",
        })?;

        if key_id.len() != KEY_ID_LEN {
            return Err(Error::MalformedToken {
                reason: "invalid key id length",
            });
        }
        if secret.len() != SECRET_LEN {
            return Err(Error::MalformedToken {
                reason: "invalid secret length",
            });
        }

        Ok(Self {
            key_id: ApiKeyId::new(key_id),
            secret: secret.to_string(),
        })
    }

    /// 저장용 Secret 해시
    pub fn hashed_secret(&self) -> Vec<u8> {
        hash_secret(&self.secret).to_vec()
    }

    /// 저장된 해시와 비교 (상수 시간)
    pub fn verify(&self, hashed_secret: &[u8]) -> bool {
        verify_secret(&self.secret, hashed_secret)
    }
}

/// Secret의 SHA-256 해시
pub fn hash_secret(secret: &str) -> [u8; 32] {
    Sha256::digest(secret.as_bytes()).into()
}

/// Secret을 해시해서 저장된 값과 상수 시간 비교
pub fn verify_secret(secret: &str, hashed_secret: &[u8]) -> bool {
    let computed = hash_secret(secret);
    computed.as_slice().ct_eq(hashed_secret).into()
}

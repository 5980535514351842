use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::LoginType;
use crate::id::UserId;

/// 사용자 (Principal)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    /// 고유 핸들
    pub username: String,

    pub email: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// 외부 인증 연결 (사용자 + OAuth 제공자)
///
/// 사용자/로그인 방식 조합당 하나만 존재합니다.
#[derive(Clone, PartialEq, Eq)]
pub struct UserLink {
    pub user_id: UserId,

    pub login_type: LoginType,

    /// 제공자 측 사용자 ID
    pub linked_id: String,

    pub oauth_access_token: String,

    pub oauth_refresh_token: String,

    /// Access Token 만료 시각 (None이면 미설정, 만료된 것으로 취급)
    pub oauth_expiry: Option<DateTime<Utc>>,
}

impl UserLink {
    /// 주어진 시각 기준 Access Token이 아직 유효한지
    pub fn access_token_valid_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.oauth_expiry, Some(expiry) if expiry > now)
    }
}

impl fmt::Debug for UserLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserLink")
            .field("user_id", &self.user_id)
            .field("login_type", &self.login_type)
            .field("linked_id", &self.linked_id)
            .field("oauth_expiry", &self.oauth_expiry)
            .finish_non_exhaustive()
    }
}

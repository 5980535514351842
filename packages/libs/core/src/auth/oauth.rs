//! OAuth 토큰 갱신
//!
//! 코어는 제공자와의 교환 프로토콜을 구현하지 않고, 제공자별 `TokenRefresher`를 호출만 합니다.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::api_key::OAuthProvider;

/// 제공자가 돌려준 새 Access Token
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthToken {
    pub access_token: String,

    /// 교체된 Refresh Token (비어 있으면 기존 값 유지)
    pub refresh_token: String,

    pub expiry: DateTime<Utc>,
}

impl fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthToken")
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

/// Refresh 실패
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct RefreshError(pub String);

/// 제공자 클라이언트의 Refresh 연산
#[async_trait::async_trait]
pub trait TokenRefresher: Send + Sync {
    /// 저장된 Refresh Token으로 새 Access Token 발급
    async fn refresh(&self, refresh_token: &str) -> Result<OAuthToken, RefreshError>;
}

/// 제공자별 Refresh 클라이언트 모음
#[derive(Clone, Default)]
pub struct OAuthConfigs {
    refreshers: HashMap<OAuthProvider, Arc<dyn TokenRefresher>>,
}

impl OAuthConfigs {
    pub fn new() -> Self {
        Self::default()
    }

    /// 제공자 등록
    pub fn with_provider(
        mut self,
        provider: OAuthProvider,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Self {
        self.refreshers.insert(provider, refresher);
        self
    }

    pub fn get(&self, provider: OAuthProvider) -> Option<&Arc<dyn TokenRefresher>> {
        self.refreshers.get(&provider)
    }
}

impl fmt::Debug for OAuthConfigs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.refreshers.keys()).finish()
    }
}

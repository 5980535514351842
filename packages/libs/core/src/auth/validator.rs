//! 세션 토큰 검증기
//!
//! 요청마다 세션 토큰을 확인하고 세션 수명 규칙(만료, 슬라이딩 연장, OAuth Refresh,
//! 마지막 사용 시각 쓰기 제한)을 적용합니다.
//!
//! # 처리 순서
//!
//! 1. 토큰 파싱 (형식 오류면 저장소를 조회하지 않음)
//! 2. Key ID로 조회
//! 3. Secret 해시 상수 시간 비교
//! 4. 만료 판정 (비밀번호: 키 자체 만료 / OAuth: 연결된 Access Token 만료 시 Refresh)
//! 5. 슬라이딩 연장 (비밀번호만)
//! 6. 마지막 사용 시각/주소 기록 (쓰기 제한)
//!
//! 변경 사항은 키당 한 번의 쓰기로 반영되고, 동시 요청 간에는 마지막 쓰기가 이깁니다.

use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{User, UserLink};
use crate::store::{Store, StoreError, UpdateApiKeyParams, UpdateUserLinkParams};

use super::api_key::{ApiKey, ApiKeyToken, OAuthProvider};
use super::oauth::{OAuthConfigs, OAuthToken};
use super::session::SessionConfig;

/// 인증 결과
///
/// 검증된 API Key와 소유 사용자입니다.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub api_key: ApiKey,
    pub user: User,
}

/// 세션 토큰 검증기
#[derive(Clone)]
pub struct CredentialValidator {
    store: Arc<dyn Store>,
    oauth: OAuthConfigs,
    config: SessionConfig,
}

impl CredentialValidator {
    pub fn new(store: Arc<dyn Store>, oauth: OAuthConfigs, config: SessionConfig) -> Self {
        Self {
            store,
            oauth,
            config,
        }
    }

    /// 현재 시각 기준 검증
    pub async fn validate(
        &self,
        raw_token: Option<&str>,
        remote_ip: Option<IpAddr>,
    ) -> Result<Authenticated> {
        self.validate_at(raw_token, remote_ip, Utc::now()).await
    }

    /// 주어진 시각 기준 검증
    pub async fn validate_at(
        &self,
        raw_token: Option<&str>,
        remote_ip: Option<IpAddr>,
        now: DateTime<Utc>,
    ) -> Result<Authenticated> {
        let raw_token = raw_token.ok_or(Error::MissingToken)?;
        let token = ApiKeyToken::parse(raw_token)?;

        let mut key = match self.store.get_api_key_by_id(token.key_id.as_str()).await {
            Ok(key) => key,
            Err(StoreError::NotFound) => {
                return Err(Error::UnknownKey {
                    key_id: token.key_id.0.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        if !token.verify(&key.hashed_secret) {
            return Err(Error::SecretMismatch {
                key_id: key.id.0.clone(),
            });
        }

        let mut changed = false;

        match key.login_type.oauth_provider() {
            None => {
                if key.is_expired_at(now) {
                    return Err(Error::TokenExpired {
                        key_id: key.id.0.clone(),
                    });
                }

                if let Some(renewed) =
                    self.config
                        .renewed_expiry(key.expires_at, key.lifetime_seconds, now)
                {
                    tracing::info!(key_id = %key.id, expires_at = %renewed, "extended session");
                    key.expires_at = renewed;
                    changed = true;
                }
            }
            Some(provider) => {
                let link = match self.store.get_user_link(&key.user_id, key.login_type).await {
                    Ok(link) => link,
                    Err(StoreError::NotFound) => {
                        return Err(Error::RefreshFailed {
                            key_id: key.id.0.clone(),
                            reason: "no linked identity".to_string(),
                        })
                    }
                    Err(e) => return Err(e.into()),
                };

                if !link.access_token_valid_at(now) {
                    let refreshed = self.refresh(provider, &key, &link).await?;
                    self.store
                        .update_user_link(&UpdateUserLinkParams {
                            user_id: link.user_id,
                            login_type: link.login_type,
                            oauth_access_token: refreshed.access_token.clone(),
                            oauth_refresh_token: if refreshed.refresh_token.is_empty() {
                                link.oauth_refresh_token.clone()
                            } else {
                                refreshed.refresh_token.clone()
                            },
                            oauth_expiry: Some(refreshed.expiry),
                        })
                        .await?;

                    if refreshed.expiry <= now {
                        return Err(Error::TokenExpired {
                            key_id: key.id.0.clone(),
                        });
                    }

                    tracing::info!(key_id = %key.id, ?provider, expires_at = %refreshed.expiry, "refreshed oauth session");
                    key.expires_at = refreshed.expiry;
                    changed = true;
                }
            }
        }

        if self
            .config
            .should_touch(key.last_used, key.ip_address, remote_ip, now)
        {
            key.last_used = now;
            if remote_ip.is_some() {
                key.ip_address = remote_ip;
            }
            changed = true;
        }

        if changed {
            key.updated_at = now;
            self.store
                .update_api_key(&UpdateApiKeyParams::from_key(&key, now))
                .await?;
        }

        let user = match self.store.get_user_by_id(&key.user_id).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                return Err(Error::UnknownKey {
                    key_id: key.id.0.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Authenticated { api_key: key, user })
    }

    /// 제공자 Refresh 호출 (1회, 제한 시간 적용)
    async fn refresh(
        &self,
        provider: OAuthProvider,
        key: &ApiKey,
        link: &UserLink,
    ) -> Result<OAuthToken> {
        let failed = |reason: String| Error::RefreshFailed {
            key_id: key.id.0.clone(),
            reason,
        };

        let refresher = self
            .oauth
            .get(provider)
            .ok_or_else(|| failed(format!("{:?} is not configured", provider)))?;

        let call = refresher.refresh(&link.oauth_refresh_token);
        match tokio::time::timeout(self.config.refresh_timeout, call).await {
            Ok(Ok(token)) => Ok(token),
            Ok(Err(e)) => {
                tracing::warn!(key_id = %key.id, ?provider, "oauth refresh failed: {}", e);
                Err(failed(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(key_id = %key.id, ?provider, "oauth refresh timed out");
                Err(failed("timed out".to_string()))
            }
        }
    }
}

//! Gateway 설정

use std::env;
use std::time::Duration;

use wsg_core::auth::SessionConfig;

/// 세션 수명 상한 (10년)
const MAX_SESSION_LIFETIME_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Gateway 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 서버 포트
    pub port: u16,

    /// SQLite 접속 URL
    pub db_url: String,

    /// 세션 토큰 쿠키 이름
    pub session_cookie: String,

    /// 세션 토큰 헤더 이름
    pub session_header: String,

    /// 세션 토큰 쿼리 파라미터 이름
    pub session_query: String,

    /// 인증 실패 시 401 대신 로그인 페이지로 리다이렉트
    pub redirect_to_login: bool,

    /// 로그인 페이지 경로
    pub login_path: String,

    /// 세션 수명 (초)
    pub session_lifetime_secs: u64,

    /// 세션 연장 간격 (초)
    pub session_renew_interval_secs: u64,

    /// 마지막 사용 시각 쓰기 제한 간격 (초)
    pub last_used_throttle_secs: u64,

    /// OAuth Refresh 제한 시간 (초)
    pub oauth_refresh_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            db_url: "sqlite::memory:".to_string(),
            session_cookie: "session_token".to_string(),
            session_header: "Session-Token".to_string(),
            session_query: "session_token".to_string(),
            redirect_to_login: false,
            login_path: "/login".to_string(),
            session_lifetime_secs: 24 * 60 * 60,
            session_renew_interval_secs: 60 * 60,
            last_used_throttle_secs: 60 * 60,
            oauth_refresh_timeout_secs: 10,
        }
    }
}

impl Config {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let config = Self {
            port: env::var("WSG_PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()?,

            db_url: env::var("WSG_DB_URL").unwrap_or(defaults.db_url),

            session_cookie: env::var("WSG_SESSION_COOKIE").unwrap_or(defaults.session_cookie),

            session_header: env::var("WSG_SESSION_HEADER").unwrap_or(defaults.session_header),

            session_query: env::var("WSG_SESSION_QUERY").unwrap_or(defaults.session_query),

            redirect_to_login: env::var("WSG_REDIRECT_TO_LOGIN")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),

            login_path: env::var("WSG_LOGIN_PATH").unwrap_or(defaults.login_path),

            session_lifetime_secs: env::var("WSG_SESSION_LIFETIME_SECS")
                .unwrap_or_else(|_| defaults.session_lifetime_secs.to_string())
                .parse()?,

            session_renew_interval_secs: env::var("WSG_SESSION_RENEW_INTERVAL_SECS")
                .unwrap_or_else(|_| defaults.session_renew_interval_secs.to_string())
                .parse()?,

            last_used_throttle_secs: env::var("WSG_LAST_USED_THROTTLE_SECS")
                .unwrap_or_else(|_| defaults.last_used_throttle_secs.to_string())
                .parse()?,

            oauth_refresh_timeout_secs: env::var("WSG_OAUTH_REFRESH_TIMEOUT_SECS")
                .unwrap_or_else(|_| defaults.oauth_refresh_timeout_secs.to_string())
                .parse()?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.session_lifetime_secs > MAX_SESSION_LIFETIME_SECS {
            anyhow::bail!(
                "WSG_SESSION_LIFETIME_SECS ({}) must not exceed {}",
                self.session_lifetime_secs,
                MAX_SESSION_LIFETIME_SECS
            );
        }
        if self.session_renew_interval_secs >= self.session_lifetime_secs {
            anyhow::bail!(
                "WSG_SESSION_RENEW_INTERVAL_SECS ({}) must be less than WSG_SESSION_LIFETIME_SECS ({})",
                self.session_renew_interval_secs,
                self.session_lifetime_secs
            );
        }
        Ok(())
    }

    /// 검증기에 넘길 세션 설정
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            lifetime: Duration::from_secs(self.session_lifetime_secs),
            renew_interval: Duration::from_secs(self.session_renew_interval_secs),
            last_used_throttle: Duration::from_secs(self.last_used_throttle_secs),
            refresh_timeout: Duration::from_secs(self.oauth_refresh_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_session_defaults() {
        let session = Config::default().session();
        let expected = SessionConfig::default();

        assert_eq!(session.lifetime, expected.lifetime);
        assert_eq!(session.renew_interval, expected.renew_interval);
        assert_eq!(session.last_used_throttle, expected.last_used_throttle);
        assert_eq!(session.refresh_timeout, expected.refresh_timeout);
    }

    #[test]
    fn test_renew_interval_must_be_shorter_than_lifetime() {
        let config = Config {
            session_lifetime_secs: 60,
            session_renew_interval_secs: 60,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_lifetime_upper_bound() {
        let config = Config {
            session_lifetime_secs: u64::MAX,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            session_lifetime_secs: MAX_SESSION_LIFETIME_SECS,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }
}

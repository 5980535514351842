//! 세션 인증 단계
//!
//! 세션 토큰을 쿠키 → 헤더 → 쿼리 파라미터 순서로 찾고 검증합니다.
//! 실패하면 401을 반환하거나, 리다이렉트 모드에서는 로그인 페이지로 보냅니다.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, Uri};
use axum::middleware::Next;
use axum::response::Response;

use crate::config::Config;
use crate::context::PrincipalContext;
use crate::error::{GatewayError, Result};
use crate::state::AppState;

/// 세션 토큰 인증
pub async fn extract_api_key(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let raw_token = session_token(req.headers(), req.uri(), &state.config);
    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let auth = match state.validator.validate(raw_token.as_deref(), remote_ip).await {
        Ok(auth) => auth,
        Err(e) if e.is_unauthenticated() && state.config.redirect_to_login => {
            tracing::debug!("Rejected credential, redirecting to login: {}", e);
            return Err(GatewayError::Redirect {
                location: login_location(&state.config, &e.public_message(), req.uri()),
            });
        }
        Err(e) => return Err(e.into()),
    };

    PrincipalContext::of(&mut req).set_authenticated(auth.api_key, auth.user);
    Ok(next.run(req).await)
}

/// 쿠키 → 헤더 → 쿼리 순서로 세션 토큰 조회
fn session_token(headers: &HeaderMap, uri: &Uri, config: &Config) -> Option<String> {
    cookie_value(headers, &config.session_cookie)
        .or_else(|| {
            headers
                .get(config.session_header.as_str())
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
        .or_else(|| {
            uri.query().and_then(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .find(|(name, value)| name == config.session_query.as_str() && !value.is_empty())
                    .map(|(_, value)| value.into_owned())
            })
        })
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// 로그인 페이지 주소 (`message`, `redirect` 포함)
fn login_location(config: &Config, message: &str, uri: &Uri) -> String {
    let redirect = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("message", message)
        .append_pair("redirect", redirect)
        .finish();
    format!("{}?{}", config.login_path, query)
}

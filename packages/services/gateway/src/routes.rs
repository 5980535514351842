//! 라우터 구성
//!
//! 경로 해석 단계는 라우트별로 붙이고(`route_layer`), 세션 인증은 `/api` 아래 전체에 붙입니다.
//! `route_layer`는 나중에 붙인 것이 먼저 실행됩니다.

use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{
    self, extract_api_key, extract_user_param, extract_workspace_agent_param,
    extract_workspace_param,
};
use crate::state::AppState;

/// 라우터 생성
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route(
            "/api/v2/users/{user}",
            get(handlers::get_user)
                .route_layer(from_fn_with_state(state.clone(), extract_user_param)),
        )
        .route(
            "/api/v2/workspaces/{workspace}",
            get(handlers::get_workspace)
                .route_layer(from_fn_with_state(state.clone(), extract_workspace_param)),
        )
        .route(
            "/api/v2/users/{user}/workspace/{workspace}",
            get(handlers::get_workspace)
                .route_layer(from_fn_with_state(state.clone(), extract_workspace_param))
                .route_layer(from_fn_with_state(state.clone(), extract_user_param)),
        )
        .route(
            "/api/v2/users/{user}/agents/{workspace_and_agent}",
            get(handlers::get_workspace_agent)
                .route_layer(from_fn_with_state(
                    state.clone(),
                    extract_workspace_agent_param,
                ))
                .route_layer(from_fn_with_state(state.clone(), extract_user_param)),
        )
        .route_layer(from_fn_with_state(state.clone(), extract_api_key));

    Router::new()
        .merge(api)
        // Health check
        .route("/health", get(handlers::health_check))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(from_fn(middleware::request_id))
        // State
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::StatusCode;
    use tower::ServiceExt;
    use wsg_core::store::{MemoryStore, Store};

    use crate::config::Config;
    use crate::testing::{body_json, body_text, seed_session, seed_workspace, test_state, user};

    fn get_with_token(uri: &str, token: &str) -> Request {
        Request::builder()
            .uri(uri)
            .header("Session-Token", token)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_needs_no_session() {
        let app = create_router(test_state(Arc::new(MemoryStore::new()), Config::default()));

        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-request-id"));
        assert_eq!(body_text(resp).await, "ok");
    }

    #[tokio::test]
    async fn test_unauthenticated_error_carries_request_id() {
        let app = create_router(test_state(Arc::new(MemoryStore::new()), Config::default()));

        let resp = app
            .oneshot(Request::builder().uri("/api/v2/users/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let request_id = resp.headers()["x-request-id"].to_str().unwrap().to_string();
        let body = body_json(resp).await;
        assert_eq!(body["requestId"], request_id.as_str());
    }

    #[tokio::test]
    async fn test_client_request_id_is_echoed() {
        let app = create_router(test_state(Arc::new(MemoryStore::new()), Config::default()));

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/v2/users/me")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.headers()["x-request-id"], "req-42");
        assert_eq!(body_json(resp).await["requestId"], "req-42");
    }

    #[tokio::test]
    async fn test_user_param() {
        let store = Arc::new(MemoryStore::new());
        let (token, alice) = seed_session(&store, "alice").await;
        let bob = user("bob");
        store.insert_user(&bob).await.unwrap();
        let app = create_router(test_state(store, Config::default()));

        let resp = app
            .clone()
            .oneshot(get_with_token("/api/v2/users/me", &token))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["id"], alice.id.to_string());

        let resp = app
            .clone()
            .oneshot(get_with_token(&format!("/api/v2/users/{}", bob.id), &token))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["username"], "bob");

        let resp = app
            .oneshot(get_with_token("/api/v2/users/carol", &token))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_workspace_param() {
        let store = Arc::new(MemoryStore::new());
        let (token, alice) = seed_session(&store, "alice").await;
        let workspace = seed_workspace(&store, &alice, "dev", &[]).await;
        let app = create_router(test_state(store, Config::default()));

        // 소유자 없이 ID로
        let resp = app
            .clone()
            .oneshot(get_with_token(
                &format!("/api/v2/workspaces/{}", workspace.id),
                &token,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["name"], "dev");

        // 소유자 없이 이름으로
        let resp = app
            .clone()
            .oneshot(get_with_token("/api/v2/workspaces/dev", &token))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["message"], "Invalid workspace id.");

        // 소유자 범위 이름으로
        let resp = app
            .clone()
            .oneshot(get_with_token("/api/v2/users/me/workspace/dev", &token))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["id"], workspace.id.to_string());

        let resp = app
            .oneshot(get_with_token("/api/v2/users/me/workspace/prod", &token))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["message"], "Workspace not found.");
    }

    #[tokio::test]
    async fn test_workspace_agent_param() {
        let store = Arc::new(MemoryStore::new());
        let (token, alice) = seed_session(&store, "alice").await;
        seed_workspace(
            &store,
            &alice,
            "dev",
            &[("resource-a", &["agent-one"]), ("resource-b", &["agent-two"])],
        )
        .await;
        let app = create_router(test_state(store, Config::default()));

        let resp = app
            .clone()
            .oneshot(get_with_token("/api/v2/users/alice/agents/dev.agent-two", &token))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["workspace"]["name"], "dev");
        assert_eq!(body["agent"]["name"], "agent-two");

        let resp = app
            .clone()
            .oneshot(get_with_token("/api/v2/users/alice/agents/dev", &token))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await["message"],
            "More than one agent exists, but no agent specified."
        );

        let resp = app
            .oneshot(get_with_token("/api/v2/users/alice/agents/dev.nope", &token))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await["message"],
            "No agent exists with the name nope."
        );
    }

    #[tokio::test]
    async fn test_resolvers_do_not_run_without_session() {
        let store = Arc::new(MemoryStore::new());
        let (_, alice) = seed_session(&store, "alice").await;
        seed_workspace(&store, &alice, "dev", &[("resource-a", &["agent-one"])]).await;
        let app = create_router(test_state(store, Config::default()));

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/v2/users/alice/agents/dev")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}

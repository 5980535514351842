//! wsg-gateway
//!
//! 세션 인증과 워크스페이스 경로 해석 미들웨어를 붙인 HTTP 서버입니다.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wsg_core::auth::OAuthConfigs;
use wsg_gateway::store::SqliteStore;
use wsg_gateway::{create_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wsg_gateway=debug,wsg_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 설정 로드
    let config = Config::from_env()?;
    tracing::info!("Starting gateway with config: {:?}", config);

    // 저장소 초기화
    let store = SqliteStore::connect(&config.db_url).await?;

    // OAuth 제공자 클라이언트는 배포 환경에서 등록
    let state = Arc::new(AppState::new(config.clone(), Arc::new(store), OAuthConfigs::new()));

    // 라우터 구성
    let app = create_router(state);

    // 서버 시작
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Gateway listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

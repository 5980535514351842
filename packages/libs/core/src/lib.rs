//! wsg-core: 워크스페이스 게이트웨이 공통 핵심 라이브러리
//!
//! 요청마다 세션 토큰을 인증하고, 요청 경로가 가리키는 사용자/워크스페이스/에이전트를 해석하는
//! 프레임워크 독립 로직을 제공합니다.
//!
//! # 모듈 구조
//!
//! - `auth`: 세션 토큰 파싱, 세션 수명 정책, OAuth Refresh, 검증기
//! - `resolve`: 경로 값(`user`, `workspace`, `workspace_and_agent`) 해석
//! - `store`: 저장소 트레이트와 인메모리 구현
//! - `model`: 저장소 레코드
//! - `error`: 공통 에러 타입
//! - `id`: ID 타입

pub mod auth;
pub mod error;
pub mod id;
pub mod model;
pub mod resolve;
pub mod store;

pub use error::{Error, Result};

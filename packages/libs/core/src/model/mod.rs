//! 도메인 레코드
//!
//! 저장소가 소유하는 레코드들의 읽기 전용 표현입니다.
//! 코어는 요청 범위에서만 이 값들을 들고 있고, 요청 간에 캐시하지 않습니다.

mod user;
mod workspace;

pub use user::{User, UserLink};
pub use workspace::{
    ProvisionerJob, ProvisionerJobType, Workspace, WorkspaceAgent, WorkspaceBuild,
    WorkspaceResource, WorkspaceTransition,
};

/// 저장된 열거형 문자열이 알려진 값이 아님
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

//! Gateway 앱 상태

use std::sync::Arc;

use wsg_core::auth::{CredentialValidator, OAuthConfigs};
use wsg_core::store::Store;

use crate::config::Config;

/// 앱 상태
///
/// 모든 미들웨어와 핸들러에서 공유하는 상태입니다. 요청 간에 바뀌는 값은 저장소에만 있습니다.
pub struct AppState {
    /// 설정
    pub config: Config,

    /// 저장소
    pub store: Arc<dyn Store>,

    /// 세션 토큰 검증기
    pub validator: CredentialValidator,
}

impl AppState {
    /// 새 상태 생성
    pub fn new(config: Config, store: Arc<dyn Store>, oauth: OAuthConfigs) -> Self {
        let validator = CredentialValidator::new(store.clone(), oauth, config.session());
        Self {
            config,
            store,
            validator,
        }
    }
}

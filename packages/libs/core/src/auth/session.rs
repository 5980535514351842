//! 세션 수명 정책
//!
//! 슬라이딩 만료와 마지막 사용 시각 쓰기 제한의 판정 규칙입니다.
//! 판정은 순수 함수이며, 저장은 검증기가 담당합니다.

use std::net::IpAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// 세션 설정
///
/// 프로세스 전역 값이 아니라 검증기 생성 시 주입됩니다.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// 세션 전체 수명 (키별 수명이 없을 때)
    pub lifetime: Duration,

    /// 연장 간격
    ///
    /// 남은 시간이 `lifetime - renew_interval` 아래로 떨어지면 만료 시각을 다시 `now + lifetime`으로 밉니다.
    pub renew_interval: Duration,

    /// 마지막 사용 시각 쓰기 제한 간격
    pub last_used_throttle: Duration,

    /// OAuth Refresh 호출 제한 시간
    pub refresh_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime: Duration::from_secs(24 * 60 * 60),
            renew_interval: Duration::from_secs(60 * 60),
            last_used_throttle: Duration::from_secs(60 * 60),
            refresh_timeout: Duration::from_secs(10),
        }
    }
}

impl SessionConfig {
    /// 키에 적용할 세션 수명 (표현할 수 없는 값이면 `None`)
    pub fn lifetime_for(&self, lifetime_seconds: i64) -> Option<chrono::Duration> {
        if lifetime_seconds > 0 {
            chrono::Duration::try_seconds(lifetime_seconds)
        } else {
            chrono::Duration::from_std(self.lifetime).ok()
        }
    }

    /// 슬라이딩 연장이 필요하면 새 만료 시각 반환
    ///
    /// 수명이 범위를 벗어나 새 만료 시각을 계산할 수 없으면 연장하지 않습니다.
    pub fn renewed_expiry(
        &self,
        expires_at: DateTime<Utc>,
        lifetime_seconds: i64,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let lifetime = self.lifetime_for(lifetime_seconds)?;
        let renewed = now.checked_add_signed(lifetime)?;
        let threshold = lifetime.checked_sub(&to_chrono(self.renew_interval))?;
        (expires_at.signed_duration_since(now) < threshold).then_some(renewed)
    }

    /// 마지막 사용 시각을 기록해야 하는지
    ///
    /// 쓰기 제한 간격이 지났거나 접속 주소가 바뀐 경우에만 기록합니다.
    pub fn should_touch(
        &self,
        last_used: DateTime<Utc>,
        stored_ip: Option<IpAddr>,
        remote_ip: Option<IpAddr>,
        now: DateTime<Utc>,
    ) -> bool {
        let elapsed = now - last_used;
        let ip_changed = matches!(remote_ip, Some(ip) if stored_ip != Some(ip));
        elapsed > to_chrono(self.last_used_throttle) || ip_changed
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

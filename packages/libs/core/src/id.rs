//! 식별자 타입
//!
//! 레코드 종류별로 UUID를 감싼 타입을 둬서 서로 다른 ID가 섞이지 않게 합니다.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// 새 랜덤 ID 생성 (UUID v4)
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id!(
    /// 사용자(Principal) ID
    UserId
);
uuid_id!(
    /// 템플릿 ID
    TemplateId
);
uuid_id!(
    /// 워크스페이스 ID
    WorkspaceId
);
uuid_id!(
    /// 워크스페이스 빌드 ID
    WorkspaceBuildId
);
uuid_id!(
    /// 프로비저너 Job ID
    ProvisionerJobId
);
uuid_id!(
    /// 워크스페이스 리소스 ID
    WorkspaceResourceId
);
uuid_id!(
    /// 워크스페이스 에이전트 ID
    WorkspaceAgentId
);

/// 세션 토큰 문자 집합
///
/// 구분자(`-`)가 섞이지 않도록 영숫자만 사용합니다.
const TOKEN_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// 암호학적으로 안전한 난수로 고정 길이 문자열 생성
pub fn random_string(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..TOKEN_ALPHABET.len());
            TOKEN_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_string_length_and_alphabet() {
        let value = random_string(22);
        assert_eq!(value.len(), 22);
        assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(value, random_string(22));
    }

    #[test]
    fn test_id_parse_roundtrip() {
        let id = WorkspaceId::new();
        let parsed: WorkspaceId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("dev".parse::<WorkspaceId>().is_err());
    }
}

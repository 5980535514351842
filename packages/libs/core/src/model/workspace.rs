use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{
    ProvisionerJobId, TemplateId, UserId, WorkspaceAgentId, WorkspaceBuildId, WorkspaceId,
    WorkspaceResourceId,
};
use crate::model::ParseEnumError;

/// 워크스페이스
///
/// 이름은 소유자 안에서만 고유합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub owner_id: UserId,
    pub template_id: TemplateId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// 삭제 표시 (이름으로는 조회되지 않음)
    #[serde(default)]
    pub deleted: bool,
}

/// 빌드 전이 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceTransition {
    #[default]
    Start,
    Stop,
    Delete,
}

impl WorkspaceTransition {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceTransition::Start => "start",
            WorkspaceTransition::Stop => "stop",
            WorkspaceTransition::Delete => "delete",
        }
    }
}

impl FromStr for WorkspaceTransition {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "start" => Ok(WorkspaceTransition::Start),
            "stop" => Ok(WorkspaceTransition::Stop),
            "delete" => Ok(WorkspaceTransition::Delete),
            _ => Err(ParseEnumError {
                kind: "workspace transition",
                value: value.to_string(),
            }),
        }
    }
}

/// 워크스페이스 빌드
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceBuild {
    pub id: WorkspaceBuildId,
    pub workspace_id: WorkspaceId,
    pub job_id: ProvisionerJobId,
    pub build_number: i32,
    pub transition: WorkspaceTransition,
    pub created_at: DateTime<Utc>,
}

/// 프로비저너 Job 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionerJobType {
    TemplateVersionImport,
    WorkspaceBuild,
}

impl ProvisionerJobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisionerJobType::TemplateVersionImport => "template_version_import",
            ProvisionerJobType::WorkspaceBuild => "workspace_build",
        }
    }
}

impl FromStr for ProvisionerJobType {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "template_version_import" => Ok(ProvisionerJobType::TemplateVersionImport),
            "workspace_build" => Ok(ProvisionerJobType::WorkspaceBuild),
            _ => Err(ParseEnumError {
                kind: "provisioner job type",
                value: value.to_string(),
            }),
        }
    }
}

/// 프로비저너 Job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionerJob {
    pub id: ProvisionerJobId,
    pub job_type: ProvisionerJobType,
    pub created_at: DateTime<Utc>,
}

/// Job이 만든 리소스
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceResource {
    pub id: WorkspaceResourceId,
    pub job_id: ProvisionerJobId,
    pub name: String,
    pub resource_type: String,
    pub created_at: DateTime<Utc>,
}

/// 리소스에 붙은 에이전트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceAgent {
    pub id: WorkspaceAgentId,
    pub resource_id: WorkspaceResourceId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_string_roundtrip() {
        for t in [
            WorkspaceTransition::Start,
            WorkspaceTransition::Stop,
            WorkspaceTransition::Delete,
        ] {
            assert_eq!(t.as_str().parse::<WorkspaceTransition>(), Ok(t));
        }
        assert_eq!(
            "workspace_build".parse::<ProvisionerJobType>(),
            Ok(ProvisionerJobType::WorkspaceBuild)
        );
        let err = "build".parse::<ProvisionerJobType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown provisioner job type value \"build\"");
    }

    #[test]
    fn test_workspace_deleted_defaults_to_false() {
        let json = serde_json::json!({
            "id": "6f1c2f0e-8a43-4f5d-9d53-3e1f3b0b7a11",
            "owner_id": "0b8a5f62-5b8c-4a41-8a1e-2d7c0e4f9a22",
            "template_id": "a3d9e1c4-7f2b-4e6a-b5c8-9d0e1f2a3b33",
            "name": "dev",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        });

        let workspace: Workspace = serde_json::from_value(json).unwrap();
        assert!(!workspace.deleted);
        assert_eq!(workspace.name, "dev");
    }
}

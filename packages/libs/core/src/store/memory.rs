//! 인메모리 저장소
//!
//! 테스트와 로컬 개발용 `Store` 구현입니다. 레코드는 삽입 순서대로 보관됩니다.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::auth::{ApiKey, LoginType};
use crate::id::{ProvisionerJobId, UserId, WorkspaceId, WorkspaceResourceId};
use crate::model::{
    ProvisionerJob, User, UserLink, Workspace, WorkspaceAgent, WorkspaceBuild, WorkspaceResource,
};

use super::{Store, StoreError, UpdateApiKeyParams, UpdateUserLinkParams};

#[derive(Default)]
struct Tables {
    api_keys: HashMap<String, ApiKey>,
    users: Vec<User>,
    user_links: Vec<UserLink>,
    workspaces: Vec<Workspace>,
    builds: Vec<WorkspaceBuild>,
    jobs: Vec<ProvisionerJob>,
    resources: Vec<WorkspaceResource>,
    agents: Vec<WorkspaceAgent>,
}

/// 인메모리 `Store`
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn get_api_key_by_id(&self, id: &str) -> Result<ApiKey, StoreError> {
        self.read()?
            .api_keys
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert_api_key(&self, key: &ApiKey) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.api_keys.contains_key(key.id.as_str()) {
            return Err(StoreError::AlreadyExists);
        }
        tables.api_keys.insert(key.id.0.clone(), key.clone());
        Ok(())
    }

    async fn update_api_key(&self, params: &UpdateApiKeyParams) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let key = tables
            .api_keys
            .get_mut(&params.id)
            .ok_or(StoreError::NotFound)?;
        key.last_used = params.last_used;
        key.expires_at = params.expires_at;
        key.ip_address = params.ip_address;
        key.updated_at = params.updated_at;
        Ok(())
    }

    async fn get_user_by_id(&self, id: &UserId) -> Result<User, StoreError> {
        self.read()?
            .users
            .iter()
            .find(|u| &u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        self.read()?
            .users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables
            .users
            .iter()
            .any(|u| u.id == user.id || u.username.eq_ignore_ascii_case(&user.username))
        {
            return Err(StoreError::AlreadyExists);
        }
        tables.users.push(user.clone());
        Ok(())
    }

    async fn get_user_link(
        &self,
        user_id: &UserId,
        login_type: LoginType,
    ) -> Result<UserLink, StoreError> {
        self.read()?
            .user_links
            .iter()
            .find(|l| &l.user_id == user_id && l.login_type == login_type)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert_user_link(&self, link: &UserLink) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables
            .user_links
            .iter()
            .any(|l| l.user_id == link.user_id && l.login_type == link.login_type)
        {
            return Err(StoreError::AlreadyExists);
        }
        tables.user_links.push(link.clone());
        Ok(())
    }

    async fn update_user_link(&self, params: &UpdateUserLinkParams) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let link = tables
            .user_links
            .iter_mut()
            .find(|l| l.user_id == params.user_id && l.login_type == params.login_type)
            .ok_or(StoreError::NotFound)?;
        link.oauth_access_token = params.oauth_access_token.clone();
        link.oauth_refresh_token = params.oauth_refresh_token.clone();
        link.oauth_expiry = params.oauth_expiry;
        Ok(())
    }

    async fn get_workspace_by_id(&self, id: &WorkspaceId) -> Result<Workspace, StoreError> {
        self.read()?
            .workspaces
            .iter()
            .find(|w| &w.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_workspace_by_owner_and_name(
        &self,
        owner_id: &UserId,
        name: &str,
    ) -> Result<Workspace, StoreError> {
        self.read()?
            .workspaces
            .iter()
            .find(|w| &w.owner_id == owner_id && !w.deleted && w.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert_workspace(&self, workspace: &Workspace) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        let duplicate = tables.workspaces.iter().any(|w| {
            w.id == workspace.id
                || (w.owner_id == workspace.owner_id
                    && !w.deleted
                    && w.name.eq_ignore_ascii_case(&workspace.name))
        });
        if duplicate {
            return Err(StoreError::AlreadyExists);
        }
        tables.workspaces.push(workspace.clone());
        Ok(())
    }

    async fn get_latest_workspace_build(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<WorkspaceBuild, StoreError> {
        // 같은 순번이면 나중에 들어온 빌드가 최신
        self.read()?
            .builds
            .iter()
            .filter(|b| &b.workspace_id == workspace_id)
            .max_by_key(|b| (b.build_number, b.created_at))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert_workspace_build(&self, build: &WorkspaceBuild) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.builds.iter().any(|b| b.id == build.id) {
            return Err(StoreError::AlreadyExists);
        }
        tables.builds.push(build.clone());
        Ok(())
    }

    async fn get_provisioner_job_by_id(
        &self,
        id: &ProvisionerJobId,
    ) -> Result<ProvisionerJob, StoreError> {
        self.read()?
            .jobs
            .iter()
            .find(|j| &j.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert_provisioner_job(&self, job: &ProvisionerJob) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.jobs.iter().any(|j| j.id == job.id) {
            return Err(StoreError::AlreadyExists);
        }
        tables.jobs.push(job.clone());
        Ok(())
    }

    async fn list_workspace_resources_by_job(
        &self,
        job_id: &ProvisionerJobId,
    ) -> Result<Vec<WorkspaceResource>, StoreError> {
        Ok(self
            .read()?
            .resources
            .iter()
            .filter(|r| &r.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn insert_workspace_resource(
        &self,
        resource: &WorkspaceResource,
    ) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.resources.iter().any(|r| r.id == resource.id) {
            return Err(StoreError::AlreadyExists);
        }
        tables.resources.push(resource.clone());
        Ok(())
    }

    async fn list_workspace_agents_by_resources(
        &self,
        resource_ids: &[WorkspaceResourceId],
    ) -> Result<Vec<WorkspaceAgent>, StoreError> {
        let tables = self.read()?;
        Ok(resource_ids
            .iter()
            .flat_map(|id| tables.agents.iter().filter(move |a| &a.resource_id == id))
            .cloned()
            .collect())
    }

    async fn insert_workspace_agent(&self, agent: &WorkspaceAgent) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.agents.iter().any(|a| a.id == agent.id) {
            return Err(StoreError::AlreadyExists);
        }
        tables.agents.push(agent.clone());
        Ok(())
    }
}

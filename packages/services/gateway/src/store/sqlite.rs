//! SQLite 저장소
//!
//! UUID/시각/열거형은 TEXT로, Secret 해시는 BLOB으로 저장합니다.
//! 시각은 나노초 RFC3339(UTC)로 기록해 문자열 정렬이 시간 순서와 같습니다.

use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use wsg_core::auth::{ApiKey, ApiKeyId, LoginType};
use wsg_core::id::{ProvisionerJobId, UserId, WorkspaceId, WorkspaceResourceId};
use wsg_core::model::{
    ParseEnumError, ProvisionerJob, User, UserLink, Workspace, WorkspaceAgent, WorkspaceBuild,
    WorkspaceResource,
};
use wsg_core::store::{Store, StoreError, UpdateApiKeyParams, UpdateUserLinkParams};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(db_url: &str) -> anyhow::Result<Self> {
        // 인메모리 DB는 연결마다 별개이므로 연결 하나를 계속 유지
        let options = if db_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = options.connect(db_url).await?;
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> anyhow::Result<()> {
        let queries = [
            r#"CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE COLLATE NOCASE,
                email TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );"#,
            r#"CREATE TABLE IF NOT EXISTS api_keys (
                id TEXT PRIMARY KEY,
                hashed_secret BLOB NOT NULL,
                user_id TEXT NOT NULL REFERENCES users(id),
                login_type TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                last_used TEXT NOT NULL,
                ip_address TEXT,
                lifetime_seconds INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );"#,
            r#"CREATE TABLE IF NOT EXISTS user_links (
                user_id TEXT NOT NULL REFERENCES users(id),
                login_type TEXT NOT NULL,
                linked_id TEXT NOT NULL,
                oauth_access_token TEXT NOT NULL,
                oauth_refresh_token TEXT NOT NULL,
                oauth_expiry TEXT,
                PRIMARY KEY (user_id, login_type)
            );"#,
            r#"CREATE TABLE IF NOT EXISTS workspaces (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL REFERENCES users(id),
                template_id TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted INTEGER NOT NULL DEFAULT 0
            );"#,
            r#"CREATE UNIQUE INDEX IF NOT EXISTS idx_workspaces_owner_name
                ON workspaces (owner_id, name COLLATE NOCASE) WHERE deleted = 0;"#,
            r#"CREATE TABLE IF NOT EXISTS provisioner_jobs (
                id TEXT PRIMARY KEY,
                job_type TEXT NOT NULL,
                created_at TEXT NOT NULL
            );"#,
            r#"CREATE TABLE IF NOT EXISTS workspace_builds (
                id TEXT PRIMARY KEY,
                workspace_id TEXT NOT NULL REFERENCES workspaces(id),
                job_id TEXT NOT NULL,
                build_number INTEGER NOT NULL,
                transition TEXT NOT NULL,
                created_at TEXT NOT NULL
            );"#,
            r#"CREATE TABLE IF NOT EXISTS workspace_resources (
                id TEXT PRIMARY KEY,
                job_id TEXT NOT NULL,
                name TEXT NOT NULL,
                resource_type TEXT NOT NULL,
                created_at TEXT NOT NULL
            );"#,
            r#"CREATE TABLE IF NOT EXISTS workspace_agents (
                id TEXT PRIMARY KEY,
                resource_id TEXT NOT NULL REFERENCES workspace_resources(id),
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );"#,
        ];

        for q in queries {
            sqlx::query(q).execute(&self.pool).await?;
        }

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversions
// ─────────────────────────────────────────────────────────────────────────────

fn map_err(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::AlreadyExists,
        other => StoreError::Backend(other.to_string()),
    }
}

fn ts(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_ts(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Backend(format!("invalid timestamp {:?}: {}", value, e)))
}

fn parse_id<T>(value: &str) -> Result<T, StoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| StoreError::Backend(format!("invalid id {:?}: {}", value, e)))
}

fn parse_enum<T: FromStr<Err = ParseEnumError>>(value: &str) -> Result<T, StoreError> {
    value.parse().map_err(|e: ParseEnumError| StoreError::Backend(e.to_string()))
}

#[derive(sqlx::FromRow)]
struct ApiKeyRow {
    id: String,
    hashed_secret: Vec<u8>,
    user_id: String,
    login_type: String,
    expires_at: String,
    last_used: String,
    ip_address: Option<String>,
    lifetime_seconds: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ApiKeyRow> for ApiKey {
    type Error = StoreError;

    fn try_from(row: ApiKeyRow) -> Result<Self, Self::Error> {
        let ip_address = row
            .ip_address
            .as_deref()
            .map(IpAddr::from_str)
            .transpose()
            .map_err(|e| StoreError::Backend(format!("invalid ip address: {}", e)))?;

        Ok(ApiKey {
            id: ApiKeyId::new(row.id),
            hashed_secret: row.hashed_secret,
            user_id: parse_id(&row.user_id)?,
            login_type: parse_enum(&row.login_type)?,
            expires_at: parse_ts(&row.expires_at)?,
            last_used: parse_ts(&row.last_used)?,
            ip_address,
            lifetime_seconds: row.lifetime_seconds,
            created_at: parse_ts(&row.created_at)?,
            updated_at: parse_ts(&row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: parse_id(&row.id)?,
            username: row.username,
            email: row.email,
            created_at: parse_ts(&row.created_at)?,
            updated_at: parse_ts(&row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserLinkRow {
    user_id: String,
    login_type: String,
    linked_id: String,
    oauth_access_token: String,
    oauth_refresh_token: String,
    oauth_expiry: Option<String>,
}

impl TryFrom<UserLinkRow> for UserLink {
    type Error = StoreError;

    fn try_from(row: UserLinkRow) -> Result<Self, Self::Error> {
        Ok(UserLink {
            user_id: parse_id(&row.user_id)?,
            login_type: parse_enum(&row.login_type)?,
            linked_id: row.linked_id,
            oauth_access_token: row.oauth_access_token,
            oauth_refresh_token: row.oauth_refresh_token,
            oauth_expiry: row.oauth_expiry.as_deref().map(parse_ts).transpose()?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct WorkspaceRow {
    id: String,
    owner_id: String,
    template_id: String,
    name: String,
    created_at: String,
    updated_at: String,
    deleted: bool,
}

impl TryFrom<WorkspaceRow> for Workspace {
    type Error = StoreError;

    fn try_from(row: WorkspaceRow) -> Result<Self, Self::Error> {
        Ok(Workspace {
            id: parse_id(&row.id)?,
            owner_id: parse_id(&row.owner_id)?,
            template_id: parse_id(&row.template_id)?,
            name: row.name,
            created_at: parse_ts(&row.created_at)?,
            updated_at: parse_ts(&row.updated_at)?,
            deleted: row.deleted,
        })
    }
}

#[derive(sqlx::FromRow)]
struct WorkspaceBuildRow {
    id: String,
    workspace_id: String,
    job_id: String,
    build_number: i32,
    transition: String,
    created_at: String,
}

impl TryFrom<WorkspaceBuildRow> for WorkspaceBuild {
    type Error = StoreError;

    fn try_from(row: WorkspaceBuildRow) -> Result<Self, Self::Error> {
        Ok(WorkspaceBuild {
            id: parse_id(&row.id)?,
            workspace_id: parse_id(&row.workspace_id)?,
            job_id: parse_id(&row.job_id)?,
            build_number: row.build_number,
            transition: parse_enum(&row.transition)?,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProvisionerJobRow {
    id: String,
    job_type: String,
    created_at: String,
}

impl TryFrom<ProvisionerJobRow> for ProvisionerJob {
    type Error = StoreError;

    fn try_from(row: ProvisionerJobRow) -> Result<Self, Self::Error> {
        Ok(ProvisionerJob {
            id: parse_id(&row.id)?,
            job_type: parse_enum(&row.job_type)?,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct WorkspaceResourceRow {
    id: String,
    job_id: String,
    name: String,
    resource_type: String,
    created_at: String,
}

impl TryFrom<WorkspaceResourceRow> for WorkspaceResource {
    type Error = StoreError;

    fn try_from(row: WorkspaceResourceRow) -> Result<Self, Self::Error> {
        Ok(WorkspaceResource {
            id: parse_id(&row.id)?,
            job_id: parse_id(&row.job_id)?,
            name: row.name,
            resource_type: row.resource_type,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct WorkspaceAgentRow {
    id: String,
    resource_id: String,
    name: String,
    created_at: String,
}

impl TryFrom<WorkspaceAgentRow> for WorkspaceAgent {
    type Error = StoreError;

    fn try_from(row: WorkspaceAgentRow) -> Result<Self, Self::Error> {
        Ok(WorkspaceAgent {
            id: parse_id(&row.id)?,
            resource_id: parse_id(&row.resource_id)?,
            name: row.name,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

/// 갱신된 행이 없으면 NotFound
fn ensure_updated(result: sqlx::sqlite::SqliteQueryResult) -> Result<(), StoreError> {
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl Store for SqliteStore {
    async fn get_api_key_by_id(&self, id: &str) -> Result<ApiKey, StoreError> {
        sqlx::query_as::<_, ApiKeyRow>(
            r#"SELECT id, hashed_secret, user_id, login_type, expires_at, last_used, ip_address,
                      lifetime_seconds, created_at, updated_at
               FROM api_keys WHERE id = ?1"#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?
        .try_into()
    }

    async fn insert_api_key(&self, key: &ApiKey) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO api_keys (id, hashed_secret, user_id, login_type, expires_at, last_used,
                                     ip_address, lifetime_seconds, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
        )
        .bind(key.id.as_str())
        .bind(&key.hashed_secret)
        .bind(key.user_id.to_string())
        .bind(key.login_type.as_str())
        .bind(ts(key.expires_at))
        .bind(ts(key.last_used))
        .bind(key.ip_address.map(|ip| ip.to_string()))
        .bind(key.lifetime_seconds)
        .bind(ts(key.created_at))
        .bind(ts(key.updated_at))
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn update_api_key(&self, params: &UpdateApiKeyParams) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"UPDATE api_keys SET last_used = ?2, expires_at = ?3, ip_address = ?4, updated_at = ?5
               WHERE id = ?1"#,
        )
        .bind(&params.id)
        .bind(ts(params.last_used))
        .bind(ts(params.expires_at))
        .bind(params.ip_address.map(|ip| ip.to_string()))
        .bind(ts(params.updated_at))
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        ensure_updated(result)
    }

    async fn get_user_by_id(&self, id: &UserId) -> Result<User, StoreError> {
        sqlx::query_as::<_, UserRow>(
            r#"SELECT id, username, email, created_at, updated_at FROM users WHERE id = ?1"#,
        )
        .bind(id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?
        .try_into()
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, UserRow>(
            r#"SELECT id, username, email, created_at, updated_at FROM users
               WHERE username = ?1 COLLATE NOCASE"#,
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?
        .try_into()
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO users (id, username, email, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.email)
        .bind(ts(user.created_at))
        .bind(ts(user.updated_at))
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn get_user_link(
        &self,
        user_id: &UserId,
        login_type: LoginType,
    ) -> Result<UserLink, StoreError> {
        sqlx::query_as::<_, UserLinkRow>(
            r#"SELECT user_id, login_type, linked_id, oauth_access_token, oauth_refresh_token,
                      oauth_expiry
               FROM user_links WHERE user_id = ?1 AND login_type = ?2"#,
        )
        .bind(user_id.to_string())
        .bind(login_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?
        .try_into()
    }

    async fn insert_user_link(&self, link: &UserLink) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO user_links (user_id, login_type, linked_id, oauth_access_token,
                                       oauth_refresh_token, oauth_expiry)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
        )
        .bind(link.user_id.to_string())
        .bind(link.login_type.as_str())
        .bind(&link.linked_id)
        .bind(&link.oauth_access_token)
        .bind(&link.oauth_refresh_token)
        .bind(link.oauth_expiry.map(ts))
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn update_user_link(&self, params: &UpdateUserLinkParams) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"UPDATE user_links
               SET oauth_access_token = ?3, oauth_refresh_token = ?4, oauth_expiry = ?5
               WHERE user_id = ?1 AND login_type = ?2"#,
        )
        .bind(params.user_id.to_string())
        .bind(params.login_type.as_str())
        .bind(&params.oauth_access_token)
        .bind(&params.oauth_refresh_token)
        .bind(params.oauth_expiry.map(ts))
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        ensure_updated(result)
    }

    async fn get_workspace_by_id(&self, id: &WorkspaceId) -> Result<Workspace, StoreError> {
        sqlx::query_as::<_, WorkspaceRow>(
            r#"SELECT id, owner_id, template_id, name, created_at, updated_at, deleted
               FROM workspaces WHERE id = ?1"#,
        )
        .bind(id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?
        .try_into()
    }

    async fn get_workspace_by_owner_and_name(
        &self,
        owner_id: &UserId,
        name: &str,
    ) -> Result<Workspace, StoreError> {
        sqlx::query_as::<_, WorkspaceRow>(
            r#"SELECT id, owner_id, template_id, name, created_at, updated_at, deleted
               FROM workspaces
               WHERE owner_id = ?1 AND name = ?2 COLLATE NOCASE AND deleted = 0"#,
        )
        .bind(owner_id.to_string())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?
        .try_into()
    }

    async fn insert_workspace(&self, workspace: &Workspace) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO workspaces (id, owner_id, template_id, name, created_at, updated_at, deleted)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
        )
        .bind(workspace.id.to_string())
        .bind(workspace.owner_id.to_string())
        .bind(workspace.template_id.to_string())
        .bind(&workspace.name)
        .bind(ts(workspace.created_at))
        .bind(ts(workspace.updated_at))
        .bind(workspace.deleted)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn get_latest_workspace_build(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<WorkspaceBuild, StoreError> {
        sqlx::query_as::<_, WorkspaceBuildRow>(
            r#"SELECT id, workspace_id, job_id, build_number, transition, created_at
               FROM workspace_builds WHERE workspace_id = ?1
               ORDER BY build_number DESC, created_at DESC
               LIMIT 1"#,
        )
        .bind(workspace_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?
        .try_into()
    }

    async fn insert_workspace_build(&self, build: &WorkspaceBuild) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO workspace_builds (id, workspace_id, job_id, build_number, transition, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
        )
        .bind(build.id.to_string())
        .bind(build.workspace_id.to_string())
        .bind(build.job_id.to_string())
        .bind(build.build_number)
        .bind(build.transition.as_str())
        .bind(ts(build.created_at))
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn get_provisioner_job_by_id(
        &self,
        id: &ProvisionerJobId,
    ) -> Result<ProvisionerJob, StoreError> {
        sqlx::query_as::<_, ProvisionerJobRow>(
            r#"SELECT id, job_type, created_at FROM provisioner_jobs WHERE id = ?1"#,
        )
        .bind(id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?
        .try_into()
    }

    async fn insert_provisioner_job(&self, job: &ProvisionerJob) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO provisioner_jobs (id, job_type, created_at) VALUES (?1, ?2, ?3)"#,
        )
        .bind(job.id.to_string())
        .bind(job.job_type.as_str())
        .bind(ts(job.created_at))
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn list_workspace_resources_by_job(
        &self,
        job_id: &ProvisionerJobId,
    ) -> Result<Vec<WorkspaceResource>, StoreError> {
        let rows = sqlx::query_as::<_, WorkspaceResourceRow>(
            r#"SELECT id, job_id, name, resource_type, created_at
               FROM workspace_resources WHERE job_id = ?1
               ORDER BY created_at ASC, rowid ASC"#,
        )
        .bind(job_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;

        rows.into_iter().map(WorkspaceResource::try_from).collect()
    }

    async fn insert_workspace_resource(
        &self,
        resource: &WorkspaceResource,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO workspace_resources (id, job_id, name, resource_type, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
        )
        .bind(resource.id.to_string())
        .bind(resource.job_id.to_string())
        .bind(&resource.name)
        .bind(&resource.resource_type)
        .bind(ts(resource.created_at))
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn list_workspace_agents_by_resources(
        &self,
        resource_ids: &[WorkspaceResourceId],
    ) -> Result<Vec<WorkspaceAgent>, StoreError> {
        if resource_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, resource_id, name, created_at FROM workspace_agents WHERE resource_id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in resource_ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(") ORDER BY created_at ASC, rowid ASC");

        let rows = builder
            .build_query_as::<WorkspaceAgentRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;

        let mut agents = rows
            .into_iter()
            .map(WorkspaceAgent::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        // 리소스 순서 유지 (같은 리소스 안에서는 생성 순)
        agents.sort_by_key(|a| resource_ids.iter().position(|id| *id == a.resource_id));
        Ok(agents)
    }

    async fn insert_workspace_agent(&self, agent: &WorkspaceAgent) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO workspace_agents (id, resource_id, name, created_at)
               VALUES (?1, ?2, ?3, ?4)"#,
        )
        .bind(agent.id.to_string())
        .bind(agent.resource_id.to_string())
        .bind(&agent.name)
        .bind(ts(agent.created_at))
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }
}

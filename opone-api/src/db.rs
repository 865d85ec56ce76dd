//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling via deadpool-postgres plus high-level,
//! per-entity operations over parameterized SQL. This is the external
//! collaborator boundary: the rest of the system treats it as "fetch by
//! key/filter, returns rows or error".
//!
//! Partial updates use COALESCE so absent request fields leave the stored
//! column unchanged; enums travel as their canonical `Display` text.

use crate::error::{ApiError, ApiResult};
use crate::types::*;
use chrono::Utc;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use opone_core::{
    new_entity_id, EntityId, StorageError, TeamRole, TransactionDirection, UserAccount,
    ValidationError,
};
use std::str::FromStr;
use std::time::Duration;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "opone".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    ///
    /// - `OPONE_DB_HOST` (default: localhost)
    /// - `OPONE_DB_PORT` (default: 5432)
    /// - `OPONE_DB_NAME` (default: opone)
    /// - `OPONE_DB_USER` (default: postgres)
    /// - `OPONE_DB_PASSWORD` (default: empty)
    /// - `OPONE_DB_POOL_SIZE` (default: 16)
    /// - `OPONE_DB_TIMEOUT` (default: 30 seconds)
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("OPONE_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("OPONE_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("OPONE_DB_NAME").unwrap_or_else(|_| "opone".to_string()),
            user: std::env::var("OPONE_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("OPONE_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("OPONE_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("OPONE_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// ROW MAPPING HELPERS
// ============================================================================

/// Parse a TEXT column back into one of the domain enums.
///
/// A value no variant matches means the stored row is corrupt, so the
/// failure surfaces as a storage error, not a validation error.
fn parse_enum<T>(value: String, column: &str) -> ApiResult<T>
where
    T: FromStr<Err = ValidationError>,
{
    value.parse().map_err(|e: ValidationError| {
        ApiError::from(StorageError::QueryFailed {
            reason: format!("corrupt {} column: {}", column, e),
        })
    })
}

fn row_to_team_member(row: &Row) -> ApiResult<TeamMemberResponse> {
    Ok(TeamMemberResponse {
        member_id: row.get("member_id"),
        name: row.get("name"),
        email: row.get("email"),
        role: parse_enum(row.get("role"), "role")?,
        phone: row.get("phone"),
        active: row.get("active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_client(row: &Row) -> ApiResult<ClientResponse> {
    Ok(ClientResponse {
        client_id: row.get("client_id"),
        name: row.get("name"),
        company: row.get("company"),
        email: row.get("email"),
        phone: row.get("phone"),
        status: parse_enum(row.get("status"), "status")?,
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_project(row: &Row) -> ApiResult<ProjectResponse> {
    Ok(ProjectResponse {
        project_id: row.get("project_id"),
        client_id: row.get("client_id"),
        name: row.get("name"),
        description: row.get("description"),
        status: parse_enum(row.get("status"), "status")?,
        budget_cents: row.get("budget_cents"),
        start_date: row.get("start_date"),
        due_date: row.get("due_date"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_account(row: &Row) -> ApiResult<AccountResponse> {
    Ok(AccountResponse {
        account_id: row.get("account_id"),
        name: row.get("name"),
        kind: parse_enum(row.get("kind"), "kind")?,
        created_at: row.get("created_at"),
    })
}

fn row_to_transaction(row: &Row) -> ApiResult<TransactionResponse> {
    Ok(TransactionResponse {
        transaction_id: row.get("transaction_id"),
        account_id: row.get("account_id"),
        project_id: row.get("project_id"),
        description: row.get("description"),
        direction: parse_enum(row.get("direction"), "direction")?,
        amount_cents: row.get("amount_cents"),
        category: row.get("category"),
        occurred_on: row.get("occurred_on"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_opportunity(row: &Row) -> ApiResult<OpportunityResponse> {
    Ok(OpportunityResponse {
        opportunity_id: row.get("opportunity_id"),
        client_id: row.get("client_id"),
        title: row.get("title"),
        stage: parse_enum(row.get("stage"), "stage")?,
        value_cents: row.get("value_cents"),
        probability: row.get("probability"),
        expected_close: row.get("expected_close"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_communication(row: &Row) -> ApiResult<CommunicationResponse> {
    Ok(CommunicationResponse {
        communication_id: row.get("communication_id"),
        client_id: row.get("client_id"),
        member_id: row.get("member_id"),
        channel: parse_enum(row.get("channel"), "channel")?,
        subject: row.get("subject"),
        body: row.get("body"),
        occurred_at: row.get("occurred_at"),
        created_at: row.get("created_at"),
    })
}

fn row_to_user(row: &Row) -> ApiResult<UserAccount> {
    Ok(UserAccount {
        user_id: row.get("user_id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        display_name: row.get("display_name"),
        role: parse_enum(row.get("role"), "role")?,
        active: row.get("active"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

const TEAM_MEMBER_COLUMNS: &str =
    "member_id, name, email, role, phone, active, created_at, updated_at";
const CLIENT_COLUMNS: &str =
    "client_id, name, company, email, phone, status, notes, created_at, updated_at";
const PROJECT_COLUMNS: &str = "project_id, client_id, name, description, status, budget_cents, \
     start_date, due_date, created_at, updated_at";
const ACCOUNT_COLUMNS: &str = "account_id, name, kind, created_at";
const TRANSACTION_COLUMNS: &str = "transaction_id, account_id, project_id, description, \
     direction, amount_cents, category, occurred_on, created_at, updated_at";
const OPPORTUNITY_COLUMNS: &str = "opportunity_id, client_id, title, stage, value_cents, \
     probability, expected_close, created_at, updated_at";
const COMMUNICATION_COLUMNS: &str =
    "communication_id, client_id, member_id, channel, subject, body, occurred_at, created_at";
const USER_COLUMNS: &str =
    "user_id, email, password_hash, display_name, role, active, created_at";

/// Database client that wraps a connection pool and provides high-level
/// per-entity operations.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> ApiResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(ApiError::from)
    }

    /// Validate pool connectivity with a trivial round trip.
    pub async fn health_check(&self) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[]).await?;
        Ok(())
    }

    // ========================================================================
    // USER OPERATIONS (auth boundary)
    // ========================================================================

    /// Find a login account by email, case-insensitively.
    pub async fn user_find_by_email(&self, email: &str) -> ApiResult<Option<UserAccount>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                format!(
                    "SELECT {} FROM users WHERE lower(email) = lower($1)",
                    USER_COLUMNS
                ).as_str(),
                &[&email],
            )
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    /// Get a login account by id.
    pub async fn user_get(&self, id: EntityId) -> ApiResult<Option<UserAccount>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                format!("SELECT {} FROM users WHERE user_id = $1", USER_COLUMNS).as_str(),
                &[&id],
            )
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    // ========================================================================
    // TEAM MEMBER OPERATIONS
    // ========================================================================

    pub async fn team_member_create(
        &self,
        req: &CreateTeamMemberRequest,
    ) -> ApiResult<TeamMemberResponse> {
        let conn = self.get_conn().await?;
        let now = Utc::now();
        let member = TeamMemberResponse {
            member_id: new_entity_id(),
            name: req.name.clone(),
            email: req.email.clone(),
            role: req.role.unwrap_or(TeamRole::Member),
            phone: req.phone.clone(),
            active: true,
            created_at: now,
            updated_at: now,
        };

        let role_text = member.role.to_string();
        conn.execute(
            "INSERT INTO team_members (member_id, name, email, role, phone, active, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            &[
                &member.member_id,
                &member.name,
                &member.email,
                &role_text,
                &member.phone,
                &member.active,
                &member.created_at,
                &member.updated_at,
            ],
        )
        .await?;

        Ok(member)
    }

    pub async fn team_member_get(&self, id: EntityId) -> ApiResult<Option<TeamMemberResponse>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                format!(
                    "SELECT {} FROM team_members WHERE member_id = $1",
                    TEAM_MEMBER_COLUMNS
                ).as_str(),
                &[&id],
            )
            .await?;
        row.as_ref().map(row_to_team_member).transpose()
    }

    pub async fn team_member_update(
        &self,
        id: EntityId,
        req: &UpdateTeamMemberRequest,
    ) -> ApiResult<Option<TeamMemberResponse>> {
        let conn = self.get_conn().await?;
        let role_text = req.role.map(|r| r.to_string());
        let row = conn
            .query_opt(
                format!(
                    "UPDATE team_members SET \
                        name = COALESCE($2, name), \
                        email = COALESCE($3, email), \
                        role = COALESCE($4, role), \
                        phone = COALESCE($5, phone), \
                        active = COALESCE($6, active), \
                        updated_at = $7 \
                     WHERE member_id = $1 RETURNING {}",
                    TEAM_MEMBER_COLUMNS
                ).as_str(),
                &[
                    &id,
                    &req.name,
                    &req.email,
                    &role_text,
                    &req.phone,
                    &req.active,
                    &Utc::now(),
                ],
            )
            .await?;
        row.as_ref().map(row_to_team_member).transpose()
    }

    /// Delete a team member. Returns false if no row existed.
    pub async fn team_member_delete(&self, id: EntityId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute("DELETE FROM team_members WHERE member_id = $1", &[&id])
            .await?;
        Ok(deleted > 0)
    }

    pub async fn team_member_list(
        &self,
        filter: &ListTeamMembersRequest,
    ) -> ApiResult<Vec<TeamMemberResponse>> {
        let conn = self.get_conn().await?;
        let mut sql = format!("SELECT {} FROM team_members", TEAM_MEMBER_COLUMNS);
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(ref active) = filter.active {
            sql.push_str(" WHERE active = $1");
            params.push(active);
        }
        sql.push_str(" ORDER BY name");

        let rows = conn.query(sql.as_str(), &params).await?;
        rows.iter().map(row_to_team_member).collect()
    }

    // ========================================================================
    // CLIENT OPERATIONS
    // ========================================================================

    pub async fn client_create(&self, req: &CreateClientRequest) -> ApiResult<ClientResponse> {
        let conn = self.get_conn().await?;
        let now = Utc::now();
        let client = ClientResponse {
            client_id: new_entity_id(),
            name: req.name.clone(),
            company: req.company.clone(),
            email: req.email.clone(),
            phone: req.phone.clone(),
            status: req.status.unwrap_or(opone_core::ClientStatus::Lead),
            notes: req.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        let status_text = client.status.to_string();
        conn.execute(
            "INSERT INTO clients (client_id, name, company, email, phone, status, notes, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            &[
                &client.client_id,
                &client.name,
                &client.company,
                &client.email,
                &client.phone,
                &status_text,
                &client.notes,
                &client.created_at,
                &client.updated_at,
            ],
        )
        .await?;

        Ok(client)
    }

    pub async fn client_get(&self, id: EntityId) -> ApiResult<Option<ClientResponse>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                format!("SELECT {} FROM clients WHERE client_id = $1", CLIENT_COLUMNS).as_str(),
                &[&id],
            )
            .await?;
        row.as_ref().map(row_to_client).transpose()
    }

    pub async fn client_update(
        &self,
        id: EntityId,
        req: &UpdateClientRequest,
    ) -> ApiResult<Option<ClientResponse>> {
        let conn = self.get_conn().await?;
        let status_text = req.status.map(|s| s.to_string());
        let row = conn
            .query_opt(
                format!(
                    "UPDATE clients SET \
                        name = COALESCE($2, name), \
                        company = COALESCE($3, company), \
                        email = COALESCE($4, email), \
                        phone = COALESCE($5, phone), \
                        status = COALESCE($6, status), \
                        notes = COALESCE($7, notes), \
                        updated_at = $8 \
                     WHERE client_id = $1 RETURNING {}",
                    CLIENT_COLUMNS
                ).as_str(),
                &[
                    &id,
                    &req.name,
                    &req.company,
                    &req.email,
                    &req.phone,
                    &status_text,
                    &req.notes,
                    &Utc::now(),
                ],
            )
            .await?;
        row.as_ref().map(row_to_client).transpose()
    }

    pub async fn client_delete(&self, id: EntityId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute("DELETE FROM clients WHERE client_id = $1", &[&id])
            .await?;
        Ok(deleted > 0)
    }

    pub async fn client_list(&self, filter: &ListClientsRequest) -> ApiResult<Vec<ClientResponse>> {
        let conn = self.get_conn().await?;
        let mut sql = format!("SELECT {} FROM clients", CLIENT_COLUMNS);
        let status_text = filter.status.map(|s| s.to_string());
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(ref status) = status_text {
            sql.push_str(" WHERE status = $1");
            params.push(status);
        }
        sql.push_str(" ORDER BY name");

        let rows = conn.query(sql.as_str(), &params).await?;
        rows.iter().map(row_to_client).collect()
    }

    // ========================================================================
    // PROJECT OPERATIONS
    // ========================================================================

    pub async fn project_create(&self, req: &CreateProjectRequest) -> ApiResult<ProjectResponse> {
        let conn = self.get_conn().await?;
        let now = Utc::now();
        let project = ProjectResponse {
            project_id: new_entity_id(),
            client_id: req.client_id,
            name: req.name.clone(),
            description: req.description.clone(),
            status: req.status.unwrap_or(opone_core::ProjectStatus::Draft),
            budget_cents: req.budget_cents,
            start_date: req.start_date,
            due_date: req.due_date,
            created_at: now,
            updated_at: now,
        };

        let status_text = project.status.to_string();
        conn.execute(
            "INSERT INTO projects (project_id, client_id, name, description, status, \
             budget_cents, start_date, due_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            &[
                &project.project_id,
                &project.client_id,
                &project.name,
                &project.description,
                &status_text,
                &project.budget_cents,
                &project.start_date,
                &project.due_date,
                &project.created_at,
                &project.updated_at,
            ],
        )
        .await?;

        Ok(project)
    }

    pub async fn project_get(&self, id: EntityId) -> ApiResult<Option<ProjectResponse>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                format!(
                    "SELECT {} FROM projects WHERE project_id = $1",
                    PROJECT_COLUMNS
                ).as_str(),
                &[&id],
            )
            .await?;
        row.as_ref().map(row_to_project).transpose()
    }

    pub async fn project_update(
        &self,
        id: EntityId,
        req: &UpdateProjectRequest,
    ) -> ApiResult<Option<ProjectResponse>> {
        let conn = self.get_conn().await?;
        let status_text = req.status.map(|s| s.to_string());
        let row = conn
            .query_opt(
                format!(
                    "UPDATE projects SET \
                        client_id = COALESCE($2, client_id), \
                        name = COALESCE($3, name), \
                        description = COALESCE($4, description), \
                        status = COALESCE($5, status), \
                        budget_cents = COALESCE($6, budget_cents), \
                        start_date = COALESCE($7, start_date), \
                        due_date = COALESCE($8, due_date), \
                        updated_at = $9 \
                     WHERE project_id = $1 RETURNING {}",
                    PROJECT_COLUMNS
                ).as_str(),
                &[
                    &id,
                    &req.client_id,
                    &req.name,
                    &req.description,
                    &status_text,
                    &req.budget_cents,
                    &req.start_date,
                    &req.due_date,
                    &Utc::now(),
                ],
            )
            .await?;
        row.as_ref().map(row_to_project).transpose()
    }

    pub async fn project_delete(&self, id: EntityId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute("DELETE FROM projects WHERE project_id = $1", &[&id])
            .await?;
        Ok(deleted > 0)
    }

    pub async fn project_list(
        &self,
        filter: &ListProjectsRequest,
    ) -> ApiResult<Vec<ProjectResponse>> {
        let conn = self.get_conn().await?;
        let mut sql = format!("SELECT {} FROM projects", PROJECT_COLUMNS);
        let status_text = filter.status.map(|s| s.to_string());
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(ref status) = status_text {
            clauses.push(format!("status = ${}", params.len() + 1));
            params.push(status);
        }
        if let Some(ref client_id) = filter.client_id {
            clauses.push(format!("client_id = ${}", params.len() + 1));
            params.push(client_id);
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let rows = conn.query(sql.as_str(), &params).await?;
        rows.iter().map(row_to_project).collect()
    }

    // ========================================================================
    // FINANCIAL ACCOUNT OPERATIONS
    // ========================================================================

    pub async fn account_create(&self, req: &CreateAccountRequest) -> ApiResult<AccountResponse> {
        let conn = self.get_conn().await?;
        let account = AccountResponse {
            account_id: new_entity_id(),
            name: req.name.clone(),
            kind: req.kind,
            created_at: Utc::now(),
        };

        let kind_text = account.kind.to_string();
        conn.execute(
            "INSERT INTO financial_accounts (account_id, name, kind, created_at) \
             VALUES ($1, $2, $3, $4)",
            &[
                &account.account_id,
                &account.name,
                &kind_text,
                &account.created_at,
            ],
        )
        .await?;

        Ok(account)
    }

    pub async fn account_list(&self) -> ApiResult<Vec<AccountResponse>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                format!(
                    "SELECT {} FROM financial_accounts ORDER BY name",
                    ACCOUNT_COLUMNS
                ).as_str(),
                &[],
            )
            .await?;
        rows.iter().map(row_to_account).collect()
    }

    // ========================================================================
    // TRANSACTION OPERATIONS
    // ========================================================================

    pub async fn transaction_create(
        &self,
        req: &CreateTransactionRequest,
    ) -> ApiResult<TransactionResponse> {
        let conn = self.get_conn().await?;
        let now = Utc::now();
        let transaction = TransactionResponse {
            transaction_id: new_entity_id(),
            account_id: req.account_id,
            project_id: req.project_id,
            description: req.description.clone(),
            direction: req.direction,
            amount_cents: req.amount_cents,
            category: req.category.clone(),
            occurred_on: req.occurred_on,
            created_at: now,
            updated_at: now,
        };

        let direction_text = transaction.direction.to_string();
        conn.execute(
            "INSERT INTO transactions (transaction_id, account_id, project_id, description, \
             direction, amount_cents, category, occurred_on, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            &[
                &transaction.transaction_id,
                &transaction.account_id,
                &transaction.project_id,
                &transaction.description,
                &direction_text,
                &transaction.amount_cents,
                &transaction.category,
                &transaction.occurred_on,
                &transaction.created_at,
                &transaction.updated_at,
            ],
        )
        .await?;

        Ok(transaction)
    }

    pub async fn transaction_get(&self, id: EntityId) -> ApiResult<Option<TransactionResponse>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                format!(
                    "SELECT {} FROM transactions WHERE transaction_id = $1",
                    TRANSACTION_COLUMNS
                ).as_str(),
                &[&id],
            )
            .await?;
        row.as_ref().map(row_to_transaction).transpose()
    }

    pub async fn transaction_update(
        &self,
        id: EntityId,
        req: &UpdateTransactionRequest,
    ) -> ApiResult<Option<TransactionResponse>> {
        let conn = self.get_conn().await?;
        let direction_text = req.direction.map(|d| d.to_string());
        let row = conn
            .query_opt(
                format!(
                    "UPDATE transactions SET \
                        account_id = COALESCE($2, account_id), \
                        project_id = COALESCE($3, project_id), \
                        description = COALESCE($4, description), \
                        direction = COALESCE($5, direction), \
                        amount_cents = COALESCE($6, amount_cents), \
                        category = COALESCE($7, category), \
                        occurred_on = COALESCE($8, occurred_on), \
                        updated_at = $9 \
                     WHERE transaction_id = $1 RETURNING {}",
                    TRANSACTION_COLUMNS
                ).as_str(),
                &[
                    &id,
                    &req.account_id,
                    &req.project_id,
                    &req.description,
                    &direction_text,
                    &req.amount_cents,
                    &req.category,
                    &req.occurred_on,
                    &Utc::now(),
                ],
            )
            .await?;
        row.as_ref().map(row_to_transaction).transpose()
    }

    pub async fn transaction_delete(&self, id: EntityId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute(
                "DELETE FROM transactions WHERE transaction_id = $1",
                &[&id],
            )
            .await?;
        Ok(deleted > 0)
    }

    pub async fn transaction_list(
        &self,
        filter: &ListTransactionsRequest,
    ) -> ApiResult<Vec<TransactionResponse>> {
        let conn = self.get_conn().await?;
        let mut sql = format!("SELECT {} FROM transactions", TRANSACTION_COLUMNS);
        let direction_text = filter.direction.map(|d| d.to_string());
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(ref direction) = direction_text {
            clauses.push(format!("direction = ${}", params.len() + 1));
            params.push(direction);
        }
        if let Some(ref project_id) = filter.project_id {
            clauses.push(format!("project_id = ${}", params.len() + 1));
            params.push(project_id);
        }
        if let Some(ref account_id) = filter.account_id {
            clauses.push(format!("account_id = ${}", params.len() + 1));
            params.push(account_id);
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY occurred_on DESC, created_at DESC");

        let rows = conn.query(sql.as_str(), &params).await?;
        rows.iter().map(row_to_transaction).collect()
    }

    // ========================================================================
    // OPPORTUNITY OPERATIONS
    // ========================================================================

    pub async fn opportunity_create(
        &self,
        req: &CreateOpportunityRequest,
    ) -> ApiResult<OpportunityResponse> {
        let conn = self.get_conn().await?;
        let now = Utc::now();
        let opportunity = OpportunityResponse {
            opportunity_id: new_entity_id(),
            client_id: req.client_id,
            title: req.title.clone(),
            stage: req.stage.unwrap_or(opone_core::OpportunityStage::Prospect),
            value_cents: req.value_cents,
            probability: req.probability,
            expected_close: req.expected_close,
            created_at: now,
            updated_at: now,
        };

        let stage_text = opportunity.stage.to_string();
        conn.execute(
            "INSERT INTO opportunities (opportunity_id, client_id, title, stage, value_cents, \
             probability, expected_close, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            &[
                &opportunity.opportunity_id,
                &opportunity.client_id,
                &opportunity.title,
                &stage_text,
                &opportunity.value_cents,
                &opportunity.probability,
                &opportunity.expected_close,
                &opportunity.created_at,
                &opportunity.updated_at,
            ],
        )
        .await?;

        Ok(opportunity)
    }

    pub async fn opportunity_get(&self, id: EntityId) -> ApiResult<Option<OpportunityResponse>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                format!(
                    "SELECT {} FROM opportunities WHERE opportunity_id = $1",
                    OPPORTUNITY_COLUMNS
                ).as_str(),
                &[&id],
            )
            .await?;
        row.as_ref().map(row_to_opportunity).transpose()
    }

    pub async fn opportunity_update(
        &self,
        id: EntityId,
        req: &UpdateOpportunityRequest,
    ) -> ApiResult<Option<OpportunityResponse>> {
        let conn = self.get_conn().await?;
        let stage_text = req.stage.map(|s| s.to_string());
        let row = conn
            .query_opt(
                format!(
                    "UPDATE opportunities SET \
                        client_id = COALESCE($2, client_id), \
                        title = COALESCE($3, title), \
                        stage = COALESCE($4, stage), \
                        value_cents = COALESCE($5, value_cents), \
                        probability = COALESCE($6, probability), \
                        expected_close = COALESCE($7, expected_close), \
                        updated_at = $8 \
                     WHERE opportunity_id = $1 RETURNING {}",
                    OPPORTUNITY_COLUMNS
                ).as_str(),
                &[
                    &id,
                    &req.client_id,
                    &req.title,
                    &stage_text,
                    &req.value_cents,
                    &req.probability,
                    &req.expected_close,
                    &Utc::now(),
                ],
            )
            .await?;
        row.as_ref().map(row_to_opportunity).transpose()
    }

    pub async fn opportunity_delete(&self, id: EntityId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute(
                "DELETE FROM opportunities WHERE opportunity_id = $1",
                &[&id],
            )
            .await?;
        Ok(deleted > 0)
    }

    pub async fn opportunity_list(
        &self,
        filter: &ListOpportunitiesRequest,
    ) -> ApiResult<Vec<OpportunityResponse>> {
        let conn = self.get_conn().await?;
        let mut sql = format!("SELECT {} FROM opportunities", OPPORTUNITY_COLUMNS);
        let stage_text = filter.stage.map(|s| s.to_string());
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(ref stage) = stage_text {
            clauses.push(format!("stage = ${}", params.len() + 1));
            params.push(stage);
        }
        if let Some(ref client_id) = filter.client_id {
            clauses.push(format!("client_id = ${}", params.len() + 1));
            params.push(client_id);
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let rows = conn.query(sql.as_str(), &params).await?;
        rows.iter().map(row_to_opportunity).collect()
    }

    // ========================================================================
    // COMMUNICATION OPERATIONS
    // ========================================================================

    pub async fn communication_create(
        &self,
        req: &CreateCommunicationRequest,
    ) -> ApiResult<CommunicationResponse> {
        let conn = self.get_conn().await?;
        let now = Utc::now();
        let communication = CommunicationResponse {
            communication_id: new_entity_id(),
            client_id: req.client_id,
            member_id: req.member_id,
            channel: req.channel,
            subject: req.subject.clone(),
            body: req.body.clone(),
            occurred_at: req.occurred_at.unwrap_or(now),
            created_at: now,
        };

        let channel_text = communication.channel.to_string();
        conn.execute(
            "INSERT INTO communications (communication_id, client_id, member_id, channel, \
             subject, body, occurred_at, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            &[
                &communication.communication_id,
                &communication.client_id,
                &communication.member_id,
                &channel_text,
                &communication.subject,
                &communication.body,
                &communication.occurred_at,
                &communication.created_at,
            ],
        )
        .await?;

        Ok(communication)
    }

    pub async fn communication_delete(&self, id: EntityId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute(
                "DELETE FROM communications WHERE communication_id = $1",
                &[&id],
            )
            .await?;
        Ok(deleted > 0)
    }

    pub async fn communication_list(
        &self,
        filter: &ListCommunicationsRequest,
    ) -> ApiResult<Vec<CommunicationResponse>> {
        let conn = self.get_conn().await?;
        let mut sql = format!("SELECT {} FROM communications", COMMUNICATION_COLUMNS);
        let channel_text = filter.channel.map(|c| c.to_string());
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(ref client_id) = filter.client_id {
            clauses.push(format!("client_id = ${}", params.len() + 1));
            params.push(client_id);
        }
        if let Some(ref channel) = channel_text {
            clauses.push(format!("channel = ${}", params.len() + 1));
            params.push(channel);
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY occurred_at DESC");

        let rows = conn.query(sql.as_str(), &params).await?;
        rows.iter().map(row_to_communication).collect()
    }

    // ========================================================================
    // DASHBOARD AGGREGATES
    // ========================================================================

    /// Count of projects currently in Active status.
    pub async fn count_active_projects(&self) -> ApiResult<i64> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "SELECT COUNT(*) FROM projects WHERE status = 'Active'",
                &[],
            )
            .await?;
        Ok(row.get(0))
    }

    /// Count of all clients.
    pub async fn count_clients(&self) -> ApiResult<i64> {
        let conn = self.get_conn().await?;
        let row = conn.query_one("SELECT COUNT(*) FROM clients", &[]).await?;
        Ok(row.get(0))
    }

    /// Open opportunity count and total pipeline value.
    pub async fn open_pipeline(&self) -> ApiResult<(i64, i64)> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "SELECT COUNT(*), COALESCE(SUM(value_cents), 0)::BIGINT \
                 FROM opportunities WHERE stage NOT IN ('Won', 'Lost')",
                &[],
            )
            .await?;
        Ok((row.get(0), row.get(1)))
    }

    /// Sum of transaction amounts for a direction since the start of the
    /// current month.
    pub async fn month_cashflow(&self, direction: TransactionDirection) -> ApiResult<i64> {
        let conn = self.get_conn().await?;
        let direction_text = direction.to_string();
        let row = conn
            .query_one(
                "SELECT COALESCE(SUM(amount_cents), 0)::BIGINT FROM transactions \
                 WHERE direction = $1 \
                 AND occurred_on >= date_trunc('month', CURRENT_DATE)::date",
                &[&direction_text],
            )
            .await?;
        Ok(row.get(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_db_config() {
        let config = DbConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "opone");
        assert_eq!(config.max_size, 16);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_parse_enum_maps_corrupt_value_to_storage_failure() {
        let result: ApiResult<TeamRole> = parse_enum("overlord".to_string(), "role");
        let err = result.unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::DatabaseError);
        assert!(err.message.contains("role"));
        assert!(err.message.contains("overlord"));
    }
}

//! Financial Account REST API Routes

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::{
    cached_db::CachedDbClient,
    error::{ApiError, ApiResult},
    types::{AccountResponse, CreateAccountRequest, Envelope},
};

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for account routes.
#[derive(Clone)]
pub struct AccountState {
    pub cached_db: CachedDbClient,
}

impl AccountState {
    pub fn new(cached_db: CachedDbClient) -> Self {
        Self { cached_db }
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/accounts - Register a financial account
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    tag = "Accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created successfully", body = AccountResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn create_account(
    State(state): State<Arc<AccountState>>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.name.trim().is_empty() {
        return Err(ApiError::missing_field("name"));
    }

    let account = state.cached_db.account_create(&req).await?;
    Ok((StatusCode::CREATED, Json(Envelope::data(account))))
}

/// GET /api/v1/accounts - List financial accounts
#[utoipa::path(
    get,
    path = "/api/v1/accounts",
    tag = "Accounts",
    responses(
        (status = 200, description = "List of accounts", body = [AccountResponse]),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn list_accounts(
    State(state): State<Arc<AccountState>>,
) -> ApiResult<impl IntoResponse> {
    let accounts = state.cached_db.account_list().await?;
    Ok(Json(Envelope::data(accounts)))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the account routes router.
pub fn create_router(cached_db: CachedDbClient) -> axum::Router {
    let state = Arc::new(AccountState::new(cached_db));

    axum::Router::new()
        .route("/", axum::routing::post(create_account))
        .route("/", axum::routing::get(list_accounts))
        .with_state(state)
}

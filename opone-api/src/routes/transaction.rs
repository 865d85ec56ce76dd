//! Transaction REST API Routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    cached_db::CachedDbClient,
    error::{ApiError, ApiResult},
    types::{
        CreateTransactionRequest, Envelope, ListTransactionsRequest, TransactionResponse,
        UpdateTransactionRequest,
    },
};

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for transaction routes.
#[derive(Clone)]
pub struct TransactionState {
    pub cached_db: CachedDbClient,
}

impl TransactionState {
    pub fn new(cached_db: CachedDbClient) -> Self {
        Self { cached_db }
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/transactions - Record a transaction
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    tag = "Transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction recorded successfully", body = TransactionResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn create_transaction(
    State(state): State<Arc<TransactionState>>,
    Json(req): Json<CreateTransactionRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.description.trim().is_empty() {
        return Err(ApiError::missing_field("description"));
    }
    if req.amount_cents <= 0 {
        return Err(ApiError::invalid_input(
            "amount_cents must be positive; direction carries the sign",
        ));
    }

    let transaction = state.cached_db.transaction_create(&req).await?;
    Ok((StatusCode::CREATED, Json(Envelope::data(transaction))))
}

/// GET /api/v1/transactions - List transactions with filters
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    tag = "Transactions",
    params(
        ("direction" = Option<String>, Query, description = "Filter by direction (Income/Expense)"),
        ("project_id" = Option<String>, Query, description = "Filter by project ID"),
        ("account_id" = Option<String>, Query, description = "Filter by account ID"),
    ),
    responses(
        (status = 200, description = "List of transactions", body = [TransactionResponse]),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn list_transactions(
    State(state): State<Arc<TransactionState>>,
    Query(params): Query<ListTransactionsRequest>,
) -> ApiResult<impl IntoResponse> {
    let transactions = state.cached_db.transaction_list(&params).await?;
    Ok(Json(Envelope::data(transactions)))
}

/// GET /api/v1/transactions/{id} - Get transaction by ID
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{id}",
    tag = "Transactions",
    params(
        ("id" = Uuid, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Transaction details", body = TransactionResponse),
        (status = 404, description = "Transaction not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn get_transaction(
    State(state): State<Arc<TransactionState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let transaction = state
        .cached_db
        .transaction_get(id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Transaction", id))?;

    Ok(Json(Envelope::data(transaction)))
}

/// PATCH /api/v1/transactions/{id} - Update transaction
#[utoipa::path(
    patch,
    path = "/api/v1/transactions/{id}",
    tag = "Transactions",
    params(
        ("id" = Uuid, Path, description = "Transaction ID")
    ),
    request_body = UpdateTransactionRequest,
    responses(
        (status = 200, description = "Transaction updated successfully", body = TransactionResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Transaction not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn update_transaction(
    State(state): State<Arc<TransactionState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTransactionRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.is_empty() {
        return Err(ApiError::invalid_input(
            "At least one field must be provided for update",
        ));
    }
    if let Some(ref description) = req.description {
        if description.trim().is_empty() {
            return Err(ApiError::invalid_input("description cannot be empty"));
        }
    }
    if matches!(req.amount_cents, Some(amount) if amount <= 0) {
        return Err(ApiError::invalid_input(
            "amount_cents must be positive; direction carries the sign",
        ));
    }

    let transaction = state
        .cached_db
        .transaction_update(id, &req)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Transaction", id))?;

    Ok(Json(Envelope::data(transaction)))
}

/// DELETE /api/v1/transactions/{id} - Delete transaction
#[utoipa::path(
    delete,
    path = "/api/v1/transactions/{id}",
    tag = "Transactions",
    params(
        ("id" = Uuid, Path, description = "Transaction ID")
    ),
    responses(
        (status = 204, description = "Transaction deleted successfully"),
        (status = 404, description = "Transaction not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn delete_transaction(
    State(state): State<Arc<TransactionState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = state.cached_db.transaction_delete(id).await?;
    if !deleted {
        return Err(ApiError::entity_not_found("Transaction", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the transaction routes router.
pub fn create_router(cached_db: CachedDbClient) -> axum::Router {
    let state = Arc::new(TransactionState::new(cached_db));

    axum::Router::new()
        .route("/", axum::routing::post(create_transaction))
        .route("/", axum::routing::get(list_transactions))
        .route("/:id", axum::routing::get(get_transaction))
        .route("/:id", axum::routing::patch(update_transaction))
        .route("/:id", axum::routing::delete(delete_transaction))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_empty_check() {
        assert!(UpdateTransactionRequest::default().is_empty());
    }

    #[test]
    fn test_amount_sign_rule() {
        // Zero and negative amounts are rejected at the route boundary.
        let req = UpdateTransactionRequest {
            amount_cents: Some(0),
            ..Default::default()
        };
        assert!(matches!(req.amount_cents, Some(amount) if amount <= 0));
    }
}

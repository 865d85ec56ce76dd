//! Client REST API Routes

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
    types::{ClientResponse, CreateClientRequest, Envelope, ListClientsRequest, UpdateClientRequest},
};

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for client routes.
#[derive(Clone)]
pub struct ClientState {
    pub cached_db: CachedDbClient,
}

impl ClientState {
    pub fn new(cached_db: CachedDbClient) -> Self {
        Self { cached_db }
    }
}

/// Just enough of an email check for an internal tool: something before
/// and after one '@'.
fn looks_like_email(value: &str) -> bool {
    matches!(value.split_once('@'), Some((local, domain)) if !local.is_empty() && !domain.is_empty())
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/clients - Create a new client
#[utoipa::path(
    post,
    path = "/api/v1/clients",
    tag = "Clients",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created successfully", body = ClientResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn create_client(
    State(state): State<Arc<ClientState>>,
    Json(req): Json<CreateClientRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.name.trim().is_empty() {
        return Err(ApiError::missing_field("name"));
    }
    if !looks_like_email(req.email.trim()) {
        return Err(ApiError::invalid_input("email is not a valid address"));
    }

    let client = state.cached_db.client_create(&req).await?;
    Ok((StatusCode::CREATED, Json(Envelope::data(client))))
}

/// GET /api/v1/clients - List clients with filters
#[utoipa::path(
    get,
    path = "/api/v1/clients",
    tag = "Clients",
    params(
        ("status" = Option<String>, Query, description = "Filter by client status"),
    ),
    responses(
        (status = 200, description = "List of clients", body = [ClientResponse]),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn list_clients(
    State(state): State<Arc<ClientState>>,
    Query(params): Query<ListClientsRequest>,
) -> ApiResult<impl IntoResponse> {
    let clients = state.cached_db.client_list(&params).await?;
    Ok(Json(Envelope::data(clients)))
}

/// GET /api/v1/clients/{id} - Get client by ID
#[utoipa::path(
    get,
    path = "/api/v1/clients/{id}",
    tag = "Clients",
    params(
        ("id" = Uuid, Path, description = "Client ID")
    ),
    responses(
        (status = 200, description = "Client details", body = ClientResponse),
        (status = 404, description = "Client not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn get_client(
    State(state): State<Arc<ClientState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let client = state
        .cached_db
        .client_get(id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Client", id))?;

    Ok(Json(Envelope::data(client)))
}

/// PATCH /api/v1/clients/{id} - Update client
#[utoipa::path(
    patch,
    path = "/api/v1/clients/{id}",
    tag = "Clients",
    params(
        ("id" = Uuid, Path, description = "Client ID")
    ),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Client updated successfully", body = ClientResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Client not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn update_client(
    State(state): State<Arc<ClientState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateClientRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.is_empty() {
        return Err(ApiError::invalid_input(
            "At least one field must be provided for update",
        ));
    }
    if let Some(ref name) = req.name {
        if name.trim().is_empty() {
            return Err(ApiError::invalid_input("name cannot be empty"));
        }
    }
    if let Some(ref email) = req.email {
        if !looks_like_email(email.trim()) {
            return Err(ApiError::invalid_input("email is not a valid address"));
        }
    }

    let client = state
        .cached_db
        .client_update(id, &req)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Client", id))?;

    Ok(Json(Envelope::data(client)))
}

/// DELETE /api/v1/clients/{id} - Delete client
#[utoipa::path(
    delete,
    path = "/api/v1/clients/{id}",
    tag = "Clients",
    params(
        ("id" = Uuid, Path, description = "Client ID")
    ),
    responses(
        (status = 204, description = "Client deleted successfully"),
        (status = 404, description = "Client not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn delete_client(
    State(state): State<Arc<ClientState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = state.cached_db.client_delete(id).await?;
    if !deleted {
        return Err(ApiError::entity_not_found("Client", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the client routes router.
pub fn create_router(cached_db: CachedDbClient) -> axum::Router {
    let state = Arc::new(ClientState::new(cached_db));

    axum::Router::new()
        .route("/", axum::routing::post(create_client))
        .route("/", axum::routing::get(list_clients))
        .route("/:id", axum::routing::get(get_client))
        .route("/:id", axum::routing::patch(update_client))
        .route("/:id", axum::routing::delete(delete_client))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("ana@opone.dev"));
        assert!(looks_like_email("a@b"));
        assert!(!looks_like_email("ana"));
        assert!(!looks_like_email("@opone.dev"));
        assert!(!looks_like_email("ana@"));
        assert!(!looks_like_email(""));
    }

    #[test]
    fn test_update_client_request_empty_check() {
        assert!(UpdateClientRequest::default().is_empty());
    }
}

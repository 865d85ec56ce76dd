//! Communication Log REST API Routes

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
    types::{CommunicationResponse, CreateCommunicationRequest, Envelope, ListCommunicationsRequest},
};

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for communication routes.
#[derive(Clone)]
pub struct CommunicationState {
    pub cached_db: CachedDbClient,
}

impl CommunicationState {
    pub fn new(cached_db: CachedDbClient) -> Self {
        Self { cached_db }
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/communications - Log a communication
#[utoipa::path(
    post,
    path = "/api/v1/communications",
    tag = "Communications",
    request_body = CreateCommunicationRequest,
    responses(
        (status = 201, description = "Communication logged successfully", body = CommunicationResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn create_communication(
    State(state): State<Arc<CommunicationState>>,
    Json(req): Json<CreateCommunicationRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.subject.trim().is_empty() {
        return Err(ApiError::missing_field("subject"));
    }

    let communication = state.cached_db.communication_create(&req).await?;
    Ok((StatusCode::CREATED, Json(Envelope::data(communication))))
}

/// GET /api/v1/communications - List logged communications
#[utoipa::path(
    get,
    path = "/api/v1/communications",
    tag = "Communications",
    params(
        ("client_id" = Option<String>, Query, description = "Filter by client ID"),
        ("channel" = Option<String>, Query, description = "Filter by channel"),
    ),
    responses(
        (status = 200, description = "List of communications", body = [CommunicationResponse]),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn list_communications(
    State(state): State<Arc<CommunicationState>>,
    Query(params): Query<ListCommunicationsRequest>,
) -> ApiResult<impl IntoResponse> {
    let communications = state.cached_db.communication_list(&params).await?;
    Ok(Json(Envelope::data(communications)))
}

/// DELETE /api/v1/communications/{id} - Delete a logged communication
#[utoipa::path(
    delete,
    path = "/api/v1/communications/{id}",
    tag = "Communications",
    params(
        ("id" = Uuid, Path, description = "Communication ID")
    ),
    responses(
        (status = 204, description = "Communication deleted successfully"),
        (status = 404, description = "Communication not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn delete_communication(
    State(state): State<Arc<CommunicationState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = state.cached_db.communication_delete(id).await?;
    if !deleted {
        return Err(ApiError::entity_not_found("Communication", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the communication routes router.
pub fn create_router(cached_db: CachedDbClient) -> axum::Router {
    let state = Arc::new(CommunicationState::new(cached_db));

    axum::Router::new()
        .route("/", axum::routing::post(create_communication))
        .route("/", axum::routing::get(list_communications))
        .route("/:id", axum::routing::delete(delete_communication))
        .with_state(state)
}

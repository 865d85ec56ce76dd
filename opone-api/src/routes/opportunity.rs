//! Sales Opportunity REST API Routes

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
        CreateOpportunityRequest, Envelope, ListOpportunitiesRequest, OpportunityResponse,
        UpdateOpportunityRequest,
    },
};

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for opportunity routes.
#[derive(Clone)]
pub struct OpportunityState {
    pub cached_db: CachedDbClient,
}

impl OpportunityState {
    pub fn new(cached_db: CachedDbClient) -> Self {
        Self { cached_db }
    }
}

fn validate_probability(probability: Option<i16>) -> ApiResult<()> {
    if let Some(p) = probability {
        if !(0..=100).contains(&p) {
            return Err(ApiError::invalid_range("probability", 0, 100));
        }
    }
    Ok(())
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/opportunities - Create a sales opportunity
#[utoipa::path(
    post,
    path = "/api/v1/opportunities",
    tag = "Opportunities",
    request_body = CreateOpportunityRequest,
    responses(
        (status = 201, description = "Opportunity created successfully", body = OpportunityResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn create_opportunity(
    State(state): State<Arc<OpportunityState>>,
    Json(req): Json<CreateOpportunityRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.title.trim().is_empty() {
        return Err(ApiError::missing_field("title"));
    }
    if req.value_cents < 0 {
        return Err(ApiError::invalid_input("value_cents cannot be negative"));
    }
    validate_probability(req.probability)?;

    let opportunity = state.cached_db.opportunity_create(&req).await?;
    Ok((StatusCode::CREATED, Json(Envelope::data(opportunity))))
}

/// GET /api/v1/opportunities - List opportunities with filters
#[utoipa::path(
    get,
    path = "/api/v1/opportunities",
    tag = "Opportunities",
    params(
        ("stage" = Option<String>, Query, description = "Filter by pipeline stage"),
        ("client_id" = Option<String>, Query, description = "Filter by client ID"),
    ),
    responses(
        (status = 200, description = "List of opportunities", body = [OpportunityResponse]),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn list_opportunities(
    State(state): State<Arc<OpportunityState>>,
    Query(params): Query<ListOpportunitiesRequest>,
) -> ApiResult<impl IntoResponse> {
    let opportunities = state.cached_db.opportunity_list(&params).await?;
    Ok(Json(Envelope::data(opportunities)))
}

/// GET /api/v1/opportunities/{id} - Get opportunity by ID
#[utoipa::path(
    get,
    path = "/api/v1/opportunities/{id}",
    tag = "Opportunities",
    params(
        ("id" = Uuid, Path, description = "Opportunity ID")
    ),
    responses(
        (status = 200, description = "Opportunity details", body = OpportunityResponse),
        (status = 404, description = "Opportunity not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn get_opportunity(
    State(state): State<Arc<OpportunityState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let opportunity = state
        .cached_db
        .opportunity_get(id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Opportunity", id))?;

    Ok(Json(Envelope::data(opportunity)))
}

/// PATCH /api/v1/opportunities/{id} - Update opportunity
#[utoipa::path(
    patch,
    path = "/api/v1/opportunities/{id}",
    tag = "Opportunities",
    params(
        ("id" = Uuid, Path, description = "Opportunity ID")
    ),
    request_body = UpdateOpportunityRequest,
    responses(
        (status = 200, description = "Opportunity updated successfully", body = OpportunityResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Opportunity not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn update_opportunity(
    State(state): State<Arc<OpportunityState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOpportunityRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.is_empty() {
        return Err(ApiError::invalid_input(
            "At least one field must be provided for update",
        ));
    }
    if let Some(ref title) = req.title {
        if title.trim().is_empty() {
            return Err(ApiError::invalid_input("title cannot be empty"));
        }
    }
    if matches!(req.value_cents, Some(value) if value < 0) {
        return Err(ApiError::invalid_input("value_cents cannot be negative"));
    }
    validate_probability(req.probability)?;

    let opportunity = state
        .cached_db
        .opportunity_update(id, &req)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Opportunity", id))?;

    Ok(Json(Envelope::data(opportunity)))
}

/// DELETE /api/v1/opportunities/{id} - Delete opportunity
#[utoipa::path(
    delete,
    path = "/api/v1/opportunities/{id}",
    tag = "Opportunities",
    params(
        ("id" = Uuid, Path, description = "Opportunity ID")
    ),
    responses(
        (status = 204, description = "Opportunity deleted successfully"),
        (status = 404, description = "Opportunity not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn delete_opportunity(
    State(state): State<Arc<OpportunityState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = state.cached_db.opportunity_delete(id).await?;
    if !deleted {
        return Err(ApiError::entity_not_found("Opportunity", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the opportunity routes router.
pub fn create_router(cached_db: CachedDbClient) -> axum::Router {
    let state = Arc::new(OpportunityState::new(cached_db));

    axum::Router::new()
        .route("/", axum::routing::post(create_opportunity))
        .route("/", axum::routing::get(list_opportunities))
        .route("/:id", axum::routing::get(get_opportunity))
        .route("/:id", axum::routing::patch(update_opportunity))
        .route("/:id", axum::routing::delete(delete_opportunity))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_bounds() {
        assert!(validate_probability(None).is_ok());
        assert!(validate_probability(Some(0)).is_ok());
        assert!(validate_probability(Some(100)).is_ok());
        assert!(validate_probability(Some(101)).is_err());
        assert!(validate_probability(Some(-1)).is_err());
    }

    #[test]
    fn test_update_request_empty_check() {
        assert!(UpdateOpportunityRequest::default().is_empty());
    }
}

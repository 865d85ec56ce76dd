//! Team Member REST API Routes

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
        CreateTeamMemberRequest, Envelope, ListTeamMembersRequest, TeamMemberResponse,
        UpdateTeamMemberRequest,
    },
};

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for team member routes.
#[derive(Clone)]
pub struct TeamMemberState {
    pub cached_db: CachedDbClient,
}

impl TeamMemberState {
    pub fn new(cached_db: CachedDbClient) -> Self {
        Self { cached_db }
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/team-members - Add a team member
#[utoipa::path(
    post,
    path = "/api/v1/team-members",
    tag = "Team",
    request_body = CreateTeamMemberRequest,
    responses(
        (status = 201, description = "Team member created successfully", body = TeamMemberResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn create_team_member(
    State(state): State<Arc<TeamMemberState>>,
    Json(req): Json<CreateTeamMemberRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.name.trim().is_empty() {
        return Err(ApiError::missing_field("name"));
    }
    if req.email.trim().is_empty() {
        return Err(ApiError::missing_field("email"));
    }

    let member = state.cached_db.team_member_create(&req).await?;
    Ok((StatusCode::CREATED, Json(Envelope::data(member))))
}

/// GET /api/v1/team-members - List team members
#[utoipa::path(
    get,
    path = "/api/v1/team-members",
    tag = "Team",
    params(
        ("active" = Option<bool>, Query, description = "Filter by active flag"),
    ),
    responses(
        (status = 200, description = "List of team members", body = [TeamMemberResponse]),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn list_team_members(
    State(state): State<Arc<TeamMemberState>>,
    Query(params): Query<ListTeamMembersRequest>,
) -> ApiResult<impl IntoResponse> {
    let members = state.cached_db.team_member_list(&params).await?;
    Ok(Json(Envelope::data(members)))
}

/// GET /api/v1/team-members/{id} - Get team member by ID
#[utoipa::path(
    get,
    path = "/api/v1/team-members/{id}",
    tag = "Team",
    params(
        ("id" = Uuid, Path, description = "Team member ID")
    ),
    responses(
        (status = 200, description = "Team member details", body = TeamMemberResponse),
        (status = 404, description = "Team member not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn get_team_member(
    State(state): State<Arc<TeamMemberState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let member = state
        .cached_db
        .team_member_get(id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Team member", id))?;

    Ok(Json(Envelope::data(member)))
}

/// PATCH /api/v1/team-members/{id} - Update team member
#[utoipa::path(
    patch,
    path = "/api/v1/team-members/{id}",
    tag = "Team",
    params(
        ("id" = Uuid, Path, description = "Team member ID")
    ),
    request_body = UpdateTeamMemberRequest,
    responses(
        (status = 200, description = "Team member updated successfully", body = TeamMemberResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Team member not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn update_team_member(
    State(state): State<Arc<TeamMemberState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTeamMemberRequest>,
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

    let member = state
        .cached_db
        .team_member_update(id, &req)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Team member", id))?;

    Ok(Json(Envelope::data(member)))
}

/// DELETE /api/v1/team-members/{id} - Remove team member
#[utoipa::path(
    delete,
    path = "/api/v1/team-members/{id}",
    tag = "Team",
    params(
        ("id" = Uuid, Path, description = "Team member ID")
    ),
    responses(
        (status = 204, description = "Team member deleted successfully"),
        (status = 404, description = "Team member not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn delete_team_member(
    State(state): State<Arc<TeamMemberState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = state.cached_db.team_member_delete(id).await?;
    if !deleted {
        return Err(ApiError::entity_not_found("Team member", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the team member routes router.
pub fn create_router(cached_db: CachedDbClient) -> axum::Router {
    let state = Arc::new(TeamMemberState::new(cached_db));

    axum::Router::new()
        .route("/", axum::routing::post(create_team_member))
        .route("/", axum::routing::get(list_team_members))
        .route("/:id", axum::routing::get(get_team_member))
        .route("/:id", axum::routing::patch(update_team_member))
        .route("/:id", axum::routing::delete(delete_team_member))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_empty_check() {
        assert!(UpdateTeamMemberRequest::default().is_empty());

        let req = UpdateTeamMemberRequest {
            active: Some(false),
            ..Default::default()
        };
        assert!(!req.is_empty());
    }
}

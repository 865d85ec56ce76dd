//! Project REST API Routes

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
        CreateProjectRequest, Envelope, ListProjectsRequest, ProjectResponse,
        UpdateProjectRequest,
    },
};

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for project routes.
#[derive(Clone)]
pub struct ProjectState {
    pub cached_db: CachedDbClient,
}

impl ProjectState {
    pub fn new(cached_db: CachedDbClient) -> Self {
        Self { cached_db }
    }
}

fn validate_dates(req_start: Option<chrono::NaiveDate>, req_due: Option<chrono::NaiveDate>) -> ApiResult<()> {
    if let (Some(start), Some(due)) = (req_start, req_due) {
        if due < start {
            return Err(ApiError::invalid_input("due_date cannot precede start_date"));
        }
    }
    Ok(())
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/projects - Create a new project
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    tag = "Projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created successfully", body = ProjectResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn create_project(
    State(state): State<Arc<ProjectState>>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.name.trim().is_empty() {
        return Err(ApiError::missing_field("name"));
    }
    if matches!(req.budget_cents, Some(budget) if budget < 0) {
        return Err(ApiError::invalid_input("budget_cents cannot be negative"));
    }
    validate_dates(req.start_date, req.due_date)?;

    let project = state.cached_db.project_create(&req).await?;
    Ok((StatusCode::CREATED, Json(Envelope::data(project))))
}

/// GET /api/v1/projects - List projects with filters
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    tag = "Projects",
    params(
        ("status" = Option<String>, Query, description = "Filter by project status"),
        ("client_id" = Option<String>, Query, description = "Filter by client ID"),
    ),
    responses(
        (status = 200, description = "List of projects", body = [ProjectResponse]),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn list_projects(
    State(state): State<Arc<ProjectState>>,
    Query(params): Query<ListProjectsRequest>,
) -> ApiResult<impl IntoResponse> {
    let projects = state.cached_db.project_list(&params).await?;
    Ok(Json(Envelope::data(projects)))
}

/// GET /api/v1/projects/{id} - Get project by ID
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}",
    tag = "Projects",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project details", body = ProjectResponse),
        (status = 404, description = "Project not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn get_project(
    State(state): State<Arc<ProjectState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let project = state
        .cached_db
        .project_get(id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Project", id))?;

    Ok(Json(Envelope::data(project)))
}

/// PATCH /api/v1/projects/{id} - Update project
#[utoipa::path(
    patch,
    path = "/api/v1/projects/{id}",
    tag = "Projects",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated successfully", body = ProjectResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Project not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn update_project(
    State(state): State<Arc<ProjectState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
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
    if matches!(req.budget_cents, Some(budget) if budget < 0) {
        return Err(ApiError::invalid_input("budget_cents cannot be negative"));
    }
    validate_dates(req.start_date, req.due_date)?;

    let project = state
        .cached_db
        .project_update(id, &req)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Project", id))?;

    Ok(Json(Envelope::data(project)))
}

/// DELETE /api/v1/projects/{id} - Delete project
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}",
    tag = "Projects",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 204, description = "Project deleted successfully"),
        (status = 404, description = "Project not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn delete_project(
    State(state): State<Arc<ProjectState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = state.cached_db.project_delete(id).await?;
    if !deleted {
        return Err(ApiError::entity_not_found("Project", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the project routes router.
pub fn create_router(cached_db: CachedDbClient) -> axum::Router {
    let state = Arc::new(ProjectState::new(cached_db));

    axum::Router::new()
        .route("/", axum::routing::post(create_project))
        .route("/", axum::routing::get(list_projects))
        .route("/:id", axum::routing::get(get_project))
        .route("/:id", axum::routing::patch(update_project))
        .route("/:id", axum::routing::delete(delete_project))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_date_validation() {
        let start = NaiveDate::from_ymd_opt(2025, 5, 1);
        let due = NaiveDate::from_ymd_opt(2025, 4, 1);
        assert!(validate_dates(start, due).is_err());
        assert!(validate_dates(due, start).is_ok());
        assert!(validate_dates(start, None).is_ok());
        assert!(validate_dates(None, due).is_ok());
    }

    #[test]
    fn test_create_project_request_validation() {
        let req = CreateProjectRequest {
            client_id: None,
            name: "   ".to_string(),
            description: None,
            status: None,
            budget_cents: Some(-100),
            start_date: None,
            due_date: None,
        };

        assert!(req.name.trim().is_empty());
        assert!(matches!(req.budget_cents, Some(b) if b < 0));
    }

    #[test]
    fn test_update_project_request_empty_check() {
        let req = UpdateProjectRequest::default();
        assert!(req.is_empty());
    }
}

//! Dashboard Metrics REST API Routes

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    services::MetricsService,
    types::{DashboardMetrics, Envelope},
};

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for metrics routes.
#[derive(Clone)]
pub struct MetricsState {
    pub metrics: MetricsService,
}

impl MetricsState {
    pub fn new(metrics: MetricsService) -> Self {
        Self { metrics }
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/v1/metrics/dashboard - Aggregated dashboard snapshot
#[utoipa::path(
    get,
    path = "/api/v1/metrics/dashboard",
    tag = "Metrics",
    responses(
        (status = 200, description = "Dashboard snapshot", body = DashboardMetrics),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn dashboard(State(state): State<Arc<MetricsState>>) -> ApiResult<impl IntoResponse> {
    let snapshot = state.metrics.dashboard().await?;
    Ok(Json(Envelope::data(snapshot)))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the metrics routes router.
pub fn create_router(metrics: MetricsService) -> Router {
    let state = Arc::new(MetricsState::new(metrics));

    Router::new()
        .route("/dashboard", get(dashboard))
        .with_state(state)
}

//! Service health endpoints.
//!
//! Three unauthenticated probes. `/health/ping` answers immediately,
//! `/health/live` confirms the process is serving requests, and
//! `/health/ready` additionally round-trips the database so an orchestrator
//! can hold traffic until the store is reachable.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::db::DbClient;

/// Overall verdict of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Ok,
    Unavailable,
}

/// Outcome of a single database round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DatabaseProbe {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of the liveness and readiness responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthReport {
    pub status: ServiceStatus,
    pub version: String,
    pub uptime_secs: u64,
    /// Present only on readiness, which is the probe that touches the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseProbe>,
}

#[derive(Clone)]
pub struct HealthState {
    db: DbClient,
    started: Instant,
}

/// GET /health/ping
#[utoipa::path(
    get,
    path = "/health/ping",
    tag = "Health",
    responses(
        (status = 200, description = "Service is responding", body = String),
    ),
)]
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

/// GET /health/live
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Process is alive", body = HealthReport),
    ),
)]
pub async fn liveness(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    Json(HealthReport {
        status: ServiceStatus::Ok,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started.elapsed().as_secs(),
        database: None,
    })
}

/// GET /health/ready
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = HealthReport),
        (status = 503, description = "Database is unreachable", body = HealthReport),
    ),
)]
pub async fn readiness(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let probe = probe_database(&state.db).await;
    let status = if probe.reachable {
        ServiceStatus::Ok
    } else {
        ServiceStatus::Unavailable
    };
    let http_status = match status {
        ServiceStatus::Ok => StatusCode::OK,
        ServiceStatus::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    };

    let report = HealthReport {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started.elapsed().as_secs(),
        database: Some(probe),
    };
    (http_status, Json(report))
}

async fn probe_database(db: &DbClient) -> DatabaseProbe {
    let started = Instant::now();
    match db.health_check().await {
        Ok(()) => DatabaseProbe {
            reachable: true,
            latency_ms: Some(started.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => DatabaseProbe {
            reachable: false,
            latency_ms: None,
            error: Some(e.message),
        },
    }
}

/// Health router; mounted outside the session guard.
pub fn create_router(db: DbClient) -> Router {
    let state = Arc::new(HealthState {
        db,
        started: Instant::now(),
    });

    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liveness_report_omits_database_probe() {
        let report = HealthReport {
            status: ServiceStatus::Ok,
            version: "0.3.0".to_string(),
            uptime_secs: 42,
            database: None,
        };

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"uptime_secs\":42"));
        assert!(!json.contains("database"));
    }

    #[test]
    fn test_failed_probe_carries_error_not_latency() {
        let probe = DatabaseProbe {
            reachable: false,
            latency_ms: None,
            error: Some("Connection refused".to_string()),
        };

        let json = serde_json::to_string(&probe).unwrap();
        assert!(json.contains("\"reachable\":false"));
        assert!(json.contains("Connection refused"));
        assert!(!json.contains("latency_ms"));
    }
}

//! REST API Routes Module
//!
//! Route handlers organized by entity, assembled into the full application
//! router:
//! - Entity CRUD routes (projects, clients, team, transactions, accounts,
//!   opportunities, communications) behind the session guard
//! - Session routes (login public; logout/me guarded)
//! - Dashboard metrics
//! - Health check endpoints (Kubernetes-compatible, no auth)
//! - OpenAPI document
//! - CORS support for the browser frontend

pub mod account;
pub mod client;
pub mod communication;
pub mod health;
pub mod metrics;
pub mod opportunity;
pub mod project;
pub mod session;
pub mod team_member;
pub mod transaction;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;

use crate::auth::AuthConfig;
use crate::cached_db::{CachedDbClient, QueryCache};
use crate::config::ApiConfig;
use crate::db::DbClient;
use crate::error::{ApiError, ApiResult};
use crate::middleware::{session_guard, AuthMiddlewareState};
use crate::openapi::ApiDoc;
use crate::services::MetricsService;

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ============================================================================
// PRODUCTION VALIDATION
// ============================================================================

/// Check if running in a production environment.
fn is_production_environment() -> bool {
    std::env::var("OPONE_ENVIRONMENT")
        .map(|e| matches!(e.to_lowercase().as_str(), "production" | "prod"))
        .unwrap_or(false)
}

/// Validate API configuration for production use.
fn validate_api_config_for_production(config: &ApiConfig) -> ApiResult<()> {
    if config.cors_origins.is_empty() {
        return Err(ApiError::invalid_input(
            "CORS origins not configured for production. Set OPONE_CORS_ORIGINS.",
        ));
    }
    Ok(())
}

// ============================================================================
// ROUTER BUILDER
// ============================================================================

/// Builder for the full API router.
///
/// Every route under /api/v1 except the login form sits behind the session
/// guard; health checks and the OpenAPI document are public.
pub struct ApiRouterBuilder {
    db: DbClient,
    cached_db: CachedDbClient,
    metrics: MetricsService,
    api_config: ApiConfig,
    auth_config: Arc<AuthConfig>,
    auth_state: AuthMiddlewareState,
}

impl ApiRouterBuilder {
    /// Create a new builder.
    ///
    /// In production environments this validates that security
    /// configuration is present and returns an error otherwise.
    pub fn new(
        db: DbClient,
        cache: Arc<QueryCache>,
        api_config: ApiConfig,
        auth_config: AuthConfig,
    ) -> ApiResult<Self> {
        if is_production_environment() {
            auth_config.validate_for_production()?;
            validate_api_config_for_production(&api_config)?;
        }

        let cached_db = CachedDbClient::new(db.clone(), cache.clone());
        let metrics = MetricsService::new(db.clone(), cache, api_config.metrics_ttl);
        let auth_config = Arc::new(auth_config);
        let auth_state = AuthMiddlewareState {
            auth_config: auth_config.clone(),
        };

        Ok(Self {
            db,
            cached_db,
            metrics,
            api_config,
            auth_config,
            auth_state,
        })
    }

    /// Build the entity CRUD routes (all require authentication).
    fn build_entity_routes(&self) -> Router {
        Router::new()
            .nest("/projects", project::create_router(self.cached_db.clone()))
            .nest("/clients", client::create_router(self.cached_db.clone()))
            .nest(
                "/team-members",
                team_member::create_router(self.cached_db.clone()),
            )
            .nest(
                "/transactions",
                transaction::create_router(self.cached_db.clone()),
            )
            .nest("/accounts", account::create_router(self.cached_db.clone()))
            .nest(
                "/opportunities",
                opportunity::create_router(self.cached_db.clone()),
            )
            .nest(
                "/communications",
                communication::create_router(self.cached_db.clone()),
            )
            .nest("/metrics", metrics::create_router(self.metrics.clone()))
    }

    /// Build the complete router.
    ///
    /// # Middleware Order (outer to inner)
    /// 1. CORS (outermost) - handles preflight requests
    /// 2. Session guard (only on protected /api/v1 routes)
    pub fn build(self) -> Router {
        let session_state = Arc::new(session::SessionState::new(
            self.cached_db.clone(),
            self.auth_config.clone(),
        ));

        // Protected API routes (session required)
        let protected = self
            .build_entity_routes()
            .merge(session::protected_router(session_state.clone()))
            .layer(from_fn_with_state(self.auth_state.clone(), session_guard));

        // The login form itself is the only public /api/v1 route
        let api_routes = session::public_router(session_state).merge(protected);

        let cors = build_cors_layer(&self.api_config);

        Router::new()
            .nest("/api/v1", api_routes)
            // Health checks (no auth required)
            .nest("/health", health::create_router(self.db.clone()))
            // OpenAPI spec
            .route("/openapi.json", get(openapi_json))
            .layer(cors)
    }
}

/// Convenience wrapper used by the server binary.
pub fn create_api_router(
    db: DbClient,
    cache: Arc<QueryCache>,
    api_config: &ApiConfig,
    auth_config: AuthConfig,
) -> ApiResult<Router> {
    Ok(ApiRouterBuilder::new(db, cache, api_config.clone(), auth_config)?.build())
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins. In production
/// mode, only the configured origins are allowed.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_api_config_for_production_requires_origins() {
        let config = ApiConfig::default();
        assert!(validate_api_config_for_production(&config).is_err());

        let mut config = ApiConfig::default();
        config.cors_origins = vec!["https://app.opone.dev".to_string()];
        assert!(validate_api_config_for_production(&config).is_ok());
    }
}

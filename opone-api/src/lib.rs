//! OpOne API - REST API Layer
//!
//! This crate provides the HTTP surface of the OpOne business-management
//! backend. Route handlers call the cached database client, which layers
//! the TTL query cache from `opone-cache` over a pooled PostgreSQL client.
//! Sessions are cookie-carried JWTs checked by a route-guard middleware.

pub mod auth;
pub mod cached_db;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use auth::{
    hash_password, issue_token, validate_token, verify_password, AuthClock, AuthConfig,
    AuthContext, Claims, FixedClock, JwtSecret, SystemClock, AUTH_COOKIE,
};
pub use cached_db::{CachedDbClient, QueryCache, METRICS_KEY_SPACE};
pub use config::ApiConfig;
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{extract_auth_context, session_guard, AuthMiddlewareState};
pub use openapi::ApiDoc;
pub use routes::{create_api_router, ApiRouterBuilder};
pub use services::MetricsService;
pub use types::*;

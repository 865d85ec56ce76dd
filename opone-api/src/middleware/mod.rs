//! Axum middleware for the OpOne API.

pub mod auth;

pub use auth::{extract_auth_context, session_guard, AuthMiddlewareState};

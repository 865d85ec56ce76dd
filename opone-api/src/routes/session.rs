//! Session REST API Routes
//!
//! Login, logout, and current-user endpoints. Login verifies credentials
//! against the users table and installs the `auth-token` session cookie;
//! logout expires it. `/auth/me` re-reads the account from the store so a
//! deactivated user is cut off even with a still-valid token.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use opone_core::AuthError;
use std::sync::Arc;

use crate::{
    auth::{
        expired_session_cookie, issue_token, session_cookie, verify_password, AuthConfig,
        AuthContext,
    },
    cached_db::CachedDbClient,
    error::{ApiError, ApiResult},
    types::{Envelope, LoginRequest, SessionResponse, UserResponse},
};

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for session routes.
#[derive(Clone)]
pub struct SessionState {
    pub cached_db: CachedDbClient,
    pub auth_config: Arc<AuthConfig>,
}

impl SessionState {
    pub fn new(cached_db: CachedDbClient, auth_config: Arc<AuthConfig>) -> Self {
        Self {
            cached_db,
            auth_config,
        }
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/auth/login - Authenticate and install the session cookie
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Session",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = SessionResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Invalid credentials", body = ApiError),
    ),
)]
pub async fn login(
    State(state): State<Arc<SessionState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.email.trim().is_empty() {
        return Err(ApiError::missing_field("email"));
    }
    if req.password.is_empty() {
        return Err(ApiError::missing_field("password"));
    }

    // One error for both unknown email and wrong password so the login
    // form cannot be used to probe which accounts exist.
    let user = state
        .cached_db
        .user_find_by_email(req.email.trim())
        .await?
        .ok_or_else(|| ApiError::from(AuthError::InvalidCredentials))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(AuthError::InvalidCredentials.into());
    }

    if !user.active {
        return Err(AuthError::AccountDisabled {
            email: user.email.clone(),
        }
        .into());
    }

    let token = issue_token(&state.auth_config, &user)?;
    let cookie = session_cookie(&token, state.auth_config.session_ttl_secs);

    tracing::info!(user_id = %user.user_id, "user logged in");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse::new(UserResponse::from(user))),
    ))
}

/// POST /api/v1/auth/logout - Expire the session cookie
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Session",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn logout(Extension(context): Extension<AuthContext>) -> impl IntoResponse {
    tracing::info!(user_id = %context.user_id, "user logged out");

    (
        StatusCode::OK,
        [(header::SET_COOKIE, expired_session_cookie())],
        Json(Envelope::message("Logged out")),
    )
}

/// GET /api/v1/auth/me - Current authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Session",
    responses(
        (status = 200, description = "Current user", body = SessionResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
)]
pub async fn me(
    State(state): State<Arc<SessionState>>,
    Extension(context): Extension<AuthContext>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .cached_db
        .user_get(context.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Account no longer exists"))?;

    if !user.active {
        return Err(AuthError::AccountDisabled {
            email: user.email.clone(),
        }
        .into());
    }

    Ok(Json(SessionResponse::new(UserResponse::from(user))))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Routes reachable without a session (the login form itself).
pub fn public_router(state: Arc<SessionState>) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .with_state(state)
}

/// Routes that require an authenticated session.
pub fn protected_router(state: Arc<SessionState>) -> Router {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_validation() {
        let req = LoginRequest {
            email: "  ".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(req.email.trim().is_empty());

        let req = LoginRequest {
            email: "ana@opone.dev".to_string(),
            password: String::new(),
        };
        assert!(req.password.is_empty());
    }
}

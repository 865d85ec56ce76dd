//! API error envelope.
//!
//! Every fallible operation in this crate returns [`ApiResult`]. A failure
//! reaches the client as the error half of the response envelope,
//! `{"success": false, "code": ..., "message": ...}`, with the HTTP status
//! implied by the code. Store and pool failures convert via `From`; their
//! internal detail is logged here and never serialized to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result alias used throughout the API layer.
pub type ApiResult<T> = Result<T, ApiError>;

/// Category of an API failure.
///
/// The wire form is SCREAMING_SNAKE_CASE; clients branch on it rather than
/// on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // 401
    Unauthorized,
    InvalidToken,
    TokenExpired,
    // 403
    Forbidden,
    // 400
    ValidationFailed,
    InvalidInput,
    MissingField,
    InvalidRange,
    // 404
    EntityNotFound,
    // 500
    InternalError,
    DatabaseError,
    // 503
    ServiceUnavailable,
    ConnectionPoolExhausted,
}

impl ErrorCode {
    /// HTTP status implied by this code.
    pub fn status_code(&self) -> StatusCode {
        use ErrorCode::*;
        match self {
            Unauthorized | InvalidToken | TokenExpired => StatusCode::UNAUTHORIZED,
            Forbidden => StatusCode::FORBIDDEN,
            ValidationFailed | InvalidInput | MissingField | InvalidRange => {
                StatusCode::BAD_REQUEST
            }
            EntityNotFound => StatusCode::NOT_FOUND,
            InternalError | DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceUnavailable | ConnectionPoolExhausted => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Message used when a constructor has nothing more specific to say.
    fn fallback_message(&self) -> &'static str {
        use ErrorCode::*;
        match self {
            Unauthorized => "Authentication required",
            InvalidToken => "Invalid session token",
            TokenExpired => "Session token has expired",
            Forbidden => "Access forbidden",
            ValidationFailed => "Request validation failed",
            InvalidInput => "Invalid input data",
            MissingField => "Required field is missing",
            InvalidRange => "Value is out of valid range",
            EntityNotFound => "Entity not found",
            InternalError => "Internal server error",
            DatabaseError => "Database operation failed",
            ServiceUnavailable => "Service temporarily unavailable",
            ConnectionPoolExhausted => "Connection pool exhausted",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The error half of the response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    /// Always false; clients branch on this one field for both halves of
    /// the envelope.
    #[serde(default)]
    pub success: bool,
    pub code: ErrorCode,
    pub message: String,
    /// Structured extras (field-level validation errors and the like).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.fallback_message())
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // One constructor per code the handlers actually raise. Constructors
    // that take a message force the caller to say what went wrong; the
    // parameterless ones have nothing useful to add.

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidToken, message)
    }

    pub fn token_expired() -> Self {
        Self::from_code(ErrorCode::TokenExpired)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
    }

    pub fn invalid_range(field: &str, min: impl fmt::Display, max: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidRange,
            format!("Field '{}' must be between {} and {}", field, min, max),
        )
    }

    pub fn entity_not_found(kind: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::EntityNotFound,
            format!("{} with id {} not found", kind, id),
        )
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn connection_pool_exhausted() -> Self {
        Self::from_code(ErrorCode::ConnectionPoolExhausted)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Lets handlers end with `?` and have Axum render the envelope.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

// Store-layer failures. The raw error is worth a log line but the client
// only learns the category.

impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        tracing::error!(error = ?err, "database query failed");
        ApiError::database_error("Database operation failed")
    }
}

impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!(error = ?err, "connection pool error");
        match err {
            deadpool_postgres::PoolError::Timeout(_) => ApiError::connection_pool_exhausted(),
            deadpool_postgres::PoolError::Closed => {
                ApiError::service_unavailable("Database connection pool is closed")
            }
            _ => ApiError::database_error("Failed to acquire database connection"),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!(error = ?err, "JSON serialization failed");
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

impl From<uuid::Error> for ApiError {
    fn from(err: uuid::Error) -> Self {
        ApiError::invalid_input(format!("Invalid UUID: {}", err))
    }
}

// Core taxonomy. Subsystem errors carry their own wording; only the code
// assignment happens here.

impl From<opone_core::StorageError> for ApiError {
    fn from(err: opone_core::StorageError) -> Self {
        use opone_core::StorageError;
        match err {
            StorageError::NotFound { kind, id } => ApiError::entity_not_found(&kind.to_string(), id),
            StorageError::ConnectionUnavailable { reason } => ApiError::service_unavailable(reason),
            other => {
                tracing::error!(error = %other, "storage failure");
                ApiError::database_error(other.to_string())
            }
        }
    }
}

impl From<opone_core::ValidationError> for ApiError {
    fn from(err: opone_core::ValidationError) -> Self {
        ApiError::validation_failed(err.to_string())
    }
}

impl From<opone_core::ConfigError> for ApiError {
    fn from(err: opone_core::ConfigError) -> Self {
        ApiError::invalid_input(err.to_string())
    }
}

impl From<opone_core::AuthError> for ApiError {
    fn from(err: opone_core::AuthError) -> Self {
        use opone_core::AuthError;
        match err {
            AuthError::InvalidCredentials => ApiError::unauthorized("Invalid email or password"),
            AuthError::InvalidToken { reason } => ApiError::invalid_token(reason),
            AuthError::TokenExpired => ApiError::token_expired(),
            AuthError::AccountDisabled { .. } => ApiError::forbidden("Account is disabled"),
        }
    }
}

impl From<opone_core::OpOneError> for ApiError {
    fn from(err: opone_core::OpOneError) -> Self {
        use opone_core::OpOneError;
        match err {
            OpOneError::Storage(e) => e.into(),
            OpOneError::Validation(e) => e.into(),
            OpOneError::Config(e) => e.into(),
            OpOneError::Auth(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_covers_every_class() {
        assert_eq!(ErrorCode::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::TokenExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::MissingField.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::EntityNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::DatabaseError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::ConnectionPoolExhausted.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_constructors_set_code_and_message() {
        let err = ApiError::unauthorized("Invalid credentials");
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert_eq!(err.message, "Invalid credentials");
        assert!(!err.success);

        let err = ApiError::entity_not_found("Project", "123");
        assert_eq!(err.code, ErrorCode::EntityNotFound);
        assert!(err.message.contains("Project"));
        assert!(err.message.contains("123"));

        let err = ApiError::invalid_range("probability", 0, 100);
        assert_eq!(err.code, ErrorCode::InvalidRange);
        assert!(err.message.contains("probability"));
    }

    #[test]
    fn test_wire_envelope_shape() -> Result<(), serde_json::Error> {
        let err = ApiError::unauthorized("Invalid token");
        let json = serde_json::to_string(&err)?;

        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"code\":\"UNAUTHORIZED\""));
        assert!(json.contains("Invalid token"));
        // details are omitted entirely when absent
        assert!(!json.contains("details"));

        let back: ApiError = serde_json::from_str(&json)?;
        assert_eq!(back, err);
        Ok(())
    }

    #[test]
    fn test_details_are_attached_verbatim() {
        let details = serde_json::json!({"field": "email", "constraint": "format"});
        let err = ApiError::validation_failed("Invalid email").with_details(details.clone());
        assert_eq!(err.details, Some(details));
    }

    #[test]
    fn test_display_names_code_and_message() {
        let rendered = format!("{}", ApiError::database_error("Connection failed"));
        assert!(rendered.contains("DatabaseError"));
        assert!(rendered.contains("Connection failed"));
    }

    #[test]
    fn test_core_taxonomy_maps_to_codes() {
        use opone_core::{AuthError, ConfigError, EntityKind, OpOneError, StorageError, ValidationError};

        let err: ApiError = OpOneError::from(StorageError::NotFound {
            kind: EntityKind::Project,
            id: uuid::Uuid::nil(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::EntityNotFound);
        assert!(err.message.contains("Project"));

        let err: ApiError = OpOneError::from(ValidationError::RequiredFieldMissing {
            field: "name".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let err: ApiError = OpOneError::from(ConfigError::MissingRequired {
            field: "OPONE_JWT_SECRET".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let err: ApiError = OpOneError::from(AuthError::TokenExpired).into();
        assert_eq!(err.code, ErrorCode::TokenExpired);

        let err: ApiError = AuthError::AccountDisabled {
            email: "ana@opone.dev".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let disabled = format!("{}", ApiError::from(AuthError::AccountDisabled {
            email: "ana@opone.dev".to_string(),
        }));
        // The account's email stays in the log-side error, never the envelope.
        assert!(!disabled.contains("ana@opone.dev"));
    }
}

//! Error types for OpOne operations

use crate::EntityKind;
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {kind:?} with id {id}")]
    NotFound { kind: EntityKind, id: Uuid },

    #[error("Insert failed for {kind:?}: {reason}")]
    InsertFailed { kind: EntityKind, reason: String },

    #[error("Update failed for {kind:?} with id {id}: {reason}")]
    UpdateFailed {
        kind: EntityKind,
        id: Uuid,
        reason: String,
    },

    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Connection unavailable: {reason}")]
    ConnectionUnavailable { reason: String },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Value for {field} out of range: must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
    },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Authentication and session errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Session token is invalid: {reason}")]
    InvalidToken { reason: String },

    #[error("Session token has expired")]
    TokenExpired,

    #[error("Account is disabled: {email}")]
    AccountDisabled { email: String },
}

/// Master error type for all OpOne errors.
#[derive(Debug, Clone, Error)]
pub enum OpOneError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

/// Result type alias for OpOne operations.
pub type OpOneResult<T> = Result<T, OpOneError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            kind: EntityKind::Project,
            id: Uuid::nil(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("Project"));
        assert!(msg.contains("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_validation_error_display_out_of_range() {
        let err = ValidationError::OutOfRange {
            field: "probability".to_string(),
            min: 0,
            max: 100,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("probability"));
        assert!(msg.contains("0"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn test_auth_error_does_not_leak_detail() {
        let msg = format!("{}", AuthError::InvalidCredentials);
        assert_eq!(msg, "Invalid credentials");
    }

    #[test]
    fn test_master_error_wraps_subsystems() {
        let err: OpOneError = ConfigError::MissingRequired {
            field: "jwt_secret".to_string(),
        }
        .into();
        assert!(format!("{}", err).contains("Config error"));

        let err: OpOneError = AuthError::TokenExpired.into();
        assert!(format!("{}", err).contains("expired"));
    }
}

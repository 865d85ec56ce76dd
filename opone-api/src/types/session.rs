//! Session (login/logout/current-user) types.

use opone_core::{EntityId, TeamRole, Timestamp, UserAccount};
use serde::{Deserialize, Serialize};

/// POST /api/v1/auth/login request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: EntityId,
    pub email: String,
    pub display_name: String,
    pub role: TeamRole,
    pub active: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl From<UserAccount> for UserResponse {
    fn from(user: UserAccount) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
            active: user.active,
            created_at: user.created_at,
        }
    }
}

/// Login / current-user envelope: `{"success": true, "user": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionResponse {
    pub success: bool,
    pub user: UserResponse,
}

impl SessionResponse {
    pub fn new(user: UserResponse) -> Self {
        Self {
            success: true,
            user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use opone_core::new_entity_id;

    #[test]
    fn test_user_response_from_account_drops_hash() {
        let user = UserAccount {
            user_id: new_entity_id(),
            email: "rui@opone.dev".to_string(),
            password_hash: "$2b$12$secretsecretsecret".to_string(),
            display_name: "Rui".to_string(),
            role: TeamRole::Manager,
            active: true,
            created_at: Utc::now(),
        };

        let response = UserResponse::from(user);
        let json = serde_json::to_string(&SessionResponse::new(response)).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"user\""));
        assert!(!json.contains("password"));
        assert!(!json.contains("$2b$"));
    }
}

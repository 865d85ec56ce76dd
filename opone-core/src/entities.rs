//! Core entity structures

use crate::{
    AccountKind, Cents, ClientStatus, CommunicationChannel, EntityId, OpportunityStage,
    ProjectStatus, TeamRole, Timestamp, TransactionDirection,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Team member - a person inside the organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TeamMember {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub member_id: EntityId,
    pub name: String,
    pub email: String,
    pub role: TeamRole,
    pub phone: Option<String>,
    pub active: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Client - a company or individual the organization works with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Client {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub client_id: EntityId,
    pub name: String,
    pub company: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub status: ClientStatus,
    pub notes: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Project - a unit of billable or internal work, optionally tied to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Project {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub project_id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub client_id: Option<EntityId>,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub budget_cents: Option<Cents>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub start_date: Option<NaiveDate>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub due_date: Option<NaiveDate>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Financial account transactions settle against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FinancialAccount {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub account_id: EntityId,
    pub name: String,
    pub kind: AccountKind,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Financial transaction - a single income or expense movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Transaction {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub transaction_id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub account_id: Option<EntityId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub project_id: Option<EntityId>,
    pub description: String,
    pub direction: TransactionDirection,
    /// Always positive; `direction` carries the sign.
    pub amount_cents: Cents,
    pub category: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date"))]
    pub occurred_on: NaiveDate,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Sales opportunity in the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Opportunity {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub opportunity_id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub client_id: Option<EntityId>,
    pub title: String,
    pub stage: OpportunityStage,
    pub value_cents: Cents,
    /// Estimated close probability in percent (0-100).
    pub probability: Option<i16>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub expected_close: Option<NaiveDate>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Logged communication with a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Communication {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub communication_id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub client_id: Option<EntityId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub member_id: Option<EntityId>,
    pub channel: CommunicationChannel,
    pub subject: String,
    pub body: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub occurred_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Application login account.
///
/// The password hash never leaves the persistence/auth boundary; response
/// types in the API layer carry a stripped-down view of this struct.
#[derive(Debug, Clone, PartialEq)]
pub struct UserAccount {
    pub user_id: EntityId,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub role: TeamRole,
    pub active: bool,
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::new_entity_id;
    use chrono::Utc;

    #[test]
    fn test_transaction_serialization_roundtrip() {
        let tx = Transaction {
            transaction_id: new_entity_id(),
            account_id: None,
            project_id: Some(new_entity_id()),
            description: "Server hosting".to_string(),
            direction: TransactionDirection::Expense,
            amount_cents: 12_900,
            category: Some("infrastructure".to_string()),
            occurred_on: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn test_user_account_has_no_serialize_derive() {
        // UserAccount intentionally does not implement Serialize; this test
        // documents the boundary by exercising the struct without it.
        let user = UserAccount {
            user_id: new_entity_id(),
            email: "ana@opone.dev".to_string(),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".to_string(),
            display_name: "Ana".to_string(),
            role: TeamRole::Admin,
            active: true,
            created_at: Utc::now(),
        };
        assert!(user.active);
    }
}

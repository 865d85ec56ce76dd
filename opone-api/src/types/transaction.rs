//! Transaction and financial account request/response types.

use chrono::NaiveDate;
use opone_core::{AccountKind, Cents, EntityId, TransactionDirection};
use serde::{Deserialize, Serialize};

pub type TransactionResponse = opone_core::Transaction;
pub type AccountResponse = opone_core::FinancialAccount;

/// POST /api/v1/transactions request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateTransactionRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub account_id: Option<EntityId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub project_id: Option<EntityId>,
    pub description: String,
    pub direction: TransactionDirection,
    /// Must be positive; direction carries the sign.
    pub amount_cents: Cents,
    pub category: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date"))]
    pub occurred_on: NaiveDate,
}

/// PATCH /api/v1/transactions/{id} request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateTransactionRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub account_id: Option<EntityId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub project_id: Option<EntityId>,
    pub description: Option<String>,
    pub direction: Option<TransactionDirection>,
    pub amount_cents: Option<Cents>,
    pub category: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub occurred_on: Option<NaiveDate>,
}

impl UpdateTransactionRequest {
    pub fn is_empty(&self) -> bool {
        self.account_id.is_none()
            && self.project_id.is_none()
            && self.description.is_none()
            && self.direction.is_none()
            && self.amount_cents.is_none()
            && self.category.is_none()
            && self.occurred_on.is_none()
    }
}

/// GET /api/v1/transactions query parameters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListTransactionsRequest {
    pub direction: Option<TransactionDirection>,
    pub project_id: Option<EntityId>,
    pub account_id: Option<EntityId>,
}

/// POST /api/v1/accounts request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateAccountRequest {
    pub name: String,
    pub kind: AccountKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_transaction_request_deserializes() {
        let req: CreateTransactionRequest = serde_json::from_str(
            r#"{
                "description": "Invoice #42",
                "direction": "Income",
                "amount_cents": 250000,
                "occurred_on": "2025-06-01"
            }"#,
        )
        .unwrap();
        assert_eq!(req.direction, TransactionDirection::Income);
        assert_eq!(req.amount_cents, 250_000);
        assert!(req.account_id.is_none());
    }
}

//! Sales opportunity request/response types.

use chrono::NaiveDate;
use opone_core::{Cents, EntityId, OpportunityStage};
use serde::{Deserialize, Serialize};

pub type OpportunityResponse = opone_core::Opportunity;

/// POST /api/v1/opportunities request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateOpportunityRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub client_id: Option<EntityId>,
    pub title: String,
    /// Defaults to Prospect when omitted.
    pub stage: Option<OpportunityStage>,
    pub value_cents: Cents,
    /// Close probability in percent (0-100).
    pub probability: Option<i16>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub expected_close: Option<NaiveDate>,
}

/// PATCH /api/v1/opportunities/{id} request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateOpportunityRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub client_id: Option<EntityId>,
    pub title: Option<String>,
    pub stage: Option<OpportunityStage>,
    pub value_cents: Option<Cents>,
    pub probability: Option<i16>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub expected_close: Option<NaiveDate>,
}

impl UpdateOpportunityRequest {
    pub fn is_empty(&self) -> bool {
        self.client_id.is_none()
            && self.title.is_none()
            && self.stage.is_none()
            && self.value_cents.is_none()
            && self.probability.is_none()
            && self.expected_close.is_none()
    }
}

/// GET /api/v1/opportunities query parameters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListOpportunitiesRequest {
    pub stage: Option<OpportunityStage>,
    pub client_id: Option<EntityId>,
}

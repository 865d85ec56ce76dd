//! Client communication request/response types.

use chrono::{DateTime, Utc};
use opone_core::{CommunicationChannel, EntityId};
use serde::{Deserialize, Serialize};

pub type CommunicationResponse = opone_core::Communication;

/// POST /api/v1/communications request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateCommunicationRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub client_id: Option<EntityId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub member_id: Option<EntityId>,
    pub channel: CommunicationChannel,
    pub subject: String,
    pub body: Option<String>,
    /// Defaults to the server's current time when omitted.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub occurred_at: Option<DateTime<Utc>>,
}

/// GET /api/v1/communications query parameters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListCommunicationsRequest {
    pub client_id: Option<EntityId>,
    pub channel: Option<CommunicationChannel>,
}

//! Client request/response types.

use opone_core::ClientStatus;
use serde::{Deserialize, Serialize};

pub type ClientResponse = opone_core::Client;

/// POST /api/v1/clients request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateClientRequest {
    pub name: String,
    pub company: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    /// Defaults to Lead when omitted.
    pub status: Option<ClientStatus>,
    pub notes: Option<String>,
}

/// PATCH /api/v1/clients/{id} request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<ClientStatus>,
    pub notes: Option<String>,
}

impl UpdateClientRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.company.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.status.is_none()
            && self.notes.is_none()
    }
}

/// GET /api/v1/clients query parameters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListClientsRequest {
    pub status: Option<ClientStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_deserializes_from_variant_name() {
        let req: ListClientsRequest =
            serde_json::from_str(r#"{"status": "Lead"}"#).unwrap();
        assert_eq!(req.status, Some(ClientStatus::Lead));
    }
}

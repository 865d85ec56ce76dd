//! Project request/response types.

use chrono::NaiveDate;
use opone_core::{Cents, EntityId, ProjectStatus};
use serde::{Deserialize, Serialize};

/// Projects are served on the wire exactly as stored.
pub type ProjectResponse = opone_core::Project;

/// POST /api/v1/projects request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateProjectRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub client_id: Option<EntityId>,
    pub name: String,
    pub description: Option<String>,
    /// Defaults to Draft when omitted.
    pub status: Option<ProjectStatus>,
    pub budget_cents: Option<Cents>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub start_date: Option<NaiveDate>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub due_date: Option<NaiveDate>,
}

/// PATCH /api/v1/projects/{id} request body. Absent fields are left
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateProjectRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub client_id: Option<EntityId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub budget_cents: Option<Cents>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub start_date: Option<NaiveDate>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub due_date: Option<NaiveDate>,
}

impl UpdateProjectRequest {
    pub fn is_empty(&self) -> bool {
        self.client_id.is_none()
            && self.name.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.budget_cents.is_none()
            && self.start_date.is_none()
            && self.due_date.is_none()
    }
}

/// GET /api/v1/projects query parameters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListProjectsRequest {
    pub status: Option<ProjectStatus>,
    pub client_id: Option<EntityId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_emptiness() {
        assert!(UpdateProjectRequest::default().is_empty());

        let req = UpdateProjectRequest {
            name: Some("Rebrand".to_string()),
            ..Default::default()
        };
        assert!(!req.is_empty());
    }

    #[test]
    fn test_create_request_deserializes_minimal_body() {
        let req: CreateProjectRequest =
            serde_json::from_str(r#"{"name": "Website relaunch"}"#).unwrap();
        assert_eq!(req.name, "Website relaunch");
        assert!(req.status.is_none());
        assert!(req.client_id.is_none());
    }
}

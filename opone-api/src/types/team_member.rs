//! Team member request/response types.

use opone_core::TeamRole;
use serde::{Deserialize, Serialize};

pub type TeamMemberResponse = opone_core::TeamMember;

/// POST /api/v1/team-members request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateTeamMemberRequest {
    pub name: String,
    pub email: String,
    /// Defaults to Member when omitted.
    pub role: Option<TeamRole>,
    pub phone: Option<String>,
}

/// PATCH /api/v1/team-members/{id} request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateTeamMemberRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<TeamRole>,
    pub phone: Option<String>,
    pub active: Option<bool>,
}

impl UpdateTeamMemberRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.phone.is_none()
            && self.active.is_none()
    }
}

/// GET /api/v1/team-members query parameters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListTeamMembersRequest {
    pub active: Option<bool>,
}

//! OpenAPI Documentation
//!
//! Aggregates every route annotation and schema into the document served
//! at /openapi.json.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes;
use crate::types::*;
use opone_core::{
    AccountKind, Client, ClientStatus, Communication, CommunicationChannel, FinancialAccount,
    Opportunity, OpportunityStage, Project, ProjectStatus, TeamMember, TeamRole, Transaction,
    TransactionDirection,
};

/// OpenAPI document for the OpOne API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "OpOne API",
        description = "Business-management backend: projects, clients, sales pipeline, \
                       team, and financial transaction tracking.",
    ),
    paths(
        // Session
        routes::session::login,
        routes::session::logout,
        routes::session::me,
        // Projects
        routes::project::create_project,
        routes::project::list_projects,
        routes::project::get_project,
        routes::project::update_project,
        routes::project::delete_project,
        // Clients
        routes::client::create_client,
        routes::client::list_clients,
        routes::client::get_client,
        routes::client::update_client,
        routes::client::delete_client,
        // Team
        routes::team_member::create_team_member,
        routes::team_member::list_team_members,
        routes::team_member::get_team_member,
        routes::team_member::update_team_member,
        routes::team_member::delete_team_member,
        // Transactions
        routes::transaction::create_transaction,
        routes::transaction::list_transactions,
        routes::transaction::get_transaction,
        routes::transaction::update_transaction,
        routes::transaction::delete_transaction,
        // Accounts
        routes::account::create_account,
        routes::account::list_accounts,
        // Opportunities
        routes::opportunity::create_opportunity,
        routes::opportunity::list_opportunities,
        routes::opportunity::get_opportunity,
        routes::opportunity::update_opportunity,
        routes::opportunity::delete_opportunity,
        // Communications
        routes::communication::create_communication,
        routes::communication::list_communications,
        routes::communication::delete_communication,
        // Metrics
        routes::metrics::dashboard,
        // Health
        routes::health::ping,
        routes::health::liveness,
        routes::health::readiness,
    ),
    components(schemas(
        // Errors
        ApiError,
        ErrorCode,
        // Entities
        Project,
        ProjectStatus,
        Client,
        ClientStatus,
        TeamMember,
        TeamRole,
        Transaction,
        TransactionDirection,
        FinancialAccount,
        AccountKind,
        Opportunity,
        OpportunityStage,
        Communication,
        CommunicationChannel,
        // Requests
        CreateProjectRequest,
        UpdateProjectRequest,
        CreateClientRequest,
        UpdateClientRequest,
        CreateTeamMemberRequest,
        UpdateTeamMemberRequest,
        CreateTransactionRequest,
        UpdateTransactionRequest,
        CreateAccountRequest,
        CreateOpportunityRequest,
        UpdateOpportunityRequest,
        CreateCommunicationRequest,
        LoginRequest,
        // Session / metrics payloads
        UserResponse,
        SessionResponse,
        DashboardMetrics,
        // Health
        routes::health::HealthReport,
        routes::health::ServiceStatus,
        routes::health::DatabaseProbe,
    )),
    tags(
        (name = "Session", description = "Login, logout, and current user"),
        (name = "Projects", description = "Project management"),
        (name = "Clients", description = "Client records"),
        (name = "Team", description = "Team member management"),
        (name = "Transactions", description = "Financial transaction tracking"),
        (name = "Accounts", description = "Financial accounts"),
        (name = "Opportunities", description = "Sales pipeline"),
        (name = "Communications", description = "Client communication log"),
        (name = "Metrics", description = "Dashboard aggregates"),
        (name = "Health", description = "Service health checks"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("/api/v1/projects"));
        assert!(json.contains("/api/v1/auth/login"));
        assert!(json.contains("/health/ready"));
    }
}

//! Enum types for OpOne entities

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE ENUMS
// ============================================================================

/// Entity kind discriminator for polymorphic references and cache keying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityKind {
    Project,
    Client,
    TeamMember,
    Transaction,
    Account,
    Opportunity,
    Communication,
    User,
}

impl EntityKind {
    /// Stable tag used as the leading segment of cache keys for this kind.
    ///
    /// Broad invalidation removes every cache entry whose key contains this
    /// tag, so tags must be unique and must never change between releases.
    pub fn cache_tag(&self) -> &'static str {
        match self {
            EntityKind::Project => "projects",
            EntityKind::Client => "clients",
            EntityKind::TeamMember => "team_members",
            EntityKind::Transaction => "transactions",
            EntityKind::Account => "accounts",
            EntityKind::Opportunity => "opportunities",
            EntityKind::Communication => "communications",
            EntityKind::User => "users",
        }
    }
}

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ProjectStatus {
    Draft,
    Active,
    OnHold,
    Completed,
    Cancelled,
}

/// Client relationship status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ClientStatus {
    Lead,
    Active,
    Inactive,
}

/// Role of a team member inside the organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum TeamRole {
    Admin,
    Manager,
    Member,
}

/// Direction of a financial transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum TransactionDirection {
    Income,
    Expense,
}

/// Kind of financial account a transaction settles against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum AccountKind {
    Checking,
    Savings,
    Card,
    Cash,
}

/// Stage of a sales opportunity in the pipeline.
///
/// `Won` and `Lost` are terminal; every other stage counts toward the open
/// pipeline value on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum OpportunityStage {
    Prospect,
    Qualified,
    Proposal,
    Negotiation,
    Won,
    Lost,
}

impl OpportunityStage {
    /// Whether this stage still counts toward the open pipeline.
    pub fn is_open(&self) -> bool {
        !matches!(self, OpportunityStage::Won | OpportunityStage::Lost)
    }
}

/// Channel a client communication happened over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum CommunicationChannel {
    Email,
    Call,
    Meeting,
    Message,
}

// ============================================================================
// DISPLAY / FROMSTR
// ============================================================================

/// Lowercase a token and strip separators so parsing accepts both
/// "OnHold" and "on_hold".
fn normalize_token(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-' && *c != ' ')
        .collect::<String>()
        .to_lowercase()
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            EntityKind::Project => "Project",
            EntityKind::Client => "Client",
            EntityKind::TeamMember => "TeamMember",
            EntityKind::Transaction => "Transaction",
            EntityKind::Account => "Account",
            EntityKind::Opportunity => "Opportunity",
            EntityKind::Communication => "Communication",
            EntityKind::User => "User",
        };
        write!(f, "{}", value)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            ProjectStatus::Draft => "Draft",
            ProjectStatus::Active => "Active",
            ProjectStatus::OnHold => "OnHold",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Cancelled => "Cancelled",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for ProjectStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "draft" => Ok(ProjectStatus::Draft),
            "active" => Ok(ProjectStatus::Active),
            "onhold" => Ok(ProjectStatus::OnHold),
            "completed" | "complete" => Ok(ProjectStatus::Completed),
            "cancelled" | "canceled" => Ok(ProjectStatus::Cancelled),
            _ => Err(ValidationError::InvalidValue {
                field: "ProjectStatus".to_string(),
                reason: format!("unrecognized value '{}'", s),
            }),
        }
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            ClientStatus::Lead => "Lead",
            ClientStatus::Active => "Active",
            ClientStatus::Inactive => "Inactive",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for ClientStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "lead" => Ok(ClientStatus::Lead),
            "active" => Ok(ClientStatus::Active),
            "inactive" => Ok(ClientStatus::Inactive),
            _ => Err(ValidationError::InvalidValue {
                field: "ClientStatus".to_string(),
                reason: format!("unrecognized value '{}'", s),
            }),
        }
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            TeamRole::Admin => "Admin",
            TeamRole::Manager => "Manager",
            TeamRole::Member => "Member",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for TeamRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "admin" => Ok(TeamRole::Admin),
            "manager" => Ok(TeamRole::Manager),
            "member" => Ok(TeamRole::Member),
            _ => Err(ValidationError::InvalidValue {
                field: "TeamRole".to_string(),
                reason: format!("unrecognized value '{}'", s),
            }),
        }
    }
}

impl fmt::Display for TransactionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            TransactionDirection::Income => "Income",
            TransactionDirection::Expense => "Expense",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for TransactionDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "income" => Ok(TransactionDirection::Income),
            "expense" => Ok(TransactionDirection::Expense),
            _ => Err(ValidationError::InvalidValue {
                field: "TransactionDirection".to_string(),
                reason: format!("unrecognized value '{}'", s),
            }),
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            AccountKind::Checking => "Checking",
            AccountKind::Savings => "Savings",
            AccountKind::Card => "Card",
            AccountKind::Cash => "Cash",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for AccountKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "checking" => Ok(AccountKind::Checking),
            "savings" => Ok(AccountKind::Savings),
            "card" => Ok(AccountKind::Card),
            "cash" => Ok(AccountKind::Cash),
            _ => Err(ValidationError::InvalidValue {
                field: "AccountKind".to_string(),
                reason: format!("unrecognized value '{}'", s),
            }),
        }
    }
}

impl fmt::Display for OpportunityStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            OpportunityStage::Prospect => "Prospect",
            OpportunityStage::Qualified => "Qualified",
            OpportunityStage::Proposal => "Proposal",
            OpportunityStage::Negotiation => "Negotiation",
            OpportunityStage::Won => "Won",
            OpportunityStage::Lost => "Lost",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for OpportunityStage {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "prospect" => Ok(OpportunityStage::Prospect),
            "qualified" => Ok(OpportunityStage::Qualified),
            "proposal" => Ok(OpportunityStage::Proposal),
            "negotiation" => Ok(OpportunityStage::Negotiation),
            "won" => Ok(OpportunityStage::Won),
            "lost" => Ok(OpportunityStage::Lost),
            _ => Err(ValidationError::InvalidValue {
                field: "OpportunityStage".to_string(),
                reason: format!("unrecognized value '{}'", s),
            }),
        }
    }
}

impl fmt::Display for CommunicationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            CommunicationChannel::Email => "Email",
            CommunicationChannel::Call => "Call",
            CommunicationChannel::Meeting => "Meeting",
            CommunicationChannel::Message => "Message",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for CommunicationChannel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "email" => Ok(CommunicationChannel::Email),
            "call" => Ok(CommunicationChannel::Call),
            "meeting" => Ok(CommunicationChannel::Meeting),
            "message" => Ok(CommunicationChannel::Message),
            _ => Err(ValidationError::InvalidValue {
                field: "CommunicationChannel".to_string(),
                reason: format!("unrecognized value '{}'", s),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_tags_are_unique() {
        let kinds = [
            EntityKind::Project,
            EntityKind::Client,
            EntityKind::TeamMember,
            EntityKind::Transaction,
            EntityKind::Account,
            EntityKind::Opportunity,
            EntityKind::Communication,
            EntityKind::User,
        ];

        let mut tags: Vec<&str> = kinds.iter().map(|k| k.cache_tag()).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), kinds.len());
    }

    #[test]
    fn test_project_status_roundtrip() {
        for status in [
            ProjectStatus::Draft,
            ProjectStatus::Active,
            ProjectStatus::OnHold,
            ProjectStatus::Completed,
            ProjectStatus::Cancelled,
        ] {
            let parsed: ProjectStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_project_status_accepts_separators() {
        assert_eq!("on_hold".parse::<ProjectStatus>().unwrap(), ProjectStatus::OnHold);
        assert_eq!("on-hold".parse::<ProjectStatus>().unwrap(), ProjectStatus::OnHold);
    }

    #[test]
    fn test_opportunity_stage_open() {
        assert!(OpportunityStage::Prospect.is_open());
        assert!(OpportunityStage::Negotiation.is_open());
        assert!(!OpportunityStage::Won.is_open());
        assert!(!OpportunityStage::Lost.is_open());
    }

    #[test]
    fn test_stage_roundtrip() {
        for stage in [
            OpportunityStage::Prospect,
            OpportunityStage::Qualified,
            OpportunityStage::Proposal,
            OpportunityStage::Negotiation,
            OpportunityStage::Won,
            OpportunityStage::Lost,
        ] {
            let parsed: OpportunityStage = stage.to_string().parse().unwrap();
            assert_eq!(parsed, stage);
        }
    }

    #[test]
    fn test_invalid_tokens_rejected() {
        assert!("".parse::<ProjectStatus>().is_err());
        assert!("archived".parse::<ClientStatus>().is_err());

        let err = "transfer".parse::<TransactionDirection>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidValue {
                field: "TransactionDirection".to_string(),
                reason: "unrecognized value 'transfer'".to_string(),
            }
        );
    }
}

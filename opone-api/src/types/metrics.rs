//! Dashboard metrics types.

use opone_core::Cents;
use serde::{Deserialize, Serialize};

/// Aggregated snapshot rendered on the dashboard landing screen.
///
/// Deserialize is required because snapshots round-trip through the query
/// cache as opaque JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DashboardMetrics {
    /// Projects currently in Active status.
    pub active_projects: i64,
    /// All clients regardless of status.
    pub total_clients: i64,
    /// Opportunities not yet Won or Lost.
    pub open_opportunities: i64,
    /// Sum of value_cents over open opportunities.
    pub pipeline_value_cents: Cents,
    /// Income booked since the start of the current month.
    pub month_income_cents: Cents,
    /// Expenses booked since the start of the current month.
    pub month_expense_cents: Cents,
}

impl DashboardMetrics {
    /// Net cash movement for the current month.
    pub fn month_net_cents(&self) -> Cents {
        self.month_income_cents - self.month_expense_cents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_net() {
        let metrics = DashboardMetrics {
            month_income_cents: 500_000,
            month_expense_cents: 120_000,
            ..Default::default()
        };
        assert_eq!(metrics.month_net_cents(), 380_000);
    }

    #[test]
    fn test_cache_value_roundtrip() {
        let metrics = DashboardMetrics {
            active_projects: 4,
            total_clients: 19,
            open_opportunities: 7,
            pipeline_value_cents: 12_500_000,
            month_income_cents: 900_000,
            month_expense_cents: 340_000,
        };

        let value = serde_json::to_value(&metrics).unwrap();
        let back: DashboardMetrics = serde_json::from_value(value).unwrap();
        assert_eq!(back, metrics);
    }
}

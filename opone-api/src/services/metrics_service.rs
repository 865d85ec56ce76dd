//! Dashboard metrics service.
//!
//! Aggregates the landing-screen numbers from several store queries and
//! caches the snapshot briefly. This is the second consumer of the shared
//! query cache (the first being `CachedDbClient`), with its own shorter
//! TTL: dashboards tolerate a minute of staleness, record screens do not.
//!
//! The snapshot key lives inside the `metrics` key space, which every
//! entity mutation clears, so a write anywhere forces the next dashboard
//! read to recompute.

use std::sync::Arc;
use std::time::Duration;

use opone_core::TransactionDirection;

use crate::cached_db::QueryCache;
use crate::db::DbClient;
use crate::error::ApiResult;
use crate::types::DashboardMetrics;

/// Computes and caches the dashboard snapshot.
#[derive(Clone)]
pub struct MetricsService {
    db: DbClient,
    cache: Arc<QueryCache>,
    ttl: Duration,
}

impl MetricsService {
    /// Cache key for the dashboard snapshot.
    pub const DASHBOARD_KEY: &'static str = "metrics_dashboard";

    pub fn new(db: DbClient, cache: Arc<QueryCache>, ttl: Duration) -> Self {
        Self { db, cache, ttl }
    }

    /// Return the dashboard snapshot, recomputing on cache miss.
    pub async fn dashboard(&self) -> ApiResult<DashboardMetrics> {
        if let Some(value) = self.cache.get(Self::DASHBOARD_KEY) {
            match serde_json::from_value::<DashboardMetrics>(value) {
                Ok(snapshot) => return Ok(snapshot),
                Err(err) => {
                    tracing::warn!(error = %err, "dropping unreadable dashboard snapshot");
                    self.cache.delete(Self::DASHBOARD_KEY);
                }
            }
        }

        let (open_opportunities, pipeline_value_cents) = self.db.open_pipeline().await?;
        let snapshot = DashboardMetrics {
            active_projects: self.db.count_active_projects().await?,
            total_clients: self.db.count_clients().await?,
            open_opportunities,
            pipeline_value_cents,
            month_income_cents: self.db.month_cashflow(TransactionDirection::Income).await?,
            month_expense_cents: self
                .db
                .month_cashflow(TransactionDirection::Expense)
                .await?,
        };

        self.cache
            .set_with_ttl(Self::DASHBOARD_KEY, serde_json::to_value(&snapshot)?, self.ttl);
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cached_db::METRICS_KEY_SPACE;
    use crate::db::DbConfig;
    use opone_cache::TtlCache;

    fn lazy_service(cache: Arc<QueryCache>) -> MetricsService {
        // deadpool pools connect lazily, so a service over an unreachable
        // database is fine as long as every read is served from cache.
        let db = DbClient::from_config(&DbConfig::default()).unwrap();
        MetricsService::new(db, cache, Duration::from_secs(60))
    }

    #[test]
    fn test_dashboard_key_is_inside_metrics_key_space() {
        assert!(MetricsService::DASHBOARD_KEY.contains(METRICS_KEY_SPACE));
    }

    #[tokio::test]
    async fn test_dashboard_served_from_cache_without_store_access() {
        let cache = Arc::new(TtlCache::new(Duration::from_secs(300)));
        let service = lazy_service(cache.clone());

        let snapshot = DashboardMetrics {
            active_projects: 3,
            total_clients: 11,
            open_opportunities: 5,
            pipeline_value_cents: 4_200_000,
            month_income_cents: 750_000,
            month_expense_cents: 90_000,
        };
        cache.set_with_ttl(
            MetricsService::DASHBOARD_KEY,
            serde_json::to_value(&snapshot).unwrap(),
            Duration::from_secs(60),
        );

        // No database is reachable in tests; this only passes because the
        // primed snapshot short-circuits the store queries.
        let served = service.dashboard().await.unwrap();
        assert_eq!(served, snapshot);
    }
}

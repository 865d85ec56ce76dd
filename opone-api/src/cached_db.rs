//! Cached Database Client
//!
//! Wraps [`DbClient`] with the cache-aside protocol. Routes call
//! `cached_db.project_get()` unchanged and the cache is consulted
//! transparently:
//!
//! - Reads build a deterministic [`QueryKey`], try the cache, and on miss
//!   run the real fetch, store the serialized result, and return it. A
//!   failed fetch stores nothing, so the next call simply tries again
//!   (retry-by-recall, no scheduled retry).
//! - Writes run the store mutation first, then invalidate every key space
//!   that could include the mutated record: broadly by entity tag,
//!   targeted by record id substring, and the dashboard metrics space.
//!   Invalidation completes before the mutation result is returned.
//!
//! Two concurrent reads that both miss the same key will both fetch and
//! both store; the last store wins. There is deliberately no single-flight
//! de-duplication.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use opone_cache::{QueryKey, TtlCache};
use opone_core::{EntityId, EntityKind};

use crate::db::DbClient;
use crate::error::ApiResult;
use crate::types::*;

/// The process-wide query cache: string keys to opaque JSON payloads.
pub type QueryCache = TtlCache<serde_json::Value>;

/// Key-space prefix for dashboard aggregates. Every entity mutation clears
/// it, because the dashboard snapshot spans every entity.
pub const METRICS_KEY_SPACE: &str = "metrics";

// ============================================================================
// CACHE-ASIDE PRIMITIVES
// ============================================================================

/// Cache-aside read for a single optional record.
///
/// An absent record (fetch returned `None`) is not cached; only failures
/// and absences leave the key empty.
async fn read_through<T, F, Fut>(
    cache: &QueryCache,
    key: String,
    fetch: F,
) -> ApiResult<Option<T>>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ApiResult<Option<T>>>,
{
    if let Some(value) = cache.get(&key) {
        match serde_json::from_value::<T>(value) {
            Ok(hit) => return Ok(Some(hit)),
            Err(err) => {
                // Payload shape drifted between writes; drop the entry and
                // fall through to a real fetch.
                tracing::warn!(%key, error = %err, "dropping unreadable cache entry");
                cache.delete(&key);
            }
        }
    }

    match fetch().await? {
        Some(fetched) => {
            cache.set(key, serde_json::to_value(&fetched)?);
            Ok(Some(fetched))
        }
        None => Ok(None),
    }
}

/// Cache-aside read for a list query. Empty lists are cached like any
/// other result.
async fn read_through_list<T, F, Fut>(
    cache: &QueryCache,
    key: String,
    fetch: F,
) -> ApiResult<Vec<T>>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ApiResult<Vec<T>>>,
{
    if let Some(value) = cache.get(&key) {
        match serde_json::from_value::<Vec<T>>(value) {
            Ok(hit) => return Ok(hit),
            Err(err) => {
                tracing::warn!(%key, error = %err, "dropping unreadable cache entry");
                cache.delete(&key);
            }
        }
    }

    let fetched = fetch().await?;
    cache.set(key, serde_json::to_value(&fetched)?);
    Ok(fetched)
}

// ============================================================================
// CACHED DATABASE CLIENT
// ============================================================================

/// Database client with transparent cache-aside reads and invalidating
/// writes.
#[derive(Clone)]
pub struct CachedDbClient {
    /// The underlying database client.
    db: DbClient,
    /// The shared query cache.
    cache: Arc<QueryCache>,
}

impl CachedDbClient {
    /// Create a new cached database client.
    pub fn new(db: DbClient, cache: Arc<QueryCache>) -> Self {
        Self { db, cache }
    }

    /// Get a reference to the underlying database client.
    pub fn db(&self) -> &DbClient {
        &self.db
    }

    /// Get a reference to the cache.
    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Invalidate every cache entry that could include the mutated record.
    ///
    /// Runs synchronously before the mutation result is returned, so a
    /// subsequent read by the same caller can never be served the
    /// pre-mutation payload.
    fn invalidate(&self, kind: EntityKind, id: EntityId) {
        self.cache.clear_matching(kind.cache_tag());
        self.cache.clear_matching(&id.to_string());
        self.cache.clear_matching(METRICS_KEY_SPACE);
    }

    // ========================================================================
    // TEAM MEMBER OPERATIONS
    // ========================================================================

    pub async fn team_member_get(&self, id: EntityId) -> ApiResult<Option<TeamMemberResponse>> {
        let key = QueryKey::record(EntityKind::TeamMember, id);
        read_through(&self.cache, key, || self.db.team_member_get(id)).await
    }

    pub async fn team_member_list(
        &self,
        filter: &ListTeamMembersRequest,
    ) -> ApiResult<Vec<TeamMemberResponse>> {
        let key = QueryKey::entity(EntityKind::TeamMember)
            .filter_opt("active", filter.active)
            .render();
        read_through_list(&self.cache, key, || self.db.team_member_list(filter)).await
    }

    pub async fn team_member_create(
        &self,
        req: &CreateTeamMemberRequest,
    ) -> ApiResult<TeamMemberResponse> {
        let member = self.db.team_member_create(req).await?;
        self.invalidate(EntityKind::TeamMember, member.member_id);
        Ok(member)
    }

    pub async fn team_member_update(
        &self,
        id: EntityId,
        req: &UpdateTeamMemberRequest,
    ) -> ApiResult<Option<TeamMemberResponse>> {
        let updated = self.db.team_member_update(id, req).await?;
        if updated.is_some() {
            self.invalidate(EntityKind::TeamMember, id);
        }
        Ok(updated)
    }

    pub async fn team_member_delete(&self, id: EntityId) -> ApiResult<bool> {
        let deleted = self.db.team_member_delete(id).await?;
        if deleted {
            self.invalidate(EntityKind::TeamMember, id);
        }
        Ok(deleted)
    }

    // ========================================================================
    // CLIENT OPERATIONS
    // ========================================================================

    pub async fn client_get(&self, id: EntityId) -> ApiResult<Option<ClientResponse>> {
        let key = QueryKey::record(EntityKind::Client, id);
        read_through(&self.cache, key, || self.db.client_get(id)).await
    }

    pub async fn client_list(
        &self,
        filter: &ListClientsRequest,
    ) -> ApiResult<Vec<ClientResponse>> {
        let key = QueryKey::entity(EntityKind::Client)
            .filter_opt("status", filter.status)
            .render();
        read_through_list(&self.cache, key, || self.db.client_list(filter)).await
    }

    pub async fn client_create(&self, req: &CreateClientRequest) -> ApiResult<ClientResponse> {
        let client = self.db.client_create(req).await?;
        self.invalidate(EntityKind::Client, client.client_id);
        Ok(client)
    }

    pub async fn client_update(
        &self,
        id: EntityId,
        req: &UpdateClientRequest,
    ) -> ApiResult<Option<ClientResponse>> {
        let updated = self.db.client_update(id, req).await?;
        if updated.is_some() {
            self.invalidate(EntityKind::Client, id);
        }
        Ok(updated)
    }

    pub async fn client_delete(&self, id: EntityId) -> ApiResult<bool> {
        let deleted = self.db.client_delete(id).await?;
        if deleted {
            self.invalidate(EntityKind::Client, id);
        }
        Ok(deleted)
    }

    // ========================================================================
    // PROJECT OPERATIONS
    // ========================================================================

    pub async fn project_get(&self, id: EntityId) -> ApiResult<Option<ProjectResponse>> {
        let key = QueryKey::record(EntityKind::Project, id);
        read_through(&self.cache, key, || self.db.project_get(id)).await
    }

    pub async fn project_list(
        &self,
        filter: &ListProjectsRequest,
    ) -> ApiResult<Vec<ProjectResponse>> {
        let key = QueryKey::entity(EntityKind::Project)
            .filter_opt("status", filter.status)
            .filter_opt("client_id", filter.client_id)
            .render();
        read_through_list(&self.cache, key, || self.db.project_list(filter)).await
    }

    pub async fn project_create(&self, req: &CreateProjectRequest) -> ApiResult<ProjectResponse> {
        let project = self.db.project_create(req).await?;
        self.invalidate(EntityKind::Project, project.project_id);
        Ok(project)
    }

    pub async fn project_update(
        &self,
        id: EntityId,
        req: &UpdateProjectRequest,
    ) -> ApiResult<Option<ProjectResponse>> {
        let updated = self.db.project_update(id, req).await?;
        if updated.is_some() {
            self.invalidate(EntityKind::Project, id);
        }
        Ok(updated)
    }

    pub async fn project_delete(&self, id: EntityId) -> ApiResult<bool> {
        let deleted = self.db.project_delete(id).await?;
        if deleted {
            self.invalidate(EntityKind::Project, id);
        }
        Ok(deleted)
    }

    // ========================================================================
    // FINANCIAL ACCOUNT OPERATIONS
    // ========================================================================

    pub async fn account_list(&self) -> ApiResult<Vec<AccountResponse>> {
        let key = QueryKey::entity(EntityKind::Account).render();
        read_through_list(&self.cache, key, || self.db.account_list()).await
    }

    pub async fn account_create(&self, req: &CreateAccountRequest) -> ApiResult<AccountResponse> {
        let account = self.db.account_create(req).await?;
        self.invalidate(EntityKind::Account, account.account_id);
        Ok(account)
    }

    // ========================================================================
    // TRANSACTION OPERATIONS
    // ========================================================================

    pub async fn transaction_get(&self, id: EntityId) -> ApiResult<Option<TransactionResponse>> {
        let key = QueryKey::record(EntityKind::Transaction, id);
        read_through(&self.cache, key, || self.db.transaction_get(id)).await
    }

    pub async fn transaction_list(
        &self,
        filter: &ListTransactionsRequest,
    ) -> ApiResult<Vec<TransactionResponse>> {
        let key = QueryKey::entity(EntityKind::Transaction)
            .filter_opt("direction", filter.direction)
            .filter_opt("project_id", filter.project_id)
            .filter_opt("account_id", filter.account_id)
            .render();
        read_through_list(&self.cache, key, || self.db.transaction_list(filter)).await
    }

    pub async fn transaction_create(
        &self,
        req: &CreateTransactionRequest,
    ) -> ApiResult<TransactionResponse> {
        let transaction = self.db.transaction_create(req).await?;
        self.invalidate(EntityKind::Transaction, transaction.transaction_id);
        Ok(transaction)
    }

    pub async fn transaction_update(
        &self,
        id: EntityId,
        req: &UpdateTransactionRequest,
    ) -> ApiResult<Option<TransactionResponse>> {
        let updated = self.db.transaction_update(id, req).await?;
        if updated.is_some() {
            self.invalidate(EntityKind::Transaction, id);
        }
        Ok(updated)
    }

    pub async fn transaction_delete(&self, id: EntityId) -> ApiResult<bool> {
        let deleted = self.db.transaction_delete(id).await?;
        if deleted {
            self.invalidate(EntityKind::Transaction, id);
        }
        Ok(deleted)
    }

    // ========================================================================
    // OPPORTUNITY OPERATIONS
    // ========================================================================

    pub async fn opportunity_get(&self, id: EntityId) -> ApiResult<Option<OpportunityResponse>> {
        let key = QueryKey::record(EntityKind::Opportunity, id);
        read_through(&self.cache, key, || self.db.opportunity_get(id)).await
    }

    pub async fn opportunity_list(
        &self,
        filter: &ListOpportunitiesRequest,
    ) -> ApiResult<Vec<OpportunityResponse>> {
        let key = QueryKey::entity(EntityKind::Opportunity)
            .filter_opt("stage", filter.stage)
            .filter_opt("client_id", filter.client_id)
            .render();
        read_through_list(&self.cache, key, || self.db.opportunity_list(filter)).await
    }

    pub async fn opportunity_create(
        &self,
        req: &CreateOpportunityRequest,
    ) -> ApiResult<OpportunityResponse> {
        let opportunity = self.db.opportunity_create(req).await?;
        self.invalidate(EntityKind::Opportunity, opportunity.opportunity_id);
        Ok(opportunity)
    }

    pub async fn opportunity_update(
        &self,
        id: EntityId,
        req: &UpdateOpportunityRequest,
    ) -> ApiResult<Option<OpportunityResponse>> {
        let updated = self.db.opportunity_update(id, req).await?;
        if updated.is_some() {
            self.invalidate(EntityKind::Opportunity, id);
        }
        Ok(updated)
    }

    pub async fn opportunity_delete(&self, id: EntityId) -> ApiResult<bool> {
        let deleted = self.db.opportunity_delete(id).await?;
        if deleted {
            self.invalidate(EntityKind::Opportunity, id);
        }
        Ok(deleted)
    }

    // ========================================================================
    // COMMUNICATION OPERATIONS
    // ========================================================================

    pub async fn communication_list(
        &self,
        filter: &ListCommunicationsRequest,
    ) -> ApiResult<Vec<CommunicationResponse>> {
        let key = QueryKey::entity(EntityKind::Communication)
            .filter_opt("client_id", filter.client_id)
            .filter_opt("channel", filter.channel)
            .render();
        read_through_list(&self.cache, key, || self.db.communication_list(filter)).await
    }

    pub async fn communication_create(
        &self,
        req: &CreateCommunicationRequest,
    ) -> ApiResult<CommunicationResponse> {
        let communication = self.db.communication_create(req).await?;
        self.invalidate(EntityKind::Communication, communication.communication_id);
        Ok(communication)
    }

    pub async fn communication_delete(&self, id: EntityId) -> ApiResult<bool> {
        let deleted = self.db.communication_delete(id).await?;
        if deleted {
            self.invalidate(EntityKind::Communication, id);
        }
        Ok(deleted)
    }

    // ========================================================================
    // PASSTHROUGH OPERATIONS (never cached)
    // ========================================================================

    /// Credential lookups always hit the store: a disabled account must be
    /// observed immediately, and the hash never belongs in the cache.
    pub async fn user_find_by_email(
        &self,
        email: &str,
    ) -> ApiResult<Option<opone_core::UserAccount>> {
        self.db.user_find_by_email(email).await
    }

    pub async fn user_get(&self, id: EntityId) -> ApiResult<Option<opone_core::UserAccount>> {
        self.db.user_get(id).await
    }

    /// Get the pool size (passthrough).
    pub fn pool_size(&self) -> usize {
        self.db.pool_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Payload {
        id: u32,
        name: String,
    }

    fn fresh_cache() -> QueryCache {
        TtlCache::new(Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_read_through_populates_then_serves_from_cache() {
        let cache = fresh_cache();
        let fetches = AtomicUsize::new(0);

        let fetch = || async {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Payload {
                id: 1,
                name: "alpha".to_string(),
            }))
        };

        let first = read_through(&cache, "projects_id=1".to_string(), fetch)
            .await
            .unwrap();
        assert_eq!(first.unwrap().name, "alpha");
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        // Second read is served from cache; the fetcher never runs.
        let second: Option<Payload> = read_through(&cache, "projects_id=1".to_string(), || async {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        })
        .await
        .unwrap();
        assert_eq!(second.unwrap().name, "alpha");
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidation_forces_refetch() {
        let cache = fresh_cache();

        let populated: Option<Payload> =
            read_through(&cache, "projects_id=7".to_string(), || async {
                Ok(Some(Payload {
                    id: 7,
                    name: "before".to_string(),
                }))
            })
            .await
            .unwrap();
        assert_eq!(populated.unwrap().name, "before");

        cache.clear_matching("projects");

        let refetched: Option<Payload> =
            read_through(&cache, "projects_id=7".to_string(), || async {
                Ok(Some(Payload {
                    id: 7,
                    name: "after".to_string(),
                }))
            })
            .await
            .unwrap();
        assert_eq!(refetched.unwrap().name, "after");
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_no_entry() {
        let cache = fresh_cache();

        let result: ApiResult<Option<Payload>> =
            read_through(&cache, "projects_id=9".to_string(), || async {
                Err(ApiError::database_error("connection refused"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(cache.stats().total, 0);

        // Retry-by-recall: the next call attempts the fetch again and can
        // succeed.
        let recovered: Option<Payload> =
            read_through(&cache, "projects_id=9".to_string(), || async {
                Ok(Some(Payload {
                    id: 9,
                    name: "recovered".to_string(),
                }))
            })
            .await
            .unwrap();
        assert_eq!(recovered.unwrap().name, "recovered");
        assert_eq!(cache.stats().total, 1);
    }

    #[tokio::test]
    async fn test_absent_record_is_not_cached() {
        let cache = fresh_cache();

        let missing: Option<Payload> =
            read_through(&cache, "clients_id=404".to_string(), || async { Ok(None) })
                .await
                .unwrap();
        assert!(missing.is_none());
        assert_eq!(cache.stats().total, 0);
    }

    #[tokio::test]
    async fn test_unreadable_payload_is_dropped_and_refetched() {
        let cache = fresh_cache();
        // Simulate a payload written by an older shape of the type.
        cache.set(
            "projects_id=3".to_string(),
            serde_json::json!({"unexpected": true}),
        );

        let refetched: Option<Payload> =
            read_through(&cache, "projects_id=3".to_string(), || async {
                Ok(Some(Payload {
                    id: 3,
                    name: "repaired".to_string(),
                }))
            })
            .await
            .unwrap();
        assert_eq!(refetched.unwrap().name, "repaired");
    }

    #[tokio::test]
    async fn test_read_through_list_caches_empty_results() {
        let cache = fresh_cache();
        let fetches = AtomicUsize::new(0);

        let first: Vec<Payload> =
            read_through_list(&cache, "projects_status=Draft".to_string(), || async {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            })
            .await
            .unwrap();
        assert!(first.is_empty());

        let second: Vec<Payload> =
            read_through_list(&cache, "projects_status=Draft".to_string(), || async {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            })
            .await
            .unwrap();
        assert!(second.is_empty());
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_metrics_key_space_matches_dashboard_key() {
        // The metrics service stores under "metrics_dashboard"; broad
        // invalidation by METRICS_KEY_SPACE must match it.
        assert!("metrics_dashboard".contains(METRICS_KEY_SPACE));
    }
}

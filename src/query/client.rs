//! Cached, failure-normalizing wrappers around the remote read operations
//!
//! Every wrapper follows the same contract:
//!
//! - **Gating**: returns [`QueryState::NotLoaded`] without a remote call while
//!   the actor slot is empty or resolving, or when a required parameter is empty.
//! - **Execution**: calls the actor under the retry policy. A failure that
//!   survives the retry is logged and reported as the empty value of the
//!   result type (`Vec::new()` or `None`), never as an error.
//! - **Caching**: successful results are reused for `stale_time`; failures are
//!   not cached.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use craftlink_interface::{
    ActorError, ActorMethod, CatalogActor, CatalogEntry, Game, Item, ItemCategory, UpdateStatus,
};
use craftlink_resilience::{retry, ResilienceError, RetryPolicy};

use super::cache::QueryCache;
use super::key::QueryKey;
use crate::actor::ActorSlot;
use crate::config::QueryConfig;
use crate::error::Result;

/// What a wrapper reports to its caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState<T> {
    /// The query is gated off; nothing was fetched
    NotLoaded,
    /// Data, possibly the empty value after a failure
    Ready(T),
}

impl<T> QueryState<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, QueryState::Ready(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Ready(value) => Some(value),
            QueryState::NotLoaded => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            QueryState::Ready(value) => Some(value),
            QueryState::NotLoaded => None,
        }
    }
}

impl<T: Default> QueryState<T> {
    /// The data, or the empty value while not loaded
    pub fn unwrap_or_empty(self) -> T {
        self.into_data().unwrap_or_default()
    }
}

fn classify(error: ActorError) -> ResilienceError {
    if error.is_transient() {
        ResilienceError::Transient(error.to_string())
    } else {
        ResilienceError::Permanent(error.to_string())
    }
}

/// Query access layer over the current backend handle
pub struct QueryClient {
    slot: ActorSlot,
    cache: QueryCache,
    retry: RetryPolicy,
    stale_time: Duration,
}

impl QueryClient {
    /// Client with the default query settings
    pub fn new(slot: ActorSlot) -> Self {
        let config = QueryConfig::default();
        let timeout = config.request_timeout_ms.map(Duration::from_millis);
        Self {
            slot,
            cache: QueryCache::new(),
            retry: RetryPolicy::default().with_attempt_timeout(timeout),
            stale_time: config.stale_time(),
        }
    }

    pub fn from_config(slot: ActorSlot, config: &QueryConfig) -> Result<Self> {
        Ok(Self {
            slot,
            cache: QueryCache::new(),
            retry: config.retry_policy()?,
            stale_time: config.stale_time(),
        })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn slot(&self) -> &ActorSlot {
        &self.slot
    }

    pub async fn catalog_entries(&self) -> QueryState<Vec<CatalogEntry>> {
        let Some(actor) = self.gate(ActorMethod::ListCatalogEntries, &[]) else {
            return QueryState::NotLoaded;
        };
        self.fetch(QueryKey::catalog_entries(), || actor.list_catalog_entries())
            .await
    }

    pub async fn catalog_entry(&self, id: &str) -> QueryState<Option<CatalogEntry>> {
        let Some(actor) = self.gate(ActorMethod::GetCatalogEntry, &[id]) else {
            return QueryState::NotLoaded;
        };
        self.fetch(QueryKey::catalog_entry(id), || actor.get_catalog_entry(id))
            .await
    }

    pub async fn games(&self) -> QueryState<Vec<Game>> {
        let Some(actor) = self.gate(ActorMethod::ListGames, &[]) else {
            return QueryState::NotLoaded;
        };
        self.fetch(QueryKey::games(), || actor.list_games()).await
    }

    pub async fn game(&self, id: &str) -> QueryState<Option<Game>> {
        let Some(actor) = self.gate(ActorMethod::GetGame, &[id]) else {
            return QueryState::NotLoaded;
        };
        self.fetch(QueryKey::game(id), || actor.get_game(id)).await
    }

    pub async fn items(&self, game_id: &str) -> QueryState<Vec<Item>> {
        let Some(actor) = self.gate(ActorMethod::ListItems, &[game_id]) else {
            return QueryState::NotLoaded;
        };
        self.fetch(QueryKey::items(game_id), || actor.list_items(game_id))
            .await
    }

    /// Items of a game, filtered when `category` is given
    ///
    /// Without a category this is the unfiltered [`items`](Self::items) query
    /// and shares its cache entry.
    pub async fn items_by_category(
        &self,
        game_id: &str,
        category: Option<ItemCategory>,
    ) -> QueryState<Vec<Item>> {
        let Some(category) = category else {
            return self.items(game_id).await;
        };
        let Some(actor) = self.gate(ActorMethod::ListItemsByCategory, &[game_id]) else {
            return QueryState::NotLoaded;
        };
        self.fetch(QueryKey::items_by_category(game_id, Some(category)), || {
            actor.list_items_by_category(game_id, category)
        })
        .await
    }

    pub async fn item(&self, game_id: &str, item_id: &str) -> QueryState<Option<Item>> {
        let Some(actor) = self.gate(ActorMethod::GetItem, &[game_id, item_id]) else {
            return QueryState::NotLoaded;
        };
        self.fetch(QueryKey::item(game_id, item_id), || {
            actor.get_item(game_id, item_id)
        })
        .await
    }

    pub async fn update_status(&self, game_id: &str) -> QueryState<Option<UpdateStatus>> {
        let Some(actor) = self.gate(ActorMethod::GetUpdateStatus, &[game_id]) else {
            return QueryState::NotLoaded;
        };
        self.fetch(QueryKey::update_status(game_id), || {
            actor.get_update_status(game_id)
        })
        .await
    }

    /// Drop `key` and every key it prefixes
    pub fn invalidate(&self, key: &QueryKey) -> usize {
        let removed = self.cache.invalidate(key);
        debug!(key = %key, removed, "query cache invalidated");
        removed
    }

    pub fn invalidate_all(&self) {
        self.cache.clear();
        debug!("query cache cleared");
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn gate(&self, method: ActorMethod, params: &[&str]) -> Option<Arc<dyn CatalogActor>> {
        if params.iter().any(|param| param.is_empty()) {
            debug!(operation = %method, "required parameter empty, query disabled");
            return None;
        }
        let state = self.slot.current();
        if state.resolving {
            debug!(operation = %method, "actor handle resolving, query disabled");
            return None;
        }
        if state.actor.is_none() {
            debug!(operation = %method, "no actor handle, query disabled");
        }
        state.actor
    }

    async fn fetch<T, F, Fut>(&self, key: QueryKey, call: F) -> QueryState<T>
    where
        T: Default + Clone + Send + Sync + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = craftlink_interface::Result<T>>,
    {
        if let Some(cached) = self.cache.get_fresh::<T>(&key, self.stale_time) {
            debug!(key = %key, "serving cached result");
            return QueryState::Ready(cached);
        }

        let outcome = retry(&self.retry, || async { call().await.map_err(classify) }).await;

        match outcome {
            Ok(value) => {
                self.cache.insert(key, value.clone());
                QueryState::Ready(value)
            }
            Err(e) => {
                warn!(
                    operation = key.operation(),
                    params = ?key.params(),
                    error = %e,
                    "query failed, returning empty result"
                );
                QueryState::Ready(T::default())
            }
        }
    }
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("slot", &self.slot)
            .field("cached", &self.cache.len())
            .field("retry", &self.retry)
            .field("stale_time", &self.stale_time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use craftlink_interface::MockActor;

    fn client_with(actor: &Arc<MockActor>) -> QueryClient {
        QueryClient::new(ActorSlot::with_actor(actor.clone()))
            .with_retry_policy(RetryPolicy::new(1, Duration::ZERO).unwrap())
    }

    #[test]
    fn test_classify() {
        assert!(classify(ActorError::Transport("x".into())).is_transient());
        assert!(classify(ActorError::Rejected("x".into())).is_permanent());
        assert!(classify(ActorError::Decode("x".into())).is_permanent());
    }

    #[test]
    fn test_new_uses_default_query_settings() {
        let config = QueryConfig::default();
        let configured = QueryClient::from_config(ActorSlot::new(), &config).unwrap();
        let client = QueryClient::new(ActorSlot::new());
        assert_eq!(client.retry, configured.retry);
        assert_eq!(client.stale_time, configured.stale_time);
        assert!(client.retry.attempt_timeout().is_some());
    }

    #[tokio::test]
    async fn test_empty_slot_not_loaded() {
        let client = QueryClient::new(ActorSlot::new());
        assert_eq!(client.games().await, QueryState::NotLoaded);
    }

    #[tokio::test]
    async fn test_resolving_slot_not_loaded() {
        let actor = Arc::new(MockActor::new());
        let client = client_with(&actor);
        client.slot().begin_resolve();

        assert_eq!(client.games().await, QueryState::NotLoaded);
        assert_eq!(actor.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_game_is_none() {
        let actor = Arc::new(MockActor::new());
        let client = client_with(&actor);
        assert_eq!(client.game("nope").await, QueryState::Ready(None));
    }

    #[test]
    fn test_query_state_helpers() {
        let ready = QueryState::Ready(vec![1, 2]);
        assert!(ready.is_loaded());
        assert_eq!(ready.data(), Some(&vec![1, 2]));
        let pending: QueryState<Vec<u8>> = QueryState::NotLoaded;
        assert!(pending.unwrap_or_empty().is_empty());
    }
}

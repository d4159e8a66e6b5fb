//! In-memory catalog actor for testing
//!
//! Serves records from memory and lets tests inject failures per method.
//! Every call is counted, including failed ones, so tests can assert how many
//! remote calls a component issued.

use crate::{
    ActorError, ActorMethod, CatalogActor, CatalogEntry, Game, Item, ItemCategory, Result,
    UpdateStatus,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// How an injected failure behaves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureMode {
    /// Every call fails with the given error
    Always(ActorError),
    /// The next call fails, later calls succeed
    Once(ActorError),
    /// Calls never resolve
    Hang,
}

#[derive(Debug, Default)]
struct MockState {
    catalog: Vec<CatalogEntry>,
    games: Vec<Game>,
    items: HashMap<String, Vec<Item>>,
    statuses: HashMap<String, UpdateStatus>,
    failures: HashMap<ActorMethod, FailureMode>,
    calls: HashMap<ActorMethod, usize>,
}

/// Mock backend implementation for testing
///
/// # Example
///
/// ```rust
/// use craftlink_interface::{ActorError, ActorMethod, CatalogActor, MockActor};
///
/// # async fn example() {
/// let actor = MockActor::new();
/// actor.fail(ActorMethod::ListGames, ActorError::Transport("offline".into()));
///
/// assert!(actor.list_games().await.is_err());
/// assert_eq!(actor.calls(ActorMethod::ListGames), 1);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockActor {
    state: Mutex<MockState>,
}

impl MockActor {
    /// Create an empty mock backend
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_catalog_entry(&self, entry: CatalogEntry) {
        self.lock().catalog.push(entry);
    }

    pub fn add_game(&self, game: Game) {
        self.lock().games.push(game);
    }

    /// Add an item to a game's item list
    pub fn add_item(&self, game_id: impl Into<String>, item: Item) {
        self.lock()
            .items
            .entry(game_id.into())
            .or_default()
            .push(item);
    }

    pub fn set_update_status(&self, game_id: impl Into<String>, status: UpdateStatus) {
        self.lock().statuses.insert(game_id.into(), status);
    }

    /// Make every call to `method` fail
    pub fn fail(&self, method: ActorMethod, error: ActorError) {
        self.inject(method, FailureMode::Always(error));
    }

    /// Make only the next call to `method` fail
    pub fn fail_once(&self, method: ActorMethod, error: ActorError) {
        self.inject(method, FailureMode::Once(error));
    }

    /// Make calls to `method` never resolve
    pub fn hang(&self, method: ActorMethod) {
        self.inject(method, FailureMode::Hang);
    }

    pub fn inject(&self, method: ActorMethod, mode: FailureMode) {
        self.lock().failures.insert(method, mode);
    }

    /// Remove all injected failures
    pub fn heal(&self) {
        self.lock().failures.clear();
    }

    /// Number of calls made to `method`
    pub fn calls(&self, method: ActorMethod) -> usize {
        self.lock().calls.get(&method).copied().unwrap_or(0)
    }

    /// Number of calls made across all methods
    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    /// Count the call and resolve any injected failure for it
    async fn enter(&self, method: ActorMethod) -> Result<()> {
        let outcome = {
            let mut state = self.lock();
            *state.calls.entry(method).or_insert(0) += 1;
            match state.failures.get(&method).cloned() {
                Some(FailureMode::Once(error)) => {
                    state.failures.remove(&method);
                    Some(FailureMode::Once(error))
                }
                other => other,
            }
        };

        match outcome {
            None => Ok(()),
            Some(FailureMode::Always(error)) | Some(FailureMode::Once(error)) => Err(error),
            Some(FailureMode::Hang) => futures::future::pending().await,
        }
    }
}

#[async_trait]
impl CatalogActor for MockActor {
    async fn list_catalog_entries(&self) -> Result<Vec<CatalogEntry>> {
        self.enter(ActorMethod::ListCatalogEntries).await?;
        Ok(self.lock().catalog.clone())
    }

    async fn get_catalog_entry(&self, id: &str) -> Result<Option<CatalogEntry>> {
        self.enter(ActorMethod::GetCatalogEntry).await?;
        Ok(self.lock().catalog.iter().find(|e| e.id == id).cloned())
    }

    async fn list_games(&self) -> Result<Vec<Game>> {
        self.enter(ActorMethod::ListGames).await?;
        Ok(self.lock().games.clone())
    }

    async fn get_game(&self, id: &str) -> Result<Option<Game>> {
        self.enter(ActorMethod::GetGame).await?;
        Ok(self.lock().games.iter().find(|g| g.id == id).cloned())
    }

    async fn get_update_status(&self, game_id: &str) -> Result<Option<UpdateStatus>> {
        self.enter(ActorMethod::GetUpdateStatus).await?;
        Ok(self.lock().statuses.get(game_id).cloned())
    }

    async fn list_items(&self, game_id: &str) -> Result<Vec<Item>> {
        self.enter(ActorMethod::ListItems).await?;
        Ok(self.lock().items.get(game_id).cloned().unwrap_or_default())
    }

    async fn get_item(&self, game_id: &str, item_id: &str) -> Result<Option<Item>> {
        self.enter(ActorMethod::GetItem).await?;
        Ok(self
            .lock()
            .items
            .get(game_id)
            .and_then(|items| items.iter().find(|i| i.id == item_id).cloned()))
    }

    async fn list_items_by_category(
        &self,
        game_id: &str,
        category: ItemCategory,
    ) -> Result<Vec<Item>> {
        self.enter(ActorMethod::ListItemsByCategory).await?;
        Ok(self
            .lock()
            .items
            .get(game_id)
            .map(|items| {
                items
                    .iter()
                    .filter(|i| i.category == category)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

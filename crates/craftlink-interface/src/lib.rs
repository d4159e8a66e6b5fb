//! Craftlink Interface: the remote catalog actor
//!
//! This crate defines the `CatalogActor` trait, the read surface of the crafting
//! backend. Everything the client layer knows about the backend goes through it:
//! the preflight runner probes it, the query layer fetches through it, and tests
//! substitute the in-memory `MockActor` (feature `test-support`).
//!
//! # Example
//!
//! ```rust,no_run
//! use craftlink_interface::{CatalogActor, ItemCategory};
//!
//! async fn count_food<A: CatalogActor + ?Sized>(actor: &A, game_id: &str) -> usize {
//!     actor
//!         .list_items_by_category(game_id, ItemCategory::Food)
//!         .await
//!         .map(|items| items.len())
//!         .unwrap_or(0)
//! }
//! ```
//!
//! # Error model
//!
//! Failure is the only error channel. There is no "not found" error: lookups
//! return `Ok(None)` when the record does not exist.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod types;

#[cfg(feature = "test-support")]
pub mod mock;

pub use types::{
    CatalogEntry, Game, Item, ItemCategory, RemoteDataSource, Supply, UpdateState, UpdateStatus,
    Upgrade, Values,
};

#[cfg(feature = "test-support")]
pub use mock::{FailureMode, MockActor};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActorError {
    /// The call never reached the backend or the reply was lost
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend received the call and refused it
    #[error("call rejected by backend: {0}")]
    Rejected(String),

    /// The reply could not be decoded into the expected record
    #[error("failed to decode reply: {0}")]
    Decode(String),
}

impl ActorError {
    /// Check if this error is transient (worth one more attempt)
    pub fn is_transient(&self) -> bool {
        matches!(self, ActorError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, ActorError>;

/// Identifier of one remote read operation
///
/// The string form is the backend's method name and is what diagnostics
/// report for each probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActorMethod {
    ListCatalogEntries,
    GetCatalogEntry,
    ListGames,
    GetGame,
    ListItems,
    GetItem,
    ListItemsByCategory,
    GetUpdateStatus,
}

impl ActorMethod {
    /// Every read operation, in preflight issue order
    pub const ALL: [ActorMethod; 8] = [
        ActorMethod::ListCatalogEntries,
        ActorMethod::GetCatalogEntry,
        ActorMethod::ListGames,
        ActorMethod::GetGame,
        ActorMethod::ListItems,
        ActorMethod::GetItem,
        ActorMethod::ListItemsByCategory,
        ActorMethod::GetUpdateStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActorMethod::ListCatalogEntries => "listCatalogEntries",
            ActorMethod::GetCatalogEntry => "getCatalogEntry",
            ActorMethod::ListGames => "listGames",
            ActorMethod::GetGame => "getGame",
            ActorMethod::ListItems => "listItems",
            ActorMethod::GetItem => "getItem",
            ActorMethod::ListItemsByCategory => "listItemsByCategory",
            ActorMethod::GetUpdateStatus => "getUpdateStatus",
        }
    }
}

impl fmt::Display for ActorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read surface of the crafting backend
///
/// Implementations wrap whatever transport reaches the backend. They must be
/// `Send + Sync` so a single handle can be shared between the preflight task
/// and query callers.
#[async_trait]
pub trait CatalogActor: Send + Sync {
    // ═══════════════════════════════════════════════════════════════════════
    // 1. Catalog
    // ═══════════════════════════════════════════════════════════════════════

    /// List every game in the public catalog
    async fn list_catalog_entries(&self) -> Result<Vec<CatalogEntry>>;

    /// Look up one catalog game
    async fn get_catalog_entry(&self, id: &str) -> Result<Option<CatalogEntry>>;

    // ═══════════════════════════════════════════════════════════════════════
    // 2. Crafting games
    // ═══════════════════════════════════════════════════════════════════════

    /// List games that have crafting data
    async fn list_games(&self) -> Result<Vec<Game>>;

    async fn get_game(&self, id: &str) -> Result<Option<Game>>;

    /// Refresh state of the backend's data for a game
    async fn get_update_status(&self, game_id: &str) -> Result<Option<UpdateStatus>>;

    // ═══════════════════════════════════════════════════════════════════════
    // 3. Items
    // ═══════════════════════════════════════════════════════════════════════

    async fn list_items(&self, game_id: &str) -> Result<Vec<Item>>;

    /// Look up one item
    ///
    /// Items are scoped to their game: the same item id in two games names
    /// two different records.
    async fn get_item(&self, game_id: &str, item_id: &str) -> Result<Option<Item>>;

    async fn list_items_by_category(
        &self,
        game_id: &str,
        category: ItemCategory,
    ) -> Result<Vec<Item>>;
}

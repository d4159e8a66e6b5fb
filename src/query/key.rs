//! Cache keys for query results

use craftlink_interface::{ActorMethod, ItemCategory};
use std::fmt;

/// Composite identifier `(operation, params...)` of a cached result
///
/// The category-filtered item key extends the unfiltered one, so invalidating
/// `items(game)` also drops every filtered entry of that game.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    operation: &'static str,
    params: Vec<String>,
}

impl QueryKey {
    fn new(operation: &'static str, params: Vec<String>) -> Self {
        Self { operation, params }
    }

    pub fn catalog_entries() -> Self {
        Self::new(ActorMethod::ListCatalogEntries.as_str(), Vec::new())
    }

    pub fn catalog_entry(id: &str) -> Self {
        Self::new(ActorMethod::GetCatalogEntry.as_str(), vec![id.to_string()])
    }

    pub fn games() -> Self {
        Self::new(ActorMethod::ListGames.as_str(), Vec::new())
    }

    pub fn game(id: &str) -> Self {
        Self::new(ActorMethod::GetGame.as_str(), vec![id.to_string()])
    }

    pub fn items(game_id: &str) -> Self {
        Self::new(ActorMethod::ListItems.as_str(), vec![game_id.to_string()])
    }

    /// Unfiltered `items(game)` when `category` is `None`
    pub fn items_by_category(game_id: &str, category: Option<ItemCategory>) -> Self {
        let mut key = Self::items(game_id);
        if let Some(category) = category {
            key.params.push(category.as_str().to_string());
        }
        key
    }

    pub fn item(game_id: &str, item_id: &str) -> Self {
        Self::new(
            ActorMethod::GetItem.as_str(),
            vec![game_id.to_string(), item_id.to_string()],
        )
    }

    pub fn update_status(game_id: &str) -> Self {
        Self::new(
            ActorMethod::GetUpdateStatus.as_str(),
            vec![game_id.to_string()],
        )
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Same operation and `prefix`'s params lead this key's params
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.operation == prefix.operation && self.params.starts_with(&prefix.params)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operation)?;
        for param in &self.params {
            write!(f, "/{}", param)?;
        }
        Ok(())
    }
}

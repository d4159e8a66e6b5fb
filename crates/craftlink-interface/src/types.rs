//! Records returned by the catalog actor
//!
//! Field names follow the backend's camelCase wire names so that the same
//! records can be re-encoded for diagnostics without a mapping layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A library game as listed in the public catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// External source the backend scrapes crafting data from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDataSource {
    pub id: String,
    pub url: String,
    pub description: String,
}

/// A game with crafting data attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub remote_data_sources: Vec<RemoteDataSource>,
}

/// Item category, used both for items and for the supplies they consume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemCategory {
    Tools,
    Armor,
    Food,
    BuildingMaterials,
    Weapons,
    Decorations,
}

impl ItemCategory {
    /// All categories in display order
    pub const ALL: [ItemCategory; 6] = [
        ItemCategory::Tools,
        ItemCategory::Armor,
        ItemCategory::Food,
        ItemCategory::BuildingMaterials,
        ItemCategory::Weapons,
        ItemCategory::Decorations,
    ];

    /// Wire identifier of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCategory::Tools => "tools",
            ItemCategory::Armor => "armor",
            ItemCategory::Food => "food",
            ItemCategory::BuildingMaterials => "buildingMaterials",
            ItemCategory::Weapons => "weapons",
            ItemCategory::Decorations => "decorations",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A quantity of some input required to craft or upgrade an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supply {
    pub id: String,
    pub name: String,
    pub quantity: u64,
    pub category: ItemCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upgrade {
    pub id: String,
    pub name: String,
    pub level: u64,
    pub cost: u64,
    #[serde(default)]
    pub required_supplies: Vec<Supply>,
}

/// Optional gameplay values of an item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Values {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durability: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sell_value: Option<u64>,
}

/// A craftable item of a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    pub category: ItemCategory,
    #[serde(default)]
    pub required_supplies: Vec<Supply>,
    #[serde(default)]
    pub values: Values,
    #[serde(default)]
    pub upgrades: Vec<Upgrade>,
}

impl Item {
    /// Create an item with no supplies, values or upgrades
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: ItemCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            required_supplies: Vec::new(),
            values: Values::default(),
            upgrades: Vec::new(),
        }
    }
}

/// State of the backend's data refresh job for one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum UpdateState {
    Idle,
    Success,
    InProgress,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatus {
    pub status: UpdateState,
    /// Backend time of the last refresh, nanoseconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
}

//! Item (inventory) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopd_core::ItemId;

/// A sellable item with countable stock.
///
/// The fulfillment engine is the only writer that keeps the
/// stock/availability invariant: when it drives `stock` to zero it clears
/// `is_available`. Direct catalog updates overwrite both fields verbatim and
/// may leave them out of sync; that gap is inherited deliberately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Unique item ID.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Internal item code (SKU).
    pub code: String,
    /// Units currently in stock. Never negative.
    pub stock: i32,
    /// Unit price.
    pub price: f64,
    /// Whether the item can currently be ordered.
    pub is_available: bool,
    /// When stock was last replenished, if known.
    pub last_restock: Option<DateTime<Utc>>,
}

/// An item about to be inserted; the store assigns the ID.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub code: String,
    pub stock: i32,
    pub price: f64,
    pub is_available: bool,
    pub last_restock: Option<DateTime<Utc>>,
}

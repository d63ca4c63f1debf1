//! Order domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopd_core::{CustomerId, ItemId, OrderId};

/// A placed order.
///
/// `customer_id` and `item_id` are non-owning references: they are resolved
/// at operation time, and nothing prevents the referents from being deleted
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Order code supplied by the caller.
    pub code: String,
    /// When the order was placed.
    pub order_date: DateTime<Utc>,
    /// Derived price: item unit price times quantity at fulfillment time.
    pub total_price: f64,
    /// Ordered quantity. At least 1.
    pub quantity: i32,
    /// The ordering customer.
    pub customer_id: CustomerId,
    /// The ordered item.
    pub item_id: ItemId,
}

/// An order about to be inserted; the store assigns the ID.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub code: String,
    pub order_date: DateTime<Utc>,
    pub total_price: f64,
    pub quantity: i32,
    pub customer_id: CustomerId,
    pub item_id: ItemId,
}

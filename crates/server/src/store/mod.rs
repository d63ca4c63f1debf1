//! The persistence boundary.
//!
//! Everything durable goes through [`ShopStore`]: plain per-record CRUD for
//! the catalog, plus [`ShopStore::commit_order`], the one compound write the
//! fulfillment engine needs. `commit_order` persists an item mutation and an
//! order record as a single atomic unit, guarded by an optimistic check on
//! the stock value the engine observed; a concurrent mutation of the same
//! item surfaces as [`StoreError::Conflict`] and the engine re-runs its
//! read-check-mutate sequence.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use shopd_core::{CustomerId, ItemId, OrderId};

use crate::models::{Customer, Item, NewCustomer, NewItem, NewOrder, Order};

pub use memory::MemoryStore;
pub use postgres::{PgStore, create_pool};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An optimistic write guard failed: the record changed under us.
    /// Safe to retry with a fresh read.
    #[error("write conflict: record was modified concurrently")]
    Conflict,

    /// The store timed out. Transient; safe to retry.
    #[error("storage operation timed out")]
    Timeout,

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Shared handle to a store implementation.
pub type DynStore = Arc<dyn ShopStore>;

/// The order write carried by [`ShopStore::commit_order`].
#[derive(Debug, Clone)]
pub enum OrderWrite {
    /// Insert a new order; the store assigns the ID.
    Create(NewOrder),
    /// Overwrite an existing order in place.
    Update(Order),
}

/// Transactional key-value persistence for customers, items, and orders.
///
/// `update_*` and `delete_*` report whether a record was touched; callers
/// translate `false` into their own not-found errors.
#[async_trait]
pub trait ShopStore: Send + Sync {
    // Customers

    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError>;
    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError>;
    async fn insert_customer(&self, new: NewCustomer) -> Result<Customer, StoreError>;
    async fn update_customer(&self, customer: &Customer) -> Result<bool, StoreError>;
    async fn delete_customer(&self, id: CustomerId) -> Result<bool, StoreError>;

    // Items

    async fn list_items(&self) -> Result<Vec<Item>, StoreError>;
    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError>;
    async fn insert_item(&self, new: NewItem) -> Result<Item, StoreError>;
    async fn update_item(&self, item: &Item) -> Result<bool, StoreError>;
    async fn delete_item(&self, id: ItemId) -> Result<bool, StoreError>;

    // Orders

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;
    async fn delete_order(&self, id: OrderId) -> Result<bool, StoreError>;

    /// Atomically persist an item mutation together with an order write.
    ///
    /// The item row is only written if its current stock still equals
    /// `expected_stock` (the value the caller read before computing the
    /// mutation); otherwise nothing is written and the call fails with
    /// [`StoreError::Conflict`]. Both writes land or neither does.
    async fn commit_order(
        &self,
        item: &Item,
        expected_stock: i32,
        write: OrderWrite,
    ) -> Result<Order, StoreError>;
}

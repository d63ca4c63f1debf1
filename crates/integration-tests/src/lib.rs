//! Shared harness for the integration tests.
//!
//! Tests run fully in-process: the HTTP tests drive the real router over the
//! in-memory store with `tower::ServiceExt::oneshot`, and the concurrency
//! tests use [`GatedStore`] to line up two fulfillment attempts on the same
//! item deterministically.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Barrier;

use shopd_core::{CustomerId, ItemId, OrderId, Phone};
use shopd_server::models::{Customer, Item, NewCustomer, NewItem, Order};
use shopd_server::services::{
    CatalogService, FulfillmentService, FsMediaStorage, MediaError, MediaStorage,
};
use shopd_server::state::AppState;
use shopd_server::store::{DynStore, MemoryStore, OrderWrite, ShopStore, StoreError};
use shopd_server::routes;

/// Build an application router over a fresh in-memory store, returning the
/// store handle so tests can inspect state behind the API's back.
#[must_use]
pub fn test_app(media_root: std::path::PathBuf) -> (axum::Router, DynStore) {
    let store: DynStore = Arc::new(MemoryStore::new());
    let media = Arc::new(FsMediaStorage::new(media_root));
    let state = AppState::new(
        CatalogService::new(Arc::clone(&store), media),
        FulfillmentService::new(Arc::clone(&store)),
    );
    (routes::router(state), store)
}

/// Insert a customer with a valid phone number; the store assigns the ID.
///
/// # Panics
///
/// Panics when the insert fails (test setup).
pub async fn seed_customer(store: &DynStore, code: &str) -> Customer {
    store
        .insert_customer(NewCustomer {
            name: "Test Customer".to_owned(),
            address: "1 Test Lane".to_owned(),
            code: code.to_owned(),
            phone: Phone::parse("+1 555 010 9999").expect("valid phone"),
            is_active: true,
            last_order: None,
            pic: None,
        })
        .await
        .expect("seed customer")
}

/// Insert an available item; the store assigns the ID.
///
/// # Panics
///
/// Panics when the insert fails (test setup).
pub async fn seed_item(store: &DynStore, code: &str, stock: i32, price: f64) -> Item {
    store
        .insert_item(NewItem {
            name: "Test Item".to_owned(),
            code: code.to_owned(),
            stock,
            price,
            is_available: true,
            last_restock: None,
        })
        .await
        .expect("seed item")
}

/// Media stub that rejects every upload.
pub struct FailingMedia;

#[async_trait]
impl MediaStorage for FailingMedia {
    async fn put(&self, _filename: &str, _bytes: &[u8]) -> Result<String, MediaError> {
        Err(MediaError::Io(std::io::Error::other("media store offline")))
    }
}

/// Store wrapper that fails the first `failures` calls to `commit_order`
/// with [`StoreError::Timeout`], then delegates.
pub struct FlakyStore {
    inner: Arc<MemoryStore>,
    remaining: AtomicU32,
}

impl FlakyStore {
    /// Time out the next `failures` commits.
    #[must_use]
    pub fn new(inner: Arc<MemoryStore>, failures: u32) -> Self {
        Self {
            inner,
            remaining: AtomicU32::new(failures),
        }
    }
}

#[async_trait]
impl ShopStore for FlakyStore {
    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        self.inner.list_customers().await
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        self.inner.get_customer(id).await
    }

    async fn insert_customer(&self, new: NewCustomer) -> Result<Customer, StoreError> {
        self.inner.insert_customer(new).await
    }

    async fn update_customer(&self, customer: &Customer) -> Result<bool, StoreError> {
        self.inner.update_customer(customer).await
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<bool, StoreError> {
        self.inner.delete_customer(id).await
    }

    async fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        self.inner.list_items().await
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        self.inner.get_item(id).await
    }

    async fn insert_item(&self, new: NewItem) -> Result<Item, StoreError> {
        self.inner.insert_item(new).await
    }

    async fn update_item(&self, item: &Item) -> Result<bool, StoreError> {
        self.inner.update_item(item).await
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool, StoreError> {
        self.inner.delete_item(id).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        self.inner.list_orders().await
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        self.inner.get_order(id).await
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, StoreError> {
        self.inner.delete_order(id).await
    }

    async fn commit_order(
        &self,
        item: &Item,
        expected_stock: i32,
        write: OrderWrite,
    ) -> Result<Order, StoreError> {
        if self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StoreError::Timeout);
        }
        self.inner.commit_order(item, expected_stock, write).await
    }
}

/// Store wrapper that holds the first `participants` calls to `commit_order`
/// at a barrier, so concurrent fulfillment attempts are guaranteed to have
/// read the same stock value before either commits.
pub struct GatedStore {
    inner: Arc<MemoryStore>,
    barrier: Barrier,
    participants: u32,
    arrived: AtomicU32,
}

impl GatedStore {
    /// Gate `participants` commits on a shared barrier; later commits (such
    /// as retries) pass straight through.
    #[must_use]
    pub fn new(inner: Arc<MemoryStore>, participants: u32) -> Self {
        Self {
            inner,
            barrier: Barrier::new(participants as usize),
            participants,
            arrived: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl ShopStore for GatedStore {
    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        self.inner.list_customers().await
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        self.inner.get_customer(id).await
    }

    async fn insert_customer(&self, new: NewCustomer) -> Result<Customer, StoreError> {
        self.inner.insert_customer(new).await
    }

    async fn update_customer(&self, customer: &Customer) -> Result<bool, StoreError> {
        self.inner.update_customer(customer).await
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<bool, StoreError> {
        self.inner.delete_customer(id).await
    }

    async fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        self.inner.list_items().await
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        self.inner.get_item(id).await
    }

    async fn insert_item(&self, new: NewItem) -> Result<Item, StoreError> {
        self.inner.insert_item(new).await
    }

    async fn update_item(&self, item: &Item) -> Result<bool, StoreError> {
        self.inner.update_item(item).await
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool, StoreError> {
        self.inner.delete_item(id).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        self.inner.list_orders().await
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        self.inner.get_order(id).await
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, StoreError> {
        self.inner.delete_order(id).await
    }

    async fn commit_order(
        &self,
        item: &Item,
        expected_stock: i32,
        write: OrderWrite,
    ) -> Result<Order, StoreError> {
        if self.arrived.fetch_add(1, Ordering::SeqCst) < self.participants {
            self.barrier.wait().await;
        }
        self.inner.commit_order(item, expected_stock, write).await
    }
}

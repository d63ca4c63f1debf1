//! In-process store backed by `BTreeMap`s.
//!
//! Used by the test suites and as the dev fallback when no database URL is
//! configured. A single `RwLock` over the whole state gives `commit_order`
//! its atomicity for free; the optimistic stock guard is still enforced so
//! the engine's conflict handling is exercised the same way as against
//! Postgres.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use shopd_core::{CustomerId, ItemId, OrderId};

use super::{OrderWrite, ShopStore, StoreError};
use crate::models::{Customer, Item, NewCustomer, NewItem, Order};

#[derive(Debug, Default)]
struct Inner {
    customers: BTreeMap<i64, Customer>,
    items: BTreeMap<i64, Item>,
    orders: BTreeMap<i64, Order>,
    next_customer_id: i64,
    next_item_id: i64,
    next_order_id: i64,
}

/// In-memory [`ShopStore`] implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShopStore for MemoryStore {
    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.customers.values().cloned().collect())
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.customers.get(&id.as_i64()).cloned())
    }

    async fn insert_customer(&self, new: NewCustomer) -> Result<Customer, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_customer_id += 1;
        let customer = Customer {
            id: CustomerId::new(inner.next_customer_id),
            name: new.name,
            address: new.address,
            code: new.code,
            phone: new.phone,
            is_active: new.is_active,
            last_order: new.last_order,
            pic: new.pic,
        };
        inner
            .customers
            .insert(customer.id.as_i64(), customer.clone());
        Ok(customer)
    }

    async fn update_customer(&self, customer: &Customer) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let key = customer.id.as_i64();
        if !inner.customers.contains_key(&key) {
            return Ok(false);
        }
        inner.customers.insert(key, customer.clone());
        Ok(true)
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.customers.remove(&id.as_i64()).is_some())
    }

    async fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.items.values().cloned().collect())
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.items.get(&id.as_i64()).cloned())
    }

    async fn insert_item(&self, new: NewItem) -> Result<Item, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_item_id += 1;
        let item = Item {
            id: ItemId::new(inner.next_item_id),
            name: new.name,
            code: new.code,
            stock: new.stock,
            price: new.price,
            is_available: new.is_available,
            last_restock: new.last_restock,
        };
        inner.items.insert(item.id.as_i64(), item.clone());
        Ok(item)
    }

    async fn update_item(&self, item: &Item) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let key = item.id.as_i64();
        if !inner.items.contains_key(&key) {
            return Ok(false);
        }
        inner.items.insert(key, item.clone());
        Ok(true)
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.items.remove(&id.as_i64()).is_some())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.orders.values().cloned().collect())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.orders.get(&id.as_i64()).cloned())
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.orders.remove(&id.as_i64()).is_some())
    }

    async fn commit_order(
        &self,
        item: &Item,
        expected_stock: i32,
        write: OrderWrite,
    ) -> Result<Order, StoreError> {
        let mut inner = self.inner.write().await;

        // Optimistic guard: the stock we based our computation on must still
        // be the stored value.
        match inner.items.get(&item.id.as_i64()) {
            Some(stored) if stored.stock == expected_stock => {}
            _ => return Err(StoreError::Conflict),
        }

        // The order must still exist before anything is written, so a failed
        // commit leaves no partial state behind.
        if let OrderWrite::Update(order) = &write
            && !inner.orders.contains_key(&order.id.as_i64())
        {
            return Err(StoreError::Conflict);
        }

        inner.items.insert(item.id.as_i64(), item.clone());

        let order = match write {
            OrderWrite::Create(new) => {
                inner.next_order_id += 1;
                Order {
                    id: OrderId::new(inner.next_order_id),
                    code: new.code,
                    order_date: new.order_date,
                    total_price: new.total_price,
                    quantity: new.quantity,
                    customer_id: new.customer_id,
                    item_id: new.item_id,
                }
            }
            OrderWrite::Update(order) => order,
        };

        inner.orders.insert(order.id.as_i64(), order.clone());
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewOrder;
    use chrono::Utc;
    use shopd_core::Phone;

    fn sample_item() -> NewItem {
        NewItem {
            name: "Mechanical keyboard".to_owned(),
            code: "KB-01".to_owned(),
            stock: 5,
            price: 79.9,
            is_available: true,
            last_restock: None,
        }
    }

    fn sample_customer() -> NewCustomer {
        NewCustomer {
            name: "Ada".to_owned(),
            address: "1 Analytical Way".to_owned(),
            code: "CUST-1".to_owned(),
            phone: Phone::parse("08123456789").expect("valid phone"),
            is_active: true,
            last_order: None,
            pic: None,
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_sequentially() {
        let store = MemoryStore::new();
        let a = store.insert_item(sample_item()).await.expect("insert");
        let b = store.insert_item(sample_item()).await.expect("insert");
        assert_eq!(a.id.as_i64() + 1, b.id.as_i64());
    }

    #[tokio::test]
    async fn update_of_missing_customer_reports_false() {
        let store = MemoryStore::new();
        let inserted = store
            .insert_customer(sample_customer())
            .await
            .expect("insert");
        assert!(store.delete_customer(inserted.id).await.expect("delete"));
        assert!(!store.update_customer(&inserted).await.expect("update"));
    }

    #[tokio::test]
    async fn commit_order_rejects_stale_stock() {
        let store = MemoryStore::new();
        let item = store.insert_item(sample_item()).await.expect("insert");

        let mut mutated = item.clone();
        mutated.stock = 0;
        mutated.is_available = false;

        let write = OrderWrite::Create(NewOrder {
            code: "ORD-1".to_owned(),
            order_date: Utc::now(),
            total_price: 399.5,
            quantity: 5,
            customer_id: shopd_core::CustomerId::new(1),
            item_id: item.id,
        });

        // First commit with the observed stock succeeds.
        store
            .commit_order(&mutated, item.stock, write.clone())
            .await
            .expect("first commit");

        // A second commit based on the same observation must conflict.
        let err = store
            .commit_order(&mutated, item.stock, write)
            .await
            .expect_err("stale commit");
        assert!(matches!(err, StoreError::Conflict));

        // And the item keeps the first committed state.
        let stored = store.get_item(item.id).await.expect("get").expect("item");
        assert_eq!(stored.stock, 0);
        assert!(!stored.is_available);
    }
}

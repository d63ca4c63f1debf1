//! The fulfillment engine.
//!
//! Placing, updating, or deleting an order is the only path that may mutate
//! item stock, and every mutation here goes through
//! [`ShopStore::commit_order`] so the order write and the stock adjustment
//! land (or fail) together.
//!
//! The consistency model for updates is stock-aware: quantity changes adjust
//! the item's stock by the delta, and an order can never be re-pointed at a
//! different customer or item. Deleting an order does not restock the item.
//! Availability is cleared when fulfillment drives stock to zero and is never
//! re-enabled by this engine; a direct catalog item update is the only way to
//! turn an item back on.

use chrono::{DateTime, Utc};
use tracing::instrument;

use shopd_core::{CustomerId, ItemId, OrderId};

use crate::models::{Item, NewOrder, Order};
use crate::store::{DynStore, OrderWrite, StoreError};

/// How many times a read-check-commit sequence is re-run when the store
/// reports a conflict or a transient timeout.
const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Which referenced entity could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Customer,
    Item,
}

impl Reference {
    const fn noun(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Item => "item",
        }
    }
}

/// Errors raised by the fulfillment engine.
#[derive(Debug, thiserror::Error)]
pub enum FulfillmentError {
    /// A referenced customer or item does not exist.
    #[error("referenced {} not found", .0.noun())]
    ReferenceNotFound(Reference),

    /// The order to update or delete does not exist.
    #[error("order not found")]
    OrderNotFound,

    /// Updates may not re-point an order at a different customer or item.
    #[error("orders cannot be re-pointed to a different {}", .0.noun())]
    ReferenceImmutable(Reference),

    /// The item is flagged unavailable.
    #[error("item is not available")]
    ItemUnavailable,

    /// The requested quantity exceeds the current stock.
    #[error("not enough stock: requested {requested}, available {available}")]
    InsufficientStock {
        /// Units the request needed.
        requested: i32,
        /// Units the item could supply.
        available: i32,
    },

    /// The store failed after bounded retries.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Typed, pre-validated input for order creation and update.
#[derive(Debug, Clone)]
pub struct OrderInput {
    /// Caller-supplied order code.
    pub code: String,
    /// Order timestamp; defaults to now when omitted.
    pub order_date: Option<DateTime<Utc>>,
    /// Quantity to order. The boundary guarantees `>= 1`.
    pub quantity: i32,
    /// The ordering customer.
    pub customer_id: CustomerId,
    /// The ordered item.
    pub item_id: ItemId,
}

/// The business-rule core: validates references, checks availability and
/// stock, computes derived pricing, and persists order + item mutations
/// atomically.
#[derive(Clone)]
pub struct FulfillmentService {
    store: DynStore,
}

impl FulfillmentService {
    /// Create an engine over the given store.
    #[must_use]
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }

    /// List all orders.
    ///
    /// # Errors
    ///
    /// Returns a store error if the read fails.
    pub async fn list_orders(&self) -> Result<Vec<Order>, FulfillmentError> {
        Ok(self.store.list_orders().await?)
    }

    /// Look up a single order.
    ///
    /// # Errors
    ///
    /// Returns [`FulfillmentError::OrderNotFound`] if absent.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, FulfillmentError> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound)
    }

    /// Place a new order.
    ///
    /// Resolves both references, checks availability and stock, computes
    /// `total_price = price * quantity`, decrements stock (clearing
    /// availability at zero), and persists item + order atomically.
    ///
    /// # Errors
    ///
    /// `ReferenceNotFound` for a missing customer or item, `ItemUnavailable`,
    /// `InsufficientStock`, or a store failure after bounded retries.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id, item_id = %input.item_id, quantity = input.quantity))]
    pub async fn create_order(&self, input: &OrderInput) -> Result<Order, FulfillmentError> {
        let mut attempts = 0;
        loop {
            attempts += 1;

            let customer = self
                .store
                .get_customer(input.customer_id)
                .await?
                .ok_or(FulfillmentError::ReferenceNotFound(Reference::Customer))?;
            let item = self
                .store
                .get_item(input.item_id)
                .await?
                .ok_or(FulfillmentError::ReferenceNotFound(Reference::Item))?;

            if !item.is_available {
                return Err(FulfillmentError::ItemUnavailable);
            }
            if item.stock < input.quantity {
                return Err(FulfillmentError::InsufficientStock {
                    requested: input.quantity,
                    available: item.stock,
                });
            }

            let total_price = item.price * f64::from(input.quantity);
            let order_date = input.order_date.unwrap_or_else(Utc::now);

            let expected_stock = item.stock;
            let item = deduct_stock(item, input.quantity);

            let write = OrderWrite::Create(NewOrder {
                code: input.code.clone(),
                order_date,
                total_price,
                quantity: input.quantity,
                customer_id: customer.id,
                item_id: item.id,
            });

            match self.store.commit_order(&item, expected_stock, write).await {
                Ok(order) => {
                    tracing::info!(order_id = %order.id, stock = item.stock, "order created");
                    return Ok(order);
                }
                Err(err) => {
                    self.handle_commit_failure(err, attempts, input).await?;
                }
            }
        }
    }

    /// Update an existing order.
    ///
    /// The new quantity must fit within the item's current stock; when it
    /// does, the stock is adjusted by the quantity delta. Code and date are
    /// overwritten (date defaulting to now when omitted) and the total price
    /// is recomputed from the current item price. The customer/item
    /// references are immutable.
    ///
    /// # Errors
    ///
    /// `OrderNotFound`, `ReferenceImmutable` on an attempted re-point,
    /// `ItemUnavailable` (availability is re-checked even though the order
    /// already holds the reference), `InsufficientStock`, or a store failure.
    #[instrument(skip(self, input), fields(order_id = %order_id, quantity = input.quantity))]
    pub async fn update_order(
        &self,
        order_id: OrderId,
        input: &OrderInput,
    ) -> Result<Order, FulfillmentError> {
        let mut attempts = 0;
        loop {
            attempts += 1;

            let existing = self
                .store
                .get_order(order_id)
                .await?
                .ok_or(FulfillmentError::OrderNotFound)?;

            if input.customer_id != existing.customer_id {
                return Err(FulfillmentError::ReferenceImmutable(Reference::Customer));
            }
            if input.item_id != existing.item_id {
                return Err(FulfillmentError::ReferenceImmutable(Reference::Item));
            }

            let item = self
                .store
                .get_item(existing.item_id)
                .await?
                .ok_or(FulfillmentError::ReferenceNotFound(Reference::Item))?;

            if !item.is_available {
                return Err(FulfillmentError::ItemUnavailable);
            }

            // The full new quantity is gated on current stock, not just the
            // increase; raising an order can fail even when the delta alone
            // would fit.
            if item.stock < input.quantity {
                return Err(FulfillmentError::InsufficientStock {
                    requested: input.quantity,
                    available: item.stock,
                });
            }

            let delta = input.quantity - existing.quantity;
            let expected_stock = item.stock;
            let item = if delta == 0 {
                item
            } else {
                deduct_stock(item, delta)
            };

            let mut order = existing;
            order.code = input.code.clone();
            order.order_date = input.order_date.unwrap_or_else(Utc::now);
            order.quantity = input.quantity;
            order.total_price = item.price * f64::from(input.quantity);

            match self
                .store
                .commit_order(&item, expected_stock, OrderWrite::Update(order))
                .await
            {
                Ok(order) => {
                    tracing::info!(order_id = %order.id, stock = item.stock, "order updated");
                    return Ok(order);
                }
                Err(err) => {
                    self.handle_commit_failure(err, attempts, input).await?;
                }
            }
        }
    }

    /// Delete an order.
    ///
    /// Stock consumed by the order stays consumed: deletion does not restock
    /// the linked item.
    ///
    /// # Errors
    ///
    /// Returns [`FulfillmentError::OrderNotFound`] if absent.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: OrderId) -> Result<(), FulfillmentError> {
        if self.store.delete_order(order_id).await? {
            tracing::info!(%order_id, "order deleted");
            Ok(())
        } else {
            Err(FulfillmentError::OrderNotFound)
        }
    }

    /// Decide what to do with a failed commit: conflicts and timeouts are
    /// retried within [`MAX_COMMIT_ATTEMPTS`]; a conflict whose re-read shows
    /// fewer units left than the requested quantity fails fast with
    /// `InsufficientStock`, since a racing order got there first and retrying
    /// cannot change the outcome.
    async fn handle_commit_failure(
        &self,
        err: StoreError,
        attempts: u32,
        input: &OrderInput,
    ) -> Result<(), FulfillmentError> {
        match err {
            StoreError::Conflict | StoreError::Timeout if attempts < MAX_COMMIT_ATTEMPTS => {
                if matches!(err, StoreError::Conflict)
                    && let Some(current) = self.store.get_item(input.item_id).await?
                    && current.stock < input.quantity
                {
                    return Err(FulfillmentError::InsufficientStock {
                        requested: input.quantity,
                        available: current.stock,
                    });
                }
                tracing::debug!(attempts, "commit failed transiently, retrying");
                Ok(())
            }
            other => Err(other.into()),
        }
    }
}

/// Apply a stock deduction, clearing availability when stock hits zero.
/// Callers guarantee `amount <= item.stock`.
fn deduct_stock(mut item: Item, amount: i32) -> Item {
    item.stock -= amount;
    if item.stock == 0 {
        item.is_available = false;
    }
    item
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use shopd_core::Phone;

    use super::*;
    use crate::models::{NewCustomer, NewItem};
    use crate::store::{MemoryStore, ShopStore};

    async fn engine_with_catalog(stock: i32, price: f64) -> (FulfillmentService, DynStore) {
        let store: DynStore = Arc::new(MemoryStore::new());
        store
            .insert_customer(NewCustomer {
                name: "Grace".to_owned(),
                address: "2 Compiler Ct".to_owned(),
                code: "CUST-1".to_owned(),
                phone: Phone::parse("+1 555 010 7788").expect("valid phone"),
                is_active: true,
                last_order: None,
                pic: None,
            })
            .await
            .expect("insert customer");
        store
            .insert_item(NewItem {
                name: "Solder iron".to_owned(),
                code: "SI-9".to_owned(),
                stock,
                price,
                is_available: true,
                last_restock: None,
            })
            .await
            .expect("insert item");
        (FulfillmentService::new(Arc::clone(&store)), store)
    }

    fn input(quantity: i32) -> OrderInput {
        OrderInput {
            code: "ORD-100".to_owned(),
            order_date: None,
            quantity,
            customer_id: CustomerId::new(1),
            item_id: ItemId::new(1),
        }
    }

    #[tokio::test]
    async fn create_decrements_stock_and_prices_the_order() {
        let (engine, store) = engine_with_catalog(10, 2.5).await;

        let order = engine.create_order(&input(4)).await.expect("create");
        assert_eq!(order.quantity, 4);
        assert!((order.total_price - 10.0).abs() < f64::EPSILON);

        let item = store
            .get_item(ItemId::new(1))
            .await
            .expect("get")
            .expect("item");
        assert_eq!(item.stock, 6);
        assert!(item.is_available);
    }

    #[tokio::test]
    async fn create_consuming_all_stock_clears_availability() {
        let (engine, store) = engine_with_catalog(3, 1.0).await;

        engine.create_order(&input(3)).await.expect("create");

        let item = store
            .get_item(ItemId::new(1))
            .await
            .expect("get")
            .expect("item");
        assert_eq!(item.stock, 0);
        assert!(!item.is_available);
    }

    #[tokio::test]
    async fn create_defaults_order_date_to_now() {
        let (engine, _) = engine_with_catalog(3, 1.0).await;

        let before = Utc::now();
        let order = engine.create_order(&input(1)).await.expect("create");
        let after = Utc::now();
        assert!(order.order_date >= before && order.order_date <= after);
    }

    #[tokio::test]
    async fn create_honors_explicit_order_date() {
        let (engine, _) = engine_with_catalog(3, 1.0).await;

        let date = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).single().expect("date");
        let mut req = input(1);
        req.order_date = Some(date);
        let order = engine.create_order(&req).await.expect("create");
        assert_eq!(order.order_date, date);
    }

    #[tokio::test]
    async fn create_with_excess_quantity_fails_and_leaves_stock_untouched() {
        let (engine, store) = engine_with_catalog(2, 1.0).await;

        let err = engine.create_order(&input(3)).await.expect_err("too many");
        assert!(matches!(
            err,
            FulfillmentError::InsufficientStock {
                requested: 3,
                available: 2
            }
        ));

        let item = store
            .get_item(ItemId::new(1))
            .await
            .expect("get")
            .expect("item");
        assert_eq!(item.stock, 2);
        assert!(store.list_orders().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn create_against_missing_item_fails_without_side_effects() {
        let (engine, store) = engine_with_catalog(2, 1.0).await;

        let mut req = input(1);
        req.item_id = ItemId::new(999);
        let err = engine.create_order(&req).await.expect_err("missing item");
        assert!(matches!(
            err,
            FulfillmentError::ReferenceNotFound(Reference::Item)
        ));
        assert!(store.list_orders().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn create_against_missing_customer_fails() {
        let (engine, _) = engine_with_catalog(2, 1.0).await;

        let mut req = input(1);
        req.customer_id = CustomerId::new(999);
        let err = engine.create_order(&req).await.expect_err("missing customer");
        assert!(matches!(
            err,
            FulfillmentError::ReferenceNotFound(Reference::Customer)
        ));
    }

    #[tokio::test]
    async fn create_against_unavailable_item_fails() {
        let (engine, store) = engine_with_catalog(5, 1.0).await;

        let mut item = store
            .get_item(ItemId::new(1))
            .await
            .expect("get")
            .expect("item");
        item.is_available = false;
        assert!(store.update_item(&item).await.expect("update"));

        let err = engine.create_order(&input(1)).await.expect_err("unavailable");
        assert!(matches!(err, FulfillmentError::ItemUnavailable));
    }

    #[tokio::test]
    async fn update_raising_quantity_beyond_stock_changes_nothing() {
        let (engine, store) = engine_with_catalog(5, 1.0).await;

        let order = engine.create_order(&input(3)).await.expect("create");
        // stock is now 2, below the requested quantity of 5
        let err = engine
            .update_order(order.id, &input(5))
            .await
            .expect_err("insufficient");
        assert!(matches!(err, FulfillmentError::InsufficientStock { .. }));

        let item = store
            .get_item(ItemId::new(1))
            .await
            .expect("get")
            .expect("item");
        assert_eq!(item.stock, 2);
        let stored = store
            .get_order(order.id)
            .await
            .expect("get")
            .expect("order");
        assert_eq!(stored.quantity, 3);
    }

    #[tokio::test]
    async fn update_lowering_quantity_returns_stock_and_reprices() {
        let (engine, store) = engine_with_catalog(5, 2.0).await;

        let order = engine.create_order(&input(3)).await.expect("create");
        let updated = engine
            .update_order(order.id, &input(1))
            .await
            .expect("update");

        assert_eq!(updated.quantity, 1);
        assert!((updated.total_price - 2.0).abs() < f64::EPSILON);

        let item = store
            .get_item(ItemId::new(1))
            .await
            .expect("get")
            .expect("item");
        assert_eq!(item.stock, 4);
    }

    #[tokio::test]
    async fn update_to_exactly_current_stock_succeeds() {
        let (engine, store) = engine_with_catalog(5, 1.0).await;

        let order = engine.create_order(&input(3)).await.expect("create");
        // stock is now 2; a new quantity of exactly 2 passes the gate
        let updated = engine.update_order(order.id, &input(2)).await.expect("update");
        assert_eq!(updated.quantity, 2);

        let item = store
            .get_item(ItemId::new(1))
            .await
            .expect("get")
            .expect("item");
        assert_eq!(item.stock, 3);
        assert!(item.is_available);
    }

    #[tokio::test]
    async fn update_does_not_re_enable_availability() {
        let (engine, store) = engine_with_catalog(3, 1.0).await;

        let order = engine.create_order(&input(3)).await.expect("create");
        // Item is now stock 0 / unavailable; lowering the quantity would free
        // stock, but the availability gate fires first.
        let err = engine
            .update_order(order.id, &input(1))
            .await
            .expect_err("unavailable");
        assert!(matches!(err, FulfillmentError::ItemUnavailable));

        let item = store
            .get_item(ItemId::new(1))
            .await
            .expect("get")
            .expect("item");
        assert!(!item.is_available);
        assert_eq!(item.stock, 0);
    }

    #[tokio::test]
    async fn update_rejects_re_pointing() {
        let (engine, store) = engine_with_catalog(5, 1.0).await;
        store
            .insert_item(NewItem {
                name: "Spare".to_owned(),
                code: "SP-1".to_owned(),
                stock: 9,
                price: 1.0,
                is_available: true,
                last_restock: None,
            })
            .await
            .expect("insert");

        let order = engine.create_order(&input(2)).await.expect("create");

        let mut req = input(2);
        req.item_id = ItemId::new(2);
        let err = engine
            .update_order(order.id, &req)
            .await
            .expect_err("re-point");
        assert!(matches!(
            err,
            FulfillmentError::ReferenceImmutable(Reference::Item)
        ));
    }

    #[tokio::test]
    async fn update_of_missing_order_fails() {
        let (engine, _) = engine_with_catalog(5, 1.0).await;
        let err = engine
            .update_order(OrderId::new(404), &input(1))
            .await
            .expect_err("missing");
        assert!(matches!(err, FulfillmentError::OrderNotFound));
    }

    #[tokio::test]
    async fn delete_removes_order_but_not_stock() {
        let (engine, store) = engine_with_catalog(5, 1.0).await;

        let order = engine.create_order(&input(2)).await.expect("create");
        engine.delete_order(order.id).await.expect("delete");

        assert!(store.get_order(order.id).await.expect("get").is_none());
        let item = store
            .get_item(ItemId::new(1))
            .await
            .expect("get")
            .expect("item");
        // the stock consumed by the order stays consumed
        assert_eq!(item.stock, 3);
    }

    #[tokio::test]
    async fn delete_of_missing_order_fails() {
        let (engine, _) = engine_with_catalog(5, 1.0).await;
        let err = engine
            .delete_order(OrderId::new(404))
            .await
            .expect_err("missing");
        assert!(matches!(err, FulfillmentError::OrderNotFound));
    }
}

//! Postgres-backed store.
//!
//! Runtime sqlx queries with `FromRow` row structs mapped into the domain
//! types. `commit_order` runs inside a transaction; the optimistic stock
//! guard is expressed as `WHERE ... AND stock = $expected` on the item
//! update, so a concurrent fulfillment of the same item makes the guard miss
//! and the whole transaction rolls back as [`StoreError::Conflict`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use shopd_core::{CustomerId, ItemId, OrderId, Phone};

use super::{OrderWrite, ShopStore, StoreError};
use crate::models::{Customer, Item, NewCustomer, NewItem, Order};

/// Create a Postgres connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Classify sqlx failures; pool acquisition timeouts are transient.
fn map_sqlx(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout,
        other => StoreError::Database(other),
    }
}

// =============================================================================
// Row types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    customer_id: i64,
    customer_name: String,
    customer_address: String,
    customer_code: String,
    customer_phone: String,
    is_active: bool,
    last_order: Option<NaiveDate>,
    pic: Option<String>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = StoreError;

    fn try_from(row: CustomerRow) -> Result<Self, StoreError> {
        let phone = Phone::parse(&row.customer_phone).map_err(|e| {
            StoreError::DataCorruption(format!("invalid phone in database: {e}"))
        })?;
        Ok(Self {
            id: CustomerId::new(row.customer_id),
            name: row.customer_name,
            address: row.customer_address,
            code: row.customer_code,
            phone,
            is_active: row.is_active,
            last_order: row.last_order,
            pic: row.pic,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    item_id: i64,
    item_name: String,
    item_code: String,
    stock: i32,
    price: f64,
    is_available: bool,
    last_restock: Option<DateTime<Utc>>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            id: ItemId::new(row.item_id),
            name: row.item_name,
            code: row.item_code,
            stock: row.stock,
            price: row.price,
            is_available: row.is_available,
            last_restock: row.last_restock,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    order_id: i64,
    order_code: String,
    order_date: DateTime<Utc>,
    total_price: f64,
    quantity: i32,
    customer_id: i64,
    item_id: i64,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.order_id),
            code: row.order_code,
            order_date: row.order_date,
            total_price: row.total_price,
            quantity: row.quantity,
            customer_id: CustomerId::new(row.customer_id),
            item_id: ItemId::new(row.item_id),
        }
    }
}

// =============================================================================
// Store implementation
// =============================================================================

/// Postgres [`ShopStore`] implementation.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for migrations and seeding.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ShopStore for PgStore {
    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            "SELECT customer_id, customer_name, customer_address, customer_code, \
             customer_phone, is_active, last_order, pic \
             FROM customers ORDER BY customer_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter().map(Customer::try_from).collect()
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT customer_id, customer_name, customer_address, customer_code, \
             customer_phone, is_active, last_order, pic \
             FROM customers WHERE customer_id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.map(Customer::try_from).transpose()
    }

    async fn insert_customer(&self, new: NewCustomer) -> Result<Customer, StoreError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "INSERT INTO customers \
             (customer_name, customer_address, customer_code, customer_phone, \
              is_active, last_order, pic) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING customer_id, customer_name, customer_address, customer_code, \
                       customer_phone, is_active, last_order, pic",
        )
        .bind(&new.name)
        .bind(&new.address)
        .bind(&new.code)
        .bind(new.phone.as_str())
        .bind(new.is_active)
        .bind(new.last_order)
        .bind(&new.pic)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Customer::try_from(row)
    }

    async fn update_customer(&self, customer: &Customer) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE customers SET customer_name = $1, customer_address = $2, \
             customer_code = $3, customer_phone = $4, is_active = $5, \
             last_order = $6, pic = $7 \
             WHERE customer_id = $8",
        )
        .bind(&customer.name)
        .bind(&customer.address)
        .bind(&customer.code)
        .bind(customer.phone.as_str())
        .bind(customer.is_active)
        .bind(customer.last_order)
        .bind(&customer.pic)
        .bind(customer.id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM customers WHERE customer_id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT item_id, item_name, item_code, stock, price, is_available, \
             last_restock FROM items ORDER BY item_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query_as::<_, ItemRow>(
            "SELECT item_id, item_name, item_code, stock, price, is_available, \
             last_restock FROM items WHERE item_id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(Item::from))
    }

    async fn insert_item(&self, new: NewItem) -> Result<Item, StoreError> {
        let row = sqlx::query_as::<_, ItemRow>(
            "INSERT INTO items (item_name, item_code, stock, price, is_available, last_restock) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING item_id, item_name, item_code, stock, price, is_available, last_restock",
        )
        .bind(&new.name)
        .bind(&new.code)
        .bind(new.stock)
        .bind(new.price)
        .bind(new.is_available)
        .bind(new.last_restock)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(Item::from(row))
    }

    async fn update_item(&self, item: &Item) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE items SET item_name = $1, item_code = $2, stock = $3, price = $4, \
             is_available = $5, last_restock = $6 \
             WHERE item_id = $7",
        )
        .bind(&item.name)
        .bind(&item.code)
        .bind(item.stock)
        .bind(item.price)
        .bind(item.is_available)
        .bind(item.last_restock)
        .bind(item.id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM items WHERE item_id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT order_id, order_code, order_date, total_price, quantity, \
             customer_id, item_id FROM orders ORDER BY order_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT order_id, order_code, order_date, total_price, quantity, \
             customer_id, item_id FROM orders WHERE order_id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(Order::from))
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE order_id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit_order(
        &self,
        item: &Item,
        expected_stock: i32,
        write: OrderWrite,
    ) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let guarded = sqlx::query(
            "UPDATE items SET item_name = $1, item_code = $2, stock = $3, price = $4, \
             is_available = $5, last_restock = $6 \
             WHERE item_id = $7 AND stock = $8",
        )
        .bind(&item.name)
        .bind(&item.code)
        .bind(item.stock)
        .bind(item.price)
        .bind(item.is_available)
        .bind(item.last_restock)
        .bind(item.id.as_i64())
        .bind(expected_stock)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        if guarded.rows_affected() != 1 {
            tx.rollback().await.map_err(map_sqlx)?;
            return Err(StoreError::Conflict);
        }

        let order = match write {
            OrderWrite::Create(new) => {
                let row = sqlx::query_as::<_, OrderRow>(
                    "INSERT INTO orders \
                     (order_code, order_date, total_price, quantity, customer_id, item_id) \
                     VALUES ($1, $2, $3, $4, $5, $6) \
                     RETURNING order_id, order_code, order_date, total_price, quantity, \
                               customer_id, item_id",
                )
                .bind(&new.code)
                .bind(new.order_date)
                .bind(new.total_price)
                .bind(new.quantity)
                .bind(new.customer_id.as_i64())
                .bind(new.item_id.as_i64())
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx)?;
                Order::from(row)
            }
            OrderWrite::Update(order) => {
                let result = sqlx::query(
                    "UPDATE orders SET order_code = $1, order_date = $2, total_price = $3, \
                     quantity = $4 \
                     WHERE order_id = $5",
                )
                .bind(&order.code)
                .bind(order.order_date)
                .bind(order.total_price)
                .bind(order.quantity)
                .bind(order.id.as_i64())
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx)?;

                if result.rows_affected() != 1 {
                    tx.rollback().await.map_err(map_sqlx)?;
                    return Err(StoreError::Conflict);
                }
                order
            }
        };

        tx.commit().await.map_err(map_sqlx)?;
        Ok(order)
    }
}

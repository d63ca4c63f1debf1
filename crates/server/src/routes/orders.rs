//! Order API handlers. All business rules live in the fulfillment engine;
//! this layer only checks field shape.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use shopd_core::{CustomerId, ItemId, OrderId};

use super::require_text;
use crate::error::AppError;
use crate::models::Order;
use crate::services::OrderInput;
use crate::state::AppState;

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list_orders).post(create_order))
        .route(
            "/api/orders/{id}",
            get(get_order).put(update_order).delete(delete_order),
        )
}

/// Order create/update payload.
#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub code: String,
    /// `yyyy-MM-dd`; defaults to today when omitted.
    pub order_date: Option<NaiveDate>,
    pub quantity: i32,
    pub customer_id: i64,
    pub item_id: i64,
}

/// Order representation on the wire.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub code: String,
    /// `yyyy-MM-dd`.
    pub order_date: String,
    pub total_price: f64,
    pub quantity: i32,
    pub customer_id: i64,
    pub item_id: i64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.as_i64(),
            code: order.code,
            order_date: order.order_date.format("%Y-%m-%d").to_string(),
            total_price: order.total_price,
            quantity: order.quantity,
            customer_id: order.customer_id.as_i64(),
            item_id: order.item_id.as_i64(),
        }
    }
}

impl OrderRequest {
    fn into_input(self) -> Result<OrderInput, AppError> {
        let code = require_text("code", Some(self.code))?;
        if self.quantity < 1 {
            return Err(AppError::Validation {
                field: "quantity",
                message: "must be at least 1".to_owned(),
            });
        }
        Ok(OrderInput {
            code,
            order_date: self
                .order_date
                .map(|d| d.and_time(NaiveTime::MIN).and_utc()),
            quantity: self.quantity,
            customer_id: CustomerId::new(self.customer_id),
            item_id: ItemId::new(self.item_id),
        })
    }
}

/// List all orders.
///
/// # Errors
///
/// Returns an error if the store read fails.
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let orders = state.fulfillment().list_orders().await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// Fetch a single order.
///
/// # Errors
///
/// Returns 404 if the order does not exist.
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state.fulfillment().get_order(OrderId::new(id)).await?;
    Ok(Json(order.into()))
}

/// Place an order.
///
/// # Errors
///
/// Returns 404 when the referenced customer or item does not exist, 400 for
/// invalid fields or violated business rules (unavailable item, insufficient
/// stock).
pub async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<OrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let order = state.fulfillment().create_order(&body.into_input()?).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// Update an order.
///
/// # Errors
///
/// Returns 404 if the order (or its referenced item) does not exist, 400 for
/// invalid fields, a re-pointed reference, or insufficient stock.
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<OrderRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state
        .fulfillment()
        .update_order(OrderId::new(id), &body.into_input()?)
        .await?;
    Ok(Json(order.into()))
}

/// Delete an order. Consumed stock is not returned.
///
/// # Errors
///
/// Returns 404 if the order does not exist.
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.fulfillment().delete_order(OrderId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_quantity_is_rejected() {
        let req = OrderRequest {
            code: "ORD-1".to_owned(),
            order_date: None,
            quantity: 0,
            customer_id: 1,
            item_id: 1,
        };
        assert!(matches!(
            req.into_input(),
            Err(AppError::Validation {
                field: "quantity",
                ..
            })
        ));
    }

    #[test]
    fn order_date_becomes_midnight_utc() {
        let req = OrderRequest {
            code: "ORD-1".to_owned(),
            order_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            quantity: 2,
            customer_id: 1,
            item_id: 1,
        };
        let input = req.into_input().expect("valid");
        let date = input.order_date.expect("present");
        assert_eq!(date.to_rfc3339(), "2024-06-01T00:00:00+00:00");
    }
}

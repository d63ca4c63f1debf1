//! Item API handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use shopd_core::ItemId;

use super::require_text;
use crate::error::AppError;
use crate::models::Item;
use crate::services::ItemInput;
use crate::state::AppState;

/// Build the items router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/items", get(list_items).post(create_item))
        .route(
            "/api/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
}

/// Item create/update payload.
#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    pub name: String,
    pub code: String,
    pub stock: i32,
    pub price: f64,
    /// Ignored on create (new items are always available).
    #[serde(default = "default_true")]
    pub is_available: bool,
    /// `yyyy-MM-dd`.
    pub last_restock: Option<NaiveDate>,
}

const fn default_true() -> bool {
    true
}

/// Item representation on the wire.
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub stock: i32,
    pub price: f64,
    pub is_available: bool,
    /// `yyyy-MM-dd`, if ever restocked.
    pub last_restock: Option<String>,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id.as_i64(),
            name: item.name,
            code: item.code,
            stock: item.stock,
            price: item.price,
            is_available: item.is_available,
            last_restock: item.last_restock.map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

impl ItemRequest {
    fn into_input(self) -> Result<ItemInput, AppError> {
        let name = require_text("name", Some(self.name))?;
        let code = require_text("code", Some(self.code))?;
        if self.stock < 0 {
            return Err(AppError::Validation {
                field: "stock",
                message: "must not be negative".to_owned(),
            });
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(AppError::Validation {
                field: "price",
                message: "must be a non-negative number".to_owned(),
            });
        }
        Ok(ItemInput {
            name,
            code,
            stock: self.stock,
            price: self.price,
            is_available: self.is_available,
            last_restock: self
                .last_restock
                .map(|d| d.and_time(NaiveTime::MIN).and_utc()),
        })
    }
}

/// List all items.
///
/// # Errors
///
/// Returns an error if the store read fails.
pub async fn list_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<ItemResponse>>, AppError> {
    let items = state.catalog().list_items().await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// Fetch a single item.
///
/// # Errors
///
/// Returns 404 if the item does not exist.
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ItemResponse>, AppError> {
    let item = state.catalog().get_item(ItemId::new(id)).await?;
    Ok(Json(item.into()))
}

/// Create an item.
///
/// # Errors
///
/// Returns 400 for invalid fields.
pub async fn create_item(
    State(state): State<AppState>,
    Json(body): Json<ItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), AppError> {
    let item = state.catalog().create_item(body.into_input()?).await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// Replace an item.
///
/// # Errors
///
/// Returns 404 if the item does not exist, 400 for invalid fields.
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ItemRequest>,
) -> Result<Json<ItemResponse>, AppError> {
    let item = state
        .catalog()
        .update_item(ItemId::new(id), body.into_input()?)
        .await?;
    Ok(Json(item.into()))
}

/// Delete an item.
///
/// # Errors
///
/// Returns 404 if the item does not exist.
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.catalog().delete_item(ItemId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ItemRequest {
        ItemRequest {
            name: "Solder iron".to_owned(),
            code: "SI-9".to_owned(),
            stock: 3,
            price: 19.99,
            is_available: true,
            last_restock: None,
        }
    }

    #[test]
    fn negative_stock_is_rejected() {
        let mut req = request();
        req.stock = -1;
        assert!(matches!(
            req.into_input(),
            Err(AppError::Validation { field: "stock", .. })
        ));
    }

    #[test]
    fn non_finite_price_is_rejected() {
        let mut req = request();
        req.price = f64::NAN;
        assert!(matches!(
            req.into_input(),
            Err(AppError::Validation { field: "price", .. })
        ));
    }

    #[test]
    fn restock_date_becomes_midnight_utc() {
        let mut req = request();
        req.last_restock = NaiveDate::from_ymd_opt(2024, 6, 1);
        let input = req.into_input().expect("valid");
        let restock = input.last_restock.expect("present");
        assert_eq!(restock.to_rfc3339(), "2024-06-01T00:00:00+00:00");
    }

    #[test]
    fn availability_defaults_to_true() {
        let req: ItemRequest =
            serde_json::from_str(r#"{"name":"x","code":"y","stock":1,"price":1.0}"#)
                .expect("deserialize");
        assert!(req.is_available);
    }
}

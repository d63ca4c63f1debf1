//! Customer API handlers.
//!
//! Create and update accept `multipart/form-data` so the profile picture can
//! ride along with the text fields; everything else is JSON.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use shopd_core::{CustomerId, Phone};

use super::{parse_date, require_text};
use crate::error::AppError;
use crate::models::Customer;
use crate::services::{CustomerInput, PictureUpload};
use crate::state::AppState;

/// Build the customers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list_customers).post(create_customer))
        .route(
            "/api/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

/// Customer representation on the wire.
#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub code: String,
    pub phone: String,
    pub is_active: bool,
    /// `yyyy-MM-dd`, if the customer has ordered before.
    pub last_order: Option<String>,
    pub pic: Option<String>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id.as_i64(),
            name: customer.name,
            address: customer.address,
            code: customer.code,
            phone: customer.phone.to_string(),
            is_active: customer.is_active,
            last_order: customer.last_order.map(|d| d.format("%Y-%m-%d").to_string()),
            pic: customer.pic,
        }
    }
}

/// List all customers.
///
/// # Errors
///
/// Returns an error if the store read fails.
pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomerResponse>>, AppError> {
    let customers = state.catalog().list_customers().await?;
    Ok(Json(customers.into_iter().map(Into::into).collect()))
}

/// Fetch a single customer.
///
/// # Errors
///
/// Returns 404 if the customer does not exist.
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CustomerResponse>, AppError> {
    let customer = state.catalog().get_customer(CustomerId::new(id)).await?;
    Ok(Json(customer.into()))
}

/// Create a customer from a multipart form.
///
/// # Errors
///
/// Returns 400 for malformed or missing fields.
pub async fn create_customer(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CustomerResponse>), AppError> {
    let input = parse_customer_form(multipart).await?;
    let customer = state.catalog().create_customer(input).await?;
    Ok((StatusCode::CREATED, Json(customer.into())))
}

/// Replace a customer from a multipart form. Omitting the picture keeps the
/// stored one.
///
/// # Errors
///
/// Returns 404 if the customer does not exist, 400 for malformed fields.
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<CustomerResponse>, AppError> {
    let input = parse_customer_form(multipart).await?;
    let customer = state
        .catalog()
        .update_customer(CustomerId::new(id), input)
        .await?;
    Ok(Json(customer.into()))
}

/// Delete a customer.
///
/// # Errors
///
/// Returns 404 if the customer does not exist.
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.catalog().delete_customer(CustomerId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Decode and validate the customer multipart form.
async fn parse_customer_form(mut multipart: Multipart) -> Result<CustomerInput, AppError> {
    let mut name = None;
    let mut address = None;
    let mut code = None;
    let mut phone = None;
    let mut is_active = None;
    let mut last_order = None;
    let mut picture = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(field_name) = field.name().map(str::to_owned) else {
            continue;
        };
        if field_name == "pic" {
            let filename = field.file_name().map(str::to_owned);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            // Browsers submit an empty file part when nothing was chosen.
            if !bytes.is_empty() {
                picture = Some(PictureUpload {
                    filename: filename.unwrap_or_else(|| "upload".to_owned()),
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        match field_name.as_str() {
            "name" => name = Some(text),
            "address" => address = Some(text),
            "code" => code = Some(text),
            "phone" => phone = Some(text),
            "is_active" => is_active = Some(text),
            "last_order" => last_order = Some(text),
            _ => {}
        }
    }

    let phone = require_text("phone", phone)?;
    let phone = Phone::parse(&phone).map_err(|e| AppError::Validation {
        field: "phone",
        message: e.to_string(),
    })?;

    let is_active = match is_active.as_deref() {
        None => true,
        Some(text) => text.parse::<bool>().map_err(|_| AppError::Validation {
            field: "is_active",
            message: format!("'{text}' is not a boolean"),
        })?,
    };

    Ok(CustomerInput {
        name: require_text("name", name)?,
        address: require_text("address", address)?,
        code: require_text("code", code)?,
        phone,
        is_active,
        last_order: parse_date("last_order", last_order.as_deref())?,
        picture,
    })
}

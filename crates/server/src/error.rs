//! Unified error handling for the HTTP boundary.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::services::{CatalogError, FulfillmentError};
use crate::store::StoreError;

/// Application-level error type for the presentation boundary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input caught before any service is invoked.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Offending request field.
        field: &'static str,
        /// Human-readable reason.
        message: String,
    },

    /// The request body could not be read (bad multipart, etc.).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Fulfillment engine error.
    #[error(transparent)]
    Fulfillment(#[from] FulfillmentError),

    /// Catalog service error.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Fulfillment(err) => match err {
                // A missing customer/item reference reads as a missing
                // resource, same as a direct lookup miss.
                FulfillmentError::OrderNotFound | FulfillmentError::ReferenceNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                FulfillmentError::ReferenceImmutable(_)
                | FulfillmentError::ItemUnavailable
                | FulfillmentError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
                FulfillmentError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Catalog(err) => match err {
                CatalogError::CustomerNotFound(_) | CatalogError::ItemNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                CatalogError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn store_failure(&self) -> Option<&StoreError> {
        match self {
            Self::Fulfillment(FulfillmentError::Store(e)) | Self::Catalog(CatalogError::Store(e)) => {
                Some(e)
            }
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(store_err) = self.store_failure() {
            tracing::error!(error = %store_err, "request failed on storage");
        }

        let status = self.status();
        let field = match &self {
            Self::Validation { field, .. } => Some(*field),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            field,
        };
        (status, Json(body)).into_response()
    }
}

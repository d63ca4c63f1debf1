//! HTTP routing and request/response mapping.
//!
//! Handlers stay thin: decode and validate the request, call the matching
//! service, map the result into JSON. Dates cross this boundary as
//! `yyyy-MM-dd` strings.

pub mod customers;
pub mod items;
pub mod orders;
pub mod reports;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(customers::router())
        .merge(items::router())
        .merge(orders::router())
        .merge(reports::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Require a present, non-blank text field.
fn require_text(field: &'static str, value: Option<String>) -> Result<String, AppError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        Some(_) => Err(AppError::Validation {
            field,
            message: "must not be blank".to_owned(),
        }),
        None => Err(AppError::Validation {
            field,
            message: "is required".to_owned(),
        }),
    }
}

/// Parse an optional `yyyy-MM-dd` date field.
fn parse_date(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<chrono::NaiveDate>, AppError> {
    value
        .map(|text| {
            chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| AppError::Validation {
                field,
                message: format!("'{text}' is not a yyyy-MM-dd date"),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_rejected() {
        assert!(require_text("name", Some("  ".to_owned())).is_err());
        assert!(require_text("name", None).is_err());
        assert_eq!(
            require_text("name", Some("Grace".to_owned())).expect("valid"),
            "Grace"
        );
    }

    #[test]
    fn dates_parse_as_ymd_only() {
        let date = parse_date("last_order", Some("2024-06-01"))
            .expect("valid")
            .expect("present");
        assert_eq!(date.to_string(), "2024-06-01");
        assert!(parse_date("last_order", Some("06/01/2024")).is_err());
        assert!(parse_date("last_order", None).expect("absent").is_none());
    }
}

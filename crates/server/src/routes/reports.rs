//! Report export handlers.

use axum::Router;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::error::AppError;
use crate::services::report;
use crate::state::AppState;

/// Build the reports router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/reports/orders.csv", get(orders_csv))
}

/// Export all orders as a CSV download.
///
/// # Errors
///
/// Returns an error if the store read fails.
pub async fn orders_csv(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let orders = state.fulfillment().list_orders().await?;
    let csv = report::orders_to_csv(&orders);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"orders.csv\"",
            ),
        ],
        csv,
    ))
}

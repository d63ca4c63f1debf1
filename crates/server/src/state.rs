//! Shared application state handed to every request handler.

use std::sync::Arc;

use crate::services::{CatalogService, FulfillmentService};

/// Cheaply cloneable handle to the application's services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    catalog: CatalogService,
    fulfillment: FulfillmentService,
}

impl AppState {
    /// Bundle the services into shared state.
    #[must_use]
    pub fn new(catalog: CatalogService, fulfillment: FulfillmentService) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                catalog,
                fulfillment,
            }),
        }
    }

    /// Catalog service (customers and items).
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Fulfillment engine (orders).
    #[must_use]
    pub fn fulfillment(&self) -> &FulfillmentService {
        &self.inner.fulfillment
    }
}

//! Catalog CRUD for customers and items.
//!
//! Order logic never passes through here; the fulfillment engine reads and
//! commits through the store directly. The one subtlety in this module is the
//! picture upload: it is a best-effort side effect, deliberately decoupled
//! from the customer write, so a media failure is logged and the customer is
//! persisted without a picture.

use tracing::instrument;

use shopd_core::{CustomerId, ItemId};

use super::media::MediaStorage;
use crate::models::{Customer, Item, NewCustomer, NewItem};
use crate::store::{DynStore, StoreError};

use std::sync::Arc;

/// Errors raised by catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The requested customer does not exist.
    #[error("customer {0} not found")]
    CustomerNotFound(CustomerId),

    /// The requested item does not exist.
    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An uploaded picture payload.
#[derive(Debug, Clone)]
pub struct PictureUpload {
    /// Client-supplied file name; only its extension is trusted.
    pub filename: String,
    /// Raw bytes.
    pub bytes: Vec<u8>,
}

/// Validated input for customer create/update.
#[derive(Debug, Clone)]
pub struct CustomerInput {
    pub name: String,
    pub address: String,
    pub code: String,
    pub phone: shopd_core::Phone,
    pub is_active: bool,
    pub last_order: Option<chrono::NaiveDate>,
    pub picture: Option<PictureUpload>,
}

/// Validated input for item create/update.
#[derive(Debug, Clone)]
pub struct ItemInput {
    pub name: String,
    pub code: String,
    pub stock: i32,
    pub price: f64,
    pub is_available: bool,
    pub last_restock: Option<chrono::DateTime<chrono::Utc>>,
}

/// Thin CRUD over the catalog store, plus the media side channel.
#[derive(Clone)]
pub struct CatalogService {
    store: DynStore,
    media: Arc<dyn MediaStorage>,
}

impl CatalogService {
    /// Create a catalog service over the given store and media collaborator.
    #[must_use]
    pub fn new(store: DynStore, media: Arc<dyn MediaStorage>) -> Self {
        Self { store, media }
    }

    // Customers

    /// List all customers.
    ///
    /// # Errors
    ///
    /// Returns a store error if the read fails.
    pub async fn list_customers(&self) -> Result<Vec<Customer>, CatalogError> {
        Ok(self.store.list_customers().await?)
    }

    /// Look up a single customer.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::CustomerNotFound`] if absent.
    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer, CatalogError> {
        self.store
            .get_customer(id)
            .await?
            .ok_or(CatalogError::CustomerNotFound(id))
    }

    /// Create a customer, uploading the picture (if any) as a best-effort
    /// side effect.
    ///
    /// # Errors
    ///
    /// Returns a store error if the write fails. Media failures do not fail
    /// the operation.
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_customer(&self, input: CustomerInput) -> Result<Customer, CatalogError> {
        let pic = self.store_picture(input.picture.as_ref()).await;
        let customer = self
            .store
            .insert_customer(NewCustomer {
                name: input.name,
                address: input.address,
                code: input.code,
                phone: input.phone,
                is_active: input.is_active,
                last_order: input.last_order,
                pic,
            })
            .await?;
        tracing::info!(customer_id = %customer.id, "customer created");
        Ok(customer)
    }

    /// Update a customer in place. A new picture replaces the stored
    /// reference; omitting the picture keeps the existing one.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::CustomerNotFound`] if absent, or a store error.
    #[instrument(skip(self, input), fields(customer_id = %id))]
    pub async fn update_customer(
        &self,
        id: CustomerId,
        input: CustomerInput,
    ) -> Result<Customer, CatalogError> {
        let existing = self.get_customer(id).await?;

        let pic = match self.store_picture(input.picture.as_ref()).await {
            Some(reference) => Some(reference),
            None => existing.pic,
        };

        let customer = Customer {
            id,
            name: input.name,
            address: input.address,
            code: input.code,
            phone: input.phone,
            is_active: input.is_active,
            last_order: input.last_order,
            pic,
        };

        if self.store.update_customer(&customer).await? {
            Ok(customer)
        } else {
            Err(CatalogError::CustomerNotFound(id))
        }
    }

    /// Delete a customer.
    ///
    /// Orders referencing the customer are left in place; references are
    /// resolved at operation time and may dangle afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::CustomerNotFound`] if absent.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, id: CustomerId) -> Result<(), CatalogError> {
        if self.store.delete_customer(id).await? {
            Ok(())
        } else {
            Err(CatalogError::CustomerNotFound(id))
        }
    }

    // Items

    /// List all items.
    ///
    /// # Errors
    ///
    /// Returns a store error if the read fails.
    pub async fn list_items(&self) -> Result<Vec<Item>, CatalogError> {
        Ok(self.store.list_items().await?)
    }

    /// Look up a single item.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ItemNotFound`] if absent.
    pub async fn get_item(&self, id: ItemId) -> Result<Item, CatalogError> {
        self.store
            .get_item(id)
            .await?
            .ok_or(CatalogError::ItemNotFound(id))
    }

    /// Create an item. New items are always available regardless of the
    /// requested flag.
    ///
    /// # Errors
    ///
    /// Returns a store error if the write fails.
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_item(&self, input: ItemInput) -> Result<Item, CatalogError> {
        let item = self
            .store
            .insert_item(NewItem {
                name: input.name,
                code: input.code,
                stock: input.stock,
                price: input.price,
                is_available: true,
                last_restock: input.last_restock,
            })
            .await?;
        tracing::info!(item_id = %item.id, "item created");
        Ok(item)
    }

    /// Update an item in place, overwriting stock and availability verbatim.
    ///
    /// This is the only path that can re-enable `is_available` after the
    /// fulfillment engine has cleared it. It can also desynchronize the
    /// stock/availability invariant; that is inherited behavior.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ItemNotFound`] if absent, or a store error.
    #[instrument(skip(self, input), fields(item_id = %id))]
    pub async fn update_item(&self, id: ItemId, input: ItemInput) -> Result<Item, CatalogError> {
        let item = Item {
            id,
            name: input.name,
            code: input.code,
            stock: input.stock,
            price: input.price,
            is_available: input.is_available,
            last_restock: input.last_restock,
        };

        if self.store.update_item(&item).await? {
            Ok(item)
        } else {
            Err(CatalogError::ItemNotFound(id))
        }
    }

    /// Delete an item. Like customer deletion, existing orders keep their
    /// (now dangling) reference.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ItemNotFound`] if absent.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: ItemId) -> Result<(), CatalogError> {
        if self.store.delete_item(id).await? {
            Ok(())
        } else {
            Err(CatalogError::ItemNotFound(id))
        }
    }

    /// Best-effort picture upload. Returns the reference on success, `None`
    /// when there is nothing to upload or the media store failed.
    async fn store_picture(&self, picture: Option<&PictureUpload>) -> Option<String> {
        let picture = picture?;
        match self.media.put(&picture.filename, &picture.bytes).await {
            Ok(reference) => Some(reference),
            Err(err) => {
                tracing::warn!(error = %err, filename = %picture.filename, "picture upload failed; continuing without it");
                None
            }
        }
    }
}

//! Business services: the fulfillment engine, catalog CRUD, the media
//! storage collaborator, and the order report export.

pub mod catalog;
pub mod fulfillment;
pub mod media;
pub mod report;

pub use catalog::{CatalogError, CatalogService, CustomerInput, ItemInput, PictureUpload};
pub use fulfillment::{FulfillmentError, FulfillmentService, OrderInput, Reference};
pub use media::{FsMediaStorage, MediaError, MediaStorage};

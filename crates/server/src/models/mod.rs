//! Domain records for the shop: customers, items, orders.
//!
//! These are the persisted shapes. Request/response DTOs live next to the
//! route handlers that use them.

pub mod customer;
pub mod item;
pub mod order;

pub use customer::{Customer, NewCustomer};
pub use item::{Item, NewItem};
pub use order::{NewOrder, Order};

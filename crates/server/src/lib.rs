//! Shop backend library.
//!
//! Exposes the catalog, fulfillment, storage, and HTTP layers so they can be
//! exercised from integration tests and the CLI as well as the server binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

//! Core types for shopd.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod phone;

pub use id::*;
pub use phone::{Phone, PhoneError};

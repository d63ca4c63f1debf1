//! Customer domain model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shopd_core::{CustomerId, Phone};

/// A customer on record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Unique customer ID.
    pub id: CustomerId,
    /// Display name.
    pub name: String,
    /// Postal address.
    pub address: String,
    /// Internal customer code.
    pub code: String,
    /// Validated phone number.
    pub phone: Phone,
    /// Whether the customer account is active.
    pub is_active: bool,
    /// Date of the most recent order, if any.
    pub last_order: Option<NaiveDate>,
    /// Reference to an uploaded profile picture, if any.
    pub pic: Option<String>,
}

/// A customer about to be inserted; the store assigns the ID.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub address: String,
    pub code: String,
    pub phone: Phone,
    pub is_active: bool,
    pub last_order: Option<NaiveDate>,
    pub pic: Option<String>,
}

//! Seed the database with sample catalog data for local development.

use tracing::info;

use shopd_core::Phone;
use shopd_server::models::{NewCustomer, NewItem};
use shopd_server::store::{PgStore, ShopStore, create_pool};

use super::{CommandError, database_url};

/// Insert a handful of customers and items.
///
/// Running the command twice inserts the rows twice; it is meant for fresh
/// development databases.
///
/// # Errors
///
/// Returns an error if the database URL is missing or a write fails.
pub async fn run() -> Result<(), CommandError> {
    let url = database_url()?;

    info!("Connecting to database...");
    let store = PgStore::new(create_pool(&url).await?);

    for (name, address, code, phone) in [
        ("Ada Wong", "1 Harbor View", "CUST-001", "+1 555 010 2001"),
        ("Bela Okmyx", "14 Iotia Plaza", "CUST-002", "+1 555 010 2002"),
        ("Chen Mireille", "3 Rue des Lilas", "CUST-003", "+33 1 55 01 02 03"),
    ] {
        let customer = store
            .insert_customer(NewCustomer {
                name: name.to_owned(),
                address: address.to_owned(),
                code: code.to_owned(),
                phone: Phone::parse(phone)
                    .map_err(|e| CommandError::InvalidSeedData(e.to_string()))?,
                is_active: true,
                last_order: None,
                pic: None,
            })
            .await?;
        info!(id = %customer.id, code, "seeded customer");
    }

    for (name, code, stock, price) in [
        ("Mechanical keyboard", "KB-75", 40, 129.0),
        ("USB-C dock", "DK-11", 25, 89.5),
        ("Laptop stand", "LS-02", 60, 34.9),
    ] {
        let item = store
            .insert_item(NewItem {
                name: name.to_owned(),
                code: code.to_owned(),
                stock,
                price,
                is_available: true,
                last_restock: None,
            })
            .await?;
        info!(id = %item.id, code, "seeded item");
    }

    info!("Seeding complete!");
    Ok(())
}

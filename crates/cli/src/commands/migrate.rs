//! Database migration command.
//!
//! Migration files live in `crates/server/migrations/` and are embedded into
//! the binary at compile time.

use tracing::info;

use shopd_server::store::create_pool;

use super::{CommandError, database_url};

/// Run the database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails, or
/// a migration fails to apply.
pub async fn run() -> Result<(), CommandError> {
    let url = database_url()?;

    info!("Connecting to database...");
    let pool = create_pool(&url).await?;

    info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}

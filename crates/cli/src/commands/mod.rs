//! CLI subcommands.

pub mod account;
pub mod migrate;
pub mod seed;

use std::sync::Arc;

use cartwheel_server::config::ServerConfig;
use cartwheel_server::db::{self, PgStore, Store};

/// Load the server configuration and connect to its database.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, points at the
/// in-memory store, or the database is unreachable.
pub async fn connect() -> Result<(ServerConfig, Arc<dyn Store>), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    if config.uses_memory_store() {
        return Err("the in-memory store cannot be managed from the CLI".into());
    }

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;
    Ok((config, Arc::new(PgStore::new(pool))))
}

//! Database connection handling.

use postgres::{Client, NoTls};
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

/// Open a connection to the configured database and verify it is alive
/// before handing it out.
pub fn connect(config: &DatabaseConfig) -> Result<Client> {
    let mut client =
        Client::connect(&config.connection_string(), NoTls).map_err(Error::Connection)?;

    client
        .batch_execute("SELECT 1")
        .map_err(Error::Connection)?;

    debug!(host = %config.host, dbname = %config.name, "connected to database");
    Ok(client)
}

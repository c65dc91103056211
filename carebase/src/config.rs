//! Application configuration.
//!
//! Settings are layered: development defaults, then an optional
//! `carebase.toml` in the working directory, then `CAREBASE__`-prefixed
//! environment variables (e.g. `CAREBASE__DATABASE__HOST`).

use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub http_server_port: u16,
    pub jwt_secret: String,
}

impl DatabaseConfig {
    /// Render the key/value connection string expected by the `postgres`
    /// crate. TLS is not used; the service talks to the database over a
    /// private network.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={} sslmode=disable",
            self.host, self.port, self.user, self.password, self.name
        )
    }
}

impl AppConfig {
    /// Load configuration from file and environment on top of defaults.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("database.host", "127.0.0.1")?
            .set_default("database.port", 5432_i64)?
            .set_default("database.user", "postgres")?
            .set_default("database.password", "postgres")?
            .set_default("database.name", "carebase")?
            .set_default("api.http_server_port", 8080_i64)?
            .set_default("api.jwt_secret", "carebase-dev-secret")?
            .add_source(config::File::with_name("carebase").required(false))
            .add_source(config::Environment::with_prefix("CAREBASE").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

//! Shared PostgreSQL test infrastructure.
//!
//! A single PostgreSQL testcontainer is started on first use and kept alive
//! for the rest of the test run; each test gets its own freshly created
//! database so tests never observe each other's state.

use std::sync::OnceLock;

use postgres::{Client, NoTls};
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use uuid::Uuid;

use crate::config::DatabaseConfig;

const PG_USER: &str = "postgres";
const PG_PASSWORD: &str = "postgres";
const PG_ADMIN_DB: &str = "postgres";

/// Runtime + mapped port of the shared container. The runtime must stay
/// alive as long as the container does.
static POSTGRES: OnceLock<(tokio::runtime::Runtime, u16)> = OnceLock::new();

fn postgres_port() -> u16 {
    let (_rt, port) = POSTGRES.get_or_init(|| {
        let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");

        let port = rt.block_on(async {
            let container = Postgres::default()
                .start()
                .await
                .expect("failed to start postgres container");

            let port = container
                .get_host_port_ipv4(5432)
                .await
                .expect("failed to get postgres port");

            // Leak the container so it survives for the whole test run.
            std::mem::forget(container);

            port
        });

        (rt, port)
    });
    *port
}

fn config_for(port: u16, dbname: &str) -> DatabaseConfig {
    DatabaseConfig {
        host: "127.0.0.1".to_string(),
        port,
        user: PG_USER.to_string(),
        password: PG_PASSWORD.to_string(),
        name: dbname.to_string(),
    }
}

/// Create a uniquely named database in the shared container and return the
/// configuration pointing at it.
pub fn fresh_database() -> DatabaseConfig {
    let port = postgres_port();
    let admin = config_for(port, PG_ADMIN_DB);

    let mut client =
        Client::connect(&admin.connection_string(), NoTls).expect("failed to connect as admin");

    let db_name = format!("test_{}", Uuid::new_v4().simple());
    client
        .execute(&format!("CREATE DATABASE \"{}\"", db_name), &[])
        .expect("failed to create test database");

    config_for(port, &db_name)
}

//! `carebase` is a small multi-tenant service for hospital staff
//! authentication and patient record lookup, backed by PostgreSQL.
//!
//! Staff authenticate per-hospital and receive a bearer token; every
//! patient query made with that token is scoped to the staff member's own
//! hospital. Schema evolution is handled by the [migrate] module: numbered,
//! named, forwards-only migrations applied sequentially, one transaction
//! per migration, with the applied set recorded in a bookkeeping table so
//! re-runs resume where the last run stopped.
//!
//! # Core concepts
//!
//! - Migrations are code, not SQL files: each implements
//!   [Migration](migrate::Migration) against a live transaction, so a
//!   migration can query data, transform it in Rust, and write it back.
//! - The [Registry](migrate::Registry) of known migrations is built
//!   explicitly by [migrations::registry]; there is no global registration,
//!   so tests can construct disjoint registries freely.
//! - The HTTP surface ([api], [server]) is a thin axum layer over the
//!   synchronous [store].
//!
//! The `carebase-cli` binary exposes the two entry points: `serve` for the
//! HTTP API and `migrate-db` for the runner.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod migrate;
pub mod migrations;
pub mod models;
pub mod server;
pub mod store;

mod error;
pub use error::{Error, Result};

#[cfg(test)]
pub(crate) mod test_postgres;

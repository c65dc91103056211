//! Schema migrations for the carebase database.
//!
//! Every migration lives in its own file, numbered in apply order. New
//! migrations must be added to [registry] with the next free number; numbers
//! and names of applied migrations must never change.

mod m0001_initial_schema;
mod m0002_seed_data;

pub use m0001_initial_schema::InitialSchema;
pub use m0002_seed_data::SeedData;

use crate::migrate::Registry;

/// Build the registry of all known migrations.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.register(Box::new(InitialSchema));
    registry.register(Box::new(SeedData));
    registry
}

//! The migration runner.
//!
//! Schema evolution is expressed as numbered, named, forwards-only
//! [Migration]s collected into a [Registry]. The runner applies the
//! migrations that are not yet recorded in the `migrations` bookkeeping
//! table, strictly in ascending number order, one transaction per migration:
//! the migration's changes and its bookkeeping row either both commit or
//! both roll back. A failed run can simply be re-run; it resumes at the
//! first migration above the recorded watermark.
//!
//! The runner takes no advisory lock. Deployments must ensure a single
//! writer per target database; the bookkeeping table's primary key rejects
//! the loser if two runners race.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use postgres::Transaction;
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::db;
use crate::error::{Error, Result};

/// A single unit of schema change.
///
/// Numbers must be unique across all migrations handed to the runner and
/// start at 1. Once a migration has been applied to any database, its
/// number and name must never change: both are persisted for audit and the
/// number drives the resume watermark.
pub trait Migration {
    /// The position of this migration in the total order.
    fn number(&self) -> u32;

    /// Human-readable description, persisted alongside the number.
    fn name(&self) -> String;

    /// Apply the migration. Runs inside a dedicated transaction; returning
    /// an error rolls back everything the migration did.
    fn forwards(&self, tx: &mut Transaction<'_>) -> Result<()>;
}

impl std::fmt::Debug for dyn Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("number", &self.number())
            .field("name", &self.name())
            .finish()
    }
}

/// The ordered collection of all known migrations.
///
/// Built explicitly by the caller (see `migrations::registry()`); there is
/// no process-global registration. Duplicate numbers are tolerated at
/// registration time and rejected when the runner validates the registry.
#[derive(Debug, Default)]
pub struct Registry {
    migrations: Vec<Box<dyn Migration>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a migration. Validation happens later, in the runner.
    pub fn register(&mut self, migration: Box<dyn Migration>) {
        self.migrations.push(migration);
    }

    pub fn migrations(&self) -> &[Box<dyn Migration>] {
        &self.migrations
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    /// Sort ascending by number, rejecting duplicates. Must run before
    /// anything depends on registry order.
    fn validate_and_sort(&mut self) -> Result<()> {
        self.migrations.sort_by_key(|m| m.number());
        for pair in self.migrations.windows(2) {
            if pair[0].number() == pair[1].number() {
                return Err(Error::DuplicateMigrationNumber(pair[1].number()));
            }
        }
        Ok(())
    }
}

/// Options controlling a single runner invocation.
#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    /// Enumerate due migrations without executing or recording them.
    pub dry_run: bool,
    /// Highest migration number to apply; `None` means "through the highest
    /// registered number".
    pub target: Option<u32>,
    /// Drop and recreate the `public` schema before applying anything.
    /// Destructive; intended for non-production databases only.
    pub force: bool,
    /// Checked before each due migration, never mid-transaction; when set,
    /// the run stops with [Error::Cancelled].
    pub cancel: Option<Arc<AtomicBool>>,
}

/// What a runner invocation did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MigrateReport {
    /// Whether the bookkeeping table had to be created by this run.
    pub bookkeeping_table_created: bool,
    /// Numbers applied and recorded, in order.
    pub applied: Vec<u32>,
    /// Numbers that were due but not executed (dry run only), in order.
    pub pending: Vec<u32>,
}

/// Apply all due migrations in `registry` to the configured database.
///
/// The connection is opened here and released on every exit path. Any
/// failure aborts the remaining sequence; migrations already committed by
/// this or earlier runs stay committed.
pub fn migrate(
    mut registry: Registry,
    db_config: &DatabaseConfig,
    opts: &MigrateOptions,
) -> Result<MigrateReport> {
    if opts.dry_run {
        info!("dry run: enumerating migrations without applying them");
    }

    registry.validate_and_sort()?;

    let mut client = db::connect(db_config)?;

    let mut report = MigrateReport::default();

    if opts.force {
        if opts.dry_run {
            warn!("force-migrate requested together with dry-run; skipping schema reset");
        } else {
            warn!("force-migrate: dropping and recreating schema 'public'");
            client
                .batch_execute("DROP SCHEMA public CASCADE; CREATE SCHEMA public;")
                .map_err(Error::SchemaReset)?;
        }
    }

    debug!("ensuring migrations bookkeeping table is present");
    let table_existed: bool = client
        .query_one(
            "SELECT EXISTS (SELECT FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_name = 'migrations')",
            &[],
        )
        .map_err(Error::Bookkeeping)?
        .get(0);
    if !table_existed {
        client
            .execute(
                "CREATE TABLE IF NOT EXISTS migrations (
                    number BIGINT PRIMARY KEY,
                    name TEXT NOT NULL,
                    applied_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP
                )",
                &[],
            )
            .map_err(Error::Bookkeeping)?;
        report.bookkeeping_table_created = true;
    }

    let latest_applied: i64 = client
        .query_one("SELECT COALESCE(MAX(number), 0) FROM migrations", &[])
        .map_err(Error::Bookkeeping)?
        .get(0);
    let latest_applied = latest_applied as u32;

    let highest = match registry.migrations.last() {
        Some(migration) => migration.number(),
        None => {
            info!("no migrations registered");
            return Ok(report);
        }
    };

    if latest_applied >= highest {
        info!(latest_applied, "no migrations to apply - database is up to date");
        return Ok(report);
    }

    let ceiling = opts.target.unwrap_or(highest);

    if ceiling <= latest_applied && latest_applied > 0 {
        info!(
            ceiling,
            latest_applied, "no migrations to apply - target does not exceed latest applied"
        );
        return Ok(report);
    }

    for migration in &registry.migrations {
        let number = migration.number();
        let name = migration.name();

        if number > ceiling {
            break;
        }
        if number <= latest_applied {
            debug!(number, "skipping migration (already applied)");
            continue;
        }

        if let Some(cancel) = &opts.cancel {
            if cancel.load(Ordering::SeqCst) {
                warn!(number, "cancellation requested; stopping before migration");
                return Err(Error::Cancelled { number });
            }
        }

        info!(number, name = %name, "applying migration");

        if opts.dry_run {
            report.pending.push(number);
            continue;
        }

        let mut tx = client.transaction().map_err(|e| Error::MigrationApply {
            number,
            name: name.clone(),
            source: Box::new(Error::Postgres(e)),
        })?;

        if let Err(e) = migration.forwards(&mut tx) {
            // Dropping the transaction rolls it back.
            return Err(Error::MigrationApply {
                number,
                name,
                source: Box::new(e),
            });
        }

        if let Err(e) = tx.execute(
            "INSERT INTO migrations (number, name) VALUES ($1, $2)",
            &[&(number as i64), &name],
        ) {
            return Err(Error::RecordInsert {
                number,
                name,
                source: e,
            });
        }

        tx.commit().map_err(|e| Error::Commit {
            number,
            name,
            source: e,
        })?;

        info!(number, "migration applied successfully");
        report.applied.push(number);
    }

    if opts.dry_run {
        info!(pending = report.pending.len(), "dry run complete");
    } else {
        info!(
            applied = report.applied.len(),
            "all migrations applied successfully"
        );
    }

    Ok(report)
}

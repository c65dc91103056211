/// Error type for the carebase crate.
///
/// The migration-runner variants carry the number and name of the migration
/// involved so operators can diagnose a failed run from the message alone.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Two registered migrations share the same number. Raised by registry
    /// validation before any database connection is attempted.
    #[error("duplicate migration number found: {0}")]
    DuplicateMigrationNumber(u32),

    /// The database was unreachable or rejected the connection.
    #[error("unable to connect to database: {0}")]
    Connection(#[source] postgres::Error),

    /// The force-migrate schema reset failed.
    #[error("unable to reset schema: {0}")]
    SchemaReset(#[source] postgres::Error),

    /// Creating or querying the `migrations` bookkeeping table failed.
    #[error("migration bookkeeping failed: {0}")]
    Bookkeeping(#[source] postgres::Error),

    /// A migration's forwards procedure failed. Its transaction was rolled
    /// back; no later migration was attempted.
    #[error("unable to apply migration {number} ({name}): {source}")]
    MigrationApply {
        number: u32,
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// Inserting the bookkeeping row failed after a successful apply. Rolled
    /// back together with the apply, so the migration counts as never run.
    #[error("unable to record migration {number} ({name}): {source}")]
    RecordInsert {
        number: u32,
        name: String,
        #[source]
        source: postgres::Error,
    },

    /// The commit itself failed after apply + record succeeded. The
    /// migration's effects are indeterminate from the runner's point of
    /// view; inspect the database before re-running.
    #[error(
        "commit failed for migration {number} ({name}); \
         its effects are indeterminate, inspect the database before re-running: {source}"
    )]
    Commit {
        number: u32,
        name: String,
        #[source]
        source: postgres::Error,
    },

    /// The run was cancelled before the named migration started.
    #[error("migration run cancelled before migration {number}")]
    Cancelled { number: u32 },

    #[error("{0}")]
    Postgres(#[from] postgres::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, Error>;

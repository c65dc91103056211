//! Command-line entry point for carebase.
//!
//! `serve` starts the HTTP API; `migrate-db` applies pending schema
//! migrations. Any returned error is printed and the process exits
//! non-zero.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use carebase::config::AppConfig;
use carebase::migrate::{migrate, MigrateOptions};
use carebase::migrations;
use carebase::server;

#[derive(Parser)]
#[command(name = "carebase-cli", version, about = "Hospital staff and patient record service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve,
    /// Run database migrations
    MigrateDb {
        /// The migration to run forwards until; -1 runs all migrations
        #[arg(long, default_value_t = -1)]
        number: i64,
        /// Print the migrations that would be applied without running them
        #[arg(long)]
        dry_run: bool,
        /// Drop the whole schema before migrating the database
        #[arg(long)]
        force_migrate: bool,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    match cli.command {
        Commands::Serve => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::run(config))?;
        }
        Commands::MigrateDb {
            number,
            dry_run,
            force_migrate,
        } => {
            // Negative numbers are the "run everything" sentinel.
            let target = u32::try_from(number).ok();
            let opts = MigrateOptions {
                dry_run,
                target,
                force: force_migrate,
                cancel: None,
            };
            migrate(migrations::registry(), &config.database, &opts)?;
        }
    }

    Ok(())
}

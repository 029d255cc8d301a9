//! keepsync CLI - operator tooling for the keepsync record store
//!
//! - Connectivity and schema checks (`ping`, `migrate`, `tables`)
//! - User registration and lookup (`user`)
//! - Record inspection and soft deletion (`records`)

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "keepsync",
    author,
    version,
    about = "Operator tooling for the keepsync record store",
    long_about = "Inspect and maintain the Postgres store behind the keepsync sync backend: \
                  check connectivity, apply migrations, register users and browse their records."
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the telemetry feature)
    #[arg(long, global = true)]
    otel: bool,

    /// Postgres DSN (overrides KEEPSYNC_DATABASE_URL, DATABASE_URL and config.toml)
    #[arg(long, global = true, value_name = "URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the database answers
    Ping,
    /// Apply schema migrations, failing on the first error
    Migrate,
    /// List synchronized tables with their live columns
    Tables,
    /// Register and look up users
    User(commands::users::UserArgs),
    /// List or soft-delete records
    Records(commands::records::RecordsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_setup::init(&TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    })
    .ok();

    let config = config::load(cli.database_url)?;

    let result = match cli.command {
        Commands::Ping => commands::run_ping(&config).await,
        Commands::Migrate => commands::run_migrate(&config).await,
        Commands::Tables => commands::run_tables(&config).await,
        Commands::User(args) => commands::run_users(args, &config).await,
        Commands::Records(args) => commands::run_records(args, &config).await,
    };

    tracing_setup::shutdown_otel();
    result
}

mod db;
mod report;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::db::DbCommands;
use crate::report::ReportCommands;

#[derive(Debug, Parser)]
#[command(name = "saddlery-cli")]
#[command(about = "Saddlery back-office analytics command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Offline analytics reports
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("saddlery-cli: try `db ping`, `db migrate`, `db seed` or `report export`");
        return Ok(());
    };

    let pool = saddlery_db::connect_pool_from_env().await?;

    match command {
        Commands::Db { command } => db::run(&pool, command).await,
        Commands::Report { command } => report::run(&pool, command).await,
    }
}

/// Logs go to stderr so an exported report on stdout stays clean.
fn init_tracing() -> anyhow::Result<()> {
    let fallback = std::env::var("SADDLERY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(fallback))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

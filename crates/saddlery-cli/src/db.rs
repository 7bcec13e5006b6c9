//! Database maintenance commands.

use chrono::Utc;
use clap::Subcommand;
use sqlx::PgPool;

/// Sub-commands available under `db`.
#[derive(Debug, Subcommand)]
pub enum DbCommands {
    /// Check that the database answers a trivial query
    Ping,
    /// Apply pending schema migrations
    Migrate,
    /// Insert the demo catalogue, customers and orders (idempotent)
    Seed,
}

pub(crate) async fn run(pool: &PgPool, command: DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            saddlery_db::ping(pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = saddlery_db::run_migrations(pool).await?;
            tracing::info!(applied, "migrations complete");
            println!("applied {applied} migration(s)");
        }
        DbCommands::Seed => {
            saddlery_db::run_migrations(pool).await?;
            let summary = saddlery_db::seed_demo_data(pool, Utc::now()).await?;
            println!(
                "seeded {} products, {} customers, {} new orders",
                summary.products, summary.customers, summary.orders_inserted
            );
        }
    }
    Ok(())
}

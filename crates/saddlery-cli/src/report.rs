//! Offline report export.
//!
//! Runs the same export pipeline as `GET /api/analytics/export` and writes the
//! document to a file or stdout.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Subcommand, ValueEnum};
use saddlery_analytics::{build_export, parse_period_days, render_export, ExportFormat};
use sqlx::PgPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

/// Sub-commands available under `report`.
#[derive(Debug, Subcommand)]
pub enum ReportCommands {
    /// Export the analytics report for the last N days
    Export {
        /// Window length in days; invalid values fall back to 30
        #[arg(long, default_value = "30")]
        period: String,
        /// Output format
        #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
        format: FormatArg,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

pub(crate) async fn run(pool: &PgPool, command: ReportCommands) -> anyhow::Result<()> {
    match command {
        ReportCommands::Export {
            period,
            format,
            output,
        } => export(pool, &period, format.into(), output).await,
    }
}

async fn export(
    pool: &PgPool,
    period: &str,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let period_days = parse_period_days(Some(period));
    let report = build_export(pool, period_days, Utc::now()).await?;
    let document = render_export(&report, format)?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, document.as_bytes()).await?;
            tracing::info!(
                path = %path.display(),
                period_days,
                orders = report.orders.len(),
                "report written"
            );
        }
        None => print!("{document}"),
    }
    Ok(())
}

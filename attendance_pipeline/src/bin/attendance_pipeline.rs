use std::path::PathBuf;

use anyhow::{Context, Result};
use attendance_pipeline::config::PipelineConfig;
use attendance_pipeline::db::{BackendKind, migrate};
use attendance_pipeline::persistence::{PgRepo, SqliteRepo, TableRepo};
use attendance_pipeline::pipeline::Pipeline;
use attendance_pipeline::registry::ArtifactStore;
use attendance_pipeline::{features, query, trainer};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

#[derive(Parser)]
#[command(version, about = "Museum attendance vs. city population pipeline")]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Apply pending schema migrations.
    Migrate,
    /// Fetch both sources and reload the raw tables.
    Ingest,
    /// Rebuild the feature table from the raw tables.
    Features,
    /// Fit a model on the feature table and register it.
    Train,
    /// Ingest, features and train in sequence.
    Run,
    /// Show the latest registry entry.
    Latest,
    /// Print the feature table, most visited first.
    ListFeatures,
    /// Estimate annual visitors for a city population.
    Predict {
        #[arg(long)]
        population: f64,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Commands that fetch from the sources need the full pipeline; the rest
/// only touch the repository.
async fn execute<S: TableRepo>(mut repo: S, cfg: &PipelineConfig, cmd: Cmd) -> Result<()> {
    let artifacts = ArtifactStore::new(&cfg.artifacts_dir);
    match cmd {
        Cmd::Ingest => print_json(&Pipeline::from_config(repo, cfg)?.ingest().await?),
        Cmd::Run => print_json(&Pipeline::from_config(repo, cfg)?.run().await?),
        Cmd::Features => print_json(&features::build_features(&mut repo)?),
        Cmd::Train => print_json(&trainer::train(&mut repo, &artifacts)?),
        Cmd::Latest => print_json(&query::latest_entry(&mut repo)?),
        Cmd::ListFeatures => print_json(&query::list_features(&mut repo)?),
        Cmd::Predict { population } => print_json(&query::predict(&mut repo, population)?),
        Cmd::Migrate => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = PipelineConfig::load(cli.config.as_deref()).context("loading configuration")?;

    let applied = migrate::run_all(&cfg.database_url).context("running migrations")?;
    if applied > 0 || matches!(cli.cmd, Cmd::Migrate) {
        info!(applied, "schema migrated");
    }
    match BackendKind::from_url(&cfg.database_url) {
        BackendKind::Postgres => {
            let repo = PgRepo::connect(&cfg.database_url)?;
            execute(repo, &cfg, cli.cmd).await
        }
        BackendKind::Sqlite => {
            let repo = SqliteRepo::connect(&cfg.database_url)?;
            execute(repo, &cfg, cli.cmd).await
        }
    }
}

//! Bulk genre import CLI.
//!
//! Reads genre names from a file and upserts them idempotently: existing
//! names are left untouched, blank records are skipped and reported.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use librarium_core::database::CatalogDatabase;
use librarium_core::import::{DEFAULT_CHUNK_SIZE, GenreImporter};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    name = "import-genres",
    about = "Bulk-import genre names into the catalog"
)]
struct Args {
    /// A `.json` file holding an array of names (strings or objects with a
    /// `name` field), or a plain text file with one name per line.
    file: PathBuf,

    /// Number of names upserted per statement.
    #[arg(long, env = "IMPORT_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// PostgreSQL connection string.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

/// Extracts raw name records. Malformed entries become empty strings so the
/// importer counts them as skipped instead of aborting the batch.
fn read_records(path: &Path) -> anyhow::Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
        let parsed: Value = serde_json::from_str(&contents)
            .with_context(|| format!("invalid JSON in {}", path.display()))?;
        let Value::Array(entries) = parsed else {
            bail!("{} should contain an array of genres", path.display());
        };

        return Ok(entries
            .into_iter()
            .map(|entry| match entry {
                Value::String(name) => name,
                Value::Object(mut fields) => match fields.remove("name") {
                    Some(Value::String(name)) => name,
                    _ => String::new(),
                },
                _ => String::new(),
            })
            .collect());
    }

    Ok(contents.lines().map(|line| line.to_string()).collect())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let records = read_records(&args.file)?;
    info!(records = records.len(), file = %args.file.display(), "read genre records");

    let db = CatalogDatabase::connect(&args.database_url).await?;
    db.migrate().await?;

    let importer = GenreImporter::with_chunk_size(db.genres(), args.chunk_size);
    let report = importer.import(records).await?;

    info!(
        inserted = report.inserted,
        existing = report.existing,
        skipped = report.skipped,
        "import completed"
    );

    Ok(())
}

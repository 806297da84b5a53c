//! Idempotent bulk import of genre names.
//!
//! The record source (file parsing, CLI plumbing) is the caller's concern;
//! this service takes raw name strings, validates and deduplicates them, and
//! upserts chunk by chunk through the `GenresRepository` port. Re-running the
//! same batch never creates duplicates.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::database::ports::genres::GenresRepository;
use crate::error::Result;

pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Outcome of one import run. `skipped` counts malformed (blank) records;
/// `existing` counts names already present before this run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub inserted: u64,
    pub existing: u64,
    pub skipped: u64,
}

#[derive(Debug)]
pub struct GenreImporter<'a, R: GenresRepository + ?Sized> {
    repo: &'a R,
    chunk_size: usize,
}

impl<'a, R: GenresRepository + ?Sized> GenreImporter<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self {
            repo,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(repo: &'a R, chunk_size: usize) -> Self {
        Self {
            repo,
            chunk_size: chunk_size.max(1),
        }
    }

    pub async fn import<I>(&self, records: I) -> Result<ImportReport>
    where
        I: IntoIterator<Item = String>,
    {
        let mut skipped = 0u64;
        let mut seen = HashSet::new();
        let mut names = Vec::new();

        for raw in records {
            let name = raw.trim();
            if name.is_empty() {
                warn!("skipping genre record with empty name");
                skipped += 1;
                continue;
            }
            // Batch-internal duplicates collapse to one candidate.
            if seen.insert(name.to_string()) {
                names.push(name.to_string());
            }
        }

        let mut inserted = 0u64;
        let mut existing = 0u64;

        for chunk in names.chunks(self.chunk_size) {
            let added = self.repo.upsert_names(chunk).await?;
            inserted += added;
            existing += chunk.len() as u64 - added;
            info!(
                chunk_len = chunk.len(),
                inserted = added,
                "processed genre import chunk"
            );
        }

        info!(inserted, existing, skipped, "genre import completed");
        Ok(ImportReport {
            inserted,
            existing,
            skipped,
        })
    }
}

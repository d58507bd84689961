//! Seed script loading and batch splitting.
//!
//! A seed script is a single block of SQL text divided into batches by
//! separator lines (`GO` by default). The [`BatchSplitter`] trait is the seam
//! between script text and the runner, which only ever sees the resulting
//! ordered batch list.

mod splitter;

use std::path::Path;

pub use splitter::{BatchSplitter, DEFAULT_SEPARATOR, SeparatorSplitter};

use crate::error::SeedError;

/// Reads a seed script from disk.
pub async fn load_script(path: &Path) -> Result<String, SeedError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::ScriptRead {
            path: path.to_path_buf(),
            source,
        })
}

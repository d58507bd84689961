//! Fatal errors for a seeding run.
//!
//! Only conditions that stop a run are errors. A failed batch or an
//! unavailable verification check is recorded in the
//! [`SeedReport`](crate::report::SeedReport) instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::db::SessionError;

#[derive(Debug, Error)]
pub enum SeedError {
    /// The script could not be read; nothing was attempted.
    #[error("Failed to read seed script {}: {source}", path.display())]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The database could not be reached; no batches were attempted.
    #[error("Database connection failed: {0}")]
    Connection(#[source] SessionError),

    /// Batches ran but their work was not durably committed.
    #[error("Commit failed, seeding did not complete: {0}")]
    Commit(#[source] SessionError),
}

impl SeedError {
    /// Whether any batch was submitted before the run failed.
    pub fn batches_attempted(&self) -> bool {
        matches!(self, SeedError::Commit(_))
    }
}

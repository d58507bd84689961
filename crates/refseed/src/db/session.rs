//! Session traits used by the seeding runner.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Seed transaction already finished")]
    TransactionFinished,

    #[error("Session already closed")]
    Closed,

    #[error("{0}")]
    Other(String),
}

impl SessionError {
    /// SQLSTATE (or engine-specific) code reported by the database, if any.
    pub fn code(&self) -> Option<String> {
        match self {
            SessionError::Database(e) => e
                .as_database_error()
                .and_then(|db| db.code())
                .map(|code| code.into_owned()),
            _ => None,
        }
    }

    /// Message without the variant prefix, for reports.
    pub fn reason(&self) -> String {
        match self {
            SessionError::Database(sqlx::Error::Database(db)) => db.message().to_string(),
            SessionError::Database(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

/// One exclusively owned database session for a seeding run.
///
/// Calls are made strictly in sequence: every batch, then one `commit`, then
/// verification queries, then `close`.
#[async_trait]
pub trait SeedSession: Send {
    /// Executes one batch. A failure must leave the session usable for the
    /// next batch.
    async fn execute_batch(&mut self, sql: &str) -> Result<(), SessionError>;

    /// Commits all work done by successful batches.
    async fn commit(&mut self) -> Result<(), SessionError>;

    /// Runs a query returning a single integer.
    async fn query_count(&mut self, sql: &str) -> Result<i64, SessionError>;

    /// Releases the session. Must not fail.
    async fn close(&mut self);
}

/// Opens sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: SeedSession;

    async fn connect(&self) -> Result<Self::Session, SessionError>;
}

//! Batch execution with per-batch failure isolation.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::db::{Connector, SeedSession};
use crate::error::SeedError;
use crate::report::{BatchOutcome, BatchResult, SeedReport};
use crate::script::BatchSplitter;
use crate::verify::{self, VerificationCheck};

/// Executes batches in order on one session, commits once, then verifies.
///
/// # Example
///
/// ```rust,ignore
/// let session = PgConnector::new(url).connect().await?;
/// let batches = SeparatorSplitter::default().split(&script);
/// let report = SeedRunner::new().run(session, &batches).await?;
/// report.log_summary();
/// ```
#[derive(Debug, Clone)]
pub struct SeedRunner {
    checks: Vec<VerificationCheck>,
}

impl SeedRunner {
    /// Creates a runner with the default verification checks.
    pub fn new() -> Self {
        Self {
            checks: verify::default_checks(),
        }
    }

    /// Replaces the verification checks.
    pub fn with_checks(mut self, checks: Vec<VerificationCheck>) -> Self {
        self.checks = checks;
        self
    }

    pub fn checks(&self) -> &[VerificationCheck] {
        &self.checks
    }

    /// Runs every batch, commits, verifies, and closes the session.
    ///
    /// Batch failures are recorded and never stop the loop. A commit failure
    /// is returned as [`SeedError::Commit`]. The session is closed on every
    /// path.
    pub async fn run<S, I>(&self, mut session: S, batches: I) -> Result<SeedReport, SeedError>
    where
        S: SeedSession,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let started = Instant::now();

        let results = execute_batches(&mut session, batches).await;

        info!("Committing seed transaction...");
        if let Err(e) = session.commit().await {
            session.close().await;
            return Err(SeedError::Commit(e));
        }

        let verification = verify::run_checks(&mut session, &self.checks).await;
        session.close().await;

        Ok(SeedReport::new(results, verification, started.elapsed()))
    }
}

impl Default for SeedRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Attempts each batch exactly once, in order.
async fn execute_batches<S, I>(session: &mut S, batches: I) -> Vec<BatchResult>
where
    S: SeedSession,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut results = Vec::new();

    for (index, batch) in batches.into_iter().enumerate() {
        let sql = batch.as_ref();
        debug!("Executing batch {}", index + 1);

        let outcome = match session.execute_batch(sql).await {
            Ok(()) => BatchOutcome::Succeeded,
            Err(e) => {
                warn!("Batch {} failed: {}", index + 1, e.reason());
                BatchOutcome::failed(&e)
            }
        };
        results.push(BatchResult::new(index, sql, outcome));
    }

    info!(
        "Executed {} batches ({} failed)",
        results.len(),
        results.iter().filter(|r| r.outcome.is_failed()).count()
    );
    results
}

/// Connects, splits `script`, and runs it.
///
/// Connection failure returns [`SeedError::Connection`] before any batch is
/// attempted.
pub async fn seed_script<C, P>(
    connector: &C,
    splitter: &P,
    runner: &SeedRunner,
    script: &str,
) -> Result<SeedReport, SeedError>
where
    C: Connector,
    P: BatchSplitter + ?Sized,
{
    let session = connector.connect().await.map_err(SeedError::Connection)?;

    let batches = splitter.split(script);
    info!("Seeding {} batches...", batches.len());

    runner.run(session, &batches).await
}

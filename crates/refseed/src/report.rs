//! Seeding report: what each batch did and what verification found.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::db::SessionError;
use crate::verify::{CheckValue, VerificationResult};

const PREVIEW_LEN: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Succeeded,
    Failed {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
}

impl BatchOutcome {
    pub fn failed(err: &SessionError) -> Self {
        BatchOutcome::Failed {
            reason: err.reason(),
            code: err.code(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BatchOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    /// Zero-based position in the script.
    pub index: usize,
    /// First line of the batch, truncated.
    pub preview: String,
    pub outcome: BatchOutcome,
}

impl BatchResult {
    pub fn new(index: usize, sql: &str, outcome: BatchOutcome) -> Self {
        Self {
            index,
            preview: preview(sql),
            outcome,
        }
    }
}

/// Overall result of a run that reached commit.
///
/// A run that never started or failed to commit is a
/// [`SeedError`](crate::error::SeedError), not an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedOutcome {
    /// Every batch succeeded and every check produced a count.
    Clean,
    /// Some batches failed; verification is complete.
    BatchFailures,
    /// All batches succeeded; some checks could not run.
    VerificationInconclusive,
    BatchFailuresAndInconclusive,
}

impl SeedOutcome {
    fn classify(batch_failures: bool, inconclusive: bool) -> Self {
        match (batch_failures, inconclusive) {
            (false, false) => SeedOutcome::Clean,
            (true, false) => SeedOutcome::BatchFailures,
            (false, true) => SeedOutcome::VerificationInconclusive,
            (true, true) => SeedOutcome::BatchFailuresAndInconclusive,
        }
    }

    pub fn has_batch_failures(self) -> bool {
        matches!(
            self,
            SeedOutcome::BatchFailures | SeedOutcome::BatchFailuresAndInconclusive
        )
    }

    pub fn is_inconclusive(self) -> bool {
        matches!(
            self,
            SeedOutcome::VerificationInconclusive | SeedOutcome::BatchFailuresAndInconclusive
        )
    }
}

/// Report for one committed seeding run.
#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub outcome: SeedOutcome,
    pub batches: Vec<BatchResult>,
    pub verification: Vec<VerificationResult>,
    pub elapsed_ms: u64,
}

impl SeedReport {
    pub fn new(
        batches: Vec<BatchResult>,
        verification: Vec<VerificationResult>,
        elapsed: Duration,
    ) -> Self {
        let outcome = SeedOutcome::classify(
            batches.iter().any(|b| b.outcome.is_failed()),
            verification.iter().any(|v| v.value.is_unavailable()),
        );

        Self {
            outcome,
            batches,
            verification,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn attempted(&self) -> usize {
        self.batches.len()
    }

    pub fn succeeded(&self) -> usize {
        self.attempted() - self.failed()
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchResult> {
        self.batches.iter().filter(|b| b.outcome.is_failed())
    }

    /// Looks up a verification count by check name.
    pub fn count(&self, check: &str) -> Option<i64> {
        self.verification
            .iter()
            .find(|v| v.name == check)
            .and_then(|v| v.value.count())
    }

    /// Logs a human-readable summary.
    pub fn log_summary(&self) {
        info!("Seed completed in {} ms", self.elapsed_ms);
        info!(
            "  Batches: {} attempted, {} succeeded, {} failed",
            self.attempted(),
            self.succeeded(),
            self.failed()
        );

        for batch in self.failures() {
            if let BatchOutcome::Failed { reason, code } = &batch.outcome {
                match code {
                    Some(code) => warn!(
                        "  Batch {} failed [{}]: {} ({})",
                        batch.index + 1,
                        code,
                        reason,
                        batch.preview
                    ),
                    None => warn!(
                        "  Batch {} failed: {} ({})",
                        batch.index + 1,
                        reason,
                        batch.preview
                    ),
                }
            }
        }

        info!("Verification:");
        for result in &self.verification {
            match &result.value {
                CheckValue::Count(n) => info!("  {}: {}", result.name, n),
                CheckValue::Unavailable { .. } => {
                    warn!("  {}: unable to verify", result.name)
                }
            }
        }

        match self.outcome {
            SeedOutcome::Clean => info!("Outcome: all batches succeeded"),
            SeedOutcome::BatchFailures => warn!("Outcome: committed with batch failures"),
            SeedOutcome::VerificationInconclusive => {
                warn!("Outcome: committed, verification inconclusive")
            }
            SeedOutcome::BatchFailuresAndInconclusive => {
                warn!("Outcome: committed with batch failures, verification inconclusive")
            }
        }
    }
}

fn preview(sql: &str) -> String {
    let first = sql.lines().next().unwrap_or_default().trim();
    if first.chars().count() > PREVIEW_LEN {
        let cut: String = first.chars().take(PREVIEW_LEN).collect();
        format!("{cut}...")
    } else {
        first.to_string()
    }
}

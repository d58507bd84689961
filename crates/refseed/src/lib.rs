//! Reference data seeding for relational databases.
//!
//! A seed script is split into batches on `GO` separator lines, each batch is
//! executed in order on one session, failures are recorded per batch instead
//! of aborting the run, the work is committed once, and a fixed set of count
//! queries verifies the result.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use refseed::prelude::*;
//!
//! let config = SeedConfig::new(database_url, "database/seed.sql");
//! let report = refseed::run(&config).await?;
//! report.log_summary();
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod report;
pub mod runner;
pub mod script;
pub mod verify;

use tracing::info;

use crate::config::SeedConfig;
use crate::db::PgConnector;
use crate::error::SeedError;
use crate::report::SeedReport;
use crate::runner::{SeedRunner, seed_script};

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::SeedConfig;
    pub use crate::db::{Connector, PgConnector, PgSession, SeedSession, SessionError};
    pub use crate::error::SeedError;
    pub use crate::report::{BatchOutcome, BatchResult, SeedOutcome, SeedReport};
    pub use crate::runner::{SeedRunner, seed_script};
    pub use crate::script::{BatchSplitter, SeparatorSplitter, load_script};
    pub use crate::verify::{CheckValue, VerificationCheck, VerificationResult};
}

/// Loads the configured script and seeds it into PostgreSQL.
pub async fn run(config: &SeedConfig) -> Result<SeedReport, SeedError> {
    let script = script::load_script(&config.script_path).await?;
    info!(
        "Loaded seed script {} ({} bytes)",
        config.script_path.display(),
        script.len()
    );

    info!(
        "Connecting to database at {}",
        config.redacted_database_url()
    );
    let connector = PgConnector::new(config.database_url.as_str());
    let runner = SeedRunner::new().with_checks(config.checks.clone());

    seed_script(&connector, &config.splitter(), &runner, &script).await
}

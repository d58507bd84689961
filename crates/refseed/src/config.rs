//! Configuration for a seeding run.
//!
//! Nothing here has a built-in default for credentials or paths; callers
//! supply them (the `seed` binary reads flags or environment variables).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::report::SeedOutcome;
use crate::script::{DEFAULT_SEPARATOR, SeparatorSplitter};
use crate::verify::{self, VerificationCheck};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Connection string for the target database.
    pub database_url: String,

    /// Path to the seed script.
    pub script_path: PathBuf,

    /// Batch separator token.
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Checks run after commit.
    #[serde(default = "verify::default_checks")]
    pub checks: Vec<VerificationCheck>,

    /// Treat batch failures as a failed run.
    #[serde(default)]
    pub strict: bool,

    /// Emit the report as JSON.
    #[serde(default)]
    pub json: bool,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

impl SeedConfig {
    pub fn new(database_url: impl Into<String>, script_path: impl Into<PathBuf>) -> Self {
        Self {
            database_url: database_url.into(),
            script_path: script_path.into(),
            separator: default_separator(),
            checks: verify::default_checks(),
            strict: false,
            json: false,
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_checks(mut self, checks: Vec<VerificationCheck>) -> Self {
        self.checks = checks;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Whether a committed run with this outcome should still fail.
    pub fn rejects(&self, outcome: SeedOutcome) -> bool {
        self.strict && outcome.has_batch_failures()
    }

    pub fn splitter(&self) -> SeparatorSplitter {
        SeparatorSplitter::new(self.separator.as_str())
    }

    /// Database URL with any password replaced, for logging.
    pub fn redacted_database_url(&self) -> String {
        redact_url(&self.database_url)
    }
}

fn redact_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://").map(|i| i + 3) else {
        return url.to_string();
    };
    let rest = &url[scheme_end..];
    let Some(at) = rest.find('@') else {
        return url.to_string();
    };

    let userinfo = &rest[..at];
    match userinfo.split_once(':') {
        Some((user, _password)) => {
            format!("{}{}:***{}", &url[..scheme_end], user, &rest[at..])
        }
        None => url.to_string(),
    }
}

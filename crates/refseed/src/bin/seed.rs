//! Seeds reference data from a GO-separated SQL script.
//!
//! Run with:
//! ```
//! DATABASE_URL=postgres://... cargo run -p refseed --bin seed -- database/seed.sql
//! ```
//!
//! Exits 0 once the run has committed, even if some batches failed. Exits
//! non-zero when the script cannot be read, the database is unreachable, or
//! the commit fails. `--strict` additionally exits 2 on batch failures.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use refseed::config::SeedConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Seed reference data from a GO-separated SQL script")]
struct Args {
    /// Path to the seed script
    #[arg(env = "SEED_SCRIPT")]
    script: PathBuf,

    /// Target database connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Batch separator token
    #[arg(long, env = "SEED_SEPARATOR", default_value = "GO")]
    separator: String,

    /// Print the report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Exit with status 2 if any batch failed
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = SeedConfig::new(args.database_url, args.script)
        .with_separator(args.separator)
        .with_strict(args.strict)
        .with_json(args.json);

    let report = refseed::run(&config).await?;
    report.log_summary();

    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if config.rejects(report.outcome) {
        return Ok(ExitCode::from(2));
    }

    Ok(ExitCode::SUCCESS)
}

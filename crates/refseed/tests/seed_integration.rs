//! Integration tests for seeding against a live PostgreSQL database.
//!
//! To run these tests, set DATABASE_URL to a database the tests may create
//! and drop tables in:
//!
//! Run with: `DATABASE_URL=postgres://... cargo nextest run -p refseed seed_integration`
//!
//! Tests that create tables use a uniquely named one and drop it afterwards.

use std::env;

use refseed::prelude::*;
use sqlx::{PgPool, postgres::PgPoolOptions};
use uuid::Uuid;

/// Get database URL and a cleanup pool, skipping tests if DATABASE_URL is not set.
async fn get_test_db() -> Option<(String, PgPool)> {
    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: DATABASE_URL not set");
            return None;
        }
    };

    match PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
    {
        Ok(pool) => Some((database_url, pool)),
        Err(e) => {
            eprintln!("Skipping test: Failed to connect to database: {e}");
            None
        }
    }
}

fn unique_table() -> String {
    format!("refseed_it_{}", Uuid::new_v4().simple())
}

async fn drop_table(pool: &PgPool, table: &str) {
    sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
        .execute(pool)
        .await
        .expect("Failed to drop test table");
}

fn script_for(table: &str) -> String {
    format!(
        "CREATE TABLE {table} (id INT PRIMARY KEY, name TEXT NOT NULL);\n\
         GO\n\
         INSERT INTO {table} VALUES (1, 'Lead Status');\n\
         GO\n\
         INSERT INTO {table} VALUES (;\n\
         GO\n\
         INSERT INTO {table} VALUES (2, 'Lead Source');\n\
         INSERT INTO {table} VALUES (3, 'Industry');\n\
         GO\n"
    )
}

#[tokio::test]
async fn test_failed_batch_is_isolated() {
    let Some((url, pool)) = get_test_db().await else {
        return;
    };
    let table = unique_table();

    let runner = SeedRunner::new().with_checks(vec![
        VerificationCheck::new("row_count", format!("SELECT COUNT(*) FROM {table}")),
        VerificationCheck::new("missing", "SELECT COUNT(*) FROM refseed_no_such_table"),
    ]);

    let result = seed_script(
        &PgConnector::new(url),
        &SeparatorSplitter::default(),
        &runner,
        &script_for(&table),
    )
    .await;
    drop_table(&pool, &table).await;

    let report = result.expect("Seeding should reach commit");
    assert_eq!(report.attempted(), 4);
    assert_eq!(report.failed(), 1);

    match &report.batches[2].outcome {
        BatchOutcome::Failed { code, .. } => assert_eq!(code.as_deref(), Some("42601")),
        BatchOutcome::Succeeded => panic!("Malformed INSERT should fail"),
    }

    // Rows from batches after the failure were committed.
    assert_eq!(report.count("row_count"), Some(3));
    assert!(report.verification[1].value.is_unavailable());
    assert_eq!(report.outcome, SeedOutcome::BatchFailuresAndInconclusive);
}

#[tokio::test]
async fn test_rerun_records_already_exists_failures() {
    let Some((url, pool)) = get_test_db().await else {
        return;
    };
    let table = unique_table();
    let script = script_for(&table);
    let runner = SeedRunner::new().with_checks(vec![VerificationCheck::new(
        "row_count",
        format!("SELECT COUNT(*) FROM {table}"),
    )]);
    let connector = PgConnector::new(url);
    let splitter = SeparatorSplitter::default();

    let first = seed_script(&connector, &splitter, &runner, &script).await;
    let second = seed_script(&connector, &splitter, &runner, &script).await;
    drop_table(&pool, &table).await;

    assert_eq!(first.expect("First run should commit").failed(), 1);

    let second = second.expect("Rerun should still commit");
    assert_eq!(second.attempted(), 4);
    // CREATE TABLE, both INSERT batches and the malformed batch all fail.
    assert_eq!(second.failed(), 4);
    assert_eq!(second.count("row_count"), Some(3));
}

#[tokio::test]
async fn test_batch_with_own_commit_does_not_halt_later_batches() {
    let Some((url, pool)) = get_test_db().await else {
        return;
    };
    let table = unique_table();
    let script = format!(
        "CREATE TABLE {table} (id INT PRIMARY KEY);\n\
         GO\n\
         BEGIN;\n\
         INSERT INTO {table} VALUES (1);\n\
         COMMIT;\n\
         GO\n\
         INSERT INTO {table} VALUES (2);\n\
         GO\n\
         INSERT INTO {table} VALUES (;\n\
         GO\n\
         INSERT INTO {table} VALUES (3);\n"
    );
    let runner = SeedRunner::new().with_checks(vec![VerificationCheck::new(
        "row_count",
        format!("SELECT COUNT(*) FROM {table}"),
    )]);

    let result = seed_script(
        &PgConnector::new(url),
        &SeparatorSplitter::default(),
        &runner,
        &script,
    )
    .await;
    drop_table(&pool, &table).await;

    let report = result.expect("Seeding should reach commit");
    assert_eq!(report.attempted(), 5);
    assert_eq!(report.batches[1].outcome, BatchOutcome::Succeeded);
    assert_eq!(report.batches[2].outcome, BatchOutcome::Succeeded);
    assert!(report.batches[3].outcome.is_failed());
    assert_eq!(report.batches[4].outcome, BatchOutcome::Succeeded);
    assert_eq!(report.count("row_count"), Some(3));
}

#[tokio::test]
async fn test_checks_accept_narrow_integer_columns() {
    let Some((url, _pool)) = get_test_db().await else {
        return;
    };
    let runner = SeedRunner::new().with_checks(vec![
        VerificationCheck::new("int2", "SELECT 4::smallint"),
        VerificationCheck::new("int4", "SELECT 5::int"),
        VerificationCheck::new("int8", "SELECT COUNT(*) FROM (VALUES (1), (2)) AS v(x)"),
        VerificationCheck::new("text", "SELECT 'six'"),
    ]);

    let report = seed_script(
        &PgConnector::new(url),
        &SeparatorSplitter::default(),
        &runner,
        "SELECT 1;",
    )
    .await
    .expect("Seeding should reach commit");

    assert_eq!(report.count("int2"), Some(4));
    assert_eq!(report.count("int4"), Some(5));
    assert_eq!(report.count("int8"), Some(2));
    assert!(report.verification[3].value.is_unavailable());
}

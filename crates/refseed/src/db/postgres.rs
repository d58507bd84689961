//! PostgreSQL session on a single pooled connection.

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPoolOptions, PgQueryResult, PgRow};
use sqlx::{Column, Executor, PgConnection, PgPool, Postgres, Row, TypeInfo};
use tracing::{debug, info, warn};

use super::session::{Connector, SeedSession, SessionError};

/// SQLSTATE `no_active_sql_transaction`.
const NO_ACTIVE_TRANSACTION: &str = "25P01";

const SAVEPOINT: &str = "SAVEPOINT refseed_batch";
const RELEASE_SAVEPOINT: &str = "RELEASE SAVEPOINT refseed_batch";
const ROLLBACK_TO_SAVEPOINT: &str = "ROLLBACK TO SAVEPOINT refseed_batch";

/// Connects with a single-connection pool.
#[derive(Debug, Clone)]
pub struct PgConnector {
    database_url: String,
}

impl PgConnector {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Session = PgSession;

    async fn connect(&self) -> Result<Self::Session, SessionError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(&self.database_url)
            .await?;

        info!("Connected to database");
        PgSession::new(pool).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    /// No seed transaction open yet.
    Idle,
    Open,
    Committed,
}

/// Runs batches inside one seed transaction, each behind its own savepoint.
///
/// The transaction is opened lazily before the first batch. A failing batch
/// rolls back to its savepoint, which keeps the transaction open for the
/// batches after it.
///
/// A batch may end the transaction itself (`BEGIN; ... COMMIT;`). Its
/// `COMMIT` then also commits the work of every earlier batch in the same
/// transaction. The session notices the missing transaction when releasing
/// the savepoint, records the batch as succeeded, and opens a fresh
/// transaction for the next batch. A batch-level `ROLLBACK` likewise discards
/// earlier uncommitted batches.
pub struct PgSession {
    pool: PgPool,
    conn: Option<PoolConnection<Postgres>>,
    state: TxState,
}

impl PgSession {
    /// Takes the pool's connection for the lifetime of the session.
    pub async fn new(pool: PgPool) -> Result<Self, SessionError> {
        let conn = pool.acquire().await?;
        Ok(Self {
            pool,
            conn: Some(conn),
            state: TxState::Idle,
        })
    }

    fn conn(&mut self) -> Result<&mut PgConnection, SessionError> {
        self.conn.as_deref_mut().ok_or(SessionError::Closed)
    }

    async fn begin(&mut self) -> Result<(), SessionError> {
        run_sql(self.conn()?, "BEGIN").await?;
        self.state = TxState::Open;
        Ok(())
    }

    async fn open_savepoint(&mut self) -> Result<(), SessionError> {
        if self.state == TxState::Idle {
            self.begin().await?;
        }

        let opened = run_sql(self.conn()?, SAVEPOINT).await;
        match opened {
            Ok(_) => Ok(()),
            Err(e) if is_no_transaction(&e) => {
                debug!("Seed transaction was closed outside the session, reopening");
                self.begin().await?;
                run_sql(self.conn()?, SAVEPOINT).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SeedSession for PgSession {
    async fn execute_batch(&mut self, sql: &str) -> Result<(), SessionError> {
        if self.state == TxState::Committed {
            return Err(SessionError::TransactionFinished);
        }
        self.open_savepoint().await?;

        let executed = run_sql(self.conn()?, sql).await;
        match executed {
            Ok(result) => {
                debug!("Batch affected {} rows", result.rows_affected());
                let released = run_sql(self.conn()?, RELEASE_SAVEPOINT).await;
                match released {
                    Ok(_) => Ok(()),
                    Err(e) if is_no_transaction(&e) => {
                        warn!("Batch committed the seed transaction itself, opening a new one");
                        self.state = TxState::Idle;
                        Ok(())
                    }
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => {
                let rolled_back = run_sql(self.conn()?, ROLLBACK_TO_SAVEPOINT).await;
                match rolled_back {
                    Ok(_) => {}
                    Err(rollback) if is_no_transaction(&rollback) => self.state = TxState::Idle,
                    Err(rollback) => warn!("Rollback to savepoint failed: {rollback}"),
                }
                Err(e.into())
            }
        }
    }

    async fn commit(&mut self) -> Result<(), SessionError> {
        match self.state {
            TxState::Committed => Err(SessionError::TransactionFinished),
            TxState::Idle => {
                self.state = TxState::Committed;
                Ok(())
            }
            TxState::Open => {
                // COMMIT of an aborted transaction reports success and rolls back.
                run_sql(self.conn()?, "SELECT 1").await?;
                run_sql(self.conn()?, "COMMIT").await?;
                self.state = TxState::Committed;
                Ok(())
            }
        }
    }

    async fn query_count(&mut self, sql: &str) -> Result<i64, SessionError> {
        let fetched = Executor::fetch_one(self.conn()?, sqlx::query(sql)).await;
        decode_count(&fetched?)
    }

    async fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            if self.state == TxState::Open
                && let Err(e) = run_sql(&mut conn, "ROLLBACK").await
            {
                warn!("Rollback of unfinished seed transaction failed: {e}");
            }
            drop(conn);
        }
        self.pool.close().await;
        info!("Database connection closed");
    }
}

/// Runs `sql` over the simple-query protocol, so one call may hold several
/// statements.
fn run_sql<'c>(
    conn: &'c mut PgConnection,
    sql: &'c str,
) -> impl Future<Output = Result<PgQueryResult, sqlx::Error>> + Send + 'c {
    Executor::execute(conn, sqlx::raw_sql(sql))
}

fn is_no_transaction(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == NO_ACTIVE_TRANSACTION)
}

/// Reads the first column as an integer of any width.
fn decode_count(row: &PgRow) -> Result<i64, SessionError> {
    let column = row.try_column(0)?;
    let count = match column.type_info().name() {
        "INT2" => i64::from(row.try_get::<i16, _>(0)?),
        "INT4" => i64::from(row.try_get::<i32, _>(0)?),
        _ => row.try_get::<i64, _>(0)?,
    };
    Ok(count)
}

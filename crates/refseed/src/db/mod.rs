//! Database collaborator for seeding.
//!
//! The runner talks to the database only through [`SeedSession`], so the
//! PostgreSQL implementation in [`postgres`] can be swapped for another
//! engine or an in-memory fake.

mod postgres;
mod session;

pub use postgres::{PgConnector, PgSession};
pub use session::{Connector, SeedSession, SessionError};

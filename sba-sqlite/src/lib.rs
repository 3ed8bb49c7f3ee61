#![warn(missing_docs)]
//! SQLite adapter for the auction engine.
//!
//! Implements every `sba-core` port over one SQLite database: the five
//! aggregates, the append-only ledger, the delayed job queue, and the
//! distributed lock. Keeping the queue and lock in the same database as the
//! aggregates is what lets a settlement commit its follow-up job atomically.
//!
//! The database is opened with separate reader and writer pools. The reader
//! allows concurrent reads; the writer is capped to one connection, which
//! serializes writes the way SQLite wants them under WAL.

use sqlx::sqlite;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::try_join;

pub mod config;
mod r#impl;
mod types;

use config::SqliteConfig;

/// Database operations fail for several unrelated reasons; this is the
/// unified error type the port implementations return.
#[derive(Debug, Error)]
pub enum Error {
    /// Error from SQLite operations.
    #[error("sql error: {0}")]
    Sql(#[from] sqlx::Error),

    /// Error during database migrations.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Error in JSON serialization of a job payload.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored id failed to parse back into a UUID.
    #[error("invalid stored id: {0}")]
    Id(#[from] uuid::Error),

    /// A row held a value the domain model cannot represent.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// A row the operation depends on does not exist.
    #[error("missing {0} row")]
    MissingRow(&'static str),
}

/// SQLite-backed store implementing all auction engine ports.
#[derive(Debug, Clone)]
pub struct Db {
    /// Connection pool for read operations.
    pub reader: sqlx::Pool<sqlx::Sqlite>,
    /// Connection pool for write operations (capped to 1 connection).
    pub writer: sqlx::Pool<sqlx::Sqlite>,
}

impl Db {
    /// Open a connection to the configured SQLite database.
    ///
    /// Creates the database if missing (when `create_if_missing` is set)
    /// and applies all pending migrations. Without a configured path the
    /// store lives in memory, shared between the two pools, which is what
    /// the tests run against.
    pub async fn open(config: &SqliteConfig) -> Result<Self, Error> {
        let target = match &config.database_path {
            Some(path) => path.to_string_lossy().into_owned(),
            // a unique name so concurrently open in-memory stores don't alias
            None => format!(
                "file:sba-{}?mode=memory&cache=shared",
                uuid::Uuid::new_v4().simple()
            ),
        };

        let options = sqlite::SqliteConnectOptions::from_str(&target)?
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            .journal_mode(sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlite::SqliteSynchronous::Normal)
            .pragma("journal_size_limit", "27103364")
            .pragma("mmap_size", "134217728")
            .pragma("temp_store", "memory")
            .create_if_missing(config.create_if_missing);

        let reader = sqlite::SqlitePoolOptions::new()
            .min_connections(1)
            .connect_with(options.clone());
        let writer = sqlite::SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .connect_with(options);

        let (reader, writer) = try_join!(reader, writer)?;

        // Run any pending migrations before returning
        sqlx::migrate!("./schema").run(&writer).await?;

        Ok(Self { reader, writer })
    }
}

impl sba_core::ports::Repository for Db {
    type Error = Error;
}

impl sba_core::ports::AuctionStore for Db {}

//! SQLite persistence layer for Fleetcheck.
//!
//! This crate provides async database operations for trucks, drivers,
//! checklist items, and check records using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{Database, truck};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:fleetcheck.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Register a truck
//!     let truck_id = truck::create_truck(db.pool(), "A-102", "Volvo FH16").await?;
//!     println!("truck {}", truck_id);
//!
//!     Ok(())
//! }
//! ```

pub mod check;
pub mod checklist;
pub mod driver;
pub mod error;
pub mod models;
pub mod truck;

pub use error::{DatabaseError, Result};
pub use models::{
    Annotation, AnnotationBody, CheckRecord, ChecklistItem, Driver, ItemStat,
    MediaAttachment, MediaFeedItem, NewCheck, PendingSummary, SkippedSummary, Truck,
};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    ///
    /// Modest on purpose: each driver's session serializes its own
    /// writes, so contention comes only from concurrent sessions and
    /// admin reads.
    const DEFAULT_POOL_SIZE: u32 = 8;

    /// Timeout for acquiring a connection. A slow acquire is surfaced
    /// to the user as a retryable store failure rather than a hang.
    const ACQUIRE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `sqlite::memory:` for tests.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema
    /// is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

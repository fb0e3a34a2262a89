//! SQLite persistence layer for Colloquy.
//!
//! This crate provides async database operations for conversations, their
//! append-only message logs, and per-user vendor API keys using SQLx with
//! SQLite.
//!
//! # Example
//!
//! ```no_run
//! use chat_core::Conversation;
//! use database::{conversation, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:colloquy.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let panel = Conversation::new(
//!         "auditor-1",
//!         Some("round table".to_string()),
//!         vec!["claude".to_string(), "chatgpt".to_string()],
//!         "Keep answers short.",
//!     );
//!     conversation::create_conversation(db.pool(), &panel).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod conversation;
pub mod credential;
pub mod error;
pub mod message;
pub mod models;

pub use error::{DatabaseError, Result};
pub use models::{ConversationRow, MessageRow};

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
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/colloquy.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        // Every connection to an in-memory SQLite database opens its own
        // database, so the pool must hold exactly one connection for
        // ":memory:" URLs or queries would land in empty shards.
        let pool_size = if url.contains(":memory:") {
            1
        } else {
            Self::DEFAULT_POOL_SIZE
        };
        Self::connect_with_pool_size(url, pool_size).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
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
    /// This should be called once after connecting to ensure the schema is up to date.
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

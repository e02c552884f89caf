//! Audit log storage for the gatekey system.
//!
//! This crate provides SQLite-backed persistence for gate operation records:
//! one row per attempted unlock/lock/sync, written unconditionally by the
//! operation orchestrator whatever the outcome.
//!
//! # Architecture
//!
//! - [`Database`] - connection pool manager with automatic migrations
//! - [`OperationLogRepository`] - data access trait (native async methods)
//! - [`SqliteOperationLogRepository`] - SQLite implementation
//!
//! The repository pattern keeps the orchestrator free of SQL and makes the
//! audit sink replaceable in tests. The pool is safe for concurrent appends
//! from simultaneous operations; SQLite runs in WAL mode for concurrent
//! read/write performance.
//!
//! # Example
//!
//! ```no_run
//! use gatekey_storage::{Database, DatabaseConfig};
//! use gatekey_storage::{OperationLogRepository, SqliteOperationLogRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DatabaseConfig::new("gatekey.db")
//!     .max_connections(10)
//!     .auto_migrate(true);
//! let db = Database::new(config).await?;
//!
//! let repo = SqliteOperationLogRepository::new(db.pool().clone());
//! let recent_failures = repo.find_recent_failed(20).await?;
//! for log in recent_failures {
//!     println!("{} {} failed: {:?}", log.device_id, log.operation, log.error_message);
//! }
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod models;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use models::OperationLog;
pub use repositories::{OperationLogRepository, SqliteOperationLogRepository};

//! SQLite storage implementation for TrackMyBudget.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository and unit-of-work traits defined in
//! `trackmybudget-core` and contains:
//! - Database connection pooling and migrations
//! - The single writer actor that serializes commits
//! - Per-request contexts that stage changes until commit
//! - Database-specific model types (with Diesel derives)
//!
//! ```text
//!   server (HTTP)
//!         │  UnitOfWorkFactoryTrait
//!         ▼
//!   storage-sqlite (this crate)
//!         │
//!         ▼
//!      SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;

pub mod budgets;
pub mod unit_of_work;

pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle, DEFAULT_POOL_SIZE, MIN_POOL_SIZE,
};
pub use unit_of_work::{SqliteUnitOfWorkFactory, UnitOfWork};

pub use errors::{IntoCore, StorageError};

pub use trackmybudget_core::errors::{DatabaseError, Error, Result};

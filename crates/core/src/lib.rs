//! TrackMyBudget Core - Domain entities and persistence contracts.
//!
//! This crate is database-agnostic. It defines the `Budget` entity, the
//! generic repository contract and the unit-of-work contract that the
//! `storage-sqlite` crate implements and the HTTP server consumes.

pub mod budgets;
pub mod errors;
pub mod repository;
pub mod unit_of_work;

pub use repository::{Entity, RepositoryTrait};
pub use unit_of_work::{UnitOfWorkFactoryTrait, UnitOfWorkTrait};

// Re-export error types
pub use errors::Error;
pub use errors::Result;

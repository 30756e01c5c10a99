//! Persistence layer for Progame.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - The transactional Postgres [`play_store::PgPlayStore`]

pub mod db;
pub mod entities;
pub mod metrics;
pub mod play_store;
pub mod repositories;

pub use play_store::PgPlayStore;

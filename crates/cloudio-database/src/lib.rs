//! # cloudio-database
//!
//! The owner-scoped [`EntityStore`] contract for folder and file records,
//! with a PostgreSQL backend for production and an in-memory backend for
//! development and tests.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryEntityStore;
pub use postgres::PgEntityStore;
pub use store::{ChangeSet, EntityStore, EntryPatch, Mutation, SearchHits, TypeTotals};

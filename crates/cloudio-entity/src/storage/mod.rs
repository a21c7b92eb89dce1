//! Storage usage value objects.

pub mod usage;

pub use usage::{StorageUsage, TypeUsage};

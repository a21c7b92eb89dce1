//! Storage usage reporting.

pub mod usage;

pub use usage::UsageService;

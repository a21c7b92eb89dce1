//! # cloudio-api
//!
//! HTTP API layer for Cloudio built on Axum.
//!
//! Exposes the folder and file operations of `cloudio-service` as JSON
//! routes under `/api`, authenticates callers by bearer token, and serves
//! locally stored blobs behind signed URLs.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::run_server;
pub use router::build_router;
pub use state::AppState;

//! End-to-end tests driving the HTTP API over the in-memory entity store
//! and a temporary local blob store.

mod auth_test;
mod file_test;
mod folder_test;
mod helpers;

//! Mutation orchestration for folders and files.

mod copy;
mod delete;
mod service;

pub use service::ItemService;

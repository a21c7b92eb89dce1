//! Core type definitions used across the Cloudio workspace.

pub mod id;
pub mod item;

pub use id::*;
pub use item::{ItemKind, ItemRef};

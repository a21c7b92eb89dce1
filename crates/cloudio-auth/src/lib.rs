//! # cloudio-auth
//!
//! Verification of the session tokens issued by the external identity
//! provider. A verified token yields the caller's [`OwnerId`]; Cloudio keeps
//! no user records or sessions of its own.
//!
//! [`OwnerId`]: cloudio_core::types::OwnerId

pub mod jwt;

pub use jwt::{Claims, JwtDecoder};

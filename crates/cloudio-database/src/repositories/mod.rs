//! SQL for the `folders` and `files` tables.
//!
//! Reads run against the pool; writes take a connection so the caller can
//! group them in one transaction.

pub mod file;
pub mod folder;

pub use file::FileRepository;
pub use folder::FolderRepository;

use cloudio_core::error::{AppError, ErrorKind};
use cloudio_core::types::ItemKind;

/// Wrap an unexpected driver error.
pub(crate) fn db_error(context: &'static str, e: sqlx::Error) -> AppError {
    AppError::with_source(ErrorKind::DependencyFailure, context, e)
}

/// Map an insert or update failure, turning a sibling-name unique violation
/// into a conflict.
pub(crate) fn write_error(kind: ItemKind, name: Option<&str>, e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => match name {
            Some(name) => AppError::conflict(format!(
                "A {kind} named '{name}' already exists in this location"
            )),
            None => AppError::conflict(format!(
                "A {kind} with the same name already exists in this location"
            )),
        },
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            AppError::not_found("Parent folder not found")
        }
        _ => db_error("Failed to write record", e),
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

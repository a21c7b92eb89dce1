//! Naming policy for folders and files.
//!
//! Names must be usable on every common desktop filesystem, so the rules
//! follow the strictest of them (Windows): no control characters, none of
//! `< > : " / \ | ? *`, no reserved device names, at most 255 characters.

use std::collections::HashSet;

use thiserror::Error;

use cloudio_core::error::AppError;

/// Maximum name length in characters.
pub const MAX_NAME_LENGTH: usize = 255;

/// Characters that may not appear anywhere in a name.
const FORBIDDEN_CHARACTERS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Device names reserved on Windows, with or without an extension.
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Why a name was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameViolation {
    /// The name is empty or only whitespace.
    #[error("Name cannot be empty")]
    Empty,
    /// The name contains a control or reserved character.
    #[error("Name contains an invalid character: {0:?}")]
    ForbiddenCharacter(char),
    /// The name (before its first '.') is a reserved device name.
    #[error("'{0}' is a reserved name")]
    ReservedName(String),
    /// The name is longer than [`MAX_NAME_LENGTH`] characters.
    #[error("Name is too long ({0} characters, maximum {MAX_NAME_LENGTH})")]
    TooLong(usize),
}

impl From<NameViolation> for AppError {
    fn from(violation: NameViolation) -> Self {
        AppError::invalid_name(violation.to_string())
    }
}

/// Check `name` against the naming policy.
pub fn validate_name(name: &str) -> Result<(), NameViolation> {
    if name.trim().is_empty() {
        return Err(NameViolation::Empty);
    }

    if let Some(c) = name
        .chars()
        .find(|c| ('\u{0}'..='\u{1f}').contains(c) || FORBIDDEN_CHARACTERS.contains(c))
    {
        return Err(NameViolation::ForbiddenCharacter(c));
    }

    let stem = name.split('.').next().unwrap_or(name);
    if RESERVED_NAMES
        .iter()
        .any(|reserved| stem.eq_ignore_ascii_case(reserved))
    {
        return Err(NameViolation::ReservedName(stem.to_string()));
    }

    let length = name.chars().count();
    if length > MAX_NAME_LENGTH {
        return Err(NameViolation::TooLong(length));
    }

    Ok(())
}

/// Pick a name for a copy of `base` that does not collide with any of
/// `existing_sibling_names`.
///
/// Returns `"{base} (copy)"` when that is free. Otherwise finds the highest
/// `N` among siblings named `"{base} (copy)"` (counted as 1) or
/// `"{base} (copy N)"` and returns `"{base} (copy {N + 1})"`.
pub fn generate_copy_name<'a, I>(base: &str, existing_sibling_names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let first = format!("{base} (copy)");
    let numbered_prefix = format!("{base} (copy ");

    let names: HashSet<&str> = existing_sibling_names.into_iter().collect();
    if !names.contains(first.as_str()) {
        return first;
    }

    let highest = names
        .iter()
        .filter_map(|name| {
            if *name == first {
                return Some(1);
            }
            name.strip_prefix(numbered_prefix.as_str())?
                .strip_suffix(')')
                .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))?
                .parse::<u64>()
                .ok()
        })
        .max()
        .unwrap_or(1);

    format!("{base} (copy {})", highest.saturating_add(1))
}

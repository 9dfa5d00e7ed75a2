//! Canonical key normalization.
//!
//! # Invariants
//! - Canonical keys are non-empty, ASCII-only and lower-cased.
//! - Folding is ASCII-only and never depends on locale.

use crate::registry::error::{RegistryError, RegistryResult};

/// Converts key material into the canonical lookup key.
///
/// Non-string input is stringified through `ToString` first.
///
/// # Errors
/// - `InvalidName` when the stringified value is empty or contains any
///   non-ASCII character.
pub fn normalize(raw: impl ToString) -> RegistryResult<String> {
    let value = raw.to_string();
    if value.is_empty() || !value.is_ascii() {
        return Err(RegistryError::InvalidName(value));
    }
    Ok(value.to_ascii_lowercase())
}

/// Returns whether `raw` normalizes without error.
pub fn is_valid_name(raw: impl ToString) -> bool {
    normalize(raw).is_ok()
}

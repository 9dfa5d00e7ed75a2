//! Registry and construction error taxonomy.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Failure raised synchronously by registry lookups, mutations and
/// instance construction.
///
/// Every variant names the offending key or property so callers can surface
/// it directly (e.g. when abandoning a mod load).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Key material is empty or contains non-ASCII characters.
    InvalidName(String),
    /// `add` collided with an existing entry or alias.
    DuplicateName(String),
    /// `add` was handed an absent item.
    NullItem(String),
    /// Key or type could not be resolved.
    NotFound(String),
    /// Positional lookup past the end of the primary table.
    IndexRange { index: usize, len: usize },
    /// Descriptor data would shadow a method of the constructed type.
    PropertyClash { type_name: String, property: String },
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(value) => write!(
                f,
                "invalid registry name `{value}`: names must be non-empty ASCII"
            ),
            Self::DuplicateName(value) => write!(f, "registry name already in use: {value}"),
            Self::NullItem(value) => write!(f, "cannot register absent item under `{value}`"),
            Self::NotFound(value) => write!(f, "registry entry not found: {value}"),
            Self::IndexRange { index, len } => {
                write!(f, "registry index {index} out of range (size {len})")
            }
            Self::PropertyClash {
                type_name,
                property,
            } => write!(
                f,
                "property `{property}` clashes with a method of type `{type_name}`"
            ),
        }
    }
}

impl Error for RegistryError {}

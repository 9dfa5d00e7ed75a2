//! Case-insensitive named storage.
//!
//! # Responsibility
//! - Normalize key material into canonical keys.
//! - Store content under canonical keys with optional aliases.
//!
//! # Invariants
//! - Canonical keys are lower-cased ASCII.
//! - Alias resolution never takes more than one hop.

pub mod error;
pub mod key;
pub mod store;

//! Construction engine.
//!
//! Turns declarative descriptors into live instances of types held in a
//! type registry: resolve type, instantiate, clash-check, merge, init.

pub mod engine;
pub mod types;

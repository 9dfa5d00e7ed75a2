//! Mod content loading: discovers mod directories, parses their manifest and
//! content files, and installs them into registries one mod at a time.

pub mod manifest;
pub mod mod_loader;

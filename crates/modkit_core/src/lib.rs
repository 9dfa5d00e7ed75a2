//! Named content registry and descriptor-driven construction for mods.
//!
//! Content loaded from mod directories lands in case-insensitive registries;
//! the construction engine turns stored descriptors into live instances of
//! types held in a second registry.

pub mod construct;
pub mod loader;
pub mod logging;
pub mod registry;

pub use construct::engine::{Constructor, Descriptor, TypeSource, TYPE_FIELD};
pub use construct::types::{Instance, Method, TypeDef, INIT_HOOK};
pub use loader::manifest::ModManifest;
pub use loader::mod_loader::{LoadError, LoadReport, LoaderConfig, ModLoader};
pub use logging::{default_log_level, init_logging, logging_status};
pub use registry::error::{RegistryError, RegistryResult};
pub use registry::key::{is_valid_name, normalize};
pub use registry::store::{Registry, RegistryItem, REGISTRY_NAME_FIELD};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

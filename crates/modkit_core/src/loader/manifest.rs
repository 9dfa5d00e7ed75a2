//! Mod manifest declaration.

use crate::registry::store::RegistryItem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declarative description of one mod directory.
///
/// Only the JSON shape is checked; versions and content schemas are taken
/// as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModManifest {
    /// Registry name of the mod, e.g. `steel-works`.
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Extra content names, `alias -> content name`.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl ModManifest {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Human-facing title, falling back to the registry name.
    pub fn title(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

impl RegistryItem for ModManifest {}

#[cfg(test)]
mod tests {
    use super::ModManifest;

    #[test]
    fn parses_minimal_manifest() {
        let manifest = ModManifest::parse(r#"{ "name": "steel-works" }"#).expect("minimal manifest");
        assert_eq!(manifest.name, "steel-works");
        assert_eq!(manifest.title(), "steel-works");
        assert!(manifest.aliases.is_empty());
    }

    #[test]
    fn parses_optional_fields() {
        let manifest = ModManifest::parse(
            r#"{
                "name": "steel-works",
                "display_name": "Steel Works",
                "version": "whatever-goes",
                "aliases": { "old-wall": "steel-wall" }
            }"#,
        )
        .expect("full manifest");
        assert_eq!(manifest.title(), "Steel Works");
        assert_eq!(manifest.version.as_deref(), Some("whatever-goes"));
        assert_eq!(manifest.aliases["old-wall"], "steel-wall");
    }

    #[test]
    fn rejects_manifest_without_name() {
        assert!(ModManifest::parse(r#"{ "version": "1.0" }"#).is_err());
    }
}

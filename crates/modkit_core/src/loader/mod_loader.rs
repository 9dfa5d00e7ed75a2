//! Mod directory discovery and content installation.
//!
//! # Responsibility
//! - Find mod directories under a root and read their manifest and content.
//! - Install content through `Registry::add` / `Registry::alias`.
//!
//! # Invariants
//! - All file I/O and JSON parsing for one mod finish before any registry
//!   mutation.
//! - A mod either installs completely or leaves the registries as it found
//!   them, including aliases it overwrote.
//! - One failing mod never stops the others from loading.

use crate::construct::engine::Descriptor;
use crate::loader::manifest::ModManifest;
use crate::registry::error::{RegistryError, RegistryResult};
use crate::registry::key::normalize;
use crate::registry::store::Registry;
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const DEFAULT_MANIFEST_FILE: &str = "mod.json";
const DEFAULT_CONTENT_DIR: &str = "content";
const CONTENT_EXTENSION: &str = "json";

/// File layout expected inside each mod directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub manifest_file: String,
    pub content_dir: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            manifest_file: DEFAULT_MANIFEST_FILE.to_string(),
            content_dir: DEFAULT_CONTENT_DIR.to_string(),
        }
    }
}

/// Fatal error for one mod (or for discovery itself).
#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, source: io::Error },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Registry(RegistryError),
}

impl LoadError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to read `{}`: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "failed to parse `{}`: {source}", path.display())
            }
            Self::Registry(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Registry(err) => Some(err),
        }
    }
}

impl From<RegistryError> for LoadError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

/// Outcome of loading every mod under a root.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Canonical names of mods that installed completely.
    pub loaded: Vec<String>,
    /// Mod directories that failed, with the reason.
    pub failed: Vec<(PathBuf, LoadError)>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Reads mod directories and feeds their content into registries.
#[derive(Debug, Clone, Default)]
pub struct ModLoader {
    config: LoaderConfig,
}

#[derive(Default)]
struct Installed {
    content: Vec<String>,
    /// Alias name and the target it had before this mod overwrote it.
    aliases: Vec<(String, Option<String>)>,
}

impl ModLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Returns immediate subdirectories of `root` holding a manifest, sorted
    /// by path.
    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>, LoadError> {
        let entries = fs::read_dir(root).map_err(|source| LoadError::io(root, source))?;
        let mut dirs = Vec::new();
        for entry in entries {
            let path = entry.map_err(|source| LoadError::io(root, source))?.path();
            if path.is_dir() && path.join(&self.config.manifest_file).is_file() {
                dirs.push(path);
            }
        }
        dirs.sort();
        debug!(
            "event=mod_discover module=loader status=ok root={} count={}",
            root.display(),
            dirs.len()
        );
        Ok(dirs)
    }

    /// Loads one mod directory and returns the mod's canonical name.
    ///
    /// Content names come from file stems. On failure every entry this call
    /// installed is removed again.
    pub fn load_mod(
        &self,
        dir: &Path,
        mods: &mut Registry<ModManifest>,
        content: &mut Registry<Descriptor>,
    ) -> Result<String, LoadError> {
        let manifest_path = dir.join(&self.config.manifest_file);
        let manifest = ModManifest::parse(&read_file(&manifest_path)?).map_err(|source| {
            LoadError::Parse {
                path: manifest_path.clone(),
                source,
            }
        })?;

        let mut staged = Vec::new();
        for path in self.content_files(dir)? {
            let descriptor: Descriptor =
                serde_json::from_str(&read_file(&path)?).map_err(|source| LoadError::Parse {
                    path: path.clone(),
                    source,
                })?;
            staged.push((content_name(&path)?, descriptor));
        }

        let mod_name = normalize(&manifest.name)?;
        let aliases = manifest.aliases.clone();
        mods.add(&mod_name, manifest)?;

        let mut installed = Installed::default();
        if let Err(err) = install(staged, &aliases, content, &mut installed) {
            roll_back(&mod_name, installed, mods, content);
            return Err(err.into());
        }

        info!(
            "event=mod_load module=loader status=ok mod={mod_name} content={} aliases={}",
            installed.content.len(),
            installed.aliases.len()
        );
        Ok(mod_name)
    }

    /// Loads every discovered mod, collecting per-mod failures.
    ///
    /// # Errors
    /// - Only discovery failures are returned; mod failures land in the
    ///   report.
    pub fn load_all(
        &self,
        root: &Path,
        mods: &mut Registry<ModManifest>,
        content: &mut Registry<Descriptor>,
    ) -> Result<LoadReport, LoadError> {
        let mut report = LoadReport::default();
        for dir in self.discover(root)? {
            match self.load_mod(&dir, mods, content) {
                Ok(name) => report.loaded.push(name),
                Err(err) => {
                    error!(
                        "event=mod_load module=loader status=error dir={} error={err}",
                        dir.display()
                    );
                    report.failed.push((dir, err));
                }
            }
        }

        info!(
            "event=mod_load_all module=loader status=ok loaded={} failed={}",
            report.loaded.len(),
            report.failed.len()
        );
        Ok(report)
    }

    fn content_files(&self, dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
        let content_dir = dir.join(&self.config.content_dir);
        let mut files = Vec::new();
        if content_dir.is_dir() {
            collect_content_files(&content_dir, &mut files)?;
        }
        files.sort();
        Ok(files)
    }
}

fn install(
    staged: Vec<(String, Descriptor)>,
    aliases: &BTreeMap<String, String>,
    content: &mut Registry<Descriptor>,
    installed: &mut Installed,
) -> RegistryResult<()> {
    for (name, descriptor) in staged {
        content.add(&name, descriptor)?;
        installed.content.push(name);
    }
    for (alias, target) in aliases {
        let previous = content.alias(target, alias)?;
        installed.aliases.push((normalize(alias)?, previous));
    }
    Ok(())
}

fn roll_back(
    mod_name: &str,
    installed: Installed,
    mods: &mut Registry<ModManifest>,
    content: &mut Registry<Descriptor>,
) {
    let mut clean = true;
    for (alias, previous) in installed.aliases.into_iter().rev() {
        let undone = match previous {
            Some(target) => content.restore_alias(&alias, target),
            None => content.unalias(&alias).map(|_| ()),
        };
        if let Err(err) = undone {
            warn!("event=mod_rollback module=loader status=error mod={mod_name} alias={alias} error={err}");
            clean = false;
        }
    }
    for name in installed.content {
        if let Err(err) = content.remove(&name) {
            warn!("event=mod_rollback module=loader status=error mod={mod_name} content={name} error={err}");
            clean = false;
        }
    }
    if let Err(err) = mods.remove(mod_name) {
        warn!("event=mod_rollback module=loader status=error mod={mod_name} error={err}");
        clean = false;
    }
    let status = if clean { "ok" } else { "partial" };
    debug!("event=mod_rollback module=loader status={status} mod={mod_name}");
}

fn collect_content_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::io(dir, source))?;
    for entry in entries {
        let path = entry.map_err(|source| LoadError::io(dir, source))?.path();
        if path.is_dir() {
            collect_content_files(&path, files)?;
        } else if path
            .extension()
            .is_some_and(|extension| extension == CONTENT_EXTENSION)
        {
            files.push(path);
        }
    }
    Ok(())
}

fn content_name(path: &Path) -> Result<String, LoadError> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| RegistryError::InvalidName(path.display().to_string()))?;
    Ok(normalize(stem)?)
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::io(path, source))
}

#[cfg(test)]
mod tests {
    use super::{content_name, roll_back, Installed, LoadError, LoaderConfig};
    use crate::construct::engine::Descriptor;
    use crate::loader::manifest::ModManifest;
    use crate::registry::error::RegistryError;
    use crate::registry::store::Registry;
    use serde_json::json;
    use std::path::Path;

    #[test]
    fn default_config_uses_mod_json_and_content_dir() {
        let config = LoaderConfig::default();
        assert_eq!(config.manifest_file, "mod.json");
        assert_eq!(config.content_dir, "content");
    }

    #[test]
    fn config_fills_missing_fields_from_defaults() {
        let config: LoaderConfig =
            serde_json::from_str(r#"{ "content_dir": "data" }"#).expect("partial config");
        assert_eq!(config.manifest_file, "mod.json");
        assert_eq!(config.content_dir, "data");
    }

    #[test]
    fn content_name_is_normalized_file_stem() {
        let name = content_name(Path::new("/mods/steel/content/blocks/Steel-Wall.json"))
            .expect("ascii stem");
        assert_eq!(name, "steel-wall");
    }

    #[test]
    fn content_name_rejects_non_ascii_stem() {
        let err = content_name(Path::new("/mods/steel/content/mauer\u{e4}.json"))
            .expect_err("non-ascii stem must fail");
        assert!(matches!(
            err,
            LoadError::Registry(RegistryError::InvalidName(_))
        ));
    }

    #[test]
    fn roll_back_continues_past_missing_entries() {
        let mut mods: Registry<ModManifest> = Registry::new();
        mods.add("walls", ModManifest::parse(r#"{ "name": "walls" }"#).expect("manifest"))
            .expect("manifest registers");
        let mut content: Registry<Descriptor> = Registry::new();
        content.add("wall", json!({ "health": 5 })).expect("wall");
        content.add("door", json!({ "health": 9 })).expect("door");
        content.alias("wall", "gate").expect("gate alias");

        let installed = Installed {
            content: vec!["ghost".to_string(), "wall".to_string()],
            aliases: vec![
                ("phantom".to_string(), None),
                ("gate".to_string(), None),
            ],
        };
        roll_back("walls", installed, &mut mods, &mut content);

        assert!(mods.is_empty());
        assert_eq!(content.names().collect::<Vec<_>>(), vec!["door"]);
        assert!(content.aliases_for("wall").expect("aliases").is_empty());
    }
}

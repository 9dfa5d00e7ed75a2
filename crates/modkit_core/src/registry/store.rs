//! Name-keyed registry with alias indirection.
//!
//! # Responsibility
//! - Own the primary `name -> item` table in insertion order.
//! - Own a separate `alias -> name` table for lookup indirection.
//!
//! # Invariants
//! - Every public boundary normalizes its key material with `key::normalize`.
//! - An alias always targets a concrete entry at creation time, so resolution
//!   is at most one hop.
//! - Size, iteration, positional lookup and `name_of` only see concrete
//!   entries.
//! - Removing or renaming an entry does not repoint its aliases; they dangle
//!   until the caller re-aliases them.

use crate::registry::error::{RegistryError, RegistryResult};
use crate::registry::key::normalize;
use futures::future::{join_all, JoinAll};
use indexmap::IndexMap;
use log::debug;
use serde_json::Value;
use std::future::Future;

/// Object field that receives the canonical key when a JSON object is
/// installed in a registry.
pub const REGISTRY_NAME_FIELD: &str = "registry_name";

/// Hooks a registry uses on the values it stores.
pub trait RegistryItem {
    /// Whether this value stands for "no item" and must be rejected by `add`.
    fn is_absent(&self) -> bool {
        false
    }

    /// Writes the canonical key onto the value as a read-back field.
    ///
    /// Best-effort: an `Err` only produces a debug log line.
    fn stamp_name(&mut self, _name: &str) -> Result<(), String> {
        Err("value has no name slot".to_string())
    }
}

impl RegistryItem for Value {
    fn is_absent(&self) -> bool {
        self.is_null()
    }

    fn stamp_name(&mut self, name: &str) -> Result<(), String> {
        match self {
            Value::Object(fields) => {
                fields.insert(
                    REGISTRY_NAME_FIELD.to_string(),
                    Value::String(name.to_string()),
                );
                Ok(())
            }
            other => Err(format!("cannot stamp name onto non-object value {other}")),
        }
    }
}

/// Case-insensitive named store with optional alias indirection.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    entries: IndexMap<String, T>,
    aliases: IndexMap<String, String>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            aliases: IndexMap::new(),
        }
    }
}

impl<T: RegistryItem> Registry<T> {
    /// Installs `item` under the canonical form of `name`.
    ///
    /// # Errors
    /// - `InvalidName` when `name` does not normalize.
    /// - `NullItem` when `item` is absent.
    /// - `DuplicateName` when `name` already resolves to an entry, directly
    ///   or through a live alias.
    pub fn add(&mut self, name: impl ToString, mut item: T) -> RegistryResult<()> {
        let key = normalize(name)?;
        if item.is_absent() {
            return Err(RegistryError::NullItem(key));
        }
        if self.has_key(&key, false) {
            return Err(RegistryError::DuplicateName(key));
        }

        if let Err(reason) = item.stamp_name(&key) {
            debug!("event=registry_stamp module=registry status=skipped name={key} reason={reason}");
        }
        debug!("event=registry_add module=registry status=ok name={key}");
        self.entries.insert(key, item);
        Ok(())
    }

    /// Moves a concrete entry to a new name, appending it at the end of the
    /// insertion order.
    ///
    /// The new name is checked before the old entry is removed, so a failed
    /// rename leaves the registry untouched. The check ignores the entry
    /// itself and its own aliases, which stop resolving once it moves.
    pub fn rename(&mut self, name: impl ToString, new_name: impl ToString) -> RegistryResult<()> {
        let key = normalize(name)?;
        if !self.entries.contains_key(&key) {
            return Err(RegistryError::NotFound(key));
        }
        let new_key = normalize(new_name)?;
        if self.blocks_rename(&new_key, &key) {
            return Err(RegistryError::DuplicateName(new_key));
        }

        let item = self
            .entries
            .shift_remove(&key)
            .ok_or_else(|| RegistryError::NotFound(key.clone()))?;
        debug!("event=registry_rename module=registry status=ok from={key} to={new_key}");
        self.add(new_key, item)
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of concrete entries. Aliases are not counted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns whether `name` resolves to an entry.
    ///
    /// Never fails: unusable key material simply reports `false`.
    pub fn has(&self, name: impl ToString, exclude_aliases: bool) -> bool {
        match normalize(name) {
            Ok(key) => self.has_key(&key, exclude_aliases),
            Err(_) => false,
        }
    }

    /// Looks up an entry by name or alias.
    pub fn get(&self, name: impl ToString) -> RegistryResult<&T> {
        let key = normalize(name)?;
        if let Some(item) = self.entries.get(&key) {
            return Ok(item);
        }
        match self.aliases.get(&key) {
            Some(target) => self
                .entries
                .get(target)
                .ok_or(RegistryError::NotFound(key)),
            None => Err(RegistryError::NotFound(key)),
        }
    }

    /// Mutable counterpart of [`Registry::get`].
    pub fn get_mut(&mut self, name: impl ToString) -> RegistryResult<&mut T> {
        let key = normalize(name)?;
        let target = if self.entries.contains_key(&key) {
            key.clone()
        } else {
            match self.aliases.get(&key) {
                Some(target) => target.clone(),
                None => return Err(RegistryError::NotFound(key)),
            }
        };
        self.entries
            .get_mut(&target)
            .ok_or(RegistryError::NotFound(key))
    }

    /// Removes a concrete entry and returns it.
    pub fn remove(&mut self, name: impl ToString) -> RegistryResult<T> {
        let key = normalize(name)?;
        match self.entries.shift_remove(&key) {
            Some(item) => {
                debug!("event=registry_remove module=registry status=ok name={key}");
                Ok(item)
            }
            None => Err(RegistryError::NotFound(key)),
        }
    }

    /// Registers `alias` as another name for the concrete entry `name`.
    ///
    /// Aliases of aliases are refused with `NotFound`. An existing alias with
    /// the same name is overwritten and its previous target is returned.
    pub fn alias(
        &mut self,
        name: impl ToString,
        alias: impl ToString,
    ) -> RegistryResult<Option<String>> {
        let target = normalize(name)?;
        if !self.has_key(&target, true) {
            return Err(RegistryError::NotFound(target));
        }
        let alias = normalize(alias)?;

        let previous = self.aliases.insert(alias.clone(), target.clone());
        match previous.as_deref() {
            Some(old) if old != target => debug!(
                "event=registry_alias module=registry status=overwritten alias={alias} previous={old} target={target}"
            ),
            _ => debug!("event=registry_alias module=registry status=ok alias={alias} target={target}"),
        }
        Ok(previous)
    }

    /// Points an existing alias back at `target` without checking it.
    ///
    /// Keeps the alias's position. Used to undo an overwrite made by
    /// [`Registry::alias`].
    pub(crate) fn restore_alias(&mut self, alias: &str, target: String) -> RegistryResult<()> {
        match self.aliases.get_mut(alias) {
            Some(slot) => {
                *slot = target;
                Ok(())
            }
            None => Err(RegistryError::NotFound(alias.to_string())),
        }
    }

    /// Drops an alias and returns the name it pointed at.
    pub fn unalias(&mut self, alias: impl ToString) -> RegistryResult<String> {
        let key = normalize(alias)?;
        self.aliases
            .shift_remove(&key)
            .ok_or(RegistryError::NotFound(key))
    }

    /// Returns every alias pointing at `name`, in alias insertion order.
    pub fn aliases_for(&self, name: impl ToString) -> RegistryResult<Vec<&str>> {
        let key = normalize(name)?;
        Ok(self
            .aliases
            .iter()
            .filter(|(_, target)| target.as_str() == key.as_str())
            .map(|(alias, _)| alias.as_str())
            .collect())
    }

    /// Resolves an alias to its target name.
    ///
    /// Concrete names resolve to themselves. The alias table is consulted
    /// first, so a name that is both an alias and a concrete entry dealiases
    /// to the alias target even though [`Registry::get`] returns the entry.
    pub fn dealias(&self, alias: impl ToString) -> RegistryResult<String> {
        let key = normalize(alias)?;
        if !self.has_key(&key, false) {
            return Err(RegistryError::NotFound(key));
        }
        Ok(self.aliases.get(&key).cloned().unwrap_or(key))
    }

    /// Visits concrete entries in insertion order.
    pub fn for_each(&self, mut callback: impl FnMut(&T, &str)) {
        for (name, item) in &self.entries {
            callback(item, name.as_str());
        }
    }

    /// Starts one callback per concrete entry and joins them.
    ///
    /// Every callback is invoked before the returned handle is polled, and
    /// the futures then make progress together. Awaiting the handle waits
    /// for all of them.
    pub fn for_each_async<'a, F, Fut>(&'a self, mut callback: F) -> JoinAll<Fut>
    where
        F: FnMut(&'a str, &'a T) -> Fut,
        Fut: Future<Output = ()>,
    {
        join_all(
            self.entries
                .iter()
                .map(|(name, item)| callback(name.as_str(), item))
                .collect::<Vec<_>>(),
        )
    }

    /// Builds a registry with the same names and transformed values.
    ///
    /// Only concrete entries are carried over.
    pub fn map<U: RegistryItem>(
        &self,
        mut transform: impl FnMut(&T, &str) -> U,
    ) -> RegistryResult<Registry<U>> {
        let mut mapped = Registry::new();
        for (name, item) in &self.entries {
            mapped.add(name.as_str(), transform(item, name.as_str()))?;
        }
        Ok(mapped)
    }

    /// Returns the canonical name at `index` in insertion order.
    pub fn at(&self, index: usize) -> RegistryResult<&str> {
        self.entries
            .get_index(index)
            .map(|(name, _)| name.as_str())
            .ok_or(RegistryError::IndexRange {
                index,
                len: self.entries.len(),
            })
    }

    /// Finds the canonical name of a stored value by reference identity.
    ///
    /// Returns `None` for values not owned by this registry, even when an
    /// equal value is stored.
    pub fn name_of(&self, item: &T) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, stored)| std::ptr::eq(*stored, item))
            .map(|(name, _)| name.as_str())
    }

    /// Canonical names of concrete entries in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Concrete values in insertion order.
    pub fn iter(&self) -> indexmap::map::Values<'_, String, T> {
        self.entries.values()
    }

    fn blocks_rename(&self, new_key: &str, key: &str) -> bool {
        if new_key == key {
            return false;
        }
        if self.entries.contains_key(new_key) {
            return true;
        }
        self.aliases
            .get(new_key)
            .is_some_and(|target| target != key && self.entries.contains_key(target))
    }

    fn has_key(&self, key: &str, exclude_aliases: bool) -> bool {
        if self.entries.contains_key(key) {
            return true;
        }
        !exclude_aliases
            && self
                .aliases
                .get(key)
                .is_some_and(|target| self.entries.contains_key(target))
    }
}

impl<'a, T> IntoIterator for &'a Registry<T> {
    type Item = &'a T;
    type IntoIter = indexmap::map::Values<'a, String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//! Type blueprints and the instances built from them.
//!
//! # Invariants
//! - A type's method table is fixed once the type is registered; instances
//!   share it.
//! - Instance data never shadows a method: `Instance::set` and construction
//!   both refuse such fields.

use crate::registry::error::{RegistryError, RegistryResult};
use crate::registry::store::RegistryItem;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Method name invoked once after descriptor fields are merged.
pub const INIT_HOOK: &str = "init";

/// Behavior attached to a type.
pub type Method = fn(&mut Instance) -> RegistryResult<()>;

type MethodTable = BTreeMap<String, Method>;

/// Blueprint registered in a type registry.
#[derive(Debug, Clone)]
pub struct TypeDef {
    name: String,
    defaults: Map<String, Value>,
    methods: Arc<MethodTable>,
}

impl TypeDef {
    /// Creates a type with no fields or methods.
    ///
    /// Registering the type renames it to its canonical registry key.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            defaults: Map::new(),
            methods: Arc::new(MethodTable::new()),
        }
    }

    /// Adds a field every fresh instance starts with.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(name.into(), value);
        self
    }

    pub fn with_method(mut self, name: impl Into<String>, method: Method) -> Self {
        Arc::make_mut(&mut self.methods).insert(name.into(), method);
        self
    }

    /// Shorthand for registering the [`INIT_HOOK`] method.
    pub fn with_init(self, hook: Method) -> Self {
        self.with_method(INIT_HOOK, hook)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Zero-argument instantiation: default fields, shared methods.
    pub fn instantiate(&self) -> Instance {
        Instance {
            type_name: self.name.clone(),
            fields: self.defaults.clone(),
            methods: Arc::clone(&self.methods),
        }
    }
}

impl RegistryItem for TypeDef {
    fn stamp_name(&mut self, name: &str) -> Result<(), String> {
        self.name = name.to_string();
        Ok(())
    }
}

/// Runtime object produced by the construction engine.
#[derive(Debug, Clone)]
pub struct Instance {
    type_name: String,
    fields: Map<String, Value>,
    methods: Arc<MethodTable>,
}

impl Instance {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Sets or overwrites one data field.
    ///
    /// # Errors
    /// - `PropertyClash` when `field` names a method of this type.
    pub fn set(&mut self, field: impl Into<String>, value: Value) -> RegistryResult<()> {
        let field = field.into();
        if self.has_method(&field) {
            return Err(RegistryError::PropertyClash {
                type_name: self.type_name.clone(),
                property: field,
            });
        }
        self.fields.insert(field, value);
        Ok(())
    }

    /// Invokes a method of this instance's type.
    pub fn call(&mut self, method: &str) -> RegistryResult<()> {
        let Some(body) = self.methods.get(method).copied() else {
            return Err(RegistryError::NotFound(format!(
                "{}.{method}",
                self.type_name
            )));
        };
        body(self)
    }

    /// Shallow merge of already clash-checked fields.
    pub(crate) fn merge(&mut self, fields: Map<String, Value>) {
        for (field, value) in fields {
            self.fields.insert(field, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Instance, TypeDef};
    use crate::registry::error::{RegistryError, RegistryResult};
    use crate::registry::store::Registry;
    use serde_json::json;

    fn bump(instance: &mut Instance) -> RegistryResult<()> {
        let hits = instance.get("hits").and_then(|v| v.as_u64()).unwrap_or(0);
        instance.set("hits", json!(hits + 1))
    }

    #[test]
    fn instantiate_copies_defaults() {
        let def = TypeDef::new("turret").with_field("range", json!(110));
        let mut first = def.instantiate();
        let second = def.instantiate();

        first.set("range", json!(200)).expect("plain field is settable");
        assert_eq!(first.get("range"), Some(&json!(200)));
        assert_eq!(second.get("range"), Some(&json!(110)));
        assert_eq!(second.type_name(), "turret");
    }

    #[test]
    fn set_refuses_to_shadow_method() {
        let def = TypeDef::new("turret").with_method("bump", bump);
        let mut instance = def.instantiate();

        let err = instance
            .set("bump", json!(1))
            .expect_err("method name is not settable");
        assert_eq!(
            err,
            RegistryError::PropertyClash {
                type_name: "turret".to_string(),
                property: "bump".to_string(),
            }
        );
    }

    #[test]
    fn call_runs_method_and_reports_unknown_ones() {
        let def = TypeDef::new("turret").with_method("bump", bump);
        let mut instance = def.instantiate();

        instance.call("bump").expect("bump should run");
        instance.call("bump").expect("bump should run again");
        assert_eq!(instance.get("hits"), Some(&json!(2)));

        let err = instance.call("fire").expect_err("unknown method");
        assert_eq!(err, RegistryError::NotFound("turret.fire".to_string()));
    }

    #[test]
    fn registration_renames_type_to_canonical_key() {
        let mut types = Registry::new();
        types
            .add("Turret", TypeDef::new("whatever"))
            .expect("type registers");

        let def = types.get("turret").expect("registered type");
        assert_eq!(def.name(), "turret");
        assert_eq!(def.instantiate().type_name(), "turret");
    }
}

//! Descriptor-driven instance construction.
//!
//! # Responsibility
//! - Resolve a descriptor's `type` against a type source.
//! - Build a fresh instance and merge descriptor data onto it.
//!
//! # Invariants
//! - Construction is all-or-nothing: a type lookup failure or a property
//!   clash returns an error and no instance.
//! - Falsy descriptors are a no-op (`Ok(None)`), not a failure.
//! - The caller owns the returned instance; nothing is retained here.

use crate::construct::types::{Instance, TypeDef, INIT_HOOK};
use crate::registry::error::{RegistryError, RegistryResult};
use crate::registry::store::Registry;
use log::debug;
use serde_json::{Map, Value};

/// Declarative record carrying a type tag and initial field values.
pub type Descriptor = Value;

/// Descriptor member naming the type to instantiate.
pub const TYPE_FIELD: &str = "type";

/// Lookup seam for type definitions.
pub trait TypeSource {
    fn get_type(&self, name: &str) -> RegistryResult<&TypeDef>;
    fn has_type(&self, name: &str) -> bool;
}

impl TypeSource for Registry<TypeDef> {
    fn get_type(&self, name: &str) -> RegistryResult<&TypeDef> {
        self.get(name)
    }

    fn has_type(&self, name: &str) -> bool {
        self.has(name, false)
    }
}

/// Builds instances from descriptors using one type source.
pub struct Constructor<'t, S: TypeSource + ?Sized> {
    types: &'t S,
}

impl<'t, S: TypeSource + ?Sized> Constructor<'t, S> {
    pub fn new(types: &'t S) -> Self {
        Self { types }
    }

    /// Builds an instance from an inline descriptor.
    ///
    /// `default_type` is used when the descriptor carries no usable `type`.
    ///
    /// # Errors
    /// - `NotFound` when the descriptor names an unregistered type.
    /// - `PropertyClash` when a descriptor field names a method of the type.
    /// - Whatever the type's init hook returns.
    pub fn construct(
        &self,
        descriptor: &Descriptor,
        default_type: &TypeDef,
    ) -> RegistryResult<Option<Instance>> {
        if is_falsy(descriptor) {
            return Ok(None);
        }

        let type_def = match type_tag(descriptor) {
            Some(tag) => self.types.get_type(&tag)?,
            None => default_type,
        };
        let mut instance = type_def.instantiate();

        let fields = match descriptor {
            Value::Object(fields) => fields.clone(),
            _ => Map::new(),
        };
        if let Some(property) = fields.keys().find(|field| instance.has_method(field)) {
            return Err(RegistryError::PropertyClash {
                type_name: type_def.name().to_string(),
                property: property.clone(),
            });
        }
        let field_count = fields.len();
        instance.merge(fields);

        if instance.has_method(INIT_HOOK) {
            instance.call(INIT_HOOK)?;
        }

        debug!(
            "event=construct module=construct status=ok type={} fields={field_count}",
            instance.type_name()
        );
        Ok(Some(instance))
    }

    /// Looks up a stored descriptor by name and constructs it.
    pub fn create(
        &self,
        content: &Registry<Descriptor>,
        name: impl ToString,
        default_type: &TypeDef,
    ) -> RegistryResult<Option<Instance>> {
        let descriptor = content.get(name)?;
        self.construct(descriptor, default_type)
    }
}

impl Registry<Descriptor> {
    /// Constructs the descriptor stored under `name` against `types`.
    pub fn create<S: TypeSource + ?Sized>(
        &self,
        name: impl ToString,
        types: &S,
        default_type: &TypeDef,
    ) -> RegistryResult<Option<Instance>> {
        Constructor::new(types).create(self, name, default_type)
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn type_tag(descriptor: &Descriptor) -> Option<String> {
    match descriptor.get(TYPE_FIELD)? {
        tag if is_falsy(tag) => None,
        Value::String(name) => Some(name.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{is_falsy, type_tag, Constructor, TypeSource};
    use crate::construct::types::{Instance, TypeDef};
    use crate::registry::error::{RegistryError, RegistryResult};
    use crate::registry::store::Registry;
    use serde_json::json;

    fn fail_init(_instance: &mut Instance) -> RegistryResult<()> {
        Err(RegistryError::NotFound("power-grid".to_string()))
    }

    #[test]
    fn falsy_values_match_script_semantics() {
        for value in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(is_falsy(&value), "{value} should be falsy");
        }
        for value in [json!({}), json!([]), json!(1), json!("x"), json!(true)] {
            assert!(!is_falsy(&value), "{value} should be truthy");
        }
    }

    #[test]
    fn type_tag_ignores_falsy_and_stringifies_others() {
        assert_eq!(type_tag(&json!({ "type": "Wall" })), Some("Wall".to_string()));
        assert_eq!(type_tag(&json!({ "type": "" })), None);
        assert_eq!(type_tag(&json!({ "type": null })), None);
        assert_eq!(type_tag(&json!({ "type": 7 })), Some("7".to_string()));
        assert_eq!(type_tag(&json!({ "width": 2 })), None);
        assert_eq!(type_tag(&json!("wall")), None);
    }

    #[test]
    fn truthy_scalar_descriptor_yields_default_instance() {
        let types: Registry<TypeDef> = Registry::new();
        let default_type = TypeDef::new("content").with_field("health", json!(40));

        let instance = Constructor::new(&types)
            .construct(&json!(true), &default_type)
            .expect("construction should succeed")
            .expect("truthy descriptor builds an instance");
        assert_eq!(instance.type_name(), "content");
        assert_eq!(instance.get("health"), Some(&json!(40)));
        assert_eq!(instance.fields().len(), 1);
    }

    #[test]
    fn type_registry_is_a_type_source() {
        let mut types = Registry::new();
        types.add("Unit", TypeDef::new("unit")).expect("unit type");

        assert!(types.has_type("UNIT"));
        assert!(!types.has_type("block"));
        assert_eq!(types.get_type("unit").expect("unit").name(), "unit");
    }

    #[test]
    fn init_failure_aborts_construction() {
        let types: Registry<TypeDef> = Registry::new();
        let default_type = TypeDef::new("reactor").with_init(fail_init);

        let err = Constructor::new(&types)
            .construct(&json!({ "heat": 1 }), &default_type)
            .expect_err("init failure propagates");
        assert_eq!(err, RegistryError::NotFound("power-grid".to_string()));
    }
}

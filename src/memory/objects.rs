//! Objects and classes
//!
//! Objects are plain property bags addressed by [`ObjectId`]. An object may
//! be created from a [`Class`], in which case a property it does not own is
//! looked up on the class (one level, no chain). Writing such a property
//! gives the object its own copy, type-checked against the class default.

use super::value::{ObjectId, TypeTag, Value};
use crate::interpreter::errors::RuntimeError;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub kind: TypeTag,
    pub value: Value,
}

impl Property {
    fn new(value: Value) -> Self {
        let value = value.normalized();
        Property {
            kind: value.kind.clone(),
            value,
        }
    }
}

/// Class template: a fixed, ordered property set with defaults
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: String,
    properties: Vec<(String, Property)>,
    pub declared: bool,
}

impl Class {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|(prop, _)| prop == name)
            .map(|(_, p)| p)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties.iter().map(|(name, p)| (name.as_str(), p))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub class: Option<String>,
    properties: Vec<(String, Property)>,
}

impl Object {
    pub fn own_property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|(prop, _)| prop == name)
            .map(|(_, p)| p)
    }

    fn own_property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties
            .iter_mut()
            .find(|(prop, _)| prop == name)
            .map(|(_, p)| p)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties.iter().map(|(name, p)| (name.as_str(), p))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectStore {
    classes: FxHashMap<String, Class>,
    objects: Vec<Object>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_class(&mut self, name: &str) -> Result<(), RuntimeError> {
        match self.classes.get_mut(name) {
            Some(class) if class.declared => Err(RuntimeError::Reference(format!(
                "class '{}' is already declared",
                name
            ))),
            Some(class) => {
                // redeclared after a soft reset: its body runs again
                class.properties.clear();
                class.declared = true;
                Ok(())
            }
            None => {
                self.classes.insert(
                    name.to_string(),
                    Class {
                        name: name.to_string(),
                        properties: Vec::new(),
                        declared: true,
                    },
                );
                Ok(())
            }
        }
    }

    pub fn add_class_property(&mut self, class: &str, name: &str, default: Value) -> Result<(), RuntimeError> {
        let class = self
            .classes
            .get_mut(class)
            .ok_or_else(|| RuntimeError::Reference(format!("unknown class '{}'", class)))?;
        if class.property(name).is_some() {
            return Err(RuntimeError::Reference(format!(
                "class '{}' already has a property '{}'",
                class.name, name
            )));
        }
        class.properties.push((name.to_string(), Property::new(default)));
        Ok(())
    }

    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.get(name).filter(|c| c.declared)
    }

    pub fn create_object(&mut self, class: Option<&str>) -> Result<ObjectId, RuntimeError> {
        if let Some(name) = class {
            if self.class(name).is_none() {
                return Err(RuntimeError::Reference(format!("unknown class '{}'", name)));
            }
        }
        self.objects.push(Object {
            class: class.map(str::to_string),
            properties: Vec::new(),
        });
        Ok(self.objects.len() - 1)
    }

    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(id)
    }

    fn object_mut(&mut self, id: ObjectId) -> Result<&mut Object, RuntimeError> {
        self.objects
            .get_mut(id)
            .ok_or_else(|| RuntimeError::Internal(format!("dangling object reference #{}", id)))
    }

    /// Read a property: own value first, then the class default
    pub fn property(&self, id: ObjectId, name: &str) -> Result<&Value, RuntimeError> {
        let object = self
            .objects
            .get(id)
            .ok_or_else(|| RuntimeError::Internal(format!("dangling object reference #{}", id)))?;
        if let Some(prop) = object.own_property(name) {
            return Ok(&prop.value);
        }
        object
            .class
            .as_deref()
            .and_then(|class| self.classes.get(class))
            .and_then(|class| class.property(name))
            .map(|prop| &prop.value)
            .ok_or_else(|| RuntimeError::Reference(format!("object has no property '{}'", name)))
    }

    pub fn set_property(&mut self, id: ObjectId, name: &str, value: Value) -> Result<(), RuntimeError> {
        let value = value.normalized();
        let class_kind = {
            let object = self.object_mut(id)?;
            if let Some(prop) = object.own_property_mut(name) {
                if prop.kind != value.kind {
                    return Err(RuntimeError::Type(format!(
                        "property '{}' holds a {} and cannot be set to a {}",
                        name, prop.kind, value.kind
                    )));
                }
                prop.value = value;
                return Ok(());
            }
            object.class.clone()
        };

        if let Some(class_name) = class_kind {
            let class = self
                .classes
                .get(&class_name)
                .ok_or_else(|| RuntimeError::Reference(format!("unknown class '{}'", class_name)))?;
            let prop = class.property(name).ok_or_else(|| {
                RuntimeError::Reference(format!(
                    "class '{}' has no property '{}'",
                    class_name, name
                ))
            })?;
            if prop.kind != value.kind {
                return Err(RuntimeError::Type(format!(
                    "property '{}' of class '{}' is a {}, got a {}",
                    name, class_name, prop.kind, value.kind
                )));
            }
        }

        self.object_mut(id)?
            .properties
            .push((name.to_string(), Property::new(value)));
        Ok(())
    }

    /// Classes become redeclarable; objects are kept
    pub fn reset_pass(&mut self) {
        for class in self.classes.values_mut() {
            class.declared = false;
        }
    }

    pub fn clear(&mut self) {
        self.classes.clear();
        self.objects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::errors::ErrorKind;

    fn point_class() -> ObjectStore {
        let mut store = ObjectStore::new();
        store.declare_class("Point").unwrap();
        store.add_class_property("Point", "x", Value::number(0.0)).unwrap();
        store.add_class_property("Point", "label", Value::identifier("origin")).unwrap();
        store
    }

    #[test]
    fn test_class_default_fallback() {
        let mut store = point_class();
        let id = store.create_object(Some("Point")).unwrap();
        assert_eq!(store.property(id, "x").unwrap(), &Value::number(0.0));

        store.set_property(id, "x", Value::number(5.0)).unwrap();
        assert_eq!(store.property(id, "x").unwrap(), &Value::number(5.0));

        // the class default is untouched
        let other = store.create_object(Some("Point")).unwrap();
        assert_eq!(store.property(other, "x").unwrap(), &Value::number(0.0));
    }

    #[test]
    fn test_property_types_enforced() {
        let mut store = point_class();
        let id = store.create_object(Some("Point")).unwrap();
        let err = store.set_property(id, "x", Value::string("a")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        store.set_property(id, "label", Value::identifier("home")).unwrap();

        let err = store.set_property(id, "z", Value::number(1.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Reference);
    }

    #[test]
    fn test_classless_object_grows() {
        let mut store = ObjectStore::new();
        let id = store.create_object(None).unwrap();
        store.set_property(id, "hp", Value::number(10.0)).unwrap();
        assert_eq!(store.property(id, "hp").unwrap(), &Value::number(10.0));
        assert!(store.property(id, "mp").is_err());
    }

    #[test]
    fn test_unknown_class_and_redeclaration() {
        let mut store = point_class();
        assert!(store.create_object(Some("Line")).is_err());
        assert!(store.declare_class("Point").is_err());
        store.reset_pass();
        store.declare_class("Point").unwrap();
        assert!(store.class("Point").unwrap().property("x").is_none());
    }
}

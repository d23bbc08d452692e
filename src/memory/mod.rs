//! Memory model for the script interpreter
//!
//! This module provides the core memory abstractions:
//! - [`value`]: Tagged runtime values and extension-provided types
//! - [`stack`]: Call stack with read-only parameter frames
//! - [`symbols`]: Variables, functions, calls and iteration
//! - [`objects`]: Property-bag objects and their class templates
//!
//! # Accessors
//!
//! A reference may reach one level into the value it names:
//! ```text
//! \player.hp\   →  property `hp` of the object in `player`
//! \items.0\     →  first element of the group in `items`
//! ```
//! [`SymbolView`] implements this on top of the two stores.

pub mod objects;
pub mod stack;
pub mod symbols;
pub mod value;

use crate::interpreter::errors::RuntimeError;
use crate::parser::lexer::{Reference, ResolveReference};
use objects::ObjectStore;
use symbols::SymbolStore;
use value::Value;

/// Read-only view resolving `\name\` references during tokenization
pub struct SymbolView<'a> {
    pub symbols: &'a SymbolStore,
    pub objects: &'a ObjectStore,
}

impl ResolveReference for SymbolView<'_> {
    fn resolve(&self, reference: &Reference) -> Result<Value, RuntimeError> {
        let Some((base, accessor)) = reference.name.split_once('.') else {
            return self.symbols.lookup(&reference.name, reference.scope).cloned();
        };

        let value = self.symbols.lookup(base, reference.scope)?;
        if let Some(items) = value.as_group() {
            let index: usize = accessor.parse().map_err(|_| {
                RuntimeError::Reference(format!(
                    "group '{}' can only be indexed by a position, got '{}'",
                    base, accessor
                ))
            })?;
            return items.get(index).cloned().ok_or_else(|| {
                RuntimeError::Reference(format!(
                    "index {} is out of range for group '{}' of length {}",
                    index,
                    base,
                    items.len()
                ))
            });
        }

        match value.as_object() {
            Some(id) => self.objects.property(id, accessor).cloned().map_err(|err| match err {
                RuntimeError::Reference(_) => RuntimeError::Reference(format!(
                    "object '{}' has no property '{}'",
                    base, accessor
                )),
                other => other,
            }),
            None => Err(RuntimeError::Reference(format!(
                "'{}' is a {}, it has no member '{}'",
                base, value.kind, accessor
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::Scope;

    fn reference(name: &str) -> Reference {
        Reference {
            name: name.to_string(),
            scope: Scope::Default,
        }
    }

    #[test]
    fn test_member_access() {
        let mut symbols = SymbolStore::new();
        let mut objects = ObjectStore::new();
        let id = objects.create_object(None).unwrap();
        objects.set_property(id, "hp", Value::number(3.0)).unwrap();
        symbols
            .declare_variable("player", Some(Value::object(id)), false)
            .unwrap();
        symbols
            .declare_variable(
                "items",
                Some(Value::group(vec![Value::number(4.0), Value::number(5.0)])),
                false,
            )
            .unwrap();

        let view = SymbolView {
            symbols: &symbols,
            objects: &objects,
        };
        assert_eq!(view.resolve(&reference("player.hp")).unwrap(), Value::number(3.0));
        assert_eq!(view.resolve(&reference("items.1")).unwrap(), Value::number(5.0));
        assert!(view.resolve(&reference("items.2")).is_err());
        assert!(view.resolve(&reference("items.x")).is_err());
        assert!(view.resolve(&reference("player.mp")).is_err());
    }
}

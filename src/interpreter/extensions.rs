//! Extension registry
//!
//! An [`Extension`] plugs keywords, global variables, labels and value types
//! into an interpreter. Registration merges all four into the lookup tables
//! kept here. A keyword registered twice is shadowed: the later owner wins
//! and the earlier one is never called for it again.
//!
//! Extension keywords run with mutable access to the interpreter. While a
//! keyword runs, its extension is taken out of the registry slot and put back
//! afterwards, so an extension cannot re-enter itself.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::type_system::Descriptor;
use crate::memory::value::{CustomType, Value};
use crate::parser::lexer::Component;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// A keyword as declared by an extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSpec {
    pub name: String,
    pub descriptors: Vec<Descriptor>,
}

impl KeywordSpec {
    pub fn new(name: impl Into<String>, descriptors: Vec<Descriptor>) -> Self {
        KeywordSpec {
            name: name.into(),
            descriptors,
        }
    }
}

/// A label and the keywords it may prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSpec {
    pub name: String,
    pub applies_to: Vec<String>,
}

impl LabelSpec {
    pub fn new(name: impl Into<String>, applies_to: &[&str]) -> Self {
        LabelSpec {
            name: name.into(),
            applies_to: applies_to.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// One validated statement as handed to a keyword
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub keyword: String,
    pub labels: Vec<String>,
    pub args: Vec<Component>,
    /// 0-based line of the statement
    pub line: usize,
}

impl Invocation {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.args.get(index).map(|c| &c.value)
    }

    pub fn number(&self, index: usize) -> Option<f64> {
        self.value(index).and_then(Value::as_number)
    }

    /// Source text of an argument (display text for resolved references)
    pub fn text(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(|c| c.text.as_str())
    }
}

/// Provider of keywords, globals, labels and value types
pub trait Extension {
    /// Stable, non-empty identifier used by `[require <id>]`
    fn id(&self) -> &str;

    fn keywords(&self) -> Vec<KeywordSpec> {
        Vec::new()
    }

    fn globals(&self) -> Vec<(String, Value)> {
        Vec::new()
    }

    fn labels(&self) -> Vec<LabelSpec> {
        Vec::new()
    }

    /// Value types and literal classes (see [`CustomType::literal_class`])
    fn types(&self) -> Vec<CustomType> {
        Vec::new()
    }

    /// Run one of this extension's keywords
    fn call(
        &mut self,
        keyword: &str,
        interpreter: &mut Interpreter,
        invocation: &Invocation,
    ) -> Result<(), RuntimeError>;
}

struct Slot {
    id: String,
    extension: Option<Box<dyn Extension>>,
}

/// Keyword provided by a registered extension
#[derive(Debug, Clone)]
pub struct ExtensionKeyword {
    pub owner: usize,
    pub descriptors: Vec<Descriptor>,
}

#[derive(Default)]
pub struct ExtensionRegistry {
    slots: Vec<Slot>,
    keywords: FxHashMap<String, ExtensionKeyword>,
    labels: FxHashMap<String, FxHashSet<String>>,
    types: Vec<CustomType>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an extension; returns the globals it provides
    pub fn insert(&mut self, extension: Box<dyn Extension>) -> Result<Vec<(String, Value)>, RuntimeError> {
        let id = extension.id().trim().to_string();
        if id.is_empty() {
            return Err(RuntimeError::Environment(
                "extensions must provide a non-empty id".to_string(),
            ));
        }
        if self.requires_extension(&id) {
            return Err(RuntimeError::Environment(format!(
                "an extension with id '{}' is already registered",
                id
            )));
        }

        let owner = self.slots.len();
        for keyword in extension.keywords() {
            if let Some(previous) = self.keywords.get(&keyword.name) {
                debug!(
                    keyword = %keyword.name,
                    previous = %self.slots[previous.owner].id,
                    extension = %id,
                    "keyword shadowed"
                );
            }
            self.keywords.insert(
                keyword.name,
                ExtensionKeyword {
                    owner,
                    descriptors: keyword.descriptors,
                },
            );
        }
        for label in extension.labels() {
            self.add_label(&label);
        }
        self.types.extend(extension.types());
        let globals = extension.globals();

        debug!(extension = %id, "extension registered");
        self.slots.push(Slot {
            id,
            extension: Some(extension),
        });
        Ok(globals)
    }

    pub fn add_label(&mut self, label: &LabelSpec) {
        self.labels
            .entry(label.name.clone())
            .or_default()
            .extend(label.applies_to.iter().cloned());
    }

    /// Keywords a label may prefix, `None` if it is not a label
    pub fn label(&self, name: &str) -> Option<&FxHashSet<String>> {
        self.labels.get(name)
    }

    pub fn keyword(&self, name: &str) -> Option<&ExtensionKeyword> {
        self.keywords.get(name)
    }

    /// Id of the extension providing `keyword`
    pub fn keyword_owner(&self, keyword: &str) -> Option<&str> {
        self.keywords
            .get(keyword)
            .and_then(|k| self.slots.get(k.owner))
            .map(|slot| slot.id.as_str())
    }

    pub fn types(&self) -> &[CustomType] {
        &self.types
    }

    pub fn requires_extension(&self, id: &str) -> bool {
        self.slots.iter().any(|slot| slot.id == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.slots.iter().map(|slot| slot.id.clone()).collect()
    }

    /// Take an extension out of its slot for the duration of a call
    pub(crate) fn take(&mut self, owner: usize) -> Result<Box<dyn Extension>, RuntimeError> {
        let slot = self
            .slots
            .get_mut(owner)
            .ok_or_else(|| RuntimeError::Internal(format!("no extension in slot {}", owner)))?;
        slot.extension.take().ok_or_else(|| {
            RuntimeError::Internal(format!("extension '{}' re-entered while running", slot.id))
        })
    }

    pub(crate) fn restore(&mut self, owner: usize, extension: Box<dyn Extension>) {
        if let Some(slot) = self.slots.get_mut(owner) {
            slot.extension = Some(extension);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, Vec<KeywordSpec>);

    impl Extension for Named {
        fn id(&self) -> &str {
            self.0
        }

        fn keywords(&self) -> Vec<KeywordSpec> {
            self.1.clone()
        }

        fn labels(&self) -> Vec<LabelSpec> {
            vec![LabelSpec::new("filled", &["rect"])]
        }

        fn call(&mut self, _: &str, _: &mut Interpreter, _: &Invocation) -> Result<(), RuntimeError> {
            Ok(())
        }
    }

    #[test]
    fn test_rejects_anonymous_and_duplicate_ids() {
        let mut registry = ExtensionRegistry::new();
        assert!(registry.insert(Box::new(Named("", Vec::new()))).is_err());
        registry.insert(Box::new(Named("draw", Vec::new()))).unwrap();
        assert!(registry.insert(Box::new(Named("draw", Vec::new()))).is_err());
        assert!(registry.requires_extension("draw"));
        assert!(!registry.requires_extension("sound"));
    }

    #[test]
    fn test_later_keyword_shadows() {
        let mut registry = ExtensionRegistry::new();
        let rect = || vec![KeywordSpec::new("rect", Vec::new())];
        registry.insert(Box::new(Named("first", rect()))).unwrap();
        registry.insert(Box::new(Named("second", rect()))).unwrap();
        assert_eq!(registry.keyword_owner("rect"), Some("second"));
        assert!(registry.label("filled").unwrap().contains("rect"));
    }

    #[test]
    fn test_take_and_restore() {
        let mut registry = ExtensionRegistry::new();
        registry.insert(Box::new(Named("draw", Vec::new()))).unwrap();
        let extension = registry.take(0).unwrap();
        assert!(registry.take(0).is_err());
        registry.restore(0, extension);
        assert!(registry.take(0).is_ok());
    }
}

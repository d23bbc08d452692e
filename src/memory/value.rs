//! Runtime value representation
//!
//! This module defines [`Value`], the tagged value every token, variable and
//! argument carries. A value pairs a [`RawValue`] payload with a [`TypeTag`].
//! The tag is what the type discipline checks: once a variable has adopted a
//! tag, every later assignment must carry exactly the same tag.
//!
//! # Tags
//!
//! - Built-in tags: `number`, `string`, `boolean`, `group`, `object`, `relpos`,
//!   `identifier`, `comparator`
//! - [`TypeTag::Custom`]: any tag registered by an extension together with a
//!   predicate (see [`CustomType`])
//!
//! Bare words are tagged `identifier` while they travel through a statement.
//! When they are stored (variables, arguments, properties) they become plain
//! `string` values, see [`Value::normalized`].

use std::fmt;
use std::rc::Rc;

/// Index of an object in the object store
pub type ObjectId = usize;

/// Open, string-keyed type tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Number,
    String,
    Boolean,
    Group,
    Object,
    RelPos,
    Identifier,
    Comparator,
    Custom(String),
}

impl TypeTag {
    /// Map a tag name back to a tag. Unknown names become custom tags.
    pub fn from_name(name: &str) -> Self {
        match name {
            "number" => TypeTag::Number,
            "string" => TypeTag::String,
            "boolean" => TypeTag::Boolean,
            "group" => TypeTag::Group,
            "object" => TypeTag::Object,
            "relpos" => TypeTag::RelPos,
            "identifier" => TypeTag::Identifier,
            "comparator" => TypeTag::Comparator,
            other => TypeTag::Custom(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TypeTag::Number => "number",
            TypeTag::String => "string",
            TypeTag::Boolean => "boolean",
            TypeTag::Group => "group",
            TypeTag::Object => "object",
            TypeTag::RelPos => "relpos",
            TypeTag::Identifier => "identifier",
            TypeTag::Comparator => "comparator",
            TypeTag::Custom(name) => name,
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, TypeTag::Custom(_))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Untagged payload of a value
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Str(String),
    Bool(bool),
    Group(Vec<Value>),
    Object(ObjectId),
    RelPos(i64),
    Identifier(String),
}

/// A payload together with its type tag
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub raw: RawValue,
    pub kind: TypeTag,
}

impl Value {
    pub fn new(raw: RawValue, kind: TypeTag) -> Self {
        Value { raw, kind }
    }

    pub fn number(n: f64) -> Self {
        Value::new(RawValue::Number(n), TypeTag::Number)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::new(RawValue::Str(s.into()), TypeTag::String)
    }

    pub fn boolean(b: bool) -> Self {
        Value::new(RawValue::Bool(b), TypeTag::Boolean)
    }

    pub fn group(items: Vec<Value>) -> Self {
        Value::new(RawValue::Group(items), TypeTag::Group)
    }

    pub fn object(id: ObjectId) -> Self {
        Value::new(RawValue::Object(id), TypeTag::Object)
    }

    pub fn relpos(offset: i64) -> Self {
        Value::new(RawValue::RelPos(offset), TypeTag::RelPos)
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Value::new(RawValue::Identifier(name.into()), TypeTag::Identifier)
    }

    /// Text payload tagged with an extension-provided type
    pub fn custom(text: impl Into<String>, tag: &str) -> Self {
        Value::new(RawValue::Str(text.into()), TypeTag::Custom(tag.to_string()))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.raw {
            RawValue::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Text of a string, identifier or custom-tagged value
    pub fn as_text(&self) -> Option<&str> {
        match &self.raw {
            RawValue::Str(s) | RawValue::Identifier(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&[Value]> {
        match &self.raw {
            RawValue::Group(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self.raw {
            RawValue::Object(id) => Some(id),
            _ => None,
        }
    }

    /// Integral number as `i64`, `None` for fractions and non-numbers
    pub fn as_integer(&self) -> Option<i64> {
        self.as_number()
            .filter(|n| n.fract() == 0.0 && n.is_finite())
            .map(|n| n as i64)
    }

    /// Convert transient token tags into their stored form.
    ///
    /// Identifiers and comparator tokens become strings; group elements are
    /// normalized recursively.
    pub fn normalized(self) -> Value {
        match (self.raw, self.kind) {
            (RawValue::Identifier(s), _) => Value::string(s),
            (RawValue::Str(s), TypeTag::Comparator | TypeTag::Identifier) => Value::string(s),
            (RawValue::Group(items), kind) => Value::new(
                RawValue::Group(items.into_iter().map(Value::normalized).collect()),
                kind,
            ),
            (raw, kind) => Value { raw, kind },
        }
    }

    /// Equality on raw payloads. Strings compare equal to identifiers with
    /// the same text.
    pub fn raw_eq(&self, other: &Value) -> bool {
        match (&self.raw, &other.raw) {
            (RawValue::Group(a), RawValue::Group(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.raw_eq(y))
            }
            _ => match (self.as_text(), other.as_text()) {
                (Some(a), Some(b)) => a == b,
                _ => self.raw == other.raw,
            },
        }
    }

    /// Group membership by raw equality
    pub fn contains(&self, needle: &Value) -> bool {
        self.as_group()
            .is_some_and(|items| items.iter().any(|item| item.raw_eq(needle)))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raw {
            RawValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            RawValue::Str(s) | RawValue::Identifier(s) => f.write_str(s),
            RawValue::Bool(b) => write!(f, "{}", b),
            RawValue::Group(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            RawValue::Object(id) => write!(f, "<object #{}>", id),
            RawValue::RelPos(offset) => write!(f, "~{}", offset),
        }
    }
}

/// Predicate deciding whether a token belongs to a custom type
pub type TypePredicate = Rc<dyn Fn(&str) -> bool>;

/// Extension-registered value type
///
/// A plain custom type takes part in literal coercion. A literal class is
/// only consulted afterwards, to re-tag bare identifiers such as a set of
/// reserved words.
#[derive(Clone)]
pub struct CustomType {
    pub name: String,
    pub predicate: TypePredicate,
    pub literal_class: bool,
}

impl CustomType {
    pub fn new(name: impl Into<String>, predicate: impl Fn(&str) -> bool + 'static) -> Self {
        CustomType {
            name: name.into(),
            predicate: Rc::new(predicate),
            literal_class: false,
        }
    }

    pub fn literal_class(name: impl Into<String>, predicate: impl Fn(&str) -> bool + 'static) -> Self {
        CustomType {
            literal_class: true,
            ..CustomType::new(name, predicate)
        }
    }

    pub fn matches(&self, token: &str) -> bool {
        (self.predicate)(token)
    }
}

impl fmt::Debug for CustomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomType")
            .field("name", &self.name)
            .field("literal_class", &self.literal_class)
            .finish()
    }
}

//! Argument descriptors and comparisons
//!
//! Every keyword declares one [`Descriptor`] per positional argument. Before
//! a keyword runs, its arguments are checked against them:
//!
//! - `any` accepts every value
//! - `number|relpos` accepts any of the listed type tags
//! - `=with|to` accepts only the listed literal words
//!
//! A `recurring` descriptor consumes all remaining arguments. Descriptors
//! declared without a type accept strings (the engine warns once per
//! argument about them).
//!
//! `string` also accepts bare identifiers, so `log hello` and `log "hello"`
//! are interchangeable wherever text is expected.

use crate::interpreter::errors::RuntimeError;
use crate::memory::value::{TypeTag, Value};
use crate::parser::lexer::Component;
use regex::Regex;
use std::fmt;

/// Accepted inputs for one argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    Any,
    Tags(Vec<String>),
    Exact(Vec<String>),
}

impl TypeSpec {
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if spec == "any" {
            return TypeSpec::Any;
        }
        match spec.strip_prefix('=') {
            Some(words) => TypeSpec::Exact(words.split('|').map(str::to_string).collect()),
            None => TypeSpec::Tags(spec.split('|').map(str::to_string).collect()),
        }
    }

    pub fn accepts(&self, component: &Component) -> bool {
        match self {
            TypeSpec::Any => true,
            TypeSpec::Tags(tags) => tags.iter().any(|tag| {
                let kind = component.kind();
                kind.name() == tag || (tag == "string" && *kind == TypeTag::Identifier)
            }),
            TypeSpec::Exact(words) => {
                component.is_word() && words.iter().any(|w| *w == component.text)
            }
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Any => f.write_str("any"),
            TypeSpec::Tags(tags) => f.write_str(&tags.join("|")),
            TypeSpec::Exact(words) => write!(f, "one of '{}'", words.join("', '")),
        }
    }
}

/// Constraint on one positional argument of a keyword
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub name: String,
    pub spec: TypeSpec,
    pub optional: bool,
    pub recurring: bool,
    /// Whether a type was given explicitly
    pub typed: bool,
}

impl Descriptor {
    pub fn new(name: impl Into<String>, spec: &str) -> Self {
        Descriptor {
            name: name.into(),
            spec: TypeSpec::parse(spec),
            optional: false,
            recurring: false,
            typed: true,
        }
    }

    /// Descriptor without a type; treated as `string`
    pub fn untyped(name: impl Into<String>) -> Self {
        Descriptor {
            typed: false,
            ..Descriptor::new(name, "string")
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn recurring(mut self) -> Self {
        self.recurring = true;
        self
    }
}

fn check(keyword: &str, descriptor: &Descriptor, component: &Component) -> Result<(), RuntimeError> {
    if descriptor.spec.accepts(component) {
        return Ok(());
    }
    Err(RuntimeError::Type(format!(
        "'{}' expects {} for argument '{}', got {} '{}'",
        keyword,
        descriptor.spec,
        descriptor.name,
        component.kind(),
        component.text
    )))
}

/// Check `args` positionally against `descriptors`
pub fn validate_arguments(
    keyword: &str,
    descriptors: &[Descriptor],
    args: &[Component],
) -> Result<(), RuntimeError> {
    let mut position = 0;
    for descriptor in descriptors {
        if descriptor.recurring {
            let rest = &args[position.min(args.len())..];
            if rest.is_empty() && !descriptor.optional {
                return Err(missing(keyword, descriptor));
            }
            return rest.iter().try_for_each(|arg| check(keyword, descriptor, arg));
        }

        match args.get(position) {
            Some(arg) => {
                check(keyword, descriptor, arg)?;
                position += 1;
            }
            None if descriptor.optional => {}
            None => return Err(missing(keyword, descriptor)),
        }
    }

    if position < args.len() {
        return Err(RuntimeError::Syntax(format!(
            "'{}' takes at most {} argument{}, got {}",
            keyword,
            descriptors.len(),
            if descriptors.len() == 1 { "" } else { "s" },
            args.len()
        )));
    }
    Ok(())
}

fn missing(keyword: &str, descriptor: &Descriptor) -> RuntimeError {
    RuntimeError::Type(format!(
        "'{}' is missing argument '{}' ({})",
        keyword, descriptor.name, descriptor.spec
    ))
}

/// Evaluate `left <comparator> right`
pub fn compare(left: &Value, comparator: &str, right: &Value) -> Result<bool, RuntimeError> {
    match comparator {
        "=" => Ok(left.raw_eq(right)),
        "!=" => Ok(!left.raw_eq(right)),
        "<" | ">" => {
            let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
                return Err(RuntimeError::Type(format!(
                    "'{}' compares numbers, got {} and {}",
                    comparator, left.kind, right.kind
                )));
            };
            Ok(if comparator == "<" { a < b } else { a > b })
        }
        "in" => contains(left, right),
        "!in" => contains(left, right).map(|found| !found),
        other => Err(RuntimeError::Syntax(format!("unknown comparator '{}'", other))),
    }
}

/// Group membership, or a regular-expression search of `right`'s text
fn contains(left: &Value, right: &Value) -> Result<bool, RuntimeError> {
    if right.as_group().is_some() {
        return Ok(right.contains(left));
    }
    let pattern = Regex::new(&left.to_string()).map_err(|err| {
        RuntimeError::Syntax(format!("invalid pattern '{}': {}", left, err))
    })?;
    Ok(pattern.is_match(&right.to_string()))
}

//! Line tokenizer
//!
//! Converts one source line into an ordered list of [`Component`]s. The scan
//! is a single left-to-right pass over the characters with four mutually
//! exclusive regions:
//!
//! - default: whitespace separates components
//! - quoted string: `"..."`, verbatim, no escapes
//! - group: `[a|b|c]`, `|` separates elements, `]` closes
//! - variable reference: `\name\`, resolved immediately through a
//!   [`ResolveReference`] implementation
//!
//! A reference prefixed with `-` (`-\x\`) is looked up among local variables
//! only, one prefixed with `:` among parameters only, and one whose name
//! starts with `_` (`\_x\`) among globals only.
//!
//! Tokenizing without a resolver ("inert" mode) keeps references as
//! identifier components holding their source text. The engine uses this
//! while skipping over function bodies.

use super::literal::{classify, coerce_literal};
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::{CustomType, TypeTag, Value};

/// Lookup scope forced by a reference prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Parameters when a call is active, then locals
    Default,
    Local,
    Parameter,
    Global,
}

/// A `\name\` getter as written in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub name: String,
    pub scope: Scope,
}

/// Resolves variable references while a line is tokenized
pub trait ResolveReference {
    fn resolve(&self, reference: &Reference) -> Result<Value, RuntimeError>;
}

/// One typed element of a statement
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub value: Value,
    /// Source text (display text for resolved references)
    pub text: String,
}

impl Component {
    pub fn new(value: Value, text: impl Into<String>) -> Self {
        Component {
            value,
            text: text.into(),
        }
    }

    pub fn kind(&self) -> &TypeTag {
        &self.value.kind
    }

    /// Whether this component can name a keyword or label
    pub fn is_word(&self) -> bool {
        self.value.kind != TypeTag::String
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Default,
    Quoted,
    Group,
    Reference,
}

/// Single-line tokenizer
pub struct Lexer<'a> {
    input: Vec<char>,
    types: &'a [CustomType],
    resolver: Option<&'a dyn ResolveReference>,
    region: Region,
    buffer: String,
    group_items: Vec<String>,
    group_text: String,
    reference_scope: Scope,
    components: Vec<Component>,
}

impl<'a> Lexer<'a> {
    pub fn new(
        line: &str,
        types: &'a [CustomType],
        resolver: Option<&'a dyn ResolveReference>,
    ) -> Self {
        Lexer {
            input: line.chars().collect(),
            types,
            resolver,
            region: Region::Default,
            buffer: String::new(),
            group_items: Vec::new(),
            group_text: String::new(),
            reference_scope: Scope::Default,
            components: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Component>, RuntimeError> {
        let input = std::mem::take(&mut self.input);
        for ch in input {
            match self.region {
                Region::Quoted => self.scan_quoted(ch),
                Region::Group => self.scan_group(ch),
                Region::Reference => self.scan_reference(ch)?,
                Region::Default => self.scan_default(ch)?,
            }
        }

        match self.region {
            Region::Quoted => Err(RuntimeError::Syntax(
                "unterminated string literal".to_string(),
            )),
            Region::Group => Err(RuntimeError::Syntax(
                "unterminated group, expected ']'".to_string(),
            )),
            Region::Reference => Err(RuntimeError::Syntax(
                "unterminated variable reference, expected '\\'".to_string(),
            )),
            Region::Default => {
                self.flush();
                Ok(self.components)
            }
        }
    }

    fn scan_default(&mut self, ch: char) -> Result<(), RuntimeError> {
        match ch {
            c if c.is_whitespace() => self.flush(),
            '"' => {
                self.flush();
                self.region = Region::Quoted;
            }
            '[' => {
                self.flush();
                self.group_items.clear();
                self.group_text.clear();
                self.region = Region::Group;
            }
            '\\' => {
                self.reference_scope = match self.buffer.as_str() {
                    "" => Scope::Default,
                    "-" => Scope::Local,
                    ":" => Scope::Parameter,
                    other => {
                        return Err(RuntimeError::Syntax(format!(
                            "variable reference must stand alone, found '{}' before '\\'",
                            other
                        )));
                    }
                };
                self.buffer.clear();
                self.region = Region::Reference;
            }
            _ => self.buffer.push(ch),
        }
        Ok(())
    }

    fn scan_quoted(&mut self, ch: char) {
        if ch == '"' {
            let text = std::mem::take(&mut self.buffer);
            self.components
                .push(Component::new(Value::string(text.clone()), text));
            self.region = Region::Default;
        } else {
            self.buffer.push(ch);
        }
    }

    fn scan_group(&mut self, ch: char) {
        match ch {
            '|' => {
                self.group_items.push(std::mem::take(&mut self.buffer));
                self.group_text.push(ch);
            }
            ']' => {
                let last = std::mem::take(&mut self.buffer);
                let mut items = std::mem::take(&mut self.group_items);
                if !(items.is_empty() && last.is_empty()) {
                    items.push(last);
                }
                let values = items
                    .iter()
                    .map(|item| classify(coerce_literal(item, self.types), self.types))
                    .collect();
                let text = format!("[{}]", std::mem::take(&mut self.group_text));
                self.components
                    .push(Component::new(Value::group(values), text));
                self.region = Region::Default;
            }
            _ => {
                self.buffer.push(ch);
                self.group_text.push(ch);
            }
        }
    }

    fn scan_reference(&mut self, ch: char) -> Result<(), RuntimeError> {
        if ch != '\\' {
            self.buffer.push(ch);
            return Ok(());
        }

        let raw = std::mem::take(&mut self.buffer);
        self.region = Region::Default;

        let (name, scope) = match raw.strip_prefix('_') {
            Some(rest) => (rest.to_string(), Scope::Global),
            None => (raw.clone(), self.reference_scope),
        };
        if name.is_empty() {
            return Err(RuntimeError::Syntax("empty variable reference".to_string()));
        }

        let component = match self.resolver {
            Some(resolver) => {
                let value = resolver.resolve(&Reference { name, scope })?;
                let text = value.to_string();
                Component::new(value, text)
            }
            None => {
                let text = format!("\\{}\\", raw);
                Component::new(Value::identifier(text.clone()), text)
            }
        };
        self.components.push(component);
        Ok(())
    }

    /// Complete the pending bare token, if any
    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.buffer);
        let value = classify(coerce_literal(&text, self.types), self.types);
        self.components.push(Component::new(value, text));
    }
}

/// Tokenize one line
pub fn tokenize(
    line: &str,
    types: &[CustomType],
    resolver: Option<&dyn ResolveReference>,
) -> Result<Vec<Component>, RuntimeError> {
    Lexer::new(line, types, resolver).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::errors::ErrorKind;

    struct Fixed;

    impl ResolveReference for Fixed {
        fn resolve(&self, reference: &Reference) -> Result<Value, RuntimeError> {
            match (reference.name.as_str(), reference.scope) {
                ("x", Scope::Default) => Ok(Value::number(1.0)),
                ("x", Scope::Local) => Ok(Value::number(2.0)),
                ("x", Scope::Parameter) => Ok(Value::number(3.0)),
                ("x", Scope::Global) => Ok(Value::number(4.0)),
                (name, _) => Err(RuntimeError::Reference(format!("unknown '{}'", name))),
            }
        }
    }

    #[test]
    fn test_scalars_string_and_group() {
        let components = tokenize(r#"rectangle 10 10 "a b" [1|2|3]"#, &[], None).unwrap();
        assert_eq!(components.len(), 5);
        assert_eq!(components[0].text, "rectangle");
        assert_eq!(components[1].kind(), &TypeTag::Number);
        assert_eq!(components[2].kind(), &TypeTag::Number);
        assert_eq!(components[3].value, Value::string("a b"));
        let group = components[4].value.as_group().unwrap();
        assert_eq!(group.len(), 3);
        assert!(group.iter().all(|v| v.kind == TypeTag::Number));
    }

    #[test]
    fn test_string_is_verbatim() {
        let components = tokenize(r#"log "a\b [c] | d""#, &[], None).unwrap();
        assert_eq!(components.len(), 2);
        assert_eq!(components[1].value, Value::string(r"a\b [c] | d"));
    }

    #[test]
    fn test_empty_string_and_group() {
        let components = tokenize(r#"set x "" []"#, &[], None).unwrap();
        assert_eq!(components[2].value, Value::string(""));
        assert_eq!(components[3].value, Value::group(Vec::new()));
    }

    #[test]
    fn test_unterminated_regions() {
        for line in [r#"log "abc"#, "log [1|2", r"log \x"] {
            let err = tokenize(line, &[], None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Syntax, "line {}", line);
        }
    }

    #[test]
    fn test_reference_scopes() {
        let components = tokenize(r"log \x\ -\x\ :\x\ \_x\", &[], Some(&Fixed)).unwrap();
        let numbers: Vec<f64> = components[1..]
            .iter()
            .map(|c| c.value.as_number().unwrap())
            .collect();
        assert_eq!(numbers, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_unresolved_reference() {
        let err = tokenize(r"log \missing\", &[], Some(&Fixed)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Reference);
    }

    #[test]
    fn test_inert_references() {
        let components = tokenize(r"log \missing\", &[], None).unwrap();
        assert_eq!(components[1].text, r"\missing\");
        assert_eq!(components[1].kind(), &TypeTag::Identifier);
    }

    #[test]
    fn test_reference_must_stand_alone() {
        let err = tokenize(r"log abc\x\", &[], Some(&Fixed)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn test_comparator_class() {
        let components = tokenize("if 3 < 5", &[], None).unwrap();
        assert_eq!(components[2].kind(), &TypeTag::Comparator);
        assert_eq!(components[1].kind(), &TypeTag::Number);
    }

    #[test]
    fn test_quoted_comparator_stays_string() {
        let components = tokenize(r#"log "<""#, &[], None).unwrap();
        assert_eq!(components[1].kind(), &TypeTag::String);
    }
}

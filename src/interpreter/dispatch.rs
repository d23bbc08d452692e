//! Statement dispatch
//!
//! A statement is `<label>* <keyword> <argument>*`. Dispatching one goes:
//!
//! 1. statements led by an `[ignore]`d keyword are skipped
//! 2. leading labels are stripped and checked against the keyword
//! 3. the keyword is resolved: deprecated table, then extension keywords,
//!    then built-ins (so extensions can override built-ins)
//! 4. arguments are validated against the keyword's descriptors
//! 5. the keyword runs and may hand back nested code (`if`, `else`, `|`)
//!
//! Nested code runs in the same loop one context level deeper; there is no
//! recursion. The level-0 context is what `else`, `|` and `#` inspect on the
//! following line.

use crate::interpreter::engine::{ExecContext, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::extensions::Invocation;
use crate::interpreter::type_system::{validate_arguments, Descriptor};
use crate::parser::lexer::Component;

/// Code handed back by a keyword to run one level deeper
pub(crate) type Nested = Option<Vec<Component>>;

/// Keywords that no longer exist, with their replacements
const DEPRECATED: &[(&str, &str)] = &[("goto", "jump"), ("call", "execute"), ("print", "log")];

/// Keywords that must not disturb the statement before them
const TRANSPARENT: &[&str] = &["|", "#"];

/// Argument descriptors of every built-in keyword
pub(crate) fn builtin_descriptors(keyword: &str) -> Option<Vec<Descriptor>> {
    let d = Descriptor::new;
    let descriptors = match keyword {
        "var" => vec![d("name", "identifier"), d("value", "any").optional()],
        "set" => vec![d("name", "identifier"), d("value", "any")],
        "add" | "subtract" | "multiply" | "divide" | "modulo" => {
            vec![d("name", "identifier"), d("amount", "number")]
        }
        "join" => vec![d("name", "identifier"), d("values", "any").recurring()],
        "log" => vec![d("values", "any").recurring().optional()],
        "function" => vec![
            d("name", "identifier"),
            d("parameters", "identifier").recurring().optional(),
        ],
        "execute" => vec![d("function", "identifier"), d("arguments", "any").recurring().optional()],
        "end" => vec![d("function", "identifier")],
        "if" => vec![
            d("left", "any"),
            d("comparator", "comparator"),
            d("right", "any"),
            d("code", "any").recurring(),
        ],
        "else" | "|" => vec![d("code", "any").recurring()],
        "jump" => vec![d("target", "number|relpos")],
        "iterate" => vec![
            d("source", "group"),
            d("separator", "=with"),
            d("function", "identifier"),
        ],
        "class" => vec![d("name", "identifier")],
        "object" => vec![
            d("name", "identifier"),
            d("separator", "=from").optional(),
            d("class", "identifier").optional(),
        ],
        "#" => vec![d("property", "identifier"), d("value", "any")],
        "pause" => vec![d("ticks", "number").optional()],
        "awaitkey" => vec![d("key", "any").optional()],
        "stop" | "restart" => Vec::new(),
        "export" | "import" => vec![d("name", "identifier")],
        _ => return None,
    };
    Some(descriptors)
}

impl Interpreter {
    /// Run a tokenized statement and everything nested in it
    pub(crate) fn run_statement(&mut self, components: Vec<Component>) -> Result<(), RuntimeError> {
        let mut pending = Some(components);
        let mut depth = 0;
        let result = loop {
            let Some(components) = pending.take() else {
                break Ok(());
            };
            if self.contexts.len() <= depth {
                self.contexts.push(ExecContext::default());
            }
            match self.dispatch(components, depth) {
                Ok(nested) => pending = nested,
                Err(err) => break Err(err),
            }
            depth += 1;
        };
        self.contexts.truncate(1);
        result
    }

    fn dispatch(&mut self, components: Vec<Component>, depth: usize) -> Result<Nested, RuntimeError> {
        let Some(first) = components.first() else {
            return Ok(None);
        };
        if first.is_word() && self.source.metadata.ignored.contains(&first.text) {
            return Ok(None);
        }

        let mut labels = Vec::new();
        let mut position = 0;
        while position + 1 < components.len() {
            let candidate = &components[position];
            if !candidate.is_word() || self.extensions.label(&candidate.text).is_none() {
                break;
            }
            labels.push(candidate.text.clone());
            position += 1;
        }

        let keyword = &components[position];
        if !keyword.is_word() {
            return Err(RuntimeError::Syntax(format!(
                "a statement must start with a keyword, found {} '{}'",
                keyword.kind(),
                keyword.text
            )));
        }
        let keyword = keyword.text.clone();

        for label in &labels {
            let targets = self.extensions.label(label).cloned().unwrap_or_default();
            if !targets.contains(&keyword) {
                let mut valid: Vec<&str> = targets.iter().map(String::as_str).collect();
                valid.sort_unstable();
                return Err(RuntimeError::Syntax(format!(
                    "label '{}' cannot be applied to '{}', only to: {}",
                    label,
                    keyword,
                    valid.join(", ")
                )));
            }
        }

        let invocation = Invocation {
            keyword: keyword.clone(),
            labels,
            args: components[position + 1..].to_vec(),
            line: self.cursor,
        };

        let nested = if let Some((_, replacement)) = DEPRECATED.iter().find(|(old, _)| *old == keyword) {
            self.warn(format!(
                "'{}' is deprecated and was not executed, use '{}' instead",
                keyword, replacement
            ))?;
            None
        } else if let Some(entry) = self.extensions.keyword(&keyword).cloned() {
            self.warn_untyped(&keyword, &entry.descriptors)?;
            validate_arguments(&keyword, &entry.descriptors, &invocation.args)?;
            self.call_extension(entry.owner, &invocation)?;
            None
        } else if let Some(descriptors) = builtin_descriptors(&keyword) {
            validate_arguments(&keyword, &descriptors, &invocation.args)?;
            self.run_builtin(&invocation, depth)?
        } else {
            return Err(RuntimeError::Syntax(format!("unknown keyword '{}'", keyword)));
        };

        if !TRANSPARENT.contains(&keyword.as_str()) {
            if let Some(context) = self.contexts.get_mut(depth) {
                context.can_else = keyword == "if";
                context.last_keyword = Some(keyword);
            }
        }
        Ok(nested)
    }

    fn warn_untyped(&mut self, keyword: &str, descriptors: &[Descriptor]) -> Result<(), RuntimeError> {
        for descriptor in descriptors.iter().filter(|d| !d.typed) {
            let key = (keyword.to_string(), descriptor.name.clone());
            if self.warned_descriptors.insert(key) {
                self.warn(format!(
                    "argument '{}' of '{}' has no type, treating it as string",
                    descriptor.name, keyword
                ))?;
            }
        }
        Ok(())
    }

    fn call_extension(&mut self, owner: usize, invocation: &Invocation) -> Result<(), RuntimeError> {
        let mut extension = self.extensions.take(owner)?;
        let result = extension.call(&invocation.keyword, self, invocation);
        self.extensions.restore(owner, extension);
        result
    }

    fn run_builtin(&mut self, invocation: &Invocation, depth: usize) -> Result<Nested, RuntimeError> {
        match invocation.keyword.as_str() {
            "var" => self.keyword_var(invocation).map(|_| None),
            "set" => self.keyword_set(invocation).map(|_| None),
            "add" | "subtract" | "multiply" | "divide" | "modulo" => {
                self.keyword_arithmetic(invocation).map(|_| None)
            }
            "join" => self.keyword_join(invocation).map(|_| None),
            "log" => self.keyword_log(invocation).map(|_| None),
            "export" => self.keyword_export(invocation).map(|_| None),
            "import" => self.keyword_import(invocation).map(|_| None),
            "if" => self.keyword_if(invocation, depth),
            "else" => self.keyword_else(invocation, depth),
            "|" => self.keyword_continuation(invocation, depth),
            "class" => self.keyword_class(invocation).map(|_| None),
            "object" => self.keyword_object(invocation).map(|_| None),
            "#" => self.keyword_property(invocation, depth).map(|_| None),
            "function" => self.keyword_function(invocation).map(|_| None),
            "execute" => self.keyword_execute(invocation).map(|_| None),
            "end" => self.keyword_end(invocation).map(|_| None),
            "jump" => self.keyword_jump(invocation).map(|_| None),
            "iterate" => self.keyword_iterate(invocation).map(|_| None),
            "pause" => self.keyword_pause(invocation).map(|_| None),
            "awaitkey" => self.keyword_awaitkey(invocation).map(|_| None),
            "stop" => {
                self.keyword_stop();
                Ok(None)
            }
            "restart" => {
                self.keyword_restart(invocation);
                Ok(None)
            }
            other => Err(RuntimeError::Internal(format!(
                "built-in keyword '{}' has no implementation",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_has_descriptors() {
        for keyword in [
            "var", "set", "add", "subtract", "multiply", "divide", "modulo", "join", "log",
            "function", "execute", "end", "if", "else", "|", "jump", "iterate", "class",
            "object", "#", "pause", "awaitkey", "stop", "restart", "export", "import",
        ] {
            assert!(builtin_descriptors(keyword).is_some(), "{}", keyword);
        }
        assert!(builtin_descriptors("goto").is_none());
    }
}

//! Variable and output keywords
//!
//! - `var <name> [value]`: declare (globally with the `global` label)
//! - `set <name> <value>`: assign; `set <object>.<property> <value>` writes
//!   an object property
//! - `add`/`subtract`/`multiply`/`divide`/`modulo <name> <number>`: in-place
//!   arithmetic on a number variable
//! - `join <name> <values...>`: append text to a string variable
//! - `log <values...>`: write to the console
//! - `export <name>` / `import <name>`: copy between local and global scope
//!
//! All built-ins are implemented as methods on the [`Interpreter`] struct.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::extensions::Invocation;
use crate::memory::value::{TypeTag, Value};
use crate::parser::lexer::Scope;

fn name_of(invocation: &Invocation) -> Result<&str, RuntimeError> {
    invocation.text(0).ok_or_else(|| {
        RuntimeError::Internal(format!("'{}' ran without a name argument", invocation.keyword))
    })
}

fn value_of(invocation: &Invocation, index: usize) -> Result<Value, RuntimeError> {
    invocation.value(index).cloned().ok_or_else(|| {
        RuntimeError::Internal(format!(
            "'{}' ran without argument {}",
            invocation.keyword,
            index + 1
        ))
    })
}

impl Interpreter {
    pub(crate) fn keyword_var(&mut self, invocation: &Invocation) -> Result<(), RuntimeError> {
        let name = name_of(invocation)?;
        let initial = invocation.value(1).cloned();
        self.symbols
            .declare_variable(name, initial, invocation.has_label("global"))
    }

    pub(crate) fn keyword_set(&mut self, invocation: &Invocation) -> Result<(), RuntimeError> {
        let name = name_of(invocation)?;
        let value = value_of(invocation, 1)?;
        let global = invocation.has_label("global");

        let Some((base, property)) = name.split_once('.') else {
            return self.symbols.set_variable(name, value, global);
        };
        let scope = if global { Scope::Global } else { Scope::Default };
        let target = self.symbols.lookup(base, scope)?;
        let id = target.as_object().ok_or_else(|| {
            RuntimeError::Type(format!(
                "'{}' is a {}, only objects have properties",
                base, target.kind
            ))
        })?;
        self.objects.set_property(id, property, value)
    }

    pub(crate) fn keyword_arithmetic(&mut self, invocation: &Invocation) -> Result<(), RuntimeError> {
        let name = name_of(invocation)?;
        let amount = invocation.number(1).ok_or_else(|| {
            RuntimeError::Type(format!("'{}' needs a number amount", invocation.keyword))
        })?;
        let current = self.symbols.lookup(name, Scope::Local)?;
        let current = current.as_number().ok_or_else(|| {
            RuntimeError::Type(format!(
                "'{}' works on numbers, '{}' is a {}",
                invocation.keyword, name, current.kind
            ))
        })?;

        let result = match invocation.keyword.as_str() {
            "add" => current + amount,
            "subtract" => current - amount,
            "multiply" => current * amount,
            "divide" | "modulo" if amount == 0.0 => {
                return Err(RuntimeError::Type(format!(
                    "cannot {} '{}' by zero",
                    invocation.keyword, name
                )));
            }
            "divide" => current / amount,
            "modulo" => current % amount,
            other => {
                return Err(RuntimeError::Internal(format!(
                    "'{}' is not an arithmetic keyword",
                    other
                )));
            }
        };
        self.symbols.set_variable(name, Value::number(result), false)
    }

    pub(crate) fn keyword_join(&mut self, invocation: &Invocation) -> Result<(), RuntimeError> {
        let name = name_of(invocation)?;
        let mut text = match self.symbols.lookup(name, Scope::Local) {
            Ok(value) => value
                .as_text()
                .filter(|_| value.kind == TypeTag::String)
                .map(str::to_string)
                .ok_or_else(|| {
                    RuntimeError::Type(format!(
                        "'join' works on strings, '{}' is a {}",
                        name, value.kind
                    ))
                })?,
            // declared but never assigned: start empty
            Err(_) if self.symbols.local(name).is_some_and(|v| v.declared && v.value.is_none()) => {
                String::new()
            }
            Err(err) => return Err(err),
        };

        for value in &invocation.args[1..] {
            text.push_str(&value.value.to_string());
        }
        self.symbols.set_variable(name, Value::string(text), false)
    }

    pub(crate) fn keyword_log(&mut self, invocation: &Invocation) -> Result<(), RuntimeError> {
        let message = invocation
            .args
            .iter()
            .map(|c| c.value.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.print(message);
        Ok(())
    }

    pub(crate) fn keyword_export(&mut self, invocation: &Invocation) -> Result<(), RuntimeError> {
        let name = name_of(invocation)?;
        if !self.config.allow_export {
            return self.disallowed(format!("exporting '{}' is not allowed", name));
        }
        let value = self.symbols.lookup(name, Scope::Local)?.clone();
        if !self.symbols.global(name).is_some_and(|v| v.declared) {
            self.symbols.declare_variable(name, None, true)?;
        }
        self.symbols.set_variable(name, value, true)
    }

    pub(crate) fn keyword_import(&mut self, invocation: &Invocation) -> Result<(), RuntimeError> {
        let name = name_of(invocation)?;
        if !self.config.allow_import {
            return self.disallowed(format!("importing '{}' is not allowed", name));
        }
        let value = self.symbols.lookup(name, Scope::Global)?.clone();
        if !self.symbols.local(name).is_some_and(|v| v.declared) {
            self.symbols.declare_variable(name, None, false)?;
        }
        self.symbols.set_variable(name, value, false)
    }
}

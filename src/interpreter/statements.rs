//! Conditional and declaration statements
//!
//! This module handles the statements that look at the statement before
//! them:
//!
//! - `if <a> <cmp> <b> <code...>` runs `code` when the comparison holds
//! - `else <code...>` runs `code` when the `if` before it did not
//! - `| ...` continues the previous statement:
//!   - after `if`: `| <a> <cmp> <b> <code...>` is a chained condition, tried
//!     only while no earlier condition of the chain held
//!   - after `else`: `| <code...>` is more of the else branch
//!   - after `class`: `| <property> <default>` adds a class property
//! - `class <name>` starts a class template
//! - `object <name> [from <class>]` declares an object variable
//! - `# <property> <value>` sets a property of the object declared just
//!   before
//!
//! `|` and `#` leave the statement before them in place, so any number of
//! them can follow the statement they belong to.

use crate::interpreter::dispatch::{builtin_descriptors, Nested};
use crate::interpreter::engine::{ExecContext, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::extensions::Invocation;
use crate::interpreter::type_system::{compare, validate_arguments, Descriptor};
use crate::memory::value::Value;

fn condition(invocation: &Invocation) -> Result<bool, RuntimeError> {
    match (invocation.value(0), invocation.text(1), invocation.value(2)) {
        (Some(left), Some(comparator), Some(right)) => compare(left, comparator, right),
        _ => Err(RuntimeError::Syntax(format!(
            "'{}' needs a condition: <value> <comparator> <value>",
            invocation.keyword
        ))),
    }
}

impl Interpreter {
    fn context(&mut self, depth: usize) -> Result<&mut ExecContext, RuntimeError> {
        self.contexts
            .get_mut(depth)
            .ok_or_else(|| RuntimeError::Internal(format!("no statement context at depth {}", depth)))
    }

    pub(crate) fn keyword_if(&mut self, invocation: &Invocation, depth: usize) -> Result<Nested, RuntimeError> {
        let satisfied = condition(invocation)?;
        self.context(depth)?.if_satisfied = satisfied;
        Ok(satisfied.then(|| invocation.args[3..].to_vec()))
    }

    pub(crate) fn keyword_else(&mut self, invocation: &Invocation, depth: usize) -> Result<Nested, RuntimeError> {
        let context = self.context(depth)?;
        if !context.can_else {
            return Err(RuntimeError::Syntax(
                "'else' must directly follow an 'if'".to_string(),
            ));
        }
        Ok((!context.if_satisfied).then(|| invocation.args.clone()))
    }

    pub(crate) fn keyword_continuation(
        &mut self,
        invocation: &Invocation,
        depth: usize,
    ) -> Result<Nested, RuntimeError> {
        let context = self.context(depth)?.clone();
        match context.last_keyword.as_deref() {
            Some("if") => {
                if context.if_satisfied {
                    return Ok(None);
                }
                let descriptors = builtin_descriptors("if").unwrap_or_default();
                validate_arguments("|", &descriptors, &invocation.args)?;
                let satisfied = condition(invocation)?;
                self.context(depth)?.if_satisfied = satisfied;
                Ok(satisfied.then(|| invocation.args[3..].to_vec()))
            }
            Some("else") => Ok((!context.if_satisfied).then(|| invocation.args.clone())),
            Some("class") => {
                let descriptors = [
                    Descriptor::new("property", "identifier"),
                    Descriptor::new("default", "any"),
                ];
                validate_arguments("|", &descriptors, &invocation.args)?;
                let class = self.building_class.clone().ok_or_else(|| {
                    RuntimeError::Syntax("'|' property line without a class".to_string())
                })?;
                let (Some(name), Some(default)) = (invocation.text(0), invocation.value(1)) else {
                    return Err(RuntimeError::Internal("validated arguments missing".to_string()));
                };
                self.objects.add_class_property(&class, name, default.clone())?;
                Ok(None)
            }
            _ => Err(RuntimeError::Syntax(
                "'|' must follow an 'if', 'else' or 'class' statement".to_string(),
            )),
        }
    }

    pub(crate) fn keyword_class(&mut self, invocation: &Invocation) -> Result<(), RuntimeError> {
        let name = invocation
            .text(0)
            .ok_or_else(|| RuntimeError::Internal("'class' ran without a name".to_string()))?;
        self.objects.declare_class(name)?;
        self.building_class = Some(name.to_string());
        Ok(())
    }

    pub(crate) fn keyword_object(&mut self, invocation: &Invocation) -> Result<(), RuntimeError> {
        let name = invocation
            .text(0)
            .ok_or_else(|| RuntimeError::Internal("'object' ran without a name".to_string()))?;
        let class = match (invocation.text(1), invocation.text(2)) {
            (None, _) => None,
            (Some(_), Some(class)) => Some(class),
            (Some(_), None) => {
                return Err(RuntimeError::Syntax(format!(
                    "'object {} from' needs a class name",
                    name
                )));
            }
        };

        // after a non-destructive restart the variable still holds its object
        let existing = self
            .symbols
            .local(name)
            .filter(|var| !var.declared)
            .and_then(|var| var.value.as_ref())
            .and_then(Value::as_object);
        let id = match existing {
            Some(id) => id,
            None => self.objects.create_object(class)?,
        };
        self.symbols
            .declare_variable(name, Some(Value::object(id)), false)?;
        self.building_object = Some(id);
        Ok(())
    }

    pub(crate) fn keyword_property(&mut self, invocation: &Invocation, depth: usize) -> Result<(), RuntimeError> {
        let follows_object = self.context(depth)?.last_keyword.as_deref() == Some("object");
        let id = match (follows_object, self.building_object) {
            (true, Some(id)) => id,
            _ => {
                return Err(RuntimeError::Syntax(
                    "'#' must directly follow an 'object' declaration".to_string(),
                ));
            }
        };
        let (Some(property), Some(value)) = (invocation.text(0), invocation.value(1)) else {
            return Err(RuntimeError::Internal("validated arguments missing".to_string()));
        };
        self.objects.set_property(id, property, value.clone())
    }
}

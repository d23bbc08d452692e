//! Symbol store
//!
//! Owns every name a script can refer to:
//! - local and global [`Variable`]s
//! - declared [`Function`]s
//! - the call [`Stack`] (and through it the active parameter frame)
//! - the single active [`IteratorState`]
//!
//! # Passes
//!
//! Every variable and function carries a `declared` flag. A soft reset
//! ([`SymbolStore::reset_pass`]) clears the flags but keeps the values, so a
//! restarted script can run its declarations again without tripping the
//! redeclaration check and without losing state. A hard reset
//! ([`SymbolStore::hard_reset`]) discards everything the script created.
//!
//! # Type discipline
//!
//! A variable adopts the tag of the first value it receives. Every later
//! assignment must carry exactly that tag.

use super::stack::{CallFrame, Stack};
use super::value::{TypeTag, Value};
use crate::interpreter::constants::MAX_CALL_DEPTH;
use crate::interpreter::errors::RuntimeError;
use crate::parser::lexer::Scope;
use rustc_hash::FxHashMap;
use std::fmt;

/// A named value slot
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// `None` until the first assignment
    pub value: Option<Value>,
    /// Declared during the current pass
    pub declared: bool,
    /// Provided by the host or an extension; survives resets
    pub host_owned: bool,
}

impl Variable {
    pub fn tag(&self) -> Option<&TypeTag> {
        self.value.as_ref().map(|v| &v.kind)
    }
}

/// Declared parameter of a function
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    /// `None` accepts any tag
    pub kind: Option<TypeTag>,
}

impl Parameter {
    pub fn accepts(&self, value: &Value) -> bool {
        self.kind.as_ref().map_or(true, |kind| *kind == value.kind)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "{}:{}", self.name, kind),
            None => write!(f, "{}:any", self.name),
        }
    }
}

/// A declared function body
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// 0-based first body line
    pub start_line: usize,
    /// 0-based line of the matching `end`, known once `ended`
    pub end_line: Option<usize>,
    pub params: Vec<Parameter>,
    pub declared: bool,
    pub ended: bool,
}

/// Progress of an `iterate` statement
#[derive(Debug, Clone, PartialEq)]
pub struct IteratorState {
    pub function_name: String,
    pub source: Vec<Value>,
    pub index: usize,
    /// Stack depth of the iteration's own frames
    pub depth: usize,
}

/// Outcome of a `function` declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declaration {
    /// Body boundaries unknown: skip lines until the matching `end`
    Skip,
    /// Body already known from an earlier pass: continue at this line
    Resume(usize),
}

/// Outcome of an `end` statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Return {
    /// Continue execution at this 0-based line
    Resume(usize),
    /// The function is not the active call; nothing to unwind
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolStore {
    locals: FxHashMap<String, Variable>,
    local_order: Vec<String>,
    globals: FxHashMap<String, Variable>,
    global_order: Vec<String>,
    functions: FxHashMap<String, Function>,
    function_order: Vec<String>,
    stack: Stack,
    iterator: Option<IteratorState>,
    declaring: Option<String>,
}

fn check_assignable(name: &str, existing: Option<&Value>, incoming: &Value) -> Result<(), RuntimeError> {
    match existing {
        Some(current) if current.kind != incoming.kind => Err(RuntimeError::Type(format!(
            "variable '{}' holds a {} and cannot be set to a {}",
            name, current.kind, incoming.kind
        ))),
        _ => Ok(()),
    }
}

impl SymbolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /* ===================== Variables ===================== */

    pub fn declare_variable(
        &mut self,
        name: &str,
        initial: Option<Value>,
        global: bool,
    ) -> Result<(), RuntimeError> {
        let initial = initial.map(Value::normalized);
        let (table, order) = if global {
            (&mut self.globals, &mut self.global_order)
        } else {
            (&mut self.locals, &mut self.local_order)
        };

        match table.get_mut(name) {
            Some(var) if var.declared => Err(RuntimeError::Reference(format!(
                "variable '{}' is already declared",
                name
            ))),
            Some(var) => {
                // declared in an earlier pass: keep the value, re-check the tag
                if let Some(new) = &initial {
                    check_assignable(name, var.value.as_ref(), new)?;
                }
                if var.value.is_none() {
                    var.value = initial;
                }
                var.declared = true;
                Ok(())
            }
            None => {
                table.insert(
                    name.to_string(),
                    Variable {
                        value: initial,
                        declared: true,
                        host_owned: false,
                    },
                );
                order.push(name.to_string());
                Ok(())
            }
        }
    }

    pub fn set_variable(&mut self, name: &str, value: Value, global: bool) -> Result<(), RuntimeError> {
        let value = value.normalized();
        let table = if global {
            &mut self.globals
        } else {
            if !self.locals.contains_key(name) {
                if let Some(frame) = self.stack.current_frame() {
                    if frame.param(name).is_some() {
                        return Err(RuntimeError::Reference(format!(
                            "parameter '{}' of '{}' is read-only",
                            name, frame.function_name
                        )));
                    }
                }
            }
            &mut self.locals
        };

        let var = match table.get_mut(name) {
            Some(var) if var.declared || var.host_owned => var,
            Some(_) => {
                return Err(RuntimeError::Reference(format!(
                    "variable '{}' has not been declared yet",
                    name
                )));
            }
            None => {
                return Err(RuntimeError::Reference(format!(
                    "unknown {}variable '{}'",
                    if global { "global " } else { "" },
                    name
                )));
            }
        };
        check_assignable(name, var.value.as_ref(), &value)?;
        var.value = Some(value);
        Ok(())
    }

    /// Create or overwrite a host-owned global
    pub fn define_global(&mut self, name: &str, value: Value) {
        let value = value.normalized();
        match self.globals.get_mut(name) {
            Some(var) => {
                var.value = Some(value);
                var.declared = true;
                var.host_owned = true;
            }
            None => {
                self.globals.insert(
                    name.to_string(),
                    Variable {
                        value: Some(value),
                        declared: true,
                        host_owned: true,
                    },
                );
                self.global_order.push(name.to_string());
            }
        }
    }

    pub fn local(&self, name: &str) -> Option<&Variable> {
        self.locals.get(name)
    }

    pub fn global(&self, name: &str) -> Option<&Variable> {
        self.globals.get(name)
    }

    /// Look up a value the way a `\name\` reference does
    pub fn lookup(&self, name: &str, scope: Scope) -> Result<&Value, RuntimeError> {
        match scope {
            Scope::Local => Self::readable(&self.locals, name, ""),
            Scope::Global => Self::readable(&self.globals, name, "global "),
            Scope::Parameter => {
                let frame = self.stack.current_frame().ok_or_else(|| {
                    RuntimeError::Reference(format!(
                        "parameter '{}' requested outside of a function call",
                        name
                    ))
                })?;
                frame.param(name).ok_or_else(|| {
                    RuntimeError::Reference(format!(
                        "function '{}' has no parameter '{}'",
                        frame.function_name, name
                    ))
                })
            }
            Scope::Default => {
                if let Some(value) = self.stack.current_frame().and_then(|f| f.param(name)) {
                    return Ok(value);
                }
                Self::readable(&self.locals, name, "")
            }
        }
    }

    fn readable<'a>(
        table: &'a FxHashMap<String, Variable>,
        name: &str,
        qualifier: &str,
    ) -> Result<&'a Value, RuntimeError> {
        let var = table.get(name).ok_or_else(|| {
            RuntimeError::Reference(format!("unknown {}variable '{}'", qualifier, name))
        })?;
        if !var.declared && !var.host_owned {
            return Err(RuntimeError::Reference(format!(
                "{}variable '{}' has not been declared yet",
                qualifier, name
            )));
        }
        var.value.as_ref().ok_or_else(|| {
            RuntimeError::Reference(format!("{}variable '{}' has no value yet", qualifier, name))
        })
    }

    /// Locals in declaration order
    pub fn locals(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.local_order
            .iter()
            .filter_map(|name| self.locals.get(name).map(|v| (name.as_str(), v)))
    }

    /// Globals in definition order
    pub fn globals(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.global_order
            .iter()
            .filter_map(|name| self.globals.get(name).map(|v| (name.as_str(), v)))
    }

    /* ===================== Functions ===================== */

    /// Declare a function whose declaration sits on 0-based `line`
    pub fn declare_function(
        &mut self,
        name: &str,
        params: Vec<Parameter>,
        line: usize,
    ) -> Result<Declaration, RuntimeError> {
        if let Some(existing) = self.functions.get_mut(name) {
            if existing.declared {
                return Err(RuntimeError::Reference(format!(
                    "function '{}' is already declared",
                    name
                )));
            }
            if let (true, Some(end)) = (existing.start_line == line + 1, existing.end_line) {
                existing.declared = true;
                existing.params = params;
                return Ok(Declaration::Resume(end + 1));
            }
        } else {
            self.function_order.push(name.to_string());
        }

        self.functions.insert(
            name.to_string(),
            Function {
                start_line: line + 1,
                end_line: None,
                params,
                declared: true,
                ended: false,
            },
        );
        self.declaring = Some(name.to_string());
        Ok(Declaration::Skip)
    }

    /// Name of the function whose body is currently being skipped
    pub fn declaring(&self) -> Option<&str> {
        self.declaring.as_deref()
    }

    /// Close the body being skipped at 0-based `line`
    pub fn finish_declaration(&mut self, line: usize) {
        if let Some(name) = self.declaring.take() {
            if let Some(function) = self.functions.get_mut(&name) {
                function.end_line = Some(line);
                function.ended = true;
            }
        }
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Functions in declaration order
    pub fn functions(&self) -> impl Iterator<Item = (&str, &Function)> {
        self.function_order
            .iter()
            .filter_map(|name| self.functions.get(name).map(|f| (name.as_str(), f)))
    }

    fn declared_function(&self, name: &str) -> Result<&Function, RuntimeError> {
        self.functions
            .get(name)
            .filter(|f| f.declared)
            .ok_or_else(|| RuntimeError::Reference(format!("unknown function '{}'", name)))
    }

    /* ===================== Calls ===================== */

    /// Push a call frame and return the line the body starts on.
    ///
    /// `return_line` is the 0-based line of the calling statement.
    pub fn call(&mut self, name: &str, args: Vec<Value>, return_line: usize) -> Result<usize, RuntimeError> {
        let function = self.declared_function(name)?;
        if args.len() != function.params.len() {
            return Err(RuntimeError::Syntax(format!(
                "function '{}' expects {} argument{}, got {}",
                name,
                function.params.len(),
                if function.params.len() == 1 { "" } else { "s" },
                args.len()
            )));
        }

        let args: Vec<Value> = args.into_iter().map(Value::normalized).collect();
        for (arg, param) in args.iter().zip(&function.params) {
            if !param.accepts(arg) {
                return Err(RuntimeError::Type(format!(
                    "argument '{}' of '{}' expects {}, got {} ({})",
                    param.name,
                    name,
                    param.kind.as_ref().map_or("any", |k| k.name()),
                    arg.kind,
                    arg
                )));
            }
        }

        let start = function.start_line;
        let bindings = function
            .params
            .iter()
            .map(|p| p.name.clone())
            .zip(args)
            .collect();
        self.push_call(CallFrame::new(name.to_string(), return_line, bindings))?;
        Ok(start)
    }

    fn push_call(&mut self, frame: CallFrame) -> Result<(), RuntimeError> {
        if self.stack.depth() >= MAX_CALL_DEPTH {
            return Err(RuntimeError::Environment(format!(
                "call stack exhausted ({} nested calls) while calling '{}'",
                MAX_CALL_DEPTH, frame.function_name
            )));
        }
        self.stack.push_frame(frame);
        Ok(())
    }

    /// Handle `end <name>` outside of a declaration
    pub fn return_from_call(&mut self, name: &str) -> Result<Return, RuntimeError> {
        let function = self.functions.get(name).filter(|f| f.declared).ok_or_else(|| {
            RuntimeError::Reference(format!("'end {}' before the function was declared", name))
        })?;
        let start = function.start_line;
        let first_param = function.params.first().map(|p| p.name.clone());

        match self.stack.current_frame() {
            Some(frame) if frame.function_name == name => {}
            _ => return Ok(Return::Ignored),
        }
        let Some(frame) = self.stack.pop_frame() else {
            return Ok(Return::Ignored);
        };

        let depth = self.stack.depth() + 1;
        if let Some(iteration) = self
            .iterator
            .as_mut()
            .filter(|it| it.function_name == name && it.depth == depth)
        {
            iteration.index += 1;
            if let (Some(item), Some(param)) = (iteration.source.get(iteration.index), first_param) {
                let item = item.clone();
                self.stack.push_frame(CallFrame::new(
                    name.to_string(),
                    frame.return_line,
                    vec![(param, item)],
                ));
                return Ok(Return::Resume(start));
            }
            self.iterator = None;
        }

        Ok(Return::Resume(frame.return_line + 1))
    }

    /// Start iterating `items` through `name`; returns the body start line,
    /// or `None` when there is nothing to iterate.
    pub fn begin_iteration(
        &mut self,
        name: &str,
        items: Vec<Value>,
        return_line: usize,
    ) -> Result<Option<usize>, RuntimeError> {
        if let Some(active) = &self.iterator {
            return Err(RuntimeError::Syntax(format!(
                "cannot iterate with '{}' while an iteration with '{}' is active",
                name, active.function_name
            )));
        }

        let function = self.declared_function(name)?;
        let param = function.params.first().cloned().ok_or_else(|| {
            RuntimeError::Syntax(format!(
                "function '{}' must declare a parameter to be used with iterate",
                name
            ))
        })?;
        let start = function.start_line;

        let items: Vec<Value> = items.into_iter().map(Value::normalized).collect();
        if let Some(bad) = items.iter().find(|item| !param.accepts(item)) {
            return Err(RuntimeError::Type(format!(
                "cannot iterate with '{}': parameter '{}' expects {}, group holds {} ({})",
                name,
                param.name,
                param.kind.as_ref().map_or("any", |k| k.name()),
                bad.kind,
                bad
            )));
        }

        let Some(first) = items.first().cloned() else {
            return Ok(None);
        };
        self.push_call(CallFrame::new(
            name.to_string(),
            return_line,
            vec![(param.name, first)],
        ))?;
        self.iterator = Some(IteratorState {
            function_name: name.to_string(),
            source: items,
            index: 0,
            depth: self.stack.depth(),
        });
        Ok(Some(start))
    }

    pub fn iterator(&self) -> Option<&IteratorState> {
        self.iterator.as_ref()
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /* ===================== Resets ===================== */

    /// Soft reset: everything becomes redeclarable, values are kept
    pub fn reset_pass(&mut self) {
        for var in self.locals.values_mut() {
            var.declared = false;
        }
        for var in self.globals.values_mut().filter(|v| !v.host_owned) {
            var.declared = false;
        }
        for function in self.functions.values_mut() {
            function.declared = false;
        }
        self.stack.clear();
        self.iterator = None;
        self.declaring = None;
    }

    /// Hard reset: discard everything the script created
    pub fn hard_reset(&mut self) {
        self.locals.clear();
        self.local_order.clear();
        self.globals.retain(|_, v| v.host_owned);
        let globals = &self.globals;
        self.global_order.retain(|name| globals.contains_key(name));
        self.functions.clear();
        self.function_order.clear();
        self.stack.clear();
        self.iterator = None;
        self.declaring = None;
    }
}

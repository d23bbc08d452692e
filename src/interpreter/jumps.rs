use crate::interpreter::engine::{Interpreter, RunState, Wait};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::extensions::Invocation;
use crate::memory::symbols::{Declaration, Parameter, Return};
use crate::memory::value::{RawValue, TypeTag};
use rustc_hash::FxHashSet;
use tracing::debug;

fn function_name(invocation: &Invocation) -> Result<&str, RuntimeError> {
    invocation.text(0).ok_or_else(|| {
        RuntimeError::Internal(format!("'{}' ran without a function name", invocation.keyword))
    })
}

impl Interpreter {
    pub(crate) fn keyword_function(&mut self, invocation: &Invocation) -> Result<(), RuntimeError> {
        let name = function_name(invocation)?;
        let mut params = Vec::new();
        let mut seen = FxHashSet::default();

        for component in &invocation.args[1..] {
            let (param, kind) = match component.text.split_once(':') {
                Some((param, kind)) => (param, Some(kind)),
                None => (component.text.as_str(), None),
            };
            if param.is_empty() || !seen.insert(param.to_string()) {
                return Err(RuntimeError::Syntax(format!(
                    "invalid or repeated parameter '{}' in function '{}'",
                    component.text, name
                )));
            }

            let kind = match kind {
                None => {
                    self.warn(format!(
                        "parameter '{}' of '{}' has no type, treating it as string",
                        param, name
                    ))?;
                    Some(TypeTag::String)
                }
                Some("any") => None,
                Some(kind) => Some(self.parameter_type(kind)?),
            };
            params.push(Parameter {
                name: param.to_string(),
                kind,
            });
        }

        match self.symbols.declare_function(name, params, self.cursor)? {
            Declaration::Skip => {}
            Declaration::Resume(line) => self.redirect = Some(line),
        }
        Ok(())
    }

    fn parameter_type(&self, name: &str) -> Result<TypeTag, RuntimeError> {
        let tag = TypeTag::from_name(name);
        let known = tag.is_builtin() || self.extensions.types().iter().any(|t| t.name == name);
        if known {
            Ok(tag)
        } else {
            Err(RuntimeError::Type(format!("unknown type '{}'", name)))
        }
    }

    pub(crate) fn keyword_execute(&mut self, invocation: &Invocation) -> Result<(), RuntimeError> {
        let name = function_name(invocation)?;
        let args = invocation.args[1..].iter().map(|c| c.value.clone()).collect();
        let start = self.symbols.call(name, args, self.cursor)?;
        self.redirect = Some(start);
        Ok(())
    }

    pub(crate) fn keyword_end(&mut self, invocation: &Invocation) -> Result<(), RuntimeError> {
        let name = function_name(invocation)?;
        match self.symbols.return_from_call(name)? {
            Return::Resume(line) => self.redirect = Some(line),
            Return::Ignored => {}
        }
        Ok(())
    }

    pub(crate) fn keyword_jump(&mut self, invocation: &Invocation) -> Result<(), RuntimeError> {
        let lines = self.source.lines.len();
        // requested 1-based line, kept as i128 so extreme operands stay representable
        let requested = match invocation.value(0).map(|v| &v.raw) {
            Some(RawValue::RelPos(offset)) => self.cursor as i128 + 1 + i128::from(*offset),
            Some(RawValue::Number(_)) => invocation
                .value(0)
                .and_then(|v| v.as_integer())
                .map(i128::from)
                .ok_or_else(|| RuntimeError::Type("'jump' needs a whole line number".to_string()))?,
            _ => return Err(RuntimeError::Type("'jump' needs a line or ~offset".to_string())),
        };

        let target = requested
            .checked_sub(1)
            .and_then(|t| usize::try_from(t).ok())
            .filter(|&t| t < lines);
        let Some(target) = target else {
            return Err(RuntimeError::Reference(format!(
                "cannot jump to line {}, the script has {} line{}",
                requested,
                lines,
                if lines == 1 { "" } else { "s" }
            )));
        };
        self.redirect = Some(target);
        Ok(())
    }

    pub(crate) fn keyword_iterate(&mut self, invocation: &Invocation) -> Result<(), RuntimeError> {
        let items = invocation
            .value(0)
            .and_then(|v| v.as_group())
            .map(<[_]>::to_vec)
            .ok_or_else(|| RuntimeError::Type("'iterate' needs a group".to_string()))?;
        let name = invocation
            .text(2)
            .ok_or_else(|| RuntimeError::Internal("'iterate' ran without a function".to_string()))?;

        if let Some(start) = self.symbols.begin_iteration(name, items, self.cursor)? {
            self.redirect = Some(start);
        }
        Ok(())
    }

    pub(crate) fn keyword_pause(&mut self, invocation: &Invocation) -> Result<(), RuntimeError> {
        let Some(ticks) = invocation.value(0) else {
            self.state = RunState::Paused;
            debug!(line = self.cursor + 1, "script paused");
            return Ok(());
        };
        let ticks = ticks
            .as_integer()
            .filter(|n| *n >= 0)
            .ok_or_else(|| RuntimeError::Type(format!("cannot pause for {} ticks", ticks)))?;
        if ticks > 0 {
            self.state = RunState::Waiting(Wait::Ticks(ticks as u64));
        }
        Ok(())
    }

    pub(crate) fn keyword_awaitkey(&mut self, invocation: &Invocation) -> Result<(), RuntimeError> {
        let key = invocation.value(0).map(|v| v.to_string());
        self.state = RunState::Waiting(Wait::Key(key));
        Ok(())
    }

    pub(crate) fn keyword_stop(&mut self) {
        self.hard_reset();
        self.redirect = Some(0);
        self.state = RunState::Idle;
        debug!("script stopped by 'stop'");
    }

    pub(crate) fn keyword_restart(&mut self, invocation: &Invocation) {
        if invocation.has_label("non-destructive") {
            self.soft_reset();
        } else {
            self.hard_reset();
        }
        self.redirect = Some(0);
        debug!(
            non_destructive = invocation.has_label("non-destructive"),
            "script restarted"
        );
    }
}

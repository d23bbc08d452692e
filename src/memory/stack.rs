//! Call stack implementation
//!
//! This module provides the call stack for function execution:
//! - [`Stack`]: The call stack containing frames
//! - [`CallFrame`]: A single function invocation with its return line and
//!   read-only parameter frame
//!
//! Only the top frame's parameters are visible to the running code. Popping
//! a frame therefore restores the caller's parameter frame (or none at all
//! when the stack is exhausted) without any extra bookkeeping.

use super::value::Value;
use rustc_hash::FxHashMap;

/// Stack frame for a function call
#[derive(Debug, Clone)]
pub struct CallFrame {
    pub function_name: String,
    /// 0-based line of the statement that made the call
    pub return_line: usize,
    /// Arguments as supplied, in order
    pub arguments: Vec<Value>,
    params: FxHashMap<String, Value>,
    param_order: Vec<String>,
}

impl CallFrame {
    pub fn new(function_name: String, return_line: usize, bindings: Vec<(String, Value)>) -> Self {
        let mut params = FxHashMap::default();
        let mut param_order = Vec::with_capacity(bindings.len());
        let mut arguments = Vec::with_capacity(bindings.len());
        for (name, value) in bindings {
            arguments.push(value.clone());
            param_order.push(name.clone());
            params.insert(name, value);
        }
        CallFrame {
            function_name,
            return_line,
            arguments,
            params,
            param_order,
        }
    }

    /// Get a parameter of this frame
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Parameters in declaration order (for UI display)
    pub fn params(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.param_order
            .iter()
            .filter_map(|name| self.params.get(name).map(|v| (name.as_str(), v)))
    }
}

/// The call stack
#[derive(Debug, Clone, Default)]
pub struct Stack {
    frames: Vec<CallFrame>,
}

impl Stack {
    pub fn new() -> Self {
        Stack { frames: Vec::new() }
    }

    /// Push a new stack frame
    pub fn push_frame(&mut self, frame: CallFrame) {
        self.frames.push(frame);
    }

    /// Pop the top stack frame
    pub fn pop_frame(&mut self) -> Option<CallFrame> {
        self.frames.pop()
    }

    /// Get the current (top) frame
    pub fn current_frame(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    /// Get all frames, outermost first (for UI display)
    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    /// Get the depth of the call stack
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Check if stack is empty
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

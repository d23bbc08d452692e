//! Script interpreter execution engine
//!
//! This module provides the core execution logic:
//! - [`engine`]: The [`Interpreter`](engine::Interpreter), its lifecycle and
//!   the tick loop
//! - [`dispatch`]: Label resolution, keyword lookup and nested statements
//! - [`type_system`]: Argument descriptors and comparisons
//! - [`extensions`]: The [`Extension`](extensions::Extension) contract and
//!   registry
//! - [`errors`]: Runtime error types, reports and warnings
//!
//! # Execution Model
//!
//! A loaded script is a list of lines and a cursor. Each tick executes up to
//! a fixed number of statements; each statement is tokenized only when the
//! cursor reaches it. Control-flow keywords (`jump`, `execute`, `end`,
//! `iterate`, `restart`) redirect the cursor instead of advancing it.
//!
//! # Built-in Keywords
//!
//! Built-in keywords are methods on the interpreter, split by concern:
//! `builtins` (variables and output), `statements` (conditions, classes and
//! objects) and `jumps` (functions, cursor movement and suspension).

mod builtins;
pub mod constants;
pub(crate) mod dispatch;
pub mod engine;
pub mod errors;
pub mod extensions;
mod jumps;
mod statements;
pub mod type_system;

pub use engine::{Interpreter, RunState, Wait};

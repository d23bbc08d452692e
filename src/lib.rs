//! # Introduction
//!
//! tickscript runs line-oriented scripts a few statements at a time. A host
//! calls [`interpreter::Interpreter::tick`] from its own loop (or lets a
//! [`scheduler::Scheduler`] pace it), so scripts never block the host.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Lines + Metadata → (per tick) Tokenizer → Dispatcher → Keyword
//! ```
//!
//! 1. [`parser`] — splits the source into lines, strips comments, parses
//!    meta-tags and tokenizes one line at a time into typed components.
//! 2. [`interpreter`] — the cursor-driven engine: validates arguments against
//!    keyword descriptors, dispatches built-in and extension keywords, and
//!    manages the run lifecycle.
//! 3. [`memory`] — tagged [`memory::value::Value`]s, the symbol store
//!    (variables, functions, call stack) and the object/class store.
//! 4. [`console`] — the output buffer `log` writes to.
//! 5. [`config`] — [`config::InterpreterConfig`], loadable from TOML.
//! 6. [`ui`] — ratatui-based TUI host; not part of the stable library API.
//!
//! ## Language
//!
//! One statement per line: a keyword followed by space separated arguments.
//! Variables (`var`, `set`, arithmetic, `join`), functions (`function`,
//! `execute`, `end`), conditionals (`if`, `else`, `|`), cursor jumps
//! (`jump`, `iterate`), classes and objects, and suspension (`pause`,
//! `awaitkey`, `stop`, `restart`). Extensions add keywords, labels, globals
//! and value types.

pub mod config;
pub mod console;
pub mod interpreter;
pub mod memory;
pub mod parser;
pub mod scheduler;
pub mod ui;

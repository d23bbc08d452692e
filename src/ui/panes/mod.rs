//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: Script display with syntax highlighting and the cursor line
//! - [`symbols`]: Call stack, variables and declared functions
//! - [`console`]: Logged output, warnings and the last error report
//! - [`status`]: Status bar with run state and keybindings
//!
//! Each pane module exports a primary `render_*_pane()` function plus the
//! scroll state it needs between frames.

pub mod console;
pub mod source;
pub mod status;
pub mod symbols;

pub use console::{render_console_pane, ConsoleRenderData};
pub use source::{render_source_pane, SourceScrollState};
pub use status::{render_status_bar, StatusRenderData};
pub use symbols::{render_symbols_pane, SymbolsScrollState};

//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]** — application state, keyboard event loop, pane focus and key
//!   forwarding to scripts waiting in `awaitkey`
//! - **[`panes`]** — render functions for each visible pane (script, symbols,
//!   console, status bar)
//! - **[`theme`]** — centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a loaded
//! [`Interpreter`] and a [`Scheduler`], then call [`App::run`].
//!
//! [`Interpreter`]: crate::interpreter::Interpreter
//! [`Scheduler`]: crate::scheduler::Scheduler
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;

// Execution engine for the script interpreter

use crate::config::InterpreterConfig;
use crate::console::{Console, ConsoleSettings};
use crate::interpreter::constants::LAST_KEY_GLOBAL;
use crate::interpreter::errors::{
    ErrorCallback, ErrorReport, LogCallback, RuntimeError, Warning, WarningCallback,
};
use crate::interpreter::extensions::{Extension, ExtensionRegistry, LabelSpec};
use crate::memory::objects::ObjectStore;
use crate::memory::symbols::SymbolStore;
use crate::memory::value::{ObjectId, Value};
use crate::memory::SymbolView;
use crate::parser::lexer::tokenize;
use crate::parser::source::{is_meta_tag, strip_comment, Metadata, Source};
use rustc_hash::FxHashSet;
use std::fmt;
use tracing::{debug, error, trace, warn};

/// What a waiting script is waiting for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wait {
    /// Remaining ticks of a `pause N`
    Ticks(u64),
    /// A key press; `None` accepts any key
    Key(Option<String>),
}

/// Lifecycle state of the interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Paused,
    Waiting(Wait),
    Finished,
    /// Idle after a fatal error. Variables and the cursor are kept for
    /// inspection, ticks do nothing, and `start()` runs the script again.
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => f.write_str("idle"),
            RunState::Running => f.write_str("running"),
            RunState::Paused => f.write_str("paused"),
            RunState::Waiting(Wait::Ticks(n)) => write!(f, "waiting ({} ticks)", n),
            RunState::Waiting(Wait::Key(Some(key))) => write!(f, "waiting for '{}'", key),
            RunState::Waiting(Wait::Key(None)) => f.write_str("waiting for a key"),
            RunState::Finished => f.write_str("finished"),
            RunState::Failed => f.write_str("failed"),
        }
    }
}

/// Per-nesting-level statement state
///
/// Level 0 belongs to top-level statements and survives from line to line so
/// `else` and `|` can see the statement before them. Deeper levels hold the
/// code nested inside `if`/`else`/`|` and only live for one line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ExecContext {
    pub last_keyword: Option<String>,
    pub if_satisfied: bool,
    pub can_else: bool,
}

/// The main interpreter that executes a loaded script
pub struct Interpreter {
    pub(crate) config: InterpreterConfig,

    /// Loaded source lines and meta-tags
    pub(crate) source: Source,
    loaded: bool,

    pub(crate) symbols: SymbolStore,
    pub(crate) objects: ObjectStore,
    pub(crate) extensions: ExtensionRegistry,

    /// Output written by `log`
    pub(crate) console: Console,

    pub(crate) state: RunState,
    /// Wait interrupted by `pause()`, restored by `resume()`
    paused_wait: Option<Wait>,

    /// 0-based line being (or about to be) executed
    pub(crate) cursor: usize,
    /// Line to continue at instead of `cursor + 1`
    pub(crate) redirect: Option<usize>,
    /// Line used in error reports, `None` for host-executed lines
    executing_line: Option<usize>,

    pub(crate) contexts: Vec<ExecContext>,

    /// Class receiving `|` property lines
    pub(crate) building_class: Option<String>,
    /// Object receiving `#` property lines
    pub(crate) building_object: Option<ObjectId>,

    instructions_per_tick: usize,
    pub(crate) strict: bool,
    display_name: String,

    /// (keyword, argument) pairs already warned about a missing type
    pub(crate) warned_descriptors: FxHashSet<(String, String)>,

    last_report: Option<ErrorReport>,
    last_key: Option<String>,

    on_error: ErrorCallback,
    on_warning: WarningCallback,
    on_log: Option<LogCallback>,
}

impl Interpreter {
    pub fn new(config: InterpreterConfig) -> Self {
        let mut extensions = ExtensionRegistry::new();
        extensions.add_label(&LabelSpec::new("global", &["var", "set"]));
        extensions.add_label(&LabelSpec::new("non-destructive", &["restart"]));

        let console = Console::new(ConsoleSettings {
            group: config.group_messages,
            tag: config.tag_messages.then(|| config.display_name.clone()),
            timestamps: config.timestamp_messages,
        });

        Interpreter {
            source: Source::default(),
            loaded: false,
            symbols: SymbolStore::new(),
            objects: ObjectStore::new(),
            extensions,
            console,
            state: RunState::Idle,
            paused_wait: None,
            cursor: 0,
            redirect: None,
            executing_line: None,
            contexts: vec![ExecContext::default()],
            building_class: None,
            building_object: None,
            instructions_per_tick: config.instructions_per_tick,
            strict: false,
            display_name: config.display_name.clone(),
            warned_descriptors: FxHashSet::default(),
            last_report: None,
            last_key: None,
            on_error: Box::new(|report| error!("{}", report)),
            on_warning: Box::new(|warning| warn!("{}", warning)),
            on_log: None,
            config,
        }
    }

    /* ===================== Loading ===================== */

    /// Load a script, replacing whatever was loaded before
    pub fn load(&mut self, text: &str, name: &str) -> Result<(), RuntimeError> {
        let source = Source::parse(text)?;
        let meta = &source.metadata;

        self.display_name = meta
            .display_name
            .clone()
            .or_else(|| (!name.is_empty()).then(|| name.to_string()))
            .unwrap_or_else(|| self.config.display_name.clone());
        self.strict = meta.strict;
        self.instructions_per_tick = meta
            .instructions_per_tick
            .unwrap_or(self.config.instructions_per_tick);
        if self.config.tag_messages {
            self.console.settings.tag = Some(self.display_name.clone());
        }

        debug!(
            file = %self.display_name,
            lines = source.lines.len(),
            tags = meta.tags.len(),
            "script loaded"
        );
        self.source = source;
        self.loaded = true;
        self.hard_reset();
        self.state = RunState::Idle;
        self.last_report = None;
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn metadata(&self) -> &Metadata {
        &self.source.metadata
    }

    pub fn lines(&self) -> &[String] {
        &self.source.lines
    }

    /* ===================== Extensions ===================== */

    pub fn register(&mut self, extension: Box<dyn Extension>) -> Result<(), RuntimeError> {
        let globals = self.extensions.insert(extension)?;
        for (name, value) in globals {
            self.symbols.define_global(&name, value);
        }
        Ok(())
    }

    pub fn register_default<E: Extension + Default + 'static>(&mut self) -> Result<(), RuntimeError> {
        self.register(Box::new(E::default()))
    }

    pub fn extension_ids(&self) -> Vec<String> {
        self.extensions.ids()
    }

    /* ===================== Lifecycle ===================== */

    /// Start (or, when paused, resume) the loaded script
    pub fn start(&mut self) -> Result<(), RuntimeError> {
        if self.state == RunState::Paused {
            self.resume();
            return Ok(());
        }

        if let Err(err) = self.prepare_start() {
            self.executing_line = None;
            self.fail(err.clone());
            return Err(err);
        }
        debug!(file = %self.display_name, ipt = self.instructions_per_tick, "script started");

        if self.config.run_to_completion {
            self.run_to_completion(None)?;
        }
        Ok(())
    }

    /// Start with an explicit instruction budget per tick
    pub fn start_with(&mut self, instructions_per_tick: usize) -> Result<(), RuntimeError> {
        if instructions_per_tick == 0 {
            let err = RuntimeError::Environment(
                "instructions per tick must be at least 1".to_string(),
            );
            self.fail(err.clone());
            return Err(err);
        }
        self.instructions_per_tick = instructions_per_tick;
        self.start()
    }

    fn prepare_start(&mut self) -> Result<(), RuntimeError> {
        if !self.loaded {
            return Err(RuntimeError::Environment("no script is loaded".to_string()));
        }
        self.config.validate()?;

        let meta = &self.source.metadata;
        if let Some(missing) = meta
            .required
            .iter()
            .find(|id| !self.extensions.requires_extension(id))
        {
            return Err(RuntimeError::Environment(format!(
                "script requires the extension '{}', which is not registered",
                missing
            )));
        }
        if let Some(environment) = &meta.environment {
            if *environment != self.config.environment {
                return Err(RuntimeError::Environment(format!(
                    "script targets the '{}' environment, running in '{}'",
                    environment, self.config.environment
                )));
            }
        }

        self.hard_reset();
        self.last_report = None;
        self.state = RunState::Running;
        Ok(())
    }

    /// Execute up to one tick's worth of statements
    pub fn tick(&mut self) -> Result<(), RuntimeError> {
        match &mut self.state {
            RunState::Waiting(Wait::Ticks(remaining)) => {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    self.state = RunState::Running;
                }
                return Ok(());
            }
            RunState::Running => {}
            _ => return Ok(()),
        }

        let mut executed = 0;
        while executed < self.instructions_per_tick && self.state == RunState::Running {
            if self.finish_if_done() {
                break;
            }
            match self.step() {
                Ok(counted) => executed += usize::from(counted),
                Err(err) => {
                    self.fail(err.clone());
                    return Err(err);
                }
            }
        }
        self.finish_if_done();
        Ok(())
    }

    /// Run synchronously until the script finishes, fails, halts or waits
    /// for a key. `max_lines` bounds the number of executed statements.
    ///
    /// Returns the number of statements executed.
    pub fn run_to_completion(&mut self, max_lines: Option<usize>) -> Result<usize, RuntimeError> {
        let mut executed = 0;
        loop {
            match self.state {
                RunState::Running => {}
                RunState::Waiting(Wait::Ticks(_)) => {
                    self.tick()?;
                    continue;
                }
                _ => break,
            }
            if self.finish_if_done() || max_lines.is_some_and(|max| executed >= max) {
                break;
            }
            match self.step() {
                Ok(counted) => executed += usize::from(counted),
                Err(err) => {
                    self.fail(err.clone());
                    return Err(err);
                }
            }
        }
        Ok(executed)
    }

    /// Halt, keeping all state for [`Interpreter::resume`]
    pub fn pause(&mut self) {
        match std::mem::replace(&mut self.state, RunState::Paused) {
            RunState::Running => self.paused_wait = None,
            RunState::Waiting(wait) => self.paused_wait = Some(wait),
            other => self.state = other,
        }
    }

    pub fn resume(&mut self) {
        if self.state == RunState::Paused {
            self.state = match self.paused_wait.take() {
                Some(wait) => RunState::Waiting(wait),
                None => RunState::Running,
            };
            debug!(line = self.cursor + 1, "script resumed");
        }
    }

    /// Halt and discard everything the script declared
    pub fn stop(&mut self) {
        self.hard_reset();
        self.state = RunState::Idle;
        debug!("script stopped");
    }

    fn finish_if_done(&mut self) -> bool {
        if self.state == RunState::Running && self.cursor >= self.source.lines.len() {
            self.state = RunState::Finished;
            debug!(file = %self.display_name, "script finished");
        }
        self.state == RunState::Finished
    }

    /// Execute the line under the cursor and move the cursor on.
    ///
    /// Returns whether the line counted as an instruction.
    fn step(&mut self) -> Result<bool, RuntimeError> {
        let index = self.cursor;
        let Some(line) = self.source.lines.get(index).cloned() else {
            return Ok(false);
        };
        self.executing_line = Some(index);

        let counted = if line.is_empty() || is_meta_tag(&line) {
            false
        } else if let Some(name) = self.symbols.declaring().map(str::to_string) {
            self.skip_line(&line, &name, index);
            false
        } else {
            if self.config.verbose {
                trace!(line = index + 1, "{}", line);
            }
            self.run_line(&line)?;
            true
        };

        self.cursor = self.redirect.take().unwrap_or(index + 1);
        Ok(counted)
    }

    /// Inside a function declaration only the matching `end` does anything
    fn skip_line(&mut self, line: &str, declaring: &str, index: usize) {
        let Ok(components) = tokenize(line, self.extensions.types(), None) else {
            return;
        };
        let is_end = matches!(
            components.as_slice(),
            [keyword, name] if keyword.text == "end" && name.text == declaring
        );
        if is_end {
            self.symbols.finish_declaration(index);
            debug!(function = declaring, end = index + 1, "function declared");
        }
    }

    fn run_line(&mut self, line: &str) -> Result<(), RuntimeError> {
        let components = {
            let view = SymbolView {
                symbols: &self.symbols,
                objects: &self.objects,
            };
            tokenize(line, self.extensions.types(), Some(&view))?
        };
        self.run_statement(components)
    }

    /// Execute one line outside of the tick cycle
    pub fn execute_line(&mut self, text: &str) -> Result<(), RuntimeError> {
        let line = strip_comment(text).trim();
        if line.is_empty() || is_meta_tag(line) {
            return Ok(());
        }
        self.executing_line = None;
        let result = self.run_line(line);
        if let Some(target) = self.redirect.take() {
            self.cursor = target;
        }
        result
    }

    /// Deliver a key press to the script
    pub fn deliver_key(&mut self, key: &str) {
        self.last_key = Some(key.to_string());
        self.symbols.define_global(LAST_KEY_GLOBAL, Value::string(key));

        let resumes = matches!(
            &self.state,
            RunState::Waiting(Wait::Key(expected)) if expected.as_deref().map_or(true, |k| k == key)
        );
        if resumes {
            self.state = RunState::Running;
        }
    }

    /* ===================== Resets ===================== */

    /// Discard everything the script created
    pub(crate) fn hard_reset(&mut self) {
        self.symbols.hard_reset();
        self.objects.clear();
        self.console.clear();
        self.reset_cursor();
    }

    /// Keep values, make every declaration reusable
    pub(crate) fn soft_reset(&mut self) {
        self.symbols.reset_pass();
        self.objects.reset_pass();
        self.reset_cursor();
    }

    fn reset_cursor(&mut self) {
        self.cursor = 0;
        self.redirect = None;
        self.paused_wait = None;
        self.contexts = vec![ExecContext::default()];
        self.building_class = None;
        self.building_object = None;
    }

    /* ===================== Diagnostics ===================== */

    pub fn on_error(&mut self, callback: impl FnMut(&ErrorReport) + 'static) {
        self.on_error = Box::new(callback);
    }

    pub fn on_warning(&mut self, callback: impl FnMut(&Warning) + 'static) {
        self.on_warning = Box::new(callback);
    }

    pub fn on_log(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_log = Some(Box::new(callback));
    }

    /// Emit a non-fatal diagnostic; fatal in strict mode
    pub(crate) fn warn(&mut self, message: String) -> Result<(), RuntimeError> {
        if self.strict {
            return Err(RuntimeError::Escalated(message));
        }
        let warning = Warning {
            message,
            line: self.executing_line.map(|l| l + 1),
        };
        (self.on_warning)(&warning);
        Ok(())
    }

    /// An operation the configuration does not allow
    pub(crate) fn disallowed(&mut self, message: String) -> Result<(), RuntimeError> {
        if self.config.halt_on_disallowed {
            return Err(RuntimeError::Environment(message));
        }
        self.warn(message)
    }

    /// Write to the console
    pub(crate) fn print(&mut self, message: String) {
        let text = self.console.print(message, self.executing_line);
        if let Some(on_log) = self.on_log.as_mut() {
            on_log(&text);
        }
    }

    /// Write to the console from host or extension code
    pub fn log(&mut self, message: impl Into<String>) {
        self.print(message.into());
    }

    pub(crate) fn report(&self, err: &RuntimeError) -> ErrorReport {
        ErrorReport {
            kind: err.kind(),
            message: err.message().to_string(),
            line: self.executing_line.map(|l| l + 1),
            file: self.display_name.clone(),
            stack: self
                .symbols
                .stack()
                .frames()
                .iter()
                .rev()
                .map(|frame| format!("{} (called from line {})", frame.function_name, frame.return_line + 1))
                .collect(),
            extensions: if err.is_language_error() {
                Vec::new()
            } else {
                self.extensions.ids()
            },
        }
    }

    fn fail(&mut self, err: RuntimeError) {
        let report = self.report(&err);
        debug!(kind = %report.kind, line = ?report.line, "script failed");
        self.state = RunState::Failed;
        if self.config.report_errors {
            (self.on_error)(&report);
        }
        self.last_report = Some(report);
    }

    /* ===================== Accessors ===================== */

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// 0-based line the next tick executes
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn instructions_per_tick(&self) -> usize {
        self.instructions_per_tick
    }

    pub fn last_report(&self) -> Option<&ErrorReport> {
        self.last_report.as_ref()
    }

    pub fn last_key(&self) -> Option<&str> {
        self.last_key.as_deref()
    }

    pub fn symbols(&self) -> &SymbolStore {
        &self.symbols
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    /// Create or overwrite a host-owned global variable
    pub fn set_global(&mut self, name: &str, value: Value) {
        self.symbols.define_global(name, value);
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.symbols.global(name).and_then(|v| v.value.as_ref())
    }

    /// Value of a local variable
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.symbols.local(name).and_then(|v| v.value.as_ref())
    }

    /// Active calls, innermost first
    pub fn call_stack_names(&self) -> Vec<String> {
        self.symbols
            .stack()
            .frames()
            .iter()
            .rev()
            .map(|frame| frame.function_name.clone())
            .collect()
    }
}

// tickscript: tick-driven script runner

use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;

use tickscript::config::InterpreterConfig;
use tickscript::interpreter::{Interpreter, RunState, Wait};
use tickscript::parser::check_source;
use tickscript::scheduler::Scheduler;
use tickscript::ui::App;

#[derive(Parser)]
#[command(name = "tickscript")]
#[command(about = "Run line-oriented tick scripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script
    Run {
        file: PathBuf,
        /// Show the script, symbols and console in a terminal UI
        #[arg(long)]
        tui: bool,
        /// TOML interpreter configuration
        #[arg(long)]
        config: Option<PathBuf>,
        /// Instructions per tick
        #[arg(long)]
        ipt: Option<usize>,
        /// Milliseconds between ticks
        #[arg(long)]
        interval: Option<u64>,
        /// Trace every executed statement
        #[arg(short, long)]
        verbose: bool,
    },
    /// Tokenize every line and report syntax errors without running
    Check { file: PathBuf },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn script_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "script".to_string())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            tui,
            config,
            ipt,
            interval,
            verbose,
        } => {
            // The UI owns the screen; only log there when asked to
            if !tui || std::env::var_os("RUST_LOG").is_some() {
                init_tracing(verbose);
            }

            let mut config = match config {
                Some(path) => InterpreterConfig::from_file(&path)
                    .with_context(|| format!("failed to load config '{}'", path.display()))?,
                None => InterpreterConfig::default(),
            };
            config.verbose |= verbose;
            if let Some(ipt) = ipt {
                config.instructions_per_tick = ipt;
            }
            if let Some(interval) = interval {
                config.tick_interval_ms = interval;
            }
            let scheduler = Scheduler::from_millis(config.tick_interval_ms);

            let source = fs::read_to_string(&file)
                .with_context(|| format!("failed to read '{}'", file.display()))?;
            let mut interpreter = Interpreter::new(config);
            interpreter.load(&source, &script_name(&file))?;

            if tui {
                run_tui(interpreter, scheduler)
            } else {
                run_headless(interpreter, scheduler)
            }
        }
        Commands::Check { file } => {
            let source = fs::read_to_string(&file)
                .with_context(|| format!("failed to read '{}'", file.display()))?;
            let errors = check_source(&source, &[]);
            for (line, err) in &errors {
                if *line == 0 {
                    eprintln!("{}: {} error: {}", file.display(), err.kind(), err.message());
                } else {
                    eprintln!(
                        "{}:{}: {} error: {}",
                        file.display(),
                        line,
                        err.kind(),
                        err.message()
                    );
                }
            }
            if !errors.is_empty() {
                bail!("{} line(s) failed to tokenize", errors.len());
            }
            println!("{}: ok", file.display());
            Ok(())
        }
    }
}

fn run_headless(mut interpreter: Interpreter, mut scheduler: Scheduler) -> anyhow::Result<()> {
    interpreter.on_log(|line| println!("{}", line));
    interpreter.on_warning(|warning| eprintln!("{}", warning));
    interpreter.on_error(|report| eprintln!("{}", report));

    if interpreter.start().is_err() {
        bail!("'{}' failed to start", interpreter.display_name());
    }

    let stdin = io::stdin();
    loop {
        match interpreter.state().clone() {
            RunState::Running | RunState::Waiting(Wait::Ticks(_)) => {
                let now = Instant::now();
                if !scheduler.is_due(now) {
                    std::thread::sleep(scheduler.remaining(now));
                    continue;
                }
                if scheduler.poll(&mut interpreter, now).is_err() {
                    bail!("'{}' failed", interpreter.display_name());
                }
            }
            RunState::Waiting(Wait::Key(_)) => {
                // One line of stdin is one key press; an empty line is enter
                let mut input = String::new();
                if stdin.lock().read_line(&mut input)? == 0 {
                    bail!("input closed while the script was waiting for a key");
                }
                let key = input.trim_end_matches(['\r', '\n']);
                interpreter.deliver_key(if key.is_empty() { "enter" } else { key });
            }
            RunState::Paused => {
                eprintln!("script paused at line {}", interpreter.cursor() + 1);
                break;
            }
            RunState::Failed => bail!("'{}' failed", interpreter.display_name()),
            RunState::Finished | RunState::Idle => break,
        }
    }
    Ok(())
}

fn run_tui(interpreter: Interpreter, scheduler: Scheduler) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(interpreter, scheduler);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

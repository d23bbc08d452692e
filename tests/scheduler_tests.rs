// Tick budgets, suspension and scheduler pacing

use std::time::{Duration, Instant};

use tickscript::config::InterpreterConfig;
use tickscript::interpreter::constants::LAST_KEY_GLOBAL;
use tickscript::interpreter::errors::ErrorKind;
use tickscript::interpreter::{Interpreter, RunState, Wait};
use tickscript::scheduler::Scheduler;

fn started(lines: &[&str]) -> Interpreter {
    let mut interpreter = Interpreter::new(InterpreterConfig::default());
    interpreter.on_error(|_| {});
    interpreter
        .load(&lines.join("\n"), "sched")
        .expect("Loading failed");
    interpreter.start().expect("start failed");
    interpreter
}

fn count(interpreter: &Interpreter) -> usize {
    interpreter.console().len()
}

#[test]
fn test_one_instruction_per_tick_by_default() {
    let mut interp = started(&["log a", "log b", "log c"]);
    assert_eq!(*interp.state(), RunState::Running);
    assert_eq!(count(&interp), 0);

    interp.tick().expect("tick failed");
    assert_eq!(count(&interp), 1);
    interp.tick().expect("tick failed");
    interp.tick().expect("tick failed");
    assert_eq!(count(&interp), 3);
    assert_eq!(*interp.state(), RunState::Finished);

    // ticking a finished script does nothing
    interp.tick().expect("tick failed");
    assert_eq!(count(&interp), 3);
}

#[test]
fn test_instruction_budget_skips_blank_and_meta_lines() {
    let mut interp = started(&["[ipt 2]", "log a", "", "// note", "log b", "log c"]);
    assert_eq!(interp.instructions_per_tick(), 2);

    interp.tick().expect("tick failed");
    assert_eq!(interp.console().get_output(), vec!["a", "b"]);
    interp.tick().expect("tick failed");
    assert_eq!(*interp.state(), RunState::Finished);
}

#[test]
fn test_start_with_budget() {
    let mut interp = started(&["log a", "log b", "log c", "log d"]);
    interp.stop();
    interp.start_with(3).expect("start failed");
    interp.tick().expect("tick failed");
    assert_eq!(count(&interp), 3);

    let err = interp.start_with(0).expect_err("zero budget accepted");
    assert_eq!(err.kind(), ErrorKind::Environment);
}

#[test]
fn test_pause_countdown() {
    let mut interp = started(&["pause 2", "log after"]);
    interp.tick().expect("tick failed");
    assert_eq!(*interp.state(), RunState::Waiting(Wait::Ticks(2)));

    interp.tick().expect("tick failed");
    assert_eq!(*interp.state(), RunState::Waiting(Wait::Ticks(1)));
    interp.tick().expect("tick failed");
    assert_eq!(*interp.state(), RunState::Running);
    assert_eq!(count(&interp), 0);

    interp.tick().expect("tick failed");
    assert_eq!(interp.console().get_output(), vec!["after"]);
}

#[test]
fn test_pause_without_argument_halts() {
    let mut interp = started(&["var x 1", "pause", "log resumed"]);
    interp.tick().expect("tick failed");
    interp.tick().expect("tick failed");
    assert_eq!(*interp.state(), RunState::Paused);

    interp.tick().expect("tick failed");
    assert_eq!(count(&interp), 0);
    assert!(interp.variable("x").is_some());

    interp.resume();
    interp.tick().expect("tick failed");
    assert_eq!(interp.console().get_output(), vec!["resumed"]);
}

#[test]
fn test_invalid_pause() {
    let mut interp = started(&["pause -1"]);
    let err = interp.tick().expect_err("negative pause accepted");
    assert_eq!(err.kind(), ErrorKind::Type);
    assert_eq!(*interp.state(), RunState::Failed);
}

#[test]
fn test_failed_script_keeps_state_until_restarted() {
    let mut interp = started(&["var x 1", "set x ghost", "log done"]);
    interp.tick().expect("tick failed");
    assert!(interp.tick().is_err());
    assert_eq!(*interp.state(), RunState::Failed);
    assert_eq!(interp.variable("x").and_then(|v| v.as_number()), Some(1.0));

    interp.tick().expect("tick failed");
    assert_eq!(count(&interp), 0);

    interp.start().expect("start failed");
    assert_eq!(*interp.state(), RunState::Running);
    assert!(interp.last_report().is_none());
    assert_eq!(interp.cursor(), 0);
}

#[test]
fn test_awaitkey_any_key() {
    let mut interp = started(&["awaitkey", "log \\_lastkey\\"]);
    interp.tick().expect("tick failed");
    assert_eq!(*interp.state(), RunState::Waiting(Wait::Key(None)));

    interp.tick().expect("tick failed");
    assert_eq!(count(&interp), 0);

    interp.deliver_key("x");
    assert_eq!(*interp.state(), RunState::Running);
    assert_eq!(interp.last_key(), Some("x"));
    interp.tick().expect("tick failed");
    assert_eq!(interp.console().get_output(), vec!["x"]);
}

#[test]
fn test_awaitkey_specific_key() {
    let mut interp = started(&["awaitkey space", "log go"]);
    interp.tick().expect("tick failed");

    interp.deliver_key("enter");
    assert_eq!(
        *interp.state(),
        RunState::Waiting(Wait::Key(Some("space".to_string())))
    );
    assert_eq!(
        interp.global(LAST_KEY_GLOBAL).map(ToString::to_string).as_deref(),
        Some("enter")
    );

    interp.deliver_key("space");
    interp.tick().expect("tick failed");
    assert_eq!(interp.console().get_output(), vec!["go"]);
}

#[test]
fn test_host_pause_keeps_wait() {
    let mut interp = started(&["pause 3", "log after"]);
    interp.tick().expect("tick failed");
    interp.pause();
    assert_eq!(*interp.state(), RunState::Paused);

    interp.resume();
    assert_eq!(*interp.state(), RunState::Waiting(Wait::Ticks(3)));

    // start() on a paused script resumes it
    interp.pause();
    interp.start().expect("start failed");
    assert_eq!(*interp.state(), RunState::Waiting(Wait::Ticks(3)));
}

#[test]
fn test_stop_keyword_resets() {
    let mut interp = started(&["var x 1", "stop", "log never"]);
    interp.tick().expect("tick failed");
    interp.tick().expect("tick failed");
    assert_eq!(*interp.state(), RunState::Idle);
    assert_eq!(interp.variable("x"), None);
    assert_eq!(interp.cursor(), 0);

    interp.tick().expect("tick failed");
    assert_eq!(count(&interp), 0);
}

#[test]
fn test_run_to_completion_config() {
    let mut interp = Interpreter::new(InterpreterConfig {
        run_to_completion: true,
        ..InterpreterConfig::default()
    });
    interp
        .load("log a\nlog b\npause 5\nlog c", "sched")
        .expect("Loading failed");
    interp.start().expect("start failed");
    assert_eq!(*interp.state(), RunState::Finished);
    assert_eq!(interp.console().get_output(), vec!["a", "b", "c"]);
}

#[test]
fn test_run_to_completion_stops_at_key_wait() {
    let mut interp = started(&["log a", "awaitkey", "log b"]);
    let executed = interp.run_to_completion(None).expect("run failed");
    assert_eq!(executed, 2);
    assert_eq!(*interp.state(), RunState::Waiting(Wait::Key(None)));
}

#[test]
fn test_run_to_completion_bound() {
    let mut interp = started(&["log loop", "jump 1"]);
    let executed = interp.run_to_completion(Some(10)).expect("run failed");
    assert_eq!(executed, 10);
    assert_eq!(*interp.state(), RunState::Running);
}

#[test]
fn test_scheduler_paces_ticks() {
    let mut interp = started(&["log a", "log b", "log c"]);
    let mut scheduler = Scheduler::new(Duration::from_millis(100));
    let start = Instant::now();

    assert!(scheduler.poll(&mut interp, start).expect("poll failed"));
    assert!(!scheduler
        .poll(&mut interp, start + Duration::from_millis(50))
        .expect("poll failed"));
    assert_eq!(count(&interp), 1);
    assert_eq!(
        scheduler.remaining(start + Duration::from_millis(50)),
        Duration::from_millis(50)
    );

    assert!(scheduler
        .poll(&mut interp, start + Duration::from_millis(100))
        .expect("poll failed"));
    assert_eq!(count(&interp), 2);

    scheduler.reset();
    assert!(scheduler.is_due(start));
}

#[test]
fn test_scheduler_reports_failures() {
    let mut interp = started(&["set ghost 1"]);
    let mut scheduler = Scheduler::from_millis(10);
    let err = scheduler
        .poll(&mut interp, Instant::now())
        .expect_err("failure not returned");
    assert_eq!(err.kind(), ErrorKind::Reference);
    assert_eq!(*interp.state(), RunState::Failed);
}

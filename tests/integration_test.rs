// Integration tests for the script language

use tickscript::config::InterpreterConfig;
use tickscript::interpreter::errors::{ErrorKind, ErrorReport};
use tickscript::interpreter::{Interpreter, RunState};
use tickscript::memory::value::{TypeTag, Value};
use tickscript::parser::lexer::tokenize;

fn load(lines: &[&str]) -> Interpreter {
    let mut interpreter = Interpreter::new(InterpreterConfig::default());
    interpreter.on_error(|_| {});
    interpreter.on_warning(|_| {});
    interpreter
        .load(&lines.join("\n"), "test")
        .expect("Loading failed");
    interpreter
}

/// Run a script synchronously, bounded so loops cannot hang a test
fn run(lines: &[&str]) -> Interpreter {
    let mut interpreter = load(lines);
    if interpreter.start().is_ok() {
        let _ = interpreter.run_to_completion(Some(10_000));
    }
    interpreter
}

fn failure(lines: &[&str]) -> ErrorReport {
    let interpreter = run(lines);
    assert_eq!(*interpreter.state(), RunState::Failed);
    interpreter
        .last_report()
        .cloned()
        .expect("failed run without a report")
}

fn output(interpreter: &Interpreter) -> Vec<String> {
    interpreter.console().get_output()
}

fn number(interpreter: &Interpreter, name: &str) -> Option<f64> {
    interpreter.variable(name).and_then(Value::as_number)
}

#[test]
fn test_simple_script_finishes() {
    let interpreter = run(&["var x 5", "var y 10", "log \\x\\ \\y\\"]);
    assert_eq!(*interpreter.state(), RunState::Finished);
    assert_eq!(output(&interpreter), vec!["5 10"]);
}

#[test]
fn test_comments_and_blank_lines() {
    let interpreter = run(&[
        "// leading comment",
        "",
        "log \"a // not a comment\" // a comment",
    ]);
    assert_eq!(output(&interpreter), vec!["a // not a comment"]);
}

#[test]
fn test_arithmetic() {
    let interpreter = run(&[
        "var x 10",
        "add x 5",
        "subtract x 3",
        "multiply x 2",
        "divide x 4",
        "var y 17",
        "modulo y 5",
    ]);
    assert_eq!(number(&interpreter, "x"), Some(6.0));
    assert_eq!(number(&interpreter, "y"), Some(2.0));
}

#[test]
fn test_divide_by_zero_is_type_error() {
    let report = failure(&["var x 1", "divide x 0"]);
    assert_eq!(report.kind, ErrorKind::Type);
    assert_eq!(report.line, Some(2));
}

#[test]
fn test_arithmetic_on_text_fails() {
    let report = failure(&["var x hello", "add x 1"]);
    assert_eq!(report.kind, ErrorKind::Type);
}

#[test]
fn test_join_appends_text() {
    let interpreter = run(&["var s", "join s hello \" \" world", "log \\s\\"]);
    assert_eq!(output(&interpreter), vec!["hello world"]);
}

#[test]
fn test_redeclaration_fails() {
    let report = failure(&["var x 1", "var x 2"]);
    assert_eq!(report.kind, ErrorKind::Reference);
    assert_eq!(report.line, Some(2));
    assert_eq!(report.file, "test");
}

#[test]
fn test_redeclaration_after_non_destructive_restart() {
    let interpreter = run(&[
        "var count 0",
        "add count 1",
        "if \\count\\ < 3 non-destructive restart",
    ]);
    assert_eq!(*interpreter.state(), RunState::Finished);
    assert_eq!(number(&interpreter, "count"), Some(3.0));
}

#[test]
fn test_destructive_restart_clears_variables() {
    let mut interpreter = load(&["var x 5", "restart"]);
    interpreter.start().expect("start failed");
    interpreter.tick().expect("tick failed");
    assert_eq!(number(&interpreter, "x"), Some(5.0));
    interpreter.tick().expect("tick failed");
    assert_eq!(interpreter.variable("x"), None);
    assert_eq!(interpreter.cursor(), 0);
}

#[test]
fn test_set_adopts_first_tag() {
    let interpreter = run(&["var x", "set x hello"]);
    let value = interpreter.variable("x").expect("x is unset");
    assert_eq!(value.kind, TypeTag::String);
    assert_eq!(value.to_string(), "hello");
}

#[test]
fn test_set_type_mismatch() {
    let report = failure(&["var x 1", "set x hello"]);
    assert_eq!(report.kind, ErrorKind::Type);

    let report = failure(&["var x", "set x [1|2]", "set x 3"]);
    assert_eq!(report.kind, ErrorKind::Type);
    assert_eq!(report.line, Some(3));
}

#[test]
fn test_set_undeclared_variable() {
    let report = failure(&["set ghost 1"]);
    assert_eq!(report.kind, ErrorKind::Reference);
}

#[test]
fn test_unknown_reference() {
    let report = failure(&["log \\ghost\\"]);
    assert_eq!(report.kind, ErrorKind::Reference);
}

#[test]
fn test_global_label_and_prefix() {
    let interpreter = run(&["global var score 10", "var score 1", "log \\_score\\ \\score\\"]);
    assert_eq!(output(&interpreter), vec!["10 1"]);
    assert_eq!(
        interpreter.global("score").and_then(Value::as_number),
        Some(10.0)
    );
}

#[test]
fn test_label_on_wrong_keyword() {
    let report = failure(&["global log hi"]);
    assert_eq!(report.kind, ErrorKind::Syntax);
    assert!(report.message.contains("set"), "{}", report.message);
    assert!(report.message.contains("var"), "{}", report.message);
}

#[test]
fn test_export_and_import() {
    let interpreter = run(&[
        "var x 4",
        "export x",
        "global set x 9",
        "import x",
        "log \\x\\",
    ]);
    assert_eq!(output(&interpreter), vec!["9"]);
}

#[test]
fn test_import_disallowed_warns_by_default() {
    let config = InterpreterConfig {
        allow_import: false,
        ..InterpreterConfig::default()
    };
    let mut interpreter = Interpreter::new(config.clone());
    interpreter.on_warning(|_| {});
    interpreter
        .load("global var x 1\nimport x\nlog done", "test")
        .expect("Loading failed");
    interpreter.start().expect("start failed");
    interpreter.run_to_completion(None).expect("run failed");
    assert_eq!(interpreter.variable("x"), None);
    assert_eq!(output(&interpreter), vec!["done"]);

    let mut strict = Interpreter::new(InterpreterConfig {
        halt_on_disallowed: true,
        ..config
    });
    strict.on_error(|_| {});
    strict
        .load("global var x 1\nimport x", "test")
        .expect("Loading failed");
    strict.start().expect("start failed");
    let err = strict.run_to_completion(None).expect_err("import should halt");
    assert_eq!(err.kind(), ErrorKind::Environment);
}

#[test]
fn test_function_call_and_return() {
    let interpreter = run(&[
        "var total 0",
        "function bump by:number",
        "add total \\by\\",
        "end bump",
        "execute bump 2",
        "execute bump 3",
        "log \\total\\",
    ]);
    assert_eq!(*interpreter.state(), RunState::Finished);
    assert_eq!(output(&interpreter), vec!["5"]);
}

#[test]
fn test_function_body_is_skipped_when_declared() {
    let interpreter = run(&["function greet", "log inside", "end greet", "log after"]);
    assert_eq!(output(&interpreter), vec!["after"]);
}

#[test]
fn test_execute_argument_checks() {
    let script = |call: &'static str| {
        vec![
            "function f x:number y:string",
            "end f",
            call,
        ]
    };

    let report = failure(&script("execute f hello world"));
    assert_eq!(report.kind, ErrorKind::Type);

    let report = failure(&script("execute f 1"));
    assert_eq!(report.kind, ErrorKind::Syntax);

    let report = failure(&script("execute f 1 two 3"));
    assert_eq!(report.kind, ErrorKind::Syntax);

    let interpreter = run(&script("execute f 1 two"));
    assert_eq!(*interpreter.state(), RunState::Finished);
}

#[test]
fn test_execute_undeclared_function() {
    let report = failure(&["execute nothing"]);
    assert_eq!(report.kind, ErrorKind::Reference);
}

#[test]
fn test_end_before_declaration() {
    let report = failure(&["end nothing"]);
    assert_eq!(report.kind, ErrorKind::Reference);
}

#[test]
fn test_parameters_are_read_only() {
    let report = failure(&["function f x:number", "set x 2", "end f", "execute f 1"]);
    assert_eq!(report.kind, ErrorKind::Reference);
    assert_eq!(report.stack, vec!["f (called from line 4)"]);
}

#[test]
fn test_error_report_stack_is_innermost_first() {
    let report = failure(&[
        "function inner",
        "log \\ghost\\",
        "end inner",
        "function outer",
        "execute inner",
        "end outer",
        "execute outer",
    ]);
    assert_eq!(report.line, Some(2));
    assert_eq!(
        report.stack,
        vec!["inner (called from line 5)", "outer (called from line 7)"]
    );
}

#[test]
fn test_jump_relative() {
    let interpreter = run(&["jump ~2", "log skipped", "log reached"]);
    assert_eq!(output(&interpreter), vec!["reached"]);
}

#[test]
fn test_jump_absolute() {
    let interpreter = run(&[
        "var n 0",
        "jump 5",
        "log skipped",
        "log skipped too",
        "add n 1",
        "if \\n\\ < 3 jump 5",
    ]);
    assert_eq!(number(&interpreter, "n"), Some(3.0));
    assert!(output(&interpreter).is_empty());
}

#[test]
fn test_jump_out_of_range() {
    let report = failure(&["jump 10"]);
    assert_eq!(report.kind, ErrorKind::Reference);

    let report = failure(&["jump ~-5"]);
    assert_eq!(report.kind, ErrorKind::Reference);
}

#[test]
fn test_jump_extreme_targets() {
    let report = failure(&["log a", "jump ~9223372036854775807"]);
    assert_eq!(report.kind, ErrorKind::Reference);
    assert_eq!(report.line, Some(2));

    let report = failure(&["jump ~-9223372036854775808"]);
    assert_eq!(report.kind, ErrorKind::Reference);

    let report = failure(&["jump -9223372036854775808"]);
    assert_eq!(report.kind, ErrorKind::Reference);
    assert!(report.message.contains("-9223372036854775808"));

    let report = failure(&["jump 9223372036854775807"]);
    assert_eq!(report.kind, ErrorKind::Reference);
}

#[test]
fn test_if_else() {
    let interpreter = run(&["var x 0", "if 3 < 5 set x 1", "else set x 2"]);
    assert_eq!(number(&interpreter, "x"), Some(1.0));

    let interpreter = run(&["var x 0", "if 5 < 3 set x 1", "else set x 2"]);
    assert_eq!(number(&interpreter, "x"), Some(2.0));
}

#[test]
fn test_else_without_if() {
    let report = failure(&["log a", "else log b"]);
    assert_eq!(report.kind, ErrorKind::Syntax);
}

#[test]
fn test_chained_conditions() {
    let script = |x: &'static str| {
        vec![
            x,
            "if \\x\\ = 1 log one",
            "| \\x\\ = 2 log two",
            "else log other",
            "| log still other",
        ]
    };
    assert_eq!(output(&run(&script("var x 1"))), vec!["one"]);
    assert_eq!(output(&run(&script("var x 2"))), vec!["two"]);
    assert_eq!(
        output(&run(&script("var x 3"))),
        vec!["other", "still other"]
    );
}

#[test]
fn test_continuation_without_context() {
    let report = failure(&["log a", "| log b"]);
    assert_eq!(report.kind, ErrorKind::Syntax);
}

#[test]
fn test_nested_if() {
    let interpreter = run(&["var x 0", "if 1 = 1 if 2 = 2 set x 7"]);
    assert_eq!(number(&interpreter, "x"), Some(7.0));
}

#[test]
fn test_in_comparator() {
    let interpreter = run(&[
        "if b in [a|b|c] log member",
        "if d !in [a|b|c] log not member",
        "if ^h.l in hello log pattern",
    ]);
    assert_eq!(
        output(&interpreter),
        vec!["member", "not member", "pattern"]
    );
}

#[test]
fn test_tokenize_components() {
    let components =
        tokenize(r#"rectangle 10 10 "a b" [1|2|3]"#, &[], None).expect("tokenize failed");
    assert_eq!(components.len(), 5);
    assert_eq!(*components[1].kind(), TypeTag::Number);
    assert_eq!(*components[2].kind(), TypeTag::Number);
    assert_eq!(*components[3].kind(), TypeTag::String);
    assert_eq!(components[3].value.as_text(), Some("a b"));
    assert_eq!(*components[4].kind(), TypeTag::Group);
    assert_eq!(components[4].value.as_group().map(<[_]>::len), Some(3));
}

#[test]
fn test_unterminated_literals_never_execute() {
    let interpreter = run(&["var x 0", "set x 5 \"open"]);
    assert_eq!(*interpreter.state(), RunState::Failed);
    assert_eq!(
        interpreter.last_report().map(|r| r.kind),
        Some(ErrorKind::Syntax)
    );
    assert_eq!(number(&interpreter, "x"), Some(0.0));

    let report = failure(&["var x 0", "set x [1|2"]);
    assert_eq!(report.kind, ErrorKind::Syntax);
}

#[test]
fn test_unknown_keyword() {
    let report = failure(&["frobnicate 1"]);
    assert_eq!(report.kind, ErrorKind::Syntax);
}

#[test]
fn test_deprecated_keyword_warns_and_skips() {
    let warnings = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = std::rc::Rc::clone(&warnings);

    let mut interpreter = load(&["print hello", "log after"]);
    interpreter.on_warning(move |w| sink.borrow_mut().push(w.message.clone()));
    interpreter.start().expect("start failed");
    interpreter.run_to_completion(None).expect("run failed");

    assert_eq!(output(&interpreter), vec!["after"]);
    assert_eq!(warnings.borrow().len(), 1);
    assert!(warnings.borrow()[0].contains("log"));
}

#[test]
fn test_strict_escalates_warnings() {
    let report = failure(&["[strict]", "goto 1"]);
    assert_eq!(report.kind, ErrorKind::Escalated);
}

#[test]
fn test_iterate_over_group() {
    let interpreter = run(&[
        "var sum 0",
        "function accumulate n:number",
        "add sum \\n\\",
        "end accumulate",
        "iterate [1|2|3] with accumulate",
        "log \\sum\\",
    ]);
    assert_eq!(output(&interpreter), vec!["6"]);
    assert!(interpreter.symbols().iterator().is_none());
    assert!(interpreter.call_stack_names().is_empty());
}

#[test]
fn test_iterate_type_mismatch() {
    let report = failure(&[
        "function f n:number",
        "end f",
        "iterate [1|two] with f",
    ]);
    assert_eq!(report.kind, ErrorKind::Type);
}

#[test]
fn test_iterate_while_iterating_fails() {
    let interpreter = run(&[
        "function inner n:number",
        "end inner",
        "function outer n:number",
        "iterate [1|2] with inner",
        "end outer",
        "iterate [5|6] with outer",
    ]);
    assert_eq!(
        interpreter.last_report().map(|r| r.kind),
        Some(ErrorKind::Syntax)
    );
    let iteration = interpreter
        .symbols()
        .iterator()
        .expect("outer iteration was discarded");
    assert_eq!(iteration.function_name, "outer");
    assert_eq!(iteration.index, 0);
}

#[test]
fn test_group_index_reference() {
    let interpreter = run(&["var list [a|b|c]", "log \\list.1\\"]);
    assert_eq!(output(&interpreter), vec!["b"]);

    let report = failure(&["var list [a|b|c]", "log \\list.3\\"]);
    assert_eq!(report.kind, ErrorKind::Reference);
}

#[test]
fn test_objects_and_classes() {
    let interpreter = run(&[
        "class Point",
        "| x 0",
        "| y 0",
        "object p from Point",
        "# x 5",
        "set p.y 3",
        "log \\p.x\\ \\p.y\\",
        "object loose",
        "# label hello",
        "log \\loose.label\\",
    ]);
    assert_eq!(output(&interpreter), vec!["5 3", "hello"]);
}

#[test]
fn test_class_defaults_apply() {
    let interpreter = run(&[
        "class Point",
        "| x 1",
        "object p from Point",
        "log \\p.x\\",
    ]);
    assert_eq!(output(&interpreter), vec!["1"]);
}

#[test]
fn test_object_property_type_checked() {
    let report = failure(&[
        "class Point",
        "| x 0",
        "object p from Point",
        "# x hello",
    ]);
    assert_eq!(report.kind, ErrorKind::Type);

    let report = failure(&["class Point", "| x 0", "object p from Point", "set p.z 1"]);
    assert_eq!(report.kind, ErrorKind::Reference);
}

#[test]
fn test_property_without_object() {
    let report = failure(&["log a", "# x 1"]);
    assert_eq!(report.kind, ErrorKind::Syntax);
}

#[test]
fn test_log_grouping() {
    let interpreter = run(&[
        "var n 0",
        "add n 1",
        "log tick",
        "if \\n\\ < 3 jump 2",
        "log done",
    ]);
    assert_eq!(output(&interpreter), vec!["tick (x3)", "done"]);
    assert_eq!(interpreter.console().lines()[0].repeat, 3);
}

#[test]
fn test_log_grouping_disabled() {
    let mut interpreter = Interpreter::new(InterpreterConfig {
        group_messages: false,
        tag_messages: true,
        ..InterpreterConfig::default()
    });
    interpreter
        .load("var n 0\nadd n 1\nlog tick\nif \\n\\ < 2 jump 2", "demo")
        .expect("Loading failed");
    interpreter.start().expect("start failed");
    interpreter.run_to_completion(None).expect("run failed");
    assert_eq!(
        interpreter.console().get_output(),
        vec!["[demo] tick", "[demo] tick"]
    );
}

#[test]
fn test_meta_tags() {
    let interpreter = load(&["[display Game]", "[ipt 4]", "[ignore debug]", "log a"]);
    assert_eq!(interpreter.display_name(), "Game");
    assert_eq!(interpreter.instructions_per_tick(), 4);
    assert!(interpreter.metadata().ignored.contains("debug"));

    let interpreter = run(&["[ignore debug]", "debug anything at all", "log a"]);
    assert_eq!(output(&interpreter), vec!["a"]);
}

#[test]
fn test_unknown_meta_tag_fails_load() {
    let mut interpreter = Interpreter::new(InterpreterConfig::default());
    let err = interpreter
        .load("[bogus]\nlog a", "test")
        .expect_err("load should fail");
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert!(!interpreter.is_loaded());
}

#[test]
fn test_environment_mismatch() {
    let mut interpreter = load(&["[environment browser]", "log a"]);
    let err = interpreter.start().expect_err("start should fail");
    assert_eq!(err.kind(), ErrorKind::Environment);
    assert_eq!(*interpreter.state(), RunState::Failed);
}

#[test]
fn test_execute_line() {
    let mut interpreter = load(&["log loaded"]);
    interpreter.execute_line("var x 3").expect("var failed");
    interpreter.execute_line("add x 2 // comment").expect("add failed");
    assert_eq!(number(&interpreter, "x"), Some(5.0));

    let err = interpreter
        .execute_line("var x 1")
        .expect_err("redeclaration should fail");
    assert_eq!(err.kind(), ErrorKind::Reference);
}

#[test]
fn test_instances_are_isolated() {
    let first = run(&["var x 1"]);
    let second = run(&["log \\x\\"]);
    assert_eq!(number(&first, "x"), Some(1.0));
    assert_eq!(second.last_report().map(|r| r.kind), Some(ErrorKind::Reference));
}

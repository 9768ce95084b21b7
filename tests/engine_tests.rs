// Integration tests for template execution

use scriptlet::interpreter::engine::Engine;
use scriptlet::snapshot::StepKind;
use scriptlet::{parse, render, Context, RequestContext, RuntimeError, TemplateError};
use std::fs;
use std::path::Path;

fn run(source: &str) -> String {
    let mut context = RequestContext::buffered();
    render(source, &mut context).expect("Rendering failed");
    context.output_text()
}

fn run_err(source: &str) -> (RuntimeError, String) {
    let mut context = RequestContext::buffered();
    match render(source, &mut context) {
        Err(TemplateError::Runtime(err)) => (err, context.output_text()),
        other => panic!("Expected runtime error, got {:?}", other),
    }
}

#[test]
fn test_sample_loop_repeats_body() {
    let source = "This is sample text.\r\n{$ FOR i 1 10 1 $}\r\n  This is {$= i $}-th time this message is generated.\r\n{$END$}\r\n{$FOR i 0 10 2 $}\r\n  sin({$=i$}^2) = {$= i i * @sin \"0.000\" @decfmt $}\r\n{$END$}";
    let output = run(source);

    assert!(output.starts_with("This is sample text.\r\n"));
    assert_eq!(output.matches("-th time this message").count(), 10);
    assert!(output.contains("This is 10-th time"));
    assert!(output.contains("sin(0^2) = 0.000"));
    assert!(output.contains("sin(2^2) = -0.757"));
    assert_eq!(output.matches("sin(").count(), 6);
}

#[test]
fn test_arithmetic_types() {
    assert_eq!(run("{$= 7 2 / $}"), "3");
    assert_eq!(run("{$= 7.0 2 / $}"), "3.5");
    assert_eq!(run("{$= 1 2 + 3 * $}"), "9");
    assert_eq!(run("{$= \"2\" \"3\" * $}"), "6");
    assert_eq!(run("{$= \"2.5\" 2 * $}"), "5.0");
    assert_eq!(run("{$= 10 -3 - $}"), "13");
}

#[test]
fn test_division_by_zero() {
    let (err, _) = run_err("{$= 1 0 / $}");
    assert!(matches!(err, RuntimeError::DivisionByZero { .. }));
    assert_eq!(run("{$= 1.0 0 / $}"), "Infinity");
    assert_eq!(run("{$= -1 0.0 / $}"), "-Infinity");
}

#[test]
fn test_not_a_number() {
    let (err, _) = run_err("{$= \"abc\" 1 + $}");
    assert!(matches!(err, RuntimeError::NotANumber { ref value, .. } if value == "abc"));
}

#[test]
fn test_remaining_stack_printed_in_push_order() {
    assert_eq!(run("{$= 1 2 3 $}"), "123");
    assert_eq!(run("{$= \"a\" 1.5 $}|{$= $}|"), "a1.5||");
}

#[test]
fn test_loop_directions() {
    assert_eq!(run("{$FOR i 1 3$}{$= i $}{$END$}"), "123");
    assert_eq!(run("{$FOR i 3 1 -1$}{$= i $}{$END$}"), "321");
    assert_eq!(run("{$FOR i 1 0$}{$= i $}{$END$}"), "");
    assert_eq!(run("{$FOR i 1 2 0.5$}{$= i $},{$END$}"), "1,1.5,2.0,");
}

#[test]
fn test_loop_ends_at_integer_range_limits() {
    assert_eq!(
        run("{$FOR i 2147483646 2147483647$}{$= i $},{$END$}"),
        "2147483646,2147483647,"
    );
    assert_eq!(
        run("{$FOR i -2147483647 -2147483648 -1$}{$= i $},{$END$}"),
        "-2147483647,-2147483648,"
    );
    assert_eq!(run("{$FOR i 2147483640 2147483647 5$}{$= i $},{$END$}"), "2147483640,2147483645,");
}

#[test]
fn test_non_finite_strings_are_not_numbers() {
    let (err, _) = run_err("{$= \"nan\" 1 + $}");
    assert!(matches!(err, RuntimeError::NotANumber { ref value, .. } if value == "nan"));
    let (err, _) = run_err("{$FOR i 1 \"inf\"$}{$END$}");
    assert!(matches!(err, RuntimeError::NotANumber { .. }));
    assert_eq!(run("{$= \"Infinity\" 1 + $}"), "Infinity");
}

#[test]
fn test_loop_bounds_from_strings_and_variables() {
    assert_eq!(run("{$FOR i \"1\" \"3\"$}{$= i $}{$END$}"), "123");
    assert_eq!(
        run("{$FOR i 1 3$}{$FOR j i 3$}{$= j $}{$END$};{$END$}"),
        "123;23;3;"
    );
}

#[test]
fn test_same_name_shadows_outer_loop() {
    let output = run("{$FOR i 1 2$}[{$FOR i 10 11$}{$= i $}{$END$}]{$= i $}{$END$}");
    assert_eq!(output, "[1011]1[1011]2");
}

#[test]
fn test_dup_and_swap() {
    assert_eq!(run("{$= 1 2 @swap $}"), "21");
    assert_eq!(run("{$= \"x\" @dup $}"), "xx");
    assert_eq!(run("{$= 3 @dup * $}"), "9");
}

#[test]
fn test_parameters() {
    let mut context = RequestContext::buffered()
        .with_parameter("name", "Ana")
        .with_temporary_parameter("greeting", "Hi");
    render(
        "{$= \"greeting\" \"Hello\" @tparamGet $}, {$= \"name\" \"nobody\" @paramGet $} {$= \"missing\" 42 @paramGet $}",
        &mut context,
    )
    .unwrap();
    assert_eq!(context.output_text(), "Hi, Ana 42");
}

#[test]
fn test_persistent_parameters_survive_renders() {
    let path = Path::new("demos/visits.tmpl");
    let source = fs::read_to_string(path).expect("Failed to read demo template");

    let mut context = RequestContext::buffered().with_parameter("name", "Ana");
    render(&source, &mut context).unwrap();
    render(&source, &mut context).unwrap();

    assert_eq!(context.persistent_parameter("visits").as_deref(), Some("2"));
    let output = context.output_text();
    assert!(output.contains("Hello, Ana!"));
    assert!(output.contains("here 1 time(s)"));
    assert!(output.contains("here 2 time(s)"));
}

#[test]
fn test_parameter_deletion() {
    let mut context = RequestContext::buffered()
        .with_persistent_parameter("p", "1")
        .with_temporary_parameter("t", "2");
    render("{$= \"p\" @pparamDel \"t\" @tparamDel $}", &mut context).unwrap();
    assert_eq!(context.persistent_parameter("p"), None);
    assert_eq!(context.temporary_parameter("t"), None);
}

#[test]
fn test_fibonacci_demo() {
    let source = fs::read_to_string("demos/fibonacci.tmpl").expect("Failed to read demo template");
    let mut context = RequestContext::buffered();
    render(&source, &mut context).unwrap();

    assert_eq!(context.mime_type(), "text/plain");
    let output = context.output_text();
    let numbers: Vec<&str> = output.lines().skip(1).filter(|l| !l.is_empty()).collect();
    assert_eq!(numbers, vec!["0", "1", "1", "2", "3", "5", "8", "13", "21", "34"]);
}

#[test]
fn test_sine_demo() {
    let source = fs::read_to_string("demos/sine.tmpl").expect("Failed to read demo template");
    let output = run(&source);
    assert_eq!(
        output,
        "sin(0) = 0.000\nsin(0.25) = 0.247\nsin(0.5) = 0.479\nsin(0.75) = 0.682\nsin(1.0) = 0.841\n\n"
    );
}

#[test]
fn test_partial_output_kept_on_error() {
    let (err, output) = run_err("before{$= @nope $}after");
    assert!(matches!(err, RuntimeError::MethodNotFound { ref name, .. } if name == "nope"));
    assert_eq!(output, "before");
}

#[test]
fn test_caret_has_no_builtin() {
    let (err, _) = run_err("{$= 2 3 ^ $}");
    assert!(matches!(err, RuntimeError::MethodNotFound { .. }));
}

#[test]
fn test_stack_underflow() {
    let (err, _) = run_err("{$= 1 + $}");
    assert!(matches!(err, RuntimeError::StackUnderflow { .. }));
    let (err, _) = run_err("{$= @swap $}");
    assert!(matches!(err, RuntimeError::StackUnderflow { .. }));
}

#[test]
fn test_error_location_points_at_tag() {
    let (err, _) = run_err("line one\n  {$= 1 0 / $}");
    let location = err.location().expect("location");
    assert_eq!(location.line, 2);
    assert_eq!(location.column, 3);
}

#[test]
fn test_parse_errors_surface_through_render() {
    let mut context = RequestContext::buffered();
    let err = render("{$FOR i 1 3$}never closed", &mut context).unwrap_err();
    assert!(matches!(err, TemplateError::Parse(_)));
    assert_eq!(context.output_text(), "");
}

#[test]
fn test_one_tree_many_engines() {
    let document = parse("{$FOR i 1 3$}{$= i i * $} {$END$}").unwrap();

    let outputs: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let mut context = RequestContext::buffered();
                    Engine::new(&document, &mut context).execute().unwrap();
                    context.output_text()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(outputs.iter().all(|o| o == "1 4 9 "));
}

#[test]
fn test_trace_covers_every_step() {
    let document = parse("a{$FOR i 1 2$}{$= i $}{$END$}").unwrap();
    let mut context = RequestContext::buffered();
    let mut engine = Engine::new(&document, &mut context).with_trace(1 << 20);
    engine.execute().unwrap();
    let history = engine.into_history().unwrap();

    let kinds: Vec<StepKind> = (0..history.len())
        .map(|i| history.get(i).unwrap().kind.clone())
        .collect();
    let check = |continues| StepKind::LoopCheck {
        variable: "i".to_string(),
        continues,
    };
    assert_eq!(
        kinds,
        vec![
            StepKind::Start,
            StepKind::Text,
            check(true),
            StepKind::Echo,
            check(true),
            StepKind::Echo,
            check(false),
        ]
    );
    assert_eq!(history.transcript().as_str(), "a12");
    assert_eq!(context.output_text(), "a12");
}

#[test]
fn test_trace_limit_stops_execution() {
    let document = parse("{$FOR i 1 1000$}{$= i $}{$END$}").unwrap();
    let mut context = RequestContext::buffered();
    let mut engine = Engine::new(&document, &mut context).with_trace(2048);
    let err = engine.execute().unwrap_err();
    assert!(matches!(err, RuntimeError::SnapshotLimitExceeded { limit: 2048, .. }));
    let history = engine.into_history().unwrap();
    assert!(!history.is_empty());
    assert!(history.len() < 1000);
}

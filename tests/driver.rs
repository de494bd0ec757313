//! Whole-session tests: source text in, diagnostics and artifacts out.

use kaleidoscope::{
    codegen::SourceGenerator,
    driver::{Driver, Outcome, Summary, UnitKind},
    eval::Evaluator,
    lexer::{Lexer, ReadChars},
};
use pretty_assertions::assert_eq;

fn text(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf).into_owned()
}

fn eval_session(source: &str) -> (Summary, String, String) {
    let mut driver = Driver::new(
        Lexer::new(source.chars()),
        Evaluator::new(),
        Vec::new(),
        Vec::new(),
    )
    .with_prompt(None);
    let summary = driver.run().unwrap();
    (
        summary,
        text(driver.diagnostics()),
        text(driver.output()),
    )
}

#[test]
fn evaluates_a_session() {
    let source = "
        # helpers
        extern sin(x);
        def square(x) x * x;
        def hyp(a b) square(a) + square(b);
        hyp(3, 4);
        sin(0) < 1;
    ";
    let (summary, diagnostics, output) = eval_session(source);

    assert_eq!(
        summary,
        Summary {
            units: 5,
            parse_failures: 0,
            generate_failures: 0,
        }
    );
    assert_eq!(
        output,
        "declared extern sin\ndefined square\ndefined hyp\nEvaluated to 25\nEvaluated to 1\n"
    );
    assert_eq!(
        diagnostics,
        "Parsed an extern\nParsed a function definition.\nParsed a function definition.\n\
         Parsed a top-level expr\nParsed a top-level expr\n"
    );
}

#[test]
fn recovers_from_missing_close_paren() {
    let (summary, diagnostics, output) = eval_session("def f(x) x; f(1\n; f(2)");

    assert_eq!(summary.parse_failures, 1);
    assert_eq!(summary.units, 2);
    assert_eq!(output, "defined f\nEvaluated to 2\n");
    assert!(diagnostics.contains("Error: expected ')' or ',' in argument list, found ';'"));
}

#[test]
fn errors_cascade_but_never_stop_the_session() {
    // `def` fails on '(' which is discarded, `x` parses but is unknown,
    // then `)` fails and is discarded before `1` parses cleanly
    let (summary, diagnostics, output) = eval_session("def (x) 1; 7");

    assert_eq!(
        diagnostics.lines().filter(|line| line.starts_with("Error:")).count(),
        3
    );
    assert_eq!(summary.parse_failures, 2);
    assert_eq!(summary.generate_failures, 1);
    assert_eq!(summary.units, 3);
    assert!(output.ends_with("Evaluated to 7\n"));
}

#[test]
fn generation_errors_use_the_same_convention() {
    let (summary, diagnostics, output) = eval_session("def f(x) y; g(1); extern nope(a)");

    assert_eq!(summary.generate_failures, 3);
    assert!(output.is_empty());
    assert_eq!(
        diagnostics,
        "Parsed a function definition.\nError: unknown variable referenced y\n\
         Parsed a top-level expr\nError: unknown function g\n\
         Parsed an extern\nError: no native function nope\n"
    );
}

#[test]
fn source_generator_round_trips() {
    let source = "def f(a b) a - b - 1 * 2; extern cos(t); f(1, 2) < 3";
    let mut driver = Driver::new(
        Lexer::new(source.chars()),
        SourceGenerator::default(),
        Vec::new(),
        Vec::new(),
    )
    .with_prompt(None);
    driver.run().unwrap();
    let first = text(driver.output());
    assert_eq!(
        first,
        "def f(a b) ((a - b) - (1 * 2))\nextern cos(t)\n(f(1, 2) < 3)\n"
    );

    let mut again = Driver::new(
        Lexer::new(first.chars()),
        SourceGenerator::default(),
        Vec::new(),
        Vec::new(),
    )
    .with_prompt(None);
    again.run().unwrap();
    assert_eq!(text(again.output()), first);
}

#[test]
fn stepping_unit_by_unit() {
    let mut driver = Driver::new(
        Lexer::new("extern cos(x) cos(0)".chars()),
        Evaluator::new(),
        Vec::new(),
        Vec::new(),
    );
    assert_eq!(
        driver.run_one_unit().unwrap(),
        Outcome::Parsed(UnitKind::Extern)
    );
    assert!(driver.generator().is_defined("cos"));
    assert_eq!(
        driver.run_one_unit().unwrap(),
        Outcome::Parsed(UnitKind::TopLevel)
    );
    assert_eq!(driver.run_one_unit().unwrap(), Outcome::Finished);
    assert_eq!(text(driver.output()), "declared extern cos\nEvaluated to 1\n");
}

#[test]
fn huge_sum_is_reported_not_fatal() {
    let source = format!("1{}; 2 + 3", "+1".repeat(49_999));
    let (summary, diagnostics, output) = eval_session(&source);

    assert!(summary.parse_failures > 0);
    assert!(diagnostics.contains("Error: expression nested deeper than 256 levels"));
    assert!(output.ends_with("Evaluated to 5\n"));
}

#[test]
fn huge_sum_with_source_generator() {
    let source = format!("1{}; f(x)", "+1".repeat(49_999));
    let mut driver = Driver::new(
        Lexer::new(source.chars()),
        SourceGenerator::default(),
        Vec::new(),
        Vec::new(),
    )
    .with_prompt(None);
    let summary = driver.run().unwrap();

    assert!(summary.parse_failures > 0);
    assert!(text(driver.output()).ends_with("f(x)\n"));
}

#[test]
fn deeply_nested_parens_are_reported_not_fatal() {
    let source = format!("{}1{}; 4", "(".repeat(10_000), ")".repeat(10_000));
    let (summary, diagnostics, output) = eval_session(&source);

    assert!(summary.parse_failures > 0);
    assert!(diagnostics.contains("Error: expression nested deeper than 256 levels"));
    assert!(output.ends_with("Evaluated to 4\n"));
}

#[test]
fn invalid_utf8_line_does_not_end_session() {
    let chars = ReadChars::new(&b"1+2\n\xff\xfe\n3+4\n"[..]);
    let mut driver = Driver::new(Lexer::new(chars), Evaluator::new(), Vec::new(), Vec::new())
        .with_prompt(None);
    let summary = driver.run().unwrap();

    assert_eq!(text(driver.output()), "Evaluated to 3\nEvaluated to 7\n");
    assert_eq!(summary.parse_failures, 2);
}

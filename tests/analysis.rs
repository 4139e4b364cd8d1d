//! End-to-end scenarios through the parser and the analyzer.
//!
//! Each test feeds concrete source text through the whole pipeline and
//! checks the assertion verdicts and, where it matters, the abstract store
//! at program exit.

use absint_rs::{analyze, parse, AssertionStatus, Bound, Interval, Lattice, WarningKind};

fn run(source: &str) -> absint_rs::Report {
    analyze(&parse(source).expect("program should parse"))
}

fn ival(l: i64, h: i64) -> Interval {
    Interval::new(Bound::Finite(l), Bound::Finite(h))
}

fn statuses(report: &absint_rs::Report) -> Vec<AssertionStatus> {
    report.assertions().map(|(_, status)| status).collect()
}

// ─── Straight-line programs ────────────────────────────────────────────────────

#[test]
fn increment_within_bounds() {
    let report = run("int a, b;\nassume(a >= 0, a <= 10);\nb = a + 1;\nassert(b <= 11);");
    assert_eq!(statuses(&report), vec![AssertionStatus::Verified]);
    assert_eq!(report.store.get("a"), ival(0, 10));
    assert_eq!(report.store.get("b"), ival(1, 11));
    assert!(report.all_verified());
}

#[test]
fn arithmetic_chain() {
    let report = run(concat!(
        "int a, b, c;\n",
        "assume(a >= 2, a <= 4);\n",
        "b = a * a;\n",         // b in [4, 16]
        "c = b - a;\n",         // c in [0, 14]
        "assert(c >= 0);\n",
        "assert(c <= 14);"
    ));
    assert_eq!(
        statuses(&report),
        vec![AssertionStatus::Verified, AssertionStatus::Verified]
    );
    assert_eq!(report.store.get("c"), ival(0, 14));
}

#[test]
fn division_by_zero_reported_result_is_top() {
    let report = run("int a, b;\nassume(a >= 0, a <= 10);\nb = a / 0;");
    assert!(report
        .warnings()
        .any(|(_, kind)| *kind == WarningKind::DivisionByZero));
    assert_eq!(report.store.get("b"), Interval::TOP);
}

#[test]
fn division_by_possibly_zero_divisor() {
    let report = run("int a, b;\nassume(a >= -1, a <= 1);\nb = 10 / a;");
    assert!(report
        .warnings()
        .any(|(_, kind)| *kind == WarningKind::DivisionByZero));
    assert_eq!(report.store.get("b"), Interval::TOP);
}

// ─── Branching ─────────────────────────────────────────────────────────────────

#[test]
fn branch_join_keeps_both_outcomes() {
    let report = run("int a, b;\nassume(a >= 0);\nif (a < 5) { b = 1; } else { b = 2; }\nassert(b >= 1);");
    assert_eq!(statuses(&report), vec![AssertionStatus::Verified]);
    assert_eq!(report.store.get("b"), ival(1, 2));
}

#[test]
fn equality_guard_makes_else_unreachable() {
    let report = run("int a, b;\nassume(a == 5);\nif (a == 5) { b = 1; } else { b = 2; }\nassert(b == 1);");
    assert_eq!(statuses(&report), vec![AssertionStatus::Verified]);
    assert_eq!(report.store.get("b"), Interval::singleton(1));
    assert!(report
        .warnings()
        .any(|(_, kind)| *kind == WarningKind::UnreachableBranch));
}

#[test]
fn dead_then_branch_assertion_is_vacuous() {
    let report = run("int a;\nassume(a >= 0, a <= 10);\nif (a >= 20) { assert(false); }");
    assert_eq!(statuses(&report), vec![AssertionStatus::Unreachable]);
    assert!(report.all_verified());
    assert!(report
        .warnings()
        .any(|(_, kind)| *kind == WarningKind::UnreachableBranch));
}

#[test]
fn else_if_chain() {
    let report = run(concat!(
        "int a, b;\n",
        "assume(a >= 0, a <= 30);\n",
        "if (a < 10) { b = 1; } else if (a < 20) { b = 2; } else { b = 3; }\n",
        "assert(b >= 1);\n",
        "assert(b <= 3);"
    ));
    assert_eq!(
        statuses(&report),
        vec![AssertionStatus::Verified, AssertionStatus::Verified]
    );
    assert_eq!(report.store.get("b"), ival(1, 3));
}

// ─── Loops ─────────────────────────────────────────────────────────────────────

#[test]
fn count_up_from_unbounded_precondition() {
    let report = run("int a;\nassume(a >= 0);\nwhile (a < 100) { a = a + 1; }\nassert(a >= 100);");
    assert_eq!(statuses(&report), vec![AssertionStatus::Verified]);
    assert_eq!(
        report.store.get("a"),
        Interval::new(Bound::Finite(100), Bound::PosInf)
    );
}

#[test]
fn count_up_from_zero_narrowing_restores_the_bound() {
    let report = run("int a;\na = 0;\nwhile (a < 100) { a = a + 1; }\nassert(a == 100);");
    assert_eq!(statuses(&report), vec![AssertionStatus::Verified]);
    assert_eq!(report.store.get("a"), Interval::singleton(100));
}

#[test]
fn countdown_loop() {
    let report = run("int a;\na = 100;\nwhile (a > 0) { a = a - 1; }\nassert(a == 0);");
    assert_eq!(statuses(&report), vec![AssertionStatus::Verified]);
    assert_eq!(report.store.get("a"), Interval::singleton(0));
}

#[test]
fn loop_summing_two_counters() {
    let report = run(concat!(
        "int i, s;\n",
        "i = 0;\ns = 0;\n",
        "while (i < 10) { s = s + 2; i = i + 1; }\n",
        "assert(i == 10);\n",
        "assert(s >= 0);"
    ));
    assert_eq!(
        statuses(&report),
        vec![AssertionStatus::Verified, AssertionStatus::Verified]
    );
    assert_eq!(report.store.get("i"), Interval::singleton(10));
}

#[test]
fn nested_loops() {
    let report = run(concat!(
        "int i, j;\ni = 0;\n",
        "while (i < 10) { j = 0; while (j < i) { j = j + 1; } i = i + 1; }\n",
        "assert(i == 10);"
    ));
    assert_eq!(statuses(&report), vec![AssertionStatus::Verified]);
}

#[test]
fn loop_body_never_entered() {
    let report = run("int a;\nassume(a >= 0);\nwhile (a < 0) { a = a - 1; }\nassert(a >= 0);");
    assert_eq!(statuses(&report), vec![AssertionStatus::Verified]);
    assert!(report
        .warnings()
        .any(|(_, kind)| *kind == WarningKind::UnreachableBranch));
}

#[test]
fn assertion_inside_loop_reported_exactly_once() {
    let report = run("int a;\na = 0;\nwhile (a < 3) { assert(a <= 3); a = a + 1; }");
    assert_eq!(report.assertions().collect::<Vec<_>>(), vec![(3, AssertionStatus::Verified)]);
}

// ─── Verdicts and exit-state ───────────────────────────────────────────────────

#[test]
fn falsified_assertion() {
    let report = run("int a;\na = 5;\nassert(a < 0);");
    assert_eq!(statuses(&report), vec![AssertionStatus::Falsified]);
    assert!(!report.all_verified());
}

#[test]
fn unknown_assertion() {
    let report = run("int a;\nassume(a >= 0);\nassert(a < 10);");
    assert_eq!(statuses(&report), vec![AssertionStatus::Unknown]);
    assert!(!report.all_verified());
}

#[test]
fn mixed_verdicts_render_in_program_order() {
    let report = run(concat!(
        "int a;\n",
        "assume(a >= 0, a <= 10);\n",
        "assert(a >= 0);\n",    // OK
        "assert(a >= 5);\n",    // UNKNOWN
        "a = 20;\n",
        "assert(a <= 10);"      // FAIL
    ));
    assert_eq!(
        statuses(&report),
        vec![
            AssertionStatus::Verified,
            AssertionStatus::Unknown,
            AssertionStatus::Falsified,
        ]
    );
    let rendered = report.to_string();
    assert!(rendered.contains("OK 3"));
    assert!(rendered.contains("UNKNOWN 4: [0, 10] >= [5, 5]"));
    assert!(rendered.contains("FAIL 6: [20, 20] <= [10, 10]"));
}

#[test]
fn contradictory_preconditions_verify_vacuously() {
    let report = run("int a;\nassume(a >= 5, a <= 2);\na = a + 1;\nassert(a == 99);");
    assert_eq!(statuses(&report), vec![AssertionStatus::Unreachable]);
    assert!(report.all_verified());
    assert!(report.store.is_bottom());
}

// ─── Warnings ──────────────────────────────────────────────────────────────────

#[test]
fn undeclared_variable_read() {
    let report = run("int x;\nx = y + 1;\nassert(x >= 0);");
    assert!(report
        .warnings()
        .any(|(_, kind)| matches!(kind, WarningKind::UndeclaredVariable(v) if v == "y")));
    assert_eq!(statuses(&report), vec![AssertionStatus::Unknown]);
}

#[test]
fn overflow_saturation_warning() {
    let report = run(&format!("int a;\na = {};\na = a + 1;\nassert(a >= 0);", i64::MAX));
    assert!(report
        .warnings()
        .any(|(_, kind)| *kind == WarningKind::OverflowSaturation));
    assert_eq!(statuses(&report), vec![AssertionStatus::Verified]);
}

#[test]
fn malformed_precondition_clause() {
    let report = run("int a, b;\nassume(a + b <= 10);\nassert(a <= 10);");
    assert!(report
        .warnings()
        .any(|(_, kind)| *kind == WarningKind::UnsupportedCondition));
    assert_eq!(statuses(&report), vec![AssertionStatus::Unknown]);
}

// ─── Determinism ───────────────────────────────────────────────────────────────

#[test]
fn identical_input_identical_output() {
    let source = concat!(
        "int a, b;\n",
        "assume(a >= 0, a <= 10);\n",
        "if (a != 0) { b = 100 / a; } else { b = 0; }\n",
        "while (b > 0) { b = b - 1; }\n",
        "assert(b == 0);"
    );
    let first = run(source);
    let second = run(source);
    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(first.diagnostics, second.diagnostics);
    assert!(first.store == second.store);
}

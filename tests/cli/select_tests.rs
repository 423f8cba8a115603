//! Tests for the `select` CLI command, end to end from a baseline

use super::baseline_tests::{baselined_math_repo, FAKE_SUITE};
use crate::common::test_repo::{MATH_SOURCE, MATH_TEST};
use crate::common::{assert_contains, assert_json_type, assert_valid_json, TestRepo};

fn strings(json: &serde_json::Value) -> Vec<String> {
    json.as_array()
        .expect("array")
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn change_and_analyze(repo: &TestRepo, file: &str, content: &str) {
    repo.add_file(file, content).commit("change");
    repo.run_cli_success(&["analyze", "--before", "HEAD~1"]);
}

#[test]
fn test_changed_function_selects_tests_that_reached_it() {
    let repo = baselined_math_repo();
    change_and_analyze(&repo, "src/math.ts", &MATH_SOURCE.replace("return a - b;", "return b - a;"));

    let output = repo.run_cli_success(&["select", "-f", "json"]);
    let json = assert_valid_json(&output, "select");
    assert_json_type(&json, "selection");
    assert_eq!(
        strings(&json["selection"]["tests_to_run"]),
        vec!["src/math.test.ts > math > subtracts"]
    );
    assert!(strings(&json["selection"]["files_to_run"]).is_empty());

    let rerunnable = std::fs::read_to_string(repo.results_path().join("rerunnableTests.txt"))
        .expect("rerunnable tests artifact");
    assert_contains(&rerunnable, "src/math.test.ts > math > subtracts");
}

#[test]
fn test_shared_function_selects_across_files() {
    let repo = baselined_math_repo();
    change_and_analyze(&repo, "src/math.ts", &MATH_SOURCE.replace("return a + b;", "return b + a;"));

    let output = repo.run_cli_success(&["s", "-f", "json"]);
    let json = assert_valid_json(&output, "select shared");
    assert_eq!(
        strings(&json["selection"]["tests_to_run"]),
        vec![
            "src/format.test.ts > formats sums",
            "src/math.test.ts > math > adds",
        ]
    );
}

#[test]
fn test_out_of_test_edges_select_nothing() {
    let repo = baselined_math_repo();
    // push is only reached outside any test in the recorded run
    change_and_analyze(
        &repo,
        "src/math.ts",
        &MATH_SOURCE.replace("return this;", "return this.total;"),
    );

    let output = repo.run_cli_success(&["select", "-f", "json"]);
    let json = assert_valid_json(&output, "select undefined");
    assert!(strings(&json["selection"]["tests_to_run"]).is_empty());
}

#[test]
fn test_fallback_file_runs_importing_test_files() {
    let repo = baselined_math_repo();
    change_and_analyze(&repo, "src/math.ts", &MATH_SOURCE.replace("total = 0;", "total = 1;"));

    let output = repo.run_cli_success(&["select", "-f", "json"]);
    let json = assert_valid_json(&output, "select fallback");
    assert_eq!(
        strings(&json["selection"]["files_to_run"]),
        vec!["src/format.test.ts", "src/math.test.ts"]
    );
}

#[test]
fn test_modified_test_file_runs_in_full() {
    let repo = baselined_math_repo();
    change_and_analyze(&repo, "src/math.test.ts", &MATH_TEST.replace("toBe(1)", "toBe(2 - 1)"));

    let output = repo.run_cli_success(&["select", "-f", "json"]);
    let json = assert_valid_json(&output, "select modified test");
    assert_eq!(
        strings(&json["selection"]["files_to_run"]),
        vec!["src/math.test.ts"]
    );
}

#[test]
fn test_apply_skips_unselected_tests() {
    let repo = baselined_math_repo();
    change_and_analyze(&repo, "src/math.ts", &MATH_SOURCE.replace("return a - b;", "return b - a;"));

    let snapshot = repo.snapshot_path();
    let snapshot = snapshot.to_str().expect("utf-8 temp path");
    let output = repo.run_cli_success(&["select", "--apply", snapshot]);
    assert_contains(&output, "rewritten: 2 files, 2 tests skipped");

    let math_test = repo.read_snapshot_file("src/math.test.ts");
    assert_contains(&math_test, "it.skip('adds'");
    assert_contains(&math_test, "it('subtracts'");
    assert_contains(&repo.read_snapshot_file("src/format.test.ts"), "it.skip('formats sums'");
}

#[test]
fn test_apply_and_run_uses_configured_runner() {
    let repo = baselined_math_repo();
    change_and_analyze(&repo, "src/math.ts", &MATH_SOURCE.replace("return a - b;", "return b - a;"));

    let snapshot = repo.snapshot_path();
    let snapshot = snapshot.to_str().expect("utf-8 temp path");
    let output = repo.run_cli_success(&["select", "--apply", snapshot, "--run"]);
    assert_contains(&output, "suite: passed");
    assert_contains(&output, "Tests  3 passed (3)");
}

#[test]
fn test_retest_all_needs_no_artifacts() {
    let repo = TestRepo::new();
    repo.with_math_project();

    let output = repo.run_cli_success(&["select", "--mode", "retest-all", "-f", "json"]);
    let json = assert_valid_json(&output, "select retest-all");
    assert_eq!(json["mode"], "RetestAll");
    assert_eq!(json["selection"]["retest_all"], true);
}

#[test]
fn test_missing_analysis_is_reported() {
    let repo = TestRepo::new();
    repo.with_math_project();

    let (_, stderr, code) = repo.run_cli_failure(&["select"]);
    assert_eq!(code, Some(6));
    assert_contains(&stderr, "semfora-rts analyze");
}

const WIDGET_SOURCE: &str = "export const Widget = class Impl {\n  render(x: number) {\n    return x;\n  }\n};\n";

#[test]
fn test_named_class_expression_method_is_selected() {
    let repo = TestRepo::new();
    // render gets id 4, after the math project's functions
    let suite = format!(
        "{}; printf '%s' '{}' >> \"$RTS_TRACE_LOG\"",
        FAKE_SUITE, r#"{"function":4,"test":"src/math.test.ts > math > adds"},"#
    );
    repo.init_git()
        .with_math_project()
        .add_file("src/widget.ts", WIDGET_SOURCE)
        .with_shell_runner("true", &suite)
        .commit("base");
    repo.run_cli_success(&["baseline"]);

    let functions = crate::common::assert_json_artifact(&repo.results_path(), "functionsMap.json");
    assert_eq!(functions["4"]["function"], "render");
    assert_eq!(functions["4"]["class"], "Widget");

    change_and_analyze(&repo, "src/widget.ts", &WIDGET_SOURCE.replace("return x;", "return x * 2;"));
    let output = repo.run_cli_success(&["select", "-f", "json"]);
    let json = assert_valid_json(&output, "select class expression");
    assert_eq!(
        strings(&json["selection"]["tests_to_run"]),
        vec!["src/math.test.ts > math > adds"]
    );
}

const TABLE_TEST: &str = "const NAME = 'named';\nit(NAME, () => {});\nfor (const n of [1, 2]) {\n  it(`case ${n}`, () => {});\n}\nit('static', () => {});\n";

#[test]
fn test_apply_never_skips_computed_titles() {
    let repo = TestRepo::new();
    repo.init_git()
        .with_math_project()
        .add_file("src/table.test.ts", TABLE_TEST)
        .with_shell_runner("true", FAKE_SUITE)
        .commit("base");
    repo.run_cli_success(&["baseline"]);
    change_and_analyze(&repo, "src/math.ts", &MATH_SOURCE.replace("return a - b;", "return b - a;"));

    let snapshot = repo.snapshot_path();
    let snapshot = snapshot.to_str().expect("utf-8 temp path");
    repo.run_cli_success(&["select", "--apply", snapshot]);

    let table = repo.read_snapshot_file("src/table.test.ts");
    assert_contains(&table, "it(NAME, () => {});");
    assert_contains(&table, "it(`case ${n}`, () => {});");
    assert_contains(&table, "it.skip('static', () => {});");
    assert_contains(&repo.read_snapshot_file("src/math.test.ts"), "it('subtracts'");
}

//! Tests for the `baseline` CLI command

use crate::common::{
    assert_contains, assert_json_artifact, assert_json_type, assert_valid_json, TestRepo,
};

/// Stand-in for `vitest run` on the math project: every traced call the
/// real suite would make, plus vitest's summary lines.
pub const FAKE_SUITE: &str = concat!(
    "printf '%s' '",
    r#"{"function":1,"test":"src/math.test.ts > math > adds"},"#,
    r#"{"function":2,"test":"src/math.test.ts > math > subtracts"},"#,
    r#"{"function":0,"test":"src/format.test.ts > formats sums"},"#,
    r#"{"function":1,"test":"src/format.test.ts > formats sums"},"#,
    r#"{"function":1,"test":"src/format.test.ts > formats sums"},"#,
    r#"{"function":3,"test":"undefined"},"#,
    "' >> \"$RTS_TRACE_LOG\"; ",
    "echo ' Test Files  2 passed (2)'; ",
    "echo '      Tests  3 passed (3)'; ",
    "echo '   Duration  1.20s'",
);

pub fn baselined_math_repo() -> TestRepo {
    let repo = TestRepo::new();
    repo.init_git()
        .with_math_project()
        .with_shell_runner("true", FAKE_SUITE)
        .commit("base");
    repo.run_cli_success(&["baseline"]);
    repo
}

#[test]
fn test_baseline_records_dynamic_graph() {
    let repo = baselined_math_repo();
    let results = repo.results_path();

    let graph = assert_json_artifact(&results, "dynamicDependencyGraph.json");
    let edges = graph.as_array().expect("edge list");
    // duplicate fragments collapse
    assert_eq!(edges.len(), 5);
    assert!(edges.contains(&serde_json::json!({
        "function": 2,
        "test": "src/math.test.ts > math > subtracts"
    })));
    assert!(!results.join("dynamicDependencyGraph.log").exists());

    let functions = assert_json_artifact(&results, "functionsMap.json");
    assert_eq!(functions["1"]["function"], "add");
    assert_eq!(functions["2"]["function"], "sub");

    let static_graph = assert_json_artifact(&results, "staticFileDependency.json");
    assert_eq!(static_graph["src/math.test.ts"], serde_json::json!(["src/math.ts"]));
}

#[test]
fn test_baseline_manifest_and_output() {
    let repo = TestRepo::new();
    repo.with_math_project().with_shell_runner("true", FAKE_SUITE);

    let output = repo.run_cli_success(&["baseline", "-f", "json"]);
    let json = assert_valid_json(&output, "baseline");
    assert_json_type(&json, "baseline");
    let manifest = &json["manifest"];
    assert_eq!(manifest["functions"], 4);
    assert_eq!(manifest["tests"], 3);
    assert_eq!(manifest["edges"], 5);
    assert_eq!(manifest["test_success"], true);
    assert_eq!(manifest["test_summary"]["tests"], "Tests  3 passed (3)");

    let saved = assert_json_artifact(&repo.results_path(), "baseline.json");
    assert_eq!(saved["edges"], 5);

    // runtime survives the install step
    assert!(repo
        .snapshot_path()
        .join("node_modules/rts-trace/index.js")
        .exists());
}

#[test]
fn test_failing_suite_still_yields_baseline() {
    let repo = TestRepo::new();
    repo.with_math_project()
        .with_shell_runner("true", &format!("{}; exit 1", FAKE_SUITE));

    let output = repo.run_cli_success(&["baseline"]);
    assert_contains(&output, "suite: failed");
    assert_contains(&output, "dependency_edges: 5");
}

#[test]
fn test_install_failure_aborts_baseline() {
    let repo = TestRepo::new();
    repo.with_math_project()
        .with_shell_runner("echo 'registry unreachable' >&2; exit 3", FAKE_SUITE);

    let (_, stderr, code) = repo.run_cli_failure(&["baseline"]);
    assert_eq!(code, Some(7));
    assert_contains(&stderr, "registry unreachable");
}

//! Tests for the `instrument` and `graph` CLI commands

use crate::common::{
    assert_contains, assert_json_artifact, assert_json_type, assert_valid_json, TestRepo,
};

#[test]
fn test_instrument_writes_snapshot_and_artifacts() {
    let repo = TestRepo::new();
    repo.with_math_project();

    let output = repo.run_cli_success(&["instrument", "-f", "json"]);
    let json = assert_valid_json(&output, "instrument");
    assert_json_type(&json, "instrumentation");
    assert_eq!(json["report"]["functions"], 4);
    assert_eq!(json["report"]["failed_files"], serde_json::json!([]));

    let functions = assert_json_artifact(&repo.results_path(), "functionsMap.json");
    let entries = functions.as_object().expect("functions map is an object");
    assert_eq!(entries.len(), 4);
    assert_eq!(entries["0"]["function"], "formatSum");
    assert_eq!(entries["3"]["class"], "Calculator");

    let tests = assert_json_artifact(&repo.results_path(), "allTests.json");
    let tests: Vec<&str> = tests
        .as_array()
        .expect("test list")
        .iter()
        .filter_map(|t| t.as_str())
        .collect();
    assert_eq!(
        tests,
        vec![
            "src/format.test.ts > formats sums",
            "src/math.test.ts > adds",
            "src/math.test.ts > subtracts",
        ]
    );
}

#[test]
fn test_instrumented_source_keeps_line_numbers() {
    let repo = TestRepo::new();
    repo.with_math_project();
    repo.run_cli_success(&["instrument"]);

    let original = repo.read_file("src/math.ts");
    let instrumented = repo.read_snapshot_file("src/math.ts");
    assert_eq!(original.lines().count(), instrumented.lines().count());
    assert!(instrumented.starts_with("import __rtsTrace from 'rts-trace';"));
    assert_contains(&instrumented, r#"{"function":1,"test":"#);
    assert_contains(&instrumented, r#"{"function":3,"test":"#);

    let arrow = repo.read_snapshot_file("src/format.ts");
    assert_contains(&arrow, "return `${add(a, b)}`;}");

    let test_file = repo.read_snapshot_file("src/math.test.ts");
    assert_contains(&test_file, "__rtsAfterAll(async () => { await __rtsTrace.endLogger(); });");
    assert_eq!(repo.read_snapshot_file("package.json"), repo.read_file("package.json"));
}

#[test]
fn test_instrument_installs_runtime_module() {
    let repo = TestRepo::new();
    repo.with_math_project();
    repo.run_cli_success(&["instrument"]);

    let runtime = repo.snapshot_path().join("node_modules/rts-trace");
    let index = std::fs::read_to_string(runtime.join("index.js")).expect("runtime index");
    assert_contains(&index, "RTS_TRACE_LOG");
    assert!(!index.contains("__FLUSH_THRESHOLD__"));
    let manifest: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(runtime.join("package.json")).expect("runtime manifest"),
    )
    .expect("runtime manifest is json");
    assert_eq!(manifest["name"], "rts-trace");
}

#[test]
fn test_syntax_errors_are_copied_uninstrumented() {
    let repo = TestRepo::new();
    repo.with_math_project()
        .add_file("src/broken.ts", "export function broken( {\n");

    let output = repo.run_cli_success(&["instrument", "-f", "json"]);
    let json = assert_valid_json(&output, "instrument broken");
    assert_eq!(json["report"]["failed_files"], serde_json::json!(["src/broken.ts"]));
    assert_eq!(
        repo.read_snapshot_file("src/broken.ts"),
        "export function broken( {\n"
    );
}

#[test]
fn test_excluded_files_are_not_instrumented() {
    let repo = TestRepo::new();
    repo.with_math_project().add_file(
        "rts.toml",
        "[project]\nfiles_to_exclude = [\"src/format.ts\"]\n",
    );

    repo.run_cli_success(&["instrument"]);
    assert_eq!(
        repo.read_snapshot_file("src/format.ts"),
        repo.read_file("src/format.ts")
    );
    let functions = assert_json_artifact(&repo.results_path(), "functionsMap.json");
    assert_eq!(functions["0"]["function"], "add");
}

#[test]
fn test_graph_writes_static_dependencies() {
    let repo = TestRepo::new();
    repo.with_math_project();

    let output = repo.run_cli_success(&["graph", "-f", "json"]);
    let json = assert_valid_json(&output, "graph");
    assert_json_type(&json, "static_graph");
    assert_eq!(json["graph"]["src/format.ts"], serde_json::json!(["src/math.ts"]));
    assert_eq!(
        json["graph"]["src/format.test.ts"],
        serde_json::json!(["src/format.ts"])
    );
    assert_eq!(json["graph"]["src/math.ts"], serde_json::json!([]));

    let saved = assert_json_artifact(&repo.results_path(), "staticFileDependency.json");
    assert_eq!(saved, json["graph"]);
}

//! Tests for the `analyze` CLI command

use crate::common::{
    assert_contains, assert_json_type, assert_valid_json, assert_valid_toon, descriptor_names,
    read_list_artifact, TestRepo,
};

fn committed_math_repo() -> TestRepo {
    let repo = TestRepo::new();
    repo.init_git().with_math_project().commit("base");
    repo
}

#[test]
fn test_parameter_rename_is_not_a_change() {
    let repo = committed_math_repo();
    repo.add_file(
        "src/math.ts",
        &crate::common::test_repo::MATH_SOURCE.replace(
            "add(a: number, b: number): number {\n  return a + b;",
            "add(x: number, y: number): number {\n  return x + y;",
        ),
    )
    .commit("rename params");

    let output = repo.run_cli_success(&["analyze", "--before", "HEAD~1", "-f", "json"]);
    let json = assert_valid_json(&output, "analyze rename");
    assert_json_type(&json, "analysis");
    assert!(descriptor_names(&json["analysis"]["changed_functions"]).is_empty());
    assert_eq!(json["analysis"]["semantically_changed_files"], serde_json::json!([]));
}

#[test]
fn test_body_change_selects_one_function() {
    let repo = committed_math_repo();
    repo.add_file(
        "src/math.ts",
        &crate::common::test_repo::MATH_SOURCE.replace("return a - b;", "return b - a;"),
    )
    .commit("flip sub");

    let output = repo.run_cli_success(&["analyze", "--before", "HEAD~1", "-f", "json"]);
    let json = assert_valid_json(&output, "analyze body change");
    let changed = &json["analysis"]["changed_functions"];
    assert_eq!(descriptor_names(changed), vec!["sub"]);
    assert_eq!(changed[0]["file"], "src/math.ts");
    assert_eq!(changed[0]["params"], 2);
    assert!(changed[0].get("class").is_none());
}

#[test]
fn test_normal_mode_marks_every_function_of_the_file() {
    let repo = committed_math_repo();
    repo.add_file(
        "src/math.ts",
        &crate::common::test_repo::MATH_SOURCE.replace("return a - b;", "return b - a;"),
    )
    .commit("flip sub");

    let output = repo.run_cli_success(&[
        "analyze", "--before", "HEAD~1", "--mode", "normal", "-f", "json",
    ]);
    let json = assert_valid_json(&output, "analyze normal");
    assert_eq!(json["mode"], "NormalRTS");
    let mut names = descriptor_names(&json["analysis"]["changed_functions"]);
    names.sort();
    assert_eq!(names, vec!["add", "push", "sub"]);
}

#[test]
fn test_deleted_file_marks_its_functions() {
    let repo = committed_math_repo();
    repo.remove_file("src/format.ts").commit("drop format");

    let output = repo.run_cli_success(&["analyze", "--before", "HEAD~1", "-f", "json"]);
    let json = assert_valid_json(&output, "analyze deletion");
    assert_eq!(
        descriptor_names(&json["analysis"]["changed_functions"]),
        vec!["formatSum"]
    );
}

#[test]
fn test_class_property_change_falls_back_to_file() {
    let repo = committed_math_repo();
    repo.add_file(
        "src/math.ts",
        &crate::common::test_repo::MATH_SOURCE.replace("total = 0;", "total = 1;"),
    )
    .commit("seed total");

    repo.run_cli_success(&["analyze", "--before", "HEAD~1"]);
    let results = repo.results_path();
    assert_eq!(
        read_list_artifact(&results, "ExtendedRTSFallbackFiles.txt"),
        vec!["src/math.ts"]
    );
    assert_eq!(
        read_list_artifact(&results, "ExtendedRTSSemanticallyChangedFiles.txt"),
        vec!["src/math.ts"]
    );
}

#[test]
fn test_modified_test_file_is_listed_not_diffed() {
    let repo = committed_math_repo();
    repo.add_file(
        "src/math.test.ts",
        &crate::common::test_repo::MATH_TEST.replace("toBe(3)", "toBe(1 + 2)"),
    )
    .commit("tweak test");

    repo.run_cli_success(&["analyze", "--before", "HEAD~1"]);
    let results = repo.results_path();
    assert_eq!(
        read_list_artifact(&results, "ExtendedRTSModifiedTestFiles.txt"),
        vec!["src/math.test.ts"]
    );
    let functions = std::fs::read_to_string(results.join("ExtendedRTSChangedFunctions.json"))
        .expect("changed functions artifact");
    assert_eq!(functions.trim(), "[]");
}

#[test]
fn test_text_and_toon_output() {
    let repo = committed_math_repo();
    repo.add_file(
        "src/math.ts",
        &crate::common::test_repo::MATH_SOURCE.replace("return a - b;", "return b - a;"),
    )
    .commit("flip sub");

    let text = repo.run_cli_success(&["analyze", "--before", "HEAD~1"]);
    assert_contains(&text, "changed_functions[1]:");
    assert_contains(&text, "sub(2) src/math.ts");

    let toon = repo.run_cli_success(&["a", "--before", "HEAD~1", "-f", "toon"]);
    assert_valid_toon(&toon, "analyze toon");
}

#[test]
fn test_outside_git_repo_fails() {
    let repo = TestRepo::new();
    repo.with_math_project();
    let (_, stderr, code) = repo.run_cli_failure(&["analyze", "--before", "HEAD~1"]);
    assert_eq!(code, Some(5));
    assert_contains(&stderr, "Error:");
}

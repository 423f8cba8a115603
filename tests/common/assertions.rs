//! Custom assertions for integration tests

use std::path::Path;

use serde_json::Value;

/// Assert that output is valid JSON and return parsed value
pub fn assert_valid_json(output: &str, context: &str) -> Value {
    serde_json::from_str(output).unwrap_or_else(|e| {
        panic!(
            "Expected valid JSON ({}): {}\nOutput:\n{}",
            context, e, output
        )
    })
}

/// Assert that output contains valid TOON markers
pub fn assert_valid_toon(output: &str, context: &str) {
    assert!(
        output.contains("_type:"),
        "Expected TOON output to contain '_type:' marker ({})\nOutput:\n{}",
        context,
        output
    );
}

/// Assert that JSON output has expected type
pub fn assert_json_type(json: &Value, expected_type: &str) {
    let actual_type = json["_type"]
        .as_str()
        .unwrap_or_else(|| panic!("JSON missing '_type' field"));
    assert_eq!(
        actual_type, expected_type,
        "Expected JSON type '{}' but got '{}'",
        expected_type, actual_type
    );
}

/// Assert that output contains a substring
pub fn assert_contains(output: &str, needle: &str) {
    assert!(
        output.contains(needle),
        "Expected output to contain '{}'\nOutput:\n{}",
        needle,
        output
    );
}

/// Assert that an artifact exists and parses as JSON
pub fn assert_json_artifact(dir: &Path, name: &str) -> Value {
    let path = dir.join(name);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Missing artifact {}: {}", path.display(), e));
    assert_valid_json(&content, name)
}

/// Lines of a newline-separated list artifact, empty when absent
pub fn read_list_artifact(dir: &Path, name: &str) -> Vec<String> {
    std::fs::read_to_string(dir.join(name))
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Names of the `function` field of every entry in a descriptor array
pub fn descriptor_names(json: &Value) -> Vec<String> {
    json.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["function"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

//! Tests for the `init` CLI command and global flags

use crate::common::{assert_contains, TestRepo};

#[test]
fn test_init_writes_default_config() {
    let repo = TestRepo::new();
    let output = repo.run_cli_success(&["init"]);
    assert_contains(&output, "rts.toml");

    let config = repo.read_file("rts.toml");
    assert_contains(&config, "[runner]");
    assert_contains(&config, "install_command = \"npm install\"");
    assert_contains(&config, "runtime_module = \"rts-trace\"");
}

#[test]
fn test_init_refuses_to_overwrite() {
    let repo = TestRepo::new();
    repo.add_file("rts.toml", "[runner]\nkind = \"jest\"\n");

    let (_, stderr, code) = repo.run_cli_failure(&["init"]);
    assert_eq!(code, Some(8));
    assert_contains(&stderr, "--force");
    assert_eq!(repo.read_file("rts.toml"), "[runner]\nkind = \"jest\"\n");

    repo.run_cli_success(&["init", "--force"]);
    assert_contains(&repo.read_file("rts.toml"), "kind = \"vitest\"");
}

#[test]
fn test_invalid_config_is_a_config_error() {
    let repo = TestRepo::new();
    repo.with_math_project().add_file("rts.toml", "[runner\n");

    let (_, stderr, code) = repo.run_cli_failure(&["graph"]);
    assert_eq!(code, Some(8));
    assert_contains(&stderr, "Configuration error");
}

#[test]
fn test_explicit_config_path_wins() {
    let repo = TestRepo::new();
    repo.with_math_project()
        .add_file("rts.toml", "[runner\n")
        .add_file("alt.toml", "[output]\nresults_dir = \"alt-results\"\n");

    repo.run_cli_success(&["graph", "--config", "alt.toml"]);
    assert!(repo.path().join("alt-results/staticFileDependency.json").exists());
}

#[test]
fn test_version_flag() {
    let repo = TestRepo::new();
    let output = repo.run_cli_success(&["--version"]);
    assert_contains(&output, env!("CARGO_PKG_VERSION"));
}

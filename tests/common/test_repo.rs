//! TestRepo builder for integration testing
//!
//! Lays out a small JS/TS project inside a temp dir, optionally under git,
//! with an `rts.toml` whose runner commands are plain shell so no Node
//! toolchain is needed.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Name of the project directory inside the temp dir. The instrumented
/// snapshot is created next to it, so both are cleaned up together.
const PROJECT_DIR: &str = "app";

pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new empty project
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join(PROJECT_DIR)).expect("Failed to create project dir");
        Self { dir }
    }

    /// Project root
    pub fn path(&self) -> PathBuf {
        self.dir.path().join(PROJECT_DIR)
    }

    /// Instrumented snapshot produced by `instrument`/`baseline`
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.path().join(format!("{}-instrumented", PROJECT_DIR))
    }

    /// Results directory under the default configuration
    pub fn results_path(&self) -> PathBuf {
        self.path().join(".rts")
    }

    pub fn add_file(&self, relative_path: &str, content: &str) -> &Self {
        let full_path = self.path().join(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        self
    }

    pub fn remove_file(&self, relative_path: &str) -> &Self {
        fs::remove_file(self.path().join(relative_path)).expect("Failed to remove file");
        self
    }

    pub fn read_file(&self, relative_path: &str) -> String {
        fs::read_to_string(self.path().join(relative_path))
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative_path, e))
    }

    pub fn read_snapshot_file(&self, relative_path: &str) -> String {
        fs::read_to_string(self.snapshot_path().join(relative_path))
            .unwrap_or_else(|e| panic!("Failed to read snapshot {}: {}", relative_path, e))
    }

    // ========================================================================
    // CLI
    // ========================================================================

    /// Run the semfora-rts binary in the project root
    pub fn run_cli(&self, args: &[&str]) -> std::io::Result<Output> {
        Command::new(env!("CARGO_BIN_EXE_semfora-rts"))
            .current_dir(self.path())
            .args(args)
            .env_remove("SEMFORA_RTS_CONFIG")
            .output()
    }

    /// Run CLI and expect success, return stdout
    pub fn run_cli_success(&self, args: &[&str]) -> String {
        let output = self.run_cli(args).expect("Failed to run CLI");
        assert!(
            output.status.success(),
            "CLI command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run CLI and expect failure, return (stdout, stderr, exit code)
    pub fn run_cli_failure(&self, args: &[&str]) -> (String, String, Option<i32>) {
        let output = self.run_cli(args).expect("Failed to run CLI");
        assert!(
            !output.status.success(),
            "CLI command {:?} should have failed",
            args
        );
        (
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
            output.status.code(),
        )
    }

    // ========================================================================
    // GIT
    // ========================================================================

    pub fn init_git(&self) -> &Self {
        self.git(&["init", "-q"]);
        self.git(&["config", "user.email", "test@test.com"]);
        self.git(&["config", "user.name", "Test User"]);
        self.git(&["config", "commit.gpgsign", "false"]);
        self
    }

    /// Stage everything and commit
    pub fn commit(&self, message: &str) -> &Self {
        self.git(&["add", "-A"]);
        self.git(&["commit", "-q", "-m", message]);
        self
    }

    fn git(&self, args: &[&str]) {
        let output = Command::new("git")
            .current_dir(self.path())
            .args(args)
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    // ========================================================================
    // PROJECT CONTENT
    // ========================================================================

    /// Write `rts.toml` with shell runner commands
    pub fn with_shell_runner(&self, install_command: &str, test_command: &str) -> &Self {
        let config = format!(
            "[runner]\nkind = \"vitest\"\ninstall_command = {:?}\ntest_command = {:?}\n",
            install_command, test_command
        );
        self.add_file("rts.toml", &config)
    }

    /// `src/math.ts`, `src/format.ts` and their vitest files
    pub fn with_math_project(&self) -> &Self {
        self.add_file("package.json", MATH_PACKAGE_JSON)
            .add_file("src/math.ts", MATH_SOURCE)
            .add_file("src/format.ts", FORMAT_SOURCE)
            .add_file("src/math.test.ts", MATH_TEST)
            .add_file("src/format.test.ts", FORMAT_TEST)
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

pub const MATH_PACKAGE_JSON: &str = r#"{
  "name": "math-app",
  "private": true,
  "type": "module",
  "scripts": { "test": "vitest run" }
}
"#;

pub const MATH_SOURCE: &str = r#"export function add(a: number, b: number): number {
  return a + b;
}

export function sub(a: number, b: number): number {
  return a - b;
}

export class Calculator {
  total = 0;

  push(value: number) {
    this.total = add(this.total, value);
    return this;
  }
}
"#;

pub const FORMAT_SOURCE: &str = r#"import { add } from './math';

export const formatSum = (a: number, b: number) => `${add(a, b)}`;
"#;

pub const MATH_TEST: &str = r#"import { describe, it, expect } from 'vitest';
import { add, sub } from './math';

describe('math', () => {
  it('adds', () => {
    expect(add(1, 2)).toBe(3);
  });

  it('subtracts', () => {
    expect(sub(3, 2)).toBe(1);
  });
});
"#;

pub const FORMAT_TEST: &str = r#"import { it, expect } from 'vitest';
import { formatSum } from './format';

it('formats sums', () => {
  expect(formatSum(1, 2)).toBe('3');
});
"#;


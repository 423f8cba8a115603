//! Package-manager and test-suite execution.
//!
//! Commands come from configuration and run through the platform shell in the
//! project directory. A failing suite is a normal outcome (failing tests still
//! produce traces); a command that cannot be spawned is a `ProcessFailure`.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::RunnerConfig;
use crate::error::{Result, RtsError};

// ============================================================================
// Types
// ============================================================================

/// Result of one shell command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub command: String,

    /// Whether the command exited with status zero
    pub success: bool,

    /// Exit code, if the process was not killed by a signal
    pub exit_code: Option<i32>,

    pub duration_ms: u64,

    #[serde(skip)]
    pub stdout: String,

    #[serde(skip)]
    pub stderr: String,
}

impl CommandOutcome {
    /// Combined output, stdout first
    pub fn log(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Summary lines printed by the runner at the end of a suite
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub test_files: Option<String>,
    pub tests: Option<String>,
    pub duration: Option<String>,
}

impl TestSummary {
    pub fn is_empty(&self) -> bool {
        self.test_files.is_none() && self.tests.is_none() && self.duration.is_none()
    }
}

/// Result of running a test suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResults {
    pub runner: String,
    pub outcome: CommandOutcome,
    pub summary: TestSummary,
}

impl TestResults {
    pub fn success(&self) -> bool {
        self.outcome.success
    }
}

// ============================================================================
// Running
// ============================================================================

/// Run `command` through the shell in `dir` with extra environment variables.
pub fn run_shell(command: &str, dir: &Path, env: &[(&str, OsString)]) -> Result<CommandOutcome> {
    let start = Instant::now();

    let mut cmd = if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C");
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c");
        cmd
    };
    cmd.arg(command);
    cmd.current_dir(dir);
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    tracing::debug!("Running `{}` in {}", command, dir.display());
    let output = cmd.output().map_err(|e| RtsError::ProcessFailure {
        command: command.to_string(),
        message: e.to_string(),
    })?;

    let outcome = CommandOutcome {
        command: command.to_string(),
        success: output.status.success(),
        exit_code: output.status.code(),
        duration_ms: start.elapsed().as_millis() as u64,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    };
    if !outcome.success {
        tracing::warn!(
            "`{}` exited with {:?} after {} ms",
            command,
            outcome.exit_code,
            outcome.duration_ms
        );
    }
    Ok(outcome)
}

/// Install dependencies. A non-zero exit is a `ProcessFailure`: nothing
/// downstream can run without them.
pub fn install_dependencies(dir: &Path, runner: &RunnerConfig) -> Result<CommandOutcome> {
    let outcome = run_shell(&runner.install_command, dir, &[])?;
    if !outcome.success {
        return Err(RtsError::ProcessFailure {
            command: outcome.command.clone(),
            message: last_lines(&outcome.stderr, 20),
        });
    }
    Ok(outcome)
}

/// Run the test suite. Test failures do not make this an error.
pub fn run_test_suite(
    dir: &Path,
    runner: &RunnerConfig,
    env: &[(&str, OsString)],
) -> Result<TestResults> {
    let outcome = run_shell(runner.test_command(), dir, env)?;
    let summary = extract_test_summary(&outcome.log());
    tracing::info!(
        "Test run finished ({}): {}",
        if outcome.success { "passed" } else { "failed" },
        summary.tests.as_deref().unwrap_or("no summary")
    );
    Ok(TestResults {
        runner: runner.kind.name().to_string(),
        outcome,
        summary,
    })
}

fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

// ============================================================================
// Output Parsing
// ============================================================================

static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("static pattern"));
static TEST_FILES_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*((?:Test Files\s+|Test Suites:\s+)\S.*?)\s*$").expect("static pattern")
});
static TESTS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(Tests:?\s+\S.*?)\s*$").expect("static pattern"));
static DURATION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*((?:Duration\s+|Time:\s+)\S.*?)\s*$").expect("static pattern")
});

/// Pull the summary lines out of a vitest or jest log.
pub fn extract_test_summary(log: &str) -> TestSummary {
    let plain = ANSI_ESCAPE.replace_all(log, "");
    let find = |re: &Regex| re.captures(&plain).map(|c| c[1].to_string());
    TestSummary {
        test_files: find(&TEST_FILES_LINE),
        tests: find(&TESTS_LINE),
        duration: find(&DURATION_LINE),
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Project configuration (`rts.toml` at the project root).
//!
//! Every section is optional; a missing file yields the defaults.
//!
//! ```toml
//! [project]
//! files_to_exclude = ["src/generated/schema.ts"]
//!
//! [runner]
//! kind = "jest"
//! install_command = "npm ci"
//! test_command = "npx jest"
//!
//! [trace]
//! flush_threshold = 500000
//!
//! [output]
//! results_dir = ".rts"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RtsError};

/// File name looked up by [`RtsConfig::for_project`]
pub const CONFIG_FILE_NAME: &str = "rts.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RtsConfig {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub trace: TraceConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProjectConfig {
    /// Path fragments of files that are copied but never instrumented
    #[serde(default)]
    pub files_to_exclude: Vec<String>,
}

impl ProjectConfig {
    /// Whether any exclude entry occurs in the project-relative `file`
    pub fn is_excluded(&self, file: &str) -> bool {
        self.files_to_exclude
            .iter()
            .any(|pattern| !pattern.is_empty() && file.contains(pattern.as_str()))
    }
}

/// Test framework driving the suite
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunnerKind {
    #[default]
    Vitest,
    Jest,
}

impl RunnerKind {
    /// Module the suite-teardown hook is imported from
    pub fn hooks_module(&self) -> &'static str {
        match self {
            Self::Vitest => "vitest",
            Self::Jest => "@jest/globals",
        }
    }

    pub fn default_test_command(&self) -> &'static str {
        match self {
            Self::Vitest => "npx vitest run",
            Self::Jest => "npx jest",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Vitest => "vitest",
            Self::Jest => "jest",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunnerConfig {
    #[serde(default)]
    pub kind: RunnerKind,

    #[serde(default = "default_install_command")]
    pub install_command: String,

    /// Falls back to the runner's default command when unset
    #[serde(default)]
    pub test_command: Option<String>,
}

fn default_install_command() -> String {
    "npm install".to_string()
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            kind: RunnerKind::default(),
            install_command: default_install_command(),
            test_command: None,
        }
    }
}

impl RunnerConfig {
    pub fn test_command(&self) -> &str {
        self.test_command
            .as_deref()
            .unwrap_or_else(|| self.kind.default_test_command())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceConfig {
    /// Module specifier instrumented files import the trace runtime from
    #[serde(default = "default_runtime_module")]
    pub runtime_module: String,

    /// Batch size in bytes above which the runtime flushes early
    #[serde(default = "default_flush_threshold")]
    pub flush_threshold: usize,

    /// Base name of the dependency graph log
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

fn default_runtime_module() -> String {
    "rts-trace".to_string()
}

fn default_flush_threshold() -> usize {
    1_000_000
}

fn default_log_file() -> String {
    "dynamicDependencyGraph".to_string()
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            runtime_module: default_runtime_module(),
            flush_threshold: default_flush_threshold(),
            log_file: default_log_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Where artifacts are written, relative to the project root
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

fn default_results_dir() -> PathBuf {
    PathBuf::from(".rts")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
        }
    }
}

impl RtsConfig {
    /// Load `rts.toml` from the project root
    pub fn for_project(root: &Path) -> Result<Self> {
        Self::load_from(&root.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| RtsError::ConfigError {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| RtsError::ConfigError {
            message: format!("Failed to serialize config: {}", e),
        })?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Absolute results directory for a project
    pub fn results_dir(&self, root: &Path) -> PathBuf {
        if self.output.results_dir.is_absolute() {
            self.output.results_dir.clone()
        } else {
            root.join(&self.output.results_dir)
        }
    }
}

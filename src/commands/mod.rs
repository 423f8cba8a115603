//! Command modules for the semfora-rts CLI
//!
//! ## Architecture
//!
//! Each command module implements a single top-level command:
//! - `analyze` - Classify changes between two revisions
//! - `instrument` - Produce an instrumented copy of a project
//! - `baseline` - Instrument, run the suite, record dependency graphs
//! - `graph` - Build the static import graph
//! - `select` - Select, and optionally run, the affected tests
//! - `init` - Write a default configuration
//!
//! All command handlers take their respective `Args` struct from `cli.rs`
//! and a shared `CommandContext`, and return the rendered output.

pub mod analyze;
pub mod baseline;
pub mod graph;
pub mod init;
pub mod instrument;
pub mod select;

pub use analyze::run_analyze;
pub use baseline::run_baseline;
pub use graph::run_graph;
pub use init::run_init;
pub use instrument::run_instrument;
pub use select::run_select;

use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;
use crate::config::RtsConfig;
use crate::error::Result;

/// Shared context passed to all command handlers
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    /// Output format (text, toon, or json)
    pub format: OutputFormat,
    /// Show verbose output
    pub verbose: bool,
    /// Explicit configuration file, overriding `<project>/rts.toml`
    pub config_path: Option<PathBuf>,
}

impl CommandContext {
    pub fn from_cli(format: OutputFormat, verbose: bool, config_path: Option<PathBuf>) -> Self {
        Self {
            format,
            verbose,
            config_path,
        }
    }

    /// Configuration for the project at `root`
    pub fn load_config(&self, root: &Path) -> Result<RtsConfig> {
        match &self.config_path {
            Some(path) => RtsConfig::load_from(path),
            None => RtsConfig::for_project(root),
        }
    }

    /// Render `value` as JSON or TOON, or call `text` for the text format
    pub fn render(&self, value: &serde_json::Value, text: impl FnOnce() -> String) -> Result<String> {
        Ok(match self.format {
            OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(value)?),
            OutputFormat::Toon => format!("{}\n", encode_toon(value)),
            OutputFormat::Text => text(),
        })
    }
}

/// Encode a JSON value as TOON using the rtoon library
pub fn encode_toon(value: &serde_json::Value) -> String {
    rtoon::encode_default(value).unwrap_or_else(|e| format!("TOON encoding error: {}", e))
}

/// `path`, or the current directory
pub fn resolve_dir(path: Option<&PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.clone()),
        None => Ok(std::env::current_dir()?),
    }
}

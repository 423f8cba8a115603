//! CLI argument definitions using clap with subcommand architecture

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::changes::RtsMode;
use crate::selection::SelectionMode;

/// Regression test selection for JavaScript/TypeScript projects
#[derive(Parser, Debug)]
#[command(name = "semfora-rts")]
#[command(about = "Select the tests affected by a change using semantic diffs and traced test runs")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (applies to all commands)
    #[arg(short, long, default_value = "text", value_enum, global = true)]
    pub format: OutputFormat,

    /// Show verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to `rts.toml` in the project root)
    #[arg(long, value_name = "FILE", global = true, env = "SEMFORA_RTS_CONFIG")]
    pub config: Option<PathBuf>,
}

// ============================================
// Main Commands Enum
// ============================================

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify the changes between two revisions
    #[command(visible_alias = "a")]
    Analyze(AnalyzeArgs),

    /// Copy a project with every function instrumented for tracing
    Instrument(InstrumentArgs),

    /// Instrument, run the suite once and record the dependency graphs
    Baseline(BaselineArgs),

    /// Build the static import graph only
    Graph(GraphArgs),

    /// Select the tests to rerun from the latest analysis
    #[command(visible_alias = "s")]
    Select(SelectArgs),

    /// Write a default `rts.toml`
    Init(InitArgs),
}

// ============================================
// Subcommand Arguments
// ============================================

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Baseline revision
    #[arg(long, value_name = "REF")]
    pub before: String,

    /// Revision under test
    #[arg(long, value_name = "REF", default_value = "HEAD")]
    pub after: String,

    /// Analysis granularity
    #[arg(long, value_enum, default_value = "extended")]
    pub mode: ModeArg,

    /// Repository to analyze (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub repo: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InstrumentArgs {
    /// Project to instrument (defaults to the current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Output directory (defaults to `<project>-instrumented`)
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BaselineArgs {
    /// Project root (defaults to the current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Project root (defaults to the current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Project whose results directory holds the artifacts
    #[arg(long, value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Which analysis to select from
    #[arg(long, value_enum, default_value = "extended")]
    pub mode: SelectModeArg,

    /// Rewrite the test files under DIR so only selected tests run
    #[arg(long, value_name = "DIR")]
    pub apply: Option<PathBuf>,

    /// Install dependencies and run the suite in the `--apply` directory
    #[arg(long, requires = "apply")]
    pub run: bool,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project root (defaults to the current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Overwrite an existing configuration
    #[arg(long)]
    pub force: bool,
}

// ============================================
// Value Enums
// ============================================

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Normal,
    Extended,
}

impl From<ModeArg> for RtsMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Normal => RtsMode::Normal,
            ModeArg::Extended => RtsMode::Extended,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectModeArg {
    Normal,
    Extended,
    RetestAll,
}

impl From<SelectModeArg> for SelectionMode {
    fn from(mode: SelectModeArg) -> Self {
        match mode {
            SelectModeArg::Normal => SelectionMode::Rts(RtsMode::Normal),
            SelectModeArg::Extended => SelectionMode::Rts(RtsMode::Extended),
            SelectModeArg::RetestAll => SelectionMode::RetestAll,
        }
    }
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    #[value(alias = "pretty")]
    Text,
    /// TOON (Token-Oriented Object Notation)
    Toon,
    /// JSON for machine parsing
    Json,
}

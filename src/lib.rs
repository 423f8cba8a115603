//! semfora-rts: regression test selection for JavaScript/TypeScript projects
//!
//! A baseline run instruments every function of a project, runs its test
//! suite once and records which tests executed which functions. Later changes
//! are diffed semantically at function and class-member level, and only the
//! tests that reached a changed function are selected. Changes that cannot be
//! tracked per function escalate to every test file that imports the file.
//!
//! # Example
//!
//! ```ignore
//! use semfora_rts::{analyze, select, AffectedFiles, RtsMode};
//!
//! let files = AffectedFiles::from_git(repo, "v1.2.0", "HEAD")?;
//! let analysis = analyze(&files, RtsMode::Extended);
//! let selection = select(
//!     &analysis.changed_functions,
//!     &registry,
//!     &graph,
//!     &static_graph,
//!     &analysis.fallback_files,
//! );
//! ```

pub mod baseline;
pub mod changes;
pub mod cli;
pub mod commands;
pub mod config;
pub mod elements;
pub mod error;
pub mod fs_utils;
pub mod git;
pub mod instrument;
pub mod lang;
pub mod parsing;
pub mod registry;
pub mod selection;
pub mod static_graph;
pub mod syntax;
pub mod test_runner;
pub mod trace_log;

// Re-export commonly used types
pub use baseline::{build_baseline, BaselineManifest};
pub use changes::{analyze, is_test_file, AffectedFiles, ChangeAnalysis, RtsMode};
pub use cli::{Cli, OutputFormat};
pub use commands::encode_toon;
pub use config::RtsConfig;
pub use elements::{build_code_elements, CodeElementSet, FunctionDescriptor};
pub use error::{Result, RtsError};
pub use instrument::{instrument_codebase, InstrumentationReport};
pub use lang::Lang;
pub use parsing::{parse_file, parse_named, parse_source, ParsedFile};
pub use registry::{FunctionId, FunctionRegistry};
pub use selection::{apply_plan_to_test_file, select, ExecutionPlan, Selection, SelectionMode};
pub use static_graph::StaticGraph;
pub use trace_log::{DependencyEdge, DependencyGraph};

// Re-export git module types
pub use git::{get_changed_files, get_file_at_ref, get_repo_root, is_git_repo, ChangeSet, RenamedFile};

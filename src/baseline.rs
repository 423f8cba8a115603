//! Baseline construction: instrument, run the suite once, and persist the
//! artifacts every later selection against this revision reuses.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::RtsConfig;
use crate::error::{Result, RtsError};
use crate::fs_utils::sibling_dir;
use crate::instrument::{install_runtime, instrument_codebase, TRACE_LOG_ENV};
use crate::static_graph::{self, StaticGraph};
use crate::test_runner::{install_dependencies, run_test_suite, TestSummary};
use crate::trace_log::DependencyGraph;

pub const MANIFEST_FILE: &str = "baseline.json";

/// Suffix of the instrumented snapshot directory, next to the project
pub const SNAPSHOT_SUFFIX: &str = "instrumented";

/// Summary of a finished baseline build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineManifest {
    pub created_at: String,
    pub tool_version: String,
    pub project: PathBuf,
    pub snapshot: PathBuf,
    pub functions: usize,
    pub tests: usize,
    pub edges: usize,
    pub static_files: usize,
    /// Whether the instrumented suite passed
    pub test_success: bool,
    pub test_summary: TestSummary,
    pub failed_files: Vec<String>,
}

impl BaselineManifest {
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(MANIFEST_FILE), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Err(RtsError::missing_artifact(&path, "run `semfora-rts baseline` first"));
        }
        Ok(serde_json::from_str(&fs::read_to_string(&path)?)?)
    }
}

/// Build the baseline for `project`.
///
/// 1. copy the project into `<project>-instrumented`, instrumenting sources;
/// 2. write `functionsMap.json` and `allTests.json`;
/// 3. install dependencies in the snapshot, then the trace runtime;
/// 4. run the suite with the raw trace log path in `RTS_TRACE_LOG`;
/// 5. normalize the raw log into `dynamicDependencyGraph.json`;
/// 6. write `staticFileDependency.json` for the project.
///
/// A failing suite still yields a baseline: failing tests produce traces too.
pub fn build_baseline(project: &Path, config: &RtsConfig) -> Result<BaselineManifest> {
    let project = project.canonicalize().map_err(|_| RtsError::FileNotFound {
        path: project.display().to_string(),
    })?;
    let results = config.results_dir(&project);
    fs::create_dir_all(&results)?;
    let snapshot = sibling_dir(&project, SNAPSHOT_SUFFIX);

    tracing::info!("Building baseline for {}", project.display());
    let report = instrument_codebase(&project, &snapshot, config)?;
    report.write_artifacts(&results)?;

    install_dependencies(&snapshot, &config.runner)?;
    install_runtime(&snapshot, &config.trace)?;

    let raw_log = results.join(format!("{}.log", config.trace.log_file));
    if raw_log.exists() {
        fs::remove_file(&raw_log)?;
    }
    let env = [(TRACE_LOG_ENV, OsString::from(raw_log.as_os_str()))];
    let test_results = run_test_suite(&snapshot, &config.runner, &env)?;
    if !test_results.success() {
        tracing::warn!("Instrumented suite failed; collecting traces anyway");
    }

    let graph = DependencyGraph::collect_raw_log(&raw_log, &results)?;
    let static_graph = build_static_graph(&project, config)?;

    let manifest = BaselineManifest {
        created_at: Utc::now().to_rfc3339(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        project: project.clone(),
        snapshot,
        functions: report.registry.len(),
        tests: report.test_names.len(),
        edges: graph.len(),
        static_files: static_graph.len(),
        test_success: test_results.success(),
        test_summary: test_results.summary,
        failed_files: report.failed_files,
    };
    manifest.save(&results)?;
    tracing::info!(
        "Baseline ready: {} functions, {} tests, {} edges",
        manifest.functions,
        manifest.tests,
        manifest.edges
    );
    Ok(manifest)
}

/// Build and save `staticFileDependency.json` for `project`
pub fn build_static_graph(project: &Path, config: &RtsConfig) -> Result<StaticGraph> {
    let results = config.results_dir(project);
    let skips: Vec<PathBuf> = results
        .strip_prefix(project)
        .map(|rel| vec![rel.to_path_buf()])
        .unwrap_or_default();
    let graph = static_graph::build(project, &skips);
    graph.save(&results)?;
    Ok(graph)
}

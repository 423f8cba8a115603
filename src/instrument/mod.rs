//! Codebase instrumentation.
//!
//! Copies a project into a snapshot directory, inserting a trace statement at
//! the top of every function body so a test run reports which functions each
//! test executed. Work happens in three phases:
//!
//! 1. plan every file in parallel (parse, locate bodies, collect test names);
//! 2. assign ids sequentially in sorted file order through an [`IdAllocator`];
//! 3. render and write every file in parallel.
//!
//! A file that cannot be parsed or planned is copied unchanged.

pub mod edits;
pub mod planner;
pub mod runtime;

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;

pub use edits::{Edit, EditKind, EditPlan, Span};
pub use planner::{FileKind, FilePlan, PlannedFunction, RenderOptions, TestCall};
pub use runtime::{install_runtime, runtime_source, TRACE_LOG_ENV};

use crate::config::RtsConfig;
use crate::error::{Result, RtsError};
use crate::fs_utils::{copy_creating_dirs, relative_name, walk_project, write_creating_dirs};
use crate::lang::Lang;
use crate::parsing::parse_file;
use crate::registry::{FunctionId, FunctionRegistry};

/// Every test discovered during instrumentation, as `file > title`
pub const ALL_TESTS_FILE: &str = "allTests.json";

/// Single writer of function ids and their registry entries
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: FunctionId,
    registry: FunctionRegistry,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `functions` under consecutive ids and return the first one
    pub fn allocate(&mut self, functions: &[PlannedFunction]) -> FunctionId {
        let first = self.next;
        for function in functions {
            self.registry.insert(self.next, function.descriptor.clone());
            self.next += 1;
        }
        first
    }

    pub fn into_registry(self) -> FunctionRegistry {
        self.registry
    }
}

#[derive(Debug, Default, Serialize)]
pub struct InstrumentationReport {
    #[serde(skip)]
    pub registry: FunctionRegistry,
    pub functions: usize,
    pub test_names: Vec<String>,
    pub instrumented_files: usize,
    pub copied_files: usize,
    /// Files that were copied unchanged because they could not be instrumented
    pub failed_files: Vec<String>,
}

impl InstrumentationReport {
    /// Write `functionsMap.json` and `allTests.json` into `dir`
    pub fn write_artifacts(&self, dir: &Path) -> Result<()> {
        self.registry.save(dir)?;
        fs::write(
            dir.join(ALL_TESTS_FILE),
            serde_json::to_string_pretty(&self.test_names)?,
        )?;
        Ok(())
    }
}

enum Prepared {
    Plan(FilePlan),
    Copy { failed: bool },
}

/// Instrument every file under `source_root` into `output_root`.
///
/// `output_root` is recreated from scratch. `node_modules`, `.git` and the
/// results directory are not copied.
pub fn instrument_codebase(
    source_root: &Path,
    output_root: &Path,
    config: &RtsConfig,
) -> Result<InstrumentationReport> {
    if output_root == source_root {
        return Err(RtsError::ConfigError {
            message: format!(
                "Instrumentation output {} must differ from the project",
                output_root.display()
            ),
        });
    }
    if output_root.exists() {
        fs::remove_dir_all(output_root)?;
    }

    let skips = skipped_dirs(source_root, output_root, config);
    let files = walk_project(source_root, &skips);
    tracing::info!(
        "Instrumenting {} files from {}",
        files.len(),
        source_root.display()
    );

    let options = RenderOptions {
        runtime_module: config.trace.runtime_module.clone(),
        hooks_module: config.runner.kind.hooks_module().to_string(),
    };

    // Phase 1: plan
    let prepared: Vec<(PathBuf, String, Prepared)> = files
        .par_iter()
        .map(|path| {
            let name = relative_name(source_root, path)
                .unwrap_or_else(|| path.display().to_string());
            let prepared = prepare(source_root, &name, config, &options);
            (path.clone(), name, prepared)
        })
        .collect();

    // Phase 2: ids, in sorted file order
    let mut allocator = IdAllocator::new();
    let mut report = InstrumentationReport::default();
    let mut jobs: Vec<(PathBuf, String, Option<(FilePlan, FunctionId)>)> =
        Vec::with_capacity(prepared.len());
    for (path, name, prepared) in prepared {
        match prepared {
            Prepared::Plan(plan) => {
                let first_id = allocator.allocate(&plan.functions);
                report.functions += plan.function_count();
                report.test_names.extend(
                    plan.test_names()
                        .map(|title| format!("{} > {}", plan.file, title)),
                );
                report.instrumented_files += 1;
                jobs.push((path, name, Some((plan, first_id))));
            }
            Prepared::Copy { failed } => {
                if failed {
                    report.failed_files.push(name.clone());
                }
                report.copied_files += 1;
                jobs.push((path, name, None));
            }
        }
    }
    report.registry = allocator.into_registry();

    // Phase 3: render and write
    jobs.par_iter()
        .map(|(path, name, job)| -> Result<()> {
            let target = output_root.join(name);
            match job {
                Some((plan, first_id)) => {
                    let rendered = plan.render(*first_id, &options)?;
                    write_creating_dirs(&target, rendered.as_bytes())?;
                }
                None => copy_creating_dirs(path, &target)?,
            }
            Ok(())
        })
        .collect::<Result<Vec<()>>>()?;

    tracing::info!(
        "Instrumented {} functions in {} files ({} copied, {} failed)",
        report.functions,
        report.instrumented_files,
        report.copied_files,
        report.failed_files.len()
    );
    Ok(report)
}

fn skipped_dirs(source_root: &Path, output_root: &Path, config: &RtsConfig) -> Vec<PathBuf> {
    let mut skips = Vec::new();
    for dir in [config.results_dir(source_root), output_root.to_path_buf()] {
        if let Ok(rel) = dir.strip_prefix(source_root) {
            skips.push(rel.to_path_buf());
        }
    }
    skips
}

fn prepare(root: &Path, name: &str, config: &RtsConfig, options: &RenderOptions) -> Prepared {
    if !Lang::is_supported_path(Path::new(name)) || name.ends_with(".d.ts") {
        return Prepared::Copy { failed: false };
    }
    if config.project.is_excluded(name) {
        tracing::debug!("Excluded from instrumentation: {}", name);
        return Prepared::Copy { failed: false };
    }

    let parsed = match parse_file(root, name) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Copying {} uninstrumented: {}", name, e);
            return Prepared::Copy { failed: true };
        }
    };
    if parsed.has_errors() {
        tracing::warn!("Copying {} uninstrumented: syntax errors", name);
        return Prepared::Copy { failed: true };
    }

    let plan = FilePlan::build(&parsed);
    // Id width never changes edit positions, so a trial render validates the plan
    if let Err(e) = plan.render(0, options) {
        tracing::warn!("Copying {} uninstrumented: {}", name, e);
        return Prepared::Copy { failed: true };
    }
    Prepared::Plan(plan)
}

//! Test selection and the execution plan derived from it.
//!
//! [`select`] is a pure function of the analysis artifacts. An
//! [`ExecutionPlan`] turns its output into per-file decisions, and
//! [`apply_plan_to_test_file`] rewrites unselected tests to `.skip` so an
//! unmodified runner executes only the selection.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::changes::{is_test_file, RtsMode};
use crate::elements::FunctionDescriptor;
use crate::error::Result;
use crate::fs_utils::{relative_name, walk_project};
use crate::instrument::{EditPlan, FileKind, FilePlan};
use crate::lang::Lang;
use crate::parsing::parse_named;
use crate::registry::{FunctionId, FunctionRegistry};
use crate::static_graph::StaticGraph;
use crate::trace_log::DependencyGraph;

pub const RERUNNABLE_TESTS_FILE: &str = "rerunnableTests.txt";

/// Separator between the file, suite and title parts of a qualified test name
pub const TEST_NAME_SEPARATOR: &str = " > ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Rts(RtsMode),
    RetestAll,
}

impl SelectionMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rts(mode) => mode.label(),
            Self::RetestAll => "RetestAll",
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Qualified names (`file > ... > title`) of individually selected tests
    pub tests_to_run: BTreeSet<String>,
    /// Test files that run in full
    pub files_to_run: BTreeSet<String>,
    /// Every test runs; the other fields are ignored
    pub retest_all: bool,
}

impl Selection {
    pub fn retest_all() -> Self {
        Self {
            retest_all: true,
            ..Self::default()
        }
    }

    /// Nothing needs to run
    pub fn is_empty(&self) -> bool {
        !self.retest_all && self.tests_to_run.is_empty() && self.files_to_run.is_empty()
    }

    /// Run `files` in full as well
    pub fn include_files<'a>(&mut self, files: impl IntoIterator<Item = &'a String>) {
        self.files_to_run.extend(files.into_iter().cloned());
    }

    /// Write `rerunnableTests.txt`, one qualified test name per line
    pub fn write_rerunnable(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let names: Vec<&str> = self.tests_to_run.iter().map(|t| t.as_str()).collect();
        fs::write(dir.join(RERUNNABLE_TESTS_FILE), names.join("\n"))?;
        Ok(())
    }
}

/// Select the tests affected by `changed` functions and `fallback_files`.
///
/// Functions resolve to registry ids by descriptor equality; tests reached
/// from those ids through a recorded edge are selected individually. Test
/// files that transitively import a fallback file run in full.
pub fn select(
    changed: &[FunctionDescriptor],
    registry: &FunctionRegistry,
    graph: &DependencyGraph,
    static_graph: &StaticGraph,
    fallback_files: &BTreeSet<String>,
) -> Selection {
    let ids: HashSet<FunctionId> = changed
        .iter()
        .flat_map(|descriptor| registry.resolve(descriptor))
        .collect();
    let tests_to_run = if ids.is_empty() {
        BTreeSet::new()
    } else {
        graph.tests_for(&ids)
    };

    let files_to_run: BTreeSet<String> = static_graph
        .reverse_closure(fallback_files.iter().map(|f| f.as_str()))
        .into_iter()
        .filter(|file| file.contains("test"))
        .collect();

    tracing::info!(
        "Selected {} tests from {} changed functions ({} ids), {} files in full",
        tests_to_run.len(),
        changed.len(),
        ids.len(),
        files_to_run.len()
    );
    Selection {
        tests_to_run,
        files_to_run,
        retest_all: false,
    }
}

/// Split a qualified test name into its file and title
pub fn split_test_name(qualified: &str) -> (&str, &str) {
    let file = qualified
        .split(TEST_NAME_SEPARATOR)
        .next()
        .unwrap_or(qualified);
    let title = qualified
        .rsplit(TEST_NAME_SEPARATOR)
        .next()
        .unwrap_or(qualified);
    (file, title)
}

/// Per-file run decisions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    pub retest_all: bool,
    pub full_files: BTreeSet<String>,
    /// Test file -> titles selected in it
    pub selected: BTreeMap<String, BTreeSet<String>>,
}

impl ExecutionPlan {
    pub fn from_selection(selection: &Selection) -> Self {
        let mut selected: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for qualified in &selection.tests_to_run {
            let (file, title) = split_test_name(qualified);
            selected
                .entry(file.to_string())
                .or_default()
                .insert(title.to_string());
        }
        Self {
            retest_all: selection.retest_all,
            full_files: selection.files_to_run.clone(),
            selected,
        }
    }

    pub fn runs_file_fully(&self, file: &str) -> bool {
        self.retest_all || self.full_files.contains(file)
    }

    /// Whether `title` of a test declared in `file` should run.
    ///
    /// A recorded name may carry its suite prefix joined by a space (jest
    /// reports `describe title`), so a suffix match on a word boundary counts.
    pub fn is_selected(&self, file: &str, title: &str) -> bool {
        if self.runs_file_fully(file) {
            return true;
        }
        self.selected
            .get(file)
            .map(|names| {
                names
                    .iter()
                    .any(|name| name == title || name.ends_with(&format!(" {}", title)))
            })
            .unwrap_or(false)
    }
}

/// Rewrite a test file so only its selected tests run.
///
/// Unselected `it(...)`/`test(...)` calls become `it.skip(...)`/
/// `test.skip(...)`. Files that run in full come back unchanged. Calls
/// whose title is computed at run time are never skipped, since their
/// recorded name cannot be matched against the source.
pub fn apply_plan_to_test_file(source: &str, file: &str, plan: &ExecutionPlan) -> Result<String> {
    if plan.runs_file_fully(file) {
        return Ok(source.to_string());
    }
    let parsed = parse_named(file, source)?;
    let file_plan = FilePlan::build(&parsed);
    if file_plan.kind != FileKind::Test {
        return Ok(source.to_string());
    }

    let mut edits = EditPlan::new();
    for call in &file_plan.test_calls {
        if call.static_title && !plan.is_selected(file, &call.title) {
            edits.insert(call.callee_end, ".skip");
        }
    }
    edits.apply(source)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanApplication {
    pub rewritten_files: Vec<String>,
    pub full_files: usize,
    pub skipped_tests: usize,
}

/// Apply `plan` to every test file under `root`, in place.
pub fn apply_plan_to_project(root: &Path, plan: &ExecutionPlan) -> Result<PlanApplication> {
    let mut result = PlanApplication::default();
    if plan.retest_all {
        return Ok(result);
    }
    for path in walk_project(root, &[]) {
        let Some(name) = relative_name(root, &path) else {
            continue;
        };
        if !is_test_file(&name) || !Lang::is_supported_path(&path) {
            continue;
        }
        if plan.runs_file_fully(&name) {
            result.full_files += 1;
            continue;
        }
        let source = fs::read_to_string(&path)?;
        let rewritten = apply_plan_to_test_file(&source, &name, plan)?;
        if rewritten != source {
            result.skipped_tests += rewritten
                .matches(".skip(")
                .count()
                .saturating_sub(source.matches(".skip(").count());
            fs::write(&path, rewritten)?;
            result.rewritten_files.push(name);
        }
    }
    tracing::info!(
        "Rewrote {} test files ({} tests skipped, {} run in full)",
        result.rewritten_files.len(),
        result.skipped_tests,
        result.full_files
    );
    Ok(result)
}

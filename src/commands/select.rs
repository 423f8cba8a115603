//! Select command implementation

use serde_json::json;

use crate::changes::ChangeAnalysis;
use crate::cli::SelectArgs;
use crate::error::Result;
use crate::registry::FunctionRegistry;
use crate::selection::{
    apply_plan_to_project, select, ExecutionPlan, Selection, SelectionMode,
};
use crate::static_graph::StaticGraph;
use crate::test_runner::{install_dependencies, run_test_suite, TestResults};
use crate::trace_log::DependencyGraph;

use super::{resolve_dir, CommandContext};

/// Run the select command
pub fn run_select(args: &SelectArgs, ctx: &CommandContext) -> Result<String> {
    let project = resolve_dir(args.project.as_ref())?;
    let config = ctx.load_config(&project)?;
    let results = config.results_dir(&project);
    let mode = SelectionMode::from(args.mode);

    let selection = match mode {
        SelectionMode::RetestAll => Selection::retest_all(),
        SelectionMode::Rts(rts_mode) => {
            let analysis = ChangeAnalysis::load_artifacts(&results, rts_mode)?;
            let registry = FunctionRegistry::load(&results)?;
            let graph = DependencyGraph::load(&results)?;
            // The static graph only matters when some file escalated to file level
            let static_graph = if analysis.fallback_files.is_empty() {
                StaticGraph::default()
            } else {
                StaticGraph::load(&results)?
            };

            let mut selection = select(
                &analysis.changed_functions,
                &registry,
                &graph,
                &static_graph,
                &analysis.fallback_files,
            );
            // Edited tests may not match any recorded trace
            selection.include_files(&analysis.modified_test_files);
            selection.write_rerunnable(&results)?;
            selection
        }
    };
    let plan = ExecutionPlan::from_selection(&selection);

    let mut application = None;
    let mut test_results: Option<TestResults> = None;
    if let Some(dir) = &args.apply {
        application = Some(apply_plan_to_project(dir, &plan)?);
        if args.run {
            if selection.is_empty() {
                tracing::info!("No tests selected; skipping the test run");
            } else {
                install_dependencies(dir, &config.runner)?;
                test_results = Some(run_test_suite(dir, &config.runner, &[])?);
            }
        }
    }

    let value = json!({
        "_type": "selection",
        "mode": mode.label(),
        "selection": selection,
        "applied": application,
        "test_run": test_results,
    });
    ctx.render(&value, || {
        let mut output = String::new();
        output.push_str(&format!("mode: {}\n", mode));
        if selection.retest_all {
            output.push_str("selection: all tests\n");
        } else {
            output.push_str(&format!("tests_to_run[{}]:\n", selection.tests_to_run.len()));
            for test in &selection.tests_to_run {
                output.push_str(&format!("  {}\n", test));
            }
            output.push_str(&format!("files_to_run[{}]:\n", selection.files_to_run.len()));
            for file in &selection.files_to_run {
                output.push_str(&format!("  {}\n", file));
            }
        }
        if let Some(applied) = &application {
            output.push_str(&format!(
                "rewritten: {} files, {} tests skipped\n",
                applied.rewritten_files.len(),
                applied.skipped_tests
            ));
        }
        if let Some(run) = &test_results {
            output.push_str(&format!(
                "suite: {}\n",
                if run.success() { "passed" } else { "failed" }
            ));
            for line in [&run.summary.test_files, &run.summary.tests, &run.summary.duration]
                .into_iter()
                .flatten()
            {
                output.push_str(&format!("  {}\n", line));
            }
        }
        output
    })
}

//! Baseline and graph command implementations

use serde_json::json;

use crate::baseline::build_baseline;
use crate::cli::BaselineArgs;
use crate::error::Result;

use super::{resolve_dir, CommandContext};

/// Run the baseline command
pub fn run_baseline(args: &BaselineArgs, ctx: &CommandContext) -> Result<String> {
    let project = resolve_dir(args.path.as_ref())?;
    let config = ctx.load_config(&project)?;
    let manifest = build_baseline(&project, &config)?;

    let value = json!({
        "_type": "baseline",
        "manifest": manifest,
    });
    ctx.render(&value, || {
        let mut output = String::new();
        output.push_str(&format!("project: {}\n", manifest.project.display()));
        output.push_str(&format!("snapshot: {}\n", manifest.snapshot.display()));
        output.push_str(&format!("functions: {}\n", manifest.functions));
        output.push_str(&format!("tests: {}\n", manifest.tests));
        output.push_str(&format!("dependency_edges: {}\n", manifest.edges));
        output.push_str(&format!("static_graph_files: {}\n", manifest.static_files));
        output.push_str(&format!(
            "suite: {}\n",
            if manifest.test_success { "passed" } else { "failed" }
        ));
        if let Some(tests) = &manifest.test_summary.tests {
            output.push_str(&format!("  {}\n", tests));
        }
        if let Some(duration) = &manifest.test_summary.duration {
            output.push_str(&format!("  {}\n", duration));
        }
        output
    })
}

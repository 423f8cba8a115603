//! Instrument command implementation

use serde_json::json;

use crate::baseline::SNAPSHOT_SUFFIX;
use crate::cli::InstrumentArgs;
use crate::error::Result;
use crate::fs_utils::sibling_dir;
use crate::instrument::{install_runtime, instrument_codebase};

use super::{resolve_dir, CommandContext};

/// Run the instrument command
pub fn run_instrument(args: &InstrumentArgs, ctx: &CommandContext) -> Result<String> {
    let project = resolve_dir(args.path.as_ref())?;
    let config = ctx.load_config(&project)?;
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| sibling_dir(&project, SNAPSHOT_SUFFIX));

    let report = instrument_codebase(&project, &out, &config)?;
    let results = config.results_dir(&project);
    report.write_artifacts(&results)?;
    let runtime = install_runtime(&out, &config.trace)?;

    let value = json!({
        "_type": "instrumentation",
        "output": out.display().to_string(),
        "runtime": runtime.display().to_string(),
        "report": report,
    });
    ctx.render(&value, || {
        let mut output = String::new();
        output.push_str(&format!("output: {}\n", out.display()));
        output.push_str(&format!("functions: {}\n", report.functions));
        output.push_str(&format!("tests: {}\n", report.test_names.len()));
        output.push_str(&format!(
            "files: {} instrumented, {} copied\n",
            report.instrumented_files, report.copied_files
        ));
        for file in &report.failed_files {
            output.push_str(&format!("  not instrumented: {}\n", file));
        }
        output.push_str(&format!("artifacts: {}\n", results.display()));
        output.push_str(&format!(
            "note: reinstall {} after `{}`, which may prune it\n",
            config.trace.runtime_module, config.runner.install_command
        ));
        output
    })
}

//! Analyze command implementation

use serde_json::json;

use crate::changes::{analyze, AffectedFiles, RtsMode};
use crate::cli::AnalyzeArgs;
use crate::error::Result;
use crate::git::get_repo_root;

use super::{resolve_dir, CommandContext};

/// Run the analyze command
pub fn run_analyze(args: &AnalyzeArgs, ctx: &CommandContext) -> Result<String> {
    let cwd = resolve_dir(args.repo.as_ref())?;
    let repo = get_repo_root(Some(&cwd))?;
    let config = ctx.load_config(&repo)?;
    let mode = RtsMode::from(args.mode);

    let files = AffectedFiles::from_git(&repo, &args.before, &args.after)?;
    let analysis = analyze(&files, mode);
    let results = config.results_dir(&repo);
    analysis.write_artifacts(&results, mode)?;

    let value = json!({
        "_type": "analysis",
        "mode": mode.label(),
        "before": args.before,
        "after": args.after,
        "results_dir": results.display().to_string(),
        "analysis": analysis,
    });

    ctx.render(&value, || {
        let mut output = String::new();
        output.push_str(&format!("mode: {}\n", mode));
        output.push_str(&format!("range: {}..{}\n", args.before, args.after));
        output.push_str(&format!(
            "changed_functions[{}]:\n",
            analysis.changed_functions.len()
        ));
        for f in &analysis.changed_functions {
            match &f.class {
                Some(class) => output.push_str(&format!(
                    "  {}.{}({}) {}\n",
                    class, f.function, f.params, f.file
                )),
                None => output.push_str(&format!("  {}({}) {}\n", f.function, f.params, f.file)),
            }
        }
        output.push_str(&format!(
            "semantically_changed_files[{}]:\n",
            analysis.semantically_changed_files.len()
        ));
        for file in &analysis.semantically_changed_files {
            let marker = if analysis.fallback_files.contains(file) {
                " (file-level)"
            } else {
                ""
            };
            output.push_str(&format!("  {}{}\n", file, marker));
        }
        if !analysis.modified_test_files.is_empty() {
            output.push_str(&format!(
                "modified_test_files[{}]:\n",
                analysis.modified_test_files.len()
            ));
            for file in &analysis.modified_test_files {
                output.push_str(&format!("  {}\n", file));
            }
        }
        output.push_str(&format!("artifacts: {}\n", results.display()));
        output
    })
}

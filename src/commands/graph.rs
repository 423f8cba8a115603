//! Graph command implementation

use serde_json::json;

use crate::baseline::build_static_graph;
use crate::cli::GraphArgs;
use crate::error::Result;
use crate::static_graph::STATIC_GRAPH_FILE;

use super::{resolve_dir, CommandContext};

/// Build and save the static import graph
pub fn run_graph(args: &GraphArgs, ctx: &CommandContext) -> Result<String> {
    let project = resolve_dir(args.path.as_ref())?;
    let config = ctx.load_config(&project)?;
    let graph = build_static_graph(&project, &config)?;
    let path = config.results_dir(&project).join(STATIC_GRAPH_FILE);

    let value = json!({
        "_type": "static_graph",
        "path": path.display().to_string(),
        "files": graph.len(),
        "graph": graph,
    });
    ctx.render(&value, || {
        format!("files: {}\nwritten: {}\n", graph.len(), path.display())
    })
}

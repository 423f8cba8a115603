//! The JavaScript trace runtime instrumented files import.
//!
//! It is installed as a local package under `node_modules/` of the
//! instrumented snapshot, so the import header resolves without touching the
//! project's manifest.

use std::path::{Path, PathBuf};

use serde_json::json;

use crate::config::TraceConfig;
use crate::error::Result;
use crate::fs_utils::write_creating_dirs;

/// Environment variable naming the raw trace log the runtime appends to
pub const TRACE_LOG_ENV: &str = "RTS_TRACE_LOG";

const RUNTIME_TEMPLATE: &str = include_str!("trace_runtime.js");

/// Runtime module source with its constants filled in
pub fn runtime_source(trace: &TraceConfig) -> String {
    RUNTIME_TEMPLATE
        .replace("__FLUSH_THRESHOLD__", &trace.flush_threshold.to_string())
        .replace("__LOG_ENV__", TRACE_LOG_ENV)
}

/// Write the runtime package into `snapshot_root/node_modules/<module>/`.
///
/// Returns the package directory. Must run after the project's own install
/// command, which may prune packages it does not know about.
pub fn install_runtime(snapshot_root: &Path, trace: &TraceConfig) -> Result<PathBuf> {
    let package_dir = snapshot_root
        .join("node_modules")
        .join(&trace.runtime_module);

    let manifest = json!({
        "name": trace.runtime_module,
        "version": env!("CARGO_PKG_VERSION"),
        "private": true,
        "main": "index.js",
    });
    write_creating_dirs(
        &package_dir.join("package.json"),
        serde_json::to_string_pretty(&manifest)?.as_bytes(),
    )?;
    write_creating_dirs(&package_dir.join("index.js"), runtime_source(trace).as_bytes())?;

    tracing::debug!("Installed trace runtime at {}", package_dir.display());
    Ok(package_dir)
}

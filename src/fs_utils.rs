//! Filesystem helpers: project walking, relative names, snapshot copies

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;

/// Directories never copied into a snapshot nor scanned for sources
pub const ALWAYS_SKIPPED_DIRS: &[&str] = &["node_modules", ".git"];

/// Project-relative name of `path` with `/` separators.
///
/// Returns None if `path` is not under `root`.
pub fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

/// Every regular file under `root`, sorted, skipping [`ALWAYS_SKIPPED_DIRS`]
/// and any directory whose root-relative path is in `extra_skips`.
///
/// Ignore files are not consulted: a snapshot must contain everything the
/// test suite may read.
pub fn walk_project(root: &Path, extra_skips: &[PathBuf]) -> Vec<PathBuf> {
    let skip_abs: Vec<PathBuf> = extra_skips.iter().map(|p| root.join(p)).collect();

    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(false);
    builder.follow_links(false);
    builder.filter_entry(move |entry| {
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        if ALWAYS_SKIPPED_DIRS.contains(&name.as_ref()) {
            return false;
        }
        !skip_abs.iter().any(|skip| entry.path() == skip.as_path())
    });

    let mut files: Vec<PathBuf> = builder
        .build()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                tracing::warn!("Skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Write `content` to `path`, creating parent directories
pub fn write_creating_dirs(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

/// Copy `from` to `to`, creating parent directories
pub fn copy_creating_dirs(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to).map(|_| ())
}

/// Sibling directory `<project>-<suffix>`
pub fn sibling_dir(project: &Path, suffix: &str) -> PathBuf {
    let name = project
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    project.with_file_name(format!("{}-{}", name, suffix))
}

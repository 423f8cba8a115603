//! Repository queries and file retrieval

use std::path::{Path, PathBuf};

use super::{git_command, git_command_optional};
use crate::error::{Result, RtsError};

/// Check if `cwd` is inside a git work tree
pub fn is_git_repo(cwd: Option<&Path>) -> bool {
    git_command_optional(&["rev-parse", "--is-inside-work-tree"], cwd)
        .map(|s| s.trim() == "true")
        .unwrap_or(false)
}

/// Get repo root directory
pub fn get_repo_root(cwd: Option<&Path>) -> Result<PathBuf> {
    if !is_git_repo(cwd) {
        return Err(RtsError::NotGitRepo);
    }
    let root = git_command(&["rev-parse", "--show-toplevel"], cwd)?;
    Ok(PathBuf::from(root.trim()))
}

/// Get the file content at a specific ref
///
/// Returns None if the file doesn't exist at that ref. Content is returned
/// untrimmed so byte offsets match the checked-in file.
pub fn get_file_at_ref(ref_name: &str, file_path: &str, cwd: Option<&Path>) -> Option<String> {
    git_command_optional(&["show", &format!("{}:{}", ref_name, file_path)], cwd)
}

//! Git operations for change discovery
//!
//! Uses subprocess calls to git: `diff --name-status` for the categorized
//! change list and `show ref:path` for file contents on either side.

mod diff;
mod repo;

pub use diff::{get_changed_files, parse_name_status, ChangeSet, RenamedFile};
pub use repo::{get_file_at_ref, get_repo_root, is_git_repo};

use std::path::Path;
use std::process::Command;

use crate::error::{Result, RtsError};

/// Run a git command and return stdout as string
pub fn git_command(args: &[&str], cwd: Option<&Path>) -> Result<String> {
    let mut cmd = Command::new("git");
    cmd.args(args);

    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let output = cmd.output().map_err(|e| RtsError::GitError {
        message: format!("Failed to execute git: {}", e),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RtsError::GitError {
            message: format!("git {} failed: {}", args.join(" "), stderr.trim()),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Run a git command, returning None if it fails (for optional queries)
pub fn git_command_optional(args: &[&str], cwd: Option<&Path>) -> Option<String> {
    git_command(args, cwd).ok()
}

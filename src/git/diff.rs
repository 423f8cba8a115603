//! Categorized change lists from `git diff --name-status`

use std::path::Path;

use serde::Serialize;

use super::git_command;
use crate::error::{Result, RtsError};

/// A file moved between revisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedFile {
    pub old_name: String,
    pub new_name: String,
    /// How much of the content changed, `100 - similarity`. Zero means a pure move.
    pub modification_percentage: u8,
}

/// Files touched between two revisions, by change kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    pub modified: Vec<String>,
    pub renamed: Vec<RenamedFile>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.deleted.is_empty()
            && self.modified.is_empty()
            && self.renamed.is_empty()
    }

    /// Renames whose content also changed
    pub fn modified_renames(&self) -> impl Iterator<Item = &RenamedFile> {
        self.renamed
            .iter()
            .filter(|r| r.modification_percentage != 0)
    }
}

/// Get the change set between two refs
///
/// # Arguments
/// * `before` - Starting ref (e.g., "main", commit SHA)
/// * `after` - Ending ref (e.g., "HEAD")
/// * `cwd` - Working directory (None for current)
pub fn get_changed_files(before: &str, after: &str, cwd: Option<&Path>) -> Result<ChangeSet> {
    // -M for rename detection
    let output = git_command(&["diff", "--name-status", "-M", before, after], cwd)?;
    parse_name_status(&output)
}

/// Parse the output of `git diff --name-status`.
///
/// Only `A`, `D`, `M` and `R<similarity>` codes are understood. Any other code
/// aborts with `ChangeParseError` rather than silently dropping the file.
pub fn parse_name_status(output: &str) -> Result<ChangeSet> {
    let mut changes = ChangeSet::default();

    for line in output.lines() {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 2 {
            continue;
        }

        match parts[0] {
            "A" => changes.added.push(parts[1].to_string()),
            "D" => changes.deleted.push(parts[1].to_string()),
            "M" => changes.modified.push(parts[1].to_string()),
            code if code.starts_with('R') => {
                let similarity: u8 = code[1..]
                    .parse()
                    .ok()
                    .filter(|s| *s <= 100)
                    .ok_or_else(|| RtsError::ChangeParseError {
                        message: format!("Invalid rename score in line: {}", line),
                    })?;
                let new_name = parts.get(2).ok_or_else(|| RtsError::ChangeParseError {
                    message: format!("Rename without target in line: {}", line),
                })?;
                changes.renamed.push(RenamedFile {
                    old_name: parts[1].to_string(),
                    new_name: new_name.to_string(),
                    modification_percentage: 100 - similarity,
                });
            }
            code => {
                return Err(RtsError::ChangeParseError {
                    message: format!("Unexpected change type '{}' in line: {}", code, line),
                });
            }
        }
    }

    tracing::debug!(
        "Parsed changes: {} added, {} deleted, {} modified, {} renamed",
        changes.added.len(),
        changes.deleted.len(),
        changes.modified.len(),
        changes.renamed.len()
    );
    Ok(changes)
}

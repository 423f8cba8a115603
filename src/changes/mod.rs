//! Affected-file collection and semantic change analysis.
//!
//! [`AffectedFiles`] holds both revisions of every touched JS/TS file, already
//! parsed. [`analyze`] turns it into the functions and files whose behavior
//! may have changed, under either [`RtsMode`].

mod analyzer;

pub use analyzer::{analyze, ChangeAnalysis};

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::Result;
use crate::git::{self, ChangeSet, RenamedFile};
use crate::lang::Lang;
use crate::parsing::{parse_named, ParsedFile};

/// Substrings that mark a file as a test file
pub const TEST_FILE_ENDINGS: &[&str] = &[
    "test.js",
    "test.ts",
    "test.jsx",
    "test.tsx",
    "spec.js",
    "spec.ts",
    "unittest.js",
    "unittest.ts",
];

/// Whether `file_name` is a test file. Matching is by substring, so
/// `math.test.ts` and `__tests__/math.spec.js` both qualify.
pub fn is_test_file(file_name: &str) -> bool {
    TEST_FILE_ENDINGS
        .iter()
        .any(|ending| file_name.contains(ending))
}

/// Granularity of change analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RtsMode {
    /// Every function of a touched file counts as changed
    Normal,
    /// Functions and methods are diffed semantically
    Extended,
}

impl RtsMode {
    /// Prefix used for artifact file names
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "NormalRTS",
            Self::Extended => "ExtendedRTS",
        }
    }
}

impl fmt::Display for RtsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which revision a file is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Before,
    After,
}

/// Parsed before/after versions of every affected file
#[derive(Debug, Default)]
pub struct AffectedFiles {
    pub added: BTreeMap<String, ParsedFile>,
    pub deleted: BTreeMap<String, ParsedFile>,
    pub modified_before: BTreeMap<String, ParsedFile>,
    pub modified_after: BTreeMap<String, ParsedFile>,
    /// Renames with content changes; pure moves are dropped
    pub renamed: Vec<RenamedFile>,
    pub renamed_before: BTreeMap<String, ParsedFile>,
    pub renamed_after: BTreeMap<String, ParsedFile>,
}

impl AffectedFiles {
    /// Parse every affected file of `changes`, reading contents through `fetch`.
    ///
    /// Files of unsupported languages are skipped. A file that `fetch` cannot
    /// supply is skipped with a warning.
    pub fn from_change_set<F>(changes: &ChangeSet, fetch: F) -> Result<Self>
    where
        F: Fn(Side, &str) -> Option<String>,
    {
        let mut files = Self::default();

        for name in &changes.added {
            if let Some(parsed) = load(&fetch, Side::After, name)? {
                files.added.insert(name.clone(), parsed);
            }
        }
        for name in &changes.deleted {
            if let Some(parsed) = load(&fetch, Side::Before, name)? {
                files.deleted.insert(name.clone(), parsed);
            }
        }
        for name in &changes.modified {
            if let Some(parsed) = load(&fetch, Side::Before, name)? {
                files.modified_before.insert(name.clone(), parsed);
            }
            if let Some(parsed) = load(&fetch, Side::After, name)? {
                files.modified_after.insert(name.clone(), parsed);
            }
        }
        for rename in changes.modified_renames() {
            let before = load(&fetch, Side::Before, &rename.old_name)?;
            let after = load(&fetch, Side::After, &rename.new_name)?;
            if before.is_none() && after.is_none() {
                continue;
            }
            if let Some(parsed) = before {
                files.renamed_before.insert(rename.old_name.clone(), parsed);
            }
            if let Some(parsed) = after {
                files.renamed_after.insert(rename.new_name.clone(), parsed);
            }
            files.renamed.push(rename.clone());
        }

        tracing::info!(
            "Affected files: {} added, {} deleted, {} modified, {} renamed",
            files.added.len(),
            files.deleted.len(),
            files.modified_before.len(),
            files.renamed.len()
        );
        Ok(files)
    }

    /// Collect and parse the changes between two refs of the repository at `repo`.
    pub fn from_git(repo: &Path, before: &str, after: &str) -> Result<Self> {
        let changes = git::get_changed_files(before, after, Some(repo))?;
        Self::from_change_set(&changes, |side, path| {
            let rev = match side {
                Side::Before => before,
                Side::After => after,
            };
            git::get_file_at_ref(rev, path, Some(repo))
        })
    }
}

fn load<F>(fetch: &F, side: Side, name: &str) -> Result<Option<ParsedFile>>
where
    F: Fn(Side, &str) -> Option<String>,
{
    if !Lang::is_supported_path(Path::new(name)) {
        tracing::debug!("Skipping unsupported file {}", name);
        return Ok(None);
    }
    let Some(source) = fetch(side, name) else {
        tracing::warn!("Could not read {:?} version of {}", side, name);
        return Ok(None);
    };
    parse_named(name, &source).map(Some)
}

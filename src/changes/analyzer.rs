//! Per-file change classification and the analysis artifacts it produces

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;

use super::{is_test_file, AffectedFiles, RtsMode};
use crate::elements::{build_code_elements, CodeElementSet, FunctionDescriptor};
use crate::error::{Result, RtsError};
use crate::parsing::ParsedFile;

/// Result of analyzing one revision pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeAnalysis {
    /// Files whose behavior may have changed at all
    pub semantically_changed_files: BTreeSet<String>,
    /// Files whose dependents must all be retested, regardless of function traces
    pub fallback_files: BTreeSet<String>,
    pub changed_functions: Vec<FunctionDescriptor>,
    pub modified_test_files: Vec<String>,
}

/// What one file contributed
#[derive(Debug, Default)]
struct FileOutcome {
    file: String,
    changed_functions: Vec<FunctionDescriptor>,
    fallback: bool,
    modified_test: bool,
}

impl FileOutcome {
    fn is_semantically_changed(&self) -> bool {
        self.fallback || !self.changed_functions.is_empty()
    }
}

/// Classify every affected file.
///
/// Added files never contribute changed functions: nothing in the baseline
/// can depend on them. Deleted files and the old side of modified renames
/// count as entirely changed. Modified test files are listed separately and
/// not diffed. Other modified files are treated as entirely changed in
/// [`RtsMode::Normal`] and diffed element by element in [`RtsMode::Extended`].
pub fn analyze(files: &AffectedFiles, mode: RtsMode) -> ChangeAnalysis {
    let mut outcomes: Vec<FileOutcome> = files
        .deleted
        .par_iter()
        .chain(files.renamed_before.par_iter())
        .map(|(name, parsed)| whole_file_outcome(name, parsed))
        .collect();

    let modified: Vec<FileOutcome> = files
        .modified_before
        .par_iter()
        .map(|(name, before)| {
            if is_test_file(name) {
                return FileOutcome {
                    file: name.clone(),
                    modified_test: true,
                    ..Default::default()
                };
            }
            match (mode, files.modified_after.get(name)) {
                (RtsMode::Extended, Some(after)) => diff_outcome(name, before, after),
                _ => whole_file_outcome(name, before),
            }
        })
        .collect();
    outcomes.extend(modified);

    let mut analysis = ChangeAnalysis::default();
    for outcome in outcomes {
        if outcome.modified_test {
            analysis.modified_test_files.push(outcome.file);
            continue;
        }
        if outcome.is_semantically_changed() {
            analysis.semantically_changed_files.insert(outcome.file.clone());
        }
        if outcome.fallback {
            analysis.fallback_files.insert(outcome.file.clone());
        }
        analysis.changed_functions.extend(outcome.changed_functions);
    }

    tracing::info!(
        "{}: {} changed functions across {} files ({} fallback, {} modified test files)",
        mode,
        analysis.changed_functions.len(),
        analysis.semantically_changed_files.len(),
        analysis.fallback_files.len(),
        analysis.modified_test_files.len()
    );
    analysis
}

/// Every function and method of the file counts as changed
fn whole_file_outcome(name: &str, parsed: &ParsedFile) -> FileOutcome {
    let elements = build_code_elements(name, parsed);
    FileOutcome {
        file: name.to_string(),
        changed_functions: elements.all_descriptors(),
        fallback: elements.has_class_properties(),
        modified_test: false,
    }
}

fn diff_outcome(name: &str, before: &ParsedFile, after: &ParsedFile) -> FileOutcome {
    let before = build_code_elements(name, before);
    let after = build_code_elements(name, after);

    let mut changed = changed_functions(&before, &after);
    let mut fallback = globals_changed(&before, &after);

    let after_classes: Vec<_> = after.classes().collect();
    for class in before.classes() {
        match after_classes.iter().find(|c| c.name == class.name) {
            Some(counterpart) => {
                changed.extend(class.semantically_changed_methods(counterpart));
                if !fallback && class.should_fallback_to_file_dependency(counterpart) {
                    tracing::debug!("Class {} in {} forces file fallback", class.name, name);
                    fallback = true;
                }
            }
            None => changed.extend(class.method_descriptors()),
        }
    }

    FileOutcome {
        file: name.to_string(),
        changed_functions: changed,
        fallback,
        modified_test: false,
    }
}

fn changed_functions(before: &CodeElementSet, after: &CodeElementSet) -> Vec<FunctionDescriptor> {
    let after_functions: Vec<_> = after.functions().collect();
    before
        .functions()
        .filter(|f| match after_functions.iter().find(|a| f.matches(a)) {
            Some(counterpart) => f.is_semantically_changed(counterpart),
            None => true,
        })
        .map(|f| f.descriptor())
        .collect()
}

/// A module-scope declarator that disappeared or changed
fn globals_changed(before: &CodeElementSet, after: &CodeElementSet) -> bool {
    before
        .global_variables
        .iter()
        .any(|g| !after.global_variables.contains(g))
}

const CHANGED_FUNCTIONS: &str = "ChangedFunctions.json";
const SEMANTICALLY_CHANGED_FILES: &str = "SemanticallyChangedFiles.txt";
const FALLBACK_FILES: &str = "FallbackFiles.txt";
const MODIFIED_TEST_FILES: &str = "ModifiedTestFiles.txt";

impl ChangeAnalysis {
    /// Write `<Mode>ChangedFunctions.json` and the `<Mode>*Files.txt` lists into `dir`.
    pub fn write_artifacts(&self, dir: &Path, mode: RtsMode) -> Result<()> {
        fs::create_dir_all(dir)?;
        let label = mode.label();
        fs::write(
            dir.join(format!("{}{}", label, CHANGED_FUNCTIONS)),
            serde_json::to_string_pretty(&self.changed_functions)?,
        )?;
        write_lines(
            &dir.join(format!("{}{}", label, SEMANTICALLY_CHANGED_FILES)),
            self.semantically_changed_files.iter(),
        )?;
        write_lines(
            &dir.join(format!("{}{}", label, FALLBACK_FILES)),
            self.fallback_files.iter(),
        )?;
        write_lines(
            &dir.join(format!("{}{}", label, MODIFIED_TEST_FILES)),
            self.modified_test_files.iter(),
        )?;
        tracing::debug!("Wrote {} analysis artifacts to {}", label, dir.display());
        Ok(())
    }

    /// Read back what [`write_artifacts`](Self::write_artifacts) produced.
    pub fn load_artifacts(dir: &Path, mode: RtsMode) -> Result<Self> {
        let label = mode.label();
        let functions_path = dir.join(format!("{}{}", label, CHANGED_FUNCTIONS));
        if !functions_path.exists() {
            return Err(RtsError::missing_artifact(
                &functions_path,
                "run `semfora-rts analyze` first",
            ));
        }
        let changed_functions = serde_json::from_str(&fs::read_to_string(&functions_path)?)?;
        Ok(Self {
            semantically_changed_files: read_lines(
                &dir.join(format!("{}{}", label, SEMANTICALLY_CHANGED_FILES)),
            )?
            .into_iter()
            .collect(),
            fallback_files: read_lines(&dir.join(format!("{}{}", label, FALLBACK_FILES)))?
                .into_iter()
                .collect(),
            changed_functions,
            modified_test_files: read_lines(
                &dir.join(format!("{}{}", label, MODIFIED_TEST_FILES)),
            )?,
        })
    }
}

fn write_lines<'a>(path: &Path, lines: impl Iterator<Item = &'a String>) -> Result<()> {
    let mut content = String::new();
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    Ok(fs::read_to_string(path)?
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.trim().to_string())
        .collect())
}

//! Dynamic dependency graph: the function -> test edges observed while the
//! instrumented suite ran.
//!
//! The trace runtime appends comma-terminated JSON fragments to a raw log
//! with no enclosing array. [`parse_raw_log`] turns that into edges;
//! [`DependencyGraph`] is the persisted, deduplicated form
//! (`dynamicDependencyGraph.json`).

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RtsError};
use crate::registry::FunctionId;

/// Test name recorded for calls made outside any test (module load, hooks)
pub const UNDEFINED_TEST: &str = "undefined";

/// Every fragment the runtime writes starts with this key
const FRAGMENT_START: &str = "{\"function\"";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub function: FunctionId,
    pub test: String,
}

/// Wrap a raw log into a JSON array and drop trailing-comma defects.
pub fn normalize_raw_log(raw: &str) -> String {
    let body = raw.trim().trim_end_matches(|c: char| c == ',' || c.is_whitespace());
    format!("[{}]", body)
}

/// Parse every well-formed fragment of a raw trace log.
///
/// The fast path parses the normalized array. If the log has other defects
/// (an interrupted write, doubled commas) fragments are read one at a time
/// and a malformed one is skipped up to the start of the next fragment.
pub fn parse_raw_log(raw: &str) -> Vec<DependencyEdge> {
    if let Ok(edges) = serde_json::from_str::<Vec<DependencyEdge>>(&normalize_raw_log(raw)) {
        return edges;
    }

    let mut edges = Vec::new();
    let mut rest = raw;
    loop {
        rest = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
        if rest.is_empty() {
            break;
        }
        let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<DependencyEdge>();
        match stream.next() {
            Some(Ok(edge)) => {
                edges.push(edge);
                rest = &rest[stream.byte_offset()..];
            }
            Some(Err(e)) => {
                tracing::warn!("Skipping malformed trace log fragment: {}", e);
                match rest[1..].find(FRAGMENT_START) {
                    Some(next) => rest = &rest[1 + next..],
                    None => break,
                }
            }
            None => break,
        }
    }
    edges
}

pub const DEPENDENCY_GRAPH_FILE: &str = "dynamicDependencyGraph.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    edges: Vec<DependencyEdge>,
}

impl DependencyGraph {
    /// Build a graph, dropping duplicate edges. Edge order is (id, test).
    pub fn from_edges(edges: impl IntoIterator<Item = DependencyEdge>) -> Self {
        let unique: BTreeSet<DependencyEdge> = edges.into_iter().collect();
        Self {
            edges: unique.into_iter().collect(),
        }
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Tests that exercised any of `ids`, excluding the out-of-test sentinel
    pub fn tests_for(&self, ids: &HashSet<FunctionId>) -> BTreeSet<String> {
        self.edges
            .iter()
            .filter(|e| ids.contains(&e.function) && e.test != UNDEFINED_TEST)
            .map(|e| e.test.clone())
            .collect()
    }

    /// Read a raw log at `raw_log`, write the normalized graph into `dir`,
    /// and delete the raw log.
    pub fn collect_raw_log(raw_log: &Path, dir: &Path) -> Result<Self> {
        let raw = if raw_log.exists() {
            fs::read_to_string(raw_log)?
        } else {
            tracing::warn!(
                "No trace log at {}; no instrumented function ran under test",
                raw_log.display()
            );
            String::new()
        };
        let graph = Self::from_edges(parse_raw_log(&raw));
        graph.save(dir)?;
        if raw_log.exists() {
            fs::remove_file(raw_log)?;
        }
        tracing::info!("Collected {} dependency edges", graph.len());
        Ok(graph)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(DEPENDENCY_GRAPH_FILE), serde_json::to_string(self)?)?;
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(DEPENDENCY_GRAPH_FILE);
        if !path.exists() {
            return Err(RtsError::missing_artifact(
                &path,
                "run `semfora-rts baseline` first",
            ));
        }
        let edges: Vec<DependencyEdge> = serde_json::from_str(&fs::read_to_string(&path)?)?;
        Ok(Self::from_edges(edges))
    }
}

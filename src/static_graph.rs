//! Static file dependency graph built from import specifiers.
//!
//! Used only for whole-file fallback: when a changed file cannot be tracked
//! at function level, every test file that (transitively) imports it runs in
//! full. Serialized in madge's `--json` shape: an object mapping each file to
//! the files it depends on.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::path::{Component, Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::error::{Result, RtsError};
use crate::fs_utils::{relative_name, walk_project};
use crate::lang::Lang;
use crate::parsing::{parse_file, ParsedFile};
use crate::syntax::common::{child_of_kind, unquote};
use crate::syntax::{get_node_text, visit_all, JsNode};

pub const STATIC_GRAPH_FILE: &str = "staticFileDependency.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticGraph {
    dependencies: BTreeMap<String, Vec<String>>,
}

impl StaticGraph {
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn insert(&mut self, file: impl Into<String>, dependencies: Vec<String>) {
        self.dependencies.insert(file.into(), dependencies);
    }

    pub fn dependencies_of(&self, file: &str) -> &[String] {
        self.dependencies
            .get(file)
            .map(|d| d.as_slice())
            .unwrap_or(&[])
    }

    /// Reverse edges: file -> files that import it
    pub fn dependents(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut reverse: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (file, deps) in &self.dependencies {
            for dep in deps {
                reverse.entry(dep.as_str()).or_default().push(file.as_str());
            }
        }
        reverse
    }

    /// Every file that transitively depends on any of `seeds`.
    ///
    /// Seeds are only included when reached through an import cycle.
    pub fn reverse_closure<'a>(&self, seeds: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
        let reverse = self.dependents();
        let mut reached: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<&str> = seeds.into_iter().collect();

        while let Some(file) = queue.pop_front() {
            for dependent in reverse.get(file).into_iter().flatten() {
                if reached.insert((*dependent).to_string()) {
                    queue.push_back(*dependent);
                }
            }
        }
        reached
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(
            dir.join(STATIC_GRAPH_FILE),
            serde_json::to_string_pretty(self)?,
        )?;
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(STATIC_GRAPH_FILE);
        if !path.exists() {
            return Err(RtsError::missing_artifact(
                &path,
                "run `semfora-rts graph` or `semfora-rts baseline` first",
            ));
        }
        Ok(serde_json::from_str(&fs::read_to_string(&path)?)?)
    }
}

/// Build the graph for every JS/TS file under `root`.
///
/// Files that fail to parse are kept with no dependencies.
pub fn build(root: &Path, skips: &[PathBuf]) -> StaticGraph {
    let files: Vec<String> = walk_project(root, skips)
        .iter()
        .filter(|p| Lang::is_supported_path(p))
        .filter_map(|p| relative_name(root, p))
        .collect();
    let known: BTreeSet<&str> = files.iter().map(|f| f.as_str()).collect();

    let dependencies: BTreeMap<String, Vec<String>> = files
        .par_iter()
        .map(|file| {
            let deps = match parse_file(root, file) {
                Ok(parsed) => {
                    let mut deps: Vec<String> = import_specifiers(&parsed)
                        .iter()
                        .filter_map(|spec| resolve_specifier(file, spec, &known))
                        .filter(|dep| dep != file)
                        .collect();
                    deps.sort();
                    deps.dedup();
                    deps
                }
                Err(e) => {
                    tracing::warn!("Static graph: skipping imports of {}: {}", file, e);
                    Vec::new()
                }
            };
            (file.clone(), deps)
        })
        .collect();

    let graph = StaticGraph { dependencies };
    tracing::info!(
        "Static graph: {} files, {} edges",
        graph.len(),
        graph.dependencies.values().map(Vec::len).sum::<usize>()
    );
    graph
}

/// Module specifiers named by imports, re-exports, `require` and dynamic
/// `import()` calls. Only string literals (and substitution-free templates)
/// are considered.
pub fn import_specifiers(parsed: &ParsedFile) -> Vec<String> {
    let source = parsed.source.as_str();
    let mut specifiers = Vec::new();
    visit_all(&parsed.root(), |node| {
        let literal = match JsNode::classify(*node) {
            JsNode::CallExpression(call) => {
                let is_loader = call
                    .child_by_field_name("function")
                    .map(|f| {
                        f.kind() == "import"
                            || (f.kind() == "identifier" && get_node_text(&f, source) == "require")
                    })
                    .unwrap_or(false);
                if !is_loader {
                    return;
                }
                call.child_by_field_name("arguments")
                    .and_then(|args| args.named_child(0))
            }
            JsNode::Other(n) => match n.kind() {
                "import_statement" | "export_statement" => n.child_by_field_name("source"),
                "import_require_clause" => child_of_kind(&n, "string"),
                _ => None,
            },
            _ => None,
        };
        if let Some(spec) = literal.and_then(|lit| string_value(&lit, source)) {
            specifiers.push(spec);
        }
    });
    specifiers
}

fn string_value(literal: &Node, source: &str) -> Option<String> {
    match literal.kind() {
        "string" => Some(unquote(&get_node_text(literal, source)).to_string()),
        "template_string" if child_of_kind(literal, "template_substitution").is_none() => {
            Some(unquote(&get_node_text(literal, source)).to_string())
        }
        _ => None,
    }
}

/// Resolve a relative specifier from `importer` against the known files.
///
/// Tries the path as written, then each extension, then a directory
/// `index` file. A `.js`-family extension may also name a TypeScript source
/// (`./util.js` -> `util.ts`). Package specifiers resolve to None.
pub fn resolve_specifier(importer: &str, specifier: &str, known: &BTreeSet<&str>) -> Option<String> {
    if !(specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." || specifier == "..") {
        return None;
    }
    let base = Path::new(importer).parent().unwrap_or_else(|| Path::new(""));
    let target = normalize(&base.join(specifier))?;

    let mut candidates = vec![target.clone()];
    candidates.extend(Lang::all_extensions().iter().map(|ext| format!("{}.{}", target, ext)));
    if let Some(stem) = ["js", "jsx", "mjs", "cjs"]
        .iter()
        .find_map(|ext| target.strip_suffix(&format!(".{}", ext)))
    {
        candidates.extend(["ts", "tsx", "mts", "cts"].iter().map(|ext| format!("{}.{}", stem, ext)));
    }
    let dir = if target.is_empty() {
        String::new()
    } else {
        format!("{}/", target)
    };
    candidates.extend(Lang::all_extensions().iter().map(|ext| format!("{}index.{}", dir, ext)));

    candidates.into_iter().find(|c| known.contains(c.as_str()))
}

/// Lexically normalize a project-relative path; None if it escapes the root
fn normalize(path: &Path) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

//! Unified parsing module.
//!
//! Every component that consumes a syntax tree (element builder, instrumentor,
//! static import graph, test-file rewriting) goes through [`parse_source`], so
//! grammar selection and parse failures are handled in one place.
//!
//! # Example
//!
//! ```ignore
//! use semfora_rts::parsing::parse_source;
//! use semfora_rts::Lang;
//!
//! let parsed = parse_source("src/add.ts", "function add(a, b) { return a + b; }", Lang::TypeScript)?;
//! assert_eq!(parsed.root().kind(), "program");
//! ```

use std::path::Path;

use tree_sitter::{Node, Tree};

use crate::error::{Result, RtsError};
use crate::lang::Lang;

/// A parsed source file. Owns the source text the tree's byte ranges point into.
pub struct ParsedFile {
    /// Project-relative file name, `/` separated
    pub name: String,
    pub source: String,
    pub lang: Lang,
    pub tree: Tree,
}

impl ParsedFile {
    /// Root `program` node
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Whether tree-sitter had to recover from syntax errors
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

impl std::fmt::Debug for ParsedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedFile")
            .field("name", &self.name)
            .field("lang", &self.lang)
            .field("bytes", &self.source.len())
            .finish()
    }
}

/// Parse source code into a [`ParsedFile`].
///
/// # Errors
///
/// Returns `RtsError::ParseFailure` if the grammar cannot be loaded or
/// tree-sitter produces no tree.
pub fn parse_source(name: &str, source: &str, lang: Lang) -> Result<ParsedFile> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&lang.tree_sitter_language())
        .map_err(|e| RtsError::ParseFailure {
            message: format!("Failed to set language for {}: {:?}", name, e),
        })?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| RtsError::ParseFailure {
            message: format!("Failed to parse file: {}", name),
        })?;

    Ok(ParsedFile {
        name: name.to_string(),
        source: source.to_string(),
        lang,
        tree,
    })
}

/// Detect the language from `name` and parse `source`.
pub fn parse_named(name: &str, source: &str) -> Result<ParsedFile> {
    let lang = Lang::from_path(Path::new(name))?;
    parse_source(name, source, lang)
}

/// Read `root/name` from disk and parse it.
pub fn parse_file(root: &Path, name: &str) -> Result<ParsedFile> {
    let full = root.join(name);
    if !full.exists() {
        return Err(RtsError::FileNotFound {
            path: full.display().to_string(),
        });
    }
    let source = std::fs::read_to_string(&full)?;
    parse_named(name, &source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typescript() {
        let source = "export function hello(): string { return 'world'; }";
        let parsed = parse_source("hello.ts", source, Lang::TypeScript).unwrap();
        assert_eq!(parsed.root().kind(), "program");
        assert!(!parsed.has_errors());
    }

    #[test]
    fn test_parse_named_detects_language() {
        let parsed = parse_named("App.jsx", "const App = () => <div />;").unwrap();
        assert_eq!(parsed.lang, Lang::Jsx);
    }

    #[test]
    fn test_parse_named_rejects_unknown_extension() {
        assert!(matches!(
            parse_named("styles.css", "a {}"),
            Err(RtsError::UnsupportedLanguage { .. })
        ));
    }

    #[test]
    fn test_parse_invalid_syntax() {
        // Tree-sitter is lenient with syntax errors; the flow must not panic
        let parsed = parse_source("broken.ts", "function { invalid syntax", Lang::TypeScript);
        if let Ok(parsed) = parsed {
            assert!(parsed.has_errors());
        }
    }

    #[test]
    fn test_parse_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            parse_file(dir.path(), "nope.ts"),
            Err(RtsError::FileNotFound { .. })
        ));
    }
}

//! Canonical forms: position-free serializations of syntax subtrees.
//!
//! A canonical form is the token stream of a subtree with layout removed:
//! comments, whitespace, quote style, and pure punctuation (`;`, `,`, braces,
//! brackets, parentheses) do not appear in it. Two subtrees with equal
//! canonical forms are treated as the same code.
//!
//! Identifier leaves are kept as separate tokens so that parameter renames can
//! be undone structurally with [`CanonicalForm::rebind`], instead of by
//! substring replacement over the rendered text.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tree_sitter::Node;

/// Anonymous tokens that carry no meaning once the tree shape is known
const LAYOUT_TOKENS: &[&str] = &[";", ",", "(", ")", "{", "}", "[", "]", "\"", "'"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Token {
    Open(&'static str),
    Close,
    /// A value-level `identifier` leaf (the only kind a parameter rename touches)
    Ident(String),
    /// Any other named leaf: kind plus source text
    Leaf(&'static str, String),
    /// Anonymous token such as an operator or keyword
    Keyword(&'static str),
}

/// Canonical serialization of a subtree
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CanonicalForm {
    tokens: Vec<Token>,
}

impl CanonicalForm {
    /// Serialize `node` and everything below it
    pub fn of(node: &Node, source: &str) -> Self {
        let mut tokens = Vec::new();
        push_tokens(node, source, &mut tokens);
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Rewrite identifier leaves through `renames` (old name -> new name).
    ///
    /// All renames apply simultaneously, so swapped parameter names map
    /// correctly. Returns `None` when the rewrite would capture: an identifier
    /// that is not being renamed already spells one of the target names, so
    /// after the rewrite two distinct bindings would become indistinguishable.
    pub fn rebind(&self, renames: &HashMap<&str, &str>) -> Option<Self> {
        let targets: HashSet<&str> = renames
            .iter()
            .filter(|(from, to)| from != to)
            .map(|(_, to)| *to)
            .collect();

        let mut tokens = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            match token {
                Token::Ident(name) => match renames.get(name.as_str()) {
                    Some(to) => tokens.push(Token::Ident((*to).to_string())),
                    None if targets.contains(name.as_str()) => return None,
                    None => tokens.push(token.clone()),
                },
                _ => tokens.push(token.clone()),
            }
        }
        Some(Self { tokens })
    }

    /// Rendered string form, suitable for persisting or for byte comparison
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CanonicalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for token in &self.tokens {
            let needs_space = !first && !matches!(token, Token::Close);
            if needs_space {
                f.write_str(" ")?;
            }
            match token {
                Token::Open(kind) => write!(f, "({}", kind)?,
                Token::Close => f.write_str(")")?,
                Token::Ident(name) => write!(f, "(identifier {:?})", name)?,
                Token::Leaf(kind, text) => write!(f, "({} {:?})", kind, text)?,
                Token::Keyword(kind) => write!(f, "{:?}", kind)?,
            }
            first = false;
        }
        Ok(())
    }
}

fn push_tokens(node: &Node, source: &str, tokens: &mut Vec<Token>) {
    if node.is_extra() || node.kind() == "comment" {
        return;
    }

    if !node.is_named() {
        if !LAYOUT_TOKENS.contains(&node.kind()) {
            tokens.push(Token::Keyword(node.kind()));
        }
        return;
    }

    if node.child_count() == 0 {
        let text = node.utf8_text(source.as_bytes()).unwrap_or("").to_string();
        if node.kind() == "identifier" {
            tokens.push(Token::Ident(text));
        } else {
            tokens.push(Token::Leaf(node.kind(), text));
        }
        return;
    }

    tokens.push(Token::Open(node.kind()));
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        push_tokens(&child, source, tokens);
    }
    tokens.push(Token::Close);
}

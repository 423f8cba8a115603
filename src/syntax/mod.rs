//! Typed view over the tree-sitter ECMAScript/TypeScript grammars.
//!
//! tree-sitter exposes nodes by kind string. Everything this crate cares
//! about is funneled through [`JsNode::classify`], so consumers match on a
//! closed enum instead of probing kind strings and optional fields ad hoc.

pub mod canonical;
pub mod common;

use tree_sitter::Node;

pub use canonical::CanonicalForm;
pub use common::{ancestors, get_node_text, get_node_text_normalized, has_keyword, visit_all};

/// The node kinds the element builder, instrumentor and test rewriter act on.
#[derive(Debug, Clone, Copy)]
pub enum JsNode<'t> {
    /// `function f() {}` and `function* f() {}`
    FunctionDeclaration(Node<'t>),
    /// `function () {}` used as a value
    FunctionExpression(Node<'t>),
    /// `() => ...`
    ArrowFunction(Node<'t>),
    /// `class A {}` (including TypeScript `abstract class`)
    ClassDeclaration(Node<'t>),
    /// `class {}` used as a value
    ClassExpression(Node<'t>),
    /// A method member of a class body
    MethodDefinition(Node<'t>),
    /// A property member of a class body
    FieldDefinition(Node<'t>),
    /// `name = value` inside a `const`/`let`/`var` declaration
    VariableDeclarator(Node<'t>),
    CallExpression(Node<'t>),
    Other(Node<'t>),
}

impl<'t> JsNode<'t> {
    pub fn classify(node: Node<'t>) -> Self {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => {
                Self::FunctionDeclaration(node)
            }
            "function_expression" | "function" | "generator_function" => {
                Self::FunctionExpression(node)
            }
            "arrow_function" => Self::ArrowFunction(node),
            "class_declaration" | "abstract_class_declaration" => Self::ClassDeclaration(node),
            "class" => Self::ClassExpression(node),
            "method_definition" => Self::MethodDefinition(node),
            "field_definition" | "public_field_definition" => Self::FieldDefinition(node),
            "variable_declarator" => Self::VariableDeclarator(node),
            "call_expression" => Self::CallExpression(node),
            _ => Self::Other(node),
        }
    }

    pub fn node(&self) -> Node<'t> {
        match *self {
            Self::FunctionDeclaration(n)
            | Self::FunctionExpression(n)
            | Self::ArrowFunction(n)
            | Self::ClassDeclaration(n)
            | Self::ClassExpression(n)
            | Self::MethodDefinition(n)
            | Self::FieldDefinition(n)
            | Self::VariableDeclarator(n)
            | Self::CallExpression(n)
            | Self::Other(n) => n,
        }
    }
}

/// Whether `node` introduces a new function scope
pub fn is_function_scope(node: &Node) -> bool {
    matches!(
        JsNode::classify(*node),
        JsNode::FunctionDeclaration(_)
            | JsNode::FunctionExpression(_)
            | JsNode::ArrowFunction(_)
            | JsNode::MethodDefinition(_)
    )
}

/// If `node` is the value bound by a variable declarator, return that declarator.
///
/// Parentheses around the value are looked through: `const f = (() => 1)` is
/// a bound arrow function.
pub fn binding_declarator<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    let mut child = *node;
    let mut parent = node.parent()?;
    while parent.kind() == "parenthesized_expression" {
        child = parent;
        parent = parent.parent()?;
    }
    match JsNode::classify(parent) {
        JsNode::VariableDeclarator(decl) => {
            let value = decl.child_by_field_name("value")?;
            (value.id() == child.id()).then_some(decl)
        }
        _ => None,
    }
}

/// Name bound by a declarator: the identifier text, or the canonical form of a
/// destructuring pattern.
pub fn declarator_name(decl: &Node, source: &str) -> String {
    match decl.child_by_field_name("name") {
        Some(name) if name.kind() == "identifier" => get_node_text(&name, source),
        Some(name) => CanonicalForm::of(&name, source).render(),
        None => String::new(),
    }
}

/// Name of a class member key.
///
/// `#secret` yields `secret`, string keys yield their contents, numeric keys
/// are tagged so `1` and `"1"` stay distinct, computed keys fall back to their
/// canonical form.
pub fn member_name(name: &Node, source: &str) -> String {
    match name.kind() {
        "property_identifier" | "identifier" => get_node_text(name, source),
        "private_property_identifier" => get_node_text(name, source)
            .trim_start_matches('#')
            .to_string(),
        "string" => common::unquote(&get_node_text(name, source)).to_string(),
        "number" => format!("NumericLiteral#{}", get_node_text(name, source)),
        _ => CanonicalForm::of(name, source).render(),
    }
}

/// Parameter list of a function-like node.
///
/// Plain identifiers (optionally type-annotated) yield their name. Any other
/// parameter shape (defaults, destructuring, rest, TypeScript parameter
/// properties) yields its canonical form so it still counts toward arity and
/// still compares by content.
pub fn parameter_names(func: &Node, source: &str) -> Vec<String> {
    if let Some(single) = func.child_by_field_name("parameter") {
        return vec![get_node_text(&single, source)];
    }
    let Some(params) = func.child_by_field_name("parameters") else {
        return Vec::new();
    };

    let mut names = Vec::new();
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        match param.kind() {
            "comment" => {}
            "identifier" => names.push(get_node_text(&param, source)),
            "required_parameter" | "optional_parameter" if is_simple_ts_parameter(&param) => {
                if let Some(pattern) = param.child_by_field_name("pattern") {
                    names.push(get_node_text(&pattern, source));
                }
            }
            _ => names.push(CanonicalForm::of(&param, source).render()),
        }
    }
    names
}

fn is_simple_ts_parameter(param: &Node) -> bool {
    let simple_pattern = param
        .child_by_field_name("pattern")
        .map(|p| matches!(p.kind(), "identifier" | "this"))
        .unwrap_or(false);
    if !simple_pattern || param.child_by_field_name("value").is_some() {
        return false;
    }
    let mut cursor = param.walk();
    let has_modifier = param.children(&mut cursor).any(|c| {
        matches!(
            c.kind(),
            "accessibility_modifier" | "override_modifier" | "readonly"
        )
    });
    !has_modifier
}

/// Whether a parameter entry produced by [`parameter_names`] is a plain binding name
pub fn is_plain_parameter(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Whether a function-like node is declared `async`
pub fn is_async(func: &Node) -> bool {
    has_keyword(func, "async")
}

/// Body node of a function-like node (block or, for arrows, an expression)
pub fn function_body<'t>(func: &Node<'t>) -> Option<Node<'t>> {
    func.child_by_field_name("body")
}

/// Nearest class that encloses `node`, with its resolved name.
///
/// Named class declarations answer directly. A class expression bound to a
/// variable takes the binding name, even when it has a name of its own, which
/// is how the element builder names it. An unbound named class expression
/// falls back to its own name.
pub fn enclosing_class_name(node: &Node, source: &str) -> Option<String> {
    for ancestor in ancestors(node) {
        match JsNode::classify(ancestor) {
            JsNode::ClassDeclaration(class) => {
                if let Some(name) = class.child_by_field_name("name") {
                    return Some(get_node_text(&name, source));
                }
            }
            JsNode::ClassExpression(class) => {
                if let Some(decl) = binding_declarator(&class) {
                    return Some(declarator_name(&decl, source));
                }
                if let Some(name) = class.child_by_field_name("name") {
                    return Some(get_node_text(&name, source));
                }
            }
            _ => {}
        }
    }
    None
}

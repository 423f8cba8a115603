//! Single-walk construction of a [`CodeElementSet`] from a parsed file.

use tree_sitter::Node;

use super::{
    ClassElement, CodeElement, CodeElementSet, ElementId, FileElement, FunctionElement,
    FunctionVariant, MethodElement, MethodKind, PropertyElement, Visibility,
};
use crate::parsing::ParsedFile;
use crate::syntax::common::child_of_kind;
use crate::syntax::{
    ancestors, binding_declarator, declarator_name, function_body, get_node_text,
    get_node_text_normalized, has_keyword, is_async, is_function_scope, member_name,
    parameter_names, visit_all, CanonicalForm, JsNode,
};

/// Walk state threaded through one build pass
struct BuildState<'a> {
    file_name: &'a str,
    source: &'a str,
    next_id: ElementId,
    set: CodeElementSet,
}

impl<'a> BuildState<'a> {
    fn allocate(&mut self) -> ElementId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn push_function(&mut self, node: Node, name: String, variant: FunctionVariant) {
        let id = self.allocate();
        let body = function_body(&node)
            .map(|b| CanonicalForm::of(&b, self.source))
            .unwrap_or_default();
        let element = FunctionElement {
            id,
            name,
            file: self.file_name.to_string(),
            body,
            is_async: is_async(&node),
            params: parameter_names(&node, self.source),
            variant,
        };
        self.set.function_ids.push(id);
        self.set.elements.insert(id, CodeElement::Function(element));
    }

    fn push_class(&mut self, node: Node, name: String) {
        let id = self.allocate();
        let element = class_element(id, &node, name, self.file_name, self.source);
        self.set.class_ids.push(id);
        self.set.elements.insert(id, CodeElement::Class(element));
    }
}

/// Build the element set of one file.
///
/// Ids are assigned in document order starting with the file element at 0.
/// Function and arrow expressions, and class expressions, are only modeled
/// when they are the value of a variable declarator; they take the bound name.
pub fn build_code_elements(file_name: &str, parsed: &ParsedFile) -> CodeElementSet {
    let source = parsed.source.as_str();
    let root = parsed.root();

    let mut state = BuildState {
        file_name,
        source,
        next_id: 0,
        set: CodeElementSet {
            file_name: file_name.to_string(),
            ..Default::default()
        },
    };

    let file_id = state.allocate();
    state.set.file_id = file_id;
    state.set.elements.insert(
        file_id,
        CodeElement::File(FileElement {
            id: file_id,
            name: file_name.to_string(),
            body: CanonicalForm::of(&root, source),
        }),
    );

    visit_all(&root, |node| match JsNode::classify(*node) {
        JsNode::FunctionDeclaration(func) => {
            let name = func
                .child_by_field_name("name")
                .map(|n| get_node_text(&n, source))
                .unwrap_or_default();
            state.push_function(func, name, FunctionVariant::Declaration);
        }
        JsNode::FunctionExpression(func) => {
            if let Some(decl) = binding_declarator(&func) {
                let name = declarator_name(&decl, source);
                state.push_function(func, name, FunctionVariant::Expression);
            }
        }
        JsNode::ArrowFunction(func) => {
            if let Some(decl) = binding_declarator(&func) {
                let name = declarator_name(&decl, source);
                state.push_function(func, name, FunctionVariant::Arrow);
            }
        }
        JsNode::ClassDeclaration(class) => {
            let name = class
                .child_by_field_name("name")
                .map(|n| get_node_text(&n, source))
                .unwrap_or_default();
            state.push_class(class, name);
        }
        JsNode::ClassExpression(class) => {
            if let Some(decl) = binding_declarator(&class) {
                let name = declarator_name(&decl, source);
                state.push_class(class, name);
            }
        }
        JsNode::VariableDeclarator(decl) => {
            if is_module_scope(&decl) {
                state
                    .set
                    .global_variables
                    .push(CanonicalForm::of(&decl, source).render());
            }
        }
        JsNode::MethodDefinition(_)
        | JsNode::FieldDefinition(_)
        | JsNode::CallExpression(_)
        | JsNode::Other(_) => {}
    });

    tracing::debug!(
        "Built {} functions, {} classes, {} globals for {}",
        state.set.function_ids.len(),
        state.set.class_ids.len(),
        state.set.global_variables.len(),
        file_name
    );
    state.set
}

fn is_module_scope(decl: &Node) -> bool {
    !ancestors(decl).any(|a| is_function_scope(&a) || a.kind() == "class_body")
}

fn class_element(
    id: ElementId,
    class: &Node,
    name: String,
    file_name: &str,
    source: &str,
) -> ClassElement {
    let body = class.child_by_field_name("body");
    let type_parameters = class
        .child_by_field_name("type_parameters")
        .map(|tp| CanonicalForm::of(&tp, source).render())
        .unwrap_or_default();

    let mut methods = Vec::new();
    let mut properties = Vec::new();
    if let Some(body) = body {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match JsNode::classify(member) {
                JsNode::MethodDefinition(m) => {
                    if let Some(method) = method_element(&m, source) {
                        methods.push(method);
                    }
                }
                JsNode::FieldDefinition(f) => {
                    if let Some(property) = property_element(&f, source) {
                        properties.push(property);
                    }
                }
                _ => {}
            }
        }
    }

    ClassElement {
        id,
        name,
        file: file_name.to_string(),
        body: body
            .map(|b| CanonicalForm::of(&b, source))
            .unwrap_or_default(),
        super_class: super_class(class, source),
        type_parameters,
        methods,
        properties,
    }
}

/// The `extends` target, as written
fn super_class(class: &Node, source: &str) -> Option<String> {
    let heritage = child_of_kind(class, "class_heritage")?;
    // TypeScript wraps the target in an extends_clause next to implements_clause
    if let Some(clause) = child_of_kind(&heritage, "extends_clause") {
        let value = clause.child_by_field_name("value")?;
        return Some(get_node_text_normalized(&value, source));
    }
    if child_of_kind(&heritage, "implements_clause").is_some() {
        return None;
    }
    let target = heritage.named_child(0)?;
    Some(get_node_text_normalized(&target, source))
}

fn member_visibility(member: &Node, key: &Node, source: &str) -> Visibility {
    if key.kind() == "private_property_identifier" {
        return Visibility::Private;
    }
    match child_of_kind(member, "accessibility_modifier") {
        Some(modifier) if get_node_text(&modifier, source) == "private" => Visibility::Private,
        _ => Visibility::Public,
    }
}

fn method_element(method: &Node, source: &str) -> Option<MethodElement> {
    let key = method.child_by_field_name("name")?;
    let name = member_name(&key, source);
    let kind = if has_keyword(method, "get") {
        MethodKind::Get
    } else if has_keyword(method, "set") {
        MethodKind::Set
    } else if name == "constructor" {
        MethodKind::Constructor
    } else {
        MethodKind::Method
    };

    Some(MethodElement {
        visibility: member_visibility(method, &key, source),
        is_static: has_keyword(method, "static"),
        kind,
        is_async: is_async(method),
        body: function_body(method)
            .map(|b| CanonicalForm::of(&b, source))
            .unwrap_or_default(),
        params: parameter_names(method, source),
        name,
    })
}

fn property_element(field: &Node, source: &str) -> Option<PropertyElement> {
    // JavaScript grammar uses `property`, TypeScript uses `name`
    let key = field
        .child_by_field_name("property")
        .or_else(|| field.child_by_field_name("name"))?;

    let declared_type = field
        .child_by_field_name("type")
        .map(|t| {
            get_node_text_normalized(&t, source)
                .trim_start_matches(':')
                .trim()
                .to_string()
        })
        .unwrap_or_default();

    Some(PropertyElement {
        name: member_name(&key, source),
        initializer: field
            .child_by_field_name("value")
            .map(|v| CanonicalForm::of(&v, source).render()),
        visibility: member_visibility(field, &key, source),
        is_static: has_keyword(field, "static"),
        declared_type,
    })
}

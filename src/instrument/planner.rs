//! Per-file instrumentation planning.
//!
//! A [`FilePlan`] records where trace statements and test-callback fixes go,
//! as offsets into the untouched source. Ids are not known yet: they are
//! handed out in a separate sequential step, after which [`FilePlan::render`]
//! turns the plan into text.

use tree_sitter::Node;

use super::edits::{EditPlan, Span};
use crate::changes::is_test_file;
use crate::elements::FunctionDescriptor;
use crate::error::{Result, RtsError};
use crate::parsing::ParsedFile;
use crate::registry::FunctionId;
use crate::syntax::common::unquote;
use crate::syntax::{
    binding_declarator, declarator_name, enclosing_class_name, function_body, get_node_text,
    member_name, parameter_names, visit_all, JsNode,
};

/// Identifier the runtime module is bound to in instrumented files
pub const RUNTIME_BINDING: &str = "__rtsTrace";
const EXPECT_BINDING: &str = "__rtsExpect";
const AFTER_ALL_BINDING: &str = "__rtsAfterAll";

/// Everything rendering needs besides the plan itself
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Module specifier of the trace runtime
    pub runtime_module: String,
    /// Module exporting `expect` and `afterAll`
    pub hooks_module: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Source,
    Test,
}

/// Body of an instrumented function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    /// Statement block; the offset is just past its `{`
    Block { open: usize },
    /// Arrow function expression body, to be wrapped in a block with `return`
    Expression { span: Span },
}

#[derive(Debug, Clone)]
pub struct PlannedFunction {
    pub descriptor: FunctionDescriptor,
    pub body: BodyShape,
}

/// How a test callback argument gets normalized into a function literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackFix {
    /// `() => expr` becomes `() => { expr; }`
    Blockify { body: Span },
    /// `it('x', run())` becomes `it('x', async () => { run(); })`
    WrapCall { arg: Span },
    /// `it('x', run)` becomes `it('x', async () => { run(); })`
    WrapReference { arg: Span },
}

#[derive(Debug, Clone)]
pub struct FilePlan {
    pub file: String,
    pub source: String,
    pub kind: FileKind,
    pub commonjs: bool,
    /// Where the import header goes, and what separates it from a prologue
    pub header_at: usize,
    pub header_prefix: &'static str,
    pub functions: Vec<PlannedFunction>,
    pub callback_fixes: Vec<CallbackFix>,
    /// `it`/`test` calls found in a test file
    pub test_calls: Vec<TestCall>,
}

/// An `it(...)`/`test(...)` call in a test file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCall {
    /// Title argument, unquoted
    pub title: String,
    /// The title is a plain string, so the recorded test name is known
    /// without running the file
    pub static_title: bool,
    /// Offset just past the callee, where `.skip` would go
    pub callee_end: usize,
}

impl FilePlan {
    /// Plan a parsed file. Test files get callback normalization and a
    /// teardown hook; every other file gets a trace statement per function.
    pub fn build(parsed: &ParsedFile) -> Self {
        let source = parsed.source.as_str();
        let root = parsed.root();
        let kind = if is_test_file(&parsed.name) {
            FileKind::Test
        } else {
            FileKind::Source
        };
        let (header_at, header_prefix) = header_position(&root);

        let mut plan = FilePlan {
            file: parsed.name.clone(),
            source: parsed.source.clone(),
            kind,
            commonjs: parsed.name.ends_with(".cjs"),
            header_at,
            header_prefix,
            functions: Vec::new(),
            callback_fixes: Vec::new(),
            test_calls: Vec::new(),
        };

        match kind {
            FileKind::Source => plan.collect_functions(&root, source),
            FileKind::Test => plan.collect_tests(&root, source),
        }
        plan
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Titles of the tests declared in this file, in document order
    pub fn test_names(&self) -> impl Iterator<Item = &str> {
        self.test_calls.iter().map(|call| call.title.as_str())
    }

    fn collect_functions(&mut self, root: &Node, source: &str) {
        let file = self.file.clone();
        visit_all(root, |node| {
            let planned = match JsNode::classify(*node) {
                JsNode::FunctionDeclaration(func) => func
                    .child_by_field_name("name")
                    .map(|n| (func, get_node_text(&n, source), None)),
                JsNode::FunctionExpression(func) | JsNode::ArrowFunction(func) => {
                    binding_declarator(&func).map(|decl| (func, declarator_name(&decl, source), None))
                }
                JsNode::MethodDefinition(method) => {
                    let in_class = method
                        .parent()
                        .map(|p| p.kind() == "class_body")
                        .unwrap_or(false);
                    match (in_class, method.child_by_field_name("name")) {
                        (true, Some(key)) => Some((
                            method,
                            member_name(&key, source),
                            Some(enclosing_class_name(&method, source).unwrap_or_default()),
                        )),
                        _ => None,
                    }
                }
                _ => None,
            };

            let Some((func, name, class)) = planned else {
                return;
            };
            let Some(body) = function_body(&func) else {
                return;
            };
            let params = parameter_names(&func, source).len();
            let descriptor = match class {
                Some(class) => FunctionDescriptor::method(&name, &file, params, &class),
                None => FunctionDescriptor::function(&name, &file, params),
            };
            let body = if body.kind() == "statement_block" {
                BodyShape::Block {
                    open: body.start_byte() + 1,
                }
            } else {
                BodyShape::Expression {
                    span: Span::new(body.start_byte(), body.end_byte()),
                }
            };
            self.functions.push(PlannedFunction { descriptor, body });
        });
    }

    fn collect_tests(&mut self, root: &Node, source: &str) {
        visit_all(root, |node| {
            let JsNode::CallExpression(call) = JsNode::classify(*node) else {
                return;
            };
            let Some(callee) = call.child_by_field_name("function") else {
                return;
            };
            let is_test_call = callee.kind() == "identifier"
                && matches!(get_node_text(&callee, source).as_str(), "it" | "test");
            if !is_test_call {
                return;
            }
            let Some(args) = call.child_by_field_name("arguments") else {
                return;
            };

            let mut cursor = args.walk();
            let mut positional = args
                .named_children(&mut cursor)
                .filter(|a| a.kind() != "comment");
            if let Some(title) = positional.next() {
                self.test_calls.push(TestCall {
                    title: test_title(&title, source),
                    static_title: is_static_title(&title),
                    callee_end: callee.end_byte(),
                });
            }
            if let Some(callback) = positional.next() {
                if let Some(fix) = callback_fix(&callback) {
                    self.callback_fixes.push(fix);
                }
            }
        });
    }

    /// Render the instrumented source, numbering functions from `first_id`.
    pub fn render(&self, first_id: FunctionId, options: &RenderOptions) -> Result<String> {
        let mut edits = EditPlan::new();
        let header = self.header(options);
        edits.insert(self.header_at, format!("{}{}", self.header_prefix, header));

        for (offset, function) in self.functions.iter().enumerate() {
            let trace = trace_statement(first_id + offset as FunctionId);
            match function.body {
                BodyShape::Block { open } => edits.insert(open, trace),
                BodyShape::Expression { span } => {
                    edits.insert(span.start, format!("{{{} return ", trace));
                    edits.insert(span.end, ";}");
                }
            }
        }

        for fix in &self.callback_fixes {
            match *fix {
                CallbackFix::Blockify { body } => {
                    edits.insert(body.start, "{ ");
                    edits.insert(body.end, "; }");
                }
                CallbackFix::WrapCall { arg } => edits.replace(
                    arg,
                    format!("async () => {{ {}; }}", &self.source[arg.start..arg.end]),
                ),
                CallbackFix::WrapReference { arg } => edits.replace(
                    arg,
                    format!("async () => {{ {}(); }}", &self.source[arg.start..arg.end]),
                ),
            }
        }

        if self.kind == FileKind::Test {
            edits.insert(
                self.source.len(),
                format!(
                    "\n{}(async () => {{ await {}.endLogger(); }});\n",
                    AFTER_ALL_BINDING, RUNTIME_BINDING
                ),
            );
        }

        edits.apply(&self.source).map_err(|e| match e {
            RtsError::InstrumentationFailure { message, .. } => RtsError::InstrumentationFailure {
                path: self.file.clone(),
                message,
            },
            other => other,
        })
    }

    /// Single-line import header, so original line numbers are preserved
    fn header(&self, options: &RenderOptions) -> String {
        let hook = match self.kind {
            FileKind::Source => format!("expect as {}", EXPECT_BINDING),
            FileKind::Test => format!("afterAll as {}", AFTER_ALL_BINDING),
        };
        if self.commonjs {
            let hook = hook.replace(" as ", ": ");
            format!(
                "const {} = require('{}'); const {{ {} }} = require('{}'); ",
                RUNTIME_BINDING, options.runtime_module, hook, options.hooks_module
            )
        } else {
            format!(
                "import {} from '{}'; import {{ {} }} from '{}'; ",
                RUNTIME_BINDING, options.runtime_module, hook, options.hooks_module
            )
        }
    }
}

/// Statement prepended to every instrumented function body
pub fn trace_statement(id: FunctionId) -> String {
    format!(
        "{rt}.send(`{{\"function\":{id},\"test\":\"${{{rt}.testName({ex}.getState())}}\"}},`);",
        rt = RUNTIME_BINDING,
        id = id,
        ex = EXPECT_BINDING
    )
}

/// Insert point for the header: after a hashbang line and any directive
/// prologue (`"use strict";`), which must stay first.
fn header_position(root: &Node) -> (usize, &'static str) {
    let mut at = (0, "");
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            // A hashbang ends the line, so the header needs its own
            "hash_bang_line" => at = (child.end_byte(), "\n"),
            "expression_statement"
                if child
                    .named_child(0)
                    .map(|e| e.kind() == "string")
                    .unwrap_or(false) =>
            {
                at = (child.end_byte(), " ")
            }
            "comment" => continue,
            _ => break,
        }
    }
    at
}

fn test_title(title: &Node, source: &str) -> String {
    let text = get_node_text(title, source);
    match title.kind() {
        "string" | "template_string" => unquote(&text).to_string(),
        _ => text,
    }
}

/// String literals and templates without substitutions
fn is_static_title(title: &Node) -> bool {
    match title.kind() {
        "string" => true,
        "template_string" => {
            let mut cursor = title.walk();
            let dynamic = title
                .named_children(&mut cursor)
                .any(|c| c.kind() == "template_substitution");
            !dynamic
        }
        _ => false,
    }
}

fn callback_fix(callback: &Node) -> Option<CallbackFix> {
    match JsNode::classify(*callback) {
        JsNode::ArrowFunction(func) | JsNode::FunctionExpression(func) => {
            let body = function_body(&func)?;
            (body.kind() != "statement_block").then(|| CallbackFix::Blockify {
                body: Span::new(body.start_byte(), body.end_byte()),
            })
        }
        JsNode::CallExpression(call) => Some(CallbackFix::WrapCall {
            arg: Span::new(call.start_byte(), call.end_byte()),
        }),
        other => {
            let node = other.node();
            Some(CallbackFix::WrapReference {
                arg: Span::new(node.start_byte(), node.end_byte()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse_named;

    fn options() -> RenderOptions {
        RenderOptions {
            runtime_module: "rts-trace".to_string(),
            hooks_module: "vitest".to_string(),
        }
    }

    fn plan(name: &str, src: &str) -> FilePlan {
        FilePlan::build(&parse_named(name, src).unwrap())
    }

    #[test]
    fn test_plans_functions_in_document_order() {
        let p = plan(
            "src/shapes.ts",
            r#"
            export function area(r: number) { return r * r; }
            const double = (x) => x * 2;
            const anon = function (a, b) { return a; };
            class Circle {
                radius() { return 1; }
                #secret(k) {}
            }
            items.forEach((i) => i);
            "#,
        );
        let descriptors: Vec<_> = p.functions.iter().map(|f| f.descriptor.clone()).collect();
        assert_eq!(
            descriptors,
            vec![
                FunctionDescriptor::function("area", "src/shapes.ts", 1),
                FunctionDescriptor::function("double", "src/shapes.ts", 1),
                FunctionDescriptor::function("anon", "src/shapes.ts", 2),
                FunctionDescriptor::method("radius", "src/shapes.ts", 0, "Circle"),
                FunctionDescriptor::method("secret", "src/shapes.ts", 1, "Circle"),
            ]
        );
        assert!(matches!(p.functions[1].body, BodyShape::Expression { .. }));
    }

    #[test]
    fn test_object_literal_methods_are_not_planned() {
        let p = plan("src/api.js", "const api = { get() { return 1; } };");
        assert!(p.functions.is_empty());
    }

    #[test]
    fn test_render_source_file() {
        let p = plan("src/math.js", "function add(a, b) { return a + b; }\nconst inc = (n) => n + 1;\n");
        let out = p.render(7, &options()).unwrap();
        let mut lines = out.lines();
        let first = lines.next().unwrap();
        assert!(first.starts_with("import __rtsTrace from 'rts-trace'; import { expect as __rtsExpect } from 'vitest'; function add(a, b) {__rtsTrace.send("));
        assert!(first.contains(r#"{"function":7,"test":"${__rtsTrace.testName(__rtsExpect.getState())}"},"#));
        let second = lines.next().unwrap();
        assert!(second.starts_with("const inc = (n) => {__rtsTrace.send(`{\"function\":8,"));
        assert!(second.ends_with("return n + 1;};"));
        // Line numbers are preserved
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn test_render_keeps_directive_prologue_first() {
        let p = plan("src/legacy.cjs", "'use strict';\nfunction f() {}\n");
        let out = p.render(0, &options()).unwrap();
        assert!(out.starts_with("'use strict'; const __rtsTrace = require('rts-trace'); const { expect: __rtsExpect } = require('vitest'); \n"));
    }

    #[test]
    fn test_test_file_normalization() {
        let p = plan(
            "src/math.test.ts",
            r#"describe('math', () => {
  it('adds', () => expect(add(1, 2)).toBe(3));
  test("runs helper", helper);
  it(`calls`, makeTest());
  it('blocks', async () => { await run(); });
});
"#,
        );
        assert!(p.functions.is_empty());
        assert_eq!(
            p.test_names().collect::<Vec<_>>(),
            vec!["adds", "runs helper", "calls", "blocks"]
        );
        assert_eq!(p.test_calls[0].callee_end, "describe('math', () => {\n  it".len());
        assert!(p.test_calls.iter().all(|call| call.static_title));

        let out = p.render(0, &options()).unwrap();
        assert!(out.starts_with("import __rtsTrace from 'rts-trace'; import { afterAll as __rtsAfterAll } from 'vitest'; "));
        assert!(out.contains("it('adds', () => { expect(add(1, 2)).toBe(3); });"));
        assert!(out.contains("test(\"runs helper\", async () => { helper(); });"));
        assert!(out.contains("it(`calls`, async () => { makeTest(); });"));
        assert!(out.contains("it('blocks', async () => { await run(); });"));
        assert!(out.ends_with("__rtsAfterAll(async () => { await __rtsTrace.endLogger(); });\n"));
    }

    #[test]
    fn test_computed_titles_are_not_static() {
        let p = plan(
            "src/table.test.js",
            r#"const NAME = 'adds';
it(NAME, () => {});
it(`case ${1}`, () => {});
it(`plain`, () => {});
it('lit' + 'eral', () => {});
"#,
        );
        assert_eq!(
            p.test_calls.iter().map(|c| c.static_title).collect::<Vec<_>>(),
            vec![false, false, true, false]
        );
    }

    #[test]
    fn test_trace_statement_shape() {
        assert_eq!(
            trace_statement(12),
            "__rtsTrace.send(`{\"function\":12,\"test\":\"${__rtsTrace.testName(__rtsExpect.getState())}\"},`);"
        );
    }
}

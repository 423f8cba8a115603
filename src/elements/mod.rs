//! Code element model: the per-file structural summary that change analysis diffs.
//!
//! A [`CodeElementSet`] is built fresh for one file on one side of a revision
//! pair (see [`builder::build_code_elements`]) and thrown away after diffing.
//! Element ids are only meaningful inside the set that assigned them.

pub mod builder;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::syntax::{is_plain_parameter, CanonicalForm};

pub use builder::build_code_elements;

/// Sequential id, scoped to one file-build pass
pub type ElementId = usize;

/// Identity of a function or method across revisions and across the
/// static/dynamic boundary.
///
/// This is both the change-analysis output record and the value type of the
/// function registry, so resolution is plain structural equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub function: String,
    pub file: String,
    pub params: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

impl FunctionDescriptor {
    pub fn function(name: &str, file: &str, params: usize) -> Self {
        Self {
            function: name.to_string(),
            file: file.to_string(),
            params,
            class: None,
        }
    }

    pub fn method(name: &str, file: &str, params: usize, class: &str) -> Self {
        Self {
            function: name.to_string(),
            file: file.to_string(),
            params,
            class: Some(class.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionVariant {
    Declaration,
    Expression,
    Arrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    /// True when going from `self` to `after` hides a previously public member
    pub fn narrows_to(self, after: Visibility) -> bool {
        self == Visibility::Public && after == Visibility::Private
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Method,
    Get,
    Set,
    Constructor,
}

/// The whole file
#[derive(Debug, Clone)]
pub struct FileElement {
    pub id: ElementId,
    pub name: String,
    pub body: CanonicalForm,
}

/// A function declaration, or a function/arrow expression bound to a variable
#[derive(Debug, Clone)]
pub struct FunctionElement {
    pub id: ElementId,
    pub name: String,
    pub file: String,
    pub body: CanonicalForm,
    pub is_async: bool,
    pub params: Vec<String>,
    pub variant: FunctionVariant,
}

impl FunctionElement {
    pub fn descriptor(&self) -> FunctionDescriptor {
        FunctionDescriptor::function(&self.name, &self.file, self.params.len())
    }

    /// Cross-revision identity within one file
    pub fn matches(&self, other: &FunctionElement) -> bool {
        self.name == other.name && self.params.len() == other.params.len()
    }

    /// Whether `after` (the same function in the next revision) behaves differently.
    pub fn is_semantically_changed(&self, after: &FunctionElement) -> bool {
        if self.is_async != after.is_async {
            return true;
        }
        !bodies_equivalent(&self.body, &self.params, &after.body, &after.params)
    }
}

#[derive(Debug, Clone)]
pub struct MethodElement {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub kind: MethodKind,
    pub is_async: bool,
    pub body: CanonicalForm,
    pub params: Vec<String>,
}

impl MethodElement {
    pub fn matches(&self, other: &MethodElement) -> bool {
        self.name == other.name && self.params.len() == other.params.len()
    }

    pub fn is_semantically_changed(&self, after: &MethodElement) -> bool {
        if self.visibility.narrows_to(after.visibility)
            || self.kind != after.kind
            || self.is_static != after.is_static
            || self.is_async != after.is_async
        {
            return true;
        }
        !bodies_equivalent(&self.body, &self.params, &after.body, &after.params)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyElement {
    pub name: String,
    /// Canonical form of the initializer, if any
    pub initializer: Option<String>,
    pub visibility: Visibility,
    pub is_static: bool,
    /// Declared type annotation without the leading `:`; empty if untyped
    pub declared_type: String,
}

impl PropertyElement {
    /// An unchanged property: same name, initializer, staticness and type, and
    /// not narrowed from public to private.
    pub fn is_equivalent_to(&self, after: &PropertyElement) -> bool {
        self.name == after.name
            && self.initializer == after.initializer
            && self.is_static == after.is_static
            && self.declared_type == after.declared_type
            && !self.visibility.narrows_to(after.visibility)
    }
}

/// A class declaration or a class expression bound to a variable
#[derive(Debug, Clone)]
pub struct ClassElement {
    pub id: ElementId,
    pub name: String,
    pub file: String,
    /// Canonical form of the whole class body
    pub body: CanonicalForm,
    pub super_class: Option<String>,
    pub type_parameters: String,
    pub methods: Vec<MethodElement>,
    pub properties: Vec<PropertyElement>,
}

impl ClassElement {
    fn method_descriptor(&self, method: &MethodElement) -> FunctionDescriptor {
        FunctionDescriptor::method(&method.name, &self.file, method.params.len(), &self.name)
    }

    /// Every method of the class, as if all of them changed
    pub fn method_descriptors(&self) -> Vec<FunctionDescriptor> {
        self.methods
            .iter()
            .map(|m| self.method_descriptor(m))
            .collect()
    }

    /// Methods of `self` that were removed, re-signatured, or changed in `after`.
    pub fn semantically_changed_methods(&self, after: &ClassElement) -> Vec<FunctionDescriptor> {
        if self.body == after.body {
            return Vec::new();
        }

        let mut changed = Vec::new();
        for before in &self.methods {
            match after.methods.iter().find(|m| before.matches(m)) {
                Some(counterpart) if !before.is_semantically_changed(counterpart) => {}
                _ => changed.push(self.method_descriptor(before)),
            }
        }
        changed
    }

    /// Whether method-level tracking can no longer bound the impact of this
    /// class's change, so every dependent of the file must be retested.
    pub fn should_fallback_to_file_dependency(&self, after: &ClassElement) -> bool {
        if self.super_class.is_some() && after.super_class.is_none() {
            return true;
        }
        if self.type_parameters != after.type_parameters {
            return true;
        }
        if self.body == after.body {
            return false;
        }
        let lost = self.properties.iter().any(|before| {
            !after
                .properties
                .iter()
                .any(|candidate| before.is_equivalent_to(candidate))
        });
        // New instance state can alter any method that reads `this`
        let gained = after
            .properties
            .iter()
            .any(|added| !self.properties.iter().any(|p| p.name == added.name));
        lost || gained
    }
}

/// Any modeled element
#[derive(Debug, Clone)]
pub enum CodeElement {
    File(FileElement),
    Function(FunctionElement),
    Class(ClassElement),
}

impl CodeElement {
    pub fn id(&self) -> ElementId {
        match self {
            Self::File(e) => e.id,
            Self::Function(e) => e.id,
            Self::Class(e) => e.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::File(e) => &e.name,
            Self::Function(e) => &e.name,
            Self::Class(e) => &e.name,
        }
    }

    pub fn body(&self) -> &CanonicalForm {
        match self {
            Self::File(e) => &e.body,
            Self::Function(e) => &e.body,
            Self::Class(e) => &e.body,
        }
    }
}

/// All elements of one file on one side of a revision pair
#[derive(Debug, Clone, Default)]
pub struct CodeElementSet {
    pub file_name: String,
    pub file_id: ElementId,
    pub function_ids: Vec<ElementId>,
    pub class_ids: Vec<ElementId>,
    pub elements: BTreeMap<ElementId, CodeElement>,
    /// Canonical forms of module-scope variable declarators
    pub global_variables: Vec<String>,
}

impl CodeElementSet {
    pub fn get(&self, id: ElementId) -> Option<&CodeElement> {
        self.elements.get(&id)
    }

    pub fn file(&self) -> Option<&FileElement> {
        match self.elements.get(&self.file_id) {
            Some(CodeElement::File(file)) => Some(file),
            _ => None,
        }
    }

    /// Functions in visitation order
    pub fn functions(&self) -> impl Iterator<Item = &FunctionElement> {
        self.function_ids
            .iter()
            .filter_map(|id| match self.elements.get(id) {
                Some(CodeElement::Function(f)) => Some(f),
                _ => None,
            })
    }

    /// Classes in visitation order
    pub fn classes(&self) -> impl Iterator<Item = &ClassElement> {
        self.class_ids
            .iter()
            .filter_map(|id| match self.elements.get(id) {
                Some(CodeElement::Class(c)) => Some(c),
                _ => None,
            })
    }

    /// Every function and method, as if all of them changed
    pub fn all_descriptors(&self) -> Vec<FunctionDescriptor> {
        let mut descriptors: Vec<FunctionDescriptor> =
            self.classes().flat_map(|c| c.method_descriptors()).collect();
        descriptors.extend(self.functions().map(|f| f.descriptor()));
        descriptors
    }

    /// Whether any class in the file declares at least one property
    pub fn has_class_properties(&self) -> bool {
        self.classes().any(|c| !c.properties.is_empty())
    }
}

/// Body equality with parameter-rename tolerance.
///
/// Bodies that are identical are equivalent. Otherwise the after-parameters
/// are re-bound positionally to the before-parameter names throughout the
/// after body; the bodies are equivalent if that makes them identical. A
/// position whose parameter is a pattern rather than a plain name cannot be
/// re-bound, and neither can a rename that would capture an unrelated
/// identifier.
pub fn bodies_equivalent(
    before_body: &CanonicalForm,
    before_params: &[String],
    after_body: &CanonicalForm,
    after_params: &[String],
) -> bool {
    if before_body == after_body {
        return true;
    }
    if before_params == after_params || before_params.len() != after_params.len() {
        return false;
    }

    let mut renames: HashMap<&str, &str> = HashMap::new();
    for (before, after) in before_params.iter().zip(after_params) {
        if before == after {
            if is_plain_parameter(after) {
                renames.insert(after.as_str(), before.as_str());
            }
            continue;
        }
        if !is_plain_parameter(before) || !is_plain_parameter(after) {
            return false;
        }
        renames.insert(after.as_str(), before.as_str());
    }

    after_body
        .rebind(&renames)
        .map(|rebound| &rebound == before_body)
        .unwrap_or(false)
}

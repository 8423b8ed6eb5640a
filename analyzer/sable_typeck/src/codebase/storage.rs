//! Declared signatures of functions, methods, classes and their members

use indexmap::IndexMap;
use sable_ast::decl::Visibility;
use sable_utils::span::Span;

use crate::{
    typeck::Assertion,
    types::{template::TemplateType, Union},
};

/// One declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParam {
    /// The name without the leading `$`
    pub name: String,
    /// The effective declared type: the docblock type when trusted, else the
    /// signature type
    pub ty: Option<Union>,
    /// The type written in the signature
    pub signature_type: Option<Union>,
    /// Whether a default value exists, making the parameter optional
    pub has_default: bool,
    /// Whether the argument is passed by reference
    pub by_ref: bool,
    /// Whether this collects the remaining arguments
    pub variadic: bool,
    /// Where the parameter is declared
    pub span: Span,
}

/// A `@psalm-assert`-style assertion stored on a function, applied to the
/// argument at `param_index` after a call
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAssertion {
    /// Index of the parameter the assertion is about
    pub param_index: usize,
    /// The assertion in conjunctive normal form: every inner list is a
    /// disjunction
    pub rule: Vec<Vec<Assertion>>,
}

/// The signature of a function, method or closure
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLikeStorage {
    /// The name as declared
    pub name: String,
    /// The parameters, in order
    pub params: Vec<FunctionParam>,
    /// The effective declared return type
    pub return_type: Option<Union>,
    /// The return type written in the signature
    pub signature_return_type: Option<Union>,
    /// Where the return type is declared
    pub return_type_span: Option<Span>,
    /// `@template` parameters of the function itself
    pub template_types: Vec<TemplateType>,
    /// Assertions holding after any call returns
    pub assertions: Vec<StoredAssertion>,
    /// Assertions holding when a call returns a truthy value
    pub if_true_assertions: Vec<StoredAssertion>,
    /// Assertions holding when a call returns a falsy value
    pub if_false_assertions: Vec<StoredAssertion>,
    /// Issue names listed in `@psalm-suppress`
    pub suppressed_issues: Vec<String>,
    /// Method visibility; public for functions
    pub visibility: Visibility,
    /// Whether this is a static method
    pub is_static: bool,
    /// Whether this is an abstract method
    pub is_abstract: bool,
    /// Whether this is a final method
    pub is_final: bool,
    /// The class declaring a method, as declared
    pub defining_class: Option<String>,
    /// Where the function is declared
    pub span: Span,
}
impl FunctionLikeStorage {
    /// An empty public signature named `name`
    #[must_use]
    pub fn new(name: &str, span: Span) -> Self {
        Self {
            name: name.to_string(),
            params: vec![],
            return_type: None,
            signature_return_type: None,
            return_type_span: None,
            template_types: vec![],
            assertions: vec![],
            if_true_assertions: vec![],
            if_false_assertions: vec![],
            suppressed_issues: vec![],
            visibility: Visibility::Public,
            is_static: false,
            is_abstract: false,
            is_final: false,
            defining_class: None,
            span,
        }
    }

    /// The number of arguments that must be passed
    #[must_use]
    pub fn required_param_count(&self) -> usize {
        self.params
            .iter()
            .filter(|param| !param.has_default && !param.variadic)
            .count()
    }

    /// Whether the last parameter is variadic
    #[must_use]
    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|param| param.variadic)
    }

    /// The name used in diagnostics: `Class::method` or `function`
    #[must_use]
    pub fn display_name(&self) -> String {
        self.defining_class.as_ref().map_or_else(
            || self.name.clone(),
            |class| format!("{class}::{}", self.name),
        )
    }

    /// Whether `@psalm-suppress` lists this issue name
    #[must_use]
    pub fn suppresses(&self, issue_name: &str) -> bool {
        self.suppressed_issues
            .iter()
            .any(|suppressed| suppressed == issue_name || suppressed == "all")
    }
}

/// A declared property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyStorage {
    /// The name without the leading `$`
    pub name: String,
    /// The effective declared type, if any
    pub ty: Option<Union>,
    /// The declared visibility
    pub visibility: Visibility,
    /// Whether the property is static
    pub is_static: bool,
    /// Whether a default value is given
    pub has_default: bool,
    /// The class declaring it, as declared
    pub declaring_class: String,
}

/// A declared class constant
#[derive(Debug, Clone, PartialEq)]
pub struct ClassConstantStorage {
    /// The constant name
    pub name: String,
    /// The type of its value
    pub ty: Union,
    /// The declared visibility
    pub visibility: Visibility,
    /// The class declaring it, as declared
    pub declaring_class: String,
}

/// A declared class or interface
#[derive(Debug, Clone, PartialEq)]
pub struct ClassStorage {
    /// The name as declared
    pub name: String,
    /// Whether this is an interface
    pub is_interface: bool,
    /// Whether this class is abstract
    pub is_abstract: bool,
    /// Whether this class is final
    pub is_final: bool,
    /// The parent class, as written
    pub parent: Option<String>,
    /// Directly implemented (or, for interfaces, extended) interfaces
    pub interfaces: Vec<String>,
    /// Declared properties, keyed by name
    pub properties: IndexMap<String, PropertyStorage>,
    /// Declared constants, keyed by name
    pub constants: IndexMap<String, ClassConstantStorage>,
    /// Declared methods, keyed by lowercased name
    pub methods: IndexMap<String, FunctionLikeStorage>,
    /// `@template` parameters
    pub template_types: Vec<TemplateType>,
    /// `@template-extends`/`@template-implements` arguments, keyed by the
    /// lowercased parent name
    pub template_extends: IndexMap<String, Vec<Union>>,
    /// Whether undeclared properties are an error even with `__get`
    pub sealed_properties: bool,
    /// Where the class is declared
    pub span: Span,
}
impl ClassStorage {
    /// An empty class named `name`
    #[must_use]
    pub fn new(name: &str, span: Span) -> Self {
        Self {
            name: name.to_string(),
            is_interface: false,
            is_abstract: false,
            is_final: false,
            parent: None,
            interfaces: vec![],
            properties: IndexMap::new(),
            constants: IndexMap::new(),
            methods: IndexMap::new(),
            template_types: vec![],
            template_extends: IndexMap::new(),
            sealed_properties: false,
            span,
        }
    }
}

//! Populate a [`Codebase`] from declarations in the AST
//!
//! Signature types are read from the declarations; docblock tags add
//! templates, more precise types, assertions and suppressions. A docblock
//! type that fails to parse is reported as `InvalidDocblock` and the
//! signature type is used instead.

use sable_ast::{
    decl::{ClassDecl, ClassKind, ClassMember, Docblock, FunctionDecl, Visibility},
    expr::{Callee, ClassRef, Expr, ExprKind},
    stmt::{Stmt, StmtKind},
    File,
};
use sable_diagnostics::{IssueKind, IssueSink};
use sable_utils::{
    names::{normalize_name, strip_leading_separator},
    span::Span,
};
use tracing::debug_span;

use super::{
    ClassConstantStorage, ClassStorage, Codebase, FunctionLikeStorage, FunctionParam,
    PropertyStorage, StoredAssertion,
};
use crate::{
    config::AnalysisConfig,
    typeck::Assertion,
    types::{parse_type, parser::split_docblock_type, Atomic, ShapeKey, TemplateType, Union},
};

/// Tags declaring template parameters
const TEMPLATE_TAGS: &[&str] = &[
    "template",
    "psalm-template",
    "phpstan-template",
    "template-covariant",
    "psalm-template-covariant",
];

/// Tags giving template arguments to a parent class or interface
const TEMPLATE_EXTENDS_TAGS: &[&str] = &[
    "extends",
    "template-extends",
    "psalm-extends",
    "implements",
    "template-implements",
    "psalm-implements",
];

/// Register every function, class and constant declared in `file`
pub fn scan_file(
    file: &File,
    codebase: &mut Codebase,
    config: &AnalysisConfig,
    sink: &mut dyn IssueSink,
) {
    let _span = debug_span!("scan_file", path = %file.path).entered();
    scan_stmts(&file.stmts, &file.path, codebase, config, sink);
}

/// Register every function, class and constant declared in `stmts`,
/// including conditional and nested declarations
pub fn scan_stmts(
    stmts: &[Stmt],
    file_path: &str,
    codebase: &mut Codebase,
    config: &AnalysisConfig,
    sink: &mut dyn IssueSink,
) {
    let mut scanner = Scanner {
        codebase,
        config,
        file_path,
        sink,
    };
    scanner.scan_block(stmts);
}

/// The class a method is scanned in
struct ClassScope<'c> {
    /// The class name, as declared
    name: &'c str,
    /// The class's template parameters
    templates: &'c [TemplateType],
}

/// State for one scan
struct Scanner<'a> {
    /// Where declarations go
    codebase: &'a mut Codebase,
    /// Whether docblock types win
    config: &'a AnalysisConfig,
    /// The path reported with docblock issues
    file_path: &'a str,
    /// Receives docblock issues
    sink: &'a mut dyn IssueSink,
}

impl Scanner<'_> {
    /// Report a docblock problem. Scanning never stops early.
    fn report_docblock(&mut self, message: String, span: Span) {
        self.sink
            .report(IssueKind::InvalidDocblock(message).at(span), self.file_path);
    }

    /// Parse a type, reporting a failure as an invalid docblock
    fn parse_or_report(
        &mut self,
        input: &str,
        span: Span,
        templates: &[TemplateType],
        origin: &str,
    ) -> Option<Union> {
        match parse_type(input, templates) {
            Ok(ty) => Some(ty),
            Err(error) => {
                self.report_docblock(format!("{origin} `{input}`: {error}"), span);
                None
            }
        }
    }

    /// Scan a statement list
    fn scan_block(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.scan_stmt(stmt);
        }
    }

    /// Scan one statement and any statements nested in it
    fn scan_stmt(&mut self, stmt: &Stmt) {
        match stmt.kind() {
            StmtKind::Function(decl) => {
                let storage = self.function_storage(decl, None);
                self.codebase.add_function(storage);
                if let Some(body) = &decl.body {
                    self.scan_block(body);
                }
            }
            StmtKind::Class(decl) => self.scan_class(decl),
            StmtKind::Const(constants) => {
                for (name, value) in constants {
                    self.codebase
                        .add_constant(name.value(), constant_type(value, None));
                }
            }
            StmtKind::Expr(expr) => self.scan_define(expr),
            StmtKind::If {
                then,
                elseifs,
                else_,
                ..
            } => {
                self.scan_block(then);
                for elseif in elseifs {
                    self.scan_block(&elseif.body);
                }
                if let Some(else_) = else_ {
                    self.scan_block(else_);
                }
            }
            StmtKind::Block(body)
            | StmtKind::While(_, body)
            | StmtKind::DoWhile(body, _)
            | StmtKind::For { body, .. }
            | StmtKind::Foreach { body, .. } => self.scan_block(body),
            StmtKind::TryCatch {
                body,
                catches,
                finally,
            } => {
                self.scan_block(body);
                for catch in catches {
                    self.scan_block(&catch.body);
                }
                if let Some(finally) = finally {
                    self.scan_block(finally);
                }
            }
            StmtKind::Switch(_, cases) => {
                for case in cases {
                    self.scan_block(&case.body);
                }
            }
            _ => {}
        }
    }

    /// `define('NAME', value);`
    fn scan_define(&mut self, expr: &Expr) {
        let ExprKind::FuncCall(Callee::Named(name), args) = expr.kind() else {
            return;
        };
        if !strip_leading_separator(name.value()).eq_ignore_ascii_case("define") {
            return;
        }
        if let [name, value, ..] = args.as_slice() {
            if let ExprKind::String(name) = name.value.kind() {
                self.codebase
                    .add_constant(name, constant_type(&value.value, None));
            }
        }
    }

    /// Template parameters declared in a docblock
    fn scan_templates(
        &mut self,
        docblock: &Docblock,
        defining_entity: &str,
        outer: &[TemplateType],
    ) -> Vec<TemplateType> {
        let mut templates: Vec<TemplateType> = vec![];
        for tag in docblock.tags_named(TEMPLATE_TAGS) {
            let mut parts = tag.value().value.split_whitespace();
            let Some(name) = parts.next() else {
                self.report_docblock("@template needs a name".to_string(), tag.span());
                continue;
            };
            let as_type = match parts.next() {
                Some("of" | "as") => {
                    let bound = parts.collect::<Vec<_>>().join(" ");
                    let in_scope = outer.iter().chain(&templates).cloned().collect::<Vec<_>>();
                    self.parse_or_report(&bound, tag.span(), &in_scope, "@template bound")
                        .unwrap_or_else(Union::mixed)
                }
                _ => Union::mixed(),
            };
            templates.push(TemplateType {
                name: name.to_string(),
                defining_entity: defining_entity.to_string(),
                as_type,
            });
        }
        templates
    }

    /// The `Type` of a `@tag Type $name` docblock entry, with the name
    fn named_tag_types(
        &mut self,
        docblock: &Docblock,
        names: &[&str],
        templates: &[TemplateType],
    ) -> Vec<(String, Union)> {
        let mut types = vec![];
        for tag in docblock.tags_named(names) {
            let (type_str, rest) = split_docblock_type(&tag.value().value);
            let Some(var_name) = rest
                .split_whitespace()
                .next()
                .map(|name| name.trim_start_matches(['&', '.']))
                .and_then(|name| name.strip_prefix('$'))
            else {
                self.report_docblock(
                    format!("@{} `{}` names no parameter", tag.value().name, tag.value().value),
                    tag.span(),
                );
                continue;
            };
            let origin = format!("@{}", tag.value().name);
            if let Some(ty) = self.parse_or_report(type_str, tag.span(), templates, &origin) {
                types.push((var_name.to_string(), ty));
            }
        }
        types
    }

    /// The type of the first `@tag Type` docblock entry
    fn tag_type(
        &mut self,
        docblock: &Docblock,
        names: &[&str],
        templates: &[TemplateType],
    ) -> Option<(Union, Span)> {
        let tag = docblock.tags_named(names).last()?;
        let (type_str, _) = split_docblock_type(&tag.value().value);
        let origin = format!("@{}", tag.value().name);
        self.parse_or_report(type_str, tag.span(), templates, &origin)
            .map(|ty| (ty, tag.span()))
    }

    /// Build the signature of a function or method
    fn function_storage(&mut self, decl: &FunctionDecl, class: Option<&ClassScope<'_>>) -> FunctionLikeStorage {
        let name = decl.name.value();
        let mut storage = FunctionLikeStorage::new(name, decl.name.span());
        storage.defining_class = class.map(|class| class.name.to_string());

        let defining_entity = class.map_or_else(
            || normalize_name(name),
            |class| format!("{}::{}", normalize_name(class.name), name.to_ascii_lowercase()),
        );
        let outer = class.map_or(&[][..], |class| class.templates);
        storage.template_types = self.scan_templates(&decl.docblock, &defining_entity, outer);
        let templates = outer
            .iter()
            .chain(&storage.template_types)
            .cloned()
            .collect::<Vec<_>>();

        let doc_params = self.named_tag_types(
            &decl.docblock,
            &["param", "psalm-param", "phpstan-param"],
            &templates,
        );
        for param in &decl.params {
            let param_name = param.name.value();
            let has_null_default = param
                .default
                .as_ref()
                .is_some_and(|default| matches!(default.kind(), ExprKind::Null));
            let with_default_null = |ty: Union| {
                if has_null_default && !ty.is_nullable() && !ty.is_mixed() {
                    let mut ty = ty;
                    ty.add(Atomic::Null);
                    ty
                } else {
                    ty
                }
            };
            let signature_type = param.type_hint.as_ref().and_then(|hint| {
                self.parse_or_report(hint.value(), hint.span(), &templates, "parameter type")
            });
            let signature_type = signature_type.map(with_default_null);
            let doc_type = doc_params
                .iter()
                .rev()
                .find(|(name, _)| name == param_name)
                .map(|(_, ty)| with_default_null(ty.clone()));
            let ty = if self.config.use_docblock_types {
                doc_type.or_else(|| signature_type.clone())
            } else {
                signature_type.clone().or(doc_type)
            };
            storage.params.push(FunctionParam {
                name: param_name.clone(),
                ty,
                signature_type,
                has_default: param.default.is_some(),
                by_ref: param.by_ref,
                variadic: param.variadic,
                span: param.name.span(),
            });
        }

        let signature_return = decl.return_type.as_ref().and_then(|hint| {
            self.parse_or_report(hint.value(), hint.span(), &templates, "return type")
                .map(|ty| (ty, hint.span()))
        });
        let doc_return = self.tag_type(
            &decl.docblock,
            &["return", "psalm-return", "phpstan-return"],
            &templates,
        );
        storage.signature_return_type = signature_return.as_ref().map(|(ty, _)| ty.clone());
        let effective = if self.config.use_docblock_types {
            doc_return.or(signature_return)
        } else {
            signature_return.or(doc_return)
        };
        if let Some((ty, span)) = effective {
            storage.return_type = Some(ty);
            storage.return_type_span = Some(span);
        }

        storage.assertions =
            self.stored_assertions(decl, &["psalm-assert", "phpstan-assert"], &templates);
        storage.if_true_assertions = self.stored_assertions(
            decl,
            &["psalm-assert-if-true", "phpstan-assert-if-true"],
            &templates,
        );
        storage.if_false_assertions = self.stored_assertions(
            decl,
            &["psalm-assert-if-false", "phpstan-assert-if-false"],
            &templates,
        );

        storage.suppressed_issues = decl
            .docblock
            .tags_named(&["psalm-suppress"])
            .flat_map(|tag| {
                tag.value()
                    .value
                    .split(|c: char| c.is_whitespace() || c == ',')
                    .filter(|name| !name.is_empty())
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();

        storage
    }

    /// `@psalm-assert Type $param` entries
    fn stored_assertions(
        &mut self,
        decl: &FunctionDecl,
        names: &[&str],
        templates: &[TemplateType],
    ) -> Vec<StoredAssertion> {
        let mut assertions = vec![];
        for tag in decl.docblock.tags_named(names) {
            let (rule, rest) = split_docblock_type(&tag.value().value);
            let param_name = rest
                .split_whitespace()
                .next()
                .and_then(|name| name.strip_prefix('$'));
            let Some(param_index) = param_name.and_then(|param_name| {
                decl.params
                    .iter()
                    .position(|param| param.name.value() == param_name)
            }) else {
                self.report_docblock(
                    format!("@{} `{}` names no parameter", tag.value().name, tag.value().value),
                    tag.span(),
                );
                continue;
            };
            match Assertion::parse_rule(rule, templates) {
                Ok(rule) => assertions.push(StoredAssertion { param_index, rule }),
                Err(error) => self.report_docblock(
                    format!("@{} `{rule}`: {error}", tag.value().name),
                    tag.span(),
                ),
            }
        }
        assertions
    }

    /// Register a class or interface with its members
    fn scan_class(&mut self, decl: &ClassDecl) {
        let name = strip_leading_separator(decl.name.value());
        let mut storage = ClassStorage::new(name, decl.name.span());
        storage.is_interface = decl.kind == ClassKind::Interface;
        storage.is_abstract = decl.is_abstract;
        storage.is_final = decl.is_final;
        storage.parent = decl
            .parent
            .as_deref()
            .map(|parent| strip_leading_separator(parent).to_string());
        storage.interfaces = decl
            .interfaces
            .iter()
            .map(|interface| strip_leading_separator(interface).to_string())
            .collect();
        storage.template_types = self.scan_templates(&decl.docblock, &normalize_name(name), &[]);
        let templates = storage.template_types.clone();

        for tag in decl.docblock.tags_named(TEMPLATE_EXTENDS_TAGS) {
            let (type_str, _) = split_docblock_type(&tag.value().value);
            let origin = format!("@{}", tag.value().name);
            let Some(ty) = self.parse_or_report(type_str, tag.span(), &templates, &origin) else {
                continue;
            };
            match ty.single() {
                Some(Atomic::NamedObject {
                    name,
                    type_params: Some(params),
                }) => {
                    storage
                        .template_extends
                        .insert(normalize_name(name), params.clone());
                }
                _ => self.report_docblock(
                    format!("{origin} `{type_str}` is not a generic class"),
                    tag.span(),
                ),
            }
        }

        storage.sealed_properties = decl
            .docblock
            .tags_named(&["psalm-seal-properties", "seal-properties"])
            .next()
            .is_some();

        for (property_name, ty) in self.named_tag_types(
            &decl.docblock,
            &["property", "property-read", "property-write", "psalm-property"],
            &templates,
        ) {
            storage.properties.insert(
                property_name.clone(),
                PropertyStorage {
                    name: property_name,
                    ty: Some(ty),
                    visibility: Visibility::Public,
                    is_static: false,
                    has_default: false,
                    declaring_class: name.to_string(),
                },
            );
        }

        let scope = ClassScope {
            name,
            templates: &templates,
        };
        for member in &decl.members {
            match member {
                ClassMember::Property(property) => {
                    let signature_type = property.type_hint.as_ref().and_then(|hint| {
                        self.parse_or_report(hint.value(), hint.span(), &templates, "property type")
                    });
                    let doc_type = self
                        .tag_type(&property.docblock, &["var", "psalm-var", "phpstan-var"], &templates)
                        .map(|(ty, _)| ty);
                    let ty = if self.config.use_docblock_types {
                        doc_type.or(signature_type)
                    } else {
                        signature_type.or(doc_type)
                    };
                    storage.properties.insert(
                        property.name.value().clone(),
                        PropertyStorage {
                            name: property.name.value().clone(),
                            ty,
                            visibility: property.visibility,
                            is_static: property.is_static,
                            has_default: property.default.is_some(),
                            declaring_class: name.to_string(),
                        },
                    );
                }
                ClassMember::Constant(constant) => {
                    storage.constants.insert(
                        constant.name.value().clone(),
                        ClassConstantStorage {
                            name: constant.name.value().clone(),
                            ty: constant_type(&constant.value, Some(name)),
                            visibility: constant.visibility,
                            declaring_class: name.to_string(),
                        },
                    );
                }
                ClassMember::Method(method) => {
                    let mut function = self.function_storage(&method.function, Some(&scope));
                    function.visibility = method.visibility;
                    function.is_static = method.is_static;
                    function.is_abstract = method.is_abstract || storage.is_interface;
                    function.is_final = method.is_final;
                    storage
                        .methods
                        .insert(method.function.name.value().to_ascii_lowercase(), function);
                }
            }
        }

        self.codebase.add_class(storage);
    }
}

/// The type of a constant initializer: literals keep their value, arrays of
/// literals become shapes, references to other class constants resolve
/// lazily
#[must_use]
pub fn constant_type(expr: &Expr, self_class: Option<&str>) -> Union {
    match expr.kind() {
        ExprKind::Int(value) => Atomic::LiteralInt(*value).into(),
        ExprKind::Float(value) => Atomic::LiteralFloat(*value).into(),
        ExprKind::String(value) => Atomic::LiteralString(value.clone()).into(),
        ExprKind::Bool(true) => Atomic::True.into(),
        ExprKind::Bool(false) => Atomic::False.into(),
        ExprKind::Null => Union::null(),
        ExprKind::UnaryMinus(inner) => match inner.kind() {
            ExprKind::Int(value) => value
                .checked_neg()
                .map_or_else(Union::float, |value| Atomic::LiteralInt(value).into()),
            ExprKind::Float(value) => Atomic::LiteralFloat(-value).into(),
            _ => Union::mixed(),
        },
        ExprKind::Concat(left, right) => {
            let left = constant_type(left, self_class);
            let right = constant_type(right, self_class);
            match (left.get_single_literal_string(), right.get_single_literal_string()) {
                (Some(left), Some(right)) => Atomic::LiteralString(format!("{left}{right}")).into(),
                _ => Union::string(),
            }
        }
        ExprKind::Array(items) => {
            if items.is_empty() {
                return Atomic::empty_array().into();
            }
            let mut properties = indexmap::IndexMap::new();
            let mut next_index = 0_i64;
            for item in items {
                if item.unpack || item.by_ref {
                    return Atomic::mixed_array().into();
                }
                let key = match item.key.as_ref().map(Expr::kind) {
                    None => ShapeKey::Int(next_index),
                    Some(ExprKind::Int(key)) => ShapeKey::Int(*key),
                    Some(ExprKind::String(key)) => ShapeKey::from_string(key),
                    Some(_) => return Atomic::mixed_array().into(),
                };
                if let ShapeKey::Int(key) = key {
                    next_index = next_index.max(key.saturating_add(1));
                }
                properties.insert(key, constant_type(&item.value, self_class));
            }
            Atomic::ObjectShape {
                properties,
                sealed: true,
            }
            .into()
        }
        ExprKind::ClassConstFetch(class, name) => {
            let class = match class {
                ClassRef::Named(class) => strip_leading_separator(class).to_string(),
                ClassRef::SelfRef | ClassRef::Static => match self_class {
                    Some(class) => class.to_string(),
                    None => return Union::mixed(),
                },
                ClassRef::Parent | ClassRef::Expr(_) => return Union::mixed(),
            };
            if name.value().eq_ignore_ascii_case("class") {
                Atomic::LiteralClassString(class).into()
            } else {
                Atomic::ScalarClassConstant {
                    class,
                    name: name.value().clone(),
                }
                .into()
            }
        }
        _ => Union::mixed(),
    }
}

#[cfg(test)]
mod tests {
    use sable_ast::{decl::ClassMember, AstBuilder};
    use sable_diagnostics::IssueBuffer;

    use super::*;

    fn scan(stmts: Vec<Stmt>) -> (Codebase, IssueBuffer) {
        let mut codebase = Codebase::new_empty();
        let mut buffer = IssueBuffer::new();
        scan_stmts(&stmts, "test.php", &mut codebase, &AnalysisConfig::default(), &mut buffer);
        (codebase, buffer)
    }

    #[test]
    fn functions_with_docblock_types() {
        let b = AstBuilder::new();
        let function = b
            .function("first")
            .with_doc("template", "T")
            .with_doc("param", "list<T> $items")
            .with_doc("return", "T|null")
            .with_param(b.param("items").typed("array"))
            .returning("mixed")
            .with_body(vec![]);
        let (codebase, buffer) = scan(vec![b.function_stmt(function)]);
        assert!(buffer.diagnostics().is_empty());

        let storage = codebase.get_function("FIRST").expect("function should be registered");
        assert_eq!(storage.params[0].ty.as_ref().map(ToString::to_string).as_deref(), Some("array<int, T>"));
        assert_eq!(
            storage.params[0].signature_type.as_ref().map(ToString::to_string).as_deref(),
            Some("array<array-key, mixed>")
        );
        assert_eq!(storage.return_type.as_ref().map(ToString::to_string).as_deref(), Some("T|null"));
        assert_eq!(storage.template_types[0].defining_entity, "first");
    }

    #[test]
    fn null_defaults_make_parameters_nullable() {
        let b = AstBuilder::new();
        let function = b
            .function("f")
            .with_param(b.param("a").typed("int").with_default(b.null()));
        let (codebase, _) = scan(vec![b.function_stmt(function)]);
        let storage = codebase.get_function("f").expect("function should be registered");
        assert_eq!(storage.params[0].ty.as_ref().map(ToString::to_string).as_deref(), Some("int|null"));
        assert_eq!(storage.required_param_count(), 0);
    }

    #[test]
    fn invalid_docblocks_fall_back_to_signatures() {
        let b = AstBuilder::new();
        let function = b
            .function("f")
            .with_doc("return", "array<int,")
            .returning("string");
        let (codebase, buffer) = scan(vec![b.function_stmt(function)]);
        assert_eq!(buffer.names(), vec!["InvalidDocblock"]);
        let storage = codebase.get_function("f").expect("function should be registered");
        assert_eq!(storage.return_type.as_ref().map(ToString::to_string).as_deref(), Some("string"));
    }

    #[test]
    fn assertions_and_suppressions() {
        let b = AstBuilder::new();
        let function = b
            .function("assertIsFoo")
            .with_doc("psalm-assert", "Foo $value")
            .with_doc("psalm-assert-if-true", "!null $other")
            .with_doc("psalm-suppress", "MixedArgument, InvalidReturnType")
            .with_param(b.param("value"))
            .with_param(b.param("other"));
        let (codebase, _) = scan(vec![b.function_stmt(function)]);
        let storage = codebase.get_function("assertisfoo").expect("function should be registered");
        assert_eq!(
            storage.assertions,
            vec![StoredAssertion {
                param_index: 0,
                rule: vec![vec![Assertion::IsType(Atomic::named("Foo"))]],
            }]
        );
        assert_eq!(storage.if_true_assertions[0].param_index, 1);
        assert!(storage.suppresses("InvalidReturnType"));
        assert!(!storage.suppresses("UndefinedVariable"));
    }

    #[test]
    fn classes_with_members_and_templates() {
        let b = AstBuilder::new();
        let class = b
            .class("Box")
            .with_doc("template", "T of object")
            .with_doc("template-extends", "Base<T>")
            .extends("Base")
            .with_property(b.property("item").with_doc("var", "T"))
            .with_constant(b.class_constant("KINDS", b.list(vec![b.string("a"), b.string("b")])))
            .with_method(b.method(b.function("get").returning("T").with_body(vec![])).static_())
            .with_member(ClassMember::Constant(b.class_constant("SELF", b.class_const(ClassRef::SelfRef, "KINDS"))));
        let (codebase, buffer) = scan(vec![b.class_stmt(class)]);
        assert!(buffer.diagnostics().is_empty());

        let storage = codebase.get_class("box").expect("class should be registered");
        assert_eq!(storage.parent.as_deref(), Some("Base"));
        assert_eq!(storage.template_types[0].as_type.to_string(), "object");
        assert_eq!(
            storage.template_extends.get("base").map(|params| params[0].to_string()),
            Some("T".to_string())
        );
        assert_eq!(
            storage.properties["item"].ty.as_ref().map(ToString::to_string).as_deref(),
            Some("T")
        );
        assert_eq!(storage.constants["KINDS"].ty.to_string(), "array{0: string(a), 1: string(b)}");
        assert_eq!(storage.constants["SELF"].ty.to_string(), "Box::KINDS");
        let method = &storage.methods["get"];
        assert!(method.is_static);
        assert_eq!(method.defining_class.as_deref(), Some("Box"));
    }

    #[test]
    fn conditional_declarations_and_defines() {
        let b = AstBuilder::new();
        let stmts = vec![
            b.if_(
                b.not(b.call("function_exists", vec![b.string("g")])),
                vec![b.function_stmt(b.function("g"))],
                None,
            ),
            b.expr_stmt(b.call("define", vec![b.string("LIMIT"), b.int(10)])),
            b.const_("NAME", b.string("sable")),
        ];
        let (codebase, _) = scan(stmts);
        assert!(codebase.function_exists("g"));
        assert_eq!(codebase.get_constant("LIMIT").map(ToString::to_string).as_deref(), Some("int(10)"));
        assert_eq!(codebase.get_constant("NAME").map(ToString::to_string).as_deref(), Some("string(sable)"));
    }
}

//! for function, method and static calls, and `new`

use indexmap::IndexMap;
use sable_ast::expr::{Arg, Callee, ClassRef, Expr};
use sable_diagnostics::IssueKind;
use sable_utils::{
    names::strip_leading_separator,
    span::{Span, Spanned},
};

use super::{
    analyze_expr, assign_to_target,
    helpers::{describe, resolve_class_ref, var_id_of},
    literals::analyze_reference_source,
};
use crate::{
    codebase::{FunctionLikeStorage, FunctionParam},
    typeck::{
        algebra::reconcile_keyed_types,
        analyzer::{AnalysisResult, Analyzer},
        context::Context,
    },
    types::{
        combine_many, comparator::is_contained_by, flesh_out_type, generalize_shape, infer_templates,
        template::get_ancestor_type_params, Atomic, ExpandContext, TemplateResult, Union,
    },
};

/// The parameter an argument at `index` is passed to
fn param_for(storage: &FunctionLikeStorage, index: usize) -> Option<&FunctionParam> {
    storage
        .params
        .get(index)
        .or_else(|| storage.params.last().filter(|param| param.variadic))
}

/// Check every argument expression. Arguments passed by reference may name
/// variables that do not exist yet.
fn analyze_args(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    storage: Option<&FunctionLikeStorage>,
    args: &[Arg],
) -> AnalysisResult<Vec<Union>> {
    let mut arg_types = vec![];
    for (index, arg) in args.iter().enumerate() {
        let by_ref = storage
            .and_then(|storage| param_for(storage, index))
            .is_some_and(|param| param.by_ref);
        let ty = if by_ref && !arg.unpack {
            analyze_reference_source(analyzer, context, &arg.value)?
        } else {
            analyze_expr(analyzer, context, &arg.value)?
        };
        arg_types.push(ty);
    }
    Ok(arg_types)
}

/// The element type an unpacked argument spreads
fn unpacked_value_type(ty: &Union) -> Union {
    let values = ty
        .atomics()
        .map(|atomic| match generalize_shape(atomic) {
            Atomic::Array { value, .. } => *value,
            _ => Union::mixed(),
        })
        .collect::<Vec<_>>();
    if values.is_empty() {
        Union::mixed()
    } else {
        combine_many(&values)
    }
}

/// What a by-reference argument holds after the call: its old type when
/// that still fits the parameter, otherwise the parameter type
fn by_ref_out_type(analyzer: &Analyzer<'_>, existing: &Union, param_type: &Union) -> Union {
    if existing.is_null() || existing.is_mixed() {
        return param_type.clone();
    }
    if is_contained_by(analyzer.codebase, existing, param_type, false, false).is_contained {
        let atomics = existing
            .atomics()
            .map(|atomic| match generalize_shape(atomic) {
                Atomic::Array { key, value, .. } => Atomic::Array {
                    key,
                    value,
                    count: None,
                },
                other => other,
            })
            .collect();
        return Union::new(atomics);
    }
    param_type.clone()
}

/// One call being checked against the signature it resolved to
struct CallCheck<'c> {
    /// The signature
    storage: &'c FunctionLikeStorage,
    /// How `self`, `static` and `parent` resolve in the signature
    self_class: Option<&'c str>,
    /// The class `static` resolves to
    static_class: Option<&'c str>,
    /// The parent of `self`
    parent_class: Option<&'c str>,
    /// Where the call is
    span: Span,
}

impl CallCheck<'_> {
    /// Resolve a signature type with `templates` bound
    fn expand(&self, analyzer: &Analyzer<'_>, ty: &Union, templates: &TemplateResult) -> Union {
        flesh_out_type(
            analyzer.codebase,
            ty,
            &ExpandContext {
                self_class: self.self_class,
                static_class: self.static_class,
                parent_class: self.parent_class,
                templates: Some(templates),
            },
        )
    }

    /// Check the arguments, write back by-reference arguments and apply the
    /// signature's assertions. Returns the type the call evaluates to.
    fn run(
        &self,
        analyzer: &mut Analyzer<'_>,
        context: &mut Context,
        args: &[Arg],
        arg_types: &[Union],
        templates: &mut TemplateResult,
    ) -> AnalysisResult<Union> {
        let function = self.storage.display_name();
        self.check_arity(analyzer, &function, args)?;

        let effective_types = args
            .iter()
            .zip(arg_types)
            .map(|(arg, ty)| {
                if arg.unpack {
                    unpacked_value_type(ty)
                } else {
                    ty.clone()
                }
            })
            .collect::<Vec<_>>();

        for (index, arg_type) in effective_types.iter().enumerate() {
            if let Some(param_type) = param_for(self.storage, index).and_then(|param| param.ty.as_ref())
            {
                infer_templates(analyzer.codebase, param_type, arg_type, templates);
            }
        }
        for template in &self.storage.template_types {
            if templates.get(&template.name, &template.defining_entity).is_none() {
                templates.insert(&template.name, &template.defining_entity, template.as_type.clone());
            }
        }

        for (index, (arg, arg_type)) in args.iter().zip(&effective_types).enumerate() {
            let Some(param) = param_for(self.storage, index) else {
                continue;
            };
            let param_type = param
                .ty
                .as_ref()
                .map_or_else(Union::mixed, |ty| self.expand(analyzer, ty, templates));
            if !(param.by_ref && arg_type.is_null()) {
                self.check_argument(analyzer, &function, index + 1, arg, arg_type, &param_type)?;
            }

            if param.by_ref && !arg.unpack {
                let out = by_ref_out_type(analyzer, arg_type, &param_type);
                assign_to_target(analyzer, context, &arg.value, &out)?;
            }
        }

        self.apply_assertions(analyzer, context, args);

        Ok(self
            .storage
            .return_type
            .as_ref()
            .map_or_else(Union::mixed, |ty| self.expand(analyzer, ty, templates)))
    }

    /// `TooFewArguments` and `TooManyArguments`
    fn check_arity(&self, analyzer: &mut Analyzer<'_>, function: &str, args: &[Arg]) -> AnalysisResult {
        if args.iter().any(|arg| arg.unpack) {
            return Ok(());
        }
        let required = self.storage.required_param_count();
        if args.len() < required {
            analyzer.report(
                IssueKind::TooFewArguments {
                    function: function.to_string(),
                    expected: required,
                    got: args.len(),
                },
                self.span,
            )?;
        } else if args.len() > self.storage.params.len() && !self.storage.is_variadic() {
            analyzer.report(
                IssueKind::TooManyArguments {
                    function: function.to_string(),
                    expected: self.storage.params.len(),
                    got: args.len(),
                },
                self.span,
            )?;
        }
        Ok(())
    }

    /// Check one argument against its parameter
    fn check_argument(
        &self,
        analyzer: &mut Analyzer<'_>,
        function: &str,
        argument: usize,
        arg: &Arg,
        arg_type: &Union,
        param_type: &Union,
    ) -> AnalysisResult {
        if param_type.is_mixed() || (param_type.is_nullable() && arg_type.is_null()) {
            return Ok(());
        }
        let span = arg.value.span();
        if arg_type.is_mixed() {
            return analyzer.report(
                IssueKind::MixedArgument {
                    argument,
                    function: function.to_string(),
                    expected: param_type.get_id(),
                },
                span,
            );
        }
        if arg_type.is_null() {
            return analyzer.report(
                IssueKind::NullArgument {
                    argument,
                    function: function.to_string(),
                },
                span,
            );
        }

        let result = is_contained_by(analyzer.codebase, arg_type, param_type, true, false);
        if !result.is_contained {
            let (function, expected, got) =
                (function.to_string(), param_type.get_id(), arg_type.get_id());
            let issue = if result.type_coerced {
                IssueKind::ArgumentTypeCoercion {
                    argument,
                    function,
                    expected,
                    got,
                }
            } else if result.has_scalar_match {
                IssueKind::InvalidScalarArgument {
                    argument,
                    function,
                    expected,
                    got,
                }
            } else {
                IssueKind::InvalidArgument {
                    argument,
                    function,
                    expected,
                    got,
                }
            };
            return analyzer.report(issue, span);
        }

        if arg_type.is_nullable() && !param_type.is_nullable() && !arg_type.ignore_nullable_issues {
            analyzer.report(
                IssueKind::PossiblyNullArgument {
                    argument,
                    function: function.to_string(),
                },
                span,
            )?;
        }
        Ok(())
    }

    /// Narrow arguments by `@psalm-assert` entries, which hold once the call
    /// returns
    fn apply_assertions(&self, analyzer: &Analyzer<'_>, context: &mut Context, args: &[Arg]) {
        let mut new_types: IndexMap<String, Vec<Vec<_>>> = IndexMap::new();
        for assertion in &self.storage.assertions {
            let Some(arg) = args.get(assertion.param_index) else {
                continue;
            };
            let Some(var_id) = var_id_of(analyzer, context, &arg.value) else {
                continue;
            };
            new_types
                .entry(var_id)
                .or_default()
                .extend(assertion.rule.iter().cloned());
        }
        if !new_types.is_empty() {
            reconcile_keyed_types(analyzer.codebase, &new_types, context, self.span, false);
        }
    }
}

/// `f(...)` and `$callable(...)`
pub fn analyze_function_call(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    span: Span,
    callee: &Callee,
    args: &[Arg],
) -> AnalysisResult<Union> {
    let codebase = analyzer.codebase;
    let name = match callee {
        Callee::Named(name) => Some(strip_leading_separator(name.value()).to_string()),
        Callee::Expr(expr) => {
            let ty = analyze_expr(analyzer, context, expr)?;
            ty.get_single_literal_string()
                .filter(|name| codebase.function_exists(name))
                .map(ToString::to_string)
        }
    };
    let Some(name) = name else {
        analyze_args(analyzer, context, None, args)?;
        return Ok(Union::mixed());
    };

    if name.eq_ignore_ascii_case("extract") {
        context.check_variables = false;
    }

    let Some(storage) = codebase.get_function(&name) else {
        analyzer.report(IssueKind::UndefinedFunction(name), span)?;
        analyze_args(analyzer, context, None, args)?;
        return Ok(Union::mixed());
    };
    let arg_types = analyze_args(analyzer, context, Some(storage), args)?;
    let self_class = context.self_class.clone();
    let static_class = context.static_class.clone();
    let parent_class = context.parent_class.clone();
    CallCheck {
        storage,
        self_class: self_class.as_deref(),
        static_class: static_class.as_deref(),
        parent_class: parent_class.as_deref(),
        span,
    }
    .run(analyzer, context, args, &arg_types, &mut TemplateResult::new())
}

/// Look up `method` on `class`, reporting a missing or inaccessible method.
/// A class with `__call` accepts any method name.
fn find_method<'c>(
    analyzer: &mut Analyzer<'c>,
    context: &Context,
    span: Span,
    class: &str,
    method: &str,
) -> AnalysisResult<Option<&'c FunctionLikeStorage>> {
    let codebase = analyzer.codebase;
    let Some(class_storage) = codebase.get_class(class) else {
        return Ok(None);
    };
    let Some(storage) = codebase.get_method(class, method) else {
        if !codebase.method_exists(class, "__call") {
            analyzer.report(
                IssueKind::UndefinedMethod(format!("{}::{method}", class_storage.name)),
                span,
            )?;
        }
        return Ok(None);
    };
    let declaring = storage.defining_class.as_deref().unwrap_or(&class_storage.name);
    if !codebase.is_visible(storage.visibility, declaring, context.self_class.as_deref()) {
        analyzer.report(IssueKind::InaccessibleMethod(storage.display_name()), span)?;
    }
    Ok(Some(storage))
}

/// The class template bindings a method sees through `object`
fn class_bindings(analyzer: &Analyzer<'_>, object: &Atomic, declaring: &str) -> TemplateResult {
    let codebase = analyzer.codebase;
    codebase.get_class(declaring).map_or_else(TemplateResult::new, |class| {
        let params = get_ancestor_type_params(codebase, object, declaring);
        TemplateResult::from_class_params(&class.template_types, params.as_deref())
    })
}

/// Check a call of `storage` on an instance of `object`
#[allow(clippy::too_many_arguments)]
fn call_method(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    span: Span,
    object: &Atomic,
    class: &str,
    storage: &FunctionLikeStorage,
    args: &[Arg],
    arg_types: &[Union],
) -> AnalysisResult<Union> {
    let codebase = analyzer.codebase;
    let declaring = storage.defining_class.clone().unwrap_or_else(|| class.to_string());
    let mut templates = class_bindings(analyzer, object, &declaring);
    CallCheck {
        storage,
        self_class: Some(&declaring),
        static_class: Some(class),
        parent_class: codebase.get_parent(&declaring),
        span,
    }
    .run(analyzer, context, args, arg_types, &mut templates)
}

/// `$o->m(...)` and `$o?->m(...)`
pub fn analyze_method_call(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    expr: &Expr,
    object: &Expr,
    name: &Spanned<String>,
    args: &[Arg],
    nullsafe: bool,
) -> AnalysisResult<Union> {
    let object_type = analyze_expr(analyzer, context, object)?;
    let span = expr.span();
    let container = describe(analyzer, context, object);

    let mut candidates = vec![];
    for atomic in object_type.atomics() {
        if let Atomic::NamedObject { name: class, .. } = atomic {
            if let Some(storage) = find_method(analyzer, context, span, class, name.value())? {
                candidates.push((atomic.clone(), class.clone(), storage));
            }
        }
    }
    let arg_types = analyze_args(
        analyzer,
        context,
        candidates.first().map(|(_, _, storage)| *storage),
        args,
    )?;

    let memoized = var_id_of(analyzer, context, expr).and_then(|var_id| context.get(&var_id).cloned());

    let mut results = vec![];
    for atomic in object_type.atomics() {
        match atomic {
            Atomic::Null => results.push(Union::null()),
            Atomic::Empty => {}
            Atomic::Mixed => {
                analyzer.report(IssueKind::MixedMethodCall(container.clone()), span)?;
                results.push(Union::mixed());
            }
            Atomic::NamedObject { .. } => {
                let candidate = candidates
                    .iter()
                    .find(|(candidate, _, _)| candidate == atomic);
                match candidate {
                    Some((object, class, storage)) => results.push(call_method(
                        analyzer, context, span, object, class, storage, args, &arg_types,
                    )?),
                    None => results.push(Union::mixed()),
                }
            }
            Atomic::Object | Atomic::GenericParam { .. } => results.push(Union::mixed()),
            other => {
                analyzer.report(IssueKind::InvalidMethodCall(other.get_id()), span)?;
                results.push(Union::mixed());
            }
        }
    }

    if object_type.is_nullable() && !nullsafe {
        let issue = if object_type.is_null() {
            IssueKind::NullMethodCall(container)
        } else {
            IssueKind::PossiblyNullMethodCall(container)
        };
        analyzer.report(issue, object.span())?;
    }

    if !analyzer.config.remember_property_assignments_after_call {
        context.remove_object_property_entries();
    }

    let result = if results.is_empty() {
        Union::mixed()
    } else {
        combine_many(&results)
    };
    if let Some(memoized) = memoized {
        return Ok(memoized.possibly_undefined(false));
    }
    if analyzer.config.memoize_method_calls {
        if let Some(var_id) = var_id_of(analyzer, context, expr) {
            context.narrow(&var_id, result.clone());
        }
    }
    Ok(result)
}

/// `Foo::m(...)`, `parent::m(...)`, `static::m(...)`
pub fn analyze_static_call(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    span: Span,
    class_ref: &ClassRef,
    name: &Spanned<String>,
    args: &[Arg],
) -> AnalysisResult<Union> {
    let Some(class) = resolve_class_ref(analyzer, context, class_ref, span)? else {
        analyze_args(analyzer, context, None, args)?;
        return Ok(Union::mixed());
    };
    let storage = find_method(analyzer, context, span, &class, name.value())?;
    let arg_types = analyze_args(analyzer, context, storage, args)?;
    let Some(storage) = storage else {
        return Ok(Union::mixed());
    };

    let relative = matches!(class_ref, ClassRef::SelfRef | ClassRef::Static | ClassRef::Parent);
    let this_type = context.get("$this").and_then(|ty| ty.single().cloned());
    let object = match this_type {
        Some(this) if relative && !storage.is_static => this,
        _ => Atomic::named(&class),
    };
    let static_class = if relative {
        context.static_class.clone().unwrap_or_else(|| class.clone())
    } else {
        class
    };
    call_method(analyzer, context, span, &object, &static_class, storage, args, &arg_types)
}

/// `new Foo(...)`
///
/// Template parameters of a generic class are bound from the constructor
/// arguments.
pub fn analyze_new(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    span: Span,
    class_ref: &ClassRef,
    args: &[Arg],
) -> AnalysisResult<Union> {
    if let ClassRef::Expr(expr) = class_ref {
        let ty = analyze_expr(analyzer, context, expr)?;
        analyze_args(analyzer, context, None, args)?;
        return Ok(match ty.single() {
            Some(Atomic::LiteralClassString(name) | Atomic::ClassString(Some(name))) => {
                Union::named(name)
            }
            Some(Atomic::NamedObject { name, .. }) => Union::named(name),
            _ => Atomic::Object.into(),
        });
    }

    let Some(class) = resolve_class_ref(analyzer, context, class_ref, span)? else {
        analyze_args(analyzer, context, None, args)?;
        return Ok(Union::mixed());
    };
    let codebase = analyzer.codebase;
    let Some(class_storage) = codebase.get_class(&class) else {
        analyze_args(analyzer, context, None, args)?;
        return Ok(Union::named(&class));
    };
    if (class_storage.is_abstract || class_storage.is_interface)
        && !matches!(class_ref, ClassRef::Static)
    {
        analyzer.report(IssueKind::AbstractInstantiation(class_storage.name.clone()), span)?;
    }

    let constructor = match codebase.get_method(&class, "__construct") {
        Some(constructor) => {
            let declaring = constructor.defining_class.as_deref().unwrap_or(&class_storage.name);
            if !codebase.is_visible(constructor.visibility, declaring, context.self_class.as_deref()) {
                analyzer.report(IssueKind::InaccessibleMethod(constructor.display_name()), span)?;
            }
            Some(constructor)
        }
        None => None,
    };
    let arg_types = analyze_args(analyzer, context, constructor, args)?;

    let mut templates = TemplateResult::new();
    if let Some(constructor) = constructor {
        let declaring = constructor
            .defining_class
            .clone()
            .unwrap_or_else(|| class_storage.name.clone());
        CallCheck {
            storage: constructor,
            self_class: Some(&declaring),
            static_class: Some(&class_storage.name),
            parent_class: codebase.get_parent(&declaring),
            span,
        }
        .run(analyzer, context, args, &arg_types, &mut templates)?;
    }

    let type_params = (!class_storage.template_types.is_empty()).then(|| {
        class_storage
            .template_types
            .iter()
            .map(|template| {
                templates
                    .get(&template.name, &template.defining_entity)
                    .cloned()
                    .unwrap_or_else(|| template.as_type.clone())
            })
            .collect()
    });
    Ok(Atomic::NamedObject {
        name: class_storage.name.clone(),
        type_params,
    }
    .into())
}

#[cfg(test)]
mod tests {
    use sable_ast::{decl::Visibility, expr::ClassRef, AstBuilder};

    use crate::typeck::test_utils::check;

    #[test]
    fn arguments_are_checked_against_parameters() {
        let b = AstBuilder::new();
        let f = b
            .function("f")
            .with_param(b.param("a").typed("int"))
            .with_param(b.param("b").typed("string").with_default(b.string("x")))
            .returning("void")
            .with_body(vec![]);
        let checked = check(&[
            b.function_stmt(f),
            b.expr_stmt(b.call("f", vec![])),
            b.expr_stmt(b.call("f", vec![b.int(1), b.string("a"), b.string("b")])),
            b.expr_stmt(b.call("f", vec![b.string("s")])),
            b.expr_stmt(b.call("f", vec![b.null()])),
            b.expr_stmt(b.call("f", vec![b.new_named("stdClass", vec![])])),
            b.expr_stmt(b.call("f", vec![b.int(2)])),
            b.expr_stmt(b.call("nope", vec![])),
        ]);
        assert_eq!(
            checked.issues(),
            vec![
                "TooFewArguments",
                "TooManyArguments",
                "InvalidScalarArgument",
                "NullArgument",
                "InvalidArgument",
                "UndefinedFunction",
            ]
        );
    }

    #[test]
    fn templates_bind_from_arguments() {
        let b = AstBuilder::new();
        let checked = check(&[
            b.assign_stmt(b.var("keys"), b.call("array_keys", vec![b.shape(vec![("a", b.int(1))])])),
            b.assign_stmt(
                b.var("parts"),
                b.call("explode", vec![b.string(","), b.string("a,b")]),
            ),
            b.assign_stmt(b.var("last"), b.call("array_pop", vec![b.var("parts")])),
            b.assign_stmt(
                b.var("it"),
                b.new_named("ArrayIterator", vec![b.shape(vec![("a", b.int(1))])]),
            ),
        ]);
        assert!(checked.issues().is_empty(), "{:?}", checked.issues());
        assert_eq!(checked.type_of("$keys").as_deref(), Some("array<int, string>"));
        assert_eq!(checked.type_of("$last").as_deref(), Some("string|null"));
        assert_eq!(
            checked.type_of("$it").as_deref(),
            Some("ArrayIterator<string, int>")
        );
    }

    #[test]
    fn by_reference_arguments_define_variables() {
        let b = AstBuilder::new();
        let checked = check(&[b.expr_stmt(b.call(
            "preg_match",
            vec![b.string("/x/"), b.string("x"), b.var("m")],
        ))]);
        assert!(checked.issues().is_empty(), "{:?}", checked.issues());
        assert!(checked.type_of("$m").is_some());
    }

    #[test]
    fn assertions_narrow_arguments() {
        let b = AstBuilder::new();
        let assert_int = b
            .function("assertInt")
            .with_param(b.param("value").typed("mixed"))
            .with_doc("psalm-assert", "int $value")
            .returning("void")
            .with_body(vec![]);
        let f = b
            .function("f")
            .with_param(b.param("x").typed("int|string"))
            .with_body(vec![
                b.expr_stmt(b.call("assertInt", vec![b.var("x")])),
                b.assign_stmt(b.var("y"), b.var("x")),
            ]);
        let checked = check(&[b.function_stmt(assert_int), b.function_stmt(f)]);
        assert!(checked.issues().is_empty(), "{:?}", checked.issues());
        assert_eq!(checked.type_in("f", "$y").as_deref(), Some("int"));
    }

    #[test]
    fn methods_are_resolved_on_the_object_type() {
        let b = AstBuilder::new();
        let class = b
            .class("Counter")
            .with_method(b.method(
                b.function("get")
                    .returning("int")
                    .with_body(vec![b.ret(Some(b.int(1)))]),
            ))
            .with_method(
                b.method(b.function("secret").returning("void").with_body(vec![]))
                    .with_visibility(Visibility::Private),
            );
        let checked = check(&[
            b.class_stmt(class),
            b.assign_stmt(b.var("c"), b.new_named("Counter", vec![])),
            b.assign_stmt(b.var("v"), b.method_call(b.var("c"), "get", vec![])),
            b.expr_stmt(b.method_call(b.var("c"), "secret", vec![])),
            b.expr_stmt(b.method_call(b.var("c"), "nope", vec![])),
            b.assign_stmt(b.var("n"), b.null()),
            b.expr_stmt(b.method_call(b.var("n"), "get", vec![])),
            b.expr_stmt(b.method_call(b.int(1), "get", vec![])),
        ]);
        assert_eq!(checked.type_of("$v").as_deref(), Some("int"));
        assert_eq!(
            checked.issues(),
            vec![
                "InaccessibleMethod",
                "UndefinedMethod",
                "NullMethodCall",
                "InvalidMethodCall",
            ]
        );
    }

    #[test]
    fn static_calls_and_instantiation() {
        let b = AstBuilder::new();
        let util = b.class("Util").with_method(
            b.method(
                b.function("twice")
                    .with_param(b.param("x").typed("int"))
                    .returning("int")
                    .with_body(vec![b.ret(Some(b.arith(
                        sable_ast::expr::Arithmetic::Multiplication,
                        b.var("x"),
                        b.int(2),
                    )))]),
            )
            .static_(),
        );
        let shape = b.class("Shape").abstract_();
        let checked = check(&[
            b.class_stmt(util),
            b.class_stmt(shape),
            b.assign_stmt(
                b.var("r"),
                b.static_call(ClassRef::named("Util"), "twice", vec![b.int(2)]),
            ),
            b.expr_stmt(b.static_call(ClassRef::named("Util"), "twice", vec![b.string("a")])),
            b.expr_stmt(b.new_named("Shape", vec![])),
        ]);
        assert_eq!(checked.type_of("$r").as_deref(), Some("int"));
        assert_eq!(
            checked.issues(),
            vec!["InvalidScalarArgument", "AbstractInstantiation"]
        );
    }
}

//! for closures and arrow functions

use sable_ast::{
    decl::{ArrowFunction, Closure, Param},
    expr::ExprKind,
};
use sable_diagnostics::IssueKind;
use sable_utils::span::{Span, Spanned};

use super::access::analyze_variable;
use crate::{
    codebase::{FunctionLikeStorage, FunctionParam},
    typeck::{
        analyzer::{AnalysisResult, Analyzer},
        context::Context,
        function::{analyze_function_like, FunctionBody},
    },
    types::{parse_type, Atomic, TemplateType, Union},
};

/// Parse a type hint written on a closure, reporting a failure
fn parse_hint(
    analyzer: &mut Analyzer<'_>,
    hint: &Spanned<String>,
    templates: &[TemplateType],
    origin: &str,
) -> AnalysisResult<Option<Union>> {
    match parse_type(hint.value(), templates) {
        Ok(ty) => Ok(Some(ty)),
        Err(error) => {
            analyzer.report(
                IssueKind::InvalidDocblock(format!("{origin} `{}`: {error}", hint.value())),
                hint.span(),
            )?;
            Ok(None)
        }
    }
}

/// The signature of a closure, read from its parameters and return hint
///
/// Template names of the enclosing function and class resolve as they do
/// there. Issues suppressed on the enclosing function stay suppressed.
fn closure_storage(
    analyzer: &mut Analyzer<'_>,
    context: &Context,
    span: Span,
    params: &[Param],
    return_type: Option<&Spanned<String>>,
) -> AnalysisResult<FunctionLikeStorage> {
    let mut storage = FunctionLikeStorage::new("{closure}", span);
    let mut templates = vec![];
    if let Some(function) = &analyzer.function {
        templates.extend(function.storage.template_types.iter().cloned());
        storage
            .suppressed_issues
            .clone_from(&function.storage.suppressed_issues);
    }
    if let Some(class) = context
        .self_class
        .as_deref()
        .and_then(|class| analyzer.codebase.get_class(class))
    {
        templates.extend(class.template_types.iter().cloned());
    }

    for param in params {
        let ty = match &param.type_hint {
            Some(hint) => parse_hint(analyzer, hint, &templates, "parameter type")?,
            None => None,
        };
        let has_null_default = param
            .default
            .as_ref()
            .is_some_and(|default| matches!(default.kind(), ExprKind::Null));
        let ty = ty.map(|mut ty| {
            if has_null_default && !ty.is_nullable() && !ty.is_mixed() {
                ty.add(Atomic::Null);
            }
            ty
        });
        storage.params.push(FunctionParam {
            name: param.name.value().clone(),
            ty: ty.clone(),
            signature_type: ty,
            has_default: param.default.is_some(),
            by_ref: param.by_ref,
            variadic: param.variadic,
            span: param.name.span(),
        });
    }

    if let Some(hint) = return_type {
        storage.return_type = parse_hint(analyzer, hint, &templates, "return type")?;
        storage.signature_return_type.clone_from(&storage.return_type);
        storage.return_type_span = Some(hint.span());
    }
    Ok(storage)
}

/// The scope a closure body starts in: the class scope of the enclosing
/// code, and `$this` unless the closure is static
fn closure_context(outer: &Context, is_static: bool) -> Context {
    let mut inner = Context::new(outer.self_class.as_deref());
    inner.static_class.clone_from(&outer.static_class);
    inner.parent_class.clone_from(&outer.parent_class);
    inner.is_static = outer.is_static || is_static;
    inner.check_variables = outer.check_variables;
    if !is_static {
        if let Some(this) = outer.get("$this") {
            inner.set("$this", this.clone());
        }
    }
    inner
}

/// `function (...) use (...) { ... }`
///
/// The body is checked on its own with only the parameters, `$this` and the
/// captured variables in scope. A variable captured by reference may be
/// changed by the closure at any later time, so it becomes `mixed` on both
/// sides.
pub fn analyze_closure(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    span: Span,
    closure: &Closure,
) -> AnalysisResult<Union> {
    let storage = closure_storage(
        analyzer,
        context,
        span,
        &closure.params,
        closure.return_type.as_ref(),
    )?;
    let mut inner = closure_context(context, closure.is_static);

    for capture in &closure.uses {
        let var_id = format!("${}", capture.name.value());
        if capture.by_ref {
            let mut ty = if context.has_variable(&var_id) {
                Union::mixed()
            } else {
                Union::null()
            };
            ty.by_ref = true;
            context.set(&var_id, ty.clone());
            inner.set(&var_id, ty);
        } else {
            let ty = analyze_variable(analyzer, context, capture.name.span(), capture.name.value())?;
            inner.set(&var_id, ty);
        }
    }

    analyze_function_like(
        analyzer,
        inner,
        storage,
        &closure.params,
        FunctionBody::Block(&closure.body),
    )?;
    Ok(Union::named("Closure"))
}

/// `fn (...) => expr`
///
/// The body sees every variable of the enclosing scope by value; nothing it
/// assigns leaks out.
pub fn analyze_arrow_function(
    analyzer: &mut Analyzer<'_>,
    context: &Context,
    span: Span,
    arrow: &ArrowFunction,
) -> AnalysisResult<Union> {
    let storage = closure_storage(
        analyzer,
        context,
        span,
        &arrow.params,
        arrow.return_type.as_ref(),
    )?;
    let mut inner = context.fork();
    inner.inside_loop = false;
    if arrow.is_static {
        inner.is_static = true;
        inner.remove("$this");
    }

    analyze_function_like(
        analyzer,
        inner,
        storage,
        &arrow.params,
        FunctionBody::Arrow(&arrow.body),
    )?;
    Ok(Union::named("Closure"))
}

#[cfg(test)]
mod tests {
    use sable_ast::{
        decl::{Closure, Visibility},
        expr::{Arithmetic, ExprKind},
        AstBuilder,
    };

    use crate::typeck::test_utils::check;

    #[test]
    fn closures_capture_by_value_and_by_reference() {
        let b = AstBuilder::new();
        let closure = b.closure(
            vec![b.param("a").typed("int")],
            &["x", "&count"],
            vec![
                b.assign_stmt(
                    b.var("y"),
                    b.arith(Arithmetic::Addition, b.var("x"), b.var("a")),
                ),
                b.assign_stmt(b.var("count"), b.int(1)),
                b.ret(Some(b.var("y"))),
            ],
        );
        let checked = check(&[
            b.expr_stmt(b.closure(vec![], &["missing"], vec![])),
            b.assign_stmt(b.var("x"), b.int(1)),
            b.assign_stmt(b.var("count"), b.int(0)),
            b.assign_stmt(b.var("f"), closure),
        ]);
        assert_eq!(checked.issues(), vec!["UndefinedVariable"]);
        assert_eq!(checked.type_of("$f").as_deref(), Some("Closure"));
        assert_eq!(checked.type_of("$count").as_deref(), Some("mixed"));
        assert_eq!(checked.type_in("{closure}", "$x").as_deref(), Some("int(1)"));
        assert_eq!(checked.type_in("{closure}", "$y").as_deref(), Some("int"));
        assert_eq!(checked.type_in("{closure}", "$count").as_deref(), Some("int(1)"));
    }

    #[test]
    fn closure_bodies_are_checked_like_functions() {
        let b = AstBuilder::new();
        let closure = b.closure(
            vec![b.param("a").typed("int")],
            &["x"],
            vec![b.assign_stmt(
                b.var("y"),
                b.arith(Arithmetic::Addition, b.var("x"), b.var("a")),
            )],
        );
        let typed = b.expr(ExprKind::Closure(Box::new(Closure {
            params: vec![b.param("bad").typed("array<")],
            uses: vec![],
            return_type: Some(b.int(0).span().containing("int".to_string())),
            body: vec![b.ret(Some(b.string("x")))],
            is_static: false,
        })));
        let checked = check(&[
            b.assign_stmt(b.var("x"), b.int(1)),
            b.assign_stmt(b.var("f"), closure),
            b.assign_stmt(b.var("g"), typed),
        ]);
        assert_eq!(checked.type_of("$y"), None);
        assert_eq!(checked.issues(), vec!["InvalidDocblock", "InvalidReturnType"]);
    }

    #[test]
    fn arrow_functions_see_the_enclosing_scope() {
        let b = AstBuilder::new();
        let checked = check(&[
            b.assign_stmt(b.var("n"), b.int(2)),
            b.assign_stmt(
                b.var("g"),
                b.arrow_fn(
                    vec![b.param("m").typed("int")],
                    b.arith(Arithmetic::Multiplication, b.var("m"), b.var("n")),
                ),
            ),
            b.expr_stmt(b.arrow_fn(vec![], b.assign(b.var("z"), b.int(1)))),
        ]);
        assert!(checked.issues().is_empty(), "{:?}", checked.issues());
        assert_eq!(checked.type_of("$g").as_deref(), Some("Closure"));
        assert_eq!(checked.type_of("$z"), None);
    }

    #[test]
    fn static_closures_have_no_this() {
        let b = AstBuilder::new();
        let static_closure = b.expr(ExprKind::Closure(Box::new(Closure {
            params: vec![],
            uses: vec![],
            return_type: None,
            body: vec![b.ret(Some(b.var("this")))],
            is_static: true,
        })));
        let class = b.class("Widget").with_method(
            b.method(b.function("make").returning("void").with_body(vec![
                b.assign_stmt(
                    b.var("bound"),
                    b.closure(vec![], &[], vec![b.ret(Some(b.var("this")))]),
                ),
                b.assign_stmt(b.var("unbound"), static_closure),
            ]))
            .with_visibility(Visibility::Public),
        );
        let checked = check(&[b.class_stmt(class)]);
        assert_eq!(checked.issues(), vec!["InvalidScope"]);
    }
}

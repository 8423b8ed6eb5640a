//! for global and class constants

use sable_ast::expr::ClassRef;
use sable_diagnostics::IssueKind;
use sable_utils::{
    names::strip_leading_separator,
    span::{Span, Spanned},
};

use super::{analyze_expr, helpers::resolve_class_ref};
use crate::{
    typeck::{
        analyzer::{AnalysisResult, Analyzer},
        context::Context,
    },
    types::{flesh_out_type, Atomic, ExpandContext, Union},
};

/// `FOO`
pub fn analyze_const_fetch(
    analyzer: &mut Analyzer<'_>,
    span: Span,
    name: &str,
) -> AnalysisResult<Union> {
    match name.to_ascii_lowercase().as_str() {
        "true" => return Ok(Union::true_()),
        "false" => return Ok(Union::false_()),
        "null" => return Ok(Union::null()),
        _ => {}
    }
    let codebase = analyzer.codebase;
    match codebase.get_constant(name) {
        Some(ty) => Ok(flesh_out_type(codebase, ty, &ExpandContext::default())),
        None => {
            analyzer.report(
                IssueKind::UndefinedConstant(strip_leading_separator(name).to_string()),
                span,
            )?;
            Ok(Union::mixed())
        }
    }
}

/// `Foo::BAR` and `Foo::class`
pub fn analyze_class_const_fetch(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    span: Span,
    class: &ClassRef,
    name: &Spanned<String>,
) -> AnalysisResult<Union> {
    if name.value().eq_ignore_ascii_case("class") {
        return class_name_type(analyzer, context, span, class);
    }

    let Some(class) = resolve_class_ref(analyzer, context, class, span)? else {
        return Ok(Union::mixed());
    };
    let codebase = analyzer.codebase;
    let Some(constant) = codebase.get_class_constant(&class, name.value()) else {
        analyzer.report(
            IssueKind::UndefinedConstant(format!("{class}::{}", name.value())),
            span,
        )?;
        return Ok(Union::mixed());
    };

    if !codebase.is_visible(
        constant.visibility,
        &constant.declaring_class,
        context.self_class.as_deref(),
    ) {
        analyzer.report(
            IssueKind::InaccessibleClassConstant(format!(
                "{}::{}",
                constant.declaring_class,
                name.value()
            )),
            span,
        )?;
    }

    Ok(flesh_out_type(
        codebase,
        &constant.ty,
        &ExpandContext {
            self_class: Some(&constant.declaring_class),
            static_class: Some(&class),
            parent_class: codebase.get_parent(&constant.declaring_class),
            templates: None,
        },
    ))
}

/// `X::class`. A named class needs no declaration; `static::class` is
/// only known to be the current class or a subclass of it.
fn class_name_type(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    span: Span,
    class: &ClassRef,
) -> AnalysisResult<Union> {
    Ok(match class {
        ClassRef::Named(name) => {
            Atomic::LiteralClassString(strip_leading_separator(name).to_string()).into()
        }
        ClassRef::SelfRef => context.self_class.clone().map_or(
            Atomic::ClassString(None).into(),
            |class| Atomic::LiteralClassString(class).into(),
        ),
        ClassRef::Static => Atomic::ClassString(context.static_class.clone()).into(),
        ClassRef::Parent => match context.parent_class.clone() {
            Some(parent) => Atomic::LiteralClassString(parent).into(),
            None => {
                analyzer.report(IssueKind::ParentNotFound, span)?;
                Atomic::ClassString(None).into()
            }
        },
        ClassRef::Expr(expr) => {
            let ty = analyze_expr(analyzer, context, expr)?;
            match ty.single() {
                Some(Atomic::NamedObject { name, .. }) => {
                    Atomic::ClassString(Some(name.clone())).into()
                }
                _ => Atomic::ClassString(None).into(),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use sable_ast::{decl::Visibility, expr::ClassRef, AstBuilder};

    use crate::typeck::test_utils::check;

    #[test]
    fn global_constants() {
        let b = AstBuilder::new();
        let checked = check(&[
            b.const_("GREETING", b.string("hi")),
            b.assign_stmt(b.var("eol"), b.constant("PHP_EOL")),
            b.assign_stmt(b.var("greeting"), b.constant("GREETING")),
            b.expr_stmt(b.constant("NOPE")),
        ]);
        assert_eq!(checked.type_of("$eol").as_deref(), Some("string"));
        assert_eq!(checked.type_of("$greeting").as_deref(), Some("string(hi)"));
        assert_eq!(checked.issues(), vec!["UndefinedConstant"]);
    }

    #[test]
    fn class_names_need_no_declaration() {
        let b = AstBuilder::new();
        let checked = check(&[b.assign_stmt(
            b.var("c"),
            b.class_const(ClassRef::named("Unknown\\Thing"), "class"),
        )]);
        assert!(checked.issues().is_empty());
        assert_eq!(checked.type_of("$c").as_deref(), Some("Unknown\\Thing::class"));
    }

    #[test]
    fn class_constants_and_visibility() {
        let b = AstBuilder::new();
        let mut hidden = b.class_constant("HIDDEN", b.int(2));
        hidden.visibility = Visibility::Private;
        let class = b
            .class("Config")
            .with_constant(b.class_constant("LIMIT", b.int(10)))
            .with_constant(hidden);
        let checked = check(&[
            b.class_stmt(class),
            b.assign_stmt(b.var("limit"), b.class_const(ClassRef::named("Config"), "LIMIT")),
            b.expr_stmt(b.class_const(ClassRef::named("Config"), "HIDDEN")),
            b.expr_stmt(b.class_const(ClassRef::named("Config"), "MISSING")),
            b.expr_stmt(b.class_const(ClassRef::Parent, "X")),
        ]);
        assert_eq!(checked.type_of("$limit").as_deref(), Some("int(10)"));
        assert_eq!(
            checked.issues(),
            vec!["InaccessibleClassConstant", "UndefinedConstant", "ParentNotFound"]
        );
    }
}

//! Helper functions shared by the expression checkers

use sable_ast::expr::{ClassRef, Expr};
use sable_diagnostics::IssueKind;
use sable_utils::{names::strip_leading_separator, span::Span};

use super::analyze_expr;
use crate::{
    typeck::{
        analyzer::{AnalysisResult, Analyzer},
        context::Context,
        var_id::get_var_id,
    },
    types::Atomic,
};

/// The var id of `expr` in `context`, if it names a location
pub fn var_id_of(analyzer: &Analyzer<'_>, context: &Context, expr: &Expr) -> Option<String> {
    get_var_id(
        expr,
        context.self_class.as_deref(),
        analyzer.config.memoize_method_calls,
    )
}

/// How `expr` is named in diagnostics: its var id, or else its source text
pub fn describe(analyzer: &Analyzer<'_>, context: &Context, expr: &Expr) -> String {
    var_id_of(analyzer, context, expr).unwrap_or_else(|| expr.to_string())
}

/// The class a class reference names
///
/// A named class that does not exist is reported as `UndefinedClass`, and
/// `parent` without a parent as `ParentNotFound`; both give `None`. So does
/// an expression whose type is not a single known class.
///
/// # Errors
/// Errors when a hard-stop diagnostic is reported.
pub fn resolve_class_ref(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    class: &ClassRef,
    span: Span,
) -> AnalysisResult<Option<String>> {
    Ok(match class {
        ClassRef::Named(name) => {
            let name = strip_leading_separator(name);
            match analyzer.codebase.get_class(name) {
                Some(storage) => Some(storage.name.clone()),
                None => {
                    analyzer.report(IssueKind::UndefinedClass(name.to_string()), span)?;
                    None
                }
            }
        }
        ClassRef::SelfRef => context.self_class.clone(),
        ClassRef::Static => context.static_class.clone(),
        ClassRef::Parent => {
            if context.parent_class.is_none() {
                analyzer.report(IssueKind::ParentNotFound, span)?;
            }
            context.parent_class.clone()
        }
        ClassRef::Expr(expr) => {
            let ty = analyze_expr(analyzer, context, expr)?;
            match ty.single() {
                Some(
                    Atomic::NamedObject { name, .. }
                    | Atomic::LiteralClassString(name)
                    | Atomic::ClassString(Some(name)),
                ) => Some(name.clone()),
                _ => None,
            }
        }
    })
}

//! for the ternary operator, generators and `clone`

use sable_ast::expr::Expr;
use sable_diagnostics::IssueKind;
use sable_utils::span::Span;

use super::analyze_expr;
use crate::{
    typeck::{
        analyzer::{AnalysisResult, Analyzer},
        block::analyze_condition,
        context::Context,
    },
    types::{combine, combine_many, generalize_shape, Atomic, Union},
};

/// The values of `ty` that are truthy
fn truthy_part(ty: &Union) -> Union {
    let mut truthy = ty.clone();
    truthy.retain(|atomic| !atomic.is_always_falsy());
    if truthy.remove(&Atomic::Bool.get_id()).is_some() {
        truthy.add(Atomic::True);
    }
    truthy
}

/// `a ? b : c` and `a ?: c`
///
/// Each side is checked in the context where the condition has the
/// matching truthiness, and the two are merged afterwards.
pub fn analyze_ternary(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    cond: &Expr,
    then: Option<&Expr>,
    else_: &Expr,
) -> AnalysisResult<Union> {
    let (mut if_context, mut else_context) = analyze_condition(analyzer, context, cond)?;
    let then_type = match then {
        Some(then) => analyze_expr(analyzer, &mut if_context, then)?,
        None => {
            let cond_type = analyzer.expr_type(cond).cloned().unwrap_or_else(Union::mixed);
            truthy_part(&cond_type)
        }
    };
    let else_type = analyze_expr(analyzer, &mut else_context, else_)?;
    *context = Context::merge_branches(context, &[&if_context, &else_context]);
    Ok(combine(&then_type, &else_type))
}

/// The `Generator<TKey, TValue, TSend, TReturn>` parameter at `index` of
/// the enclosing function's declared return type
fn generator_param(analyzer: &Analyzer<'_>, index: usize) -> Option<Union> {
    let declared = analyzer.function.as_ref()?.storage.return_type.as_ref()?;
    let params = declared.atomics().find_map(|atomic| match atomic {
        Atomic::NamedObject {
            name,
            type_params: Some(params),
        } if name.eq_ignore_ascii_case("Generator") => Some(params),
        _ => None,
    })?;
    params.get(index).cloned()
}

/// Record one yielded key and value on the enclosing function
fn record_yield(analyzer: &mut Analyzer<'_>, key: Union, value: Union) {
    if analyzer.is_muted() {
        return;
    }
    if let Some(function) = &mut analyzer.function {
        function.yields.push((key, value));
    }
}

/// `yield`, `yield $v` and `yield $k => $v`: evaluates to what the
/// consumer sends in
pub fn analyze_yield(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    key: Option<&Expr>,
    value: Option<&Expr>,
) -> AnalysisResult<Union> {
    let key_type = match key {
        Some(key) => analyze_expr(analyzer, context, key)?,
        None => Union::int(),
    };
    let value_type = match value {
        Some(value) => analyze_expr(analyzer, context, value)?,
        None => Union::null(),
    };
    record_yield(analyzer, key_type, value_type);
    Ok(generator_param(analyzer, 2).unwrap_or_else(Union::mixed))
}

/// `yield from $inner`: yields everything `$inner` does, then evaluates to
/// its return value
pub fn analyze_yield_from(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    span: Span,
    inner: &Expr,
) -> AnalysisResult<Union> {
    let ty = analyze_expr(analyzer, context, inner)?;
    let mut keys = vec![];
    let mut values = vec![];
    let mut returns = vec![];
    for atomic in ty.atomics() {
        match generalize_shape(atomic) {
            Atomic::Array { key, value, .. } => {
                keys.push(*key);
                values.push(*value);
                returns.push(Union::null());
            }
            Atomic::NamedObject {
                name,
                type_params: Some(params),
            } if name.eq_ignore_ascii_case("Generator") && params.len() == 4 => {
                keys.push(params[0].clone());
                values.push(params[1].clone());
                returns.push(params[3].clone());
            }
            Atomic::Mixed | Atomic::NamedObject { .. } | Atomic::Object => {
                keys.push(Union::mixed());
                values.push(Union::mixed());
                returns.push(Union::mixed());
            }
            other => {
                analyzer.report(IssueKind::InvalidIterator(other.get_id()), span)?;
            }
        }
    }
    if keys.is_empty() {
        return Ok(Union::mixed());
    }
    record_yield(analyzer, combine_many(&keys), combine_many(&values));
    Ok(combine_many(&returns))
}

/// `clone $x`
pub fn analyze_clone(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    span: Span,
    inner: &Expr,
) -> AnalysisResult<Union> {
    let ty = analyze_expr(analyzer, context, inner)?;
    if let Some(atomic) = ty
        .atomics()
        .find(|atomic| !atomic.is_object_type() && !matches!(atomic, Atomic::Mixed | Atomic::GenericParam { .. }))
    {
        analyzer.report(IssueKind::InvalidClone(atomic.get_id()), span)?;
    }
    Ok(ty)
}

#[cfg(test)]
mod tests {
    use sable_ast::AstBuilder;

    use crate::typeck::test_utils::check;

    #[test]
    fn ternaries_merge_both_sides() {
        let b = AstBuilder::new();
        let f = b
            .function("f")
            .with_param(b.param("s").typed("?string"))
            .with_body(vec![
                b.assign_stmt(
                    b.var("len"),
                    b.ternary(
                        b.not_identical(b.var("s"), b.null()),
                        Some(b.call("strlen", vec![b.var("s")])),
                        b.bool(false),
                    ),
                ),
                b.assign_stmt(b.var("name"), b.ternary(b.var("s"), None, b.string("anon"))),
            ]);
        let checked = check(&[b.function_stmt(f)]);
        assert!(checked.issues().is_empty(), "{:?}", checked.issues());
        assert_eq!(checked.type_in("f", "$len").as_deref(), Some("int|false"));
        assert_eq!(checked.type_in("f", "$name").as_deref(), Some("string"));
    }

    #[test]
    fn clone_keeps_the_type() {
        let b = AstBuilder::new();
        let checked = check(&[
            b.assign_stmt(b.var("o"), b.new_named("stdClass", vec![])),
            b.assign_stmt(b.var("copy"), b.clone_(b.var("o"))),
            b.expr_stmt(b.clone_(b.int(1))),
        ]);
        assert_eq!(checked.type_of("$copy").as_deref(), Some("stdClass"));
        assert_eq!(checked.issues(), vec!["InvalidClone"]);
    }
}

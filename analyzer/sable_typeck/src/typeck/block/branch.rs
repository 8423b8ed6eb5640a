//! for if statements and other conditional branches

use std::collections::HashSet;

use sable_ast::{
    expr::Expr,
    stmt::{ElseIf, Stmt},
};
use sable_utils::span::Span;

use super::{analyze_stmts, can_fall_through};
use crate::typeck::{
    algebra::{get_truths_from_formula, negate_formula, reconcile_keyed_types, simplify_cnf, Clause},
    analyzer::{AnalysisResult, Analyzer},
    context::Context,
    expr::analyze_expr,
};

/// A fork of `context` in which `clauses` also hold, with every variable
/// they constrain narrowed
///
/// Only the facts the new clauses add are applied; facts already known in
/// `context` were applied when they were learned. With `report_issues`,
/// conditions that always or never hold are reported.
///
/// # Errors
/// Errors when a hard-stop diagnostic is reported.
pub fn narrow_by_clauses(
    analyzer: &mut Analyzer<'_>,
    context: &Context,
    clauses: &[Clause],
    span: Span,
    report_issues: bool,
) -> AnalysisResult<Context> {
    let mut narrowed = context.fork();
    let mut all_clauses = context.clauses.clone();
    all_clauses.extend(clauses.iter().cloned());
    narrowed.clauses = simplify_cnf(&all_clauses);

    let known = context.clauses.iter().map(Clause::hash).collect::<HashSet<_>>();
    let new_clauses = narrowed
        .clauses
        .iter()
        .filter(|clause| !known.contains(clause.hash()))
        .cloned()
        .collect::<Vec<_>>();
    let truths = get_truths_from_formula(&new_clauses);

    let issues = reconcile_keyed_types(
        analyzer.codebase,
        &truths,
        &mut narrowed,
        span,
        report_issues,
    );
    analyzer.report_all(issues)?;
    Ok(narrowed)
}

/// Check a condition in `context`, then derive the contexts in which it is
/// truthy and falsy
///
/// Assignments made by the condition itself land in `context` and so in
/// both results.
///
/// # Errors
/// Errors when a hard-stop diagnostic is reported.
pub fn analyze_condition(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    cond: &Expr,
) -> AnalysisResult<(Context, Context)> {
    analyze_expr(analyzer, context, cond)?;

    let clauses = analyzer.formula_builder(context).get_formula(cond);
    let negated = negate_formula(&clauses, cond.id.0);
    let if_true = narrow_by_clauses(analyzer, context, &clauses, cond.span(), true)?;
    let if_false = narrow_by_clauses(analyzer, context, &negated, cond.span(), false)?;
    Ok((if_true, if_false))
}

/// `if (cond) { } elseif (cond) { } else { }`
///
/// Every arm runs in a fork narrowed by its condition, and every earlier
/// condition negated. The arms that can fall through are merged. When none
/// can, `context` is left alone: the code after the `if` is unreachable.
pub fn analyze_if(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    cond: &Expr,
    then: &[Stmt],
    elseifs: &[ElseIf],
    else_: Option<&[Stmt]>,
) -> AnalysisResult {
    let mut exits = vec![];

    let (mut then_context, mut else_context) = analyze_condition(analyzer, context, cond)?;
    analyze_stmts(analyzer, &mut then_context, then)?;
    if can_fall_through(then) {
        exits.push(then_context);
    }

    for elseif in elseifs {
        let (mut arm_context, rest) = analyze_condition(analyzer, &mut else_context, &elseif.cond)?;
        analyze_stmts(analyzer, &mut arm_context, &elseif.body)?;
        if can_fall_through(&elseif.body) {
            exits.push(arm_context);
        }
        else_context = rest;
    }

    match else_ {
        Some(body) => {
            analyze_stmts(analyzer, &mut else_context, body)?;
            if can_fall_through(body) {
                exits.push(else_context);
            }
        }
        None => exits.push(else_context),
    }

    if !exits.is_empty() {
        *context = Context::merge_branches(context, &exits.iter().collect::<Vec<_>>());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use sable_ast::{expr::ClassRef, AstBuilder};
    use sable_diagnostics::IssueBuffer;

    use super::*;
    use crate::{
        codebase::{scan_stmts, Codebase},
        config::AnalysisConfig,
        types::{Atomic, Union},
    };

    fn run(context: &mut Context, stmts: &[Stmt]) -> Vec<&'static str> {
        let mut codebase = Codebase::new();
        let config = AnalysisConfig::default();
        let mut buffer = IssueBuffer::new().with_hard_stop_on_error(false);
        scan_stmts(stmts, "test.php", &mut codebase, &config, &mut buffer);
        let mut analyzer = Analyzer::new(&codebase, &config, "test.php", &mut buffer);
        analyze_stmts(&mut analyzer, context, stmts).expect("no hard stops");
        drop(analyzer);
        buffer.names()
    }

    fn type_of(context: &Context, var_id: &str) -> String {
        context
            .get(var_id)
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    #[test]
    fn branches_merge_their_assignments() {
        let b = AstBuilder::new();
        let mut context = Context::new(None);
        context.set("$c", Union::bool());
        let stmts = vec![b.if_(
            b.var("c"),
            vec![b.assign_stmt(b.var("x"), b.int(1))],
            Some(vec![b.assign_stmt(b.var("x"), b.string("a"))]),
        )];
        assert!(run(&mut context, &stmts).is_empty());
        assert_eq!(type_of(&context, "$x"), "int(1)|string(a)");
        assert!(!context.get("$x").is_some_and(|ty| ty.possibly_undefined));
    }

    #[test]
    fn literals_of_one_type_stay_apart_after_merging() {
        let b = AstBuilder::new();
        let mut context = Context::new(None);
        context.set("$c", Union::bool());
        let stmts = vec![b.if_(
            b.var("c"),
            vec![b.assign_stmt(b.var("x"), b.string("a"))],
            Some(vec![b.assign_stmt(b.var("x"), b.string("b"))]),
        )];
        assert!(run(&mut context, &stmts).is_empty());
        assert_eq!(type_of(&context, "$x"), "string(a)|string(b)");
    }

    #[test]
    fn identity_disjunctions_narrow_to_their_literals() {
        let b = AstBuilder::new();
        let mut context = Context::new(None);
        context.set("$k", Union::string());
        let stmts = vec![b.if_(
            b.or(
                b.identical(b.var("k"), b.string("a")),
                b.identical(b.var("k"), b.string("b")),
            ),
            vec![b.assign_stmt(b.var("r"), b.var("k"))],
            None,
        )];
        assert!(run(&mut context, &stmts).is_empty());
        assert_eq!(type_of(&context, "$r"), "string(a)|string(b)");
        assert_eq!(type_of(&context, "$k"), "string");
    }

    #[test]
    fn early_return_keeps_the_negated_condition() {
        let b = AstBuilder::new();
        let mut context = Context::new(None);
        context.set("$a", Union::new(vec![Atomic::named("Foo"), Atomic::Null]));
        let stmts = vec![b.if_(b.identical(b.var("a"), b.null()), vec![b.ret(None)], None)];
        run(&mut context, &stmts);
        assert_eq!(type_of(&context, "$a"), "Foo");
    }

    #[test]
    fn elseif_arms_see_earlier_conditions_negated() {
        let b = AstBuilder::new();
        let mut context = Context::new(None);
        context.set(
            "$a",
            Union::new(vec![Atomic::Int, Atomic::String, Atomic::Null]),
        );
        let stmts = vec![b.if_elseif(
            b.call("is_int", vec![b.var("a")]),
            vec![b.assign_stmt(b.var("r"), b.var("a"))],
            vec![(
                b.call("is_string", vec![b.var("a")]),
                vec![b.assign_stmt(b.var("s"), b.var("a"))],
            )],
            Some(vec![b.assign_stmt(b.var("n"), b.var("a"))]),
        )];
        assert!(run(&mut context, &stmts).is_empty());
        assert_eq!(type_of(&context, "$r"), "int");
        assert_eq!(type_of(&context, "$s"), "string");
        assert_eq!(type_of(&context, "$n"), "null");
        assert!(context.get("$n").is_some_and(|ty| ty.possibly_undefined));
    }

    #[test]
    fn impossible_conditions_are_reported() {
        let b = AstBuilder::new();
        let mut context = Context::new(None);
        context.set("$a", Union::int());
        let stmts = vec![
            b.class_stmt(b.class("Foo")),
            b.if_(
                b.instance_of(b.var("a"), ClassRef::Named("Foo".to_string())),
                vec![],
                None,
            ),
        ];
        assert_eq!(run(&mut context, &stmts), vec!["TypeDoesNotContainType"]);
    }
}

//! for `while`, `do`/`while`, `for` and `foreach` loops
//!
//! A loop body is walked with reporting muted until the types at the top of
//! the loop stop changing, then once more for real. The state at the top of
//! an iteration is the join of the state before the loop and the state at
//! every back edge (falling off the end of the body, or `continue`).

use sable_ast::{
    expr::{Expr, ExprKind},
    stmt::Stmt,
};
use sable_diagnostics::IssueKind;
use sable_utils::span::Span;
use tracing::{debug, debug_span};

use super::{analyze_condition, analyze_stmts, can_fall_through};
use crate::{
    typeck::{
        analyzer::{AnalysisResult, Analyzer, BreakScope, BreakTarget},
        context::Context,
        expr::{analyze_expr, assign_to_target},
    },
    types::{combine, combine_many, template::get_ancestor_type_params, Atomic, Union},
};

/// How many muted passes a loop gets before the changing variables are
/// widened
const MAX_ITERATIONS: usize = 10;

/// How control enters each iteration, and how it leaves the loop normally
enum LoopEntry<'a> {
    /// `while` and `for`: conditions checked before every iteration. Only
    /// the last one decides; none at all loops forever.
    Conditions(&'a [Expr]),
    /// `do`/`while`: the condition is checked after every iteration
    PostCondition(&'a Expr),
    /// `foreach`: the key and value are bound before every iteration, and
    /// the loop may end before any
    Foreach {
        /// The key target, if any
        key: Option<&'a Expr>,
        /// The value target
        value: &'a Expr,
        /// What the key target is assigned
        key_type: Union,
        /// What the value target is assigned
        value_type: Union,
        /// `foreach ($a as &$v)`
        by_ref: bool,
    },
}

/// The contexts one iteration produced
struct Iteration {
    /// The state when the loop ends normally
    exit: Option<Context>,
    /// The state when control returns to the top of the loop
    back_edge: Option<Context>,
    /// The state at every `break` out of the loop
    breaks: Vec<Context>,
}

/// `while (cond) { body }`
pub fn analyze_while(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    cond: &Expr,
    body: &[Stmt],
) -> AnalysisResult {
    analyze_loop(
        analyzer,
        context,
        &LoopEntry::Conditions(std::slice::from_ref(cond)),
        &[],
        body,
        cond.span(),
    )
}

/// `do { body } while (cond);`
pub fn analyze_do_while(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    body: &[Stmt],
    cond: &Expr,
) -> AnalysisResult {
    analyze_loop(
        analyzer,
        context,
        &LoopEntry::PostCondition(cond),
        &[],
        body,
        cond.span(),
    )
}

/// `for (init; cond; step) { body }`
pub fn analyze_for(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    init: &[Expr],
    cond: &[Expr],
    step: &[Expr],
    body: &[Stmt],
) -> AnalysisResult {
    for expr in init {
        analyze_expr(analyzer, context, expr)?;
    }
    let span = cond
        .iter()
        .chain(init)
        .map(Expr::span)
        .next()
        .unwrap_or_else(|| Span::from_positions(0, 0));
    analyze_loop(
        analyzer,
        context,
        &LoopEntry::Conditions(cond),
        step,
        body,
        span,
    )
}

/// `foreach (iterable as key => value) { body }`
pub fn analyze_foreach(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    iterable: &Expr,
    key: Option<&Expr>,
    value: &Expr,
    by_ref: bool,
    body: &[Stmt],
) -> AnalysisResult {
    let iterable_type = analyze_expr(analyzer, context, iterable)?;
    let (key_type, value_type) = iteration_types(analyzer, &iterable_type, iterable.span())?;
    analyze_loop(
        analyzer,
        context,
        &LoopEntry::Foreach {
            key,
            value,
            key_type,
            value_type,
            by_ref,
        },
        &[],
        body,
        iterable.span(),
    )
}

/// The key and value types of iterating over `iterable_type`
fn iteration_types(
    analyzer: &mut Analyzer<'_>,
    iterable_type: &Union,
    span: Span,
) -> AnalysisResult<(Union, Union)> {
    if iterable_type.is_null() {
        analyzer.report(IssueKind::NullIterator, span)?;
        return Ok((Union::mixed(), Union::mixed()));
    }
    if iterable_type.is_nullable() && !iterable_type.ignore_nullable_issues {
        analyzer.report(
            IssueKind::PossiblyNullIterator(iterable_type.to_string()),
            span,
        )?;
    }

    let mut keys = vec![];
    let mut values = vec![];
    let mut invalid = vec![];
    for atomic in iterable_type.atomics() {
        match atomic {
            Atomic::Null | Atomic::Empty => {}
            Atomic::Array { key, value, .. } => {
                keys.push((**key).clone());
                values.push((**value).clone());
            }
            Atomic::ObjectShape { properties, sealed } => {
                for (key, value) in properties {
                    keys.push(Union::from(key.to_atomic()));
                    values.push(value.clone().possibly_undefined(false));
                }
                if !sealed {
                    keys.push(Union::from(Atomic::ArrayKey));
                    values.push(Union::mixed());
                }
            }
            Atomic::NamedObject { .. } => {
                match get_ancestor_type_params(analyzer.codebase, atomic, "Traversable") {
                    Some(params) if params.len() >= 2 => {
                        keys.push(params[0].clone());
                        values.push(params[1].clone());
                    }
                    _ => {
                        keys.push(Union::mixed());
                        values.push(Union::mixed());
                    }
                }
            }
            Atomic::Mixed | Atomic::Object | Atomic::GenericParam { .. } => {
                keys.push(Union::mixed());
                values.push(Union::mixed());
            }
            other => invalid.push(other.get_id()),
        }
    }

    if !invalid.is_empty() {
        analyzer.report(IssueKind::InvalidIterator(invalid.join("|")), span)?;
    }
    if keys.is_empty() {
        return Ok((Union::mixed(), Union::mixed()));
    }
    Ok((combine_many(&keys), combine_many(&values)))
}

/// Find the state at the top of the loop, check the body in it, then
/// continue in the merge of every way out of the loop
fn analyze_loop(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    entry: &LoopEntry<'_>,
    steps: &[Expr],
    body: &[Stmt],
    span: Span,
) -> AnalysisResult {
    let _span = debug_span!("loop", line = span.line()).entered();

    let mut loop_start = context.clone();
    let mut iterations = 0;
    loop {
        iterations += 1;
        let iteration =
            analyzer.muted(|analyzer| run_iteration(analyzer, &loop_start, entry, steps, body))?;
        let Some(back_edge) = iteration.back_edge else {
            break;
        };
        let next = join_back_edge(&loop_start, &back_edge);
        if !next.differs_from(&loop_start) {
            break;
        }
        if iterations >= MAX_ITERATIONS {
            loop_start = widen_changed(&loop_start, next);
            break;
        }
        loop_start = next;
    }
    debug!(iterations, "loop types settled");

    let iteration = run_iteration(analyzer, &loop_start, entry, steps, body)?;
    let mut exits = iteration.breaks;
    exits.extend(iteration.exit);
    if !exits.is_empty() {
        *context = Context::merge_branches(context, &exits.iter().collect::<Vec<_>>());
    }
    Ok(())
}

/// Check one iteration starting from `start`
fn run_iteration(
    analyzer: &mut Analyzer<'_>,
    start: &Context,
    entry: &LoopEntry<'_>,
    steps: &[Expr],
    body: &[Stmt],
) -> AnalysisResult<Iteration> {
    let mut body_context = start.clone();
    body_context.assigned_var_ids.clear();
    body_context.inside_loop = true;
    let mut exit = None;

    match entry {
        LoopEntry::Conditions(conds) => {
            if let Some((last, rest)) = conds.split_last() {
                for cond in rest {
                    analyze_expr(analyzer, &mut body_context, cond)?;
                }
                let (if_true, if_false) = analyze_condition(analyzer, &mut body_context, last)?;
                if !is_literally_true(last) {
                    exit = Some(if_false);
                }
                body_context = if_true;
            }
        }
        LoopEntry::PostCondition(_) => {}
        LoopEntry::Foreach {
            key,
            value,
            key_type,
            value_type,
            by_ref,
        } => {
            exit = Some(start.clone());
            if let Some(key) = key {
                assign_to_target(analyzer, &mut body_context, key, key_type)?;
            }
            let mut value_type = value_type.clone();
            value_type.by_ref = *by_ref;
            assign_to_target(analyzer, &mut body_context, value, &value_type)?;
        }
    }

    analyzer.break_scopes.push(BreakScope::new(BreakTarget::Loop));
    let result = analyze_stmts(analyzer, &mut body_context, body);
    let scope = analyzer
        .break_scopes
        .pop()
        .expect("the loop's break scope was pushed above");
    result?;

    let mut tails = scope.continue_contexts.iter().collect::<Vec<_>>();
    if can_fall_through(body) {
        tails.push(&body_context);
    }
    let mut back_edge = if tails.is_empty() {
        None
    } else {
        Some(Context::merge_branches(start, &tails))
    };

    if let Some(back_edge_context) = &mut back_edge {
        for step in steps {
            analyze_expr(analyzer, back_edge_context, step)?;
        }
    }

    if let LoopEntry::PostCondition(cond) = entry {
        if let Some(mut back_edge_context) = back_edge.take() {
            let (if_true, if_false) = analyze_condition(analyzer, &mut back_edge_context, cond)?;
            if !is_literally_true(cond) {
                exit = Some(if_false);
            }
            back_edge = Some(if_true);
        }
    }

    Ok(Iteration {
        exit,
        back_edge,
        breaks: scope.break_contexts,
    })
}

/// The state at the top of the loop once `back_edge` may also reach it
///
/// Variables first bound in the body are possibly undefined at the top.
/// Keyed entries are kept only where both states have them, and clauses
/// about anything the body assigned no longer hold.
fn join_back_edge(start: &Context, back_edge: &Context) -> Context {
    let mut joined = start.clone();

    for (var_id, ty) in &back_edge.vars_in_scope {
        match start.get(var_id) {
            Some(existing) if existing == ty => {}
            Some(existing) => {
                joined
                    .vars_in_scope
                    .insert(var_id.clone(), combine(existing, ty));
            }
            None if is_keyed(var_id) => {}
            None => {
                joined
                    .vars_in_scope
                    .insert(var_id.clone(), ty.clone().possibly_undefined(true));
            }
        }
    }
    joined.vars_in_scope.retain(|var_id, ty| {
        if back_edge.has_variable(var_id) {
            return true;
        }
        ty.possibly_undefined = true;
        !is_keyed(var_id)
    });

    joined
        .vars_possibly_in_scope
        .extend(back_edge.vars_possibly_in_scope.iter().cloned());
    joined.clauses.retain(|clause| {
        !back_edge
            .assigned_var_ids
            .iter()
            .any(|var_id| clause.mentions(var_id, true))
    });
    joined
}

/// `next`, with every variable still changing since `previous` widened to
/// its non-literal type
fn widen_changed(previous: &Context, mut next: Context) -> Context {
    for (var_id, ty) in &mut next.vars_in_scope {
        if previous.get(var_id) != Some(ty) {
            *ty = ty.generalize_literals();
        }
    }
    next
}

/// Whether `var_id` is a keyed location rather than a plain variable
fn is_keyed(var_id: &str) -> bool {
    var_id.contains('[') || var_id.contains("->") || var_id.contains("::")
}

/// `true`, which never lets a loop end through its condition
const fn is_literally_true(cond: &Expr) -> bool {
    matches!(cond.kind(), ExprKind::Bool(true))
}

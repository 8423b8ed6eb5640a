//! for `switch` statements

use sable_ast::{
    expr::{Expr, ExprKind},
    stmt::SwitchCase,
};

use super::{analyze_stmts, can_fall_through, narrow_by_clauses};
use crate::{
    typeck::{
        algebra::{Assertion, Clause},
        analyzer::{AnalysisResult, Analyzer, BreakScope, BreakTarget},
        context::Context,
        expr::analyze_expr,
        var_id::get_var_id,
    },
    types::{Atomic, Union},
};

/// `switch (subject) { case ...: ... default: ... }`
///
/// Each case body starts from the state before the switch, narrowed to the
/// case's value when that is a literal comparable with the subject, and
/// merged with the state falling through from the case before it. Without a
/// `default`, the switch may also match nothing.
pub fn analyze_switch(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    subject: &Expr,
    cases: &[SwitchCase],
) -> AnalysisResult {
    let subject_type = analyze_expr(analyzer, context, subject)?;
    let subject_id = get_var_id(
        subject,
        context.self_class.as_deref(),
        analyzer.config.memoize_method_calls,
    );
    let literals = cases
        .iter()
        .map(|case| {
            case.test
                .as_ref()
                .and_then(|test| case_literal(test, &subject_type))
        })
        .collect::<Vec<_>>();
    let no_match = subject_id
        .as_ref()
        .map(|var_id| {
            literals
                .iter()
                .flatten()
                .map(|literal| Clause::single(var_id, Assertion::IsNotIdentical(literal.clone())))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let pre = context.clone();
    analyzer.break_scopes.push(BreakScope::new(BreakTarget::Switch));
    let result = analyze_cases(
        analyzer,
        &pre,
        subject,
        subject_id.as_deref(),
        cases,
        &literals,
        &no_match,
    );
    let scope = analyzer
        .break_scopes
        .pop()
        .expect("the switch's break scope was pushed above");
    let fallthrough = result?;

    let mut exits = scope.break_contexts;
    exits.extend(scope.continue_contexts);
    exits.extend(fallthrough);
    if !cases.iter().any(|case| case.test.is_none()) {
        exits.push(narrow_by_clauses(
            analyzer,
            &pre,
            &no_match,
            subject.span(),
            false,
        )?);
    }

    if !exits.is_empty() {
        *context = Context::merge_branches(&pre, &exits.iter().collect::<Vec<_>>());
    }
    Ok(())
}

/// Check every case in order, returning the state falling out of the last
fn analyze_cases(
    analyzer: &mut Analyzer<'_>,
    pre: &Context,
    subject: &Expr,
    subject_id: Option<&str>,
    cases: &[SwitchCase],
    literals: &[Option<Atomic>],
    no_match: &[Clause],
) -> AnalysisResult<Option<Context>> {
    let mut fallthrough: Option<Context> = None;

    for (case, literal) in cases.iter().zip(literals) {
        let mut case_context = match &case.test {
            Some(test) => {
                let mut tested = pre.fork();
                analyze_expr(analyzer, &mut tested, test)?;
                match (subject_id, literal) {
                    (Some(var_id), Some(literal)) => narrow_by_clauses(
                        analyzer,
                        &tested,
                        &[Clause::single(var_id, Assertion::IsIdentical(literal.clone()))],
                        test.span(),
                        false,
                    )?,
                    _ => tested,
                }
            }
            None => narrow_by_clauses(analyzer, pre, no_match, subject.span(), false)?,
        };

        if let Some(previous) = fallthrough.take() {
            case_context = Context::merge_branches(pre, &[&case_context, &previous]);
        }
        analyze_stmts(analyzer, &mut case_context, &case.body)?;
        if can_fall_through(&case.body) {
            fallthrough = Some(case_context);
        }
    }

    Ok(fallthrough)
}

/// The literal a case compares against, when matching it loosely is the
/// same as matching it exactly: the subject holds only values of the same
/// kind
fn case_literal(test: &Expr, subject_type: &Union) -> Option<Atomic> {
    match test.kind() {
        ExprKind::Int(n) if subject_type.atomics().all(Atomic::is_int) => {
            Some(Atomic::LiteralInt(*n))
        }
        ExprKind::String(s) if subject_type.atomics().all(Atomic::is_string) => {
            Some(Atomic::LiteralString(s.clone()))
        }
        _ => None,
    }
}

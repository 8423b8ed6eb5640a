//! for statements and the control flow between them

mod branch;
mod final_actions;
mod loops;
mod switch_case;
mod try_catch;

pub use branch::{analyze_condition, narrow_by_clauses};
pub use final_actions::can_fall_through;
use sable_ast::{
    expr::{Expr, ExprKind},
    stmt::{Stmt, StmtKind},
};
use sable_diagnostics::IssueKind;
use sable_utils::names::is_superglobal;

use super::{
    analyzer::{AnalysisResult, Analyzer, BreakTarget},
    context::Context,
    expr::{analyze_expr, superglobal_type},
    function::{analyze_class, analyze_function_decl},
    return_type::analyze_return,
    var_id::get_var_id,
};
use crate::types::{Atomic, ShapeKey, Union};

/// Type check a list of statements in `context`
///
/// Statements after one that cannot fall through are unreachable: the first
/// of them is reported as `UnevaluatedCode` and none are checked. Function
/// and class declarations are hoisted, so they are still checked.
///
/// # Errors
/// Errors when a hard-stop diagnostic is reported.
pub fn analyze_stmts(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    stmts: &[Stmt],
) -> AnalysisResult {
    let mut terminated = false;
    for stmt in stmts {
        let is_declaration = matches!(
            stmt.kind(),
            StmtKind::Function(_) | StmtKind::Class(_) | StmtKind::Nop
        );
        if terminated {
            if is_declaration {
                analyze_stmt(analyzer, context, stmt)?;
                continue;
            }
            analyzer.report(IssueKind::UnevaluatedCode, stmt.span())?;
            break;
        }
        analyze_stmt(analyzer, context, stmt)?;
        terminated = !can_fall_through(std::slice::from_ref(stmt));
    }
    Ok(())
}

/// Type check one statement
fn analyze_stmt(analyzer: &mut Analyzer<'_>, context: &mut Context, stmt: &Stmt) -> AnalysisResult {
    match stmt.kind() {
        StmtKind::Expr(expr) => {
            analyze_expr(analyzer, context, expr)?;
        }
        StmtKind::Echo(exprs) => {
            for expr in exprs {
                analyze_expr(analyzer, context, expr)?;
            }
        }
        StmtKind::Return(value) => analyze_return(analyzer, context, value.as_ref(), stmt.span())?,
        StmtKind::Throw(expr) => {
            analyze_expr(analyzer, context, expr)?;
        }
        StmtKind::If {
            cond,
            then,
            elseifs,
            else_,
        } => branch::analyze_if(analyzer, context, cond, then, elseifs, else_.as_deref())?,
        StmtKind::While(cond, body) => loops::analyze_while(analyzer, context, cond, body)?,
        StmtKind::DoWhile(body, cond) => loops::analyze_do_while(analyzer, context, body, cond)?,
        StmtKind::For {
            init,
            cond,
            step,
            body,
        } => loops::analyze_for(analyzer, context, init, cond, step, body)?,
        StmtKind::Foreach {
            iterable,
            key,
            value,
            by_ref,
            body,
        } => loops::analyze_foreach(analyzer, context, iterable, key.as_ref(), value, *by_ref, body)?,
        StmtKind::Switch(subject, cases) => {
            switch_case::analyze_switch(analyzer, context, subject, cases)?;
        }
        StmtKind::Break(levels) => record_jump(analyzer, context, *levels, false),
        StmtKind::Continue(levels) => record_jump(analyzer, context, *levels, true),
        StmtKind::TryCatch {
            body,
            catches,
            finally,
        } => try_catch::analyze_try(analyzer, context, body, catches, finally.as_deref())?,
        StmtKind::Block(body) => analyze_stmts(analyzer, context, body)?,
        StmtKind::Unset(exprs) => {
            for expr in exprs {
                analyze_unset(analyzer, context, expr)?;
            }
        }
        StmtKind::Global(names) => {
            for name in names {
                let var_id = format!("${}", name.value());
                let ty = if is_superglobal(name.value()) {
                    superglobal_type(name.value())
                } else {
                    Union::mixed()
                };
                context.set(&var_id, ty);
            }
        }
        StmtKind::Static(vars) => {
            for var in vars {
                if let Some(default) = &var.default {
                    analyze_expr(analyzer, context, default)?;
                }
                context.set(&format!("${}", var.name.value()), Union::mixed());
            }
        }
        StmtKind::Const(constants) => {
            for (_, value) in constants {
                analyze_expr(analyzer, context, value)?;
            }
        }
        StmtKind::Function(decl) => analyze_function_decl(analyzer, decl),
        StmtKind::Class(decl) => analyze_class(analyzer, decl),
        StmtKind::Nop => {}
    }
    Ok(())
}

/// Hand the current state to the loop or switch a `break` or `continue`
/// leaves. A `continue` that targets a switch acts as a `break`.
fn record_jump(analyzer: &mut Analyzer<'_>, context: &Context, levels: usize, is_continue: bool) {
    let depth = analyzer.break_scopes.len();
    if levels == 0 || levels > depth {
        return;
    }
    let scope = &mut analyzer.break_scopes[depth - levels];
    if is_continue && scope.target == BreakTarget::Loop {
        scope.continue_contexts.push(context.clone());
    } else {
        scope.break_contexts.push(context.clone());
    }
}

/// `unset($x)`, `unset($a['k'])`, `unset($o->p)`
fn analyze_unset(analyzer: &mut Analyzer<'_>, context: &mut Context, expr: &Expr) -> AnalysisResult {
    let var_id = get_var_id(
        expr,
        context.self_class.as_deref(),
        analyzer.config.memoize_method_calls,
    );

    if let ExprKind::ArrayDimFetch(base, Some(dim)) = expr.kind() {
        let was_inside_isset = context.inside_isset;
        context.inside_isset = true;
        let base_type = analyze_expr(analyzer, context, base);
        let dim_type = base_type.and_then(|_| analyze_expr(analyzer, context, dim));
        context.inside_isset = was_inside_isset;
        let dim_type = dim_type?;

        let base_id = get_var_id(
            base,
            context.self_class.as_deref(),
            analyzer.config.memoize_method_calls,
        );
        let key = dim_type
            .get_single_literal_int()
            .map(ShapeKey::Int)
            .or_else(|| dim_type.get_single_literal_string().map(ShapeKey::from_string));
        if let (Some(base_id), Some(key)) = (base_id, key) {
            if let Some(base_type) = context.get(&base_id).cloned() {
                let mut changed = false;
                let atomics = base_type
                    .atomics()
                    .cloned()
                    .map(|atomic| match atomic {
                        Atomic::ObjectShape {
                            mut properties,
                            sealed,
                        } => {
                            changed |= properties.shift_remove(&key).is_some();
                            Atomic::ObjectShape { properties, sealed }
                        }
                        other => other,
                    })
                    .collect();
                if changed {
                    context.narrow(&base_id, Union::new(atomics).with_flags_of(&base_type));
                }
            }
        }
    } else if var_id.is_none() {
        analyze_expr(analyzer, context, expr)?;
    }

    if let Some(var_id) = var_id {
        context.remove(&var_id);
    }
    Ok(())
}

//! How a statement list can end

use std::collections::BTreeSet;

use sable_ast::{
    expr::{Expr, ExprKind},
    stmt::{Stmt, StmtKind},
};

/// One way control can leave a statement list
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ControlAction {
    /// Falls through to the next statement
    End,
    /// Returns from the function
    Return,
    /// Throws, or exits the script
    Throw,
    /// Breaks out of a loop or switch
    Break,
    /// Continues a loop
    Continue,
}

/// Every way control can leave `stmts`
///
/// A list ends only through its first statement that cannot fall through;
/// anything after it is unreachable and ignored.
#[must_use]
pub fn get_final_actions(stmts: &[Stmt]) -> BTreeSet<ControlAction> {
    let mut actions = BTreeSet::new();
    for stmt in stmts {
        let stmt_actions = get_stmt_actions(stmt);
        let falls_through = stmt_actions.contains(&ControlAction::End);
        actions.extend(
            stmt_actions
                .into_iter()
                .filter(|action| *action != ControlAction::End),
        );
        if !falls_through {
            return actions;
        }
    }
    actions.insert(ControlAction::End);
    actions
}

/// Whether control can reach the end of `stmts`
#[must_use]
pub fn can_fall_through(stmts: &[Stmt]) -> bool {
    get_final_actions(stmts).contains(&ControlAction::End)
}

/// `exit` and `die` stop everything, like an uncaught throw
fn is_exit(expr: &Expr) -> bool {
    match expr.kind() {
        ExprKind::Exit(_) => true,
        ExprKind::ErrorSuppress(inner) => is_exit(inner),
        _ => false,
    }
}

/// Whether a loop condition is the literal `true`, or absent
fn is_always_true(cond: Option<&Expr>) -> bool {
    cond.map_or(true, |cond| matches!(cond.kind(), ExprKind::Bool(true)))
}

/// The actions of a loop body as seen from outside the loop: `break` and
/// `continue` stay inside it
fn loop_actions(body: &[Stmt], always_enters: bool, infinite: bool) -> BTreeSet<ControlAction> {
    let body_actions = get_final_actions(body);
    let has = |action| body_actions.contains(&action);
    let may_exit_normally = if infinite {
        has(ControlAction::Break)
    } else if always_enters {
        has(ControlAction::Break) || has(ControlAction::End) || has(ControlAction::Continue)
    } else {
        true
    };

    let mut actions = body_actions
        .iter()
        .copied()
        .filter(|action| matches!(action, ControlAction::Return | ControlAction::Throw))
        .collect::<BTreeSet<_>>();
    if may_exit_normally {
        actions.insert(ControlAction::End);
    }
    actions
}

/// Every way control can leave one statement
fn get_stmt_actions(stmt: &Stmt) -> BTreeSet<ControlAction> {
    match stmt.kind() {
        StmtKind::Return(_) => BTreeSet::from([ControlAction::Return]),
        StmtKind::Throw(_) => BTreeSet::from([ControlAction::Throw]),
        StmtKind::Expr(expr) if is_exit(expr) => BTreeSet::from([ControlAction::Throw]),
        StmtKind::Break(_) => BTreeSet::from([ControlAction::Break]),
        StmtKind::Continue(_) => BTreeSet::from([ControlAction::Continue]),
        StmtKind::Block(body) => get_final_actions(body),
        StmtKind::If {
            then,
            elseifs,
            else_,
            ..
        } => {
            let mut actions = get_final_actions(then);
            for elseif in elseifs {
                actions.extend(get_final_actions(&elseif.body));
            }
            match else_ {
                Some(else_) => actions.extend(get_final_actions(else_)),
                None => {
                    actions.insert(ControlAction::End);
                }
            }
            actions
        }
        StmtKind::While(cond, body) => loop_actions(body, false, is_always_true(Some(cond))),
        StmtKind::DoWhile(body, cond) => loop_actions(body, true, is_always_true(Some(cond))),
        StmtKind::For { cond, body, .. } => {
            loop_actions(body, false, cond.is_empty() || is_always_true(cond.last()))
        }
        StmtKind::Foreach { body, .. } => loop_actions(body, false, false),
        StmtKind::Switch(_, cases) => {
            let mut actions = BTreeSet::new();
            let has_default = cases.iter().any(|case| case.test.is_none());
            let mut last_falls_through = cases.is_empty();
            for case in cases {
                let case_actions = get_final_actions(&case.body);
                last_falls_through = case_actions.contains(&ControlAction::End);
                for action in case_actions {
                    match action {
                        ControlAction::Break | ControlAction::Continue => {
                            actions.insert(ControlAction::End);
                        }
                        ControlAction::End => {}
                        other => {
                            actions.insert(other);
                        }
                    }
                }
            }
            if last_falls_through || !has_default {
                actions.insert(ControlAction::End);
            }
            actions
        }
        StmtKind::TryCatch {
            body,
            catches,
            finally,
        } => {
            if let Some(finally) = finally {
                let finally_actions = get_final_actions(finally);
                if !finally_actions.contains(&ControlAction::End) {
                    return finally_actions;
                }
            }
            let mut actions = get_final_actions(body);
            for catch in catches {
                actions.extend(get_final_actions(&catch.body));
            }
            actions
        }
        StmtKind::Expr(_)
        | StmtKind::Echo(_)
        | StmtKind::Unset(_)
        | StmtKind::Global(_)
        | StmtKind::Static(_)
        | StmtKind::Const(_)
        | StmtKind::Function(_)
        | StmtKind::Class(_)
        | StmtKind::Nop => BTreeSet::from([ControlAction::End]),
    }
}

#[cfg(test)]
mod tests {
    use sable_ast::AstBuilder;

    use super::*;

    #[test]
    fn straight_line_code_ends() {
        let b = AstBuilder::new();
        let stmts = vec![b.assign_stmt(b.var("a"), b.int(1))];
        assert_eq!(get_final_actions(&stmts), BTreeSet::from([ControlAction::End]));
    }

    #[test]
    fn returns_in_both_branches() {
        let b = AstBuilder::new();
        let stmts = vec![b.if_(
            b.var("a"),
            vec![b.ret(None)],
            Some(vec![b.throw(b.new_named("Exception", vec![]))]),
        )];
        assert_eq!(
            get_final_actions(&stmts),
            BTreeSet::from([ControlAction::Return, ControlAction::Throw])
        );
    }

    #[test]
    fn an_if_without_else_may_fall_through() {
        let b = AstBuilder::new();
        let stmts = vec![b.if_(b.var("a"), vec![b.ret(None)], None)];
        assert!(can_fall_through(&stmts));
    }

    #[test]
    fn infinite_loops_only_end_through_break() {
        let b = AstBuilder::new();
        let forever = vec![b.while_(b.bool(true), vec![b.expr_stmt(b.call("f", vec![]))])];
        assert!(!can_fall_through(&forever));

        let with_break = vec![b.while_(b.bool(true), vec![b.break_()])];
        assert!(can_fall_through(&with_break));

        let conditional = vec![b.while_(b.var("a"), vec![b.ret(None)])];
        assert!(can_fall_through(&conditional));
    }

    #[test]
    fn exit_counts_as_throw() {
        let b = AstBuilder::new();
        let stmts = vec![b.expr_stmt(b.exit(None)), b.ret(None)];
        assert_eq!(get_final_actions(&stmts), BTreeSet::from([ControlAction::Throw]));
    }

    #[test]
    fn switch_needs_a_default_to_be_exhaustive() {
        let b = AstBuilder::new();
        let without_default = vec![b.switch(
            b.var("a"),
            vec![(Some(b.int(1)), vec![b.ret(None)])],
        )];
        assert!(can_fall_through(&without_default));

        let with_default = vec![b.switch(
            b.var("a"),
            vec![
                (Some(b.int(1)), vec![b.ret(None)]),
                (None, vec![b.ret(None)]),
            ],
        )];
        assert_eq!(
            get_final_actions(&with_default),
            BTreeSet::from([ControlAction::Return])
        );
    }

    #[test]
    fn finally_that_returns_wins() {
        let b = AstBuilder::new();
        let stmts = vec![b.try_catch(
            vec![b.expr_stmt(b.call("f", vec![]))],
            vec![b.catch(&["Exception"], Some("e"), vec![])],
            Some(vec![b.ret(None)]),
        )];
        assert_eq!(get_final_actions(&stmts), BTreeSet::from([ControlAction::Return]));
    }
}

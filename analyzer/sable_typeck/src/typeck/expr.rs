//! for expressions

mod access;
mod assignment;
mod binary;
mod call;
mod closure;
mod constant;
mod helpers;
mod literals;
mod misc;
mod property;
mod unary;

pub use assignment::{assign_to_target, check_property_value};
pub use literals::superglobal_type;
use sable_ast::expr::{Expr, ExprKind};

use super::{
    analyzer::{AnalysisResult, Analyzer},
    context::Context,
};
use crate::types::{Atomic, Union};

/// Infer the type of `expr` in `context` and report what is wrong with it
///
/// Assignments the expression makes land in `context`. The inferred type is
/// also recorded against the expression's node id.
///
/// # Errors
/// Errors when a hard-stop diagnostic is reported.
pub fn analyze_expr(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    expr: &Expr,
) -> AnalysisResult<Union> {
    let span = expr.span();
    let ty = match expr.kind() {
        ExprKind::Variable(name) => access::analyze_variable(analyzer, context, span, name)?,
        ExprKind::Int(value) => Atomic::LiteralInt(*value).into(),
        ExprKind::Float(value) => Atomic::LiteralFloat(*value).into(),
        ExprKind::String(value) => Atomic::LiteralString(value.clone()).into(),
        ExprKind::Bool(true) => Union::true_(),
        ExprKind::Bool(false) => Union::false_(),
        ExprKind::Null => Union::null(),
        ExprKind::Interpolated(parts) => literals::analyze_interpolated(analyzer, context, parts)?,
        ExprKind::Array(items) => literals::analyze_array(analyzer, context, items)?,

        ExprKind::ArrayDimFetch(base, dim) => {
            access::analyze_array_fetch(analyzer, context, expr, base, dim.as_deref())?
        }
        ExprKind::PropertyFetch {
            object,
            name,
            nullsafe,
        } => property::analyze_property_fetch(analyzer, context, expr, object, name, *nullsafe)?,
        ExprKind::StaticPropertyFetch(class, name) => {
            property::analyze_static_property_fetch(analyzer, context, expr, class, name)?
        }
        ExprKind::ConstFetch(name) => constant::analyze_const_fetch(analyzer, span, name)?,
        ExprKind::ClassConstFetch(class, name) => {
            constant::analyze_class_const_fetch(analyzer, context, span, class, name)?
        }

        ExprKind::Assignment(op, target, value) => {
            assignment::analyze_assignment(analyzer, context, span, *op, target, value)?
        }
        ExprKind::AssignRef(target, source) => {
            assignment::analyze_assign_ref(analyzer, context, target, source)?
        }

        ExprKind::Arithmetic(op, left, right) => {
            binary::analyze_arithmetic(analyzer, context, span, *op, left, right)?
        }
        ExprKind::Concat(left, right) => binary::analyze_concat(analyzer, context, left, right)?,
        ExprKind::BinaryBitwise(op, left, right) => {
            binary::analyze_bitwise(analyzer, context, span, *op, left, right)?
        }
        ExprKind::Logical(op, left, right) => {
            binary::analyze_logical(analyzer, context, *op, left, right)?
        }
        ExprKind::Equality(_, left, right) => {
            analyze_expr(analyzer, context, left)?;
            analyze_expr(analyzer, context, right)?;
            Union::bool()
        }
        ExprKind::Comparison(op, left, right) => {
            binary::analyze_comparison(analyzer, context, *op, left, right)?
        }
        ExprKind::Coalesce(left, right) => binary::analyze_coalesce(analyzer, context, left, right)?,
        ExprKind::Instanceof(inner, class) => {
            binary::analyze_instanceof(analyzer, context, span, inner, class)?
        }

        ExprKind::UnaryNot(inner) => {
            analyze_expr(analyzer, context, inner)?;
            Union::bool()
        }
        ExprKind::UnaryBitwiseNot(inner) => unary::analyze_bitwise_not(analyzer, context, span, inner)?,
        ExprKind::UnaryMinus(inner) => unary::analyze_sign(analyzer, context, span, inner, -1)?,
        ExprKind::UnaryPlus(inner) => unary::analyze_sign(analyzer, context, span, inner, 1)?,
        ExprKind::IncDec(op, target) => unary::analyze_inc_dec(analyzer, context, span, *op, target)?,
        ExprKind::Cast(kind, inner) => unary::analyze_cast(analyzer, context, span, *kind, inner)?,

        ExprKind::Isset(exprs) => access::analyze_isset(analyzer, context, exprs)?,
        ExprKind::Empty(inner) => access::analyze_empty(analyzer, context, inner)?,
        ExprKind::Ternary(cond, then, else_) => {
            misc::analyze_ternary(analyzer, context, cond, then.as_deref(), else_)?
        }

        ExprKind::FuncCall(callee, args) => {
            call::analyze_function_call(analyzer, context, span, callee, args)?
        }
        ExprKind::MethodCall {
            object,
            name,
            args,
            nullsafe,
        } => call::analyze_method_call(analyzer, context, expr, object, name, args, *nullsafe)?,
        ExprKind::StaticCall(class, name, args) => {
            call::analyze_static_call(analyzer, context, span, class, name, args)?
        }
        ExprKind::New(class, args) => call::analyze_new(analyzer, context, span, class, args)?,
        ExprKind::Closure(closure) => closure::analyze_closure(analyzer, context, span, closure)?,
        ExprKind::ArrowFunction(arrow) => {
            closure::analyze_arrow_function(analyzer, context, span, arrow)?
        }

        ExprKind::Yield { key, value } => {
            misc::analyze_yield(analyzer, context, key.as_deref(), value.as_deref())?
        }
        ExprKind::YieldFrom(inner) => misc::analyze_yield_from(analyzer, context, span, inner)?,
        ExprKind::Clone(inner) => misc::analyze_clone(analyzer, context, span, inner)?,
        ExprKind::Print(inner) => {
            analyze_expr(analyzer, context, inner)?;
            Atomic::LiteralInt(1).into()
        }
        ExprKind::Exit(inner) => {
            if let Some(inner) = inner {
                analyze_expr(analyzer, context, inner)?;
            }
            Union::empty()
        }
        ExprKind::ErrorSuppress(inner) => analyze_expr(analyzer, context, inner)?,
    };

    analyzer.set_expr_type(expr, &ty);
    Ok(ty)
}

#[cfg(test)]
mod tests {
    use sable_ast::{stmt::Stmt, AstBuilder};
    use sable_diagnostics::IssueBuffer;

    use super::*;
    use crate::{codebase::Codebase, config::AnalysisConfig, typeck::block::analyze_stmts};

    #[test]
    fn expression_types_are_recorded_by_node() {
        let b = AstBuilder::new();
        let value = b.arith(sable_ast::expr::Arithmetic::Addition, b.int(1), b.int(2));
        let stmts: Vec<Stmt> = vec![b.assign_stmt(b.var("a"), value.clone())];

        let codebase = Codebase::new();
        let config = AnalysisConfig::default();
        let mut buffer = IssueBuffer::new();
        let mut analyzer = Analyzer::new(&codebase, &config, "test.php", &mut buffer);
        let mut context = Context::new(None);
        analyze_stmts(&mut analyzer, &mut context, &stmts).expect("no hard stops");

        assert_eq!(
            analyzer.expr_type(&value).map(ToString::to_string).as_deref(),
            Some("int(3)")
        );
        assert!(analyzer.stats.non_mixed_count > 0);
        assert_eq!(analyzer.stats.mixed_count, 0);
    }
}

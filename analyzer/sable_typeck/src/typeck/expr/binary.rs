//! for binary operators

use sable_ast::expr::{Arithmetic, BinaryBitwise, ClassRef, Comparison, Expr, Logical};
use sable_diagnostics::IssueKind;
use sable_utils::span::Span;

use super::{analyze_expr, helpers::resolve_class_ref};
use crate::{
    typeck::{
        algebra::negate_formula,
        analyzer::{AnalysisResult, Analyzer},
        block::narrow_by_clauses,
        context::Context,
    },
    types::{combine, Atomic, Union},
};

/// Report operands of `operator` that are mixed, possibly null, or not
/// numbers at all. Returns whether every operand is usable.
fn check_operands(
    analyzer: &mut Analyzer<'_>,
    span: Span,
    operator: &str,
    operands: [&Union; 2],
    allow_arrays: bool,
) -> AnalysisResult<bool> {
    let mut usable = true;
    for operand in operands {
        if operand.is_mixed() {
            analyzer.report(IssueKind::MixedOperand(operator.to_string()), span)?;
            usable = false;
        } else if operand.is_nullable() && !operand.is_null() {
            analyzer.report(
                IssueKind::PossiblyNullOperand {
                    operator: operator.to_string(),
                    got: operand.get_id(),
                },
                span,
            )?;
        }
        let invalid = operand
            .atomics()
            .any(|atomic| atomic.is_object_type() || (!allow_arrays && atomic.is_array_like()));
        if invalid {
            analyzer.report(
                IssueKind::InvalidOperand {
                    operator: operator.to_string(),
                    got: operand.get_id(),
                },
                span,
            )?;
            usable = false;
        }
    }
    Ok(usable)
}

/// Whether each operand may hold an integer, and whether it may hold a
/// float, once converted to a number
fn numeric_kinds(ty: &Union) -> (bool, bool) {
    let mut may_be_int = false;
    let mut may_be_float = false;
    for atomic in ty.atomics() {
        match atomic {
            Atomic::Int
            | Atomic::LiteralInt(_)
            | Atomic::Bool
            | Atomic::True
            | Atomic::False
            | Atomic::Null => may_be_int = true,
            Atomic::Float | Atomic::LiteralFloat(_) => may_be_float = true,
            Atomic::Empty => {}
            _ => {
                may_be_int = true;
                may_be_float = true;
            }
        }
    }
    (may_be_int, may_be_float)
}

/// The result of `left op right` for arithmetic operators
///
/// `+`, `-` and `*` on two integer literals fold to a literal. Integer
/// operands give an integer, a float operand makes a float, and division
/// may give either.
///
/// # Errors
/// Errors when a hard-stop diagnostic is reported.
pub fn arithmetic_type(
    analyzer: &mut Analyzer<'_>,
    span: Span,
    op: Arithmetic,
    left: &Union,
    right: &Union,
) -> AnalysisResult<Union> {
    let both_arrays = left.atomics().all(Atomic::is_array_like)
        && right.atomics().all(Atomic::is_array_like);
    if op == Arithmetic::Addition && both_arrays {
        return Ok(combine(left, right));
    }
    if !check_operands(analyzer, span, &op.to_string(), [left, right], false)? {
        return Ok(Union::mixed());
    }

    if let (Some(a), Some(b)) = (left.get_single_literal_int(), right.get_single_literal_int()) {
        let folded = match op {
            Arithmetic::Addition => Some(a.checked_add(b)),
            Arithmetic::Subtraction => Some(a.checked_sub(b)),
            Arithmetic::Multiplication => Some(a.checked_mul(b)),
            _ => None,
        };
        match folded {
            Some(Some(value)) => return Ok(Atomic::LiteralInt(value).into()),
            Some(None) => return Ok(Union::float()),
            None => {}
        }
    }

    let (left_int, left_float) = numeric_kinds(left);
    let (right_int, right_float) = numeric_kinds(right);
    let int_only = !left_float && !right_float;
    let float_only = (left_float && !left_int) || (right_float && !right_int);
    Ok(match op {
        Arithmetic::Modulo => Union::int(),
        Arithmetic::Division => Union::new(vec![Atomic::Int, Atomic::Float]),
        _ if int_only => Union::int(),
        _ if float_only => Union::float(),
        _ => Union::new(vec![Atomic::Int, Atomic::Float]),
    })
}

/// `a + b`, `a - b`, ...
pub fn analyze_arithmetic(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    span: Span,
    op: Arithmetic,
    left: &Expr,
    right: &Expr,
) -> AnalysisResult<Union> {
    let left = analyze_expr(analyzer, context, left)?;
    let right = analyze_expr(analyzer, context, right)?;
    arithmetic_type(analyzer, span, op, &left, &right)
}

/// The string a single literal converts to
fn literal_string(ty: &Union) -> Option<String> {
    match ty.single()? {
        Atomic::LiteralString(value) | Atomic::LiteralClassString(value) => Some(value.clone()),
        Atomic::LiteralInt(value) => Some(value.to_string()),
        Atomic::True => Some("1".to_string()),
        Atomic::False | Atomic::Null => Some(String::new()),
        _ => None,
    }
}

/// The result of `left . right`: a literal when both sides are
pub fn concat_type(left: &Union, right: &Union) -> Union {
    match (literal_string(left), literal_string(right)) {
        (Some(left), Some(right)) => Atomic::LiteralString(left + &right).into(),
        _ => Union::string(),
    }
}

/// `a . b`
pub fn analyze_concat(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    left: &Expr,
    right: &Expr,
) -> AnalysisResult<Union> {
    let left_type = analyze_expr(analyzer, context, left)?;
    let right_type = analyze_expr(analyzer, context, right)?;
    for (operand, expr) in [(&left_type, left), (&right_type, right)] {
        if operand.is_mixed() {
            analyzer.report(IssueKind::MixedOperand(".".to_string()), expr.span())?;
        } else if operand.has_array() {
            analyzer.report(
                IssueKind::InvalidOperand {
                    operator: ".".to_string(),
                    got: operand.get_id(),
                },
                expr.span(),
            )?;
        }
    }
    Ok(concat_type(&left_type, &right_type))
}

/// The result of a bitwise operator: always an integer
///
/// # Errors
/// Errors when a hard-stop diagnostic is reported.
pub fn bitwise_type(
    analyzer: &mut Analyzer<'_>,
    span: Span,
    op: BinaryBitwise,
    left: &Union,
    right: &Union,
) -> AnalysisResult<Union> {
    check_operands(analyzer, span, &op.to_string(), [left, right], false)?;
    Ok(Union::int())
}

/// `a & b`, `a << b`, ...
pub fn analyze_bitwise(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    span: Span,
    op: BinaryBitwise,
    left: &Expr,
    right: &Expr,
) -> AnalysisResult<Union> {
    let left = analyze_expr(analyzer, context, left)?;
    let right = analyze_expr(analyzer, context, right)?;
    bitwise_type(analyzer, span, op, &left, &right)
}

/// `a && b`, `a || b`, `a xor b`
///
/// The right side of `&&` only runs where the left is truthy, and that of
/// `||` where it is falsy, so it is checked in a context narrowed
/// accordingly. Its assignments may not have happened afterwards.
pub fn analyze_logical(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    op: Logical,
    left: &Expr,
    right: &Expr,
) -> AnalysisResult<Union> {
    analyze_expr(analyzer, context, left)?;
    if op == Logical::Xor {
        analyze_expr(analyzer, context, right)?;
        return Ok(Union::bool());
    }

    let left_clauses = analyzer.formula_builder(context).get_formula(left);
    let clauses = if op == Logical::Or {
        negate_formula(&left_clauses, left.id.0)
    } else {
        left_clauses
    };
    let mut right_context = narrow_by_clauses(analyzer, context, &clauses, left.span(), false)?;
    right_context.assigned_var_ids.clear();
    analyze_expr(analyzer, &mut right_context, right)?;
    context.absorb_possible_path(&right_context);
    Ok(Union::bool())
}

/// `<`, `<=`, `>`, `>=` and `<=>`
pub fn analyze_comparison(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    op: Comparison,
    left: &Expr,
    right: &Expr,
) -> AnalysisResult<Union> {
    analyze_expr(analyzer, context, left)?;
    analyze_expr(analyzer, context, right)?;
    Ok(match op {
        Comparison::Spaceship => Union::int(),
        _ => Union::bool(),
    })
}

/// `a ?? b`
///
/// The left side is read as inside `isset`; the right side only runs when
/// the left is null or missing.
pub fn analyze_coalesce(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    left: &Expr,
    right: &Expr,
) -> AnalysisResult<Union> {
    let was_inside_isset = context.inside_isset;
    context.inside_isset = true;
    let left_type = analyze_expr(analyzer, context, left);
    context.inside_isset = was_inside_isset;
    let left_type = left_type?;

    let mut right_context = context.fork();
    right_context.assigned_var_ids.clear();
    let right_type = analyze_expr(analyzer, &mut right_context, right)?;
    context.absorb_possible_path(&right_context);

    Ok(if left_type.is_null() {
        right_type
    } else if left_type.is_nullable() || left_type.is_mixed() {
        combine(&left_type.without_null(), &right_type)
    } else {
        left_type
    })
}

/// `a instanceof Foo`
pub fn analyze_instanceof(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    span: Span,
    inner: &Expr,
    class: &ClassRef,
) -> AnalysisResult<Union> {
    analyze_expr(analyzer, context, inner)?;
    resolve_class_ref(analyzer, context, class, span)?;
    Ok(Union::bool())
}

//! for unary operators and casts

use sable_ast::expr::{Arithmetic, CastKind, Expr, IncDec};
use sable_diagnostics::IssueKind;
use sable_utils::span::Span;

use super::{analyze_expr, assign_to_target, binary};
use crate::{
    codebase::Codebase,
    typeck::{
        analyzer::{AnalysisResult, Analyzer},
        context::Context,
    },
    types::{combine_atomics, Atomic, ShapeKey, Union},
};

/// `~x`
pub fn analyze_bitwise_not(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    span: Span,
    inner: &Expr,
) -> AnalysisResult<Union> {
    let ty = analyze_expr(analyzer, context, inner)?;
    if ty.is_mixed() {
        analyzer.report(IssueKind::MixedOperand("~".to_string()), span)?;
        return Ok(Union::mixed());
    }
    if ty.has_array() || ty.has_object_type() {
        analyzer.report(
            IssueKind::InvalidOperand {
                operator: "~".to_string(),
                got: ty.get_id(),
            },
            span,
        )?;
    }
    Ok(if ty.is_string() {
        Union::string()
    } else {
        Union::int()
    })
}

/// `-x` and `+x`, with `sign` -1 or 1
pub fn analyze_sign(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    span: Span,
    inner: &Expr,
    sign: i64,
) -> AnalysisResult<Union> {
    let ty = analyze_expr(analyzer, context, inner)?;
    match ty.single() {
        Some(Atomic::LiteralInt(value)) => {
            return Ok(value
                .checked_mul(sign)
                .map_or_else(Union::float, |value| Atomic::LiteralInt(value).into()));
        }
        #[allow(clippy::cast_precision_loss)]
        Some(Atomic::LiteralFloat(value)) => {
            return Ok(Atomic::LiteralFloat(value * sign as f64).into());
        }
        Some(Atomic::Int | Atomic::Float) => return Ok(ty),
        _ => {}
    }
    binary::arithmetic_type(
        analyzer,
        span,
        Arithmetic::Multiplication,
        &ty,
        &Atomic::LiteralInt(sign).into(),
    )
}

/// `++$x`, `$x--`, ...
///
/// `null` counts as zero when incremented and stays `null` when decremented.
/// The stored value is widened so a counter converges in a loop.
pub fn analyze_inc_dec(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    span: Span,
    op: IncDec,
    target: &Expr,
) -> AnalysisResult<Union> {
    let current = analyze_expr(analyzer, context, target)?;

    let updated = if current.is_string() {
        Union::string()
    } else if current.is_null() {
        if op.is_increment() {
            Atomic::LiteralInt(1).into()
        } else {
            Union::null()
        }
    } else {
        let arithmetic = if op.is_increment() {
            Arithmetic::Addition
        } else {
            Arithmetic::Subtraction
        };
        let operand = Union::new(
            current
                .atomics()
                .map(|atomic| match atomic {
                    Atomic::Null => Atomic::LiteralInt(0),
                    other => other.clone(),
                })
                .collect(),
        );
        binary::arithmetic_type(analyzer, span, arithmetic, &operand, &Atomic::LiteralInt(1).into())?
            .generalize_literals()
    };

    assign_to_target(analyzer, context, target, &updated)?;
    Ok(if op.is_prefix() { updated } else { current })
}

/// Whether an object of `class` converts to a string
fn is_stringable(codebase: &Codebase, class: &str) -> bool {
    codebase.method_exists(class, "__toString")
        || codebase.class_extends_or_implements(class, "Stringable")
}

/// `(int) x`, `(string) x`, ...
pub fn analyze_cast(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    span: Span,
    kind: CastKind,
    inner: &Expr,
) -> AnalysisResult<Union> {
    let ty = analyze_expr(analyzer, context, inner)?;
    let codebase = analyzer.codebase;
    let invalid = ty.atomics().find(|atomic| match (kind, atomic) {
        (CastKind::String, Atomic::NamedObject { name, .. }) => !is_stringable(codebase, name),
        (CastKind::String, atomic) => atomic.is_array_like(),
        (CastKind::Int | CastKind::Float, atomic) => atomic.is_object_type(),
        _ => false,
    });
    if let Some(atomic) = invalid {
        analyzer.report(
            IssueKind::InvalidCast {
                from: atomic.get_id(),
                to: kind.to_string(),
            },
            span,
        )?;
    }

    Ok(match kind {
        CastKind::Int => match ty.single() {
            Some(Atomic::LiteralInt(_)) => ty.clone(),
            Some(Atomic::True) => Atomic::LiteralInt(1).into(),
            Some(Atomic::False | Atomic::Null) => Atomic::LiteralInt(0).into(),
            _ => Union::int(),
        },
        CastKind::Float => Union::float(),
        CastKind::String => {
            binary::concat_type(&ty, &Atomic::LiteralString(String::new()).into())
        }
        CastKind::Bool => {
            if ty.is_always_truthy() {
                Union::true_()
            } else if ty.is_always_falsy() {
                Union::false_()
            } else {
                Union::bool()
            }
        }
        CastKind::Array => combine_atomics(ty.atomics().map(|atomic| match atomic {
            atomic if atomic.is_array_like() => atomic.clone(),
            Atomic::Null => Atomic::empty_array(),
            atomic if atomic.is_object_type() => Atomic::array(Union::string(), Union::mixed()),
            Atomic::Mixed => Atomic::mixed_array(),
            other => Atomic::ObjectShape {
                properties: [(ShapeKey::Int(0), Union::from(other.clone()))].into_iter().collect(),
                sealed: true,
            },
        })),
        CastKind::Object => {
            if !ty.is_empty_type() && ty.atomics().all(Atomic::is_object_type) {
                ty
            } else {
                Union::named("stdClass")
            }
        }
        CastKind::Unset => Union::null(),
    })
}

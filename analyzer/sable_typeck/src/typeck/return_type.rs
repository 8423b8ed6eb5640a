//! for `return` statements and the check of a body's returns against its
//! declared return type

use sable_ast::expr::Expr;
use sable_diagnostics::IssueKind;
use sable_utils::span::Span;

use super::{
    analyzer::{AnalysisResult, Analyzer, FunctionScope},
    context::Context,
    expr::analyze_expr,
};
use crate::types::{
    combine_many, flesh_out_type, is_contained_by, template::get_ancestor_type_params, Atomic,
    ExpandContext, Union,
};

/// `return` and `return $value`
///
/// The returned type is recorded on the enclosing function. A bare `return`
/// records `void`.
///
/// # Errors
/// Errors when a hard-stop diagnostic is reported.
pub fn analyze_return(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    value: Option<&Expr>,
    span: Span,
) -> AnalysisResult {
    let ty = match value {
        Some(value) => analyze_expr(analyzer, context, value)?,
        None => Union::void(),
    };
    if analyzer.is_muted() {
        return Ok(());
    }
    if let Some(function) = &mut analyzer.function {
        function.returns.push((ty, span));
    }
    Ok(())
}

/// A returned type as the caller sees it: a bare `return` gives `null`
fn returned_value(ty: &Union) -> Union {
    if ty.is_void() {
        Union::null()
    } else {
        ty.clone()
    }
}

/// Compare what the body of the current function returned with its declared
/// return type
///
/// `falls_through` tells whether the end of the body is reachable. A body
/// whose every path throws needs no `return`.
///
/// # Errors
/// Errors when a hard-stop diagnostic is reported.
pub fn verify_return_type(
    analyzer: &mut Analyzer<'_>,
    falls_through: bool,
    expand: &ExpandContext<'_>,
) -> AnalysisResult {
    let Some(FunctionScope {
        storage,
        returns,
        yields,
    }) = analyzer.function.clone()
    else {
        return Ok(());
    };
    let Some(declared) = &storage.return_type else {
        return Ok(());
    };
    let codebase = analyzer.codebase;
    let declared = flesh_out_type(codebase, declared, expand);
    let function = storage.display_name();
    let span = storage.return_type_span.unwrap_or(storage.span);

    if !yields.is_empty() {
        return verify_generator(analyzer, &function, &declared, &returns, &yields, span);
    }

    if declared.is_void() {
        for (ty, return_span) in &returns {
            if !ty.is_void() {
                analyzer.report(
                    IssueKind::InvalidReturnStatement {
                        function: function.clone(),
                        inferred: ty.get_id(),
                    },
                    *return_span,
                )?;
            }
        }
        return Ok(());
    }
    if declared.is_empty_type() {
        return Ok(());
    }

    if returns.is_empty() {
        if falls_through {
            analyzer.report(
                IssueKind::MissingReturnStatement {
                    function,
                    declared: declared.get_id(),
                },
                span,
            )?;
        }
        return Ok(());
    }

    let mut values = returns
        .iter()
        .map(|(ty, _)| returned_value(ty))
        .collect::<Vec<_>>();
    if falls_through {
        if declared.is_nullable() || declared.is_mixed() {
            values.push(Union::null());
        } else {
            analyzer.report(
                IssueKind::NotAllPathsReturn {
                    function: function.clone(),
                    declared: declared.get_id(),
                },
                span,
            )?;
        }
    }
    let inferred = combine_many(&values);

    if inferred.is_mixed() {
        if !declared.is_mixed() {
            analyzer.report(
                IssueKind::MixedInferredReturnType {
                    function,
                    declared: declared.get_id(),
                },
                span,
            )?;
        }
        return Ok(());
    }

    let result = is_contained_by(codebase, &inferred, &declared, true, true);
    if !result.is_contained {
        let issue = if result.type_coerced {
            IssueKind::MoreSpecificReturnType {
                function,
                declared: declared.get_id(),
                inferred: inferred.get_id(),
            }
        } else {
            IssueKind::InvalidReturnType {
                function,
                declared: declared.get_id(),
                inferred: inferred.get_id(),
            }
        };
        return analyzer.report(issue, span);
    }

    if declared.is_mixed() {
        return Ok(());
    }
    if inferred.is_nullable() && !declared.is_nullable() && !inferred.ignore_nullable_issues {
        analyzer.report(
            IssueKind::NullableReturnStatement {
                function: function.clone(),
                declared: declared.get_id(),
                inferred: inferred.get_id(),
            },
            span,
        )?;
    }
    if inferred.is_falsable()
        && !declared.is_falsable()
        && !declared.has(&Atomic::Bool.get_id())
        && !inferred.ignore_falsable_issues
    {
        analyzer.report(
            IssueKind::FalsableReturnStatement {
                function,
                declared: declared.get_id(),
                inferred: inferred.get_id(),
            },
            span,
        )?;
    }
    Ok(())
}

/// A body that yields is a generator: the declared type must accept a
/// `Generator`, and what is yielded must fit its key and value parameters
fn verify_generator(
    analyzer: &mut Analyzer<'_>,
    function: &str,
    declared: &Union,
    returns: &[(Union, Span)],
    yields: &[(Union, Union)],
    span: Span,
) -> AnalysisResult {
    let codebase = analyzer.codebase;
    let keys = yields.iter().map(|(key, _)| key.clone()).collect::<Vec<_>>();
    let values = yields.iter().map(|(_, value)| value.clone()).collect::<Vec<_>>();
    let key = combine_many(&keys);
    let value = combine_many(&values);
    let returned = if returns.is_empty() {
        Union::null()
    } else {
        combine_many(&returns.iter().map(|(ty, _)| returned_value(ty)).collect::<Vec<_>>())
    };
    let inferred = Union::from(Atomic::NamedObject {
        name: "Generator".to_string(),
        type_params: Some(vec![key.clone(), value.clone(), Union::mixed(), returned]),
    });

    if declared.is_mixed() {
        return Ok(());
    }
    let accepted = declared.atomics().find_map(|container| match container {
        Atomic::Object => Some(None),
        Atomic::NamedObject { name, .. }
            if codebase.class_extends_or_implements("Generator", name) =>
        {
            Some(get_ancestor_type_params(codebase, container, "Traversable"))
        }
        _ => None,
    });
    let invalid = match accepted {
        None => true,
        Some(None) => false,
        Some(Some(params)) => [key, value]
            .iter()
            .zip(&params)
            .any(|(yielded, expected)| {
                !is_contained_by(codebase, yielded, expected, false, false).is_contained
            }),
    };
    if invalid {
        analyzer.report(
            IssueKind::InvalidReturnType {
                function: function.to_string(),
                declared: declared.get_id(),
                inferred: inferred.get_id(),
            },
            span,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use sable_ast::AstBuilder;

    use crate::typeck::test_utils::check;

    #[test]
    fn matching_returns_are_silent() {
        let b = AstBuilder::new();
        let f = b
            .function("f")
            .with_param(b.param("flag").typed("bool"))
            .returning("?stdClass")
            .with_body(vec![
                b.if_(b.var("flag"), vec![b.ret(Some(b.null()))], None),
                b.ret(Some(b.new_named("stdClass", vec![]))),
            ]);
        let checked = check(&[b.function_stmt(f)]);
        assert!(checked.issues().is_empty(), "{:?}", checked.issues());
    }

    #[test]
    fn mismatched_returns() {
        let b = AstBuilder::new();
        let wrong = b
            .function("wrong")
            .returning("string")
            .with_body(vec![b.ret(Some(b.int(1)))]);
        let nullable = b
            .function("nullable")
            .returning("stdClass")
            .with_body(vec![b.ret(Some(b.null()))]);
        let missing = b.function("missing").returning("int").with_body(vec![]);
        let throws = b
            .function("throws")
            .returning("int")
            .with_body(vec![b.throw(b.new_named("Exception", vec![]))]);
        let void = b
            .function("void")
            .returning("void")
            .with_body(vec![b.ret(Some(b.int(1)))]);
        let checked = check(&[
            b.function_stmt(wrong),
            b.function_stmt(nullable),
            b.function_stmt(missing),
            b.function_stmt(throws),
            b.function_stmt(void),
        ]);
        assert_eq!(
            checked.issues(),
            vec![
                "InvalidReturnType",
                "NullableReturnStatement",
                "MissingReturnStatement",
                "InvalidReturnStatement",
            ]
        );
        let message = checked.diagnostics[0].kind.value().to_string();
        assert!(message.contains("`string`") && message.contains("`int(1)`"), "{message}");
    }

    #[test]
    fn some_paths_fall_off_the_end() {
        let b = AstBuilder::new();
        let f = b
            .function("f")
            .with_param(b.param("flag").typed("bool"))
            .returning("int")
            .with_body(vec![b.if_(b.var("flag"), vec![b.ret(Some(b.int(1)))], None)]);
        let g = b
            .function("g")
            .with_param(b.param("x").typed("mixed"))
            .returning("int")
            .with_body(vec![b.ret(Some(b.var("x")))]);
        let checked = check(&[b.function_stmt(f), b.function_stmt(g)]);
        assert_eq!(
            checked.issues(),
            vec!["NotAllPathsReturn", "MixedInferredReturnType"]
        );
    }

    #[test]
    fn falsable_returns() {
        let b = AstBuilder::new();
        let f = b
            .function("f")
            .with_param(b.param("s").typed("string"))
            .returning("int")
            .with_body(vec![b.ret(Some(b.call("strpos", vec![b.var("s"), b.string("x")])))]);
        let checked = check(&[b.function_stmt(f)]);
        assert_eq!(checked.issues(), vec!["FalsableReturnStatement"]);
    }

    #[test]
    fn generators_are_checked_against_their_parameters() {
        let b = AstBuilder::new();
        let good = b
            .function("good")
            .returning("Traversable<int, string>")
            .with_body(vec![b.expr_stmt(b.yield_(None, Some(b.string("a"))))]);
        let bad_value = b
            .function("badValue")
            .returning("Iterator<int, string>")
            .with_body(vec![b.expr_stmt(b.yield_(None, Some(b.int(1))))]);
        let not_iterable = b
            .function("notIterable")
            .returning("int")
            .with_body(vec![b.expr_stmt(b.yield_(None, Some(b.int(1))))]);
        let checked = check(&[
            b.function_stmt(good),
            b.function_stmt(bad_value),
            b.function_stmt(not_iterable),
        ]);
        assert_eq!(
            checked.issues(),
            vec!["InvalidReturnType", "InvalidReturnType"]
        );
    }
}

//! for function, method and class declarations
//!
//! Every function-like body is checked in a fresh [`Context`] holding only
//! its parameters (and `$this` in instance methods). A hard stop abandons the
//! body it happened in; the rest of the file is still checked.

use sable_ast::{
    decl::{ClassDecl, ClassMember, FunctionDecl, Param, PropertyDecl},
    expr::Expr,
    stmt::Stmt,
};
use sable_diagnostics::IssueKind;
use tracing::{debug, debug_span};

use super::{
    analyzer::{expand_context, AnalysisResult, Analyzer, FunctionScope},
    block::{analyze_stmts, can_fall_through},
    context::Context,
    expr::{analyze_expr, check_property_value},
    return_type::{analyze_return, verify_return_type},
};
use crate::{
    codebase::{ClassStorage, FunctionLikeStorage},
    types::{flesh_out_type, is_contained_by, Atomic, Union},
};

/// The code of a function-like
#[derive(Debug, Clone, Copy)]
pub enum FunctionBody<'b> {
    /// A statement list
    Block(&'b [Stmt]),
    /// The expression an arrow function returns
    Arrow(&'b Expr),
}

/// Note that a hard stop abandoned the check of `name`
fn catch_stop(analyzer: &mut Analyzer<'_>, name: &str, result: AnalysisResult) {
    if result.is_err() {
        analyzer.stopped = true;
        debug!(function = name, "check abandoned after hard stop");
    }
}

/// Check the body of a declared function
pub fn analyze_function_decl(analyzer: &mut Analyzer<'_>, decl: &FunctionDecl) {
    let Some(body) = &decl.body else {
        return;
    };
    let Some(storage) = analyzer.codebase.get_function(decl.name.value()) else {
        return;
    };
    let mut context = Context::new(None);
    context.check_variables = analyzer.config.check_variables;
    let result = analyze_function_like(
        analyzer,
        context,
        storage.clone(),
        &decl.params,
        FunctionBody::Block(body),
    );
    catch_stop(analyzer, decl.name.value(), result.map(drop));
}

/// The type of `$this` inside `class`: its template parameters stay unbound
fn this_type(class: &ClassStorage) -> Union {
    let type_params = (!class.template_types.is_empty()).then(|| {
        class
            .template_types
            .iter()
            .map(|template| {
                Union::from(Atomic::GenericParam {
                    name: template.name.clone(),
                    defining_entity: template.defining_entity.clone(),
                    as_type: Box::new(template.as_type.clone()),
                })
            })
            .collect()
    });
    Atomic::NamedObject {
        name: class.name.clone(),
        type_params,
    }
    .into()
}

/// A fresh context for code inside `class`
fn class_context(analyzer: &Analyzer<'_>, class: &ClassStorage, is_static: bool) -> Context {
    let mut context = Context::new(Some(&class.name));
    context.parent_class.clone_from(&class.parent);
    context.is_static = is_static;
    context.check_variables = analyzer.config.check_variables;
    if !is_static {
        context.set("$this", this_type(class));
    }
    context
}

/// Check the members of a declared class: property defaults, constant
/// values and method bodies
pub fn analyze_class(analyzer: &mut Analyzer<'_>, decl: &ClassDecl) {
    let codebase = analyzer.codebase;
    let Some(class) = codebase.get_class(decl.name.value()) else {
        return;
    };
    let _span = debug_span!("analyze_class", class = %class.name).entered();

    for member in &decl.members {
        match member {
            ClassMember::Property(property) => {
                let result = check_property_default(analyzer, class, property);
                let name = format!("{}::${}", class.name, property.name.value());
                catch_stop(analyzer, &name, result);
            }
            ClassMember::Constant(constant) => {
                let mut context = class_context(analyzer, class, true);
                let result = analyze_expr(analyzer, &mut context, &constant.value).map(drop);
                let name = format!("{}::{}", class.name, constant.name.value());
                catch_stop(analyzer, &name, result);
            }
            ClassMember::Method(method) => {
                let Some(body) = &method.function.body else {
                    continue;
                };
                let Some(storage) = class
                    .methods
                    .get(&method.function.name.value().to_ascii_lowercase())
                else {
                    continue;
                };
                let context = class_context(analyzer, class, method.is_static);
                let result = analyze_function_like(
                    analyzer,
                    context,
                    storage.clone(),
                    &method.function.params,
                    FunctionBody::Block(body),
                );
                catch_stop(analyzer, &storage.display_name(), result.map(drop));
            }
        }
    }
}

/// A property's default value must fit its declared type
fn check_property_default(
    analyzer: &mut Analyzer<'_>,
    class: &ClassStorage,
    property: &PropertyDecl,
) -> AnalysisResult {
    let Some(default) = &property.default else {
        return Ok(());
    };
    let mut context = class_context(analyzer, class, true);
    let ty = analyze_expr(analyzer, &mut context, default)?;
    let Some(declared) = class
        .properties
        .get(property.name.value())
        .and_then(|storage| storage.ty.as_ref())
    else {
        return Ok(());
    };
    let declared = flesh_out_type(analyzer.codebase, declared, &expand_context(&context));
    let property_id = format!("{}::${}", class.name, property.name.value());
    check_property_value(analyzer, &property_id, &declared, &ty, default.span())
}

/// Check one function-like body against `storage`, starting from `context`
///
/// Parameters are bound first, then the body is walked and its returns are
/// compared with the declared return type. The final context is kept in
/// [`Analyzer::function_contexts`] and returned.
///
/// # Errors
/// Errors when a hard-stop diagnostic is reported.
pub fn analyze_function_like(
    analyzer: &mut Analyzer<'_>,
    mut context: Context,
    storage: FunctionLikeStorage,
    params: &[Param],
    body: FunctionBody<'_>,
) -> AnalysisResult<Context> {
    let name = storage.display_name();
    let _span = debug_span!("analyze_function", function = %name).entered();

    let outer_function = analyzer.function.replace(FunctionScope::new(storage));
    let outer_break_scopes = std::mem::take(&mut analyzer.break_scopes);
    let result = check_body(analyzer, &mut context, params, body);
    analyzer.function = outer_function;
    analyzer.break_scopes = outer_break_scopes;
    result?;

    analyzer.function_contexts.insert(name, context.clone());
    Ok(context)
}

/// Bind the parameters, walk the body and verify its returns
fn check_body(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    params: &[Param],
    body: FunctionBody<'_>,
) -> AnalysisResult {
    bind_params(analyzer, context, params)?;
    let falls_through = match body {
        FunctionBody::Block(stmts) => {
            analyze_stmts(analyzer, context, stmts)?;
            can_fall_through(stmts)
        }
        FunctionBody::Arrow(expr) => {
            analyze_return(analyzer, context, Some(expr), expr.span())?;
            false
        }
    };
    verify_return_type(analyzer, falls_through, &expand_context(context))
}

/// Bind every parameter of the current function in `context`
///
/// A variadic parameter holds a list of its declared type. A by-reference
/// parameter keeps its declared type as a constraint on later assignments.
fn bind_params(analyzer: &mut Analyzer<'_>, context: &mut Context, params: &[Param]) -> AnalysisResult {
    let codebase = analyzer.codebase;
    let stored_params = analyzer
        .function
        .as_ref()
        .map(|function| function.storage.params.clone())
        .unwrap_or_default();

    for (param, stored) in params.iter().zip(stored_params) {
        let var_id = format!("${}", stored.name);
        let declared = stored
            .ty
            .as_ref()
            .map(|ty| flesh_out_type(codebase, ty, &expand_context(context)));

        if let Some(default) = &param.default {
            let default_type = analyze_expr(analyzer, context, default)?;
            if let Some(declared) = &declared {
                if !is_contained_by(codebase, &default_type, declared, false, false).is_contained {
                    analyzer.report(
                        IssueKind::InvalidParamDefault {
                            param: var_id.clone(),
                            expected: declared.get_id(),
                            got: default_type.get_id(),
                        },
                        default.span(),
                    )?;
                }
            }
        }

        let ty = declared.clone().unwrap_or_else(Union::mixed);
        let ty = if stored.variadic {
            Atomic::array(Union::int(), ty).into()
        } else {
            ty
        };
        let mut ty = ty.from_declaration();
        if stored.by_ref {
            ty.by_ref = true;
            if let Some(declared) = declared {
                context.byref_constraints.insert(var_id.clone(), declared);
            }
        }
        context.set(&var_id, ty);
    }
    context.assigned_var_ids.clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use sable_ast::{decl::Visibility, AstBuilder};
    use sable_diagnostics::IssueBuffer;

    use super::*;
    use crate::{
        codebase::{scan_stmts, Codebase},
        config::AnalysisConfig,
        typeck::test_utils::check,
    };

    #[test]
    fn parameters_are_bound_in_the_body() {
        let b = AstBuilder::new();
        let f = b
            .function("f")
            .with_param(b.param("a").typed("int"))
            .with_param(b.param("rest").typed("string").variadic())
            .with_body(vec![]);
        let g = b
            .function("g")
            .with_param(b.param("x").typed("int").with_default(b.string("s")))
            .with_body(vec![]);
        let checked = check(&[b.function_stmt(f), b.function_stmt(g)]);
        assert_eq!(checked.type_in("f", "$a").as_deref(), Some("int"));
        assert_eq!(checked.type_in("f", "$rest").as_deref(), Some("array<int, string>"));
        assert_eq!(checked.issues(), vec!["InvalidParamDefault"]);
    }

    #[test]
    fn methods_see_this_and_their_class() {
        let b = AstBuilder::new();
        let class = b
            .class("Box")
            .with_property(
                b.property("value")
                    .typed("int")
                    .with_visibility(Visibility::Private)
                    .with_default(b.int(0)),
            )
            .with_property(b.property("label").typed("string").with_default(b.int(1)))
            .with_method(b.method(
                b.function("get")
                    .returning("int")
                    .with_body(vec![b.ret(Some(b.prop(b.var("this"), "value")))]),
            ))
            .with_method(
                b.method(
                    b.function("make")
                        .returning("void")
                        .with_body(vec![b.expr_stmt(b.var("this"))]),
                )
                .static_(),
            );
        let checked = check(&[b.class_stmt(class)]);
        assert_eq!(checked.type_in("Box::get", "$this").as_deref(), Some("Box"));
        assert_eq!(
            checked.issues(),
            vec!["InvalidPropertyAssignment", "InvalidScope"]
        );
    }

    #[test]
    fn hard_stops_abandon_only_the_current_function() {
        let b = AstBuilder::new();
        let broken = b
            .function("broken")
            .with_body(vec![b.expr_stmt(b.call("nope", vec![])), b.assign_stmt(b.var("a"), b.int(1))]);
        let fine = b
            .function("fine")
            .with_body(vec![b.assign_stmt(b.var("b"), b.int(2))]);
        let stmts = vec![b.function_stmt(broken), b.function_stmt(fine)];

        let config = AnalysisConfig::default();
        let mut codebase = Codebase::new();
        let mut buffer = IssueBuffer::new();
        scan_stmts(&stmts, "test.php", &mut codebase, &config, &mut buffer);
        let mut analyzer = Analyzer::new(&codebase, &config, "test.php", &mut buffer);
        let mut context = Context::new(None);
        analyze_stmts(&mut analyzer, &mut context, &stmts).expect("declarations catch hard stops");

        assert!(analyzer.stopped);
        assert!(analyzer.function.is_none());
        assert!(!analyzer.function_contexts.contains_key("broken"));
        assert_eq!(
            analyzer.function_contexts["fine"]
                .get("$b")
                .map(ToString::to_string)
                .as_deref(),
            Some("int(2)")
        );
        drop(analyzer);
        assert_eq!(buffer.names(), vec!["UndefinedFunction"]);
    }
}

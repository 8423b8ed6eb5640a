//! for property fetches

use sable_ast::expr::{ClassRef, Expr};
use sable_diagnostics::IssueKind;
use sable_utils::span::{Span, Spanned};

use super::{
    analyze_expr,
    helpers::{describe, resolve_class_ref, var_id_of},
};
use crate::{
    codebase::{Codebase, PropertyStorage},
    typeck::{
        analyzer::{AnalysisResult, Analyzer},
        context::Context,
    },
    types::{
        combine_many, flesh_out_type, replace_templates, template::get_ancestor_type_params,
        Atomic, ExpandContext, TemplateResult, Union,
    },
};

/// `$o->p` and `$o?->p`
pub fn analyze_property_fetch(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    expr: &Expr,
    object: &Expr,
    name: &Spanned<String>,
    nullsafe: bool,
) -> AnalysisResult<Union> {
    let object_type = analyze_expr(analyzer, context, object)?;
    if let Some(cached) = var_id_of(analyzer, context, expr).and_then(|id| context.get(&id)) {
        return Ok(cached.clone().possibly_undefined(false));
    }

    let container = describe(analyzer, context, object);
    let span = expr.span();
    let mut results = vec![];
    for atomic in object_type.atomics() {
        match atomic {
            Atomic::Null => results.push(Union::null()),
            Atomic::Empty => {}
            Atomic::Mixed => {
                if !context.inside_isset {
                    analyzer.report(IssueKind::MixedPropertyFetch(container.clone()), span)?;
                }
                results.push(Union::mixed());
            }
            Atomic::Object | Atomic::GenericParam { .. } => results.push(Union::mixed()),
            Atomic::NamedObject { name: class, .. } => results.push(instance_property_type(
                analyzer,
                context,
                atomic,
                class,
                name.value(),
                span,
            )?),
            other => {
                analyzer.report(IssueKind::InvalidPropertyFetch(other.get_id()), span)?;
                results.push(Union::mixed());
            }
        }
    }

    if object_type.is_nullable() && !nullsafe && !context.inside_isset {
        let issue = if object_type.is_null() {
            IssueKind::NullPropertyFetch(container)
        } else {
            IssueKind::PossiblyNullPropertyFetch(container)
        };
        analyzer.report(issue, object.span())?;
    }

    Ok(if results.is_empty() {
        Union::mixed()
    } else {
        combine_many(&results)
    })
}

/// The declared type of an instance property read through `object`
///
/// Template parameters of the declaring class are bound from the object's
/// type arguments. A class with `__get` and no accessible property reads as
/// `mixed`, unless it seals its properties.
fn instance_property_type(
    analyzer: &mut Analyzer<'_>,
    context: &Context,
    object: &Atomic,
    class: &str,
    property_name: &str,
    span: Span,
) -> AnalysisResult<Union> {
    let codebase = analyzer.codebase;
    let Some(class_storage) = codebase.get_class(class) else {
        return Ok(Union::mixed());
    };
    let has_magic_get = codebase.method_exists(class, "__get");

    let property = codebase
        .get_property(class, property_name)
        .filter(|property| !property.is_static);
    let Some(property) = property else {
        if !has_magic_get || class_storage.sealed_properties {
            analyzer.report(
                IssueKind::UndefinedProperty(format!("{}::${property_name}", class_storage.name)),
                span,
            )?;
        }
        return Ok(Union::mixed());
    };

    if !is_accessible(codebase, property, context) {
        if has_magic_get {
            return Ok(Union::mixed());
        }
        analyzer.report(
            IssueKind::InaccessibleProperty(format!(
                "{}::${property_name}",
                property.declaring_class
            )),
            span,
        )?;
    }

    Ok(property_type(codebase, property, Some(object), class))
}

/// Whether code in `context` may read or write `property`
pub fn is_accessible(codebase: &Codebase, property: &PropertyStorage, context: &Context) -> bool {
    codebase.is_visible(
        property.visibility,
        &property.declaring_class,
        context.self_class.as_deref(),
    )
}

/// The declared type of `property` as seen through an instance of `class`
/// (or the class itself, for static properties)
pub fn property_type(
    codebase: &Codebase,
    property: &PropertyStorage,
    object: Option<&Atomic>,
    class: &str,
) -> Union {
    let Some(declared) = &property.ty else {
        return Union::mixed();
    };
    let declaring = &property.declaring_class;
    let declared = match (object, codebase.get_class(declaring)) {
        (Some(object), Some(declaring_storage)) if !declaring_storage.template_types.is_empty() => {
            let params = get_ancestor_type_params(codebase, object, declaring);
            let templates =
                TemplateResult::from_class_params(&declaring_storage.template_types, params.as_deref());
            replace_templates(declared, &templates)
        }
        _ => declared.clone(),
    };
    flesh_out_type(
        codebase,
        &declared,
        &ExpandContext {
            self_class: Some(declaring),
            static_class: Some(class),
            parent_class: codebase.get_parent(declaring),
            templates: None,
        },
    )
}

/// `Foo::$p`, `self::$p`, `static::$p`
pub fn analyze_static_property_fetch(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    expr: &Expr,
    class: &ClassRef,
    name: &Spanned<String>,
) -> AnalysisResult<Union> {
    let span = expr.span();
    let Some(class) = resolve_class_ref(analyzer, context, class, span)? else {
        return Ok(Union::mixed());
    };
    if let Some(cached) = var_id_of(analyzer, context, expr).and_then(|id| context.get(&id)) {
        return Ok(cached.clone().possibly_undefined(false));
    }

    let codebase = analyzer.codebase;
    let property = codebase
        .get_property(&class, name.value())
        .filter(|property| property.is_static);
    let Some(property) = property else {
        analyzer.report(
            IssueKind::UndefinedProperty(format!("{class}::${}", name.value())),
            span,
        )?;
        return Ok(Union::mixed());
    };
    if !is_accessible(codebase, property, context) {
        analyzer.report(
            IssueKind::InaccessibleProperty(format!(
                "{}::${}",
                property.declaring_class,
                name.value()
            )),
            span,
        )?;
    }
    Ok(property_type(codebase, property, None, &class))
}

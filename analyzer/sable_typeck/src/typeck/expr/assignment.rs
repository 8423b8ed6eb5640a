//! for assignments

use indexmap::IndexMap;
use sable_ast::expr::{ArrayItem, Assignment, ClassRef, Expr, ExprKind};
use sable_diagnostics::IssueKind;
use sable_utils::span::{Span, Spanned};

use super::{
    access::literal_key,
    analyze_expr, binary,
    helpers::{describe, resolve_class_ref, var_id_of},
    literals::analyze_reference_source,
    property::{is_accessible, property_type},
};
use crate::{
    typeck::{
        analyzer::{AnalysisResult, Analyzer},
        context::Context,
    },
    types::{
        combine, combine_atomics, combine_many, comparator::is_contained_by, generalize_shape, Atomic,
        ShapeKey, Union,
    },
};

/// `$x = v`, `$x += v`, `$x ??= v`, ...
///
/// Compound operators read the target, combine it with the value the way
/// the binary operator would and write the result back.
pub fn analyze_assignment(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    span: Span,
    op: Assignment,
    target: &Expr,
    value: &Expr,
) -> AnalysisResult<Union> {
    let result = match op {
        Assignment::Standard => analyze_expr(analyzer, context, value)?,
        Assignment::Coalesce => {
            let was_inside_isset = context.inside_isset;
            context.inside_isset = true;
            let current = analyze_expr(analyzer, context, target);
            context.inside_isset = was_inside_isset;
            let current = current?;

            let mut value_context = context.fork();
            value_context.assigned_var_ids.clear();
            let value_type = analyze_expr(analyzer, &mut value_context, value)?;
            context.absorb_possible_path(&value_context);

            if current.is_null() {
                value_type
            } else if current.is_nullable() || current.is_mixed() {
                combine(&current.without_null(), &value_type)
            } else {
                return Ok(current);
            }
        }
        Assignment::Arithmetic(op) => {
            let current = analyze_expr(analyzer, context, target)?;
            let value_type = analyze_expr(analyzer, context, value)?;
            binary::arithmetic_type(analyzer, span, op, &current, &value_type)?
        }
        Assignment::BinaryBitwise(op) => {
            let current = analyze_expr(analyzer, context, target)?;
            let value_type = analyze_expr(analyzer, context, value)?;
            binary::bitwise_type(analyzer, span, op, &current, &value_type)?
        }
        Assignment::Concat => {
            let current = analyze_expr(analyzer, context, target)?;
            let value_type = analyze_expr(analyzer, context, value)?;
            binary::concat_type(&current, &value_type)
        }
    };
    assign_to_target(analyzer, context, target, &result)?;
    Ok(result)
}

/// `$a = &$b`: both names now refer to one value
pub fn analyze_assign_ref(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    target: &Expr,
    source: &Expr,
) -> AnalysisResult<Union> {
    let mut ty = analyze_reference_source(analyzer, context, source)?;
    ty.by_ref = true;
    if let Some(source_id) = var_id_of(analyzer, context, source) {
        context.narrow(&source_id, ty.clone());
    }
    assign_to_target(analyzer, context, target, &ty)?;
    Ok(ty)
}

/// Store a value of type `ty` into the location `target` names
///
/// # Errors
/// Errors when a hard-stop diagnostic is reported.
pub fn assign_to_target(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    target: &Expr,
    ty: &Union,
) -> AnalysisResult {
    match target.kind() {
        ExprKind::Variable(name) => assign_variable(analyzer, context, target.span(), name, ty)?,
        ExprKind::ArrayDimFetch(base, dim) => {
            assign_offset(analyzer, context, target, base, dim.as_deref(), ty)?;
        }
        ExprKind::PropertyFetch { object, name, .. } => {
            assign_property(analyzer, context, target, object, name, ty)?;
        }
        ExprKind::StaticPropertyFetch(class, name) => {
            assign_static_property(analyzer, context, target, class, name, ty)?;
        }
        ExprKind::Array(items) => destructure(analyzer, context, items, ty)?,
        _ => {
            analyze_expr(analyzer, context, target)?;
            return Ok(());
        }
    }
    analyzer.set_expr_type(target, ty);
    Ok(())
}

/// `$name = ...`
fn assign_variable(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    span: Span,
    name: &str,
    ty: &Union,
) -> AnalysisResult {
    let var_id = format!("${name}");
    if name == "this" {
        analyzer.report(IssueKind::InvalidScope("assignment".to_string()), span)?;
        return Ok(());
    }
    if let Some(constraint) = context.byref_constraints.get(&var_id) {
        let result = is_contained_by(analyzer.codebase, ty, constraint, false, false);
        if !result.is_contained && !result.type_coerced_from_mixed {
            let expected = constraint.get_id();
            analyzer.report(
                IssueKind::ReferenceConstraintViolation {
                    var: var_id.clone(),
                    expected,
                    got: ty.get_id(),
                },
                span,
            )?;
        }
    }

    let mut ty = ty.clone().possibly_undefined(false);
    ty.by_ref = ty.by_ref || context.get(&var_id).is_some_and(|existing| existing.by_ref);
    context.set(&var_id, ty);
    Ok(())
}

/// `$a[k] = ...` and `$a[] = ...`
///
/// The container is rebuilt with the new entry and assigned back to its own
/// location, so nested writes such as `$a['x']['y'] = 1` build nested shapes.
fn assign_offset(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    target: &Expr,
    base: &Expr,
    dim: Option<&Expr>,
    ty: &Union,
) -> AnalysisResult {
    let offset = match dim {
        Some(dim) => Some(analyze_expr(analyzer, context, dim)?),
        None => None,
    };

    let was_inside_isset = context.inside_isset;
    context.inside_isset = true;
    let container = analyze_expr(analyzer, context, base);
    context.inside_isset = was_inside_isset;
    let container = container?;

    let write = OffsetWrite {
        key: offset.as_ref().and_then(literal_key),
        offset: offset.as_ref(),
        value: ty,
        inside_loop: context.inside_loop,
    };
    let mut atomics = vec![];
    for atomic in container.atomics() {
        match write.apply(atomic) {
            Some(atomic) => atomics.push(atomic),
            None => {
                analyzer.report(
                    IssueKind::InvalidArrayAccess(describe(analyzer, context, base)),
                    target.span(),
                )?;
                atomics.push(atomic.clone());
            }
        }
    }
    let new_container = combine_atomics(atomics);

    assign_to_target(analyzer, context, base, &new_container)?;
    if dim.is_some() {
        if let Some(var_id) = var_id_of(analyzer, context, target) {
            context.narrow(&var_id, ty.clone().possibly_undefined(false));
        }
    }
    Ok(())
}

/// One write into an array, applied to each alternative of the container
struct OffsetWrite<'a> {
    /// The offset, when it is a single literal
    key: Option<ShapeKey>,
    /// The offset type, `None` for `$a[]`
    offset: Option<&'a Union>,
    /// The value written
    value: &'a Union,
    /// Whether the write repeats in a loop
    inside_loop: bool,
}

impl OffsetWrite<'_> {
    /// The container after the write. `None` when the container cannot be
    /// written into.
    fn apply(&self, atomic: &Atomic) -> Option<Atomic> {
        Some(match atomic {
            Atomic::Null | Atomic::Empty | Atomic::False => self.into_empty(),
            Atomic::Array { key, .. } if key.is_empty_type() => self.into_empty(),
            Atomic::ObjectShape { properties, sealed } => match (&self.key, self.offset) {
                (Some(key), _) => {
                    let mut properties = properties.clone();
                    properties.insert(key.clone(), self.value.clone().possibly_undefined(false));
                    Atomic::ObjectShape {
                        properties,
                        sealed: *sealed,
                    }
                }
                (None, None) if *sealed && !self.inside_loop => {
                    let next = properties
                        .keys()
                        .map(|key| match key {
                            ShapeKey::Int(index) => index.saturating_add(1),
                            ShapeKey::String(_) => 0,
                        })
                        .max()
                        .unwrap_or(0);
                    let mut properties = properties.clone();
                    properties.insert(ShapeKey::Int(next), self.value.clone().possibly_undefined(false));
                    Atomic::ObjectShape {
                        properties,
                        sealed: true,
                    }
                }
                _ => self.into_array(&generalize_shape(atomic)),
            },
            Atomic::Array { .. } => self.into_array(atomic),
            Atomic::Mixed | Atomic::GenericParam { .. } | Atomic::NamedObject { .. } => atomic.clone(),
            atomic if atomic.is_string() && self.offset.is_some() => Atomic::String,
            _ => return None,
        })
    }

    /// Writing into nothing creates the array
    fn into_empty(&self) -> Atomic {
        match (&self.key, self.offset) {
            (Some(key), _) => Atomic::ObjectShape {
                properties: IndexMap::from([(key.clone(), self.value.clone().possibly_undefined(false))]),
                sealed: true,
            },
            (None, None) if !self.inside_loop => Atomic::ObjectShape {
                properties: IndexMap::from([(ShapeKey::Int(0), self.value.clone().possibly_undefined(false))]),
                sealed: true,
            },
            _ => Atomic::Array {
                key: Box::new(self.key_type()),
                value: Box::new(self.value.clone().possibly_undefined(false)),
                count: Some(1),
            },
        }
    }

    /// Writing into a general array widens its key and value types
    fn into_array(&self, array: &Atomic) -> Atomic {
        let Atomic::Array { key, value, .. } = array else {
            return array.clone();
        };
        Atomic::Array {
            key: Box::new(combine(key, &self.key_type())),
            value: Box::new(combine(value, &self.value.clone().possibly_undefined(false))),
            count: Some(1),
        }
    }

    /// The key type an entry is stored under
    fn key_type(&self) -> Union {
        match (&self.key, self.offset) {
            (Some(key), _) => key.to_atomic().into(),
            (None, None) => Union::int(),
            (None, Some(offset)) if offset.has_int() || offset.has_string() => {
                offset.generalize_literals()
            }
            (None, Some(_)) => Atomic::ArrayKey.into(),
        }
    }
}

/// `$o->p = ...`
fn assign_property(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    target: &Expr,
    object: &Expr,
    name: &Spanned<String>,
    ty: &Union,
) -> AnalysisResult {
    let object_type = analyze_expr(analyzer, context, object)?;
    let span = target.span();
    let codebase = analyzer.codebase;

    for atomic in object_type.atomics() {
        let Atomic::NamedObject { name: class, .. } = atomic else {
            if !matches!(
                atomic,
                Atomic::Null | Atomic::Mixed | Atomic::Object | Atomic::GenericParam { .. } | Atomic::Empty
            ) {
                analyzer.report(IssueKind::InvalidPropertyFetch(atomic.get_id()), span)?;
            }
            continue;
        };
        let Some(class_storage) = codebase.get_class(class) else {
            continue;
        };
        let has_magic_set = codebase.method_exists(class, "__set");
        let property = codebase
            .get_property(class, name.value())
            .filter(|property| !property.is_static);
        let Some(property) = property else {
            if !has_magic_set || class_storage.sealed_properties {
                analyzer.report(
                    IssueKind::UndefinedPropertyAssignment(format!(
                        "{}::${}",
                        class_storage.name,
                        name.value()
                    )),
                    span,
                )?;
            }
            continue;
        };
        if !is_accessible(codebase, property, context) {
            if has_magic_set {
                continue;
            }
            analyzer.report(
                IssueKind::InaccessibleProperty(format!(
                    "{}::${}",
                    property.declaring_class,
                    name.value()
                )),
                span,
            )?;
        }
        let declared = property_type(codebase, property, Some(atomic), class);
        check_property_value(
            analyzer,
            &format!("{}::${}", property.declaring_class, name.value()),
            &declared,
            ty,
            span,
        )?;
    }

    if object_type.is_nullable() {
        let container = describe(analyzer, context, object);
        let issue = if object_type.is_null() {
            IssueKind::NullPropertyFetch(container)
        } else {
            IssueKind::PossiblyNullPropertyFetch(container)
        };
        analyzer.report(issue, object.span())?;
    }

    if let Some(var_id) = var_id_of(analyzer, context, target) {
        context.set(&var_id, ty.clone().possibly_undefined(false));
    }
    Ok(())
}

/// `Foo::$p = ...`
fn assign_static_property(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    target: &Expr,
    class: &ClassRef,
    name: &Spanned<String>,
    ty: &Union,
) -> AnalysisResult {
    let span = target.span();
    let Some(class) = resolve_class_ref(analyzer, context, class, span)? else {
        return Ok(());
    };
    let codebase = analyzer.codebase;
    let property = codebase
        .get_property(&class, name.value())
        .filter(|property| property.is_static);
    let Some(property) = property else {
        analyzer.report(
            IssueKind::UndefinedPropertyAssignment(format!("{class}::${}", name.value())),
            span,
        )?;
        return Ok(());
    };
    let property_id = format!("{}::${}", property.declaring_class, name.value());
    if !is_accessible(codebase, property, context) {
        analyzer.report(IssueKind::InaccessibleProperty(property_id.clone()), span)?;
    }
    let declared = property_type(codebase, property, None, &class);
    check_property_value(analyzer, &property_id, &declared, ty, span)?;

    if let Some(var_id) = var_id_of(analyzer, context, target) {
        context.set(&var_id, ty.clone().possibly_undefined(false));
    }
    Ok(())
}

/// Check a value stored into a property declared as `declared`
///
/// # Errors
/// Errors when a hard-stop diagnostic is reported.
pub fn check_property_value(
    analyzer: &mut Analyzer<'_>,
    property_id: &str,
    declared: &Union,
    ty: &Union,
    span: Span,
) -> AnalysisResult {
    if declared.is_mixed() || ty.is_empty_type() {
        return Ok(());
    }
    let invalid = || IssueKind::InvalidPropertyAssignment {
        property: property_id.to_string(),
        expected: declared.get_id(),
        got: ty.get_id(),
    };
    if ty.is_nullable() && !declared.is_nullable() {
        let issue = if ty.is_null() {
            invalid()
        } else {
            IssueKind::PossiblyNullPropertyAssignment(property_id.to_string())
        };
        analyzer.report(issue, span)?;
        if ty.is_null() {
            return Ok(());
        }
    }
    let result = is_contained_by(analyzer.codebase, ty, declared, true, false);
    if !result.is_contained && !result.type_coerced_from_mixed {
        analyzer.report(invalid(), span)?;
    }
    Ok(())
}

/// `[$a, 'k' => $b] = ...`
fn destructure(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    items: &[ArrayItem],
    ty: &Union,
) -> AnalysisResult {
    let mut next_index = 0_i64;
    for item in items {
        let key = match &item.key {
            Some(key) => {
                let key_type = analyze_expr(analyzer, context, key)?;
                literal_key(&key_type)
            }
            None => {
                let key = ShapeKey::Int(next_index);
                next_index += 1;
                Some(key)
            }
        };
        let value_type = destructured_value(ty, key.as_ref());
        assign_to_target(analyzer, context, &item.value, &value_type)?;
    }
    Ok(())
}

/// The type of one entry taken apart from `ty`
fn destructured_value(ty: &Union, key: Option<&ShapeKey>) -> Union {
    let mut values = vec![];
    for atomic in ty.atomics() {
        match atomic {
            Atomic::ObjectShape { properties, .. } => {
                match key.and_then(|key| properties.get(key)) {
                    Some(value) => values.push(value.clone().possibly_undefined(false)),
                    None => match generalize_shape(atomic) {
                        Atomic::Array { value, .. } => values.push(*value),
                        _ => values.push(Union::null()),
                    },
                }
            }
            Atomic::Array { key: array_key, value, .. } if !array_key.is_empty_type() => {
                values.push((**value).clone());
            }
            Atomic::Array { .. } | Atomic::Null => values.push(Union::null()),
            _ => values.push(Union::mixed()),
        }
    }
    if values.is_empty() {
        Union::mixed()
    } else {
        combine_many(&values)
    }
}

#[cfg(test)]
mod tests {
    use sable_ast::{
        decl::Visibility,
        expr::{Arithmetic, Assignment},
        AstBuilder,
    };

    use crate::typeck::test_utils::check;

    #[test]
    fn compound_assignments_use_the_operator() {
        let b = AstBuilder::new();
        let checked = check(&[
            b.assign_stmt(b.var("n"), b.int(1)),
            b.expr_stmt(b.assign_op(Assignment::Arithmetic(Arithmetic::Addition), b.var("n"), b.int(2))),
            b.assign_stmt(b.var("s"), b.string("a")),
            b.expr_stmt(b.assign_op(Assignment::Concat, b.var("s"), b.string("b"))),
            b.expr_stmt(b.assign_op(Assignment::Coalesce, b.var("u"), b.int(5))),
        ]);
        assert!(checked.issues().is_empty(), "{:?}", checked.issues());
        assert_eq!(checked.type_of("$n").as_deref(), Some("int(3)"));
        assert_eq!(checked.type_of("$s").as_deref(), Some("string(ab)"));
        assert_eq!(checked.type_of("$u").as_deref(), Some("int(5)"));
    }

    #[test]
    fn offset_writes_build_shapes() {
        let b = AstBuilder::new();
        let checked = check(&[
            b.assign_stmt(b.dim(b.var("a"), b.string("x")), b.int(1)),
            b.assign_stmt(b.dim(b.dim(b.var("a"), b.string("y")), b.string("z")), b.bool(true)),
            b.assign_stmt(b.push_dim(b.var("list")), b.string("first")),
            b.assign_stmt(b.push_dim(b.var("list")), b.string("second")),
        ]);
        assert!(checked.issues().is_empty(), "{:?}", checked.issues());
        assert_eq!(
            checked.type_of("$a").as_deref(),
            Some("array{x: int(1), y: array{z: true}}")
        );
        assert_eq!(checked.type_of("$a['y']").as_deref(), Some("array{z: true}"));
        assert_eq!(
            checked.type_of("$list").as_deref(),
            Some("array{0: string(first), 1: string(second)}")
        );
    }

    #[test]
    fn pushes_inside_loops_make_lists() {
        let b = AstBuilder::new();
        let checked = check(&[
            b.assign_stmt(b.var("out"), b.list(vec![])),
            b.foreach(
                b.call("explode", vec![b.string(","), b.string("a,b")]),
                None,
                b.var("part"),
                vec![b.assign_stmt(b.push_dim(b.var("out")), b.var("part"))],
            ),
        ]);
        assert!(checked.issues().is_empty(), "{:?}", checked.issues());
        let out = checked.type_of("$out");
        assert!(
            matches!(out.as_deref(), Some("array<int, string>" | "non-empty-array<int, string>")),
            "{out:?}"
        );
    }

    #[test]
    fn scalars_cannot_take_offsets() {
        let b = AstBuilder::new();
        let checked = check(&[
            b.assign_stmt(b.var("n"), b.int(1)),
            b.assign_stmt(b.dim(b.var("n"), b.int(0)), b.int(2)),
        ]);
        assert_eq!(checked.issues(), vec!["InvalidArrayAccess"]);
    }

    #[test]
    fn destructuring_takes_entries_apart() {
        let b = AstBuilder::new();
        let checked = check(&[
            b.assign_stmt(b.var("pair"), b.list(vec![b.int(1), b.string("x")])),
            b.assign_stmt(b.list(vec![b.var("first"), b.var("second")]), b.var("pair")),
        ]);
        assert!(checked.issues().is_empty(), "{:?}", checked.issues());
        assert_eq!(checked.type_of("$first").as_deref(), Some("int(1)"));
        assert_eq!(checked.type_of("$second").as_deref(), Some("string(x)"));
    }

    #[test]
    fn property_assignments_are_checked() {
        let b = AstBuilder::new();
        let class = b
            .class("User")
            .with_property(b.property("name").typed("string"))
            .with_property(b.property("id").typed("int").with_visibility(Visibility::Private));
        let checked = check(&[
            b.class_stmt(class),
            b.assign_stmt(b.var("u"), b.new_named("User", vec![])),
            b.assign_stmt(b.prop(b.var("u"), "name"), b.string("ada")),
            b.assign_stmt(b.prop(b.var("u"), "name"), b.int(4)),
            b.assign_stmt(b.prop(b.var("u"), "name"), b.null()),
            b.assign_stmt(b.prop(b.var("u"), "id"), b.int(1)),
            b.assign_stmt(b.prop(b.var("u"), "nope"), b.int(1)),
        ]);
        assert_eq!(
            checked.issues(),
            vec![
                "InvalidPropertyAssignment",
                "InvalidPropertyAssignment",
                "InaccessibleProperty",
                "UndefinedPropertyAssignment",
            ]
        );
        assert_eq!(checked.type_of("$u->nope").as_deref(), Some("int(1)"));
    }

    #[test]
    fn references_share_a_value() {
        let b = AstBuilder::new();
        let checked = check(&[b.expr_stmt(b.assign_ref(b.var("alias"), b.var("fresh")))]);
        assert!(checked.issues().is_empty(), "{:?}", checked.issues());
        assert_eq!(checked.type_of("$fresh").as_deref(), Some("null"));
        assert_eq!(checked.type_of("$alias").as_deref(), Some("null"));
    }
}

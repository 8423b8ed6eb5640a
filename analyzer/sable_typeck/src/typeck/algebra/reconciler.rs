//! Narrow the types in a context with the assertions a formula implies

use indexmap::IndexMap;
use sable_diagnostics::IssueKind;
use sable_utils::span::{Span, Spanned};
use tracing::trace;

use super::Assertion;
use crate::{
    codebase::Codebase,
    typeck::{context::Context, var_id::split_last_access},
    types::{
        combine_atomics_keeping_literals, combine_many, combine_many_keeping_literals,
        comparator::atomic_is_contained_by, Atomic, ShapeKey, TypeComparisonResult, Union,
    },
};

/// Apply per-variable assertions to `context`
///
/// Each entry holds a conjunction of disjunctions. Every disjunction is
/// applied to the type the variable had before it, and the results of its
/// alternatives are combined. Asserting that a keyed location is set also
/// asserts that every location it is reached through is set.
///
/// With `report_issues`, assertions that always or never hold are returned
/// as `RedundantCondition` and `TypeDoesNotContainType` issues.
pub fn reconcile_keyed_types(
    codebase: &Codebase,
    new_types: &IndexMap<String, Vec<Vec<Assertion>>>,
    context: &mut Context,
    span: Span,
    report_issues: bool,
) -> Vec<Spanned<IssueKind>> {
    let mut issues = vec![];

    let mut var_ids = new_types.keys().collect::<Vec<_>>();
    var_ids.sort_by_key(|var_id| access_depth(var_id));

    for var_id in var_ids {
        let groups = &new_types[var_id];
        let Some(existing) = context
            .get(var_id)
            .cloned()
            .or_else(|| get_value_for_key(codebase, var_id, context))
        else {
            continue;
        };

        let mut result = existing.clone();
        for group in groups {
            let before = result.clone();
            let alternatives = group
                .iter()
                .map(|assertion| {
                    reconcile(
                        codebase,
                        assertion,
                        &before,
                        var_id,
                        span,
                        report_issues && group.len() == 1,
                        &mut issues,
                    )
                })
                .collect::<Vec<_>>();
            result = if alternatives.len() == 1 {
                alternatives.into_iter().next().unwrap_or_else(Union::mixed)
            } else {
                combine_many_keeping_literals(&alternatives)
            };
        }

        trace!(var_id = %var_id, from = %existing, to = %result, "reconciled");

        if groups.iter().flatten().any(implies_set) {
            mark_ancestors_set(codebase, var_id, &result, context);
        }
        context.narrow(var_id, result);
    }

    issues
}

/// How many access steps deep a var id is
fn access_depth(var_id: &str) -> usize {
    let mut depth = 0;
    let mut current = var_id;
    while let Some((base, _)) = split_last_access(current) {
        depth += 1;
        current = base;
    }
    depth
}

/// Whether an assertion holding means the location is set
const fn implies_set(assertion: &Assertion) -> bool {
    match assertion {
        Assertion::Truthy | Assertion::IsIsset | Assertion::IsIdentical(_) => true,
        Assertion::IsType(atomic) => !matches!(atomic, Atomic::Null),
        _ => false,
    }
}

/// Every location `var_id` is reached through is set and not null, and
/// shapes along the way have the accessed key
fn mark_ancestors_set(codebase: &Codebase, var_id: &str, value: &Union, context: &mut Context) {
    let mut child = var_id.to_string();
    let mut child_type = value.clone();
    while let Some((base, step)) = split_last_access(&child) {
        let base = base.to_string();
        let Some(mut base_type) = context
            .get(&base)
            .cloned()
            .or_else(|| get_value_for_key(codebase, &base, context))
        else {
            break;
        };
        if !base_type.is_mixed() {
            base_type.remove("null");
        }
        base_type.possibly_undefined = false;
        if let Some(key) = parse_literal_offset(step) {
            base_type = with_shape_key(&base_type, &key, &child_type);
        }
        context.vars_in_scope.insert(base.clone(), base_type.clone());
        child_type = base_type;
        child = base;
    }
}

/// `base_type` with every shape member's `key` set to `value`
fn with_shape_key(base_type: &Union, key: &ShapeKey, value: &Union) -> Union {
    let mut value = value.clone();
    value.possibly_undefined = false;
    let atomics = base_type
        .atomics()
        .map(|atomic| match atomic {
            Atomic::ObjectShape { properties, sealed } => {
                let mut properties = properties.clone();
                properties.insert(key.clone(), value.clone());
                Atomic::ObjectShape {
                    properties,
                    sealed: *sealed,
                }
            }
            other => other.clone(),
        })
        .collect();
    Union::new(atomics).with_flags_of(base_type)
}

/// The literal key of an access step like `['k']` or `[3]`
fn parse_literal_offset(step: &str) -> Option<ShapeKey> {
    let inner = step.strip_prefix('[')?.strip_suffix(']')?;
    if let Some(quoted) = inner.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        return Some(ShapeKey::String(quoted.to_string()));
    }
    inner.parse().ok().map(ShapeKey::Int)
}

/// The type of a keyed location nothing has narrowed yet, derived from the
/// type of the location it is reached through
#[must_use]
pub fn get_value_for_key(codebase: &Codebase, var_id: &str, context: &Context) -> Option<Union> {
    if let Some((class, property)) = var_id.split_once("::$") {
        return codebase
            .get_property(class, property)
            .map(|property| property.ty.clone().unwrap_or_else(Union::mixed));
    }

    let (base, step) = split_last_access(var_id)?;
    let base_type = context
        .get(base)
        .cloned()
        .or_else(|| get_value_for_key(codebase, base, context))?;

    let mut values = vec![];
    if let Some(property) = step.strip_prefix("->") {
        if property.ends_with("()") {
            return None;
        }
        for atomic in base_type.atomics() {
            match atomic {
                Atomic::NamedObject { name, .. } => values.push(
                    codebase
                        .get_property(name, property)
                        .and_then(|property| property.ty.clone())
                        .unwrap_or_else(Union::mixed),
                ),
                Atomic::Object | Atomic::Mixed => values.push(Union::mixed()),
                _ => {}
            }
        }
    } else {
        let key = parse_literal_offset(step);
        for atomic in base_type.atomics() {
            match atomic {
                Atomic::ObjectShape { properties, sealed } => match &key {
                    Some(key) => match properties.get(key) {
                        Some(value) => values.push(value.clone()),
                        None if *sealed => values.push(Union::null().possibly_undefined(true)),
                        None => values.push(Union::mixed().possibly_undefined(true)),
                    },
                    None => values.extend(properties.values().map(|value| {
                        value.clone().possibly_undefined(true)
                    })),
                },
                Atomic::Array { value, .. } => {
                    values.push((**value).clone().possibly_undefined(true));
                }
                Atomic::Mixed => values.push(Union::mixed().possibly_undefined(true)),
                _ => {}
            }
        }
    }

    if values.is_empty() {
        None
    } else {
        Some(combine_many(&values))
    }
}

/// Apply one assertion to one type
fn reconcile(
    codebase: &Codebase,
    assertion: &Assertion,
    existing: &Union,
    var_id: &str,
    span: Span,
    report_issues: bool,
    issues: &mut Vec<Spanned<IssueKind>>,
) -> Union {
    if existing.is_empty_type() {
        return existing.clone();
    }

    let mut report = |redundant: bool| {
        if !report_issues {
            return;
        }
        let var = var_id.to_string();
        let existing = existing.to_string();
        let asserted = assertion.to_string();
        issues.push(
            if redundant {
                IssueKind::RedundantCondition {
                    var,
                    existing,
                    asserted,
                }
            } else {
                IssueKind::TypeDoesNotContainType {
                    var,
                    existing,
                    asserted,
                }
            }
            .at(span),
        );
    };

    let (atomics, changed) = match assertion {
        Assertion::Truthy => {
            if existing.is_mixed() {
                return Union::mixed();
            }
            reconcile_truthy(existing)
        }
        Assertion::Falsy => {
            if existing.is_mixed() {
                return existing.clone();
            }
            reconcile_falsy(existing)
        }
        Assertion::IsIsset => {
            if existing.is_null() {
                report(false);
                return Union::empty();
            }
            let mut result = existing.without_null();
            result.possibly_undefined = false;
            return result;
        }
        Assertion::IsNotIsset => {
            if !existing.is_nullable() && !existing.possibly_undefined && !existing.is_mixed() {
                report(false);
            }
            return Union::null().possibly_undefined(true);
        }
        Assertion::IsType(asserted) => {
            if existing.is_mixed() {
                return Union::from(asserted.clone()).from_mixed();
            }
            reconcile_is_type(codebase, existing, asserted)
        }
        Assertion::IsNotType(asserted) => {
            if existing.is_mixed() {
                return existing.clone();
            }
            reconcile_is_not_type(codebase, existing, asserted)
        }
        Assertion::IsIdentical(literal) => {
            if existing.is_mixed() {
                return Union::from(literal.clone()).from_mixed();
            }
            let atomics = existing
                .atomics()
                .filter_map(|atomic| {
                    if atomic.get_id() == literal.get_id() {
                        Some(atomic.clone())
                    } else if contained(codebase, literal, atomic)
                        || matches!(atomic, Atomic::GenericParam { .. })
                    {
                        Some(literal.clone())
                    } else {
                        None
                    }
                })
                .collect::<Vec<_>>();
            let changed = existing.single().map(Atomic::get_id) != Some(literal.get_id());
            (atomics, changed)
        }
        Assertion::IsNotIdentical(literal) => {
            let atomics = existing
                .atomics()
                .filter(|atomic| atomic.get_id() != literal.get_id())
                .cloned()
                .collect::<Vec<_>>();
            // `!== 5` on an `int` is never worth reporting as redundant
            (atomics, true)
        }
    };

    if atomics.is_empty() {
        report(false);
        return Union::empty();
    }
    if !changed && !existing.possibly_undefined {
        report(true);
    }

    let mut result = combine_atomics_keeping_literals(atomics).with_flags_of(existing);
    if implies_set(assertion) || assertion == &Assertion::IsNotType(Atomic::Null) {
        result.possibly_undefined = false;
    }
    result
}

/// Containment of one atomic in another, ignoring coercion details
fn contained(codebase: &Codebase, input: &Atomic, container: &Atomic) -> bool {
    atomic_is_contained_by(codebase, input, container, &mut TypeComparisonResult::default())
}

/// The truthy part of a type, and whether anything was removed
fn reconcile_truthy(existing: &Union) -> (Vec<Atomic>, bool) {
    let mut changed = existing.possibly_undefined;
    let mut atomics = vec![];
    for atomic in existing.atomics() {
        if atomic.is_always_falsy() {
            changed = true;
            continue;
        }
        match atomic {
            Atomic::Bool => {
                changed = true;
                atomics.push(Atomic::True);
            }
            Atomic::Array { key, value, count } if count.unwrap_or(0) == 0 => {
                changed = true;
                atomics.push(Atomic::Array {
                    key: key.clone(),
                    value: value.clone(),
                    count: Some(1),
                });
            }
            other => {
                if !other.is_always_truthy() {
                    changed = true;
                }
                atomics.push(other.clone());
            }
        }
    }
    (atomics, changed)
}

/// The falsy part of a type, and whether anything was removed
fn reconcile_falsy(existing: &Union) -> (Vec<Atomic>, bool) {
    let mut changed = false;
    let mut atomics = vec![];
    for atomic in existing.atomics() {
        if atomic.is_always_truthy() {
            changed = true;
            continue;
        }
        match atomic {
            Atomic::Bool => {
                changed = true;
                atomics.push(Atomic::False);
            }
            Atomic::Array { .. } if !atomic.is_always_falsy() => {
                changed = true;
                atomics.push(Atomic::empty_array());
            }
            other => {
                if !other.is_always_falsy() {
                    changed = true;
                }
                atomics.push(other.clone());
            }
        }
    }
    (atomics, changed)
}

/// The part of a type that is also of type `asserted`, and whether that is
/// less than the whole type
fn reconcile_is_type(codebase: &Codebase, existing: &Union, asserted: &Atomic) -> (Vec<Atomic>, bool) {
    let mut changed = false;
    let mut atomics = vec![];
    for atomic in existing.atomics() {
        if contained(codebase, atomic, asserted) {
            atomics.push(atomic.clone());
            continue;
        }
        changed = true;
        if contained(codebase, asserted, atomic) {
            atomics.push(asserted.clone());
            continue;
        }
        match (atomic, asserted) {
            (Atomic::GenericParam { as_type, .. }, _) => {
                if as_type.is_mixed() || as_type.atomics().any(|bound| contained(codebase, asserted, bound)) {
                    atomics.push(asserted.clone());
                }
            }
            (Atomic::NamedObject { name: existing_class, .. }, Atomic::NamedObject { name: asserted_class, .. })
                if codebase.interface_exists(existing_class) || codebase.interface_exists(asserted_class) =>
            {
                atomics.push(asserted.clone());
            }
            _ => {}
        }
    }
    (atomics, changed)
}

/// The part of a type that is not of type `asserted`, and whether anything
/// was removed
fn reconcile_is_not_type(codebase: &Codebase, existing: &Union, asserted: &Atomic) -> (Vec<Atomic>, bool) {
    let mut changed = false;
    let mut atomics = vec![];
    for atomic in existing.atomics() {
        match (atomic, asserted) {
            (Atomic::Bool, Atomic::True) => {
                changed = true;
                atomics.push(Atomic::False);
            }
            (Atomic::Bool, Atomic::False) => {
                changed = true;
                atomics.push(Atomic::True);
            }
            _ if contained(codebase, atomic, asserted) => changed = true,
            _ => atomics.push(atomic.clone()),
        }
    }
    (atomics, changed)
}

#[cfg(test)]
mod tests {
    use sable_ast::decl::Visibility;
    use sable_utils::span::Span;

    use super::*;
    use crate::codebase::{ClassStorage, PropertyStorage};

    fn span() -> Span {
        Span::from_positions(0, 0)
    }

    fn codebase() -> Codebase {
        let mut codebase = Codebase::new_empty();
        codebase.add_class(ClassStorage::new("Foo", span()));
        let mut child = ClassStorage::new("FooChild", span());
        child.parent = Some("Foo".to_string());
        child.properties.insert(
            "name".to_string(),
            PropertyStorage {
                name: "name".to_string(),
                ty: Some(Union::new(vec![Atomic::String, Atomic::Null])),
                visibility: Visibility::Public,
                is_static: false,
                has_default: false,
                declaring_class: "FooChild".to_string(),
            },
        );
        codebase.add_class(child);
        codebase
    }

    fn reconcile_one(
        codebase: &Codebase,
        existing: Union,
        assertion: Assertion,
    ) -> (String, Vec<&'static str>) {
        let mut context = Context::new(None);
        context.set("$a", existing);
        let issues = reconcile_keyed_types(
            codebase,
            &IndexMap::from([("$a".to_string(), vec![vec![assertion]])]),
            &mut context,
            span(),
            true,
        );
        (
            context.get("$a").map(ToString::to_string).unwrap_or_default(),
            issues.iter().map(|issue| issue.value().name()).collect(),
        )
    }

    #[test]
    fn not_null_removes_null() {
        let codebase = codebase();
        let ty = Union::new(vec![Atomic::Null, Atomic::named("Foo")]);
        assert_eq!(
            reconcile_one(&codebase, ty, Assertion::IsNotType(Atomic::Null)),
            ("Foo".to_string(), vec![])
        );
    }

    #[test]
    fn isset_removes_null_and_undefinedness() {
        let codebase = codebase();
        let ty = Union::new(vec![Atomic::named("Foo"), Atomic::Null]).possibly_undefined(true);
        let (result, issues) = reconcile_one(&codebase, ty, Assertion::IsIsset);
        assert_eq!(result, "Foo");
        assert!(issues.is_empty());
    }

    #[test]
    fn asserting_a_type_on_mixed() {
        let codebase = codebase();
        assert_eq!(
            reconcile_one(&codebase, Union::mixed(), Assertion::IsType(Atomic::Int)),
            ("int".to_string(), vec![])
        );
    }

    #[test]
    fn narrowing_mixed_marks_the_result() {
        let codebase = codebase();
        let mut context = Context::new(None);
        context.set("$a", Union::mixed());
        context.set("$b", Union::new(vec![Atomic::Int, Atomic::String]));
        context.set("$c", Union::mixed());
        reconcile_keyed_types(
            &codebase,
            &IndexMap::from([
                ("$a".to_string(), vec![vec![Assertion::IsType(Atomic::Int)]]),
                ("$b".to_string(), vec![vec![Assertion::IsType(Atomic::Int)]]),
                (
                    "$c".to_string(),
                    vec![vec![Assertion::IsIdentical(Atomic::LiteralString("on".to_string()))]],
                ),
            ]),
            &mut context,
            span(),
            true,
        );
        let a = context.get("$a").expect("$a is narrowed");
        assert_eq!(a.to_string(), "int");
        assert!(a.from_mixed);
        let b = context.get("$b").expect("$b is narrowed");
        assert_eq!(b.to_string(), "int");
        assert!(!b.from_mixed);
        assert!(context.get("$c").is_some_and(|ty| ty.from_mixed));
    }

    #[test]
    fn instanceof_narrows_to_subclass() {
        let codebase = codebase();
        let ty = Union::new(vec![Atomic::named("Foo"), Atomic::Null]);
        assert_eq!(
            reconcile_one(&codebase, ty, Assertion::IsType(Atomic::named("FooChild"))),
            ("FooChild".to_string(), vec![])
        );
    }

    #[test]
    fn redundant_and_impossible_conditions() {
        let codebase = codebase();
        assert_eq!(
            reconcile_one(&codebase, Union::named("FooChild"), Assertion::IsType(Atomic::named("Foo"))),
            ("FooChild".to_string(), vec!["RedundantCondition"])
        );
        assert_eq!(
            reconcile_one(&codebase, Union::int(), Assertion::IsType(Atomic::String)).1,
            vec!["TypeDoesNotContainType"]
        );
    }

    #[test]
    fn truthiness() {
        let codebase = codebase();
        let ty = Union::new(vec![Atomic::Bool, Atomic::Null, Atomic::Int]);
        assert_eq!(reconcile_one(&codebase, ty.clone(), Assertion::Truthy).0, "true|int");
        assert_eq!(reconcile_one(&codebase, ty, Assertion::Falsy).0, "false|null|int");
    }

    #[test]
    fn disjunctions_combine_alternatives() {
        let codebase = codebase();
        let mut context = Context::new(None);
        context.set("$a", Union::new(vec![Atomic::Int, Atomic::String, Atomic::Null]));
        reconcile_keyed_types(
            &codebase,
            &IndexMap::from([(
                "$a".to_string(),
                vec![vec![Assertion::IsType(Atomic::Int), Assertion::IsType(Atomic::String)]],
            )]),
            &mut context,
            span(),
            true,
        );
        assert_eq!(context.get("$a").map(ToString::to_string).as_deref(), Some("int|string"));
    }

    #[test]
    fn keyed_isset_marks_ancestors() {
        let codebase = codebase();
        let mut context = Context::new(None);
        let mut properties = IndexMap::new();
        properties.insert(
            ShapeKey::String("k".to_string()),
            Union::int().possibly_undefined(true),
        );
        context.set(
            "$a",
            Union::new(vec![
                Atomic::ObjectShape {
                    properties,
                    sealed: true,
                },
                Atomic::Null,
            ]),
        );
        reconcile_keyed_types(
            &codebase,
            &IndexMap::from([("$a['k']".to_string(), vec![vec![Assertion::IsIsset]])]),
            &mut context,
            span(),
            true,
        );
        assert_eq!(context.get("$a['k']").map(ToString::to_string).as_deref(), Some("int"));
        assert_eq!(context.get("$a").map(ToString::to_string).as_deref(), Some("array{k: int}"));
    }

    #[test]
    fn properties_are_derived_from_declarations() {
        let codebase = codebase();
        let mut context = Context::new(None);
        context.set("$o", Union::named("FooChild"));
        assert_eq!(
            get_value_for_key(&codebase, "$o->name", &context).map(|ty| ty.to_string()),
            Some("string|null".to_string())
        );
        reconcile_keyed_types(
            &codebase,
            &IndexMap::from([("$o->name".to_string(), vec![vec![Assertion::IsNotType(Atomic::Null)]])]),
            &mut context,
            span(),
            true,
        );
        assert_eq!(context.get("$o->name").map(ToString::to_string).as_deref(), Some("string"));
    }
}

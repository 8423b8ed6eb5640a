//! Combining types: the union of two [`Union`]s
//!
//! Members that are structurally compatible are merged rather than listed
//! side by side. Plain combination widens literals eagerly: two different
//! literals of the same base type widen to that base type (`int(1)` and
//! `int(2)` give `int`). Where a union stands for a set of alternatives,
//! such as the join of branches or a disjunctive condition, the
//! `*_keeping_literals` variants hold up to [`LITERAL_LIMIT`] literals per
//! base type before widening. Class-string literals (`Foo::class`) are
//! never widened.

use indexmap::IndexMap;

use super::{Atomic, ShapeKey, Union};

/// How many literals of one base type a union keeps side by side before
/// they widen to the base type
pub const LITERAL_LIMIT: usize = 30;

/// Combine two unions
///
/// The result is possibly undefined if either side is, and from a
/// declaration only if both are.
#[must_use]
pub fn combine(a: &Union, b: &Union) -> Union {
    combine_flags(combine_atomics(a.atomics().chain(b.atomics()).cloned()), a, b)
}

/// Combine two unions, keeping distinct literals of the same base type
#[must_use]
pub fn combine_keeping_literals(a: &Union, b: &Union) -> Union {
    combine_flags(
        combine_atomics_keeping_literals(a.atomics().chain(b.atomics()).cloned()),
        a,
        b,
    )
}

/// Set the flags of `ty`, the combination of `a` and `b`
fn combine_flags(mut ty: Union, a: &Union, b: &Union) -> Union {
    ty.possibly_undefined = a.possibly_undefined || b.possibly_undefined;
    ty.from_declaration = a.from_declaration && b.from_declaration;
    ty.ignore_nullable_issues = a.ignore_nullable_issues || b.ignore_nullable_issues;
    ty.ignore_falsable_issues = a.ignore_falsable_issues || b.ignore_falsable_issues;
    ty.by_ref = a.by_ref || b.by_ref;
    ty.from_mixed = a.from_mixed || b.from_mixed;
    ty
}

/// Combine any number of unions. No unions gives the bottom type.
#[must_use]
pub fn combine_many<'a>(types: impl IntoIterator<Item = &'a Union>) -> Union {
    fold_unions(types, combine)
}

/// [`combine_many`], keeping distinct literals of the same base type
#[must_use]
pub fn combine_many_keeping_literals<'a>(types: impl IntoIterator<Item = &'a Union>) -> Union {
    fold_unions(types, combine_keeping_literals)
}

/// Fold `types` together with `join`
fn fold_unions<'a>(
    types: impl IntoIterator<Item = &'a Union>,
    join: fn(&Union, &Union) -> Union,
) -> Union {
    let mut types = types.into_iter();
    let Some(first) = types.next() else {
        return Union::empty();
    };
    types.fold(first.clone(), |acc, ty| join(&acc, ty))
}

/// The slot an atomic merges into. Atomics sharing a slot are merged into one.
fn slot_of(atomic: &Atomic, keep_literals: bool) -> String {
    match atomic {
        Atomic::LiteralInt(_) | Atomic::LiteralFloat(_) | Atomic::LiteralString(_)
            if keep_literals =>
        {
            atomic.get_id()
        }
        Atomic::Bool | Atomic::True | Atomic::False => "bool".to_string(),
        Atomic::Int | Atomic::LiteralInt(_) => "int".to_string(),
        Atomic::Float | Atomic::LiteralFloat(_) => "float".to_string(),
        Atomic::String | Atomic::LiteralString(_) | Atomic::SingleLetter => "string".to_string(),
        Atomic::Array { .. } | Atomic::ObjectShape { .. } => "array".to_string(),
        Atomic::NamedObject { name, .. } => {
            format!("object:{}", sable_utils::names::normalize_name(name))
        }
        other => other.get_id(),
    }
}

/// The base type slot of a literal
const fn literal_base(atomic: &Atomic) -> Option<&'static str> {
    match atomic {
        Atomic::LiteralInt(_) => Some("int"),
        Atomic::LiteralFloat(_) => Some("float"),
        Atomic::LiteralString(_) => Some("string"),
        _ => None,
    }
}

/// Combine a sequence of atomics into a union
#[must_use]
pub fn combine_atomics(atomics: impl IntoIterator<Item = Atomic>) -> Union {
    combine_atomics_with(atomics, false)
}

/// [`combine_atomics`], keeping distinct literals of the same base type
#[must_use]
pub fn combine_atomics_keeping_literals(atomics: impl IntoIterator<Item = Atomic>) -> Union {
    combine_atomics_with(atomics, true)
}

/// Combine atomics, giving each literal its own slot when `keep_literals`
/// is set
fn combine_atomics_with(atomics: impl IntoIterator<Item = Atomic>, keep_literals: bool) -> Union {
    let mut slots: IndexMap<String, Atomic> = IndexMap::new();

    for atomic in atomics {
        if matches!(atomic, Atomic::Mixed) {
            return Union::mixed();
        }
        let slot = slot_of(&atomic, keep_literals);
        if let Some(existing) = slots.get_mut(&slot) {
            let previous = std::mem::replace(existing, Atomic::Empty);
            *existing = merge_slot(previous, atomic);
        } else {
            slots.insert(slot, atomic);
        }
    }

    if keep_literals {
        widen_kept_literals(&mut slots);
    }

    let has = |slots: &IndexMap<String, Atomic>, atomic: &Atomic| slots.contains_key(&atomic.get_id());
    if has(&slots, &Atomic::Scalar) {
        slots.retain(|_, atomic| matches!(atomic, Atomic::Scalar) || !atomic.is_scalar());
    }
    if has(&slots, &Atomic::ArrayKey) {
        slots.retain(|_, atomic| {
            matches!(atomic, Atomic::ArrayKey) || !(atomic.is_int() || atomic.is_string())
        });
    }
    if has(&slots, &Atomic::Numeric) {
        slots.retain(|_, atomic| !(atomic.is_int() || atomic.is_float()));
    }
    if matches!(slots.get("string"), Some(Atomic::String)) {
        slots.retain(|_, atomic| {
            !matches!(atomic, Atomic::ClassString(_) | Atomic::LiteralClassString(_))
        });
    }
    if has(&slots, &Atomic::ClassString(None)) {
        slots.retain(|_, atomic| {
            !matches!(
                atomic,
                Atomic::ClassString(Some(_)) | Atomic::LiteralClassString(_)
            )
        });
    }
    if has(&slots, &Atomic::Object) {
        slots.retain(|_, atomic| !matches!(atomic, Atomic::NamedObject { .. }));
    }
    if slots.len() > 1 {
        slots.shift_remove("empty");
    }

    Union::new(slots.into_values().collect())
}

/// Drop literals a general member of their base type already covers, and
/// widen any base type holding more than [`LITERAL_LIMIT`] literals
fn widen_kept_literals(slots: &mut IndexMap<String, Atomic>) {
    let int = matches!(slots.get("int"), Some(Atomic::Int));
    let float = matches!(slots.get("float"), Some(Atomic::Float));
    let string = matches!(slots.get("string"), Some(Atomic::String));
    let single_letter = matches!(slots.get("string"), Some(Atomic::SingleLetter));
    slots.retain(|_, atomic| match atomic {
        Atomic::LiteralInt(_) => !int,
        Atomic::LiteralFloat(_) => !float,
        Atomic::LiteralString(s) => !(string || (single_letter && s.chars().count() == 1)),
        _ => true,
    });

    for (base, general) in [
        ("int", Atomic::Int),
        ("float", Atomic::Float),
        ("string", Atomic::String),
    ] {
        let count = slots
            .values()
            .filter(|atomic| literal_base(atomic) == Some(base))
            .count();
        if count <= LITERAL_LIMIT {
            continue;
        }
        let first = slots
            .values()
            .position(|atomic| literal_base(atomic) == Some(base))
            .unwrap_or_default();
        slots.retain(|_, atomic| literal_base(atomic) != Some(base));
        if slots.contains_key(base) {
            slots.insert(base.to_string(), general);
        } else {
            slots.shift_insert(first, base.to_string(), general);
        }
    }
}

/// Merge two atomics known to share a slot
fn merge_slot(existing: Atomic, new: Atomic) -> Atomic {
    if existing == new {
        return existing;
    }
    match (existing, new) {
        (Atomic::Bool | Atomic::True | Atomic::False, _) => Atomic::Bool,

        (Atomic::LiteralInt(_) | Atomic::Int, _) => Atomic::Int,
        (Atomic::LiteralFloat(_) | Atomic::Float, _) => Atomic::Float,

        (Atomic::SingleLetter, Atomic::LiteralString(s))
        | (Atomic::LiteralString(s), Atomic::SingleLetter)
            if s.chars().count() == 1 =>
        {
            Atomic::SingleLetter
        }
        (
            Atomic::String | Atomic::LiteralString(_) | Atomic::SingleLetter,
            Atomic::String | Atomic::LiteralString(_) | Atomic::SingleLetter,
        ) => Atomic::String,

        (
            Atomic::NamedObject {
                name,
                type_params: Some(a),
            },
            Atomic::NamedObject {
                type_params: Some(b),
                ..
            },
        ) if a.len() == b.len() => Atomic::NamedObject {
            name,
            type_params: Some(a.iter().zip(&b).map(|(a, b)| combine(a, b)).collect()),
        },
        (Atomic::NamedObject { name, .. }, Atomic::NamedObject { .. }) => Atomic::NamedObject {
            name,
            type_params: None,
        },

        (existing, new) => merge_array_like(existing, new),
    }
}

/// Merge two arrays or shapes
fn merge_array_like(existing: Atomic, new: Atomic) -> Atomic {
    match (existing, new) {
        (
            Atomic::Array {
                key: k1,
                value: v1,
                count: c1,
            },
            Atomic::Array {
                key: k2,
                value: v2,
                count: c2,
            },
        ) => Atomic::Array {
            key: Box::new(combine(&k1, &k2)),
            value: Box::new(combine(&v1, &v2)),
            count: c1.zip(c2).map(|(a, b)| a.min(b)),
        },

        (
            Atomic::ObjectShape {
                properties: p1,
                sealed: s1,
            },
            Atomic::ObjectShape {
                properties: p2,
                sealed: s2,
            },
        ) => Atomic::ObjectShape {
            properties: merge_shape_properties(&p1, &p2),
            sealed: s1 && s2,
        },

        (Atomic::Array { key, value, .. }, Atomic::ObjectShape { properties, sealed })
        | (Atomic::ObjectShape { properties, sealed }, Atomic::Array { key, value, .. })
            if key.is_empty_type() && value.is_empty_type() =>
        {
            Atomic::ObjectShape {
                properties: properties
                    .into_iter()
                    .map(|(key, value)| (key, value.possibly_undefined(true)))
                    .collect(),
                sealed,
            }
        }

        (array @ Atomic::Array { .. }, shape @ Atomic::ObjectShape { .. })
        | (shape @ Atomic::ObjectShape { .. }, array @ Atomic::Array { .. }) => {
            merge_array_like(array, generalize_shape(&shape))
        }

        (existing, _) => existing,
    }
}

/// Merge the property maps of two shapes: keys present on only one side
/// become optional
fn merge_shape_properties(
    a: &IndexMap<ShapeKey, Union>,
    b: &IndexMap<ShapeKey, Union>,
) -> IndexMap<ShapeKey, Union> {
    let mut properties = IndexMap::new();
    for (key, a_value) in a {
        let value = match b.get(key) {
            Some(b_value) => combine(a_value, b_value),
            None => a_value.clone().possibly_undefined(true),
        };
        properties.insert(key.clone(), value);
    }
    for (key, b_value) in b {
        if !a.contains_key(key) {
            properties.insert(key.clone(), b_value.clone().possibly_undefined(true));
        }
    }
    properties
}

/// Turn a shape into the equivalent `array<K, V>`: the key type is the union
/// of its literal keys and the value type the union of its values.
///
/// Anything else is returned unchanged.
#[must_use]
pub fn generalize_shape(shape: &Atomic) -> Atomic {
    let Atomic::ObjectShape { properties, sealed } = shape else {
        return shape.clone();
    };
    if properties.is_empty() {
        return Atomic::empty_array();
    }
    let required = properties
        .values()
        .filter(|value| !value.possibly_undefined)
        .count();
    let (key, value) = if *sealed {
        (
            combine_atomics(properties.keys().map(ShapeKey::to_atomic)),
            combine_many(
                properties
                    .values()
                    .map(|value| value.clone().possibly_undefined(false))
                    .collect::<Vec<_>>()
                    .iter(),
            ),
        )
    } else {
        (Union::from(Atomic::ArrayKey), Union::mixed())
    };
    Atomic::Array {
        key: Box::new(key),
        value: Box::new(value),
        count: (required > 0).then_some(required),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(entries: Vec<(&str, Union)>) -> Atomic {
        Atomic::ObjectShape {
            properties: entries
                .into_iter()
                .map(|(key, value)| (ShapeKey::String(key.to_string()), value))
                .collect(),
            sealed: true,
        }
    }

    #[test]
    fn different_literals_widen() {
        let ty = combine(
            &Union::from(Atomic::LiteralInt(1)),
            &Union::from(Atomic::LiteralInt(2)),
        );
        assert_eq!(ty.to_string(), "int");
    }

    #[test]
    fn alternatives_keep_their_literals() {
        let a = Union::from(Atomic::LiteralString("a".into()));
        let b = Union::from(Atomic::LiteralString("b".into()));
        assert_eq!(combine_keeping_literals(&a, &b).to_string(), "string(a)|string(b)");
        assert_eq!(combine_keeping_literals(&a, &a).to_string(), "string(a)");

        let ty = combine_many_keeping_literals(&[
            Union::from(Atomic::LiteralInt(1)),
            Union::from(Atomic::LiteralInt(2)),
            Union::null(),
        ]);
        assert_eq!(ty.to_string(), "int(1)|int(2)|null");
    }

    #[test]
    fn kept_literals_give_way_to_their_base_type() {
        let ty = combine_atomics_keeping_literals([Atomic::LiteralInt(1), Atomic::Int, Atomic::LiteralInt(2)]);
        assert_eq!(ty.to_string(), "int");
        let ty = combine_atomics_keeping_literals([
            Atomic::LiteralString("x".into()),
            Atomic::SingleLetter,
            Atomic::LiteralString("xy".into()),
        ]);
        assert_eq!(ty.to_string(), "single-letter|string(xy)");
        let ty = combine_atomics_keeping_literals([Atomic::LiteralInt(1), Atomic::ArrayKey]);
        assert_eq!(ty.to_string(), "array-key");
    }

    #[test]
    fn too_many_literals_widen() {
        let limit = i64::try_from(LITERAL_LIMIT).expect("the limit is small");
        let at_limit = combine_atomics_keeping_literals((0..limit).map(Atomic::LiteralInt));
        assert_eq!(at_limit.len(), LITERAL_LIMIT);
        let over = combine_atomics_keeping_literals(
            (0..=limit)
                .map(Atomic::LiteralInt)
                .chain([Atomic::LiteralString("s".into())]),
        );
        assert_eq!(over.to_string(), "int|string(s)");
    }

    #[test]
    fn equal_literals_are_kept() {
        let one = Union::from(Atomic::LiteralInt(1));
        assert_eq!(combine(&one, &one).to_string(), "int(1)");
    }

    #[test]
    fn class_string_literals_are_kept() {
        let ty = combine(
            &Union::from(Atomic::LiteralClassString("A".into())),
            &Union::from(Atomic::LiteralClassString("B".into())),
        );
        assert_eq!(ty.to_string(), "A::class|B::class");
    }

    #[test]
    fn true_and_false_become_bool() {
        assert_eq!(combine(&Union::true_(), &Union::false_()).to_string(), "bool");
    }

    #[test]
    fn mixed_absorbs_everything() {
        for other in [Union::int(), Union::null(), Union::named("Foo"), Union::empty()] {
            assert!(combine(&Union::mixed(), &other).is_mixed());
            assert!(combine(&other, &Union::mixed()).is_mixed());
        }
    }

    #[test]
    fn different_kinds_sit_side_by_side() {
        let ty = combine(&Union::int(), &Union::string());
        assert_eq!(ty.to_string(), "int|string");
        assert_eq!(combine(&Union::string(), &Union::int()).len(), 2);
    }

    #[test]
    fn combining_is_idempotent() {
        let ty = Union::new(vec![Atomic::Int, Atomic::Null, Atomic::named("Foo")]);
        assert_eq!(combine(&ty, &ty).len(), ty.len());
    }

    #[test]
    fn arrays_merge_structurally() {
        let a = Union::from(Atomic::array(Union::int(), Union::string()));
        let b = Union::from(Atomic::array(Union::string(), Union::null()));
        assert_eq!(
            combine(&a, &b).to_string(),
            "array<int|string, string|null>"
        );
    }

    #[test]
    fn shapes_merge_keywise() {
        let a = Union::from(shape(vec![("a", Union::int()), ("b", Union::string())]));
        let b = Union::from(shape(vec![("a", Union::null())]));
        assert_eq!(combine(&a, &b).to_string(), "array{a: int|null, b?: string}");
    }

    #[test]
    fn shapes_merge_into_arrays() {
        let a = Union::from(shape(vec![("a", Union::int())]));
        let b = Union::from(Atomic::array(Union::int(), Union::string()));
        assert_eq!(
            combine(&a, &b).to_string(),
            "array<int|string(a), string|int>"
        );
    }

    #[test]
    fn empty_array_makes_shape_keys_optional() {
        let a = Union::from(Atomic::empty_array());
        let b = Union::from(shape(vec![("a", Union::int())]));
        assert_eq!(combine(&a, &b).to_string(), "array{a?: int}");
    }

    #[test]
    fn bottom_disappears() {
        assert_eq!(combine(&Union::empty(), &Union::int()).to_string(), "int");
        assert!(combine(&Union::empty(), &Union::empty()).is_empty_type());
    }

    #[test]
    fn general_types_absorb_their_family() {
        let ty = combine_atomics([Atomic::Int, Atomic::LiteralString("a".into()), Atomic::ArrayKey]);
        assert_eq!(ty.to_string(), "array-key");
        let ty = combine_atomics([Atomic::True, Atomic::Float, Atomic::Scalar, Atomic::Null]);
        assert_eq!(ty.to_string(), "scalar|null");
    }

    #[test]
    fn flags_are_combined() {
        let a = Union::int().possibly_undefined(true);
        let b = Union::string().from_declaration();
        let ty = combine(&a, &b);
        assert!(ty.possibly_undefined);
        assert!(!ty.from_declaration);
    }
}

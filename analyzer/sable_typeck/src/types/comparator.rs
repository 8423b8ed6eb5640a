//! Subtype checks: is every value of one type a value of another?
//!
//! A failed check still reports why it failed, so that callers can choose
//! between a hard type error and a weaker coercion diagnostic.

use sable_utils::names::{is_numeric_string, normalize_name};

use super::{generalize_shape, template::get_ancestor_type_params, Atomic, Union};
use crate::codebase::Codebase;

/// The outcome of a containment check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeComparisonResult {
    /// Whether the input is contained by the container
    pub is_contained: bool,
    /// Whether a failure was between two scalar types
    pub has_scalar_match: bool,
    /// Whether the container is more specific than the input: the check
    /// would pass the other way around
    pub type_coerced: bool,
    /// Whether the input was (or contained) `mixed`
    pub type_coerced_from_mixed: bool,
    /// Whether an object would pass by being cast to string
    pub to_string_cast: bool,
    /// Whether a general scalar (`scalar`, `array-key`, …) was checked against
    /// one of its subtypes
    pub type_coerced_from_scalar: bool,
}

impl TypeComparisonResult {
    /// Merge the coercion flags of `other` into this result
    fn absorb_flags(&mut self, other: Self) {
        self.has_scalar_match |= other.has_scalar_match;
        self.type_coerced |= other.type_coerced;
        self.type_coerced_from_mixed |= other.type_coerced_from_mixed;
        self.to_string_cast |= other.to_string_cast;
        self.type_coerced_from_scalar |= other.type_coerced_from_scalar;
    }

    /// Whether the check passed without any coercion
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.is_contained && !self.type_coerced && !self.type_coerced_from_mixed
    }
}

/// Check whether every value of `input` is a value of `container`
///
/// `null` and `false` members of the input are skipped when
/// `ignore_null`/`ignore_false` are set. A `mixed` input, or one narrowed
/// from `mixed`, counts as contained with
/// [`TypeComparisonResult::type_coerced_from_mixed`] set.
#[must_use]
pub fn is_contained_by(
    codebase: &Codebase,
    input: &Union,
    container: &Union,
    ignore_null: bool,
    ignore_false: bool,
) -> TypeComparisonResult {
    let mut result = TypeComparisonResult {
        is_contained: true,
        ..TypeComparisonResult::default()
    };
    if container.is_mixed() {
        return result;
    }

    for input_atomic in input.atomics() {
        match input_atomic {
            Atomic::Null if ignore_null => continue,
            Atomic::False if ignore_false => continue,
            Atomic::Empty => continue,
            Atomic::Mixed => {
                result.type_coerced = true;
                result.type_coerced_from_mixed = true;
                continue;
            }
            _ => {}
        }

        let mut matched = None;
        let mut failure = TypeComparisonResult::default();
        for container_atomic in container.atomics() {
            let mut scratch = TypeComparisonResult::default();
            if atomic_contained(codebase, input_atomic, container_atomic, &mut scratch, true) {
                matched = Some(scratch);
                break;
            }
            failure.absorb_flags(scratch);
        }

        if let Some(flags) = matched {
            result.absorb_flags(flags);
        } else {
            result.is_contained = false;
            result.absorb_flags(failure);
        }
    }
    if input.from_mixed && result.is_contained {
        result.type_coerced_from_mixed = true;
    }
    result
}

/// Shorthand for a plain containment check
#[must_use]
pub fn is_simple_contained_by(codebase: &Codebase, input: &Union, container: &Union) -> bool {
    is_contained_by(codebase, input, container, false, false).is_contained
}

/// Check one atomic against another, recording coercion details in `result`
pub fn atomic_is_contained_by(
    codebase: &Codebase,
    input: &Atomic,
    container: &Atomic,
    result: &mut TypeComparisonResult,
) -> bool {
    atomic_contained(codebase, input, container, result, true)
}

/// Whether some value of `a` could also be a value of `b`
#[must_use]
pub fn can_be_contained_by(codebase: &Codebase, a: &Union, b: &Union) -> bool {
    if a.is_mixed() || b.is_mixed() {
        return true;
    }
    a.atomics().any(|a_atomic| {
        b.atomics().any(|b_atomic| {
            let mut scratch = TypeComparisonResult::default();
            atomic_contained(codebase, a_atomic, b_atomic, &mut scratch, false)
                || atomic_contained(codebase, b_atomic, a_atomic, &mut scratch, false)
        })
    })
}

/// Atomic containment. When `check_reverse` is set, a failure also checks
/// the opposite direction to detect coercion.
fn atomic_contained(
    codebase: &Codebase,
    input: &Atomic,
    container: &Atomic,
    result: &mut TypeComparisonResult,
    check_reverse: bool,
) -> bool {
    if input.get_id() == container.get_id() {
        return true;
    }

    let contained = match (input, container) {
        (_, Atomic::Mixed) | (Atomic::Empty, _) => true,
        (Atomic::Mixed, _) => {
            result.type_coerced = true;
            result.type_coerced_from_mixed = true;
            true
        }
        (Atomic::GenericParam { as_type, .. }, _) => {
            let bound = Union::from(container.clone());
            let check = is_contained_by(codebase, as_type, &bound, false, false);
            result.absorb_flags(check);
            check.is_contained
        }
        (Atomic::Void, Atomic::Null) => true,
        (_, Atomic::Scalar) if input.is_scalar() => true,
        (
            _,
            Atomic::Bool
            | Atomic::Int
            | Atomic::Float
            | Atomic::String
            | Atomic::SingleLetter
            | Atomic::ClassString(_)
            | Atomic::LiteralClassString(_)
            | Atomic::ArrayKey
            | Atomic::Numeric,
        ) => scalar_contained(codebase, input, container),
        (Atomic::NamedObject { .. } | Atomic::Object, Atomic::Object) => true,
        (_, Atomic::Callable) => callable_contained(codebase, input),
        (Atomic::NamedObject { .. }, Atomic::NamedObject { .. }) => {
            object_contained(codebase, input, container, result)
        }
        (Atomic::Array { .. } | Atomic::ObjectShape { .. }, Atomic::Array { .. }) => {
            array_contained(codebase, &generalize_shape(input), container, result)
        }
        (Atomic::ObjectShape { .. }, Atomic::ObjectShape { .. }) => {
            shape_contained(codebase, input, container, result)
        }
        _ => false,
    };
    if contained {
        return true;
    }

    if input.is_scalar() && container.is_scalar() {
        result.has_scalar_match = true;
    }
    if let (Atomic::NamedObject { name, .. }, Atomic::String) = (input, container) {
        if codebase.method_exists(name, "__toString") {
            result.to_string_cast = true;
        }
    }
    if check_reverse {
        let mut scratch = TypeComparisonResult::default();
        if atomic_contained(codebase, container, input, &mut scratch, false) {
            result.type_coerced = true;
            if input.is_scalar() {
                result.type_coerced_from_scalar = true;
            }
        }
    }
    false
}

/// Containment in a scalar container
fn scalar_contained(codebase: &Codebase, input: &Atomic, container: &Atomic) -> bool {
    match container {
        Atomic::Bool => matches!(input, Atomic::True | Atomic::False),
        Atomic::Int => input.is_int(),
        Atomic::Float => input.is_float() || input.is_int(),
        Atomic::String => input.is_string(),
        Atomic::SingleLetter => {
            matches!(input, Atomic::LiteralString(s) if s.chars().count() == 1)
        }
        Atomic::ArrayKey => input.is_int() || input.is_string(),
        Atomic::Numeric => {
            input.is_int()
                || input.is_float()
                || matches!(input, Atomic::LiteralString(s) if is_numeric_string(s))
        }
        Atomic::ClassString(None) => {
            matches!(input, Atomic::ClassString(_) | Atomic::LiteralClassString(_))
        }
        Atomic::ClassString(Some(parent)) => match input {
            Atomic::ClassString(Some(class)) | Atomic::LiteralClassString(class) => {
                codebase.class_extends_or_implements(class, parent)
            }
            _ => false,
        },
        Atomic::LiteralClassString(expected) => matches!(
            input,
            Atomic::LiteralClassString(class) if normalize_name(class) == normalize_name(expected)
        ),
        _ => false,
    }
}

/// Containment in `callable`
fn callable_contained(codebase: &Codebase, input: &Atomic) -> bool {
    match input {
        Atomic::LiteralString(name) => codebase.function_exists(name),
        Atomic::NamedObject { name, .. } => {
            normalize_name(name) == "closure" || codebase.method_exists(name, "__invoke")
        }
        _ => false,
    }
}

/// Containment of one object type in another, including type arguments
fn object_contained(
    codebase: &Codebase,
    input: &Atomic,
    container: &Atomic,
    result: &mut TypeComparisonResult,
) -> bool {
    let (
        Atomic::NamedObject { name: child, .. },
        Atomic::NamedObject {
            name: parent,
            type_params: container_params,
        },
    ) = (input, container)
    else {
        return false;
    };
    if normalize_name(child) != normalize_name(parent)
        && !codebase.class_extends_or_implements(child, parent)
    {
        return false;
    }
    let Some(container_params) = container_params else {
        return true;
    };
    let Some(input_params) = get_ancestor_type_params(codebase, input, parent) else {
        return true;
    };
    input_params
        .iter()
        .zip(container_params)
        .all(|(input_param, container_param)| {
            let check = is_contained_by(codebase, input_param, container_param, false, false);
            result.absorb_flags(check);
            check.is_contained
        })
}

/// Containment of an array in `array<K, V>`. Shapes are generalized first.
fn array_contained(
    codebase: &Codebase,
    input: &Atomic,
    container: &Atomic,
    result: &mut TypeComparisonResult,
) -> bool {
    let (
        Atomic::Array {
            key: input_key,
            value: input_value,
            count: input_count,
        },
        Atomic::Array {
            key,
            value,
            count,
        },
    ) = (input, container)
    else {
        return false;
    };

    let required = count.unwrap_or(0);
    if required > 0 && input_count.map_or(true, |input_count| input_count < required) {
        return false;
    }
    if input_key.is_empty_type() && input_value.is_empty_type() {
        return true;
    }

    let key_check = is_contained_by(codebase, input_key, key, false, false);
    let value_check = is_contained_by(codebase, input_value, value, false, false);
    result.absorb_flags(key_check);
    result.absorb_flags(value_check);
    key_check.is_contained && value_check.is_contained
}

/// Containment of one shape in another: every required container key must be
/// present and every shared key's value contained
fn shape_contained(
    codebase: &Codebase,
    input: &Atomic,
    container: &Atomic,
    result: &mut TypeComparisonResult,
) -> bool {
    let (
        Atomic::ObjectShape {
            properties: input_properties,
            sealed: input_sealed,
        },
        Atomic::ObjectShape { properties, sealed },
    ) = (input, container)
    else {
        return false;
    };

    for (key, value) in properties {
        match input_properties.get(key) {
            Some(input_value) => {
                if input_value.possibly_undefined && !value.possibly_undefined {
                    return false;
                }
                let check = is_contained_by(codebase, input_value, value, false, false);
                result.absorb_flags(check);
                if !check.is_contained {
                    return false;
                }
            }
            None if !value.possibly_undefined => return false,
            None => {}
        }
    }

    !*sealed
        || (*input_sealed && input_properties.keys().all(|key| properties.contains_key(key)))
}

//! for literals

use indexmap::IndexMap;
use sable_ast::expr::{ArrayItem, Expr, ExprKind};

use super::analyze_expr;
use crate::{
    typeck::{
        analyzer::{AnalysisResult, Analyzer},
        context::Context,
    },
    types::{combine_many, generalize_shape, Atomic, ShapeKey, Union},
};

/// The fixed type of a superglobal such as `$_GET`
#[must_use]
pub fn superglobal_type(_name: &str) -> Union {
    Atomic::array(Union::string(), Union::mixed()).into()
}

/// `"a $b c"`: each part is checked, the result is a string
pub fn analyze_interpolated(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    parts: &[Expr],
) -> AnalysisResult<Union> {
    for part in parts {
        analyze_expr(analyzer, context, part)?;
    }
    Ok(Union::string())
}

/// `[1, 'k' => $v, ...$rest]`
///
/// A literal whose keys are all known is a sealed shape; one with a computed
/// key or an unpacked array is a general array. `[]` is the empty array.
pub fn analyze_array(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    items: &[ArrayItem],
) -> AnalysisResult<Union> {
    if items.is_empty() {
        return Ok(Atomic::empty_array().into());
    }

    let mut properties = IndexMap::new();
    let mut key_types = vec![];
    let mut value_types = vec![];
    let mut can_be_shape = true;
    let mut next_index = 0_i64;

    for item in items {
        let key_type = match &item.key {
            Some(key) => Some(analyze_expr(analyzer, context, key)?),
            None => None,
        };
        let value_type = if item.by_ref {
            analyze_reference_source(analyzer, context, &item.value)?
        } else {
            analyze_expr(analyzer, context, &item.value)?
        };

        if item.unpack {
            can_be_shape = false;
            for atomic in value_type.atomics() {
                match generalize_shape(atomic) {
                    Atomic::Array { key, value, .. } => {
                        key_types.push(*key);
                        value_types.push(*value);
                    }
                    _ => {
                        key_types.push(Atomic::ArrayKey.into());
                        value_types.push(Union::mixed());
                    }
                }
            }
            continue;
        }

        let key = match &key_type {
            None => Some(ShapeKey::Int(next_index)),
            Some(key_type) => key_type
                .get_single_literal_int()
                .map(ShapeKey::Int)
                .or_else(|| key_type.get_single_literal_string().map(ShapeKey::from_string)),
        };
        match key {
            Some(key) => {
                if let ShapeKey::Int(index) = key {
                    next_index = next_index.max(index.saturating_add(1));
                }
                key_types.push(key.to_atomic().into());
                properties.insert(key, value_type.clone());
            }
            None => {
                can_be_shape = false;
                let key_type = key_type.unwrap_or_else(Union::int);
                key_types.push(if key_type.has_int() || key_type.has_string() {
                    key_type
                } else {
                    Atomic::ArrayKey.into()
                });
            }
        }
        value_types.push(value_type);
    }

    if can_be_shape {
        return Ok(Atomic::ObjectShape {
            properties,
            sealed: true,
        }
        .into());
    }

    let has_direct_entries = items.iter().any(|item| !item.unpack);
    Ok(Atomic::Array {
        key: Box::new(combine_many(&key_types)),
        value: Box::new(combine_many(&value_types)),
        count: has_direct_entries.then_some(1),
    }
    .into())
}

/// The value of a `&$x` entry. An unbound variable is created as `null`
/// instead of being reported.
pub fn analyze_reference_source(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    value: &Expr,
) -> AnalysisResult<Union> {
    if let ExprKind::Variable(name) = value.kind() {
        let var_id = format!("${name}");
        if !context.has_variable(&var_id) {
            context.set(&var_id, Union::null());
        }
    }
    analyze_expr(analyzer, context, value)
}

#[cfg(test)]
mod tests {
    use sable_ast::AstBuilder;

    use crate::typeck::test_utils::check;

    #[test]
    fn literal_keys_make_sealed_shapes() {
        let b = AstBuilder::new();
        let checked = check(&[
            b.assign_stmt(b.var("a"), b.shape(vec![("name", b.string("x")), ("0", b.int(1))])),
            b.assign_stmt(b.var("b"), b.list(vec![b.int(1), b.bool(true)])),
            b.assign_stmt(b.var("c"), b.list(vec![])),
        ]);
        assert!(checked.issues().is_empty());
        assert_eq!(
            checked.type_of("$a").as_deref(),
            Some("array{name: string(x), 0: int(1)}")
        );
        assert_eq!(checked.type_of("$b").as_deref(), Some("array{0: int(1), 1: true}"));
        assert_eq!(checked.type_of("$c").as_deref(), Some("array<empty, empty>"));
    }

    #[test]
    fn computed_keys_make_general_arrays() {
        let b = AstBuilder::new();
        let checked = check(&[
            b.assign_stmt(b.var("k"), b.call("strtolower", vec![b.string("A")])),
            b.assign_stmt(b.var("a"), b.array(vec![(Some(b.var("k")), b.int(1))])),
        ]);
        assert_eq!(
            checked.type_of("$a").as_deref(),
            Some("non-empty-array<string, int(1)>")
        );
    }
}

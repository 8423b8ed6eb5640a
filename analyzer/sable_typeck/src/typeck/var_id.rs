//! Stable string ids for the storage locations an expression names
//!
//! `$a`, `$a['k']`, `$a[0]`, `$a[$i]`, `$a->b`, `Foo::$c`, and (when method
//! calls are memoized) `$a->get()`. Narrowing and assignment key the
//! [`Context`](super::context::Context) by these ids.

use sable_ast::expr::{ClassRef, Expr, ExprKind};
use sable_utils::names::integer_key_from_string;

/// The id of the location `expr` names, if it names one
#[must_use]
pub fn get_var_id(expr: &Expr, self_class: Option<&str>, memoize_method_calls: bool) -> Option<String> {
    match expr.kind() {
        ExprKind::Variable(name) => Some(format!("${name}")),
        ExprKind::ArrayDimFetch(base, Some(dim)) => {
            let base_id = get_var_id(base, self_class, memoize_method_calls)?;
            let offset = get_offset_id(dim)?;
            Some(format!("{base_id}[{offset}]"))
        }
        ExprKind::PropertyFetch { object, name, .. } => {
            let object_id = get_var_id(object, self_class, memoize_method_calls)?;
            Some(format!("{object_id}->{}", name.value()))
        }
        ExprKind::StaticPropertyFetch(class, name) => {
            let class = match class {
                ClassRef::Named(class) => class.trim_start_matches('\\').to_string(),
                ClassRef::SelfRef | ClassRef::Static => self_class?.to_string(),
                ClassRef::Parent | ClassRef::Expr(_) => return None,
            };
            Some(format!("{class}::${}", name.value()))
        }
        ExprKind::MethodCall {
            object, name, args, ..
        } if memoize_method_calls && args.is_empty() => {
            let object_id = get_var_id(object, self_class, memoize_method_calls)?;
            Some(format!("{object_id}->{}()", name.value().to_ascii_lowercase()))
        }
        _ => None,
    }
}

/// How an array offset appears inside a var id: `'k'`, `0` or `$i`
#[must_use]
pub fn get_offset_id(dim: &Expr) -> Option<String> {
    match dim.kind() {
        ExprKind::Int(value) => Some(value.to_string()),
        ExprKind::String(value) => Some(
            integer_key_from_string(value).map_or_else(|| format!("'{value}'"), |key| key.to_string()),
        ),
        ExprKind::Variable(name) => Some(format!("${name}")),
        _ => None,
    }
}

/// Split a keyed id into its base and the last access step: `$a['k']->b`
/// gives `("$a['k']", "->b")`. Plain variables give `None`.
#[must_use]
pub fn split_last_access(var_id: &str) -> Option<(&str, &str)> {
    let bytes = var_id.as_bytes();
    let mut depth = 0_usize;
    let mut in_quote = false;
    let mut last = None;
    for (index, &byte) in bytes.iter().enumerate() {
        match byte {
            b'\'' => in_quote = !in_quote,
            b'[' if !in_quote => {
                if depth == 0 {
                    last = Some(index);
                }
                depth += 1;
            }
            b']' if !in_quote => depth = depth.saturating_sub(1),
            b'-' if !in_quote && depth == 0 && bytes.get(index + 1) == Some(&b'>') => {
                last = Some(index);
            }
            _ => {}
        }
    }
    let index = last?;
    if index == 0 {
        return None;
    }
    Some((&var_id[..index], &var_id[index..]))
}

/// Whether `var_id` is `parent_id` or keyed under it
#[must_use]
pub fn is_descendant_of(var_id: &str, parent_id: &str) -> bool {
    var_id
        .strip_prefix(parent_id)
        .is_some_and(|rest| rest.starts_with('[') || rest.starts_with("->"))
}

#[cfg(test)]
mod tests {
    use sable_ast::{expr::ClassRef, AstBuilder};

    use super::*;

    #[test]
    fn ids_of_access_chains() {
        let b = AstBuilder::new();
        let fetch = b.prop(b.dim(b.var("a"), b.string("k")), "b");
        assert_eq!(get_var_id(&fetch, None, false).as_deref(), Some("$a['k']->b"));

        let numeric = b.dim(b.var("a"), b.string("3"));
        assert_eq!(get_var_id(&numeric, None, false).as_deref(), Some("$a[3]"));

        let dynamic = b.dim(b.var("a"), b.var("i"));
        assert_eq!(get_var_id(&dynamic, None, false).as_deref(), Some("$a[$i]"));

        let unknown = b.dim(b.var("a"), b.call("f", vec![]));
        assert_eq!(get_var_id(&unknown, None, false), None);
    }

    #[test]
    fn static_properties_and_memoized_calls() {
        let b = AstBuilder::new();
        let fetch = b.static_prop(ClassRef::SelfRef, "count");
        assert_eq!(get_var_id(&fetch, Some("Foo"), false).as_deref(), Some("Foo::$count"));
        assert_eq!(get_var_id(&fetch, None, false), None);

        let call = b.method_call(b.var("a"), "getB", vec![]);
        assert_eq!(get_var_id(&call, None, false), None);
        assert_eq!(get_var_id(&call, None, true).as_deref(), Some("$a->getb()"));
    }

    #[test]
    fn splitting_ids() {
        assert_eq!(split_last_access("$a['k']->b"), Some(("$a['k']", "->b")));
        assert_eq!(split_last_access("$a['x->y']"), Some(("$a", "['x->y']")));
        assert_eq!(split_last_access("$a"), None);
        assert!(is_descendant_of("$a['k']", "$a"));
        assert!(!is_descendant_of("$ab", "$a"));
    }
}

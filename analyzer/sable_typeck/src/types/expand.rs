//! Resolving placeholder types against the current class and the codebase

use super::{combine_atomics, replace_templates, template::TemplateResult, Atomic, Union};
use crate::codebase::Codebase;

/// What `self`, `static` and `parent` mean where a type is used
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpandContext<'a> {
    /// The class `self` refers to
    pub self_class: Option<&'a str>,
    /// The class `static` and `$this` refer to; falls back to `self`
    pub static_class: Option<&'a str>,
    /// The class `parent` refers to
    pub parent_class: Option<&'a str>,
    /// Bound template parameters to substitute
    pub templates: Option<&'a TemplateResult>,
}

impl ExpandContext<'_> {
    /// The concrete class for a placeholder name, if it is one
    fn resolve_class_name(&self, name: &str) -> Option<Option<&str>> {
        match name.to_ascii_lowercase().as_str() {
            "self" => Some(self.self_class),
            "static" | "$this" => Some(self.static_class.or(self.self_class)),
            "parent" => Some(self.parent_class),
            _ => None,
        }
    }
}

/// Replace `self`, `static`, `$this` and `parent` with concrete classes,
/// resolve `Foo::BAR` constant types and substitute bound template
/// parameters, recursively. Unresolvable constants become `mixed`.
///
/// Applying this twice with the same context gives the same type.
#[must_use]
pub fn flesh_out_type(codebase: &Codebase, ty: &Union, context: &ExpandContext<'_>) -> Union {
    let ty = match context.templates {
        Some(templates) => replace_templates(ty, templates),
        None => ty.clone(),
    };
    let mut atomics = vec![];
    for atomic in ty.atomics() {
        atomics.extend(flesh_out_atomic(codebase, atomic, context));
    }
    Union::new(atomics).with_flags_of(&ty)
}

/// Resolve one atomic; a class constant may resolve to several
fn flesh_out_atomic(codebase: &Codebase, atomic: &Atomic, context: &ExpandContext<'_>) -> Vec<Atomic> {
    match atomic {
        Atomic::NamedObject { name, type_params } => {
            let name = match context.resolve_class_name(name) {
                Some(Some(class)) => class.to_string(),
                Some(None) | None => name.clone(),
            };
            vec![Atomic::NamedObject {
                name,
                type_params: type_params.as_ref().map(|params| {
                    params
                        .iter()
                        .map(|param| flesh_out_type(codebase, param, context))
                        .collect()
                }),
            }]
        }
        Atomic::ClassString(Some(name)) => match context.resolve_class_name(name) {
            Some(Some(class)) => vec![Atomic::ClassString(Some(class.to_string()))],
            _ => vec![atomic.clone()],
        },
        Atomic::LiteralClassString(name) => match context.resolve_class_name(name) {
            Some(Some(class)) => vec![Atomic::LiteralClassString(class.to_string())],
            _ => vec![atomic.clone()],
        },
        Atomic::ScalarClassConstant { class, name } => {
            let class = match context.resolve_class_name(class) {
                Some(Some(resolved)) => resolved,
                Some(None) => return vec![Atomic::Mixed],
                None => class.as_str(),
            };
            if name.eq_ignore_ascii_case("class") {
                return vec![Atomic::LiteralClassString(class.to_string())];
            }
            codebase
                .get_class_constant(class, name)
                .map_or_else(|| vec![Atomic::Mixed], |constant| constant.ty.clone().into_atomics())
        }
        Atomic::Array { key, value, count } => vec![Atomic::Array {
            key: Box::new(flesh_out_type(codebase, key, context)),
            value: Box::new(flesh_out_type(codebase, value, context)),
            count: *count,
        }],
        Atomic::ObjectShape { properties, sealed } => vec![Atomic::ObjectShape {
            properties: properties
                .iter()
                .map(|(key, value)| (key.clone(), flesh_out_type(codebase, value, context)))
                .collect(),
            sealed: *sealed,
        }],
        Atomic::GenericParam {
            name,
            defining_entity,
            as_type,
        } => vec![Atomic::GenericParam {
            name: name.clone(),
            defining_entity: defining_entity.clone(),
            as_type: Box::new(flesh_out_type(codebase, as_type, context)),
        }],
        other => vec![other.clone()],
    }
}

/// [`flesh_out_type`] followed by merging members that became compatible
#[must_use]
pub fn flesh_out_and_combine(codebase: &Codebase, ty: &Union, context: &ExpandContext<'_>) -> Union {
    let fleshed = flesh_out_type(codebase, ty, context);
    combine_atomics(fleshed.atomics().cloned()).with_flags_of(&fleshed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codebase::{ClassConstantStorage, ClassStorage},
        types::parser::parse_type,
    };

    fn codebase() -> Codebase {
        let mut codebase = Codebase::new_empty();
        let mut foo = ClassStorage::new("Foo", sable_utils::span::Span::from_positions(0, 0));
        foo.constants.insert(
            "BAR".to_string(),
            ClassConstantStorage {
                name: "BAR".to_string(),
                ty: Union::from(Atomic::LiteralString("bar".into())),
                visibility: sable_ast::decl::Visibility::Public,
                declaring_class: "Foo".to_string(),
            },
        );
        codebase.add_class(foo);
        codebase
    }

    fn expand(input: &str) -> String {
        let ty = parse_type(input, &[]).expect("type should parse");
        let context = ExpandContext {
            self_class: Some("Foo"),
            static_class: Some("FooChild"),
            parent_class: None,
            templates: None,
        };
        flesh_out_type(&codebase(), &ty, &context).to_string()
    }

    #[test]
    fn placeholders_resolve() {
        assert_eq!(expand("self"), "Foo");
        assert_eq!(expand("static|null"), "FooChild|null");
        assert_eq!(expand("$this"), "FooChild");
        assert_eq!(expand("array<int, self>"), "array<int, Foo>");
        assert_eq!(expand("parent"), "parent");
    }

    #[test]
    fn class_constants_resolve() {
        assert_eq!(expand("Foo::BAR"), "string(bar)");
        assert_eq!(expand("self::BAR"), "string(bar)");
        assert_eq!(expand("Foo::MISSING"), "mixed");
    }

    #[test]
    fn expanding_is_idempotent() {
        let context = ExpandContext {
            self_class: Some("Foo"),
            static_class: None,
            parent_class: None,
            templates: None,
        };
        let codebase = codebase();
        for input in ["self|int", "array{a: Foo::BAR, b: static}", "Foo<self>"] {
            let ty = parse_type(input, &[]).expect("type should parse");
            let once = flesh_out_type(&codebase, &ty, &context);
            let twice = flesh_out_type(&codebase, &once, &context);
            assert_eq!(once, twice);
        }
    }
}

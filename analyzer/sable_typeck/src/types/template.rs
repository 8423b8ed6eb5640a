//! Template parameters: binding them from arguments and substituting them

use indexmap::IndexMap;
use sable_utils::names::normalize_name;

use super::{combine, generalize_shape, Atomic, Union};
use crate::codebase::Codebase;

/// A template parameter declared with `@template T [of Bound]`
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateType {
    /// The parameter name, e.g. `T`
    pub name: String,
    /// The declaring class or function, lowercased
    pub defining_entity: String,
    /// The upper bound, `mixed` unless given
    pub as_type: Union,
}

/// Types bound to template parameters, keyed by parameter name and defining
/// entity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateResult {
    /// The bound types
    bounds: IndexMap<(String, String), Union>,
}

impl TemplateResult {
    /// No bindings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the template parameters of a generic class to the type arguments
    /// of an object type. Missing arguments bind to their bounds.
    #[must_use]
    pub fn from_class_params(templates: &[TemplateType], type_params: Option<&[Union]>) -> Self {
        let mut result = Self::new();
        for (index, template) in templates.iter().enumerate() {
            let bound = type_params
                .and_then(|params| params.get(index))
                .cloned()
                .unwrap_or_else(|| template.as_type.clone());
            result.insert(&template.name, &template.defining_entity, bound);
        }
        result
    }

    /// Look up a binding
    #[must_use]
    pub fn get(&self, name: &str, defining_entity: &str) -> Option<&Union> {
        self.bounds
            .get(&(name.to_string(), defining_entity.to_string()))
    }

    /// Set a binding, replacing any existing one
    pub fn insert(&mut self, name: &str, defining_entity: &str, ty: Union) {
        self.bounds
            .insert((name.to_string(), defining_entity.to_string()), ty);
    }

    /// Widen a binding by another type
    pub fn add_bound(&mut self, name: &str, defining_entity: &str, ty: &Union) {
        let key = (name.to_string(), defining_entity.to_string());
        let bound = match self.bounds.get(&key) {
            Some(existing) => combine(existing, ty),
            None => ty.clone(),
        };
        self.bounds.insert(key, bound);
    }

    /// Whether nothing is bound
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }
}

/// Substitute bound template parameters in `ty`. Unbound parameters are left
/// in place.
#[must_use]
pub fn replace_templates(ty: &Union, templates: &TemplateResult) -> Union {
    if templates.is_empty() {
        return ty.clone();
    }
    let mut atomics = vec![];
    for atomic in ty.atomics() {
        match atomic {
            Atomic::GenericParam {
                name,
                defining_entity,
                ..
            } => match templates.get(name, defining_entity) {
                Some(bound) => atomics.extend(bound.atomics().cloned()),
                None => atomics.push(atomic.clone()),
            },
            other => atomics.push(replace_in_atomic(other, templates)),
        }
    }
    Union::new(atomics).with_flags_of(ty)
}

/// Substitute bound template parameters inside the parameters of an atomic
fn replace_in_atomic(atomic: &Atomic, templates: &TemplateResult) -> Atomic {
    match atomic {
        Atomic::Array { key, value, count } => Atomic::Array {
            key: Box::new(replace_templates(key, templates)),
            value: Box::new(replace_templates(value, templates)),
            count: *count,
        },
        Atomic::ObjectShape { properties, sealed } => Atomic::ObjectShape {
            properties: properties
                .iter()
                .map(|(key, value)| (key.clone(), replace_templates(value, templates)))
                .collect(),
            sealed: *sealed,
        },
        Atomic::NamedObject {
            name,
            type_params: Some(params),
        } => Atomic::NamedObject {
            name: name.clone(),
            type_params: Some(
                params
                    .iter()
                    .map(|param| replace_templates(param, templates))
                    .collect(),
            ),
        },
        other => other.clone(),
    }
}

/// Bind template parameters appearing in a parameter type from the type of
/// the argument passed for it
pub fn infer_templates(
    codebase: &Codebase,
    param_type: &Union,
    arg_type: &Union,
    result: &mut TemplateResult,
) {
    let arg_type = if param_type.is_nullable() {
        arg_type.without_null()
    } else {
        arg_type.clone()
    };

    for param_atomic in param_type.atomics() {
        match param_atomic {
            Atomic::GenericParam {
                name,
                defining_entity,
                ..
            } => {
                let concrete = arg_type.generalize_literals();
                if !concrete.is_empty_type() {
                    result.add_bound(name, defining_entity, &concrete);
                }
            }
            Atomic::Array { key, value, .. } => {
                for arg_atomic in arg_type.atomics() {
                    if let Atomic::Array {
                        key: arg_key,
                        value: arg_value,
                        ..
                    } = generalize_shape(arg_atomic)
                    {
                        infer_templates(codebase, key, &arg_key, result);
                        infer_templates(codebase, value, &arg_value, result);
                    }
                }
            }
            Atomic::NamedObject {
                name,
                type_params: Some(params),
            } => {
                for arg_atomic in arg_type.atomics() {
                    if let Some(arg_params) = get_ancestor_type_params(codebase, arg_atomic, name)
                    {
                        for (param, arg) in params.iter().zip(&arg_params) {
                            infer_templates(codebase, param, arg, result);
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// The type arguments `object` has as an instance of `ancestor`, following
/// `@template-extends` declarations up the hierarchy
#[must_use]
pub fn get_ancestor_type_params(
    codebase: &Codebase,
    object: &Atomic,
    ancestor: &str,
) -> Option<Vec<Union>> {
    let Atomic::NamedObject { name, type_params } = object else {
        return None;
    };
    if normalize_name(name) == normalize_name(ancestor) {
        return type_params.clone().or_else(|| {
            codebase.get_class(name).map(|class| {
                class
                    .template_types
                    .iter()
                    .map(|template| template.as_type.clone())
                    .collect()
            })
        });
    }

    let class = codebase.get_class(name)?;
    let bindings = TemplateResult::from_class_params(&class.template_types, type_params.as_deref());
    let direct_parents = class.parent.iter().chain(&class.interfaces);
    for parent in direct_parents {
        if !codebase.class_extends_or_implements(parent, ancestor) {
            continue;
        }
        let parent_params = class
            .template_extends
            .get(&normalize_name(parent))
            .map(|args| {
                args.iter()
                    .map(|arg| replace_templates(arg, &bindings))
                    .collect::<Vec<_>>()
            });
        let parent_object = Atomic::NamedObject {
            name: parent.clone(),
            type_params: parent_params,
        };
        if let Some(params) = get_ancestor_type_params(codebase, &parent_object, ancestor) {
            return Some(params);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parser::parse_type;

    fn template(name: &str, entity: &str) -> TemplateType {
        TemplateType {
            name: name.to_string(),
            defining_entity: entity.to_string(),
            as_type: Union::mixed(),
        }
    }

    #[test]
    fn replacing_bound_parameters() {
        let templates = [template("T", "box")];
        let ty = parse_type("array<int, T>|T", &templates).expect("type should parse");
        let mut result = TemplateResult::new();
        result.insert("T", "box", Union::string());
        assert_eq!(
            replace_templates(&ty, &result).to_string(),
            "array<int, string>|string"
        );
    }

    #[test]
    fn unbound_parameters_stay() {
        let templates = [template("T", "f")];
        let ty = parse_type("T", &templates).expect("type should parse");
        assert_eq!(replace_templates(&ty, &TemplateResult::new()).to_string(), "T");
    }

    #[test]
    fn inferring_from_arrays() {
        let codebase = Codebase::new_empty();
        let templates = [template("K", "f"), template("V", "f")];
        let param = parse_type("array<K, V>", &templates).expect("type should parse");
        let arg = parse_type("array<string, 3>", &[]).expect("type should parse");
        let mut result = TemplateResult::new();
        infer_templates(&codebase, &param, &arg, &mut result);
        assert_eq!(result.get("K", "f").map(ToString::to_string).as_deref(), Some("string"));
        assert_eq!(result.get("V", "f").map(ToString::to_string).as_deref(), Some("int"));
    }

    #[test]
    fn inferring_strips_null_matched_by_the_param() {
        let codebase = Codebase::new_empty();
        let templates = [template("T", "f")];
        let param = parse_type("?T", &templates).expect("type should parse");
        let mut result = TemplateResult::new();
        infer_templates(
            &codebase,
            &param,
            &Union::new(vec![Atomic::named("Foo"), Atomic::Null]),
            &mut result,
        );
        assert_eq!(result.get("T", "f").map(ToString::to_string).as_deref(), Some("Foo"));
    }
}

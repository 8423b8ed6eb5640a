//! Symbol storage: the declared signatures the checker looks up
//!
//! A [`Codebase`] is a flat map of classes, functions and constants keyed by
//! normalized (lowercased, no leading `\`) name. Classes refer to their
//! parents and interfaces by name, never by pointer. It is populated once by
//! the [scanner](scan_file) and read-only during analysis.

mod builtins;
mod scanner;
mod storage;

use std::collections::HashSet;

use indexmap::IndexMap;
use sable_ast::decl::Visibility;
use sable_utils::names::normalize_name;
pub use scanner::{scan_file, scan_stmts};
pub use storage::{
    ClassConstantStorage, ClassStorage, FunctionLikeStorage, FunctionParam, PropertyStorage,
    StoredAssertion,
};

use crate::types::Union;

/// Every declared class, function and constant known to one analysis run
#[derive(Debug, Clone, Default)]
pub struct Codebase {
    /// Classes and interfaces by normalized name
    classes: IndexMap<String, ClassStorage>,
    /// Functions by normalized name
    functions: IndexMap<String, FunctionLikeStorage>,
    /// Global constants by name
    constants: IndexMap<String, Union>,
}

impl Codebase {
    /// Create a [`Codebase`] containing nothing, not even the builtin
    /// classes and functions. This is most useful for testing.
    #[must_use]
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// Create a [`Codebase`] with the builtin classes and functions. This is
    /// the normal initialization method.
    #[must_use]
    pub fn new() -> Self {
        let mut codebase = Self::new_empty();
        builtins::register(&mut codebase);
        codebase
    }

    /// Add or replace a class
    pub fn add_class(&mut self, class: ClassStorage) {
        self.classes.insert(normalize_name(&class.name), class);
    }

    /// Add or replace a function
    pub fn add_function(&mut self, function: FunctionLikeStorage) {
        self.functions.insert(normalize_name(&function.name), function);
    }

    /// Add or replace a global constant
    pub fn add_constant(&mut self, name: &str, ty: Union) {
        self.constants
            .insert(sable_utils::names::strip_leading_separator(name).to_string(), ty);
    }

    /// Look up a class or interface
    #[must_use]
    pub fn get_class(&self, name: &str) -> Option<&ClassStorage> {
        self.classes.get(&normalize_name(name))
    }

    /// Whether a class or interface exists
    #[must_use]
    pub fn class_exists(&self, name: &str) -> bool {
        self.classes.contains_key(&normalize_name(name))
    }

    /// Whether an interface exists by this name
    #[must_use]
    pub fn interface_exists(&self, name: &str) -> bool {
        self.get_class(name).is_some_and(|class| class.is_interface)
    }

    /// Look up a function
    #[must_use]
    pub fn get_function(&self, name: &str) -> Option<&FunctionLikeStorage> {
        self.functions.get(&normalize_name(name))
    }

    /// Whether a function exists
    #[must_use]
    pub fn function_exists(&self, name: &str) -> bool {
        self.functions.contains_key(&normalize_name(name))
    }

    /// Look up a global constant
    #[must_use]
    pub fn get_constant(&self, name: &str) -> Option<&Union> {
        self.constants
            .get(sable_utils::names::strip_leading_separator(name))
    }

    /// The parent class of `class`, as declared
    #[must_use]
    pub fn get_parent(&self, class: &str) -> Option<&str> {
        self.get_class(class)?.parent.as_deref()
    }

    /// `class` followed by its ancestors: parents first, then every interface,
    /// each once
    #[must_use]
    pub fn get_ancestors(&self, class: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut ancestors = vec![];
        let mut queue = vec![class.to_string()];
        while let Some(next) = queue.pop() {
            if !seen.insert(normalize_name(&next)) {
                continue;
            }
            if let Some(storage) = self.get_class(&next) {
                queue.extend(storage.interfaces.iter().rev().cloned());
                if let Some(parent) = &storage.parent {
                    queue.push(parent.clone());
                }
                ancestors.push(storage.name.clone());
            } else {
                ancestors.push(next);
            }
        }
        ancestors
    }

    /// Whether `child` is `parent`, extends it or implements it
    #[must_use]
    pub fn class_extends_or_implements(&self, child: &str, parent: &str) -> bool {
        let parent = normalize_name(parent);
        self.get_ancestors(child)
            .iter()
            .any(|ancestor| normalize_name(ancestor) == parent)
    }

    /// Whether `child` extends `parent` through the class chain
    #[must_use]
    pub fn class_extends(&self, child: &str, parent: &str) -> bool {
        let parent = normalize_name(parent);
        let mut seen = HashSet::new();
        let mut current = self.get_parent(child);
        while let Some(class) = current {
            let normalized = normalize_name(class);
            if normalized == parent {
                return true;
            }
            if !seen.insert(normalized) {
                return false;
            }
            current = self.get_parent(class);
        }
        false
    }

    /// Whether `class` implements `interface`, directly or through an ancestor
    #[must_use]
    pub fn class_implements(&self, class: &str, interface: &str) -> bool {
        self.interface_exists(interface)
            && !normalize_name(class).eq(&normalize_name(interface))
            && self.class_extends_or_implements(class, interface)
    }

    /// Look up a method on `class` or its ancestors
    #[must_use]
    pub fn get_method(&self, class: &str, method: &str) -> Option<&FunctionLikeStorage> {
        let method = method.to_ascii_lowercase();
        self.get_ancestors(class)
            .iter()
            .filter_map(|ancestor| self.get_class(ancestor))
            .find_map(|storage| storage.methods.get(&method))
    }

    /// Whether `class` or an ancestor declares `method`
    #[must_use]
    pub fn method_exists(&self, class: &str, method: &str) -> bool {
        self.get_method(class, method).is_some()
    }

    /// Look up a property on `class` or its parents
    #[must_use]
    pub fn get_property(&self, class: &str, property: &str) -> Option<&PropertyStorage> {
        self.get_ancestors(class)
            .iter()
            .filter_map(|ancestor| self.get_class(ancestor))
            .find_map(|storage| storage.properties.get(property))
    }

    /// Look up a class constant on `class` or its ancestors
    #[must_use]
    pub fn get_class_constant(&self, class: &str, constant: &str) -> Option<&ClassConstantStorage> {
        self.get_ancestors(class)
            .iter()
            .filter_map(|ancestor| self.get_class(ancestor))
            .find_map(|storage| storage.constants.get(constant))
    }

    /// Whether a member declared in `declaring_class` with `visibility` may be
    /// accessed from code inside `calling_class`
    #[must_use]
    pub fn is_visible(
        &self,
        visibility: Visibility,
        declaring_class: &str,
        calling_class: Option<&str>,
    ) -> bool {
        match (visibility, calling_class) {
            (Visibility::Public, _) => true,
            (_, None) => false,
            (Visibility::Private, Some(calling)) => {
                normalize_name(calling) == normalize_name(declaring_class)
            }
            (Visibility::Protected, Some(calling)) => {
                self.class_extends_or_implements(calling, declaring_class)
                    || self.class_extends_or_implements(declaring_class, calling)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use sable_utils::span::Span;

    use super::*;

    fn class(name: &str, parent: Option<&str>, interfaces: &[&str]) -> ClassStorage {
        let mut class = ClassStorage::new(name, Span::from_positions(0, 0));
        class.parent = parent.map(ToString::to_string);
        class.interfaces = interfaces.iter().map(ToString::to_string).collect();
        class
    }

    fn hierarchy() -> Codebase {
        let mut codebase = Codebase::new_empty();
        let mut countable = class("Countable", None, &[]);
        countable.is_interface = true;
        codebase.add_class(countable);
        codebase.add_class(class("A", None, &["Countable"]));
        codebase.add_class(class("B", Some("A"), &[]));
        codebase.add_class(class("C", Some("B"), &[]));
        codebase
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let codebase = hierarchy();
        assert!(codebase.class_exists("\\a"));
        assert_eq!(codebase.get_parent("c"), Some("B"));
    }

    #[test]
    fn hierarchy_queries() {
        let codebase = hierarchy();
        assert!(codebase.class_extends("C", "A"));
        assert!(!codebase.class_extends("A", "C"));
        assert!(codebase.class_implements("C", "Countable"));
        assert!(codebase.class_extends_or_implements("C", "c"));
        assert_eq!(codebase.get_ancestors("C"), vec!["C", "B", "A", "Countable"]);
    }

    #[test]
    fn cycles_terminate() {
        let mut codebase = Codebase::new_empty();
        codebase.add_class(class("X", Some("Y"), &[]));
        codebase.add_class(class("Y", Some("X"), &[]));
        assert!(!codebase.class_extends("X", "Z"));
        assert_eq!(codebase.get_ancestors("X").len(), 2);
    }

    #[test]
    fn visibility() {
        let codebase = hierarchy();
        assert!(codebase.is_visible(Visibility::Public, "A", None));
        assert!(!codebase.is_visible(Visibility::Private, "A", Some("B")));
        assert!(codebase.is_visible(Visibility::Protected, "A", Some("C")));
        assert!(!codebase.is_visible(Visibility::Protected, "A", None));
    }
}

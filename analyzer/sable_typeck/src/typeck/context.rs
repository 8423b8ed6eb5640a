//! The scope context: what is known about every variable at one program point

use indexmap::{IndexMap, IndexSet};

use super::{algebra::Clause, var_id::is_descendant_of};
use crate::types::{combine, combine_many_keeping_literals, Union};

/// The state of one scope at one program point
///
/// `vars_in_scope` holds every variable that is, or may be, bound here.
/// A variable bound on only some of the paths reaching this point carries
/// [`Union::possibly_undefined`]. Keyed ids (`$a['k']`, `$a->b`) are cached
/// narrowings of a location under their base variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    /// Variable and keyed ids with their current types
    pub vars_in_scope: IndexMap<String, Union>,
    /// Every variable that may have been bound on some path
    pub vars_possibly_in_scope: IndexSet<String>,
    /// Facts known to hold here, in conjunctive normal form
    pub clauses: Vec<Clause>,
    /// The class whose code is being checked
    pub self_class: Option<String>,
    /// The class `static` refers to
    pub static_class: Option<String>,
    /// The parent of [`Self::self_class`]
    pub parent_class: Option<String>,
    /// Whether this is a static method, where `$this` is invalid
    pub is_static: bool,
    /// Inside `isset()`, `empty()` or the left of `??`
    pub inside_isset: bool,
    /// Inside the body of a loop
    pub inside_loop: bool,
    /// Whether unknown variables are reported
    pub check_variables: bool,
    /// Types by-reference variables must keep
    pub byref_constraints: IndexMap<String, Union>,
    /// Ids assigned since this set was last cleared
    pub assigned_var_ids: IndexSet<String>,
}

impl Context {
    /// An empty context for code inside `self_class`, or for free code
    #[must_use]
    pub fn new(self_class: Option<&str>) -> Self {
        Self {
            vars_in_scope: IndexMap::new(),
            vars_possibly_in_scope: IndexSet::new(),
            clauses: vec![],
            self_class: self_class.map(ToString::to_string),
            static_class: self_class.map(ToString::to_string),
            parent_class: None,
            is_static: false,
            inside_isset: false,
            inside_loop: false,
            check_variables: true,
            byref_constraints: IndexMap::new(),
            assigned_var_ids: IndexSet::new(),
        }
    }

    /// Whether `var_id` is bound, possibly
    #[must_use]
    pub fn has_variable(&self, var_id: &str) -> bool {
        self.vars_in_scope.contains_key(var_id)
    }

    /// The current type of `var_id`
    #[must_use]
    pub fn get(&self, var_id: &str) -> Option<&Union> {
        self.vars_in_scope.get(var_id)
    }

    /// Bind `var_id` to `ty` as the result of an assignment
    ///
    /// Keyed entries under the id and clauses mentioning it stop holding.
    pub fn set(&mut self, var_id: &str, ty: Union) {
        self.remove_descendants(var_id);
        self.remove_var_from_conflicting_clauses(var_id);
        self.vars_possibly_in_scope.insert(var_id.to_string());
        self.assigned_var_ids.insert(var_id.to_string());
        self.vars_in_scope.insert(var_id.to_string(), ty);
    }

    /// Replace the type of `var_id` without treating it as an assignment:
    /// the clauses that led to the narrowing stay
    pub fn narrow(&mut self, var_id: &str, ty: Union) {
        if self.vars_in_scope.get(var_id) != Some(&ty) {
            self.remove_descendants(var_id);
        }
        self.vars_in_scope.insert(var_id.to_string(), ty);
    }

    /// Unbind `var_id` and everything keyed under it
    pub fn remove(&mut self, var_id: &str) {
        self.vars_in_scope.shift_remove(var_id);
        self.remove_descendants(var_id);
        self.remove_var_from_conflicting_clauses(var_id);
    }

    /// An independent copy for one branch
    #[must_use]
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Forget every keyed entry under `var_id`: they were derived from a
    /// value that no longer holds
    pub fn remove_descendants(&mut self, var_id: &str) {
        self.vars_in_scope
            .retain(|id, _| !is_descendant_of(id, var_id));
    }

    /// Forget every keyed entry reached through an object property, whose
    /// value a call may have changed
    pub fn remove_object_property_entries(&mut self) {
        self.vars_in_scope.retain(|id, _| !id.contains("->"));
        self.clauses.retain(|clause| {
            !clause
                .possibilities
                .keys()
                .any(|id| id.contains("->"))
        });
    }

    /// Drop clauses about `var_id` or anything keyed under it
    pub fn remove_var_from_conflicting_clauses(&mut self, var_id: &str) {
        self.clauses.retain(|clause| !clause.mentions(var_id, true));
    }

    /// Merge the states at the end of branches that all continue to the
    /// same point
    ///
    /// A variable bound in every branch is bound afterwards with the
    /// combined type, keeping each branch's literals; one bound in only some is possibly undefined. Keyed
    /// entries missing from a branch are dropped, since absence there means
    /// "not cached" rather than "unbound". Only clauses every branch agrees
    /// on survive.
    ///
    /// # Panics
    /// Panics if `branches` is empty; an unreachable join point has no state
    /// to merge.
    #[must_use]
    pub fn merge_branches(parent: &Self, branches: &[&Self]) -> Self {
        let (first, rest) = branches
            .split_first()
            .expect("merging branches needs at least one reachable branch");
        let mut merged = parent.clone();

        let mut var_ids: IndexSet<&String> = IndexSet::new();
        for branch in branches {
            var_ids.extend(branch.vars_in_scope.keys());
        }

        merged.vars_in_scope = var_ids
            .into_iter()
            .filter_map(|var_id| {
                let types = branches
                    .iter()
                    .filter_map(|branch| branch.vars_in_scope.get(var_id))
                    .collect::<Vec<_>>();
                let in_every_branch = types.len() == branches.len();
                let is_keyed = var_id.contains('[') || var_id.contains("->");
                if !in_every_branch && is_keyed {
                    return None;
                }
                let mut ty = combine_many_keeping_literals(types);
                if !in_every_branch {
                    ty.possibly_undefined = true;
                }
                Some((var_id.clone(), ty))
            })
            .collect();

        for branch in branches {
            merged
                .vars_possibly_in_scope
                .extend(branch.vars_possibly_in_scope.iter().cloned());
            merged
                .assigned_var_ids
                .extend(branch.assigned_var_ids.iter().cloned());
        }

        merged.clauses = first
            .clauses
            .iter()
            .filter(|clause| {
                rest.iter().all(|branch| {
                    branch
                        .clauses
                        .iter()
                        .any(|other| other.hash() == clause.hash())
                })
            })
            .cloned()
            .collect();
        merged
    }

    /// Fold the state of a path that may or may not have run into this one:
    /// every variable the path assigned becomes the combination of both
    /// states
    pub fn absorb_possible_path(&mut self, path: &Self) {
        for var_id in &path.assigned_var_ids {
            let Some(path_type) = path.vars_in_scope.get(var_id) else {
                continue;
            };
            let merged = match self.vars_in_scope.get(var_id) {
                Some(existing) => combine(existing, path_type),
                None => path_type.clone().possibly_undefined(true),
            };
            self.remove_descendants(var_id);
            self.remove_var_from_conflicting_clauses(var_id);
            self.vars_in_scope.insert(var_id.clone(), merged);
            self.vars_possibly_in_scope.insert(var_id.clone());
            self.assigned_var_ids.insert(var_id.clone());
        }
    }

    /// Whether any variable differs in type between `self` and `other`
    #[must_use]
    pub fn differs_from(&self, other: &Self) -> bool {
        self.vars_in_scope.len() != other.vars_in_scope.len()
            || self
                .vars_in_scope
                .iter()
                .any(|(var_id, ty)| other.vars_in_scope.get(var_id) != Some(ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        typeck::algebra::Assertion,
        types::{Atomic, Union},
    };

    #[test]
    fn forks_are_independent() {
        let mut context = Context::new(None);
        context.set("$a", Union::int());
        let mut fork = context.fork();
        fork.set("$a", Union::string());
        assert_eq!(context.get("$a"), Some(&Union::int()));
        assert_eq!(fork.get("$a"), Some(&Union::string()));
    }

    #[test]
    fn assignment_invalidates_keyed_entries_and_clauses() {
        let mut context = Context::new(None);
        context.set("$a", Union::new(vec![Atomic::mixed_array()]));
        context.narrow("$a['k']", Union::int());
        context.narrow("$ab", Union::int());
        context
            .clauses
            .push(Clause::single("$a['k']", Assertion::Truthy));
        context.set("$a", Union::null());
        assert!(!context.has_variable("$a['k']"));
        assert!(context.has_variable("$ab"));
        assert!(context.clauses.is_empty());
    }

    #[test]
    fn merging_exhaustive_branches() {
        let parent = Context::new(None);
        let mut left = parent.fork();
        left.set("$x", Union::new(vec![Atomic::LiteralInt(1)]));
        let mut right = parent.fork();
        right.set("$x", Union::new(vec![Atomic::LiteralString("a".to_string())]));
        right.set("$y", Union::int());

        let merged = Context::merge_branches(&parent, &[&left, &right]);
        assert_eq!(merged.get("$x").map(ToString::to_string).as_deref(), Some("int(1)|string(a)"));
        assert!(!merged.get("$x").is_some_and(|ty| ty.possibly_undefined));
        assert!(merged.get("$y").is_some_and(|ty| ty.possibly_undefined));
    }

    #[test]
    fn merging_keeps_literals_of_the_same_base_type() {
        let parent = Context::new(None);
        let mut left = parent.fork();
        left.set("$x", Union::from(Atomic::LiteralString("a".to_string())));
        left.set("$n", Union::from(Atomic::LiteralInt(1)));
        let mut right = parent.fork();
        right.set("$x", Union::from(Atomic::LiteralString("b".to_string())));
        right.set("$n", Union::int());

        let merged = Context::merge_branches(&parent, &[&left, &right]);
        assert_eq!(merged.get("$x").map(ToString::to_string).as_deref(), Some("string(a)|string(b)"));
        assert_eq!(merged.get("$n").map(ToString::to_string).as_deref(), Some("int"));
    }

    #[test]
    fn merging_keeps_shared_clauses_only() {
        let mut parent = Context::new(None);
        parent.clauses.push(Clause::single("$a", Assertion::Truthy));
        let mut left = parent.fork();
        left.clauses.push(Clause::single("$b", Assertion::Truthy));
        let right = parent.fork();
        let merged = Context::merge_branches(&parent, &[&left, &right]);
        assert_eq!(merged.clauses.len(), 1);
    }

    #[test]
    fn absorbing_a_possible_path() {
        let mut context = Context::new(None);
        context.set("$a", Union::int());
        let mut path = context.fork();
        path.assigned_var_ids.clear();
        path.set("$a", Union::string());
        path.set("$b", Union::int());
        context.absorb_possible_path(&path);
        assert_eq!(context.get("$a").map(ToString::to_string).as_deref(), Some("int|string"));
        assert!(context.get("$b").is_some_and(|ty| ty.possibly_undefined));
    }
}

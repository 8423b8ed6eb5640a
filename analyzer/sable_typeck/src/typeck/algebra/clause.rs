//! Disjunctions of assertions

use std::fmt::Display;

use indexmap::IndexMap;

use super::Assertion;

/// A disjunction of assertions: at least one of `possibilities` holds
///
/// A *wedge* is a clause about something that cannot be expressed as an
/// assertion on a variable (a function call, a comparison between two
/// unknowns). It carries no possibilities and only stops the clauses around
/// it from being simplified as if it were not there.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// For each variable id, the assertions any of which may hold
    pub possibilities: IndexMap<String, Vec<Assertion>>,
    /// Whether this is a wedge
    pub wedge: bool,
    /// Whether this clause may be used to narrow types
    pub reconcilable: bool,
    /// Whether this clause was produced by simplification rather than read
    /// from source
    pub generated: bool,
    /// A stable key: equal clauses have equal hashes
    hash: String,
}

impl Clause {
    /// Build a clause, deduplicating the assertions of each variable
    #[must_use]
    pub fn new(
        possibilities: IndexMap<String, Vec<Assertion>>,
        reconcilable: bool,
        generated: bool,
    ) -> Self {
        let possibilities = possibilities
            .into_iter()
            .map(|(var, assertions)| {
                let mut unique: Vec<Assertion> = vec![];
                for assertion in assertions {
                    if !unique.contains(&assertion) {
                        unique.push(assertion);
                    }
                }
                (var, unique)
            })
            .collect::<IndexMap<_, _>>();
        let hash = Self::compute_hash(&possibilities);
        Self {
            possibilities,
            wedge: false,
            reconcilable,
            generated,
            hash,
        }
    }

    /// A clause about one variable with one assertion
    #[must_use]
    pub fn single(var_id: &str, assertion: Assertion) -> Self {
        Self::new(
            IndexMap::from([(var_id.to_string(), vec![assertion])]),
            true,
            false,
        )
    }

    /// A clause about one variable with any of several assertions
    #[must_use]
    pub fn any_of(var_id: &str, assertions: Vec<Assertion>) -> Self {
        Self::new(IndexMap::from([(var_id.to_string(), assertions)]), true, false)
    }

    /// A wedge. `id` distinguishes wedges from different conditions.
    #[must_use]
    pub fn wedge(id: u32) -> Self {
        Self {
            possibilities: IndexMap::new(),
            wedge: true,
            reconcilable: false,
            generated: false,
            hash: format!("wedge#{id}"),
        }
    }

    /// The sorted, canonical form of the possibilities
    fn compute_hash(possibilities: &IndexMap<String, Vec<Assertion>>) -> String {
        let mut vars = possibilities
            .iter()
            .map(|(var, assertions)| {
                let mut keys = assertions.iter().map(Assertion::key).collect::<Vec<_>>();
                keys.sort();
                format!("{var}:{}", keys.join(","))
            })
            .collect::<Vec<_>>();
        vars.sort();
        vars.join(";")
    }

    /// The stable key of this clause
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Whether every possibility of `other` is also a possibility of `self`,
    /// making `self` implied by `other`
    #[must_use]
    pub fn is_implied_by(&self, other: &Self) -> bool {
        if self.wedge || other.wedge || other.possibilities.len() > self.possibilities.len() {
            return false;
        }
        other.possibilities.iter().all(|(var, assertions)| {
            self.possibilities
                .get(var)
                .is_some_and(|own| assertions.iter().all(|a| own.contains(a)))
        })
    }

    /// Whether this clause mentions `var_id`, or anything keyed under it
    /// (`$a['k']`, `$a->b`) when `include_descendants` is set
    #[must_use]
    pub fn mentions(&self, var_id: &str, include_descendants: bool) -> bool {
        self.possibilities.keys().any(|key| {
            key == var_id
                || (include_descendants
                    && (key.starts_with(&format!("{var_id}["))
                        || key.starts_with(&format!("{var_id}->"))))
        })
    }

    /// The same clause with the assertions on `var_id` removed, or `None`
    /// when nothing would remain
    #[must_use]
    pub fn without_var(&self, var_id: &str) -> Option<Self> {
        let mut possibilities = self.possibilities.clone();
        possibilities.shift_remove(var_id);
        if possibilities.is_empty() {
            None
        } else {
            Some(Self::new(possibilities, self.reconcilable, true))
        }
    }

    /// The same clause with one assertion on `var_id` removed, or `None` when
    /// nothing would remain
    #[must_use]
    pub fn without_assertion(&self, var_id: &str, assertion: &Assertion) -> Option<Self> {
        let mut possibilities = self.possibilities.clone();
        if let Some(assertions) = possibilities.get_mut(var_id) {
            assertions.retain(|a| a != assertion);
            if assertions.is_empty() {
                possibilities.shift_remove(var_id);
            }
        }
        if possibilities.is_empty() {
            None
        } else {
            Some(Self::new(possibilities, self.reconcilable, true))
        }
    }

    /// Whether some variable is asserted both ways, making the clause always
    /// true
    #[must_use]
    pub fn is_tautology(&self) -> bool {
        self.possibilities.values().any(|assertions| {
            assertions
                .iter()
                .any(|a| assertions.iter().any(|b| a.contradicts(b)))
        })
    }

    /// The only variable and assertion, for a unit clause
    #[must_use]
    pub fn as_unit(&self) -> Option<(&str, &Assertion)> {
        if self.wedge || self.possibilities.len() != 1 {
            return None;
        }
        let (var, assertions) = self.possibilities.first()?;
        match assertions.as_slice() {
            [assertion] => Some((var.as_str(), assertion)),
            _ => None,
        }
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.wedge {
            return write!(f, "<wedge>");
        }
        let parts = self
            .possibilities
            .iter()
            .flat_map(|(var, assertions)| {
                assertions
                    .iter()
                    .map(move |assertion| format!("{var} is {assertion}"))
            })
            .collect::<Vec<_>>();
        write!(f, "({})", parts.join(") || ("))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Atomic;

    #[test]
    fn hashes_ignore_order() {
        let a = Clause::new(
            IndexMap::from([
                ("$a".to_string(), vec![Assertion::Truthy]),
                ("$b".to_string(), vec![Assertion::IsType(Atomic::Int)]),
            ]),
            true,
            false,
        );
        let b = Clause::new(
            IndexMap::from([
                ("$b".to_string(), vec![Assertion::IsType(Atomic::Int)]),
                ("$a".to_string(), vec![Assertion::Truthy]),
            ]),
            true,
            false,
        );
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.to_string(), "($a is truthy) || ($b is int)");
    }

    #[test]
    fn implication() {
        let unit = Clause::single("$a", Assertion::Truthy);
        let wider = Clause::new(
            IndexMap::from([
                ("$a".to_string(), vec![Assertion::Truthy]),
                ("$b".to_string(), vec![Assertion::Falsy]),
            ]),
            true,
            false,
        );
        assert!(wider.is_implied_by(&unit));
        assert!(!unit.is_implied_by(&wider));
    }

    #[test]
    fn tautologies_and_units() {
        let clause = Clause::any_of("$a", vec![Assertion::IsIsset, Assertion::IsNotIsset]);
        assert!(clause.is_tautology());
        let unit = Clause::single("$a", Assertion::IsIsset);
        assert_eq!(unit.as_unit(), Some(("$a", &Assertion::IsIsset)));
        assert_eq!(Clause::wedge(1).as_unit(), None);
    }

    #[test]
    fn mentions_descendants() {
        let clause = Clause::single("$a['k']", Assertion::IsIsset);
        assert!(clause.mentions("$a", true));
        assert!(!clause.mentions("$a", false));
        assert!(!clause.mentions("$ab", true));
    }
}

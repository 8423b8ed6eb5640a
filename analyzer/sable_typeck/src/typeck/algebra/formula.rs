//! Operations on formulas: conjunctions of [`Clause`]s

use std::collections::HashSet;

use indexmap::IndexMap;

use super::{Assertion, Clause};

/// Past this many candidate clauses, negation gives up and yields a wedge
const NEGATION_COMPLEXITY_LIMIT: usize = 4096;

/// Past this many clauses, simplification returns its input unchanged
const SIMPLIFICATION_LIMIT: usize = 256;

/// The formula for `left || right`
///
/// Every clause of the result pairs one clause from each side. Pairs that
/// assert something and its negation about one variable are always true and
/// dropped. An empty side means "no constraint", which makes the whole
/// disjunction unconstrained.
#[must_use]
pub fn combine_ored_clauses(left: &[Clause], right: &[Clause], wedge_id: u32) -> Vec<Clause> {
    if left.is_empty() || right.is_empty() {
        return vec![];
    }
    if left.len() * right.len() > NEGATION_COMPLEXITY_LIMIT {
        return vec![Clause::wedge(wedge_id)];
    }

    let mut clauses = vec![];
    let mut has_wedge = false;
    for l in left {
        for r in right {
            if l.wedge && r.wedge {
                has_wedge = true;
                continue;
            }
            let mut possibilities = l.possibilities.clone();
            for (var, assertions) in &r.possibilities {
                possibilities
                    .entry(var.clone())
                    .or_default()
                    .extend(assertions.iter().cloned());
            }
            let reconcilable = l.reconcilable && r.reconcilable && !l.wedge && !r.wedge;
            let clause = Clause::new(possibilities, reconcilable, l.generated || r.generated);
            if !clause.is_tautology() {
                clauses.push(clause);
            }
        }
    }
    if has_wedge {
        clauses.push(Clause::wedge(wedge_id));
    }
    clauses
}

/// The formula for `!(c1 && c2 && ...)`, in conjunctive normal form
///
/// Each clause negates to a conjunction of negated assertions, and the
/// disjunction of those is distributed back into clauses. A clause that is
/// (or contains) a wedge negates to something unknown; every distributed
/// clause picking that unknown part collapses into a single wedge.
#[must_use]
pub fn negate_formula(clauses: &[Clause], wedge_id: u32) -> Vec<Clause> {
    if clauses.is_empty() {
        return vec![Clause::wedge(wedge_id)];
    }

    let mut products: Vec<IndexMap<String, Vec<Assertion>>> = vec![IndexMap::new()];
    let mut has_unknown = false;
    let mut complexity = 0;
    for clause in clauses {
        let literals = clause
            .possibilities
            .iter()
            .flat_map(|(var, assertions)| {
                assertions
                    .iter()
                    .map(move |assertion| (var.clone(), assertion.negate()))
            })
            .collect::<Vec<_>>();
        if literals.is_empty() {
            return vec![Clause::wedge(wedge_id)];
        }
        if clause.wedge || !clause.reconcilable {
            has_unknown = true;
        }

        let mut next = vec![];
        for product in &products {
            for (var, assertion) in &literals {
                complexity += 1;
                if complexity > NEGATION_COMPLEXITY_LIMIT {
                    return vec![Clause::wedge(wedge_id)];
                }
                let mut extended = product.clone();
                extended
                    .entry(var.clone())
                    .or_default()
                    .push(assertion.clone());
                next.push(extended);
            }
        }
        products = next;
    }

    let mut negated = products
        .into_iter()
        .map(|possibilities| Clause::new(possibilities, true, true))
        .filter(|clause| !clause.is_tautology())
        .collect::<Vec<_>>();
    if has_unknown {
        negated.push(Clause::wedge(wedge_id));
    }
    if negated.is_empty() {
        return vec![Clause::wedge(wedge_id)];
    }
    simplify_cnf(&negated)
}

/// Simplify a formula without changing its meaning: drop duplicates, apply
/// unit clauses to the other clauses, and drop clauses implied by others
#[must_use]
pub fn simplify_cnf(clauses: &[Clause]) -> Vec<Clause> {
    if clauses.len() > SIMPLIFICATION_LIMIT {
        return clauses.to_vec();
    }

    let mut seen = HashSet::new();
    let mut clauses = clauses
        .iter()
        .filter(|clause| seen.insert(clause.hash().to_string()))
        .cloned()
        .collect::<Vec<_>>();

    // unit propagation: `$a is int` turns `($a is !int) || ($b is string)`
    // into `$b is string`
    loop {
        let units = clauses
            .iter()
            .filter(|clause| clause.reconcilable)
            .filter_map(Clause::as_unit)
            .map(|(var, assertion)| (var.to_string(), assertion.clone()))
            .collect::<Vec<_>>();
        let mut changed = false;
        for clause in &mut clauses {
            if !clause.reconcilable || clause.as_unit().is_some() {
                continue;
            }
            for (var, assertion) in &units {
                let negation = assertion.negate();
                let contradicts = clause
                    .possibilities
                    .get(var)
                    .is_some_and(|assertions| assertions.contains(&negation));
                if !contradicts {
                    continue;
                }
                if let Some(reduced) = clause.without_assertion(var, &negation) {
                    *clause = reduced;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
        let mut seen = HashSet::new();
        clauses.retain(|clause| seen.insert(clause.hash().to_string()));
    }

    let kept = clauses
        .iter()
        .enumerate()
        .filter(|(index, clause)| {
            !clause.reconcilable
                || !clauses.iter().enumerate().any(|(other_index, other)| {
                    other_index != *index
                        && other.reconcilable
                        && clause.is_implied_by(other)
                        && other.hash() != clause.hash()
                })
        })
        .map(|(_, clause)| clause.clone())
        .collect();
    kept
}

/// The assertions a formula makes about single variables: for each
/// variable, a conjunction of disjunctions. Clauses spanning several
/// variables cannot narrow any one of them and are skipped.
#[must_use]
pub fn get_truths_from_formula(clauses: &[Clause]) -> IndexMap<String, Vec<Vec<Assertion>>> {
    let mut truths: IndexMap<String, Vec<Vec<Assertion>>> = IndexMap::new();
    for clause in clauses {
        if !clause.reconcilable || clause.wedge || clause.possibilities.len() != 1 {
            continue;
        }
        if let Some((var, assertions)) = clause.possibilities.first() {
            truths
                .entry(var.clone())
                .or_default()
                .push(assertions.clone());
        }
    }
    truths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Atomic;

    fn unit(var: &str, assertion: Assertion) -> Clause {
        Clause::single(var, assertion)
    }

    #[test]
    fn or_pairs_clauses() {
        let left = [unit("$a", Assertion::IsType(Atomic::Int))];
        let right = [unit("$b", Assertion::IsNotType(Atomic::Null))];
        let ored = combine_ored_clauses(&left, &right, 0);
        assert_eq!(ored.len(), 1);
        assert_eq!(ored[0].to_string(), "($a is int) || ($b is !null)");
    }

    #[test]
    fn or_of_opposites_is_unconstrained() {
        let left = [unit("$a", Assertion::Truthy)];
        let right = [unit("$a", Assertion::Falsy)];
        assert!(combine_ored_clauses(&left, &right, 0).is_empty());
    }

    #[test]
    fn negating_a_conjunction() {
        let formula = [
            unit("$a", Assertion::IsType(Atomic::Int)),
            unit("$b", Assertion::IsNotType(Atomic::Null)),
        ];
        let negated = negate_formula(&formula, 0);
        assert_eq!(negated.len(), 1);
        assert_eq!(negated[0].to_string(), "($a is !int) || ($b is null)");
    }

    #[test]
    fn negating_a_disjunction() {
        let formula = [Clause::any_of(
            "$a",
            vec![Assertion::IsType(Atomic::Int), Assertion::IsType(Atomic::String)],
        )];
        let negated = negate_formula(&formula, 0);
        let truths = get_truths_from_formula(&negated);
        assert_eq!(
            truths.get("$a"),
            Some(&vec![
                vec![Assertion::IsNotType(Atomic::Int)],
                vec![Assertion::IsNotType(Atomic::String)]
            ])
        );
    }

    #[test]
    fn negating_a_wedge_is_unknown() {
        let negated = negate_formula(&[Clause::wedge(3)], 3);
        assert_eq!(negated.len(), 1);
        assert!(negated[0].wedge);
    }

    #[test]
    fn negating_a_partly_unknown_clause_keeps_the_known_part() {
        let ored = combine_ored_clauses(&[unit("$x", Assertion::Falsy)], &[Clause::wedge(1)], 1);
        let negated = negate_formula(&ored, 1);
        let truths = get_truths_from_formula(&negated);
        assert_eq!(truths.get("$x"), Some(&vec![vec![Assertion::Truthy]]));
        assert!(negated.iter().any(|clause| clause.wedge));
    }

    #[test]
    fn unit_propagation() {
        let formula = [
            unit("$a", Assertion::Truthy),
            Clause::new(
                IndexMap::from([
                    ("$a".to_string(), vec![Assertion::Falsy]),
                    ("$b".to_string(), vec![Assertion::IsType(Atomic::Int)]),
                ]),
                true,
                false,
            ),
        ];
        let simplified = simplify_cnf(&formula);
        let truths = get_truths_from_formula(&simplified);
        assert_eq!(
            truths.get("$b"),
            Some(&vec![vec![Assertion::IsType(Atomic::Int)]])
        );
    }

    #[test]
    fn implied_clauses_are_dropped() {
        let formula = [
            unit("$a", Assertion::Truthy),
            Clause::new(
                IndexMap::from([
                    ("$a".to_string(), vec![Assertion::Truthy]),
                    ("$b".to_string(), vec![Assertion::Falsy]),
                ]),
                true,
                false,
            ),
            unit("$a", Assertion::Truthy),
        ];
        assert_eq!(simplify_cnf(&formula).len(), 1);
    }

    #[test]
    fn multi_variable_clauses_give_no_truths() {
        let formula = combine_ored_clauses(
            &[unit("$a", Assertion::Truthy)],
            &[unit("$b", Assertion::Truthy)],
            0,
        );
        assert!(get_truths_from_formula(&formula).is_empty());
    }
}

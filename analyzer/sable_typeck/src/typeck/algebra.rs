//! Boolean algebra over assertions
//!
//! A condition becomes a formula: a conjunction of [`Clause`]s, each a
//! disjunction of [`Assertion`]s about variables. Formulas are combined for
//! `&&` and `||`, negated for `else` branches, and reduced to per-variable
//! truths that the [reconciler](reconcile_keyed_types) applies to a context.

mod assertion;
mod clause;
mod finder;
mod formula;
mod reconciler;

pub use assertion::Assertion;
pub use clause::Clause;
pub use finder::FormulaBuilder;
pub use formula::{combine_ored_clauses, get_truths_from_formula, negate_formula, simplify_cnf};
pub use reconciler::reconcile_keyed_types;

//! Single propositions about the value of a variable

use std::fmt::Display;

use crate::types::{parse_type, Atomic, TemplateType, TypeParseError};

/// A negatable proposition about one variable or property
#[derive(Debug, Clone, PartialEq)]
pub enum Assertion {
    /// The value is truthy
    Truthy,
    /// The value is falsy
    Falsy,
    /// The value is set and not `null`
    IsIsset,
    /// The value is unset or `null`
    IsNotIsset,
    /// The value is of this type
    IsType(Atomic),
    /// The value is not of this type
    IsNotType(Atomic),
    /// The value is `===` a value of this type
    IsIdentical(Atomic),
    /// The value is `!==` every value of this type
    IsNotIdentical(Atomic),
}

impl Assertion {
    /// The opposite proposition
    #[must_use]
    pub fn negate(&self) -> Self {
        match self {
            Self::Truthy => Self::Falsy,
            Self::Falsy => Self::Truthy,
            Self::IsIsset => Self::IsNotIsset,
            Self::IsNotIsset => Self::IsIsset,
            Self::IsType(atomic) => Self::IsNotType(atomic.clone()),
            Self::IsNotType(atomic) => Self::IsType(atomic.clone()),
            Self::IsIdentical(atomic) => Self::IsNotIdentical(atomic.clone()),
            Self::IsNotIdentical(atomic) => Self::IsIdentical(atomic.clone()),
        }
    }

    /// Whether this is the negated form of a proposition
    #[must_use]
    pub const fn is_negation(&self) -> bool {
        matches!(
            self,
            Self::Falsy | Self::IsNotIsset | Self::IsNotType(_) | Self::IsNotIdentical(_)
        )
    }

    /// Whether `self` and `other` can never both hold
    #[must_use]
    pub fn contradicts(&self, other: &Self) -> bool {
        &self.negate() == other
    }

    /// A stable string form, used for deduplication
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Parse an assertion written in a `@psalm-assert` annotation: a type,
    /// `!type`, `truthy`, `falsy`, `isset` or `!isset`. A union type becomes
    /// a disjunction; a negated union a conjunction of negations.
    ///
    /// # Errors
    /// Fails when the type does not parse.
    pub fn parse_rule(
        input: &str,
        templates: &[TemplateType],
    ) -> Result<Vec<Vec<Self>>, TypeParseError> {
        let input = input.trim();
        let (negated, rest) = input
            .strip_prefix('!')
            .map_or((false, input), |rest| (true, rest.trim()));
        let keyword = match rest.to_ascii_lowercase().as_str() {
            "truthy" | "non-empty" => Some(Self::Truthy),
            "falsy" | "empty" => Some(Self::Falsy),
            "isset" => Some(Self::IsIsset),
            _ => None,
        };
        if let Some(keyword) = keyword {
            let assertion = if negated { keyword.negate() } else { keyword };
            return Ok(vec![vec![assertion]]);
        }

        let ty = parse_type(rest, templates)?;
        if negated {
            Ok(ty
                .into_atomics()
                .into_iter()
                .map(|atomic| vec![Self::IsNotType(atomic)])
                .collect())
        } else {
            Ok(vec![ty.into_atomics().into_iter().map(Self::IsType).collect()])
        }
    }
}

impl Display for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truthy => write!(f, "truthy"),
            Self::Falsy => write!(f, "falsy"),
            Self::IsIsset => write!(f, "isset"),
            Self::IsNotIsset => write!(f, "!isset"),
            Self::IsType(atomic) => write!(f, "{atomic}"),
            Self::IsNotType(atomic) => write!(f, "!{atomic}"),
            Self::IsIdentical(atomic) => write!(f, "={atomic}"),
            Self::IsNotIdentical(atomic) => write!(f, "!={atomic}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negation_round_trips() {
        let assertion = Assertion::IsType(Atomic::Int);
        assert_eq!(assertion.negate(), Assertion::IsNotType(Atomic::Int));
        assert_eq!(assertion.negate().negate(), assertion);
        assert!(assertion.contradicts(&assertion.negate()));
        assert!(assertion.negate().is_negation());
    }

    #[test]
    fn parsing_rules() {
        assert_eq!(
            Assertion::parse_rule("!null", &[]),
            Ok(vec![vec![Assertion::IsNotType(Atomic::Null)]])
        );
        assert_eq!(
            Assertion::parse_rule("int|string", &[]),
            Ok(vec![vec![
                Assertion::IsType(Atomic::Int),
                Assertion::IsType(Atomic::String)
            ]])
        );
        assert_eq!(
            Assertion::parse_rule("truthy", &[]),
            Ok(vec![vec![Assertion::Truthy]])
        );
        assert_eq!(
            Assertion::parse_rule("!isset", &[]),
            Ok(vec![vec![Assertion::IsNotIsset]])
        );
    }

    #[test]
    fn display() {
        assert_eq!(Assertion::IsIdentical(Atomic::LiteralInt(3)).to_string(), "=int(3)");
        assert_eq!(Assertion::IsNotType(Atomic::Null).to_string(), "!null");
    }
}

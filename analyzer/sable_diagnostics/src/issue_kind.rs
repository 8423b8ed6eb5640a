//! Defines every issue the analyzer can raise about checked source.

use sable_utils::span::{Span, Spannable, Spanned};
use thiserror::Error;

/// The broad family an [`IssueKind`] belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueCategory {
    /// A variable, property, constant, class, function or method was not found
    UndefinedSymbol,
    /// A declared contract and an inferred type are incompatible
    TypeMismatch,
    /// Compatible only by generalizing one side, usually through `mixed`
    Coercion,
    /// A non-nullable or non-falsable contract may receive `null` or `false`
    Nullability,
    /// `$this` misuse, visibility violations and similar
    ScopeViolation,
    /// Code that can never run, or a condition whose outcome is already known
    DeadPath,
    /// Array, property or method access on something that may not support it
    UnsoundAccess,
}

/// The list of possible issues
// Types inside issues are kept as rendered strings so this crate stays
// independent of the type model.
#[allow(missing_docs)]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    // UNDEFINED SYMBOLS
    #[error("cannot find referenced variable `{0}`")]
    UndefinedVariable(String),
    #[error("possibly undefined variable `{0}`, first seen in a branch that may not have run")]
    PossiblyUndefinedVariable(String),
    #[error("constant `{0}` is not defined")]
    UndefinedConstant(String),
    #[error("class or interface `{0}` does not exist")]
    UndefinedClass(String),
    #[error("function `{0}` does not exist")]
    UndefinedFunction(String),
    #[error("method `{0}` does not exist")]
    UndefinedMethod(String),
    #[error("property `{0}` is not defined")]
    UndefinedProperty(String),
    #[error("cannot assign to undefined property `{0}`")]
    UndefinedPropertyAssignment(String),
    #[error("cannot access value on variable `{container}` using offset value of `{offset}`")]
    UndefinedArrayOffset { container: String, offset: String },
    #[error("possibly undefined array key `{0}`")]
    PossiblyUndefinedArrayOffset(String),
    #[error("cannot use `parent` when the current class has no parent")]
    ParentNotFound,

    // TYPE MISMATCHES
    #[error("the declared return type `{declared}` for `{function}` is incorrect, got `{inferred}`")]
    InvalidReturnType {
        function: String,
        declared: String,
        inferred: String,
    },
    #[error("no value should be returned from `{function}`, whose declared return type is `void`, got `{inferred}`")]
    InvalidReturnStatement { function: String, inferred: String },
    #[error("no return statements were found for `{function}`, but return type `{declared}` was expected")]
    MissingReturnStatement { function: String, declared: String },
    #[error("not all code paths of `{function}` end in a return statement, return type `{declared}` expected")]
    NotAllPathsReturn { function: String, declared: String },
    #[error("argument {argument} of `{function}` expects `{expected}`, got `{got}`")]
    InvalidArgument {
        argument: usize,
        function: String,
        expected: String,
        got: String,
    },
    #[error("argument {argument} of `{function}` expects `{expected}`, got scalar `{got}`")]
    InvalidScalarArgument {
        argument: usize,
        function: String,
        expected: String,
        got: String,
    },
    #[error("too few arguments for `{function}`, expecting {expected} but saw {got}")]
    TooFewArguments {
        function: String,
        expected: usize,
        got: usize,
    },
    #[error("too many arguments for `{function}`, expecting {expected} but saw {got}")]
    TooManyArguments {
        function: String,
        expected: usize,
        got: usize,
    },
    #[error("property `{property}` with declared type `{expected}` is being assigned `{got}`")]
    InvalidPropertyAssignment {
        property: String,
        expected: String,
        got: String,
    },
    #[error("default value of `{param}` should be `{expected}`, got `{got}`")]
    InvalidParamDefault {
        param: String,
        expected: String,
        got: String,
    },
    #[error("cannot access value with offset `{got}`, expecting `{expected}`")]
    InvalidArrayOffset { expected: String, got: String },
    #[error("cannot access array value on non-array type `{0}`")]
    InvalidArrayAccess(String),
    #[error("cannot fetch property on non-object type `{0}`")]
    InvalidPropertyFetch(String),
    #[error("cannot call method on non-object type `{0}`")]
    InvalidMethodCall(String),
    #[error("cannot iterate over `{0}`")]
    InvalidIterator(String),
    #[error("cannot clone non-object type `{0}`")]
    InvalidClone(String),
    #[error("cannot cast `{from}` to `{to}`")]
    InvalidCast { from: String, to: String },
    #[error("cannot perform `{operator}` on `{got}`")]
    InvalidOperand { operator: String, got: String },
    #[error("cannot instantiate abstract class or interface `{0}`")]
    AbstractInstantiation(String),
    #[error("by-reference variable `{var}` is constrained to `{expected}`, got `{got}`")]
    ReferenceConstraintViolation {
        var: String,
        expected: String,
        got: String,
    },
    #[error("`{var}` of type `{existing}` can never be `{asserted}`")]
    TypeDoesNotContainType {
        var: String,
        existing: String,
        asserted: String,
    },
    #[error("invalid docblock: {0}")]
    InvalidDocblock(String),

    // COERCIONS
    #[error("the declared return type `{declared}` for `{function}` is more specific than the inferred return type `{inferred}`")]
    MoreSpecificReturnType {
        function: String,
        declared: String,
        inferred: String,
    },
    #[error("could not verify return type `{declared}` for `{function}`, inferred `mixed`")]
    MixedInferredReturnType { function: String, declared: String },
    #[error("argument {argument} of `{function}` expects `{expected}`, parent type `{got}` provided")]
    ArgumentTypeCoercion {
        argument: usize,
        function: String,
        expected: String,
        got: String,
    },
    #[error("argument {argument} of `{function}` cannot be `mixed`, expecting `{expected}`")]
    MixedArgument {
        argument: usize,
        function: String,
        expected: String,
    },
    #[error("possibly invalid array offset `{got}`, expecting `{expected}`")]
    PossiblyInvalidArrayOffset { expected: String, got: String },

    // NULLABILITY
    #[error("the declared return type `{declared}` for `{function}` is not nullable, but the inferred type `{inferred}` is")]
    NullableReturnStatement {
        function: String,
        declared: String,
        inferred: String,
    },
    #[error("the declared return type `{declared}` for `{function}` does not allow false, but the inferred type `{inferred}` contains false")]
    FalsableReturnStatement {
        function: String,
        declared: String,
        inferred: String,
    },
    #[error("argument {argument} of `{function}` cannot be null")]
    NullArgument { argument: usize, function: String },
    #[error("argument {argument} of `{function}` cannot be null, possibly null value provided")]
    PossiblyNullArgument { argument: usize, function: String },
    #[error("cannot assign possibly null value to non-nullable property `{0}`")]
    PossiblyNullPropertyAssignment(String),

    // SCOPE VIOLATIONS
    #[error("invalid reference to `$this` in a {0} context")]
    InvalidScope(String),
    #[error("cannot access {0} from this scope")]
    InaccessibleProperty(String),
    #[error("cannot access method {0} from this scope")]
    InaccessibleMethod(String),
    #[error("cannot access class constant {0} from this scope")]
    InaccessibleClassConstant(String),

    // DEAD PATHS
    #[error("expressions after a return, throw, break or continue are never evaluated")]
    UnevaluatedCode,
    #[error("`{var}` of type `{existing}` is always `{asserted}`")]
    RedundantCondition {
        var: String,
        existing: String,
        asserted: String,
    },

    // UNSOUND ACCESS
    #[error("cannot access array value on null variable `{0}`")]
    NullArrayAccess(String),
    #[error("cannot access array value on possibly null variable `{0}`")]
    PossiblyNullArrayAccess(String),
    #[error("cannot access array value on mixed variable `{0}`")]
    MixedArrayAccess(String),
    #[error("cannot get property on null variable `{0}`")]
    NullPropertyFetch(String),
    #[error("cannot get property on possibly null variable `{0}`")]
    PossiblyNullPropertyFetch(String),
    #[error("cannot fetch property on mixed variable `{0}`")]
    MixedPropertyFetch(String),
    #[error("cannot call method on null variable `{0}`")]
    NullMethodCall(String),
    #[error("cannot call method on possibly null variable `{0}`")]
    PossiblyNullMethodCall(String),
    #[error("cannot call method on mixed variable `{0}`")]
    MixedMethodCall(String),
    #[error("cannot iterate over null value")]
    NullIterator,
    #[error("cannot iterate over possibly null value of type `{0}`")]
    PossiblyNullIterator(String),
    #[error("operand of `{0}` is mixed")]
    MixedOperand(String),
    #[error("operand of `{operator}` is possibly null, type `{got}`")]
    PossiblyNullOperand { operator: String, got: String },
}

impl IssueKind {
    /// The stable name of this issue, used to configure its report level
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UndefinedVariable(_) => "UndefinedVariable",
            Self::PossiblyUndefinedVariable(_) => "PossiblyUndefinedVariable",
            Self::UndefinedConstant(_) => "UndefinedConstant",
            Self::UndefinedClass(_) => "UndefinedClass",
            Self::UndefinedFunction(_) => "UndefinedFunction",
            Self::UndefinedMethod(_) => "UndefinedMethod",
            Self::UndefinedProperty(_) => "UndefinedProperty",
            Self::UndefinedPropertyAssignment(_) => "UndefinedPropertyAssignment",
            Self::UndefinedArrayOffset { .. } => "UndefinedArrayOffset",
            Self::PossiblyUndefinedArrayOffset(_) => "PossiblyUndefinedArrayOffset",
            Self::ParentNotFound => "ParentNotFound",
            Self::InvalidReturnType { .. } => "InvalidReturnType",
            Self::InvalidReturnStatement { .. } => "InvalidReturnStatement",
            Self::MissingReturnStatement { .. } => "MissingReturnStatement",
            Self::NotAllPathsReturn { .. } => "NotAllPathsReturn",
            Self::InvalidArgument { .. } => "InvalidArgument",
            Self::InvalidScalarArgument { .. } => "InvalidScalarArgument",
            Self::TooFewArguments { .. } => "TooFewArguments",
            Self::TooManyArguments { .. } => "TooManyArguments",
            Self::InvalidPropertyAssignment { .. } => "InvalidPropertyAssignment",
            Self::InvalidParamDefault { .. } => "InvalidParamDefault",
            Self::InvalidArrayOffset { .. } => "InvalidArrayOffset",
            Self::InvalidArrayAccess(_) => "InvalidArrayAccess",
            Self::InvalidPropertyFetch(_) => "InvalidPropertyFetch",
            Self::InvalidMethodCall(_) => "InvalidMethodCall",
            Self::InvalidIterator(_) => "InvalidIterator",
            Self::InvalidClone(_) => "InvalidClone",
            Self::InvalidCast { .. } => "InvalidCast",
            Self::InvalidOperand { .. } => "InvalidOperand",
            Self::AbstractInstantiation(_) => "AbstractInstantiation",
            Self::ReferenceConstraintViolation { .. } => "ReferenceConstraintViolation",
            Self::TypeDoesNotContainType { .. } => "TypeDoesNotContainType",
            Self::InvalidDocblock(_) => "InvalidDocblock",
            Self::MoreSpecificReturnType { .. } => "MoreSpecificReturnType",
            Self::MixedInferredReturnType { .. } => "MixedInferredReturnType",
            Self::ArgumentTypeCoercion { .. } => "ArgumentTypeCoercion",
            Self::MixedArgument { .. } => "MixedArgument",
            Self::PossiblyInvalidArrayOffset { .. } => "PossiblyInvalidArrayOffset",
            Self::NullableReturnStatement { .. } => "NullableReturnStatement",
            Self::FalsableReturnStatement { .. } => "FalsableReturnStatement",
            Self::NullArgument { .. } => "NullArgument",
            Self::PossiblyNullArgument { .. } => "PossiblyNullArgument",
            Self::PossiblyNullPropertyAssignment(_) => "PossiblyNullPropertyAssignment",
            Self::InvalidScope(_) => "InvalidScope",
            Self::InaccessibleProperty(_) => "InaccessibleProperty",
            Self::InaccessibleMethod(_) => "InaccessibleMethod",
            Self::InaccessibleClassConstant(_) => "InaccessibleClassConstant",
            Self::UnevaluatedCode => "UnevaluatedCode",
            Self::RedundantCondition { .. } => "RedundantCondition",
            Self::NullArrayAccess(_) => "NullArrayAccess",
            Self::PossiblyNullArrayAccess(_) => "PossiblyNullArrayAccess",
            Self::MixedArrayAccess(_) => "MixedArrayAccess",
            Self::NullPropertyFetch(_) => "NullPropertyFetch",
            Self::PossiblyNullPropertyFetch(_) => "PossiblyNullPropertyFetch",
            Self::MixedPropertyFetch(_) => "MixedPropertyFetch",
            Self::NullMethodCall(_) => "NullMethodCall",
            Self::PossiblyNullMethodCall(_) => "PossiblyNullMethodCall",
            Self::MixedMethodCall(_) => "MixedMethodCall",
            Self::NullIterator => "NullIterator",
            Self::PossiblyNullIterator(_) => "PossiblyNullIterator",
            Self::MixedOperand(_) => "MixedOperand",
            Self::PossiblyNullOperand { .. } => "PossiblyNullOperand",
        }
    }

    /// The [`IssueCategory`] this issue belongs to
    #[must_use]
    pub const fn category(&self) -> IssueCategory {
        match self {
            Self::UndefinedVariable(_)
            | Self::PossiblyUndefinedVariable(_)
            | Self::UndefinedConstant(_)
            | Self::UndefinedClass(_)
            | Self::UndefinedFunction(_)
            | Self::UndefinedMethod(_)
            | Self::UndefinedProperty(_)
            | Self::UndefinedPropertyAssignment(_)
            | Self::UndefinedArrayOffset { .. }
            | Self::PossiblyUndefinedArrayOffset(_)
            | Self::ParentNotFound => IssueCategory::UndefinedSymbol,

            Self::InvalidReturnType { .. }
            | Self::InvalidReturnStatement { .. }
            | Self::MissingReturnStatement { .. }
            | Self::NotAllPathsReturn { .. }
            | Self::InvalidArgument { .. }
            | Self::InvalidScalarArgument { .. }
            | Self::TooFewArguments { .. }
            | Self::TooManyArguments { .. }
            | Self::InvalidPropertyAssignment { .. }
            | Self::InvalidParamDefault { .. }
            | Self::InvalidArrayOffset { .. }
            | Self::InvalidCast { .. }
            | Self::InvalidOperand { .. }
            | Self::AbstractInstantiation(_)
            | Self::ReferenceConstraintViolation { .. }
            | Self::TypeDoesNotContainType { .. }
            | Self::InvalidDocblock(_) => IssueCategory::TypeMismatch,

            Self::MoreSpecificReturnType { .. }
            | Self::MixedInferredReturnType { .. }
            | Self::ArgumentTypeCoercion { .. }
            | Self::MixedArgument { .. }
            | Self::PossiblyInvalidArrayOffset { .. } => IssueCategory::Coercion,

            Self::NullableReturnStatement { .. }
            | Self::FalsableReturnStatement { .. }
            | Self::NullArgument { .. }
            | Self::PossiblyNullArgument { .. }
            | Self::PossiblyNullPropertyAssignment(_) => IssueCategory::Nullability,

            Self::InvalidScope(_)
            | Self::InaccessibleProperty(_)
            | Self::InaccessibleMethod(_)
            | Self::InaccessibleClassConstant(_) => IssueCategory::ScopeViolation,

            Self::UnevaluatedCode | Self::RedundantCondition { .. } => IssueCategory::DeadPath,

            Self::InvalidArrayAccess(_)
            | Self::InvalidPropertyFetch(_)
            | Self::InvalidMethodCall(_)
            | Self::InvalidIterator(_)
            | Self::InvalidClone(_)
            | Self::NullArrayAccess(_)
            | Self::PossiblyNullArrayAccess(_)
            | Self::MixedArrayAccess(_)
            | Self::NullPropertyFetch(_)
            | Self::PossiblyNullPropertyFetch(_)
            | Self::MixedPropertyFetch(_)
            | Self::NullMethodCall(_)
            | Self::PossiblyNullMethodCall(_)
            | Self::MixedMethodCall(_)
            | Self::NullIterator
            | Self::PossiblyNullIterator(_)
            | Self::MixedOperand(_)
            | Self::PossiblyNullOperand { .. } => IssueCategory::UnsoundAccess,
        }
    }

    /// Attach this issue to a [`Span`]
    #[must_use]
    pub fn at(self, span: Span) -> Spanned<Self> {
        self.in_span(span)
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn messages_name_both_types() {
        assert_snapshot!(
            IssueKind::InvalidReturnType {
                function: "foo".to_string(),
                declared: "string".to_string(),
                inferred: "int(5)".to_string(),
            }
            .to_string(),
            @"the declared return type `string` for `foo` is incorrect, got `int(5)`"
        );
    }

    #[test]
    fn names_are_stable() {
        assert_eq!(
            IssueKind::UndefinedVariable("$a".to_string()).name(),
            "UndefinedVariable"
        );
        assert_eq!(IssueKind::UnevaluatedCode.name(), "UnevaluatedCode");
    }

    #[test]
    fn categories_follow_the_taxonomy() {
        assert_eq!(
            IssueKind::NullArrayAccess("$a".to_string()).category(),
            IssueCategory::UnsoundAccess
        );
        assert_eq!(
            IssueKind::MixedInferredReturnType {
                function: "f".to_string(),
                declared: "int".to_string()
            }
            .category(),
            IssueCategory::Coercion
        );
        assert_eq!(
            IssueKind::InvalidScope("static".to_string()).category(),
            IssueCategory::ScopeViolation
        );
    }
}

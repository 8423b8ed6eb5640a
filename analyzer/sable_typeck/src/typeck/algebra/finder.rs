//! Turn conditions into formulas

use indexmap::IndexMap;
use sable_ast::expr::{Assignment, Callee, ClassRef, Equality, Expr, ExprKind, Logical};
use sable_utils::names::strip_leading_separator;

use super::{combine_ored_clauses, negate_formula, Assertion, Clause};
use crate::{
    codebase::{Codebase, FunctionLikeStorage, StoredAssertion},
    typeck::{analyzer::NodeTypes, var_id::get_var_id},
    types::Atomic,
};

/// Per-variable assertions in conjunctive normal form
type AssertionMap = IndexMap<String, Vec<Vec<Assertion>>>;

/// What the formula of a condition depends on besides the condition itself
#[derive(Clone, Copy)]
pub struct FormulaBuilder<'a> {
    /// Declared functions, for assertion helpers
    pub codebase: &'a Codebase,
    /// The inferred types of the (already analyzed) condition's nodes
    pub node_types: &'a NodeTypes,
    /// The class `self` and `static` refer to
    pub self_class: Option<&'a str>,
    /// The class `parent` refers to
    pub parent_class: Option<&'a str>,
    /// Whether no-argument method calls have var ids
    pub memoize_method_calls: bool,
}

impl FormulaBuilder<'_> {
    /// The clauses that hold when `cond` is truthy
    ///
    /// Anything that cannot be expressed as assertions about variables
    /// becomes a wedge identified by the condition's node id.
    #[must_use]
    pub fn get_formula(&self, cond: &Expr) -> Vec<Clause> {
        let wedge_id = cond.id.0;
        match cond.kind() {
            ExprKind::Logical(Logical::And, left, right) => {
                let mut clauses = self.get_formula(left);
                clauses.extend(self.get_formula(right));
                clauses
            }
            ExprKind::Logical(Logical::Or, left, right) => {
                combine_ored_clauses(&self.get_formula(left), &self.get_formula(right), wedge_id)
            }
            ExprKind::Logical(Logical::Xor, ..) => vec![Clause::wedge(wedge_id)],
            ExprKind::UnaryNot(inner) => {
                if let Some(clauses) = self.get_if_false_formula(inner) {
                    return clauses;
                }
                negate_formula(&self.get_formula(inner), wedge_id)
            }
            ExprKind::Assignment(Assignment::Standard, target, _)
            | ExprKind::AssignRef(target, _) => self.get_formula(target),
            ExprKind::ErrorSuppress(inner) => self.get_formula(inner),
            _ => {
                let assertions = self.scrape_assertions(cond);
                if assertions.is_empty() {
                    return vec![Clause::wedge(wedge_id)];
                }
                assertions
                    .into_iter()
                    .flat_map(|(var_id, groups)| {
                        groups
                            .into_iter()
                            .map(move |group| Clause::any_of(&var_id, group))
                    })
                    .collect()
            }
        }
    }

    /// The id of the location `expr` names
    fn var_id(&self, expr: &Expr) -> Option<String> {
        get_var_id(expr, self.self_class, self.memoize_method_calls)
    }

    /// Assertions about single variables implied by `cond` being truthy
    fn scrape_assertions(&self, cond: &Expr) -> AssertionMap {
        let mut assertions = AssertionMap::new();
        match cond.kind() {
            ExprKind::Isset(exprs) => {
                for expr in exprs {
                    if let Some(var_id) = self.var_id(expr) {
                        assertions.insert(var_id, vec![vec![Assertion::IsIsset]]);
                    } else {
                        assertions.extend(self.scrape_const_array_key(expr));
                    }
                }
            }
            ExprKind::Empty(expr) => {
                if let Some(var_id) = self.var_id(expr) {
                    assertions.insert(var_id, vec![vec![Assertion::Falsy]]);
                }
            }
            ExprKind::Instanceof(expr, class) => {
                if let (Some(var_id), Some(class)) = (self.var_id(expr), self.resolve_class(class)) {
                    assertions.insert(var_id, vec![vec![Assertion::IsType(Atomic::named(&class))]]);
                }
            }
            ExprKind::Equality(op, left, right) => {
                if let Some((var_id, assertion)) = self
                    .scrape_equality(*op, left, right)
                    .or_else(|| self.scrape_equality(*op, right, left))
                {
                    assertions.insert(var_id, vec![vec![assertion]]);
                }
            }
            ExprKind::FuncCall(Callee::Named(name), args) => {
                let name = strip_leading_separator(name.value());
                if name.eq_ignore_ascii_case("count") {
                    if let Some(var_id) = args.first().and_then(|arg| self.var_id(&arg.value)) {
                        assertions.insert(var_id, vec![vec![Assertion::Truthy]]);
                    }
                } else if let Some(function) = self.codebase.get_function(name) {
                    self.map_stored_assertions(&function.if_true_assertions, args, &mut assertions);
                }
            }
            ExprKind::MethodCall { .. } | ExprKind::StaticCall(..) => {
                if let Some(var_id) = self.var_id(cond) {
                    assertions.insert(var_id, vec![vec![Assertion::Truthy]]);
                } else if let Some((method, args)) = self.resolve_method_call(cond) {
                    self.map_stored_assertions(&method.if_true_assertions, args, &mut assertions);
                }
            }
            _ => {
                if let Some(var_id) = self.var_id(cond) {
                    assertions.insert(var_id, vec![vec![Assertion::Truthy]]);
                }
            }
        }
        assertions
    }

    /// For `!f($x)` where `f` declares what holds when it returns falsy
    fn get_if_false_formula(&self, inner: &Expr) -> Option<Vec<Clause>> {
        let (stored, args) = match inner.kind() {
            ExprKind::FuncCall(Callee::Named(name), args) => {
                let function = self
                    .codebase
                    .get_function(strip_leading_separator(name.value()))?;
                (&function.if_false_assertions, args.as_slice())
            }
            ExprKind::MethodCall { .. } | ExprKind::StaticCall(..) => {
                let (method, args) = self.resolve_method_call(inner)?;
                (&method.if_false_assertions, args)
            }
            _ => return None,
        };
        if stored.is_empty() {
            return None;
        }
        let mut assertions = AssertionMap::new();
        self.map_stored_assertions(stored, args, &mut assertions);
        if assertions.is_empty() {
            return None;
        }
        Some(
            assertions
                .into_iter()
                .flat_map(|(var_id, groups)| {
                    groups
                        .into_iter()
                        .map(move |group| Clause::any_of(&var_id, group))
                })
                .collect(),
        )
    }

    /// Attach stored parameter assertions to the matching arguments
    fn map_stored_assertions(
        &self,
        stored: &[StoredAssertion],
        args: &[sable_ast::expr::Arg],
        assertions: &mut AssertionMap,
    ) {
        for StoredAssertion { param_index, rule } in stored {
            let Some(arg) = args.get(*param_index) else {
                continue;
            };
            if let Some(var_id) = self.var_id(&arg.value) {
                assertions
                    .entry(var_id)
                    .or_default()
                    .extend(rule.iter().cloned());
            }
        }
    }

    /// The method a method or static call resolves to, with its arguments
    fn resolve_method_call<'e>(
        &self,
        call: &'e Expr,
    ) -> Option<(&FunctionLikeStorage, &'e [sable_ast::expr::Arg])> {
        match call.kind() {
            ExprKind::MethodCall {
                object, name, args, ..
            } => {
                let object_type = self.node_types.get(object.id)?;
                let class = object_type.atomics().find_map(|atomic| match atomic {
                    Atomic::NamedObject { name, .. } => Some(name.as_str()),
                    _ => None,
                })?;
                Some((self.codebase.get_method(class, name.value())?, args))
            }
            ExprKind::StaticCall(class, name, args) => {
                let class = self.resolve_class(class)?;
                Some((self.codebase.get_method(&class, name.value())?, args))
            }
            _ => None,
        }
    }

    /// The assertion an (in)equality makes about `subject`, when `other` is
    /// something specific enough
    fn scrape_equality(&self, op: Equality, subject: &Expr, other: &Expr) -> Option<(String, Assertion)> {
        if let Some(scraped) = self.scrape_type_function_equality(op, subject, other) {
            return Some(scraped);
        }

        let var_id = self.var_id(subject)?;
        let identity = matches!(op, Equality::Identical | Equality::NotIdentical);
        let positive = matches!(op, Equality::Identical | Equality::Eq);

        let other_type = self.node_types.get(other.id);
        let literal = match other.kind() {
            ExprKind::Null => Atomic::Null,
            ExprKind::Bool(true) => Atomic::True,
            ExprKind::Bool(false) => Atomic::False,
            _ => other_type.and_then(|ty| ty.single()).cloned()?,
        };

        let assertion = match (&literal, identity) {
            (Atomic::Null | Atomic::False, false) => Assertion::Falsy,
            (Atomic::True, false) => Assertion::Truthy,
            (Atomic::Null | Atomic::True | Atomic::False, true) => Assertion::IsType(literal),
            (
                Atomic::LiteralInt(_)
                | Atomic::LiteralString(_)
                | Atomic::LiteralFloat(_)
                | Atomic::LiteralClassString(_),
                true,
            ) => Assertion::IsIdentical(literal),
            _ => return None,
        };
        Some((var_id, if positive { assertion } else { assertion.negate() }))
    }

    /// `gettype($x) === 'string'` and `get_class($x) === Foo::class`
    fn scrape_type_function_equality(
        &self,
        op: Equality,
        call: &Expr,
        other: &Expr,
    ) -> Option<(String, Assertion)> {
        if !matches!(op, Equality::Identical | Equality::NotIdentical) {
            return None;
        }
        let ExprKind::FuncCall(Callee::Named(name), args) = call.kind() else {
            return None;
        };
        let var_id = self.var_id(&args.first()?.value)?;
        let name = strip_leading_separator(name.value()).to_ascii_lowercase();
        let atomic = match (name.as_str(), other.kind()) {
            ("gettype", ExprKind::String(type_name)) => match type_name.as_str() {
                "string" => Atomic::String,
                "integer" => Atomic::Int,
                "double" => Atomic::Float,
                "boolean" => Atomic::Bool,
                "array" => Atomic::mixed_array(),
                "NULL" => Atomic::Null,
                "object" => Atomic::Object,
                "resource" => Atomic::Resource,
                _ => return None,
            },
            ("get_class", _) => match self.node_types.get(other.id)?.single()? {
                Atomic::LiteralClassString(class) => Atomic::named(class),
                _ => return None,
            },
            _ => return None,
        };
        let assertion = Assertion::IsType(atomic);
        Some((
            var_id,
            if op == Equality::Identical {
                assertion
            } else {
                assertion.negate()
            },
        ))
    }

    /// `isset(SOME_MAP[$key])`: `$key` is one of the map's keys
    fn scrape_const_array_key(&self, expr: &Expr) -> AssertionMap {
        let mut assertions = AssertionMap::new();
        let ExprKind::ArrayDimFetch(base, Some(dim)) = expr.kind() else {
            return assertions;
        };
        if !matches!(base.kind(), ExprKind::ConstFetch(_) | ExprKind::ClassConstFetch(..)) {
            return assertions;
        }
        let Some(key_var) = self.var_id(dim) else {
            return assertions;
        };
        let Some(Atomic::ObjectShape { properties, .. }) =
            self.node_types.get(base.id).and_then(|ty| ty.single())
        else {
            return assertions;
        };
        let keys = properties
            .keys()
            .map(|key| Assertion::IsType(key.to_atomic()))
            .collect::<Vec<_>>();
        if !keys.is_empty() {
            assertions.insert(key_var, vec![keys]);
        }
        assertions
    }

    /// The declared name of the class a reference resolves to
    fn resolve_class(&self, class: &ClassRef) -> Option<String> {
        let name = match class {
            ClassRef::Named(name) => strip_leading_separator(name),
            ClassRef::SelfRef | ClassRef::Static => self.self_class?,
            ClassRef::Parent => self.parent_class?,
            ClassRef::Expr(_) => return None,
        };
        Some(
            self.codebase
                .get_class(name)
                .map_or_else(|| name.to_string(), |class| class.name.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use sable_ast::{expr::ClassRef, AstBuilder};

    use super::*;
    use crate::{
        typeck::algebra::get_truths_from_formula,
        types::{ShapeKey, Union},
    };

    fn formula_of(cond: &Expr, codebase: &Codebase, node_types: &NodeTypes) -> Vec<String> {
        FormulaBuilder {
            codebase,
            node_types,
            self_class: None,
            parent_class: None,
            memoize_method_calls: false,
        }
        .get_formula(cond)
        .iter()
        .map(ToString::to_string)
        .collect()
    }

    #[test]
    fn leaves_and_conjunctions() {
        let b = AstBuilder::new();
        let codebase = Codebase::new_empty();
        let node_types = NodeTypes::default();
        let cond = b.and(
            b.isset(vec![b.var("a")]),
            b.instance_of(b.var("b"), ClassRef::named("Foo")),
        );
        assert_eq!(
            formula_of(&cond, &codebase, &node_types),
            vec!["($a is isset)", "($b is Foo)"]
        );
    }

    #[test]
    fn disjunctions_and_negations() {
        let b = AstBuilder::new();
        let codebase = Codebase::new_empty();
        let node_types = NodeTypes::default();
        let cond = b.or(b.var("a"), b.not(b.var("b")));
        assert_eq!(
            formula_of(&cond, &codebase, &node_types),
            vec!["($a is truthy) || ($b is falsy)"]
        );

        let cond = b.not(b.identical(b.var("a"), b.null()));
        assert_eq!(formula_of(&cond, &codebase, &node_types), vec!["($a is !null)"]);
    }

    #[test]
    fn comparisons_with_literals() {
        let b = AstBuilder::new();
        let codebase = Codebase::new_empty();
        let mut node_types = NodeTypes::default();
        let five = b.int(5);
        node_types.set(five.id, Atomic::LiteralInt(5).into());
        let cond = b.not_identical(b.var("a"), five);
        assert_eq!(formula_of(&cond, &codebase, &node_types), vec!["($a is !=int(5))"]);

        let cond = b.equality(Equality::Eq, b.null(), b.var("a"));
        assert_eq!(formula_of(&cond, &codebase, &node_types), vec!["($a is falsy)"]);
    }

    fn constant_map(keys: &[&str]) -> Union {
        Atomic::ObjectShape {
            properties: keys
                .iter()
                .map(|key| (ShapeKey::from_string(key), Union::int()))
                .collect(),
            sealed: true,
        }
        .into()
    }

    #[test]
    fn isset_on_global_constant_maps() {
        let b = AstBuilder::new();
        let codebase = Codebase::new_empty();
        let mut node_types = NodeTypes::default();

        let single = b.constant("SINGLE");
        node_types.set(single.id, constant_map(&["a"]));
        let cond = b.isset(vec![b.dim(single, b.var("k"))]);
        assert_eq!(formula_of(&cond, &codebase, &node_types), vec!["($k is string(a))"]);

        let several = b.constant("SEVERAL");
        node_types.set(several.id, constant_map(&["a", "b", "7"]));
        let cond = b.isset(vec![b.dim(several, b.var("k"))]);
        assert_eq!(
            formula_of(&cond, &codebase, &node_types),
            vec!["($k is string(a)) || ($k is string(b)) || ($k is int(7))"]
        );
    }

    #[test]
    fn isset_on_class_constant_maps() {
        let b = AstBuilder::new();
        let codebase = Codebase::new_empty();
        let mut node_types = NodeTypes::default();

        let single = b.class_const(ClassRef::named("K"), "ONE");
        node_types.set(single.id, constant_map(&["on"]));
        let cond = b.isset(vec![b.dim(single, b.var("k"))]);
        assert_eq!(formula_of(&cond, &codebase, &node_types), vec!["($k is string(on))"]);

        let several = b.class_const(ClassRef::named("K"), "MANY");
        node_types.set(several.id, constant_map(&["on", "off"]));
        let cond = b.isset(vec![b.dim(several, b.var("k"))]);
        assert_eq!(
            formula_of(&cond, &codebase, &node_types),
            vec!["($k is string(on)) || ($k is string(off))"]
        );
    }

    #[test]
    fn isset_on_other_constants_asserts_nothing() {
        let b = AstBuilder::new();
        let codebase = Codebase::new_empty();
        let mut node_types = NodeTypes::default();
        let scalar = b.constant("LIMIT");
        node_types.set(scalar.id, Union::int());
        let cond = b.isset(vec![b.dim(scalar, b.var("k"))]);
        assert_eq!(formula_of(&cond, &codebase, &node_types), vec!["<wedge>"]);

        let untyped = b.isset(vec![b.dim(b.constant("UNKNOWN"), b.var("k"))]);
        assert_eq!(formula_of(&untyped, &codebase, &node_types), vec!["<wedge>"]);
    }

    #[test]
    fn unknown_conditions_are_wedges() {
        let b = AstBuilder::new();
        let codebase = Codebase::new_empty();
        let node_types = NodeTypes::default();
        let cond = b.call("mystery", vec![b.var("a")]);
        assert_eq!(formula_of(&cond, &codebase, &node_types), vec!["<wedge>"]);
    }

    #[test]
    fn type_check_functions_use_stored_assertions() {
        let b = AstBuilder::new();
        let codebase = Codebase::new();
        let node_types = NodeTypes::default();
        let cond = b.call("is_string", vec![b.var("a")]);
        assert_eq!(formula_of(&cond, &codebase, &node_types), vec!["($a is string)"]);

        let builder = FormulaBuilder {
            codebase: &codebase,
            node_types: &node_types,
            self_class: None,
            parent_class: None,
            memoize_method_calls: false,
        };
        let negated = builder.get_formula(&b.not(b.call("is_string", vec![b.var("a")])));
        let truths = get_truths_from_formula(&negated);
        assert_eq!(
            truths.get("$a"),
            Some(&vec![vec![Assertion::IsNotType(Atomic::String)]])
        );
    }
}

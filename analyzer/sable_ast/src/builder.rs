//! Hand construction of ASTs
//!
//! [`AstBuilder`] hands out fresh [`NodeId`]s and spans. Every statement
//! built moves the builder to the next line, so the statements of a file
//! built in order land on consecutive lines. The builder takes `&self`
//! everywhere so calls nest: `b.assign(b.var("x"), b.int(1))`.

use std::cell::Cell;

use sable_utils::span::{Span, Spannable, Spanned};

use crate::{
    decl::{
        ArrowFunction, ClassConstDecl, ClassDecl, ClassKind, Closure, ClosureUse, Docblock,
        FunctionDecl, MethodDecl, Param, PropertyDecl, Visibility,
    },
    expr::{
        Arg, Arithmetic, ArrayItem, Assignment, BinaryBitwise, Callee, CastKind, ClassRef,
        Comparison, Equality, Expr, ExprKind, IncDec, Logical,
    },
    stmt::{Catch, ElseIf, StaticVar, Stmt, StmtKind, SwitchCase},
    File, NodeId,
};

/// Builds AST nodes with fresh ids and spans
#[derive(Debug, Default)]
pub struct AstBuilder {
    /// The next [`NodeId`]
    next_id: Cell<u32>,
    /// The next byte offset handed out
    offset: Cell<usize>,
    /// The current line
    line: Cell<u32>,
}

impl AstBuilder {
    /// Create a builder starting at line 1
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            offset: Cell::new(0),
            line: Cell::new(1),
        }
    }

    /// A fresh span on the current line
    fn span(&self) -> Span {
        let start = self.offset.get();
        self.offset.set(start + 2);
        Span::from_positions_and_line(start, start + 1, self.line.get())
    }

    /// Wrap a kind into an expression with a fresh id and span
    pub fn expr(&self, kind: ExprKind) -> Expr {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Expr {
            id: NodeId(id),
            kind: kind.in_span(self.span()),
        }
    }

    /// Wrap a kind into a statement on the current line, then move to the
    /// next line
    pub fn stmt(&self, kind: StmtKind) -> Stmt {
        let stmt = Stmt(kind.in_span(self.span()));
        self.line.set(self.line.get() + 1);
        stmt
    }

    /// A spanned name
    fn name(&self, name: &str) -> Spanned<String> {
        name.to_string().in_span(self.span())
    }

    /// Turn plain argument expressions into call arguments
    fn args(args: Vec<Expr>) -> Vec<Arg> {
        args.into_iter()
            .map(|value| Arg {
                value,
                unpack: false,
            })
            .collect()
    }

    /// Build a [`File`]
    #[must_use]
    pub fn file(&self, path: &str, stmts: Vec<Stmt>) -> File {
        File {
            path: path.to_string(),
            stmts,
        }
    }

    // LITERALS AND NAMES

    /// `$name`
    pub fn var(&self, name: &str) -> Expr {
        self.expr(ExprKind::Variable(name.to_string()))
    }

    /// An integer literal
    pub fn int(&self, value: i64) -> Expr {
        self.expr(ExprKind::Int(value))
    }

    /// A float literal
    pub fn float(&self, value: f64) -> Expr {
        self.expr(ExprKind::Float(value))
    }

    /// A string literal
    pub fn string(&self, value: &str) -> Expr {
        self.expr(ExprKind::String(value.to_string()))
    }

    /// `true` or `false`
    pub fn bool(&self, value: bool) -> Expr {
        self.expr(ExprKind::Bool(value))
    }

    /// `null`
    pub fn null(&self) -> Expr {
        self.expr(ExprKind::Null)
    }

    /// `"..."` with interpolated parts
    pub fn interpolated(&self, parts: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Interpolated(parts))
    }

    /// An array literal of the given values, without keys
    pub fn list(&self, values: Vec<Expr>) -> Expr {
        self.array(values.into_iter().map(|value| (None, value)).collect())
    }

    /// An array literal of optional keys and values
    pub fn array(&self, items: Vec<(Option<Expr>, Expr)>) -> Expr {
        self.expr(ExprKind::Array(
            items
                .into_iter()
                .map(|(key, value)| ArrayItem {
                    key,
                    value,
                    by_ref: false,
                    unpack: false,
                })
                .collect(),
        ))
    }

    /// An array literal keyed by strings
    pub fn shape(&self, items: Vec<(&str, Expr)>) -> Expr {
        self.array(
            items
                .into_iter()
                .map(|(key, value)| (Some(self.string(key)), value))
                .collect(),
        )
    }

    /// A constant, e.g. `PHP_EOL`
    pub fn constant(&self, name: &str) -> Expr {
        self.expr(ExprKind::ConstFetch(name.to_string()))
    }

    /// `Class::NAME` or `Class::class`
    pub fn class_const(&self, class: ClassRef, name: &str) -> Expr {
        self.expr(ExprKind::ClassConstFetch(class, self.name(name)))
    }

    // ACCESS

    /// `$var[$dim]`
    pub fn dim(&self, var: Expr, dim: Expr) -> Expr {
        self.expr(ExprKind::ArrayDimFetch(Box::new(var), Some(Box::new(dim))))
    }

    /// `$var[]`
    pub fn push_dim(&self, var: Expr) -> Expr {
        self.expr(ExprKind::ArrayDimFetch(Box::new(var), None))
    }

    /// `$object->name`
    pub fn prop(&self, object: Expr, name: &str) -> Expr {
        self.expr(ExprKind::PropertyFetch {
            object: Box::new(object),
            name: self.name(name),
            nullsafe: false,
        })
    }

    /// `$object?->name`
    pub fn nullsafe_prop(&self, object: Expr, name: &str) -> Expr {
        self.expr(ExprKind::PropertyFetch {
            object: Box::new(object),
            name: self.name(name),
            nullsafe: true,
        })
    }

    /// `Class::$name`
    pub fn static_prop(&self, class: ClassRef, name: &str) -> Expr {
        self.expr(ExprKind::StaticPropertyFetch(class, self.name(name)))
    }

    // OPERATORS

    /// `$lhs = $rhs`
    pub fn assign(&self, lhs: Expr, rhs: Expr) -> Expr {
        self.assign_op(Assignment::Standard, lhs, rhs)
    }

    /// `$lhs op= $rhs`
    pub fn assign_op(&self, op: Assignment, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::Assignment(op, Box::new(lhs), Box::new(rhs)))
    }

    /// `$lhs = &$rhs`
    pub fn assign_ref(&self, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::AssignRef(Box::new(lhs), Box::new(rhs)))
    }

    /// An arithmetic operation
    pub fn arith(&self, op: Arithmetic, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::Arithmetic(op, Box::new(lhs), Box::new(rhs)))
    }

    /// `$lhs . $rhs`
    pub fn concat(&self, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::Concat(Box::new(lhs), Box::new(rhs)))
    }

    /// A bitwise operation
    pub fn bitwise(&self, op: BinaryBitwise, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::BinaryBitwise(op, Box::new(lhs), Box::new(rhs)))
    }

    /// `$lhs && $rhs`
    pub fn and(&self, lhs: Expr, rhs: Expr) -> Expr {
        self.logical(Logical::And, lhs, rhs)
    }

    /// `$lhs || $rhs`
    pub fn or(&self, lhs: Expr, rhs: Expr) -> Expr {
        self.logical(Logical::Or, lhs, rhs)
    }

    /// A logical operation
    pub fn logical(&self, op: Logical, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::Logical(op, Box::new(lhs), Box::new(rhs)))
    }

    /// An equality or identity check
    pub fn equality(&self, op: Equality, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::Equality(op, Box::new(lhs), Box::new(rhs)))
    }

    /// `$lhs === $rhs`
    pub fn identical(&self, lhs: Expr, rhs: Expr) -> Expr {
        self.equality(Equality::Identical, lhs, rhs)
    }

    /// `$lhs !== $rhs`
    pub fn not_identical(&self, lhs: Expr, rhs: Expr) -> Expr {
        self.equality(Equality::NotIdentical, lhs, rhs)
    }

    /// An ordering comparison
    pub fn compare(&self, op: Comparison, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::Comparison(op, Box::new(lhs), Box::new(rhs)))
    }

    /// `$lhs ?? $rhs`
    pub fn coalesce(&self, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::Coalesce(Box::new(lhs), Box::new(rhs)))
    }

    /// `!$expr`
    pub fn not(&self, expr: Expr) -> Expr {
        self.expr(ExprKind::UnaryNot(Box::new(expr)))
    }

    /// `-$expr`
    pub fn neg(&self, expr: Expr) -> Expr {
        self.expr(ExprKind::UnaryMinus(Box::new(expr)))
    }

    /// `+$expr`
    pub fn plus(&self, expr: Expr) -> Expr {
        self.expr(ExprKind::UnaryPlus(Box::new(expr)))
    }

    /// `~$expr`
    pub fn bitwise_not(&self, expr: Expr) -> Expr {
        self.expr(ExprKind::UnaryBitwiseNot(Box::new(expr)))
    }

    /// Increment or decrement
    pub fn inc_dec(&self, op: IncDec, expr: Expr) -> Expr {
        self.expr(ExprKind::IncDec(op, Box::new(expr)))
    }

    /// `$expr++`
    pub fn post_inc(&self, expr: Expr) -> Expr {
        self.inc_dec(IncDec::PostIncrement, expr)
    }

    /// `$expr instanceof Class`
    pub fn instance_of(&self, expr: Expr, class: ClassRef) -> Expr {
        self.expr(ExprKind::Instanceof(Box::new(expr), class))
    }

    /// `isset(...)`
    pub fn isset(&self, exprs: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Isset(exprs))
    }

    /// `empty(...)`
    pub fn empty(&self, expr: Expr) -> Expr {
        self.expr(ExprKind::Empty(Box::new(expr)))
    }

    /// `$cond ? $then : $else_`, or `$cond ?: $else_` without a middle
    pub fn ternary(&self, cond: Expr, then: Option<Expr>, else_: Expr) -> Expr {
        self.expr(ExprKind::Ternary(
            Box::new(cond),
            then.map(Box::new),
            Box::new(else_),
        ))
    }

    /// `(T) $expr`
    pub fn cast(&self, kind: CastKind, expr: Expr) -> Expr {
        self.expr(ExprKind::Cast(kind, Box::new(expr)))
    }

    // CALLS

    /// `name(args)`
    pub fn call(&self, name: &str, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::FuncCall(
            Callee::Named(self.name(name)),
            Self::args(args),
        ))
    }

    /// `$callee(args)`
    pub fn call_value(&self, callee: Expr, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::FuncCall(
            Callee::Expr(Box::new(callee)),
            Self::args(args),
        ))
    }

    /// `name(...$arg)`
    pub fn call_unpacked(&self, name: &str, arg: Expr) -> Expr {
        self.expr(ExprKind::FuncCall(
            Callee::Named(self.name(name)),
            vec![Arg {
                value: arg,
                unpack: true,
            }],
        ))
    }

    /// `$object->name(args)`
    pub fn method_call(&self, object: Expr, name: &str, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::MethodCall {
            object: Box::new(object),
            name: self.name(name),
            args: Self::args(args),
            nullsafe: false,
        })
    }

    /// `$object?->name(args)`
    pub fn nullsafe_method_call(&self, object: Expr, name: &str, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::MethodCall {
            object: Box::new(object),
            name: self.name(name),
            args: Self::args(args),
            nullsafe: true,
        })
    }

    /// `Class::name(args)`
    pub fn static_call(&self, class: ClassRef, name: &str, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::StaticCall(class, self.name(name), Self::args(args)))
    }

    /// `new Class(args)`
    pub fn new_(&self, class: ClassRef, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::New(class, Self::args(args)))
    }

    /// `new Name(args)`
    pub fn new_named(&self, class: &str, args: Vec<Expr>) -> Expr {
        self.new_(ClassRef::named(class), args)
    }

    /// `function (params) use (uses) { body }`. Names in `uses` starting with
    /// `&` are captured by reference.
    pub fn closure(&self, params: Vec<Param>, uses: &[&str], body: Vec<Stmt>) -> Expr {
        let uses = uses
            .iter()
            .map(|name| ClosureUse {
                name: self.name(name.trim_start_matches('&')),
                by_ref: name.starts_with('&'),
            })
            .collect();
        self.expr(ExprKind::Closure(Box::new(Closure {
            params,
            uses,
            return_type: None,
            body,
            is_static: false,
        })))
    }

    /// `fn (params) => body`
    pub fn arrow_fn(&self, params: Vec<Param>, body: Expr) -> Expr {
        self.expr(ExprKind::ArrowFunction(Box::new(ArrowFunction {
            params,
            return_type: None,
            body,
            is_static: false,
        })))
    }

    /// `yield key => value`
    pub fn yield_(&self, key: Option<Expr>, value: Option<Expr>) -> Expr {
        self.expr(ExprKind::Yield {
            key: key.map(Box::new),
            value: value.map(Box::new),
        })
    }

    /// `yield from $expr`
    pub fn yield_from(&self, expr: Expr) -> Expr {
        self.expr(ExprKind::YieldFrom(Box::new(expr)))
    }

    /// `clone $expr`
    pub fn clone_(&self, expr: Expr) -> Expr {
        self.expr(ExprKind::Clone(Box::new(expr)))
    }

    /// `print $expr`
    pub fn print(&self, expr: Expr) -> Expr {
        self.expr(ExprKind::Print(Box::new(expr)))
    }

    /// `exit($expr)`
    pub fn exit(&self, expr: Option<Expr>) -> Expr {
        self.expr(ExprKind::Exit(expr.map(Box::new)))
    }

    // STATEMENTS

    /// `$expr;`
    pub fn expr_stmt(&self, expr: Expr) -> Stmt {
        self.stmt(StmtKind::Expr(expr))
    }

    /// `$lhs = $rhs;`
    pub fn assign_stmt(&self, lhs: Expr, rhs: Expr) -> Stmt {
        self.expr_stmt(self.assign(lhs, rhs))
    }

    /// `echo ...;`
    pub fn echo(&self, exprs: Vec<Expr>) -> Stmt {
        self.stmt(StmtKind::Echo(exprs))
    }

    /// `return $expr;`
    pub fn ret(&self, expr: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Return(expr))
    }

    /// `throw $expr;`
    pub fn throw(&self, expr: Expr) -> Stmt {
        self.stmt(StmtKind::Throw(expr))
    }

    /// `if (cond) { then } else { else_ }`
    pub fn if_(&self, cond: Expr, then: Vec<Stmt>, else_: Option<Vec<Stmt>>) -> Stmt {
        self.if_elseif(cond, then, vec![], else_)
    }

    /// `if` with `elseif` arms
    pub fn if_elseif(
        &self,
        cond: Expr,
        then: Vec<Stmt>,
        elseifs: Vec<(Expr, Vec<Stmt>)>,
        else_: Option<Vec<Stmt>>,
    ) -> Stmt {
        self.stmt(StmtKind::If {
            cond,
            then,
            elseifs: elseifs
                .into_iter()
                .map(|(cond, body)| ElseIf { cond, body })
                .collect(),
            else_,
        })
    }

    /// `while (cond) { body }`
    pub fn while_(&self, cond: Expr, body: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::While(cond, body))
    }

    /// `do { body } while (cond);`
    pub fn do_while(&self, body: Vec<Stmt>, cond: Expr) -> Stmt {
        self.stmt(StmtKind::DoWhile(body, cond))
    }

    /// `for (init; cond; step) { body }`
    pub fn for_(
        &self,
        init: Vec<Expr>,
        cond: Vec<Expr>,
        step: Vec<Expr>,
        body: Vec<Stmt>,
    ) -> Stmt {
        self.stmt(StmtKind::For {
            init,
            cond,
            step,
            body,
        })
    }

    /// `foreach (iterable as key => value) { body }`
    pub fn foreach(
        &self,
        iterable: Expr,
        key: Option<Expr>,
        value: Expr,
        body: Vec<Stmt>,
    ) -> Stmt {
        self.stmt(StmtKind::Foreach {
            iterable,
            key,
            value,
            by_ref: false,
            body,
        })
    }

    /// `switch (subject) { cases }`; a [`None`] test is `default`
    pub fn switch(&self, subject: Expr, cases: Vec<(Option<Expr>, Vec<Stmt>)>) -> Stmt {
        self.stmt(StmtKind::Switch(
            subject,
            cases
                .into_iter()
                .map(|(test, body)| SwitchCase { test, body })
                .collect(),
        ))
    }

    /// `break;`
    pub fn break_(&self) -> Stmt {
        self.stmt(StmtKind::Break(1))
    }

    /// `continue;`
    pub fn continue_(&self) -> Stmt {
        self.stmt(StmtKind::Continue(1))
    }

    /// `try { body } catches finally { finally }`
    pub fn try_catch(
        &self,
        body: Vec<Stmt>,
        catches: Vec<Catch>,
        finally: Option<Vec<Stmt>>,
    ) -> Stmt {
        self.stmt(StmtKind::TryCatch {
            body,
            catches,
            finally,
        })
    }

    /// `catch (Types $var) { body }`
    pub fn catch(&self, types: &[&str], var: Option<&str>, body: Vec<Stmt>) -> Catch {
        Catch {
            types: types.iter().map(|name| self.name(name)).collect(),
            var: var.map(|name| self.name(name)),
            body,
        }
    }

    /// `{ stmts }`
    pub fn block(&self, stmts: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::Block(stmts))
    }

    /// `unset(...);`
    pub fn unset(&self, exprs: Vec<Expr>) -> Stmt {
        self.stmt(StmtKind::Unset(exprs))
    }

    /// `global $a, $b;`
    pub fn global(&self, names: &[&str]) -> Stmt {
        self.stmt(StmtKind::Global(
            names.iter().map(|name| self.name(name)).collect(),
        ))
    }

    /// `static $name = default;`
    pub fn static_var(&self, name: &str, default: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Static(vec![StaticVar {
            name: self.name(name),
            default,
        }]))
    }

    /// `const NAME = value;`
    pub fn const_(&self, name: &str, value: Expr) -> Stmt {
        self.stmt(StmtKind::Const(vec![(self.name(name), value)]))
    }

    /// A function declaration statement
    pub fn function_stmt(&self, function: FunctionDecl) -> Stmt {
        self.stmt(StmtKind::Function(function))
    }

    /// A class declaration statement
    pub fn class_stmt(&self, class: ClassDecl) -> Stmt {
        self.stmt(StmtKind::Class(class))
    }

    // DECLARATIONS

    /// A function declaration without parameters, return type or body
    pub fn function(&self, name: &str) -> FunctionDecl {
        FunctionDecl {
            name: self.name(name),
            params: vec![],
            return_type: None,
            docblock: Docblock::default(),
            body: None,
        }
    }

    /// An untyped parameter
    pub fn param(&self, name: &str) -> Param {
        Param {
            name: self.name(name),
            type_hint: None,
            default: None,
            by_ref: false,
            variadic: false,
        }
    }

    /// An empty class declaration
    pub fn class(&self, name: &str) -> ClassDecl {
        ClassDecl {
            name: self.name(name),
            kind: ClassKind::Class,
            parent: None,
            interfaces: vec![],
            is_abstract: false,
            is_final: false,
            docblock: Docblock::default(),
            members: vec![],
        }
    }

    /// A public, untyped property
    pub fn property(&self, name: &str) -> PropertyDecl {
        PropertyDecl {
            name: self.name(name),
            visibility: Visibility::Public,
            is_static: false,
            type_hint: None,
            default: None,
            docblock: Docblock::default(),
        }
    }

    /// A public class constant
    pub fn class_constant(&self, name: &str, value: Expr) -> ClassConstDecl {
        ClassConstDecl {
            name: self.name(name),
            visibility: Visibility::Public,
            value,
        }
    }

    /// A public instance method
    #[must_use]
    pub fn method(&self, function: FunctionDecl) -> MethodDecl {
        MethodDecl {
            function,
            visibility: Visibility::Public,
            is_static: false,
            is_abstract: false,
            is_final: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_fresh_and_nested_calls_work() {
        let b = AstBuilder::new();
        let assign = b.assign(b.var("x"), b.int(1));
        let ExprKind::Assignment(_, lhs, rhs) = assign.kind() else {
            panic!("expected an assignment");
        };
        assert_ne!(lhs.id, rhs.id);
        assert_ne!(assign.id, lhs.id);
        assert_eq!(assign.to_string(), "$x = 1");
    }

    #[test]
    fn statements_advance_lines() {
        let b = AstBuilder::new();
        let first = b.expr_stmt(b.var("a"));
        let second = b.expr_stmt(b.var("b"));
        assert_eq!(first.span().line(), 1);
        assert_eq!(second.span().line(), 2);
    }

    #[test]
    fn closure_uses_mark_references() {
        let b = AstBuilder::new();
        let closure = b.closure(vec![], &["a", "&b"], vec![]);
        let ExprKind::Closure(closure) = closure.kind() else {
            panic!("expected a closure");
        };
        assert!(!closure.uses[0].by_ref);
        assert!(closure.uses[1].by_ref);
        assert_eq!(closure.uses[1].name.value(), "b");
    }

    #[test]
    fn displays_php_like_source() {
        let b = AstBuilder::new();
        let fetch = b.dim(b.prop(b.var("this"), "items"), b.string("k"));
        assert_eq!(fetch.to_string(), "$this->items['k']");
    }
}

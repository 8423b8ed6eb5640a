//! Statement representation for the Sable AST
//!
//! The main thing within this module you will need is the [`Stmt`] struct and
//! its [`StmtKind`].

use sable_utils::span::{Span, Spanned};

use crate::{
    decl::{ClassDecl, FunctionDecl},
    expr::Expr,
};

/// A Sable statement
#[derive(PartialEq, Debug, Clone)]
pub struct Stmt(pub Spanned<StmtKind>);
impl Stmt {
    /// The span of this statement
    #[must_use]
    pub const fn span(&self) -> Span {
        self.0.span()
    }

    /// The kind of this statement
    #[must_use]
    pub const fn kind(&self) -> &StmtKind {
        self.0.value()
    }
}

/// An `elseif` arm
#[derive(PartialEq, Debug, Clone)]
pub struct ElseIf {
    /// The condition
    pub cond: Expr,
    /// The body
    pub body: Vec<Stmt>,
}

/// A `case` or `default` arm of a `switch`
#[derive(PartialEq, Debug, Clone)]
pub struct SwitchCase {
    /// The case value; [`None`] for `default`
    pub test: Option<Expr>,
    /// The statements under the arm
    pub body: Vec<Stmt>,
}

/// A `catch` clause
#[derive(PartialEq, Debug, Clone)]
pub struct Catch {
    /// The caught class names
    pub types: Vec<Spanned<String>>,
    /// The variable the exception is bound to, without `$`
    pub var: Option<Spanned<String>>,
    /// The body
    pub body: Vec<Stmt>,
}

/// A `static $x = ...;` entry
#[derive(PartialEq, Debug, Clone)]
pub struct StaticVar {
    /// The name, without `$`
    pub name: Spanned<String>,
    /// The initializer
    pub default: Option<Expr>,
}

/// The enum representing all the different kinds of statements
#[derive(PartialEq, Debug, Clone)]
pub enum StmtKind {
    /// `x;`
    Expr(Expr),
    /// `echo a, b;`
    Echo(Vec<Expr>),
    /// `return;` or `return x;`
    Return(Option<Expr>),
    /// `throw x;`
    Throw(Expr),
    /// `if (c) { } elseif (d) { } else { }`
    If {
        /// The condition
        cond: Expr,
        /// The body run when the condition holds
        then: Vec<Stmt>,
        /// `elseif` arms, in order
        elseifs: Vec<ElseIf>,
        /// The `else` body
        else_: Option<Vec<Stmt>>,
    },
    /// `while (c) { }`
    While(Expr, Vec<Stmt>),
    /// `do { } while (c);`
    DoWhile(Vec<Stmt>, Expr),
    /// `for (init; cond; step) { }`
    For {
        /// Runs once before the loop
        init: Vec<Expr>,
        /// Checked before each iteration; the last one decides. Empty loops
        /// forever.
        cond: Vec<Expr>,
        /// Runs after each iteration
        step: Vec<Expr>,
        /// The body
        body: Vec<Stmt>,
    },
    /// `foreach (x as k => v) { }`
    Foreach {
        /// The iterated value
        iterable: Expr,
        /// The key target
        key: Option<Expr>,
        /// The value target
        value: Expr,
        /// `as &$v`
        by_ref: bool,
        /// The body
        body: Vec<Stmt>,
    },
    /// `switch (x) { ... }`
    Switch(Expr, Vec<SwitchCase>),
    /// `break n;`
    Break(usize),
    /// `continue n;`
    Continue(usize),
    /// `try { } catch (...) { } finally { }`
    TryCatch {
        /// The try body
        body: Vec<Stmt>,
        /// The catch clauses
        catches: Vec<Catch>,
        /// The finally body
        finally: Option<Vec<Stmt>>,
    },
    /// `{ ... }`
    Block(Vec<Stmt>),
    /// `unset(a, b);`
    Unset(Vec<Expr>),
    /// `global $a, $b;`
    Global(Vec<Spanned<String>>),
    /// `static $a = 1;`
    Static(Vec<StaticVar>),
    /// `const A = 1;`
    Const(Vec<(Spanned<String>, Expr)>),
    /// A function declaration
    Function(FunctionDecl),
    /// A class or interface declaration
    Class(ClassDecl),
    /// `;`
    Nop,
}

//! Expression representation for the Sable AST
//!
//! The main thing within this module you will need is the [`Expr`] struct.

use std::fmt::Display;

use sable_utils::span::{Span, Spanned};

use crate::{
    decl::{ArrowFunction, Closure},
    NodeId,
};

/// Arithmetic operators
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Arithmetic {
    /// `+`
    Addition,
    /// `-`
    Subtraction,
    /// `*`
    Multiplication,
    /// `/`
    Division,
    /// `%`
    Modulo,
    /// `**`
    Power,
}
impl Display for Arithmetic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Addition => write!(f, "+"),
            Self::Subtraction => write!(f, "-"),
            Self::Multiplication => write!(f, "*"),
            Self::Division => write!(f, "/"),
            Self::Modulo => write!(f, "%"),
            Self::Power => write!(f, "**"),
        }
    }
}

/// Binary bitwise operators
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum BinaryBitwise {
    /// `&`
    And,
    /// `|`
    Or,
    /// `^`
    Xor,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
}
impl Display for BinaryBitwise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::And => write!(f, "&"),
            Self::Or => write!(f, "|"),
            Self::Xor => write!(f, "^"),
            Self::Shl => write!(f, "<<"),
            Self::Shr => write!(f, ">>"),
        }
    }
}

/// Logical operators
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Logical {
    /// `&&` or `and`
    And,
    /// `||` or `or`
    Or,
    /// `xor`
    Xor,
}
impl Display for Logical {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::And => write!(f, "&&"),
            Self::Or => write!(f, "||"),
            Self::Xor => write!(f, "xor"),
        }
    }
}

/// Equality and identity checks
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Equality {
    /// `==`
    Eq,
    /// `!=`
    Neq,
    /// `===`
    Identical,
    /// `!==`
    NotIdentical,
}
impl Display for Equality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eq => write!(f, "=="),
            Self::Neq => write!(f, "!="),
            Self::Identical => write!(f, "==="),
            Self::NotIdentical => write!(f, "!=="),
        }
    }
}

/// Ordering comparisons
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Comparison {
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `<=>`
    Spaceship,
}
impl Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gt => write!(f, ">"),
            Self::Gte => write!(f, ">="),
            Self::Lt => write!(f, "<"),
            Self::Lte => write!(f, "<="),
            Self::Spaceship => write!(f, "<=>"),
        }
    }
}

/// Assignment operators
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Assignment {
    /// `=`
    Standard,
    /// Any form of assignment via [`Arithmetic`] operator (e.g. `+=`)
    Arithmetic(Arithmetic),
    /// Any form of assignment via [`BinaryBitwise`] operator (e.g. `&=`)
    BinaryBitwise(BinaryBitwise),
    /// `.=`
    Concat,
    /// `??=`
    Coalesce,
}
impl Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "="),
            Self::Arithmetic(op) => write!(f, "{op}="),
            Self::BinaryBitwise(op) => write!(f, "{op}="),
            Self::Concat => write!(f, ".="),
            Self::Coalesce => write!(f, "??="),
        }
    }
}

/// Increment and decrement operators
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum IncDec {
    /// `++$x`
    PreIncrement,
    /// `--$x`
    PreDecrement,
    /// `$x++`
    PostIncrement,
    /// `$x--`
    PostDecrement,
}
impl IncDec {
    /// Whether this operator adds one
    #[must_use]
    pub const fn is_increment(self) -> bool {
        matches!(self, Self::PreIncrement | Self::PostIncrement)
    }

    /// Whether the expression evaluates to the value after the update
    #[must_use]
    pub const fn is_prefix(self) -> bool {
        matches!(self, Self::PreIncrement | Self::PreDecrement)
    }
}

/// The target type of a cast
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum CastKind {
    /// `(int)`
    Int,
    /// `(float)`
    Float,
    /// `(string)`
    String,
    /// `(bool)`
    Bool,
    /// `(array)`
    Array,
    /// `(object)`
    Object,
    /// `(unset)`
    Unset,
}
impl Display for CastKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::Bool => write!(f, "bool"),
            Self::Array => write!(f, "array"),
            Self::Object => write!(f, "object"),
            Self::Unset => write!(f, "unset"),
        }
    }
}

/// The class side of `X::...`, `new X` and `instanceof X`
#[derive(PartialEq, Debug, Clone)]
pub enum ClassRef {
    /// A class written by name
    Named(String),
    /// `self`
    SelfRef,
    /// `static`
    Static,
    /// `parent`
    Parent,
    /// A class given by an expression, e.g. `$obj::class` or `new $name`
    Expr(Box<Expr>),
}
impl ClassRef {
    /// Shorthand for [`ClassRef::Named`]
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}
impl Display for ClassRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::SelfRef => write!(f, "self"),
            Self::Static => write!(f, "static"),
            Self::Parent => write!(f, "parent"),
            Self::Expr(expr) => write!(f, "{expr}"),
        }
    }
}

/// What is being called in a function call
#[derive(PartialEq, Debug, Clone)]
pub enum Callee {
    /// A function called by name
    Named(Spanned<String>),
    /// A callable value, e.g. `$fn()`
    Expr(Box<Expr>),
}

/// One argument of a call
#[derive(PartialEq, Debug, Clone)]
pub struct Arg {
    /// The argument value
    pub value: Expr,
    /// `...$args`
    pub unpack: bool,
}

/// One entry of an array literal or a destructuring target
#[derive(PartialEq, Debug, Clone)]
pub struct ArrayItem {
    /// The explicit key, if written
    pub key: Option<Expr>,
    /// The value
    pub value: Expr,
    /// `&$value`
    pub by_ref: bool,
    /// `...$other`
    pub unpack: bool,
}

/// A Sable expression
#[derive(PartialEq, Debug, Clone)]
pub struct Expr {
    /// The identifier the analyzer keys this node's inferred type by
    pub id: NodeId,
    /// What this expression is, and where
    pub kind: Spanned<ExprKind>,
}
impl Expr {
    /// The span of this expression
    #[must_use]
    pub const fn span(&self) -> Span {
        self.kind.span()
    }

    /// The kind of this expression
    #[must_use]
    pub const fn kind(&self) -> &ExprKind {
        self.kind.value()
    }
}
impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.value().fmt(f)
    }
}

/// The enum representing the different kinds of expressions
#[derive(PartialEq, Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub enum ExprKind {
    /// `$name`, stored without the `$`
    Variable(String),
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal with escapes already processed
    String(String),
    /// `true` or `false`
    Bool(bool),
    /// `null`
    Null,
    /// A string with interpolated parts, e.g. `"a $b c"`
    Interpolated(Vec<Expr>),
    /// `[a, 'k' => b]`, also used as a destructuring target
    Array(Vec<ArrayItem>),

    /// `$a[$k]`, or `$a[]` in assignment position
    ArrayDimFetch(Box<Expr>, Option<Box<Expr>>),
    /// `$o->p` or `$o?->p`
    PropertyFetch {
        /// The object
        object: Box<Expr>,
        /// The property name
        name: Spanned<String>,
        /// Whether `?->` was used
        nullsafe: bool,
    },
    /// `Foo::$p`
    StaticPropertyFetch(ClassRef, Spanned<String>),
    /// `FOO`
    ConstFetch(String),
    /// `Foo::BAR` and `Foo::class`
    ClassConstFetch(ClassRef, Spanned<String>),

    /// Assignment operations
    Assignment(Assignment, Box<Expr>, Box<Expr>),
    /// `$a = &$b`
    AssignRef(Box<Expr>, Box<Expr>),
    /// Arithmetic operations
    Arithmetic(Arithmetic, Box<Expr>, Box<Expr>),
    /// `a . b`
    Concat(Box<Expr>, Box<Expr>),
    /// Bitwise operations
    BinaryBitwise(BinaryBitwise, Box<Expr>, Box<Expr>),
    /// Logical operations
    Logical(Logical, Box<Expr>, Box<Expr>),
    /// Equality checks
    Equality(Equality, Box<Expr>, Box<Expr>),
    /// Comparisons
    Comparison(Comparison, Box<Expr>, Box<Expr>),
    /// `a ?? b`
    Coalesce(Box<Expr>, Box<Expr>),

    /// `!x`
    UnaryNot(Box<Expr>),
    /// `~x`
    UnaryBitwiseNot(Box<Expr>),
    /// `-x`
    UnaryMinus(Box<Expr>),
    /// `+x`
    UnaryPlus(Box<Expr>),
    /// `++x`, `x--`, ...
    IncDec(IncDec, Box<Expr>),

    /// `x instanceof Foo`
    Instanceof(Box<Expr>, ClassRef),
    /// `isset(a, b)`
    Isset(Vec<Expr>),
    /// `empty(a)`
    Empty(Box<Expr>),
    /// `a ? b : c`, or `a ?: c` when the middle is absent
    Ternary(Box<Expr>, Option<Box<Expr>>, Box<Expr>),
    /// `(T) x`
    Cast(CastKind, Box<Expr>),

    /// `f(a)`
    FuncCall(Callee, Vec<Arg>),
    /// `$o->m(a)` or `$o?->m(a)`
    MethodCall {
        /// The object
        object: Box<Expr>,
        /// The method name
        name: Spanned<String>,
        /// The arguments
        args: Vec<Arg>,
        /// Whether `?->` was used
        nullsafe: bool,
    },
    /// `Foo::m(a)`
    StaticCall(ClassRef, Spanned<String>, Vec<Arg>),
    /// `new Foo(a)`
    New(ClassRef, Vec<Arg>),
    /// `function (...) use (...) { ... }`
    Closure(Box<Closure>),
    /// `fn (...) => ...`
    ArrowFunction(Box<ArrowFunction>),

    /// `yield`, `yield v` or `yield k => v`
    Yield {
        /// The key, if given
        key: Option<Box<Expr>>,
        /// The value, if given
        value: Option<Box<Expr>>,
    },
    /// `yield from x`
    YieldFrom(Box<Expr>),
    /// `clone x`
    Clone(Box<Expr>),
    /// `print x`
    Print(Box<Expr>),
    /// `exit` or `exit(x)`
    Exit(Option<Box<Expr>>),
    /// `@x`
    ErrorSuppress(Box<Expr>),
}

/// Comma-joins displayed items
fn join<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Display for Arg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.unpack {
            write!(f, "...")?;
        }
        write!(f, "{}", self.value)
    }
}

impl Display for ArrayItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.unpack {
            write!(f, "...")?;
        }
        if let Some(key) = &self.key {
            write!(f, "{key} => ")?;
        }
        if self.by_ref {
            write!(f, "&")?;
        }
        write!(f, "{}", self.value)
    }
}

impl Display for ExprKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Variable(name) => write!(f, "${name}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n:?}"),
            Self::String(s) => write!(f, "'{s}'"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => write!(f, "null"),
            Self::Interpolated(parts) => write!(
                f,
                "\"{}\"",
                parts
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("")
            ),
            Self::Array(items) => write!(f, "[{}]", join(items)),
            Self::ArrayDimFetch(var, Some(dim)) => write!(f, "{var}[{dim}]"),
            Self::ArrayDimFetch(var, None) => write!(f, "{var}[]"),
            Self::PropertyFetch {
                object,
                name,
                nullsafe,
            } => write!(
                f,
                "{object}{}{}",
                if *nullsafe { "?->" } else { "->" },
                name.value()
            ),
            Self::StaticPropertyFetch(class, name) => write!(f, "{class}::${}", name.value()),
            Self::ConstFetch(name) => write!(f, "{name}"),
            Self::ClassConstFetch(class, name) => write!(f, "{class}::{}", name.value()),
            Self::Assignment(op, l, r) => write!(f, "{l} {op} {r}"),
            Self::AssignRef(l, r) => write!(f, "{l} = &{r}"),
            Self::Arithmetic(op, l, r) => write!(f, "{l} {op} {r}"),
            Self::Concat(l, r) => write!(f, "{l} . {r}"),
            Self::BinaryBitwise(op, l, r) => write!(f, "{l} {op} {r}"),
            Self::Logical(op, l, r) => write!(f, "{l} {op} {r}"),
            Self::Equality(op, l, r) => write!(f, "{l} {op} {r}"),
            Self::Comparison(op, l, r) => write!(f, "{l} {op} {r}"),
            Self::Coalesce(l, r) => write!(f, "{l} ?? {r}"),
            Self::UnaryNot(e) => write!(f, "!{e}"),
            Self::UnaryBitwiseNot(e) => write!(f, "~{e}"),
            Self::UnaryMinus(e) => write!(f, "-{e}"),
            Self::UnaryPlus(e) => write!(f, "+{e}"),
            Self::IncDec(IncDec::PreIncrement, e) => write!(f, "++{e}"),
            Self::IncDec(IncDec::PreDecrement, e) => write!(f, "--{e}"),
            Self::IncDec(IncDec::PostIncrement, e) => write!(f, "{e}++"),
            Self::IncDec(IncDec::PostDecrement, e) => write!(f, "{e}--"),
            Self::Instanceof(e, class) => write!(f, "{e} instanceof {class}"),
            Self::Isset(exprs) => write!(f, "isset({})", join(exprs)),
            Self::Empty(e) => write!(f, "empty({e})"),
            Self::Ternary(c, Some(t), e) => write!(f, "{c} ? {t} : {e}"),
            Self::Ternary(c, None, e) => write!(f, "{c} ?: {e}"),
            Self::Cast(kind, e) => write!(f, "({kind}) {e}"),
            Self::FuncCall(Callee::Named(name), args) => {
                write!(f, "{}({})", name.value(), join(args))
            }
            Self::FuncCall(Callee::Expr(callee), args) => write!(f, "{callee}({})", join(args)),
            Self::MethodCall {
                object,
                name,
                args,
                nullsafe,
            } => write!(
                f,
                "{object}{}{}({})",
                if *nullsafe { "?->" } else { "->" },
                name.value(),
                join(args)
            ),
            Self::StaticCall(class, name, args) => {
                write!(f, "{class}::{}({})", name.value(), join(args))
            }
            Self::New(class, args) => write!(f, "new {class}({})", join(args)),
            Self::Closure(_) => write!(f, "function () {{ ... }}"),
            Self::ArrowFunction(arrow) => write!(f, "fn () => {}", arrow.body),
            Self::Yield { key, value } => match (key, value) {
                (Some(key), Some(value)) => write!(f, "yield {key} => {value}"),
                (None, Some(value)) => write!(f, "yield {value}"),
                _ => write!(f, "yield"),
            },
            Self::YieldFrom(e) => write!(f, "yield from {e}"),
            Self::Clone(e) => write!(f, "clone {e}"),
            Self::Print(e) => write!(f, "print {e}"),
            Self::Exit(Some(e)) => write!(f, "exit({e})"),
            Self::Exit(None) => write!(f, "exit"),
            Self::ErrorSuppress(e) => write!(f, "@{e}"),
        }
    }
}

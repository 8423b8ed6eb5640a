//! Declarations: functions, classes and their members, closures

use sable_utils::span::Spanned;

use crate::{expr::Expr, stmt::Stmt};

/// One `@tag value` line of a docblock
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct DocTag {
    /// The tag name without `@`, e.g. `param` or `psalm-assert`
    pub name: String,
    /// Everything after the tag name, trimmed
    pub value: String,
}

/// The tags of a docblock comment, in source order
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct Docblock {
    /// The tags
    pub tags: Vec<Spanned<DocTag>>,
}
impl Docblock {
    /// Every tag with one of the given names, in source order
    pub fn tags_named<'a>(
        &'a self,
        names: &'a [&'a str],
    ) -> impl Iterator<Item = &'a Spanned<DocTag>> + 'a {
        self.tags
            .iter()
            .filter(move |tag| names.contains(&tag.value().name.as_str()))
    }

    /// Whether the docblock has no tags
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Member visibility
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub enum Visibility {
    /// `public`
    #[default]
    Public,
    /// `protected`
    Protected,
    /// `private`
    Private,
}

/// A function or method parameter
#[derive(PartialEq, Debug, Clone)]
pub struct Param {
    /// The name, without `$`
    pub name: Spanned<String>,
    /// The signature type, as written
    pub type_hint: Option<Spanned<String>>,
    /// The default value
    pub default: Option<Expr>,
    /// `&$x`
    pub by_ref: bool,
    /// `...$x`
    pub variadic: bool,
}
impl Param {
    /// Give this parameter a signature type
    #[must_use]
    pub fn typed(mut self, type_hint: &str) -> Self {
        self.type_hint = Some(self.name.span().containing(type_hint.to_string()));
        self
    }

    /// Give this parameter a default value
    #[must_use]
    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }

    /// Make this a by-reference parameter
    #[must_use]
    pub const fn by_ref(mut self) -> Self {
        self.by_ref = true;
        self
    }

    /// Make this a variadic parameter
    #[must_use]
    pub const fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

/// A named function, or the function part of a method
#[derive(PartialEq, Debug, Clone)]
pub struct FunctionDecl {
    /// The name as written
    pub name: Spanned<String>,
    /// The parameters
    pub params: Vec<Param>,
    /// The signature return type, as written
    pub return_type: Option<Spanned<String>>,
    /// The docblock
    pub docblock: Docblock,
    /// The body; absent for abstract and interface methods
    pub body: Option<Vec<Stmt>>,
}
impl FunctionDecl {
    /// Add a parameter
    #[must_use]
    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Set the signature return type
    #[must_use]
    pub fn returning(mut self, return_type: &str) -> Self {
        self.return_type = Some(self.name.span().containing(return_type.to_string()));
        self
    }

    /// Add a docblock tag
    #[must_use]
    pub fn with_doc(mut self, name: &str, value: &str) -> Self {
        self.docblock.tags.push(self.name.span().containing(DocTag {
            name: name.to_string(),
            value: value.to_string(),
        }));
        self
    }

    /// Set the body
    #[must_use]
    pub fn with_body(mut self, body: Vec<Stmt>) -> Self {
        self.body = Some(body);
        self
    }
}

/// Whether a class-like declaration is a class or an interface
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub enum ClassKind {
    /// `class`
    #[default]
    Class,
    /// `interface`
    Interface,
}

/// A property declaration
#[derive(PartialEq, Debug, Clone)]
pub struct PropertyDecl {
    /// The name, without `$`
    pub name: Spanned<String>,
    /// The visibility
    pub visibility: Visibility,
    /// `static`
    pub is_static: bool,
    /// The signature type, as written
    pub type_hint: Option<Spanned<String>>,
    /// The default value
    pub default: Option<Expr>,
    /// The docblock
    pub docblock: Docblock,
}
impl PropertyDecl {
    /// Give this property a signature type
    #[must_use]
    pub fn typed(mut self, type_hint: &str) -> Self {
        self.type_hint = Some(self.name.span().containing(type_hint.to_string()));
        self
    }

    /// Set the visibility
    #[must_use]
    pub const fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Make this a static property
    #[must_use]
    pub const fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Give this property a default value
    #[must_use]
    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }

    /// Add a docblock tag
    #[must_use]
    pub fn with_doc(mut self, name: &str, value: &str) -> Self {
        self.docblock.tags.push(self.name.span().containing(DocTag {
            name: name.to_string(),
            value: value.to_string(),
        }));
        self
    }
}

/// A class constant declaration
#[derive(PartialEq, Debug, Clone)]
pub struct ClassConstDecl {
    /// The name
    pub name: Spanned<String>,
    /// The visibility
    pub visibility: Visibility,
    /// The value
    pub value: Expr,
}

/// A method declaration
#[derive(PartialEq, Debug, Clone)]
pub struct MethodDecl {
    /// The function part
    pub function: FunctionDecl,
    /// The visibility
    pub visibility: Visibility,
    /// `static`
    pub is_static: bool,
    /// `abstract`
    pub is_abstract: bool,
    /// `final`
    pub is_final: bool,
}
impl MethodDecl {
    /// Set the visibility
    #[must_use]
    pub const fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Make this a static method
    #[must_use]
    pub const fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Make this an abstract method
    #[must_use]
    pub const fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }
}

/// A member of a class-like declaration
#[derive(PartialEq, Debug, Clone)]
pub enum ClassMember {
    /// A property
    Property(PropertyDecl),
    /// A class constant
    Constant(ClassConstDecl),
    /// A method
    Method(MethodDecl),
}

/// A class or interface declaration
#[derive(PartialEq, Debug, Clone)]
pub struct ClassDecl {
    /// The name as written
    pub name: Spanned<String>,
    /// Class or interface
    pub kind: ClassKind,
    /// The parent class (or, for interfaces, nothing; see `interfaces`)
    pub parent: Option<String>,
    /// Implemented interfaces, or extended interfaces for an interface
    pub interfaces: Vec<String>,
    /// `abstract`
    pub is_abstract: bool,
    /// `final`
    pub is_final: bool,
    /// The docblock
    pub docblock: Docblock,
    /// The members, in source order
    pub members: Vec<ClassMember>,
}
impl ClassDecl {
    /// Set the parent class
    #[must_use]
    pub fn extends(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    /// Add an implemented (or, for interfaces, extended) interface
    #[must_use]
    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    /// Make this an interface
    #[must_use]
    pub const fn interface(mut self) -> Self {
        self.kind = ClassKind::Interface;
        self
    }

    /// Make this an abstract class
    #[must_use]
    pub const fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Add a docblock tag
    #[must_use]
    pub fn with_doc(mut self, name: &str, value: &str) -> Self {
        self.docblock.tags.push(self.name.span().containing(DocTag {
            name: name.to_string(),
            value: value.to_string(),
        }));
        self
    }

    /// Add a member
    #[must_use]
    pub fn with_member(mut self, member: ClassMember) -> Self {
        self.members.push(member);
        self
    }

    /// Add a property
    #[must_use]
    pub fn with_property(self, property: PropertyDecl) -> Self {
        self.with_member(ClassMember::Property(property))
    }

    /// Add a method
    #[must_use]
    pub fn with_method(self, method: MethodDecl) -> Self {
        self.with_member(ClassMember::Method(method))
    }

    /// Add a class constant
    #[must_use]
    pub fn with_constant(self, constant: ClassConstDecl) -> Self {
        self.with_member(ClassMember::Constant(constant))
    }
}

/// A `use ($x, &$y)` entry of a closure
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ClosureUse {
    /// The captured name, without `$`
    pub name: Spanned<String>,
    /// `&$y`
    pub by_ref: bool,
}

/// `function (...) use (...) { ... }`
#[derive(PartialEq, Debug, Clone)]
pub struct Closure {
    /// The parameters
    pub params: Vec<Param>,
    /// The captured variables
    pub uses: Vec<ClosureUse>,
    /// The signature return type, as written
    pub return_type: Option<Spanned<String>>,
    /// The body
    pub body: Vec<Stmt>,
    /// `static function`
    pub is_static: bool,
}

/// `fn (...) => expr`
#[derive(PartialEq, Debug, Clone)]
pub struct ArrowFunction {
    /// The parameters
    pub params: Vec<Param>,
    /// The signature return type, as written
    pub return_type: Option<Spanned<String>>,
    /// The returned expression
    pub body: Expr,
    /// `static fn`
    pub is_static: bool,
}

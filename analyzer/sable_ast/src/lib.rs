//! The source AST checked by the Sable analyzer
//!
//! Sable does not parse source text. A front-end hands it a [`File`]: an
//! ordered list of [`Stmt`]s whose expressions each carry a [`NodeId`] and a
//! span. The tree is immutable once built; the analyzer records what it
//! learns about each expression in a side table keyed by [`NodeId`].
//!
//! [`AstBuilder`] builds trees by hand, assigning fresh ids and spans. Tests
//! and embedders without their own front-end use it.

#![warn(
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    clippy::missing_docs_in_private_items,
    missing_docs
)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

pub mod builder;
pub mod decl;
pub mod expr;
pub mod stmt;

pub use builder::AstBuilder;

/// A stable identifier for an expression node, unique within one [`File`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// One analyzed source file
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    /// The path reported in diagnostics
    pub path: String,
    /// The top-level statements, in source order
    pub stmts: Vec<stmt::Stmt>,
}

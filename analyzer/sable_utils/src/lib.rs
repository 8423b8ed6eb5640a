//! Shared utilities for the Sable analyzer
//!
//! This crate holds the small pieces every other part of the analyzer leans
//! on: source spans, line lookup for rendering, and helpers for the naming
//! and key-normalization rules of the analyzed language.

#![warn(
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    missing_docs,
    rustdoc::all
)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

pub mod line_finder;
pub mod names;
pub mod span;

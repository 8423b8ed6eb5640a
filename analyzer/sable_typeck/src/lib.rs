//! Flow-sensitive type checker for PHP
//!
//! Sable infers the type of every variable at every point of a file and
//! reports where the inferred types contradict the declared ones. Checking a
//! file takes three steps:
//!
//! 1. build a [`Codebase`](codebase::Codebase) holding the builtin
//!    declarations, and [scan](codebase::scan_file) every file into it;
//! 2. call [`analyze_file`](typeck::analyze_file) on each file with an
//!    [`IssueSink`](sable_diagnostics::IssueSink);
//! 3. read the diagnostics from the sink, and the inferred types from the
//!    returned [`FileAnalysis`](typeck::FileAnalysis).

#![warn(
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    clippy::missing_docs_in_private_items,
    missing_docs
)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

pub mod codebase;
pub mod config;
pub mod typeck;
pub mod types;

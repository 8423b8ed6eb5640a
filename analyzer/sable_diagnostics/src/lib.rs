//! Diagnostics for the Sable analyzer
//!
//! Every problem the analyzer finds in the checked source is an
//! [`IssueKind`] attached to a span. Issues are handed to an [`IssueSink`],
//! which decides how severe each one is and whether it should stop the
//! current check. [`IssueBuffer`] is the sink most callers want.

#![warn(
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    clippy::missing_docs_in_private_items,
    missing_docs
)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

mod diagnostic;
mod fmt;
mod issue_kind;
mod sink;

pub use diagnostic::{Diagnostic, Severity};
pub use issue_kind::{IssueCategory, IssueKind};
pub use sink::{IssueBuffer, IssueSink, ReportLevel};

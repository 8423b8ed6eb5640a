//! Receivers for issues raised during analysis

use std::collections::HashMap;

use sable_utils::span::Spanned;

use crate::{Diagnostic, IssueKind, Severity};

/// Something that receives issues from the analyzer.
pub trait IssueSink {
    /// Report an issue found in `file_path`.
    ///
    /// Returns `true` when the report must stop the current check. The
    /// analyzer then abandons the expression or statement it was checking
    /// and unwinds to the enclosing function.
    fn report(&mut self, kind: Spanned<IssueKind>, file_path: &str) -> bool;
}

/// How a single issue kind is treated by an [`IssueBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    /// Record as an error
    Error,
    /// Record as information
    Info,
    /// Drop silently
    Suppress,
}

/// An [`IssueSink`] that records diagnostics in memory, with per-issue report
/// levels.
#[derive(Debug)]
pub struct IssueBuffer {
    /// Everything recorded so far, in report order
    diagnostics: Vec<Diagnostic>,
    /// Report level overrides keyed by issue name
    levels: HashMap<String, ReportLevel>,
    /// Report level for issues without an override
    default_level: ReportLevel,
    /// Whether recording an [`ReportLevel::Error`] stops the current check
    hard_stop_on_error: bool,
}

impl Default for IssueBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl IssueBuffer {
    /// Create an empty buffer: every issue is an error and errors stop the
    /// current check.
    #[must_use]
    pub fn new() -> Self {
        Self {
            diagnostics: vec![],
            levels: HashMap::new(),
            default_level: ReportLevel::Error,
            hard_stop_on_error: true,
        }
    }

    /// Set the level used for one issue name
    #[must_use]
    pub fn with_level(mut self, issue_name: &str, level: ReportLevel) -> Self {
        self.levels.insert(issue_name.to_string(), level);
        self
    }

    /// Set the level used for issues without an override
    #[must_use]
    pub const fn with_default_level(mut self, level: ReportLevel) -> Self {
        self.default_level = level;
        self
    }

    /// Choose whether recorded errors stop the current check
    #[must_use]
    pub const fn with_hard_stop_on_error(mut self, hard_stop_on_error: bool) -> Self {
        self.hard_stop_on_error = hard_stop_on_error;
        self
    }

    /// The level an issue name is reported at
    #[must_use]
    pub fn level_of(&self, issue_name: &str) -> ReportLevel {
        self.levels
            .get(issue_name)
            .copied()
            .unwrap_or(self.default_level)
    }

    /// All recorded diagnostics, in report order
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consume the buffer, returning the recorded diagnostics
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Whether any [`Severity::Error`] diagnostic was recorded
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    /// The names of every recorded diagnostic, in report order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.diagnostics.iter().map(Diagnostic::name).collect()
    }

    /// How many diagnostics with the given issue name were recorded
    #[must_use]
    pub fn count_of(&self, issue_name: &str) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.name() == issue_name)
            .count()
    }
}

impl IssueSink for IssueBuffer {
    fn report(&mut self, kind: Spanned<IssueKind>, file_path: &str) -> bool {
        let severity = match self.level_of(kind.value().name()) {
            ReportLevel::Suppress => return false,
            ReportLevel::Error => Severity::Error,
            ReportLevel::Info => Severity::Info,
        };

        self.diagnostics.push(Diagnostic {
            severity,
            kind,
            file_path: file_path.to_string(),
        });

        severity == Severity::Error && self.hard_stop_on_error
    }
}

#[cfg(test)]
mod tests {
    use sable_utils::spanned;

    use super::*;

    fn undefined(name: &str) -> Spanned<IssueKind> {
        spanned!(0, IssueKind::UndefinedVariable(name.to_string()), 2)
    }

    #[test]
    fn errors_stop_by_default() {
        let mut buffer = IssueBuffer::new();
        assert!(buffer.report(undefined("$a"), "a.php"));
        assert!(buffer.has_errors());
        assert_eq!(buffer.names(), vec!["UndefinedVariable"]);
    }

    #[test]
    fn info_level_records_without_stopping() {
        let mut buffer = IssueBuffer::new().with_level("UndefinedVariable", ReportLevel::Info);
        assert!(!buffer.report(undefined("$a"), "a.php"));
        assert!(!buffer.has_errors());
        assert_eq!(buffer.diagnostics()[0].severity, Severity::Info);
    }

    #[test]
    fn suppressed_issues_are_dropped() {
        let mut buffer = IssueBuffer::new().with_level("UndefinedVariable", ReportLevel::Suppress);
        assert!(!buffer.report(undefined("$a"), "a.php"));
        assert_eq!(buffer.diagnostics().len(), 0);
    }

    #[test]
    fn hard_stop_can_be_disabled() {
        let mut buffer = IssueBuffer::new().with_hard_stop_on_error(false);
        assert!(!buffer.report(undefined("$a"), "a.php"));
        assert!(!buffer.report(undefined("$b"), "a.php"));
        assert_eq!(buffer.count_of("UndefinedVariable"), 2);
        assert_eq!(buffer.into_diagnostics()[1].file_path, "a.php");
    }
}

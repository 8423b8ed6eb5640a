//! Defines the [`Diagnostic`] type: an issue with a decided severity.

use std::{error::Error, fmt::Display};

use ansi_term::{Color, Style};
use sable_utils::span::Spanned;

use crate::IssueKind;

/// The severity of a [`Diagnostic`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    /// A violated contract. May stop analysis of the current function.
    Error,
    /// Reported for information only; analysis always continues.
    Info,
}
impl Severity {
    /// The style used to paint this severity in a terminal
    pub(crate) fn style(self) -> Style {
        match self {
            Self::Error => Color::Red.bold(),
            Self::Info => Color::Cyan.bold(),
        }
    }

    /// The plain text of this severity
    pub(crate) const fn text(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}
impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// An issue found in a checked file, together with its severity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// How severe the issue is
    pub severity: Severity,
    /// The issue and where it was found
    pub kind: Spanned<IssueKind>,
    /// The path of the file the issue was found in
    pub file_path: String,
}
impl Diagnostic {
    /// The stable name of the contained issue
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.value().name()
    }
}
impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}[{}]: {}",
            self.severity,
            self.name(),
            self.kind.value()
        )
    }
}
impl Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use sable_utils::spanned;

    use super::*;

    #[test]
    fn display_includes_severity_name_and_message() {
        let diagnostic = Diagnostic {
            severity: Severity::Error,
            kind: spanned!(0, IssueKind::UndefinedVariable("$a".to_string()), 2),
            file_path: "a.php".to_string(),
        };
        assert_eq!(
            diagnostic.to_string(),
            "error[UndefinedVariable]: cannot find referenced variable `$a`"
        );
    }
}

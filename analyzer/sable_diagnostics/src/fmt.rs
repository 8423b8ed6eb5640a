//! Rendering of [`Diagnostic`]s against the source they were found in

use ansi_term::{Color, Style};
use line_span::LineSpanExt;
use sable_utils::line_finder::LineLookup;

use crate::{Diagnostic, Severity};

/// Styles used when painting a diagnostic. Plain rendering uses empty
/// styles, which ansi_term paints without escape codes.
#[derive(Clone, Copy)]
struct Palette {
    /// Style for the severity word and underline
    severity: Style,
    /// Style for the gutter
    gutter: Style,
    /// Style for the message
    message: Style,
}
impl Palette {
    /// The palette for a severity
    fn new(severity: Severity, colored: bool) -> Self {
        if colored {
            Self {
                severity: severity.style(),
                gutter: Color::Blue.bold(),
                message: Color::White.bold(),
            }
        } else {
            Self {
                severity: Style::new(),
                gutter: Style::new(),
                message: Style::new(),
            }
        }
    }
}

/// Format the 'source window': the lines the span touches, each followed by
/// an underline beneath the spanned part.
fn display_source_window(palette: Palette, span: (usize, usize), source: &str) -> String {
    // A zero-width span still underlines one character.
    let span = (span.0, std::cmp::max(span.1, span.0 + 1));

    let lines = source
        .line_spans()
        .enumerate()
        .filter(|(_, line)| line.start() < span.1 && span.0 <= line.end())
        .map(|(n, line)| {
            let start = std::cmp::max(line.start(), span.0) - line.start();
            let end = std::cmp::max(std::cmp::min(line.end(), span.1) - line.start(), start + 1);
            (n + 1, &source[line.start()..line.end()], (start, end))
        })
        .collect::<Vec<_>>();

    let max_line_number_length = lines
        .iter()
        .map(|(line, _, _)| line.to_string().len())
        .max()
        .unwrap_or(1)
        + 1;

    // line | CODE CODE CODE CODE
    //      |      ^^^^
    lines
        .into_iter()
        .map(|(line_number, string, (start, end))| {
            format!(
                "{} {string}\n{} {} {}",
                palette
                    .gutter
                    .paint(format!("{line_number: >max_line_number_length$} |")),
                " ".repeat(max_line_number_length),
                palette.gutter.paint("|"),
                palette
                    .severity
                    .paint(format!("{}{}", " ".repeat(start), "^".repeat(end - start)))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl Diagnostic {
    /// Render this diagnostic with a header, a `file:line:col` locator and a
    /// source window, painted for a terminal
    #[must_use]
    pub fn print(&self, source: &str) -> String {
        self.render(source, true)
    }

    /// Render this diagnostic like [`Diagnostic::print`], without colors
    #[must_use]
    pub fn print_plain(&self, source: &str) -> String {
        self.render(source, false)
    }

    /// Shared implementation of [`Diagnostic::print`] and
    /// [`Diagnostic::print_plain`]
    fn render(&self, source: &str, colored: bool) -> String {
        let palette = Palette::new(self.severity, colored);
        let span = self.kind.span();
        let location = LineLookup::new(source).lookup_from_index(span.start());

        let mut output = format!(
            "{}{}: {}\n --> {}:{}:{}",
            palette.severity.paint(self.severity.text()),
            palette.severity.paint(format!("[{}]", self.name())),
            palette.message.paint(self.kind.value().to_string()),
            self.file_path,
            location.line,
            location.col,
        );

        if span.start() < source.len() {
            output.push('\n');
            output.push_str(&display_source_window(
                palette,
                (span.start(), std::cmp::min(span.end(), source.len())),
                source,
            ));
        }

        output
    }
}

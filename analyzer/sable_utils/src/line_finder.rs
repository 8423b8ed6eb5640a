//! Tools for looking up the [`LineAndCol`] of some location in a source file

use std::cmp::Ordering;

/// Wrapper around a line and column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAndCol {
    /// The 1-indexed line number
    pub line: u32,
    /// The 1-indexed column number
    pub col: u32,
}

/// Looks up the line and column of byte offsets within one source text
#[derive(Debug)]
pub struct LineLookup {
    /// The inclusive byte ranges of each line in the input
    line_spans: Vec<(usize, usize)>,
}

impl LineLookup {
    /// Creates a new [`LineLookup`] over a string
    #[must_use]
    pub fn new(input: &str) -> Self {
        let mut line_start = 0;
        let mut line_spans = vec![];
        for line in input.split('\n') {
            let line_end = line_start + line.len() + 1;
            line_spans.push((line_start, line_end - 1));
            line_start = line_end;
        }

        Self { line_spans }
    }

    /// Look up the 1-indexed line and column of an offset in the string.
    ///
    /// Offsets past the end of the input resolve to the final line.
    #[must_use]
    pub fn lookup_from_index(&self, index: usize) -> LineAndCol {
        let line = self
            .line_spans
            .binary_search_by(|(line_start, line_end)| {
                if *line_end < index {
                    return Ordering::Less;
                }
                if *line_start > index {
                    return Ordering::Greater;
                }

                Ordering::Equal
            })
            .unwrap_or_else(|insert_at| insert_at.min(self.line_spans.len() - 1));

        let line_start = self.line_spans[line].0;
        LineAndCol {
            line: u32::try_from(line + 1).unwrap_or(u32::MAX),
            col: u32::try_from(index.saturating_sub(line_start) + 1).unwrap_or(u32::MAX),
        }
    }

    /// The number of lines in the input
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_spans.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_line_and_column() {
        let lookup = LineLookup::new("<?php\n$a = 1;\necho $a;");
        assert_eq!(lookup.lookup_from_index(0), LineAndCol { line: 1, col: 1 });
        assert_eq!(lookup.lookup_from_index(6), LineAndCol { line: 2, col: 1 });
        assert_eq!(lookup.lookup_from_index(19), LineAndCol { line: 3, col: 6 });
        assert_eq!(lookup.line_count(), 3);
    }

    #[test]
    fn offsets_past_the_end_clamp_to_the_last_line() {
        let lookup = LineLookup::new("a\nb");
        assert_eq!(lookup.lookup_from_index(100).line, 2);
    }
}

//! Associations to spans within the analyzed source
//!
//! This module declares two very helpful types, [`Span`] and [`Spanned<T>`],
//! which let the analyzer tie AST nodes and issues back to a location in the
//! file being checked. There is also a trait [`Spannable`] which allows some
//! easier chained method calls.

use std::{fmt::Display, ops::Range};

/// Represents the start and end of some segment of a source file, plus the
/// line the segment starts on
///
/// Offsets are byte offsets into the source. The line is 1-indexed and is
/// carried alongside the offsets because the AST may be produced by an
/// external front-end that never hands the analyzer the raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span(usize, usize, u32);
impl Span {
    /// Create a new [`Span`] given a start and end location. The line is
    /// assumed to be `1`.
    ///
    /// # Panics
    /// Panics if `start > end`.
    #[must_use]
    pub fn from_positions(start: usize, end: usize) -> Self {
        Self::from_positions_and_line(start, end, 1)
    }

    /// Create a new [`Span`] given a start and end location and the line the
    /// span starts on.
    ///
    /// # Panics
    /// Panics if `start > end`.
    #[must_use]
    pub fn from_positions_and_line(start: usize, end: usize, line: u32) -> Self {
        assert!(
            end >= start,
            "span must have positive length (got span {start}..{end})"
        );
        Self(start, end, line)
    }

    /// Obtains the starting position of this [`Span`] as a `usize`
    #[must_use]
    #[inline]
    pub const fn start(&self) -> usize {
        self.0
    }

    /// Obtains the ending position of this [`Span`] as a `usize`
    #[must_use]
    #[inline]
    pub const fn end(&self) -> usize {
        self.1
    }

    /// Obtains the 1-indexed line this [`Span`] starts on
    #[must_use]
    #[inline]
    pub const fn line(&self) -> u32 {
        self.2
    }

    /// Convert this [`Span`] into a [`Range`], good for slicing into the
    /// source text
    #[must_use]
    #[inline]
    pub const fn range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    /// Creates a [`Spanned<T>`] instance using this [`Span`] and a passed
    /// value
    #[must_use]
    #[inline]
    pub const fn containing<T>(self, value: T) -> Spanned<T> {
        Spanned::from_span_and_value(self, value)
    }

    /// Creates the smallest [`Span`] covering both passed spans. The line of
    /// the earlier span wins.
    #[must_use]
    pub fn join(span_a: Self, span_b: Self) -> Self {
        let line = if span_a.start() <= span_b.start() {
            span_a.line()
        } else {
            span_b.line()
        };
        Self(
            std::cmp::min(span_a.start(), span_b.start()),
            std::cmp::max(span_a.end(), span_b.end()),
            line,
        )
    }
}
impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.line(), self.start(), self.end())
    }
}

/// Represents something (`T`) contained within a [`Span`].
///
/// These are attached to AST nodes and to every issue the analyzer raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Spanned<T>(Span, T);
impl<T> Spanned<T> {
    /// Create a new [`Spanned<T>`] instance from a [`Span`] and value
    #[must_use]
    #[inline]
    pub const fn from_span_and_value(span: Span, value: T) -> Self {
        Self(span, value)
    }

    /// Obtains the [`Span`] associated with this [`Spanned<T>`] instance
    #[must_use]
    #[inline]
    pub const fn span(&self) -> Span {
        self.0
    }

    /// Obtains a reference to the value this [`Spanned<T>`] instance wraps
    #[inline]
    pub const fn value(&self) -> &T {
        &self.1
    }

    /// Applies a function to the contained value, keeping the [`Span`]
    #[inline]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        let span = self.span();
        Spanned::from_span_and_value(span, f(self.into_value()))
    }

    /// "Strips" the [`Spanned<T>`] of its [`Span`], returning the inner value
    #[allow(clippy::missing_const_for_fn)]
    #[inline]
    pub fn into_value(self) -> T {
        self.1
    }

    /// Converts a [`&Spanned<T>`][Spanned] to a [`Spanned<&T>`].
    #[inline]
    pub const fn as_ref(&self) -> Spanned<&T> {
        Spanned::from_span_and_value(self.span(), &self.1)
    }
}
impl<T> Display for Spanned<T>
where
    T: Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value().fmt(f)
    }
}
impl<T> Spanned<Option<T>> {
    /// Converts a [`Spanned<Option<T>>`] to a [`Option<Spanned<T>>`].
    pub fn transpose(self) -> Option<Spanned<T>> {
        let span = self.span();
        self.into_value()
            .map(|x| Spanned::from_span_and_value(span, x))
    }
}

/// A trait automatically implemented on all types that allows you to attach a
/// [`Span`] to something, creating a [`Spanned<T>`] instance.
pub trait Spannable
where
    Self: Sized,
{
    /// Attach a [`Span`] to this value, creating a [`Spanned<T>`] instance
    fn in_span(self, span: Span) -> Spanned<Self>;
}

impl<T: Sized> Spannable for T {
    #[inline]
    fn in_span(self, span: Span) -> Spanned<Self> {
        Spanned::from_span_and_value(span, self)
    }
}

/// Create a [`Spanned<T>`] instance from two locations and a value. Expands
/// to [`Spanned::from_span_and_value`] and [`Span::from_positions`] calls.
///
/// # Panics
/// Panics if `start > end`.
#[macro_export]
macro_rules! spanned {
    ($start:expr, $value:expr, $end:expr) => {
        $crate::span::Spanned::from_span_and_value(
            $crate::span::Span::from_positions($start, $end),
            $value,
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanned_macro_creates_spanned_item() {
        assert_eq!(
            spanned!(0, (), 3),
            Spanned::from_span_and_value(Span::from_positions(0, 3), ())
        );
    }

    #[test]
    fn span_accessors_report_positions_and_line() {
        let span = Span::from_positions_and_line(2, 7, 4);
        assert_eq!(span.start(), 2);
        assert_eq!(span.end(), 7);
        assert_eq!(span.line(), 4);
        assert_eq!(span.range(), 2..7);
        assert_eq!(span.to_string(), "4:2-7");
    }

    #[test]
    #[should_panic(expected = "span must have positive length")]
    fn span_from_invalid_positions_panics() {
        let _ = Span::from_positions(5, 0);
    }

    #[test]
    fn join_covers_both_spans_and_keeps_earliest_line() {
        let joined = Span::join(
            Span::from_positions_and_line(10, 12, 3),
            Span::from_positions_and_line(2, 4, 1),
        );
        assert_eq!(joined, Span::from_positions_and_line(2, 12, 1));
    }

    #[test]
    fn map_keeps_the_span() {
        let spanned = spanned!(3, 0, 6);
        assert_eq!(spanned.map(|n| n == 0), spanned!(3, true, 6));
        assert_eq!(spanned.as_ref(), spanned!(3, &0, 6));
    }

    #[test]
    fn transpose_moves_option_outwards() {
        assert_eq!(spanned!(3, Some(0), 6).transpose(), Some(spanned!(3, 0, 6)));
        let none: Spanned<Option<()>> = spanned!(3, None, 6);
        assert_eq!(none.transpose(), None);
    }

    #[test]
    fn spannable_in_span_creates_spanned() {
        assert_eq!(
            7.in_span(Span::from_positions(3, 6)),
            Spanned(Span(3, 6, 1), 7),
        );
    }
}

//! This module turns raw program text into logical lines using the `pest` line grammar.
//! Comments and blank lines are dropped; every remaining line keeps its source span so
//! diagnostics can point at the physical line and column it came from.

use crate::types::{ParseErrorKind, TuringMachineError};
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Position, Span,
};
use pest_derive::Parser as PestParser;

/// Derives a `PestParser` for the line grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct SourceParser;

/// A non-empty, comment-free line of the program.
#[derive(Debug, Clone)]
pub struct Line<'a> {
    span: Span<'a>,
    words: Vec<Span<'a>>,
}

impl<'a> Line<'a> {
    /// Builds a line from a `text` pair, trimming trailing whitespace.
    /// Returns `None` if nothing but whitespace remains.
    fn from_text(pair: Pair<'a, Rule>) -> Option<Self> {
        let span = pair.as_span();
        let trimmed = span.as_str().trim_end();
        if trimmed.is_empty() {
            return None;
        }

        let span = Span::new(span.get_input(), span.start(), span.start() + trimmed.len())?;
        let words = pair
            .into_inner()
            .filter(|p| p.as_rule() == Rule::word)
            .map(|p| p.as_span())
            .collect();

        Some(Self { span, words })
    }

    /// The line's text, without comment and trailing whitespace.
    pub fn text(&self) -> &'a str {
        self.span.as_str()
    }

    /// The whitespace separated words of the line, with their own spans.
    pub fn words(&self) -> &[Span<'a>] {
        &self.words
    }

    /// The 1-based physical line number in the source text.
    pub fn number(&self) -> usize {
        self.span.start_pos().line_col().0
    }

    pub fn span(&self) -> Span<'a> {
        self.span
    }

    /// Creates a parse error pointing at the whole line.
    pub fn error(&self, kind: ParseErrorKind) -> TuringMachineError {
        parse_error(kind, self.span)
    }
}

/// The logical lines of a program, in source order.
#[derive(Debug, Clone)]
pub struct Source<'a> {
    input: &'a str,
    lines: Vec<Line<'a>>,
}

impl<'a> Source<'a> {
    /// Splits `input` into logical lines.
    ///
    /// Each physical line is cut at the first `;;` and stripped of trailing whitespace;
    /// lines that end up empty are dropped.
    pub fn load(input: &'a str) -> Result<Self, TuringMachineError> {
        let pairs = SourceParser::parse(Rule::source, input)
            .map_err(|e| TuringMachineError::GrammarError(Box::new(e)))?;

        // Rule: source > [line] > text
        let lines = pairs
            .flat_map(|source| source.into_inner())
            .filter_map(|line| line.into_inner().find(|p| p.as_rule() == Rule::text))
            .filter_map(Line::from_text)
            .collect();

        Ok(Self { input, lines })
    }

    pub fn get(&self, index: usize) -> Option<&Line<'a>> {
        self.lines.get(index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[Line<'a>] {
        &self.lines
    }

    /// Creates a parse error for something missing at the end of the input.
    pub fn error_at_end(&self, kind: ParseErrorKind) -> TuringMachineError {
        let position = Position::new(self.input, self.input.len())
            .unwrap_or_else(|| Position::from_start(self.input));
        let report = Error::new_from_pos(
            ErrorVariant::CustomError {
                message: kind.to_string(),
            },
            position,
        );

        TuringMachineError::ParseError {
            kind,
            report: Box::new(report),
        }
    }
}

/// Creates a `TuringMachineError::ParseError` located at `span`.
pub fn parse_error(kind: ParseErrorKind, span: Span) -> TuringMachineError {
    let report = Error::new_from_span(
        ErrorVariant::CustomError {
            message: kind.to_string(),
        },
        span,
    );

    TuringMachineError::ParseError {
        kind,
        report: Box::new(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(source: &Source<'a>) -> Vec<&'a str> {
        source.lines().iter().map(|l| l.text()).collect()
    }

    #[test]
    fn test_strips_comments_and_blank_lines() {
        let input = ";; header comment\nSYMBOLS ;; start\n\n   \na\nEND\n";
        let source = Source::load(input).unwrap();

        assert_eq!(texts(&source), vec!["SYMBOLS", "a", "END"]);
    }

    #[test]
    fn test_keeps_leading_whitespace_and_trims_trailing() {
        let source = Source::load("  READ a  \t\nEND   ").unwrap();

        assert_eq!(texts(&source), vec!["  READ a", "END"]);
    }

    #[test]
    fn test_records_physical_line_numbers() {
        let input = "SYMBOLS\n;; comment\n\na\nEND";
        let source = Source::load(input).unwrap();

        let numbers: Vec<usize> = source.lines().iter().map(|l| l.number()).collect();
        assert_eq!(numbers, vec![1, 4, 5]);
    }

    #[test]
    fn test_splits_words() {
        let source = Source::load("READ a   WRITE\tb ;; MOVE LEFT").unwrap();
        let line = source.get(0).unwrap();

        let words: Vec<&str> = line.words().iter().map(|w| w.as_str()).collect();
        assert_eq!(words, vec!["READ", "a", "WRITE", "b"]);
        assert_eq!(line.words()[2].start_pos().line_col(), (1, 10));
    }

    #[test]
    fn test_single_semicolon_is_not_a_comment() {
        let source = Source::load(";\na;b ;;c").unwrap();

        assert_eq!(texts(&source), vec![";", "a;b"]);
    }

    #[test]
    fn test_empty_input_has_no_lines() {
        assert!(Source::load("").unwrap().is_empty());
        assert!(Source::load(";; only a comment\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_error_points_at_line() {
        let source = Source::load("SYMBOLS\n  bad\n").unwrap();
        let error = source
            .get(1)
            .unwrap()
            .error(ParseErrorKind::InvalidSymbol("  bad".into()));

        let message = error.to_string();
        assert!(message.contains("2:1"));
        assert!(message.contains("  bad"));
        assert!(message.contains("exactly 1 character"));
    }
}

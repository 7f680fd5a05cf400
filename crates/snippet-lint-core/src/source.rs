//! Source text and diagnostic types shared by every analysis pass.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Line separator used both to split input and to rejoin corrected output.
pub const LINE_SEPARATOR: char = '\n';

/// Submitted code, split into lines.
///
/// Splitting is on `\n` only. An empty input is a single empty line, and a
/// trailing newline yields a trailing empty line, so joining the lines back
/// reproduces the input exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText<'a> {
    lines: Vec<&'a str>,
}

impl<'a> SourceText<'a> {
    /// Split `code` into lines.
    pub fn new(code: &'a str) -> Self {
        Self {
            lines: code.split(LINE_SEPARATOR).collect(),
        }
    }

    /// The lines in input order.
    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    /// Number of lines (always at least one).
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Always `false`; even empty input has one line.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterate `(line_number, line)` pairs with 1-based line numbers.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &'a str)> + '_ {
        self.lines.iter().enumerate().map(|(idx, line)| (idx + 1, *line))
    }
}

/// A single finding: a 1-based line number and a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Line the finding refers to (1-based).
    pub line: usize,
    /// Human-readable description of the finding.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic for `line`.
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_one_empty_line() {
        let src = SourceText::new("");
        assert_eq!(src.lines(), &[""]);
        assert_eq!(src.len(), 1);
    }

    #[test]
    fn no_newline_is_single_line() {
        assert_eq!(SourceText::new("x = 1").lines(), &["x = 1"]);
    }

    #[test]
    fn trailing_newline_keeps_empty_last_line() {
        assert_eq!(SourceText::new("a\nb\n").lines(), &["a", "b", ""]);
    }

    #[test]
    fn carriage_returns_stay_in_line() {
        assert_eq!(SourceText::new("a\r\nb").lines(), &["a\r", "b"]);
    }

    #[test]
    fn numbered_is_one_based() {
        let src = SourceText::new("a\nb");
        let numbered: Vec<_> = src.numbered().collect();
        assert_eq!(numbered, vec![(1, "a"), (2, "b")]);
    }

    #[test]
    fn diagnostic_display_format() {
        let d = Diagnostic::new(3, "Print statement detected");
        assert_eq!(d.to_string(), "Line 3: Print statement detected");
    }
}

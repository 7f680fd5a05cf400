//! Maximum line length enforcement.
//!
//! Lines longer than the limit are cut to exactly `max` characters and
//! reported with their original length. Lengths are counted in Unicode
//! scalar values, so truncation never splits a character.

use crate::error::{AnalysisError, AnalysisResult};
use crate::source::{Diagnostic, LINE_SEPARATOR, SourceText};

/// Default maximum line length in characters.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 80;

/// Output of [`enforce_max_line_length`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineLengthOutcome {
    /// Input with every over-long line truncated, rejoined with `\n`.
    pub corrected: String,
    /// One diagnostic per truncated line, in line order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Truncate every line of `source` longer than `max` characters.
///
/// Line count is preserved: each input line produces exactly one output
/// line. Returns [`AnalysisError::InvalidLineLength`] when `max` is zero.
#[tracing::instrument(skip(source), fields(lines = source.len()))]
pub fn enforce_max_line_length(
    source: &SourceText<'_>,
    max: usize,
) -> AnalysisResult<LineLengthOutcome> {
    if max == 0 {
        return Err(AnalysisError::InvalidLineLength(max));
    }

    let mut corrected = String::new();
    let mut diagnostics = Vec::new();

    for (line_num, line) in source.numbered() {
        if line_num > 1 {
            corrected.push(LINE_SEPARATOR);
        }
        let length = line.chars().count();
        if length > max {
            diagnostics.push(Diagnostic::new(
                line_num,
                format!("Exceeds maximum line length ({length} characters)"),
            ));
            corrected.push_str(truncate_chars(line, max));
        } else {
            corrected.push_str(line);
        }
    }

    tracing::debug!(truncated = diagnostics.len(), "line length enforced");
    Ok(LineLengthOutcome {
        corrected,
        diagnostics,
    })
}

/// First `max` characters of `line`.
fn truncate_chars(line: &str, max: usize) -> &str {
    match line.char_indices().nth(max) {
        Some((byte_idx, _)) => &line[..byte_idx],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enforce(code: &str, max: usize) -> LineLengthOutcome {
        enforce_max_line_length(&SourceText::new(code), max).unwrap()
    }

    #[test]
    fn short_lines_pass_through() {
        let out = enforce("a = 1\nb = 2", 80);
        assert_eq!(out.corrected, "a = 1\nb = 2");
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn long_line_truncated_and_reported() {
        let code = format!("short\n{}", "a".repeat(100));
        let out = enforce(&code, 80);
        let lines: Vec<&str> = out.corrected.split('\n').collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "short");
        assert_eq!(lines[1].chars().count(), 80);
        assert_eq!(
            out.diagnostics,
            vec![Diagnostic::new(
                2,
                "Exceeds maximum line length (100 characters)"
            )]
        );
    }

    #[test]
    fn line_exactly_at_limit_unchanged() {
        let line = "x".repeat(80);
        let out = enforce(&line, 80);
        assert_eq!(out.corrected, line);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let out = enforce("", 80);
        assert_eq!(out.corrected, "");
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn line_count_preserved_with_blank_lines() {
        let code = format!("\n\n{}\n", "b".repeat(90));
        let out = enforce(&code, 10);
        assert_eq!(out.corrected.split('\n').count(), code.split('\n').count());
        assert_eq!(out.corrected, format!("\n\n{}\n", "b".repeat(10)));
    }

    #[test]
    fn counts_characters_not_bytes() {
        let line = "é".repeat(5);
        let out = enforce(&line, 3);
        assert_eq!(out.corrected, "ééé");
        assert_eq!(
            out.diagnostics[0].message,
            "Exceeds maximum line length (5 characters)"
        );

        let out = enforce(&line, 5);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn idempotent_on_own_output() {
        let code = format!("{}\nok\n{}", "a".repeat(120), "z".repeat(81));
        let first = enforce(&code, 80);
        let second = enforce(&first.corrected, 80);
        assert_eq!(second.corrected, first.corrected);
        assert!(second.diagnostics.is_empty());
    }

    #[test]
    fn zero_limit_rejected() {
        let result = enforce_max_line_length(&SourceText::new("abc"), 0);
        assert!(matches!(result, Err(AnalysisError::InvalidLineLength(0))));
    }

    #[test]
    fn carriage_return_counts_toward_length() {
        let out = enforce("abc\r\nd", 3);
        assert_eq!(out.corrected, "abc\nd");
        assert_eq!(
            out.diagnostics,
            vec![Diagnostic::new(1, "Exceeds maximum line length (4 characters)")]
        );
    }
}

//! Analysis orchestration.
//!
//! Runs a diagnostic backend and the line-length enforcer over the same
//! input and combines their output. Backend diagnostics come first, then
//! line-length diagnostics; the two lists are concatenated, not merged by
//! line number.

use schemars::{JsonSchema, Schema, schema_for};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};
use crate::external::{ExternalAnalyzer, FailurePolicy};
use crate::line_length::{self, DEFAULT_MAX_LINE_LENGTH};
use crate::rules;
use crate::source::{Diagnostic, SourceText};

/// Settings for a single analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzeOptions {
    /// Maximum line length in characters.
    pub max_line_length: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

/// Source of the non-length diagnostics.
#[derive(Clone, Copy)]
pub enum Backend<'a> {
    /// The built-in pattern rule table.
    Rules,
    /// An external static-analysis tool.
    External {
        /// Tool to run.
        analyzer: &'a dyn ExternalAnalyzer,
        /// What to do when the tool fails.
        on_failure: FailurePolicy,
    },
}

impl std::fmt::Debug for Backend<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rules => f.write_str("Rules"),
            Self::External {
                analyzer,
                on_failure,
            } => f
                .debug_struct("External")
                .field("analyzer", &analyzer.name())
                .field("on_failure", on_failure)
                .finish(),
        }
    }
}

/// Result of analyzing one snippet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisReport {
    /// Input with over-long lines truncated, joined with `\n`.
    pub corrected_code: String,
    /// Rendered diagnostics (`Line {n}: {message}`), backend first.
    pub comments: Vec<String>,
}

impl AnalysisReport {
    /// Whether any diagnostic was produced.
    pub fn has_comments(&self) -> bool {
        !self.comments.is_empty()
    }
}

/// JSON Schema for [`AnalysisReport`], the body of a successful
/// `POST /analyze` response and of `check --json`.
pub fn report_schema() -> Schema {
    schema_for!(AnalysisReport)
}

/// Analyze `code` and return corrected code plus comments.
#[tracing::instrument(skip(code), fields(code_len = code.len()))]
pub fn analyze_code(
    code: &str,
    options: &AnalyzeOptions,
    backend: Backend<'_>,
) -> AnalysisResult<AnalysisReport> {
    let source = SourceText::new(code);

    let length = line_length::enforce_max_line_length(&source, options.max_line_length)?;
    let backend_diagnostics = run_backend(code, &source, backend)?;

    let comments = backend_diagnostics
        .iter()
        .chain(length.diagnostics.iter())
        .map(ToString::to_string)
        .collect::<Vec<_>>();

    tracing::info!(
        lines = source.len(),
        comments = comments.len(),
        "analysis complete"
    );
    Ok(AnalysisReport {
        corrected_code: length.corrected,
        comments,
    })
}

fn run_backend(
    code: &str,
    source: &SourceText<'_>,
    backend: Backend<'_>,
) -> AnalysisResult<Vec<Diagnostic>> {
    match backend {
        Backend::Rules => Ok(rules::apply_rules(source)),
        Backend::External {
            analyzer,
            on_failure,
        } => match analyzer.analyze(code) {
            Ok(issues) => Ok(issues.into_iter().map(Diagnostic::from).collect()),
            Err(e) => match on_failure {
                FailurePolicy::Degrade => {
                    tracing::warn!(
                        analyzer = analyzer.name(),
                        error = %e,
                        "external analyzer failed; continuing without its diagnostics"
                    );
                    Ok(Vec::new())
                }
                FailurePolicy::Error => Err(AnalysisError::External(e)),
            },
        },
    }
}

/// Reject `code` larger than `max_bytes`. `None` disables the check.
pub fn check_input_size(code: &str, max_bytes: Option<usize>) -> AnalysisResult<()> {
    match max_bytes {
        Some(limit) if code.len() > limit => Err(AnalysisError::InputTooLarge {
            size: code.len(),
            limit,
        }),
        _ => Ok(()),
    }
}

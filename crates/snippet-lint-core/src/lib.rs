//! Core library for snippet-lint.
//!
//! Analyzes a code snippet line by line: over-long lines are truncated and
//! reported, and each line is checked against a small fixed table of
//! pattern rules (or handed to an external static-analysis tool).
//!
//! # Modules
//!
//! - [`source`] - Line splitting and the [`Diagnostic`] type
//! - [`line_length`] - Maximum line length enforcement
//! - [`rules`] - The built-in pattern rule engine
//! - [`external`] - External analyzer interface and subprocess backend
//! - [`analyze`] - Orchestration producing an [`AnalysisReport`]
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```
//! use snippet_lint_core::{AnalyzeOptions, Backend, analyze_code};
//!
//! let report = analyze_code("print(x)", &AnalyzeOptions::default(), Backend::Rules)
//!     .expect("analysis failed");
//! assert_eq!(report.comments, vec!["Line 1: Print statement detected"]);
//! ```
#![deny(unsafe_code)]

pub mod analyze;
pub mod config;
pub mod error;
pub mod external;
pub mod line_length;
pub mod rules;
pub mod source;

pub use analyze::{
    AnalysisReport, AnalyzeOptions, Backend, analyze_code, check_input_size, report_schema,
};
pub use config::{
    BackendKind, Config, ConfigLoader, ConfigSources, DEFAULT_MAX_INPUT_BYTES, LogLevel,
};
pub use error::{AnalysisError, AnalysisResult, ConfigError, ConfigResult, ExternalAnalyzerError};
pub use external::{CommandAnalyzer, ExternalAnalyzer, ExternalIssue, FailurePolicy};
pub use line_length::DEFAULT_MAX_LINE_LENGTH;
pub use source::{Diagnostic, SourceText};

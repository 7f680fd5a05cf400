//! Error types for snippet-lint-core.

use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,

    /// The external backend was selected but no program was configured.
    #[error("backend `external` requires `external.program` to be set")]
    MissingExternalProgram,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised by an external static-analysis tool.
#[derive(Error, Debug)]
pub enum ExternalAnalyzerError {
    /// The tool process could not be started.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Writing the code to the tool or reading its output failed.
    #[error("I/O error talking to `{program}`: {source}")]
    Io {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The tool was killed by a signal instead of exiting.
    #[error("`{program}` terminated without an exit code")]
    Terminated {
        /// Program that was invoked.
        program: String,
    },

    /// The tool's output was not the expected JSON issue list.
    #[error("`{program}` produced malformed output: {source}")]
    MalformedOutput {
        /// Program that was invoked.
        program: String,
        /// Underlying parse error.
        source: serde_json::Error,
    },
}

/// Result type alias using [`ExternalAnalyzerError`].
pub type ExternalResult<T> = Result<T, ExternalAnalyzerError>;

/// Errors that can occur during code analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The maximum line length must be at least one character.
    #[error("maximum line length must be positive, got {0}")]
    InvalidLineLength(usize),

    /// The submitted code exceeds the configured input limit.
    #[error("input too large: {size} bytes (limit: {limit} bytes)")]
    InputTooLarge {
        /// Size of the submitted code in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },

    /// The external analyzer failed and the failure policy is `error`.
    #[error("external analyzer failed: {0}")]
    External(#[from] ExternalAnalyzerError),
}

/// Result type alias using [`AnalysisError`].
pub type AnalysisResult<T> = Result<T, AnalysisError>;

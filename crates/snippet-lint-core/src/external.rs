//! External static-analysis backends.
//!
//! An [`ExternalAnalyzer`] takes the submitted code and returns its own list
//! of `(message, line)` issues. [`CommandAnalyzer`] drives any tool that
//! reads code on stdin and prints a JSON array of issues on stdout, such as
//! `pylint --output-format=json --from-stdin snippet.py`.

use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::error::{ExternalAnalyzerError, ExternalResult};
use crate::source::Diagnostic;

/// One issue reported by an external tool.
///
/// Fields beyond `message` and `line` in the tool's output are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIssue {
    /// Tool-provided description.
    pub message: String,
    /// Line the issue refers to (1-based).
    pub line: usize,
}

impl From<ExternalIssue> for Diagnostic {
    fn from(issue: ExternalIssue) -> Self {
        Self::new(issue.line, issue.message)
    }
}

/// What to do when an external analyzer fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum FailurePolicy {
    /// Log the failure and contribute no diagnostics.
    #[default]
    Degrade,
    /// Fail the whole analysis.
    Error,
}

impl FailurePolicy {
    /// Returns the policy as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Degrade => "degrade",
            Self::Error => "error",
        }
    }
}

/// A static-analysis tool that scans code text.
pub trait ExternalAnalyzer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Scan `code` and return issues in the tool's own order.
    fn analyze(&self, code: &str) -> ExternalResult<Vec<ExternalIssue>>;
}

/// Runs an external program, feeding code on stdin and parsing JSON from stdout.
///
/// A non-zero exit status is not a failure: linters conventionally exit
/// non-zero when they report issues. Empty stdout means no issues.
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    program: String,
    args: Vec<String>,
}

impl CommandAnalyzer {
    /// Create an analyzer that runs `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Set the arguments passed to the program.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// The program this analyzer invokes.
    pub fn program(&self) -> &str {
        &self.program
    }

    fn io_error(&self, source: std::io::Error) -> ExternalAnalyzerError {
        ExternalAnalyzerError::Io {
            program: self.program.clone(),
            source,
        }
    }
}

impl ExternalAnalyzer for CommandAnalyzer {
    fn name(&self) -> &str {
        &self.program
    }

    #[tracing::instrument(skip(self, code), fields(program = %self.program, code_len = code.len()))]
    fn analyze(&self, code: &str) -> ExternalResult<Vec<ExternalIssue>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExternalAnalyzerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Feed stdin from a separate thread so a chatty tool can't fill its
        // stdout pipe while we're still blocked writing.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = code.as_bytes().to_vec();
            std::thread::spawn(move || match stdin.write_all(&input) {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                other => other,
            })
        });

        let output = child.wait_with_output().map_err(|e| self.io_error(e))?;
        if let Some(handle) = writer {
            match handle.join() {
                Ok(result) => result.map_err(|e| self.io_error(e))?,
                Err(_) => {
                    return Err(self.io_error(std::io::Error::other("stdin writer panicked")));
                }
            }
        }

        let Some(status) = output.status.code() else {
            return Err(ExternalAnalyzerError::Terminated {
                program: self.program.clone(),
            });
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.stderr.is_empty() {
            tracing::debug!(
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "external analyzer wrote to stderr"
            );
        }

        let issues = parse_issues(&stdout).map_err(|source| {
            ExternalAnalyzerError::MalformedOutput {
                program: self.program.clone(),
                source,
            }
        })?;

        tracing::debug!(status, issues = issues.len(), "external analyzer finished");
        Ok(issues)
    }
}

/// Parse a tool's stdout as a JSON issue array. Blank output is no issues.
fn parse_issues(stdout: &str) -> Result<Vec<ExternalIssue>, serde_json::Error> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(stdout)
}

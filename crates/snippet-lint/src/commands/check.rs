//! Check command: analyze a local file the same way `POST /analyze` does.

use anyhow::{Context, bail};
use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use snippet_lint_core::config::{BackendKind, Config};
use snippet_lint_core::{AnalyzeOptions, Backend, analyze_code};

use super::read_input;

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// File to analyze (`-` for stdin).
    pub file: Utf8PathBuf,

    /// Maximum line length in characters.
    #[arg(long)]
    pub max_line_length: Option<usize>,

    /// Diagnostic backend (overrides config).
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Print only the corrected (truncated) code.
    #[arg(long)]
    pub corrected: bool,
}

/// Analyze a file and report its comments.
///
/// Fails when any comment is produced, unless `--json` or `--corrected`
/// is given.
#[instrument(name = "cmd_check", skip_all, fields(file = %args.file))]
pub fn cmd_check(
    args: CheckArgs,
    global_json: bool,
    config: &Config,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    debug!(file = %args.file, backend = ?args.backend, "executing check command");

    let content = read_input(&args.file, max_input_bytes)?;

    let options = AnalyzeOptions {
        max_line_length: args.max_line_length.unwrap_or_else(|| config.line_length()),
    };
    let backend_kind = args.backend.unwrap_or(config.backend);
    let analyzer = config
        .analyzer_for(backend_kind)
        .context("failed to configure external analyzer")?;
    let backend = match analyzer {
        Some(ref analyzer) => Backend::External {
            analyzer,
            on_failure: config.external.on_failure,
        },
        None => Backend::Rules,
    };

    let report = analyze_code(&content, &options, backend)
        .with_context(|| format!("failed to analyze {}", args.file))?;

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if args.corrected {
        print!("{}", report.corrected_code);
        return Ok(());
    }

    if !report.has_comments() {
        println!("{} {}", "PASS:".green(), args.file);
        return Ok(());
    }

    println!("{}", args.file.bold());
    for comment in &report.comments {
        println!("  {}", comment.yellow());
    }

    bail!("{} has {} comment(s)", args.file, report.comments.len());
}

//! Info command implementation

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use snippet_lint_core::config::{Config, ConfigSources};
use snippet_lint_core::report_schema;
use snippet_lint_core::rules::RULES;
use tracing::{debug, instrument};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    /// Print the JSON Schema of the analysis report instead
    #[arg(long)]
    pub schema: bool,
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    repository: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            repository: env!("CARGO_PKG_REPOSITORY"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

#[derive(Serialize)]
struct ConfigInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    bind: String,
    max_line_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_input_bytes: Option<usize>,
    backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_program: Option<String>,
    on_failure: String,
    rules: Vec<&'static str>,
}

impl ConfigInfo {
    fn from_config(config: &Config, sources: &ConfigSources) -> Self {
        Self {
            config_file: sources.primary_file().map(|p| p.to_string()),
            log_level: config.log_level.as_str().to_string(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            bind: config.bind_addr().to_string(),
            max_line_length: config.line_length(),
            max_input_bytes: config.max_input(),
            backend: config.backend.as_str().to_string(),
            external_program: config.external.program.clone(),
            on_failure: config.external.on_failure.as_str().to_string(),
            rules: RULES.iter().map(|r| r.id).collect(),
        }
    }
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigInfo,
}

/// Print package information and effective configuration.
///
/// With `--schema`, print the JSON Schema of the report returned by
/// `POST /analyze` and `check --json`.
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    args: InfoArgs,
    global_json: bool,
    config: &Config,
    sources: &ConfigSources,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, schema = args.schema, "executing info command");

    if args.schema {
        println!("{}", serde_json::to_string_pretty(&report_schema())?);
        return Ok(());
    }

    let info = FullInfo {
        package: PackageInfo::new(),
        config: ConfigInfo::from_config(config, sources),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{} {}", info.package.name.bold(), info.package.version.green());
    if !info.package.description.is_empty() {
        println!("{}", info.package.description);
    }
    if !info.package.license.is_empty() {
        println!("{}: {}", "License".dimmed(), info.package.license);
    }
    if !info.package.repository.is_empty() {
        println!("{}: {}", "Repository".dimmed(), info.package.repository.cyan());
    }

    println!();
    println!("{}", "Configuration".bold().underline());
    match info.config.config_file {
        Some(ref path) => println!("{}: {}", "Config file".dimmed(), path.cyan()),
        None => println!("{}: {}", "Config file".dimmed(), "none loaded".yellow()),
    }
    println!("{}: {}", "Log level".dimmed(), info.config.log_level);
    if let Some(ref dir) = info.config.log_dir {
        println!("{}: {}", "Log directory".dimmed(), dir);
    }

    println!();
    println!("{}", "Analysis".bold().underline());
    println!("{}: {}", "Bind address".dimmed(), info.config.bind);
    println!("{}: {}", "Max line length".dimmed(), info.config.max_line_length);
    match info.config.max_input_bytes {
        Some(max) => println!("{}: {max} bytes", "Input limit".dimmed()),
        None => println!("{}: {}", "Input limit".dimmed(), "disabled".yellow()),
    }
    println!("{}: {}", "Backend".dimmed(), info.config.backend);
    if let Some(ref program) = info.config.external_program {
        println!(
            "{}: {} (on failure: {})",
            "External program".dimmed(),
            program,
            info.config.on_failure
        );
    }
    println!("{}: {}", "Rules".dimmed(), info.config.rules.join(", "));

    Ok(())
}

//! Configuration loading and discovery.
//!
//! Configuration is merged from, lowest precedence first:
//! 1. Built-in defaults
//! 2. User config in the platform config directory
//!    (`~/.config/snippet-lint/config.<ext>` on Linux)
//! 3. Project config found by walking up from the search root
//! 4. Explicit files (e.g. `--config`)
//! 5. `SNIPPET_LINT_*` environment variables (nested keys use `__`,
//!    e.g. `SNIPPET_LINT_EXTERNAL__PROGRAM=pylint`)
//!
//! # Project config file names
//! - `.snippet-lint.<ext>` (lower precedence)
//! - `snippet-lint.<ext>` (higher precedence)
//!
//! Where `<ext>` is one of: `toml`, `yaml`, `yml`, `json`. Only the closest
//! directory containing a config file contributes. The walk stops at a
//! directory containing `.git` by default.
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use snippet_lint_core::config::ConfigLoader;
//!
//! let cwd = std::env::current_dir().unwrap();
//! let cwd = Utf8PathBuf::try_from(cwd).expect("current directory is not valid UTF-8");
//! let (config, _sources) = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! println!("max line length: {}", config.line_length());
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::external::{CommandAnalyzer, FailurePolicy};
use crate::line_length::DEFAULT_MAX_LINE_LENGTH;

/// Default listen address for `serve`.
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Default maximum input size in bytes (5 MiB).
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;

/// Which backend produces the non-length diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum BackendKind {
    /// Built-in pattern rules.
    #[default]
    Rules,
    /// The configured external tool.
    External,
}

impl BackendKind {
    /// Returns the backend as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rules => "rules",
            Self::External => "external",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for the external analyzer backend.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExternalConfig {
    /// Program to run. Required when `backend = "external"`.
    pub program: Option<String>,
    /// Arguments passed to the program.
    pub args: Vec<String>,
    /// What to do when the program fails.
    pub on_failure: FailurePolicy,
}

/// The configuration for snippet-lint.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for JSONL log files (no file logging if unset).
    pub log_dir: Option<Utf8PathBuf>,
    /// Listen address for the HTTP server (default `127.0.0.1:5000`).
    pub bind: Option<String>,
    /// Maximum line length in characters (default 80).
    pub max_line_length: Option<usize>,
    /// Maximum input size in bytes (default: 5 MiB).
    ///
    /// Omit to use the default. Use `disable_input_limit` to remove the
    /// limit entirely.
    pub max_input_bytes: Option<usize>,
    /// Disable the input size limit entirely.
    pub disable_input_limit: bool,
    /// Diagnostic backend: `rules` (default) or `external`.
    pub backend: BackendKind,
    /// External analyzer settings.
    pub external: ExternalConfig,
}

impl Config {
    /// Effective listen address.
    pub fn bind_addr(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    /// Effective maximum line length.
    pub fn line_length(&self) -> usize {
        self.max_line_length.unwrap_or(DEFAULT_MAX_LINE_LENGTH)
    }

    /// Effective input size limit, or `None` when disabled.
    pub fn max_input(&self) -> Option<usize> {
        if self.disable_input_limit {
            None
        } else {
            Some(self.max_input_bytes.unwrap_or(DEFAULT_MAX_INPUT_BYTES))
        }
    }

    /// Build the external analyzer when `backend` is `external`.
    ///
    /// Returns `Ok(None)` for the rules backend.
    pub fn external_analyzer(&self) -> ConfigResult<Option<CommandAnalyzer>> {
        self.analyzer_for(self.backend)
    }

    /// Build the external analyzer for an explicitly chosen backend.
    pub fn analyzer_for(&self, backend: BackendKind) -> ConfigResult<Option<CommandAnalyzer>> {
        match backend {
            BackendKind::Rules => Ok(None),
            BackendKind::External => {
                let program = self
                    .external
                    .program
                    .as_deref()
                    .ok_or(ConfigError::MissingExternalProgram)?;
                Ok(Some(
                    CommandAnalyzer::new(program).with_args(self.external.args.iter().cloned()),
                ))
            }
        }
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Metadata about which configuration sources were loaded.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigSources {
    /// Project config files found by walking up, ordered low→high precedence.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub project_files: Vec<Utf8PathBuf>,
    /// User config file from the platform config directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_file: Option<Utf8PathBuf>,
    /// Explicit config files loaded (e.g., from `--config`).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigSources {
    /// Returns the highest-precedence config file that was loaded.
    ///
    /// Precedence: explicit files > project files > user file.
    pub fn primary_file(&self) -> Option<&Utf8Path> {
        self.explicit_files
            .last()
            .map(Utf8PathBuf::as_path)
            .or_else(|| self.project_files.last().map(Utf8PathBuf::as_path))
            .or(self.user_file.as_deref())
    }
}

/// Supported configuration file extensions (in order of preference).
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Application name for config directory lookup and config file names.
const APP_NAME: &str = "snippet-lint";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "SNIPPET_LINT_";

/// Builder for loading configuration from multiple sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Starting directory for project config search.
    project_search_root: Option<Utf8PathBuf>,
    /// Whether to include the user config file.
    include_user_config: bool,
    /// Stop searching when we hit a directory containing this file/dir.
    boundary_marker: Option<String>,
    /// Explicit config files to load.
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default settings.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Set the starting directory for project config search.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set whether to include the user config file.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Set a boundary marker to stop directory traversal. Default is `.git`.
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Disable boundary marker (search all the way to filesystem root).
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Add an explicit config file to load.
    ///
    /// Files are loaded in order after discovered files, later ones winning.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration, merging all discovered sources.
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<(Config, ConfigSources)> {
        tracing::debug!("loading configuration");
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let mut sources = ConfigSources::default();

        if self.include_user_config
            && let Some(user_config) = self.find_user_config()
        {
            figment = Self::merge_file(figment, &user_config);
            sources.user_file = Some(user_config);
        }

        if let Some(ref root) = self.project_search_root {
            let project_configs = self.find_project_configs(root);
            for pc in &project_configs {
                figment = Self::merge_file(figment, pc);
            }
            sources.project_files = project_configs;
        }

        for file in &self.explicit_files {
            figment = Self::merge_file(figment, file);
        }
        sources.explicit_files = self.explicit_files;

        // SNIPPET_LINT_MAX_LINE_LENGTH=100, SNIPPET_LINT_EXTERNAL__PROGRAM=pylint
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::info!(
            log_level = config.log_level.as_str(),
            backend = config.backend.as_str(),
            "configuration loaded"
        );
        Ok((config, sources))
    }

    /// Load configuration, returning an error if no config file is found.
    pub fn load_or_error(self) -> ConfigResult<(Config, ConfigSources)> {
        let has_user = self.include_user_config && self.find_user_config().is_some();
        let has_project = self
            .project_search_root
            .as_ref()
            .is_some_and(|root| !self.find_project_configs(root).is_empty());
        let has_explicit = !self.explicit_files.is_empty();

        if !has_user && !has_project && !has_explicit {
            return Err(ConfigError::NotFound);
        }

        self.load()
    }

    /// Find project config files by walking up from `start`.
    ///
    /// Returns the files from the closest directory that has any, dotfiles
    /// before regular files.
    fn find_project_configs(&self, start: &Utf8Path) -> Vec<Utf8PathBuf> {
        let mut current = Some(start.to_path_buf());

        while let Some(dir) = current {
            let mut found = Vec::new();
            for ext in CONFIG_EXTENSIONS {
                let dotfile = dir.join(format!(".{APP_NAME}.{ext}"));
                if dotfile.is_file() {
                    found.push(dotfile);
                }
            }
            for ext in CONFIG_EXTENSIONS {
                let regular = dir.join(format!("{APP_NAME}.{ext}"));
                if regular.is_file() {
                    found.push(regular);
                }
            }

            if !found.is_empty() {
                return found;
            }

            // Checked after config files so a config beside the marker is found.
            if let Some(ref marker) = self.boundary_marker
                && dir.join(marker).exists()
                && dir != start
            {
                break;
            }

            current = dir.parent().map(Utf8Path::to_path_buf);
        }

        Vec::new()
    }

    /// Find the user config file.
    fn find_user_config(&self) -> Option<Utf8PathBuf> {
        let config_dir = user_config_dir()?;
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| config_dir.join(format!("config.{ext}")))
            .find(|path| path.is_file())
    }

    /// Merge a config file into the figment, detecting format from extension.
    fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
        match path.extension() {
            Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
            Some("json") => figment.merge(Json::file_exact(path.as_str())),
            _ => figment.merge(Toml::file_exact(path.as_str())),
        }
    }
}

/// Get the user config directory path.
///
/// Returns `~/.config/snippet-lint/` on Linux,
/// `~/Library/Application Support/snippet-lint/` on macOS.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("", "", APP_NAME)?;
    Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serializes tests that mutate environment variables via `set_var`/`remove_var`.
    static TEST_ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Take the env mutex and clear any `SNIPPET_LINT_*` variables, so
    /// neither other tests nor the invoking shell leak into the loader.
    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        let guard = TEST_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        clear_prefixed_env();
        guard
    }

    #[allow(unsafe_code)]
    fn clear_prefixed_env() {
        let keys: Vec<_> = std::env::vars_os()
            .map(|(key, _)| key)
            .filter(|key| key.to_string_lossy().starts_with(ENV_PREFIX))
            .collect();
        for key in keys {
            // SAFETY: only called while holding TEST_ENV_MUTEX.
            unsafe { std::env::remove_var(key) };
        }
    }

    fn load_file(contents: &str, name: &str) -> Config {
        let _lock = env_lock();
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(name);
        fs::write(&path, contents).unwrap();
        let path = Utf8PathBuf::try_from(path).unwrap();
        let (config, _sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_file(&path)
            .load()
            .unwrap();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.log_dir.is_none());
        assert_eq!(config.bind_addr(), DEFAULT_BIND);
        assert_eq!(config.line_length(), 80);
        assert_eq!(config.max_input(), Some(DEFAULT_MAX_INPUT_BYTES));
        assert_eq!(config.backend, BackendKind::Rules);
    }

    #[test]
    fn test_loader_builds_with_defaults() {
        let _lock = env_lock();
        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .load()
            .unwrap();
        assert_eq!(config.line_length(), 80);
        assert!(sources.primary_file().is_none());
    }

    #[test]
    fn test_toml_file_overrides_default() {
        let config = load_file(
            "log_level = \"debug\"\nmax_line_length = 100\nbind = \"0.0.0.0:8080\"\n",
            "config.toml",
        );
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.line_length(), 100);
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_yaml_external_section() {
        let config = load_file(
            "backend: external\nexternal:\n  program: pylint\n  args: [\"--output-format=json\", \"--from-stdin\", \"snippet.py\"]\n  on_failure: error\n",
            "config.yaml",
        );
        assert_eq!(config.backend, BackendKind::External);
        assert_eq!(config.external.program.as_deref(), Some("pylint"));
        assert_eq!(config.external.args.len(), 3);
        assert_eq!(config.external.on_failure, FailurePolicy::Error);

        let analyzer = config.external_analyzer().unwrap().unwrap();
        assert_eq!(analyzer.program(), "pylint");
    }

    #[test]
    fn test_json_config() {
        let config = load_file(r#"{"max_line_length": 120}"#, "config.json");
        assert_eq!(config.line_length(), 120);
    }

    #[test]
    fn test_later_file_overrides_earlier() {
        let _lock = env_lock();
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("first.toml");
        let second = tmp.path().join("second.toml");
        fs::write(&first, "max_line_length = 60\nlog_level = \"warn\"\n").unwrap();
        fs::write(&second, "max_line_length = 100\n").unwrap();
        let first = Utf8PathBuf::try_from(first).unwrap();
        let second = Utf8PathBuf::try_from(second).unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_file(&first)
            .with_file(&second)
            .load()
            .unwrap();

        assert_eq!(config.line_length(), 100);
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(sources.primary_file(), Some(second.as_path()));
    }

    #[test]
    fn test_project_config_discovery() {
        let _lock = env_lock();
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join(".snippet-lint.toml"), "max_line_length = 99\n").unwrap();
        let nested = Utf8PathBuf::try_from(nested).unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .with_project_search(&nested)
            .load()
            .unwrap();

        assert_eq!(config.line_length(), 99);
        assert_eq!(sources.project_files.len(), 1);
    }

    #[test]
    fn test_regular_file_overrides_dotfile() {
        let _lock = env_lock();
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".snippet-lint.toml"), "max_line_length = 60\n").unwrap();
        fs::write(tmp.path().join("snippet-lint.toml"), "max_line_length = 70\n").unwrap();
        let root = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .with_project_search(&root)
            .load()
            .unwrap();

        assert_eq!(config.line_length(), 70);
        assert_eq!(sources.project_files.len(), 2);
    }

    #[test]
    fn test_boundary_marker_stops_search() {
        let _lock = env_lock();
        let tmp = TempDir::new().unwrap();
        let child = tmp.path().join("child");
        let work = child.join("work");
        fs::create_dir_all(&work).unwrap();
        fs::write(tmp.path().join(".snippet-lint.toml"), "max_line_length = 10\n").unwrap();
        fs::create_dir(child.join(".git")).unwrap();
        let work = Utf8PathBuf::try_from(work).unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_boundary_marker(".git")
            .with_project_search(&work)
            .load()
            .unwrap();

        assert_eq!(config.line_length(), 80);
        assert!(sources.project_files.is_empty());
    }

    #[test]
    fn test_load_or_error_fails_when_no_config() {
        let _lock = env_lock();
        let result = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .load_or_error();
        assert!(matches!(result, Err(ConfigError::NotFound)));
    }

    #[test]
    fn test_invalid_value_is_deserialize_error() {
        let _lock = env_lock();
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "max_line_length = \"long\"\n").unwrap();
        let path = Utf8PathBuf::try_from(path).unwrap();

        let result = ConfigLoader::new()
            .with_user_config(false)
            .with_file(&path)
            .load();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn disable_input_limit_overrides_max_bytes() {
        let config = load_file(
            "max_input_bytes = 1024\ndisable_input_limit = true\n",
            "config.toml",
        );
        assert_eq!(config.max_input_bytes, Some(1024));
        assert_eq!(config.max_input(), None);
    }

    #[test]
    fn external_backend_without_program_errors() {
        let config = Config {
            backend: BackendKind::External,
            ..Default::default()
        };
        assert!(matches!(
            config.external_analyzer(),
            Err(ConfigError::MissingExternalProgram)
        ));
        assert!(config.analyzer_for(BackendKind::Rules).unwrap().is_none());
    }

    #[test]
    #[allow(unsafe_code)]
    fn test_env_var_overrides_file_config() {
        let _lock = env_lock();

        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        fs::write(&config_path, "max_line_length = 60\n").unwrap();
        let config_path = Utf8PathBuf::try_from(config_path).unwrap();

        // SAFETY: test environment; the mutex serializes env access across tests.
        unsafe {
            std::env::set_var("SNIPPET_LINT_MAX_LINE_LENGTH", "72");
            std::env::set_var("SNIPPET_LINT_EXTERNAL__PROGRAM", "flake8");
        }

        let (config, _sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_file(&config_path)
            .load()
            .unwrap();

        // SAFETY: Cleanup after test.
        unsafe {
            std::env::remove_var("SNIPPET_LINT_MAX_LINE_LENGTH");
            std::env::remove_var("SNIPPET_LINT_EXTERNAL__PROGRAM");
        }

        assert_eq!(config.line_length(), 72);
        assert_eq!(config.external.program.as_deref(), Some("flake8"));
    }

    #[test]
    #[allow(unsafe_code)]
    fn test_leftover_env_cannot_mask_invalid_file() {
        {
            let _lock = env_lock();
            // SAFETY: the mutex serializes env access across tests.
            unsafe { std::env::set_var("SNIPPET_LINT_MAX_LINE_LENGTH", "72") };
        }

        let _lock = env_lock();
        assert!(std::env::var_os("SNIPPET_LINT_MAX_LINE_LENGTH").is_none());

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "max_line_length = \"long\"\n").unwrap();
        let path = Utf8PathBuf::try_from(path).unwrap();

        let result = ConfigLoader::new()
            .with_user_config(false)
            .with_file(&path)
            .load();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn test_yaml_deserializes_external_section() {
        let config: Config =
            serde_yaml::from_str("backend: external\nexternal:\n  on_failure: error\n").unwrap();
        assert_eq!(config.backend, BackendKind::External);
        assert_eq!(config.external.on_failure, FailurePolicy::Error);
        assert!(config.external.program.is_none());
        assert!(config.external.args.is_empty());
    }

    #[test]
    fn test_user_config_dir() {
        if let Some(path) = user_config_dir() {
            assert!(path.as_str().contains("snippet-lint"));
        }
    }
}

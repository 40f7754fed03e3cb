use super::run::{normalize_base_url, ReporterKind, RunConfig, TracePolicy, Workers};
use crate::error::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment keys read while resolving a [`RunConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEnv {
    /// Set on CI runners; switches the defaults.
    Ci,
    /// Path of a TOML config file.
    ConfigFile,
    BaseUrl,
    ApiKey,
    FullyParallel,
    ForbidOnly,
    Retries,
    Workers,
    Trace,
    /// Comma-separated reporter list.
    Reporter,
    OutputDir,
    TimeoutMs,
    AssetPath,
}

impl ConfigEnv {
    pub const ALL: [ConfigEnv; 13] = [
        ConfigEnv::Ci,
        ConfigEnv::ConfigFile,
        ConfigEnv::BaseUrl,
        ConfigEnv::ApiKey,
        ConfigEnv::FullyParallel,
        ConfigEnv::ForbidOnly,
        ConfigEnv::Retries,
        ConfigEnv::Workers,
        ConfigEnv::Trace,
        ConfigEnv::Reporter,
        ConfigEnv::OutputDir,
        ConfigEnv::TimeoutMs,
        ConfigEnv::AssetPath,
    ];

    /// Returns the canonical environment variable name.
    pub const fn as_str(self) -> &'static str {
        match self {
            ConfigEnv::Ci => "CI",
            ConfigEnv::ConfigFile => "PETSTORE_CONFIG",
            ConfigEnv::BaseUrl => "PETSTORE_BASE_URL",
            ConfigEnv::ApiKey => "PETSTORE_API_KEY",
            ConfigEnv::FullyParallel => "PETSTORE_FULLY_PARALLEL",
            ConfigEnv::ForbidOnly => "PETSTORE_FORBID_ONLY",
            ConfigEnv::Retries => "PETSTORE_RETRIES",
            ConfigEnv::Workers => "PETSTORE_WORKERS",
            ConfigEnv::Trace => "PETSTORE_TRACE",
            ConfigEnv::Reporter => "PETSTORE_REPORTER",
            ConfigEnv::OutputDir => "PETSTORE_OUTPUT_DIR",
            ConfigEnv::TimeoutMs => "PETSTORE_TIMEOUT_MS",
            ConfigEnv::AssetPath => "PETSTORE_ASSET_PATH",
        }
    }
}

/// Whether the `CI` variable marks this run as a CI run.
pub fn is_ci<F>(lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(ConfigEnv::Ci.as_str()) {
        Some(value) => {
            let v = value.trim();
            !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false")
        }
        None => false,
    }
}

/// On-disk TOML overlay. Every key is optional; unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub fully_parallel: Option<bool>,
    pub forbid_only: Option<bool>,
    pub retries: Option<u32>,
    /// `"auto"`, `"N%"`, or an integer (as string or number).
    pub workers: Option<toml::Value>,
    pub trace: Option<TracePolicy>,
    pub reporters: Option<Vec<ReporterKind>>,
    pub output_dir: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
    pub asset_path: Option<PathBuf>,
    pub grep: Option<String>,
    pub grep_invert: Option<String>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply(self, path: &Path, config: &mut RunConfig) -> Result<(), ConfigError> {
        let invalid = |key: &'static str, message: String| ConfigError::Value {
            path: path.to_path_buf(),
            key,
            message,
        };
        if let Some(url) = self.base_url {
            config.base_url = normalize_base_url(&url)?;
        }
        if let Some(key) = self.api_key {
            config.api_key = key;
        }
        if let Some(v) = self.fully_parallel {
            config.fully_parallel = v;
        }
        if let Some(v) = self.forbid_only {
            config.forbid_only = v;
        }
        if let Some(v) = self.retries {
            config.retries = v;
        }
        if let Some(raw) = self.workers {
            let text = match raw {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                other => return Err(invalid("workers", format!("unsupported value {other}"))),
            };
            config.workers = text.parse::<Workers>().map_err(|m| invalid("workers", m))?;
        }
        if let Some(v) = self.trace {
            config.trace = v;
        }
        if let Some(v) = self.reporters {
            config.reporters = v;
        }
        if let Some(v) = self.output_dir {
            config.output_dir = v;
        }
        if let Some(ms) = self.timeout_ms {
            if ms == 0 {
                return Err(invalid("timeout_ms", "must be greater than zero".to_string()));
            }
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(v) = self.asset_path {
            config.asset_path = v;
        }
        if let Some(v) = self.grep {
            config.grep = Some(v);
        }
        if let Some(v) = self.grep_invert {
            config.grep_invert = Some(v);
        }
        Ok(())
    }
}

/// Command-line overrides, applied last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub fully_parallel: Option<bool>,
    pub forbid_only: Option<bool>,
    pub retries: Option<u32>,
    pub workers: Option<Workers>,
    pub trace: Option<TracePolicy>,
    pub reporters: Vec<ReporterKind>,
    pub output_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub asset_path: Option<PathBuf>,
    pub grep: Option<String>,
    pub grep_invert: Option<String>,
}

impl ConfigOverrides {
    fn apply(self, config: &mut RunConfig) -> Result<(), ConfigError> {
        if let Some(url) = self.base_url {
            config.base_url = normalize_base_url(&url)?;
        }
        if let Some(key) = self.api_key {
            config.api_key = key;
        }
        if let Some(v) = self.fully_parallel {
            config.fully_parallel = v;
        }
        if let Some(v) = self.forbid_only {
            config.forbid_only = v;
        }
        if let Some(v) = self.retries {
            config.retries = v;
        }
        if let Some(v) = self.workers {
            config.workers = v;
        }
        if let Some(v) = self.trace {
            config.trace = v;
        }
        if !self.reporters.is_empty() {
            config.reporters = self.reporters;
        }
        if let Some(v) = self.output_dir {
            config.output_dir = v;
        }
        if let Some(v) = self.timeout {
            config.timeout = v;
        }
        if let Some(v) = self.asset_path {
            config.asset_path = v;
        }
        if let Some(v) = self.grep {
            config.grep = Some(v);
        }
        if let Some(v) = self.grep_invert {
            config.grep_invert = Some(v);
        }
        Ok(())
    }
}

impl RunConfig {
    /// Resolve the configuration from the process environment.
    pub fn load(
        config_path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        Self::load_with(config_path, overrides, |name| std::env::var(name).ok())
    }

    /// Resolve the configuration using `lookup` in place of `std::env::var`.
    pub fn load_with<F>(
        config_path: Option<&Path>,
        overrides: &ConfigOverrides,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = RunConfig::defaults(is_ci(&lookup));

        let file_path = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => read_nonempty(&lookup, ConfigEnv::ConfigFile)?.map(PathBuf::from),
        };
        if let Some(path) = file_path {
            ConfigFile::load(&path)?.apply(&path, &mut config)?;
        }

        apply_env(&lookup, &mut config)?;
        overrides.clone().apply(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that no single layer can.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for pattern in [&self.grep, &self.grep_invert].into_iter().flatten() {
            Regex::new(pattern).map_err(|source| ConfigError::Grep {
                pattern: pattern.clone(),
                source,
            })?;
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Env {
                name: ConfigEnv::TimeoutMs.as_str().to_string(),
                message: "timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn apply_env<F>(lookup: &F, config: &mut RunConfig) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = read_nonempty(lookup, ConfigEnv::BaseUrl)? {
        config.base_url = normalize_base_url(&url)?;
    }
    if let Some(key) = read_nonempty(lookup, ConfigEnv::ApiKey)? {
        config.api_key = key;
    }
    if let Some(v) = read_nonempty(lookup, ConfigEnv::FullyParallel)? {
        config.fully_parallel = parse_bool(ConfigEnv::FullyParallel, &v)?;
    }
    if let Some(v) = read_nonempty(lookup, ConfigEnv::ForbidOnly)? {
        config.forbid_only = parse_bool(ConfigEnv::ForbidOnly, &v)?;
    }
    if let Some(v) = read_nonempty(lookup, ConfigEnv::Retries)? {
        config.retries = v
            .trim()
            .parse()
            .map_err(|_| env_error(ConfigEnv::Retries, "must be a non-negative integer"))?;
    }
    if let Some(v) = read_nonempty(lookup, ConfigEnv::Workers)? {
        config.workers = v
            .parse()
            .map_err(|m: String| env_error(ConfigEnv::Workers, &m))?;
    }
    if let Some(v) = read_nonempty(lookup, ConfigEnv::Trace)? {
        config.trace = v.parse().map_err(|m: String| env_error(ConfigEnv::Trace, &m))?;
    }
    if let Some(v) = read_nonempty(lookup, ConfigEnv::Reporter)? {
        config.reporters = v
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<ReporterKind>, String>>()
            .map_err(|m| env_error(ConfigEnv::Reporter, &m))?;
    }
    if let Some(v) = read_nonempty(lookup, ConfigEnv::OutputDir)? {
        config.output_dir = PathBuf::from(v);
    }
    if let Some(v) = read_nonempty(lookup, ConfigEnv::TimeoutMs)? {
        let ms: u64 = v
            .trim()
            .parse()
            .map_err(|_| env_error(ConfigEnv::TimeoutMs, "must be a positive integer"))?;
        if ms == 0 {
            return Err(env_error(ConfigEnv::TimeoutMs, "must be greater than zero"));
        }
        config.timeout = Duration::from_millis(ms);
    }
    if let Some(v) = read_nonempty(lookup, ConfigEnv::AssetPath)? {
        config.asset_path = PathBuf::from(v);
    }
    Ok(())
}

fn env_error(key: ConfigEnv, message: &str) -> ConfigError {
    ConfigError::Env {
        name: key.as_str().to_string(),
        message: message.to_string(),
    }
}

/// Reads a variable and rejects values that are set but blank.
fn read_nonempty<F>(lookup: &F, key: ConfigEnv) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key.as_str()) {
        Some(value) if value.trim().is_empty() => Err(env_error(key, "must not be empty")),
        other => Ok(other),
    }
}

fn parse_bool(key: ConfigEnv, raw: &str) -> Result<bool, ConfigError> {
    let v = raw.trim();
    if v.eq_ignore_ascii_case("true") || v == "1" || v.eq_ignore_ascii_case("yes") {
        return Ok(true);
    }
    if v.eq_ignore_ascii_case("false") || v == "0" || v.eq_ignore_ascii_case("no") {
        return Ok(false);
    }
    Err(env_error(key, "must be 1, 0, true, false, yes or no"))
}

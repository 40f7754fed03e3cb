//! Structured logging setup.
//!
//! Logs go to stderr so stdout stays free for the `list` and `github`
//! reporters. Configuration comes from the environment:
//!
//! | variable                | values                              | default  |
//! |-------------------------|-------------------------------------|----------|
//! | `PETSTORE_LOG_LEVEL`    | trace / debug / info / warn / error | `warn`   |
//! | `PETSTORE_LOG_FORMAT`   | json / pretty                       | `pretty` |
//! | `PETSTORE_LOG_TARGETS`  | extra `EnvFilter` directives, comma separated | none |
//! | `PETSTORE_LOG_LOCATION` | include file:line (`true`/`false`)  | `false`  |
//!
//! `RUST_LOG`, when set, replaces the level entirely.

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for CI log shipping, pretty for terminals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
    pub format: LogFormat,
    pub target_filter: Option<String>,
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            format: LogFormat::Pretty,
            target_filter: None,
            include_location: false,
        }
    }
}

fn parse_level(s: &str) -> Level {
    match s.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    }
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            level: lookup("PETSTORE_LOG_LEVEL").map_or(defaults.level, |s| parse_level(&s)),
            format: lookup("PETSTORE_LOG_FORMAT").map_or(defaults.format, |s| LogFormat::parse(&s)),
            target_filter: lookup("PETSTORE_LOG_TARGETS").filter(|s| !s.trim().is_empty()),
            include_location: lookup("PETSTORE_LOG_LOCATION")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.include_location),
        }
    }

    fn filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()));
        // connection pool chatter is never interesting at debug
        if let Ok(directive) = "hyper_util=warn".parse() {
            filter = filter.add_directive(directive);
        }
        if let Some(targets) = &self.target_filter {
            for directive in targets.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                match directive.parse() {
                    Ok(directive) => filter = filter.add_directive(directive),
                    Err(_) => eprintln!("Warning: Invalid log filter directive: {directive}"),
                }
            }
        }
        filter
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(config.filter())
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_quiet_and_pretty() {
        let config = LogConfig::from_lookup(|_| None);
        assert_eq!(config, LogConfig::default());
        assert_eq!(config.level, Level::WARN);
    }

    #[test]
    fn env_selects_json_and_level() {
        let vars: HashMap<&str, &str> = [
            ("PETSTORE_LOG_FORMAT", "JSON"),
            ("PETSTORE_LOG_LEVEL", "debug"),
            ("PETSTORE_LOG_TARGETS", " "),
            ("PETSTORE_LOG_LOCATION", "true"),
        ]
        .into_iter()
        .collect();
        let config = LogConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.target_filter, None);
        assert!(config.include_location);
    }

    #[test]
    fn unknown_values_fall_back() {
        assert_eq!(LogFormat::parse("xml"), LogFormat::Pretty);
        assert_eq!(parse_level("loud"), Level::WARN);
    }
}

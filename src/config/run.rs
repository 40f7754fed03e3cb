use crate::error::ConfigError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Public Swagger pet-store origin.
pub const DEFAULT_BASE_URL: &str = "https://petstore.swagger.io/v2/";

/// Static placeholder key; the public service accepts any value.
pub const DEFAULT_API_KEY: &str = "a1b2c33d4e5f6g7h8i9jakblc";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// When to record and keep a trace of an attempt's HTTP exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TracePolicy {
    /// Never record.
    Off,
    /// Record and keep every attempt.
    On,
    /// Record only the first retry (attempt index 1).
    #[default]
    OnFirstRetry,
    /// Record every retry (attempt index >= 1).
    OnAllRetries,
    /// Record every attempt, keep only failed ones.
    RetainOnFailure,
}

impl TracePolicy {
    /// Whether attempt `attempt` (0-based) should record a trace at all.
    pub fn records(self, attempt: u32) -> bool {
        match self {
            TracePolicy::Off => false,
            TracePolicy::On | TracePolicy::RetainOnFailure => true,
            TracePolicy::OnFirstRetry => attempt == 1,
            TracePolicy::OnAllRetries => attempt >= 1,
        }
    }

    /// Whether a recorded trace is written out once the attempt finished.
    pub fn keeps(self, attempt: u32, failed: bool) -> bool {
        match self {
            TracePolicy::RetainOnFailure => failed,
            other => other.records(attempt),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            TracePolicy::Off => "off",
            TracePolicy::On => "on",
            TracePolicy::OnFirstRetry => "on-first-retry",
            TracePolicy::OnAllRetries => "on-all-retries",
            TracePolicy::RetainOnFailure => "retain-on-failure",
        }
    }
}

impl FromStr for TracePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "off" => Ok(TracePolicy::Off),
            "on" => Ok(TracePolicy::On),
            "on-first-retry" => Ok(TracePolicy::OnFirstRetry),
            "on-all-retries" => Ok(TracePolicy::OnAllRetries),
            "retain-on-failure" => Ok(TracePolicy::RetainOnFailure),
            other => Err(format!(
                "unknown trace policy {other:?} (expected off, on, on-first-retry, on-all-retries, retain-on-failure)"
            )),
        }
    }
}

impl fmt::Display for TracePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output channels for run results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ReporterKind {
    /// One line per case on stdout.
    List,
    /// GitHub Actions workflow annotations.
    Github,
    /// `report.json` in the output directory.
    Json,
    /// `report/index.html` in the output directory.
    Html,
}

impl FromStr for ReporterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" => Ok(ReporterKind::List),
            "github" => Ok(ReporterKind::Github),
            "json" => Ok(ReporterKind::Json),
            "html" => Ok(ReporterKind::Html),
            other => Err(format!(
                "unknown reporter {other:?} (expected list, github, json, html)"
            )),
        }
    }
}

/// How many cases may run concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workers {
    /// Half of the available parallelism, at least one.
    Auto,
    Fixed(NonZeroUsize),
    /// Percentage of the available parallelism, at least one.
    Percent(u8),
}

impl Workers {
    /// Resolve to a concrete worker count given the machine's parallelism.
    pub fn resolve(self, available: usize) -> usize {
        let available = available.max(1);
        match self {
            Workers::Auto => (available / 2).max(1),
            Workers::Fixed(n) => n.get(),
            Workers::Percent(p) => (available * usize::from(p) / 100).max(1),
        }
    }

    /// Resolve against `std::thread::available_parallelism`.
    pub fn resolve_for_host(self) -> usize {
        let available = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        self.resolve(available)
    }
}

impl FromStr for Workers {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Workers::Auto);
        }
        if let Some(pct) = trimmed.strip_suffix('%') {
            let value: u8 = pct
                .trim()
                .parse()
                .map_err(|_| format!("invalid worker percentage {trimmed:?}"))?;
            if value == 0 || value > 100 {
                return Err(format!("worker percentage must be 1-100%, got {trimmed:?}"));
            }
            return Ok(Workers::Percent(value));
        }
        let count: usize = trimmed
            .parse()
            .map_err(|_| format!("workers must be auto, a positive integer or N%, got {trimmed:?}"))?;
        NonZeroUsize::new(count)
            .map(Workers::Fixed)
            .ok_or_else(|| "workers must be greater than zero".to_string())
    }
}

impl fmt::Display for Workers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workers::Auto => f.write_str("auto"),
            Workers::Fixed(n) => write!(f, "{n}"),
            Workers::Percent(p) => write!(f, "{p}%"),
        }
    }
}

/// Fully resolved run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Base origin, always ending in `/` so relative paths resolve beneath it.
    pub base_url: Url,
    /// Value of the `api_key` header attached to every request.
    pub api_key: String,
    /// Run every case independently instead of serializing within a group.
    pub fully_parallel: bool,
    /// Reject the run when any case is focused.
    pub forbid_only: bool,
    /// Extra attempts for a failing case.
    pub retries: u32,
    pub workers: Workers,
    pub trace: TracePolicy,
    pub reporters: Vec<ReporterKind>,
    /// Root for traces and file reports.
    pub output_dir: PathBuf,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Image uploaded by the upload case.
    pub asset_path: PathBuf,
    /// Only run cases whose full title matches.
    pub grep: Option<String>,
    /// Skip cases whose full title matches.
    pub grep_invert: Option<String>,
}

impl RunConfig {
    /// Defaults, switched by whether the run happens on CI.
    pub fn defaults(ci: bool) -> Self {
        Self {
            base_url: default_base_url(),
            api_key: DEFAULT_API_KEY.to_string(),
            fully_parallel: true,
            forbid_only: ci,
            retries: if ci { 2 } else { 0 },
            workers: if ci {
                Workers::Fixed(NonZeroUsize::MIN)
            } else {
                Workers::Auto
            },
            trace: TracePolicy::OnFirstRetry,
            reporters: if ci {
                vec![ReporterKind::Github]
            } else {
                vec![ReporterKind::List, ReporterKind::Html]
            },
            output_dir: PathBuf::from("target/petstore-e2e"),
            timeout: DEFAULT_TIMEOUT,
            asset_path: PathBuf::from("tests/data/dog.jpeg"),
            grep: None,
            grep_invert: None,
        }
    }

    /// Local defaults pointed at a different origin; convenient in tests.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let mut config = Self::defaults(false);
        config.base_url = normalize_base_url(base_url)?;
        Ok(config)
    }

    /// Directory traces are written to.
    pub fn trace_dir(&self) -> PathBuf {
        self.output_dir.join("traces")
    }
}

fn default_base_url() -> Url {
    // DEFAULT_BASE_URL is a constant absolute url with a trailing slash.
    #[allow(clippy::expect_used)]
    Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL must parse")
}

/// Parse a base origin and make sure its path ends with `/`.
///
/// Without the trailing slash `Url::join("pet")` would replace the last path
/// segment (`/v2` -> `/pet`) instead of appending to it.
pub fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let mut url = Url::parse(trimmed).map_err(|e| ConfigError::BaseUrl {
        url: trimmed.to_string(),
        message: e.to_string(),
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::BaseUrl {
            url: trimmed.to_string(),
            message: format!("unsupported scheme {:?}", url.scheme()),
        });
    }
    if url.cannot_be_a_base() {
        return Err(ConfigError::BaseUrl {
            url: trimmed.to_string(),
            message: "url cannot be a base".to_string(),
        });
    }
    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

//! Error types.
//!
//! The suite distinguishes four failure families:
//!
//! - [`ConfigError`] - the run configuration could not be resolved
//! - [`ClientError`] - a request never produced a response (transport, url, decode)
//! - [`CaseError`] - a case attempt failed (assertion, transport, timeout, panic)
//! - [`RunError`] - the run as a whole could not proceed or report
//!
//! An HTTP error status is never a [`ClientError`]: the client hands every
//! response back as a [`crate::client::Reply`] and the case decides what it
//! expected.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is invalid: {message}")]
    Env { name: String, message: String },

    #[error("{key} in {} is invalid: {message}", .path.display())]
    Value {
        path: PathBuf,
        key: &'static str,
        message: String,
    },

    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("base url {url:?} is not a valid absolute http(s) url: {message}")]
    BaseUrl { url: String, message: String },

    #[error("invalid grep pattern {pattern:?}: {source}")]
    Grep {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("cannot resolve {path:?} against base url: {source}")]
    Url {
        path: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{method} {url} failed: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cannot encode {what} request body: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid multipart payload: {0}")]
    Multipart(#[source] reqwest::Error),

    #[error("cannot decode {what} from {method} {url}: {source}")]
    Decode {
        what: &'static str,
        method: String,
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Why a case attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    /// An expectation on a response did not hold.
    #[error("{step}: {message}")]
    Assertion { step: String, message: String },

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("attempt timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("case panicked: {0}")]
    Panicked(String),

    #[error("setup failed: {0}")]
    Setup(String),
}

impl CaseError {
    pub fn assertion(step: impl Into<String>, message: impl Into<String>) -> Self {
        CaseError::Assertion {
            step: step.into(),
            message: message.into(),
        }
    }

    /// Short machine-friendly classification used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            CaseError::Assertion { .. } => "assertion",
            CaseError::Client(_) => "transport",
            CaseError::Timeout(_) => "timeout",
            CaseError::Panicked(_) => "panic",
            CaseError::Setup(_) => "setup",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(
        "focused cases are forbidden in this run (forbid_only is set): {}",
        .0.join(", ")
    )]
    FocusedCases(Vec<String>),

    #[error("no cases matched the selection")]
    NothingSelected,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render {what}: {message}")]
    Render { what: &'static str, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assertion_display_names_the_step() {
        let err = CaseError::assertion("create pet", "expected success, got 500");
        assert_eq!(err.to_string(), "create pet: expected success, got 500");
        assert_eq!(err.kind(), "assertion");
    }

    #[test]
    fn timeout_display_uses_millis() {
        let err = CaseError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "attempt timed out after 1500ms");
    }

    #[test]
    fn focused_cases_lists_offenders() {
        let err = RunError::FocusedCases(vec!["TestId: 1001".into(), "TestId: 1002".into()]);
        assert!(err.to_string().ends_with("TestId: 1001, TestId: 1002"));
    }
}

//! # Report Module
//!
//! Reporters receive run events and render them somewhere.
//!
//! | kind     | output                                     |
//! |----------|--------------------------------------------|
//! | `list`   | one line per case and a summary on stdout  |
//! | `github` | workflow annotations on stdout             |
//! | `json`   | `<output_dir>/report.json`                 |
//! | `html`   | `<output_dir>/report/index.html`           |
//!
//! Several reporters can be active at once; [`Reporters`] fans events out to
//! all of them in configuration order.

mod github;
mod html;
mod json;
mod list;

pub use github::GithubReporter;
pub use html::HtmlReporter;
pub use json::JsonReporter;
pub use list::ListReporter;

use crate::config::{ReporterKind, RunConfig};
use crate::error::RunError;
use crate::runner::{CaseResult, RunReport};
use crate::suite::Case;
use std::path::Path;

/// Receives run events in order: begin, one end per case, end.
pub trait Reporter: Send {
    fn on_begin(&mut self, _config: &RunConfig, _cases: &[Case]) -> Result<(), RunError> {
        Ok(())
    }

    fn on_case_end(&mut self, _result: &CaseResult) -> Result<(), RunError> {
        Ok(())
    }

    fn on_end(&mut self, config: &RunConfig, report: &RunReport) -> Result<(), RunError>;
}

/// Fan-out over the configured reporters.
#[derive(Default)]
pub struct Reporters {
    inner: Vec<Box<dyn Reporter>>,
}

impl Reporters {
    pub fn from_config(config: &RunConfig) -> Self {
        let inner = config
            .reporters
            .iter()
            .map(|kind| -> Box<dyn Reporter> {
                match kind {
                    ReporterKind::List => Box::new(ListReporter::stdout()),
                    ReporterKind::Github => Box::new(GithubReporter::stdout()),
                    ReporterKind::Json => Box::new(JsonReporter),
                    ReporterKind::Html => Box::new(HtmlReporter),
                }
            })
            .collect();
        Self { inner }
    }

    pub fn push(&mut self, reporter: Box<dyn Reporter>) {
        self.inner.push(reporter);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Reporter for Reporters {
    fn on_begin(&mut self, config: &RunConfig, cases: &[Case]) -> Result<(), RunError> {
        self.inner
            .iter_mut()
            .try_for_each(|reporter| reporter.on_begin(config, cases))
    }

    fn on_case_end(&mut self, result: &CaseResult) -> Result<(), RunError> {
        self.inner
            .iter_mut()
            .try_for_each(|reporter| reporter.on_case_end(result))
    }

    fn on_end(&mut self, config: &RunConfig, report: &RunReport) -> Result<(), RunError> {
        self.inner
            .iter_mut()
            .try_for_each(|reporter| reporter.on_end(config, report))
    }
}

pub(crate) fn write_file(path: &Path, contents: &[u8]) -> Result<(), RunError> {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)
    };
    write().map_err(|source| RunError::Write {
        path: path.to_path_buf(),
        source,
    })
}

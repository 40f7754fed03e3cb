use super::Reporter;
use crate::config::RunConfig;
use crate::error::RunError;
use crate::runner::{CaseResult, Outcome, RunReport};
use crate::suite::Case;
use std::io::Write;

/// Console reporter: a line per finished case, then the summary.
pub struct ListReporter {
    out: Box<dyn Write + Send>,
}

impl ListReporter {
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    fn line(&mut self, line: &str) -> Result<(), RunError> {
        writeln!(self.out, "{line}").map_err(|source| RunError::Write {
            path: "<stdout>".into(),
            source,
        })
    }
}

fn marker(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Passed => "ok",
        Outcome::Flaky => "flaky",
        Outcome::Failed => "FAILED",
        Outcome::Skipped => "skip",
    }
}

pub(crate) fn case_line(result: &CaseResult) -> String {
    let mut line = format!(
        "  {:<6} {} ({}ms)",
        marker(result.outcome),
        result.title,
        result.duration_ms
    );
    if result.retries_used() > 0 {
        line.push_str(&format!(" [retries: {}]", result.retries_used()));
    }
    if result.outcome == Outcome::Failed {
        if let Some(error) = result.last_error() {
            line.push_str(&format!("\n         {error}"));
        }
    }
    line
}

impl Reporter for ListReporter {
    fn on_begin(&mut self, config: &RunConfig, cases: &[Case]) -> Result<(), RunError> {
        self.line(&format!("Running {} cases against {}", cases.len(), config.base_url))
    }

    fn on_case_end(&mut self, result: &CaseResult) -> Result<(), RunError> {
        self.line(&case_line(result))
    }

    fn on_end(&mut self, _config: &RunConfig, report: &RunReport) -> Result<(), RunError> {
        self.line(&format!("\n{} in {}ms", report.summary, report.duration_ms))
    }
}

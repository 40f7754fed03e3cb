use super::Reporter;
use crate::config::RunConfig;
use crate::error::RunError;
use crate::runner::{CaseResult, RunReport};
use std::io::Write;

/// GitHub Actions workflow commands: `::error` for failed cases,
/// `::warning` for flaky ones.
pub struct GithubReporter {
    out: Box<dyn Write + Send>,
}

impl GithubReporter {
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }
}

/// Workflow command data escaping.
fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Workflow command property escaping; `:` and `,` delimit properties.
fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

pub(crate) fn annotations(report: &RunReport) -> Vec<String> {
    let annotate = |level: &str, result: &CaseResult, fallback: &str| {
        format!(
            "::{level} title={}::{}",
            escape_property(&result.title),
            escape_data(result.last_error().unwrap_or(fallback))
        )
    };
    report
        .failed()
        .map(|result| annotate("error", result, "failed"))
        .chain(
            report
                .flaky()
                .map(|result| annotate("warning", result, "passed after retry")),
        )
        .collect()
}

impl Reporter for GithubReporter {
    fn on_end(&mut self, _config: &RunConfig, report: &RunReport) -> Result<(), RunError> {
        let write = |out: &mut Box<dyn Write + Send>| -> std::io::Result<()> {
            for line in annotations(report) {
                writeln!(out, "{line}")?;
            }
            writeln!(out, "{}", report.summary)
        };
        write(&mut self.out).map_err(|source| RunError::Write {
            path: "<stdout>".into(),
            source,
        })
    }
}

use crate::suite::{CaseKind, CaseMode};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Final verdict for a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Passed on the first attempt.
    Passed,
    /// Failed at least once, then passed on a retry.
    Flaky,
    /// Failed on every attempt.
    Failed,
    Skipped,
}

impl Outcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Flaky => "flaky",
            Outcome::Failed => "failed",
            Outcome::Skipped => "skipped",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptResult {
    /// 0-based; 1 is the first retry.
    pub attempt: u32,
    pub passed: bool,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Written trace file, when the trace policy kept one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub id: u16,
    pub title: String,
    pub kind: CaseKind,
    pub group: &'static str,
    pub mode: CaseMode,
    pub outcome: Outcome,
    pub duration_ms: u64,
    pub attempts: Vec<AttemptResult>,
}

impl CaseResult {
    /// Error of the last failed attempt.
    pub fn last_error(&self) -> Option<&str> {
        self.attempts
            .iter()
            .rev()
            .find_map(|attempt| attempt.error.as_deref())
    }

    pub fn retries_used(&self) -> usize {
        self.attempts.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub flaky: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Summary {
    pub fn from_results(results: &[CaseResult]) -> Self {
        results.iter().fold(
            Summary {
                total: results.len(),
                ..Summary::default()
            },
            |mut summary, result| {
                match result.outcome {
                    Outcome::Passed => summary.passed += 1,
                    Outcome::Flaky => summary.flaky += 1,
                    Outcome::Failed => summary.failed += 1,
                    Outcome::Skipped => summary.skipped += 1,
                }
                summary
            },
        )
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} flaky, {} failed, {} skipped ({} total)",
            self.passed, self.flaky, self.failed, self.skipped, self.total
        )
    }
}

/// Everything a run produced, in declaration order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub base_url: String,
    pub workers: usize,
    pub retries: u32,
    pub fully_parallel: bool,
    pub duration_ms: u64,
    pub summary: Summary,
    pub cases: Vec<CaseResult>,
}

impl RunReport {
    /// No case failed. Flaky cases count as passing.
    pub fn is_success(&self) -> bool {
        self.summary.failed == 0
    }

    pub fn failed(&self) -> impl Iterator<Item = &CaseResult> {
        self.cases.iter().filter(|c| c.outcome == Outcome::Failed)
    }

    pub fn flaky(&self) -> impl Iterator<Item = &CaseResult> {
        self.cases.iter().filter(|c| c.outcome == Outcome::Flaky)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: u16, outcome: Outcome, errors: &[Option<&str>]) -> CaseResult {
        CaseResult {
            id,
            title: format!("TestId: {id}. case"),
            kind: CaseKind::Positive,
            group: "positive",
            mode: CaseMode::Normal,
            outcome,
            duration_ms: 1,
            attempts: errors
                .iter()
                .enumerate()
                .map(|(i, err)| AttemptResult {
                    attempt: i as u32,
                    passed: err.is_none(),
                    duration_ms: 1,
                    error_kind: err.map(|_| "assertion"),
                    error: err.map(str::to_string),
                    trace: None,
                })
                .collect(),
        }
    }

    #[test]
    fn flaky_counts_as_success() {
        let cases = vec![
            result(1001, Outcome::Passed, &[None]),
            result(1002, Outcome::Flaky, &[Some("boom"), None]),
            result(1003, Outcome::Skipped, &[]),
        ];
        let report = RunReport {
            run_id: "r".into(),
            base_url: "http://x/".into(),
            workers: 1,
            retries: 1,
            fully_parallel: true,
            duration_ms: 3,
            summary: Summary::from_results(&cases),
            cases,
        };
        assert!(report.is_success());
        assert_eq!(report.summary.to_string(), "1 passed, 1 flaky, 0 failed, 1 skipped (3 total)");
        assert_eq!(report.flaky().count(), 1);
    }

    #[test]
    fn last_error_skips_passing_attempts() {
        let flaky = result(1002, Outcome::Flaky, &[Some("first"), None]);
        assert_eq!(flaky.last_error(), Some("first"));
        assert_eq!(flaky.retries_used(), 1);
    }
}

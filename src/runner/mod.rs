//! # Runner Module
//!
//! Selects, schedules, retries and aggregates cases.
//!
//! ## Flow
//!
//! ```mermaid
//! flowchart LR
//!     A[case set] --> B[select: grep, focus, forbid-only]
//!     B --> C[lanes]
//!     C --> D1[worker 1]
//!     C --> D2[worker N]
//!     D1 --> E[attempts: timeout, panic capture, trace]
//!     D2 --> E
//!     E --> F[results channel]
//!     F --> G[reporters]
//! ```
//!
//! ## Lanes
//!
//! A lane is a list of cases one worker runs serially. With `fully_parallel`
//! every case is its own lane; otherwise each group is one lane and its cases
//! keep declaration order. Lanes are pulled from a shared queue by
//! `min(workers, lanes)` tokio tasks, so `workers = 1` runs everything in
//! declaration order.
//!
//! ## Attempts
//!
//! A case runs at most `1 + retries` times. Every attempt gets its own client
//! handle and trace recorder, is bounded by the configured timeout and has
//! panics converted into failures. A pass after a failure is `flaky`.
//!
//! ## Results
//!
//! Reporters see each result as soon as its case finishes. The final
//! [`RunReport`] lists cases in declaration order.

mod attempt;
mod outcome;
mod select;

pub use attempt::{run_case, trace_path};
pub use outcome::{AttemptResult, CaseResult, Outcome, RunReport, Summary};
pub use select::select;

use crate::client::PetStoreClient;
use crate::config::RunConfig;
use crate::error::RunError;
use crate::ids::RequestId;
use crate::report::Reporter;
use crate::suite::Case;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{error, info};

type Lane = Vec<(usize, Case)>;

/// Split selected cases into lanes, preserving declaration order within and
/// across lanes.
pub fn lanes(cases: Vec<Case>, fully_parallel: bool) -> Vec<Lane> {
    if fully_parallel {
        return cases.into_iter().enumerate().map(|entry| vec![entry]).collect();
    }
    let mut lanes: Vec<(&'static str, Lane)> = Vec::new();
    for (index, case) in cases.into_iter().enumerate() {
        match lanes.iter_mut().find(|(group, _)| *group == case.group) {
            Some((_, lane)) => lane.push((index, case)),
            None => lanes.push((case.group, vec![(index, case)])),
        }
    }
    lanes.into_iter().map(|(_, lane)| lane).collect()
}

pub struct Runner {
    config: Arc<RunConfig>,
    client: PetStoreClient,
}

impl Runner {
    pub fn new(config: RunConfig) -> Result<Self, RunError> {
        let client = PetStoreClient::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Select and run `cases`, streaming results to `reporter`.
    pub async fn run(&self, cases: Vec<Case>, reporter: &mut dyn Reporter) -> Result<RunReport, RunError> {
        let selected = select(cases, &self.config)?;
        let total = selected.len();
        reporter.on_begin(&self.config, &selected)?;

        // Stand-ins for cases whose worker dies; a result that arrives clears its slot.
        let mut missing: Vec<Option<CaseResult>> =
            selected.iter().map(|case| Some(attempt::aborted(case))).collect();
        let lanes = lanes(selected, self.config.fully_parallel);
        let workers = self.config.workers.resolve_for_host().min(lanes.len()).max(1);
        let run_id = RequestId::new();
        info!(
            run_id = %run_id,
            base_url = %self.config.base_url,
            cases = total,
            lanes = lanes.len(),
            workers,
            retries = self.config.retries,
            "starting run"
        );

        let started = Instant::now();
        let queue = Arc::new(Mutex::new(VecDeque::from(lanes)));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            let client = self.client.clone();
            let config = Arc::clone(&self.config);
            handles.push(tokio::spawn(async move {
                while let Some(lane) = next_lane(&queue) {
                    for (index, case) in lane {
                        let result = run_case(&case, &client, &config).await;
                        if tx.send((index, result)).is_err() {
                            return;
                        }
                    }
                }
                tracing::debug!(worker, "worker drained");
            }));
        }
        drop(tx);

        let mut results = Vec::with_capacity(total);
        while let Some((index, result)) = rx.recv().await {
            reporter.on_case_end(&result)?;
            if let Some(slot) = missing.get_mut(index) {
                *slot = None;
            }
            results.push((index, result));
        }
        for joined in futures::future::join_all(handles).await {
            if let Err(err) = joined {
                error!(error = %err, "worker task aborted");
            }
        }
        for (index, result) in missing.into_iter().enumerate() {
            if let Some(result) = result {
                error!(test_id = result.id, "case lost with its worker, reporting failure");
                reporter.on_case_end(&result)?;
                results.push((index, result));
            }
        }

        results.sort_by_key(|(index, _)| *index);
        let cases: Vec<CaseResult> = results.into_iter().map(|(_, result)| result).collect();
        let report = RunReport {
            run_id: run_id.to_string(),
            base_url: self.config.base_url.to_string(),
            workers,
            retries: self.config.retries,
            fully_parallel: self.config.fully_parallel,
            duration_ms: attempt::elapsed_ms(started),
            summary: Summary::from_results(&cases),
            cases,
        };
        info!(summary = %report.summary, duration_ms = report.duration_ms, "run finished");

        reporter.on_end(&self.config, &report)?;
        Ok(report)
    }
}

fn next_lane(queue: &Mutex<VecDeque<Lane>>) -> Option<Lane> {
    queue.lock().ok().and_then(|mut lanes| lanes.pop_front())
}

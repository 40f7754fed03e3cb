use super::outcome::{AttemptResult, CaseResult, Outcome};
use crate::client::{PetStoreClient, TraceRecorder};
use crate::config::RunConfig;
use crate::error::CaseError;
use crate::suite::{Case, CaseContext, CaseMode};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// `<testid>-attempt<N>.json` under the trace directory.
pub fn trace_path(config: &RunConfig, case_id: u16, attempt: u32) -> PathBuf {
    config
        .trace_dir()
        .join(format!("{case_id}-attempt{attempt}.json"))
}

pub(crate) fn skipped(case: &Case) -> CaseResult {
    CaseResult {
        id: case.id,
        title: case.full_title(),
        kind: case.kind,
        group: case.group,
        mode: case.mode,
        outcome: Outcome::Skipped,
        duration_ms: 0,
        attempts: Vec::new(),
    }
}

/// Verdict for a case whose worker died before reporting it.
pub(crate) fn aborted(case: &Case) -> CaseResult {
    CaseResult {
        id: case.id,
        title: case.full_title(),
        kind: case.kind,
        group: case.group,
        mode: case.mode,
        outcome: Outcome::Failed,
        duration_ms: 0,
        attempts: vec![AttemptResult {
            attempt: 0,
            passed: false,
            duration_ms: 0,
            error_kind: Some("panic"),
            error: Some("worker task aborted before the case reported".to_string()),
            trace: None,
        }],
    }
}

/// Run one attempt: fresh client handle, optional trace, timeout, panic capture.
async fn run_attempt(
    case: &Case,
    base: &PetStoreClient,
    config: &Arc<RunConfig>,
    attempt: u32,
) -> AttemptResult {
    let recorder = config.trace.records(attempt).then(TraceRecorder::new);
    let client = match &recorder {
        Some(recorder) => base.with_trace(recorder.clone()),
        None => base.clone(),
    };
    let ctx = CaseContext {
        client,
        config: Arc::clone(config),
        attempt,
    };

    let started = Instant::now();
    // Building the body may itself panic, so it happens inside the guard too.
    let body = futures::future::lazy(move |_| case.run(ctx)).flatten();
    let guarded = AssertUnwindSafe(body).catch_unwind();
    let result = match tokio::time::timeout(config.timeout, guarded).await {
        Err(_) => Err(CaseError::Timeout(config.timeout)),
        Ok(Err(payload)) => Err(CaseError::Panicked(panic_message(payload.as_ref()))),
        Ok(Ok(result)) => result,
    };
    let duration_ms = elapsed_ms(started);

    let failed = result.is_err();
    let trace = match recorder {
        Some(recorder) if config.trace.keeps(attempt, failed) => {
            let path = trace_path(config, case.id, attempt);
            match recorder.write_to(&path) {
                Ok(()) => Some(path),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to write trace");
                    None
                }
            }
        }
        _ => None,
    };

    match result {
        Ok(()) => AttemptResult {
            attempt,
            passed: true,
            duration_ms,
            error_kind: None,
            error: None,
            trace,
        },
        Err(err) => {
            warn!(attempt, kind = err.kind(), error = %err, "attempt failed");
            AttemptResult {
                attempt,
                passed: false,
                duration_ms,
                error_kind: Some(err.kind()),
                error: Some(err.to_string()),
                trace,
            }
        }
    }
}

/// Run a case to its verdict, retrying up to `config.retries` times.
pub async fn run_case(case: &Case, base: &PetStoreClient, config: &Arc<RunConfig>) -> CaseResult {
    if case.mode == CaseMode::Skip {
        info!(test_id = case.id, "case skipped");
        return skipped(case);
    }

    let span = info_span!("case", test_id = case.id, group = case.group);
    async {
        let started = Instant::now();
        let mut attempts = Vec::new();
        for attempt in 0..=config.retries {
            let result = run_attempt(case, base, config, attempt)
                .instrument(info_span!("attempt", attempt))
                .await;
            let passed = result.passed;
            attempts.push(result);
            if passed {
                break;
            }
        }

        let outcome = match attempts.last() {
            Some(last) if last.passed && attempts.len() == 1 => Outcome::Passed,
            Some(last) if last.passed => Outcome::Flaky,
            _ => Outcome::Failed,
        };
        let duration_ms = elapsed_ms(started);
        info!(outcome = outcome.as_str(), attempts = attempts.len(), duration_ms, "case finished");

        CaseResult {
            id: case.id,
            title: case.full_title(),
            kind: case.kind,
            group: case.group,
            mode: case.mode,
            outcome,
            duration_ms,
            attempts,
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TracePolicy;
    use crate::suite::CaseKind;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn setup(dir: &std::path::Path) -> (PetStoreClient, Arc<RunConfig>) {
        let mut config = RunConfig::for_base_url("http://127.0.0.1:9/v2/").unwrap();
        config.output_dir = dir.to_path_buf();
        config.retries = 2;
        config.trace = TracePolicy::OnFirstRetry;
        let client = PetStoreClient::new(&config).unwrap();
        (client, Arc::new(config))
    }

    #[tokio::test]
    async fn pass_after_retry_is_flaky_with_one_trace() {
        let dir = tempfile::tempdir().unwrap();
        let (client, config) = setup(dir.path());
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);
        let case = Case::new(1001, "flaky", CaseKind::Positive, move |ctx| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                if ctx.attempt < 2 {
                    Err(CaseError::assertion("step", "not yet"))
                } else {
                    Ok(())
                }
            }
        });

        let result = run_case(&case, &client, &config).await;
        assert_eq!(result.outcome, Outcome::Flaky);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let traces: Vec<_> = result.attempts.iter().filter_map(|a| a.trace.clone()).collect();
        assert_eq!(traces, vec![trace_path(&config, 1001, 1)]);
        assert!(traces[0].exists());
    }

    #[tokio::test]
    async fn panics_and_timeouts_fail_the_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let (client, config) = setup(dir.path());
        let mut config = (*config).clone();
        config.retries = 0;
        config.timeout = Duration::from_millis(50);
        let config = Arc::new(config);

        let panicking = Case::new(1002, "panics", CaseKind::Positive, |_ctx| async {
            if true {
                panic!("kaboom");
            }
            Ok(())
        });
        let result = run_case(&panicking, &client, &config).await;
        assert_eq!(result.outcome, Outcome::Failed);
        assert_eq!(result.attempts[0].error_kind, Some("panic"));
        assert!(result.last_error().unwrap().contains("kaboom"));

        let slow = Case::new(1003, "sleeps", CaseKind::Positive, |_ctx| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        });
        let result = run_case(&slow, &client, &config).await;
        assert_eq!(result.attempts[0].error_kind, Some("timeout"));
    }

    #[tokio::test]
    async fn panic_while_building_the_body_fails_the_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let (client, config) = setup(dir.path());
        let case = Case::new(1005, "panics before its future", CaseKind::Positive, |_ctx| {
            if true {
                panic!("sync panic");
            }
            async { Ok(()) }
        });

        let result = run_case(&case, &client, &config).await;
        assert_eq!(result.outcome, Outcome::Failed);
        assert_eq!(result.attempts.len(), 3);
        assert!(result.attempts.iter().all(|a| a.error_kind == Some("panic")));
        assert!(result.last_error().unwrap().contains("sync panic"));
    }

    #[test]
    fn aborted_case_is_a_failure() {
        let case = Case::new(1006, "lost", CaseKind::Negative, |_ctx| async { Ok(()) });
        let result = aborted(&case);
        assert_eq!(result.outcome, Outcome::Failed);
        assert_eq!(result.title, "TestId: 1006. lost");
        assert_eq!(result.attempts[0].error_kind, Some("panic"));
    }

    #[tokio::test]
    async fn skip_mode_never_runs() {
        let dir = tempfile::tempdir().unwrap();
        let (client, config) = setup(dir.path());
        let case = Case::new(1004, "skipped", CaseKind::Positive, |_ctx| async {
            Err(CaseError::Setup("should not run".into()))
        })
        .skip();
        let result = run_case(&case, &client, &config).await;
        assert_eq!(result.outcome, Outcome::Skipped);
        assert!(result.attempts.is_empty());
    }
}

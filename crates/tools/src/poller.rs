//! Submit, poll and fetch driver for long-running remote operations.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::PollError;

/// Default pause between status queries.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Sub-task name to done flag.
pub type OperationStatus = BTreeMap<String, bool>;

/// Complete when a status is present and every flag in it is set.
pub fn is_complete(status: Option<&OperationStatus>) -> bool {
    status.is_some_and(|s| s.values().all(|done| *done))
}

/// A remote operation that is accepted first and finished out of band.
pub trait Operation: Send + Sync {
    type Output: Send;
    type Error: Display + Send;

    /// Start the operation. `Ok(None)` means the response carried no id.
    fn submit(&self) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send;

    /// Current status. `Ok(None)` means the server has nothing to report yet.
    fn status(
        &self,
        operation_id: &str,
    ) -> impl Future<Output = Result<Option<OperationStatus>, Self::Error>> + Send;

    fn result(&self, operation_id: &str)
    -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}

/// Time source for the poll loop.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Wall clock backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Loop bounds. Both bounds default to unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_attempts: None,
            timeout: None,
        }
    }
}

impl PollConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Where a workflow currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Submitted { operation_id: String },
    Polling { operation_id: String, attempts: u32 },
    Completed { operation_id: String, attempts: u32 },
    Failed(PollError),
}

/// A finished workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct Completed<T> {
    pub operation_id: String,
    pub status_queries: u32,
    pub result: T,
}

/// Drives an [`Operation`] to completion.
#[derive(Debug, Clone, Default)]
pub struct Poller<K = TokioClock> {
    clock: K,
    config: PollConfig,
}

impl Poller<TokioClock> {
    pub fn new(config: PollConfig) -> Self {
        Self::with_clock(TokioClock, config)
    }
}

impl<K: Clock> Poller<K> {
    pub fn with_clock(clock: K, config: PollConfig) -> Self {
        Self { clock, config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Submit, wait for completion, then fetch the result exactly once.
    ///
    /// Any failure ends the workflow; nothing is retried except the wait
    /// for the remote side to finish.
    pub async fn run<O: Operation>(
        &self,
        operation: &O,
        cancel: Option<&CancellationToken>,
    ) -> Result<Completed<O::Output>, PollError> {
        let mut state = self.submit(operation, cancel).await;
        let deadline = self.config.timeout.map(|t| self.clock.now() + t);

        loop {
            debug!(?state, "poll state");
            state = match state {
                PollState::Submitted { operation_id } => PollState::Polling {
                    operation_id,
                    attempts: 0,
                },
                PollState::Polling {
                    operation_id,
                    attempts,
                } => {
                    self.poll(operation, operation_id, attempts, deadline, cancel)
                        .await
                }
                PollState::Completed {
                    operation_id,
                    attempts,
                } => return self.fetch(operation, operation_id, attempts).await,
                PollState::Failed(e) => {
                    warn!(error = %e, "operation failed");
                    return Err(e);
                }
            };
        }
    }

    async fn submit<O: Operation>(
        &self,
        operation: &O,
        cancel: Option<&CancellationToken>,
    ) -> PollState {
        if is_cancelled(cancel) {
            return PollState::Failed(PollError::Cancelled { operation_id: None });
        }
        match operation.submit().await {
            Ok(Some(operation_id)) if !operation_id.is_empty() => {
                info!(%operation_id, "operation submitted");
                PollState::Submitted { operation_id }
            }
            Ok(_) => PollState::Failed(PollError::SubmissionFailed(
                "response carried no operation id".into(),
            )),
            Err(e) => PollState::Failed(PollError::SubmissionFailed(e.to_string())),
        }
    }

    /// One status query, and the pause after it if the operation is not done.
    async fn poll<O: Operation>(
        &self,
        operation: &O,
        operation_id: String,
        attempts: u32,
        deadline: Option<Instant>,
        cancel: Option<&CancellationToken>,
    ) -> PollState {
        if is_cancelled(cancel) {
            return PollState::Failed(PollError::Cancelled {
                operation_id: Some(operation_id),
            });
        }
        if deadline.is_some_and(|d| self.clock.now() >= d) {
            return PollState::Failed(PollError::DeadlineExceeded {
                operation_id,
                timeout: self.config.timeout.unwrap_or_default(),
            });
        }

        let attempt = attempts + 1;
        let status = match operation.status(&operation_id).await {
            Ok(status) => status,
            Err(e) => {
                return PollState::Failed(PollError::PollingFailed {
                    operation_id,
                    attempt,
                    reason: e.to_string(),
                });
            }
        };

        if is_complete(status.as_ref()) {
            info!(%operation_id, attempts = attempt, "operation complete");
            return PollState::Completed {
                operation_id,
                attempts: attempt,
            };
        }
        debug!(%operation_id, attempt, ?status, "operation in progress");

        if self.config.max_attempts.is_some_and(|max| attempt >= max) {
            return PollState::Failed(PollError::AttemptsExhausted {
                operation_id,
                attempts: attempt,
            });
        }

        let pause = match deadline {
            Some(deadline) => self
                .config
                .interval
                .min(deadline.saturating_duration_since(self.clock.now())),
            None => self.config.interval,
        };
        if self.pause(pause, cancel).await {
            return PollState::Failed(PollError::Cancelled {
                operation_id: Some(operation_id),
            });
        }

        PollState::Polling {
            operation_id,
            attempts: attempt,
        }
    }

    async fn fetch<O: Operation>(
        &self,
        operation: &O,
        operation_id: String,
        status_queries: u32,
    ) -> Result<Completed<O::Output>, PollError> {
        match operation.result(&operation_id).await {
            Ok(result) => Ok(Completed {
                operation_id,
                status_queries,
                result,
            }),
            Err(e) => {
                let e = PollError::ResultFetchFailed {
                    operation_id,
                    reason: e.to_string(),
                };
                warn!(error = %e, "operation failed");
                Err(e)
            }
        }
    }

    /// Sleep, returning `true` if cancelled first.
    async fn pause(&self, duration: Duration, cancel: Option<&CancellationToken>) -> bool {
        match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => true,
                _ = self.clock.sleep(duration) => false,
            },
            None => {
                self.clock.sleep(duration).await;
                false
            }
        }
    }
}

fn is_cancelled(cancel: Option<&CancellationToken>) -> bool {
    cancel.is_some_and(CancellationToken::is_cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualClock, ScriptedOperation};

    fn status(flags: &[(&str, bool)]) -> Option<OperationStatus> {
        Some(flags.iter().map(|(k, v)| (k.to_string(), *v)).collect())
    }

    fn poller(clock: &ManualClock, config: PollConfig) -> Poller<ManualClock> {
        Poller::with_clock(clock.clone(), config)
    }

    #[test]
    fn completion_predicate() {
        assert!(!is_complete(None));
        assert!(!is_complete(status(&[("a", true), ("b", false)]).as_ref()));
        assert!(is_complete(status(&[("a", true), ("b", true)]).as_ref()));
        assert!(is_complete(Some(&OperationStatus::new())));
    }

    #[tokio::test]
    async fn polls_until_every_flag_is_set() {
        let clock = ManualClock::new();
        let op = ScriptedOperation::new(
            Some("op-1"),
            vec![
                Ok(status(&[("stepA", true), ("stepB", false)])),
                Ok(status(&[("stepA", true), ("stepB", false)])),
                Ok(status(&[("stepA", true), ("stepB", true)])),
            ],
        );

        let done = poller(&clock, PollConfig::default())
            .run(&op, None)
            .await
            .unwrap();

        assert_eq!(done.operation_id, "op-1");
        assert_eq!(done.status_queries, 3);
        assert_eq!(done.result, "result of op-1");
        assert_eq!(op.status_calls(), 3);
        assert_eq!(op.fetch_calls(), 1);
        assert_eq!(clock.sleeps(), vec![DEFAULT_INTERVAL, DEFAULT_INTERVAL]);
    }

    #[tokio::test]
    async fn absent_status_keeps_polling() {
        let clock = ManualClock::new();
        let op = ScriptedOperation::new(Some("op-2"), vec![Ok(None), Ok(status(&[("a", true)]))]);

        let done = poller(&clock, PollConfig::default())
            .run(&op, None)
            .await
            .unwrap();
        assert_eq!(done.status_queries, 2);
    }

    #[tokio::test]
    async fn status_error_aborts_immediately() {
        let clock = ManualClock::new();
        let op = ScriptedOperation::new(
            Some("op-1"),
            vec![
                Ok(status(&[("stepA", false)])),
                Err("connection reset".to_string()),
                Ok(status(&[("stepA", true)])),
            ],
        );

        let err = poller(&clock, PollConfig::default())
            .run(&op, None)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PollError::PollingFailed {
                operation_id: "op-1".into(),
                attempt: 2,
                reason: "connection reset".into(),
            }
        );
        assert_eq!(op.status_calls(), 2);
        assert_eq!(op.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn submission_without_id_fails() {
        let clock = ManualClock::new();
        for id in [None, Some("")] {
            let op = ScriptedOperation::new(id, vec![]);
            let err = poller(&clock, PollConfig::default())
                .run(&op, None)
                .await
                .unwrap_err();
            assert!(matches!(err, PollError::SubmissionFailed(_)));
            assert_eq!(op.status_calls(), 0);
        }
    }

    #[tokio::test]
    async fn fetch_error_is_reported() {
        let clock = ManualClock::new();
        let op = ScriptedOperation::new(Some("op-3"), vec![Ok(status(&[("a", true)]))])
            .failing_fetch("gone");

        let err = poller(&clock, PollConfig::default())
            .run(&op, None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PollError::ResultFetchFailed {
                operation_id: "op-3".into(),
                reason: "gone".into(),
            }
        );
    }

    #[tokio::test]
    async fn attempt_cap_stops_without_fetch() {
        let clock = ManualClock::new();
        let op = ScriptedOperation::never_completing("op-4");

        let err = poller(&clock, PollConfig::default().with_max_attempts(2))
            .run(&op, None)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PollError::AttemptsExhausted {
                operation_id: "op-4".into(),
                attempts: 2,
            }
        );
        assert_eq!(op.status_calls(), 2);
        assert_eq!(op.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn deadline_is_measured_on_the_injected_clock() {
        let clock = ManualClock::new();
        let op = ScriptedOperation::never_completing("op-5");
        let timeout = Duration::from_secs(5);

        let err = poller(&clock, PollConfig::default().with_timeout(timeout))
            .run(&op, None)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PollError::DeadlineExceeded {
                operation_id: "op-5".into(),
                timeout,
            }
        );
        // Queries at t=0, 2 and 4; the last pause is clipped to the deadline.
        assert_eq!(op.status_calls(), 3);
        assert_eq!(
            clock.sleeps(),
            vec![DEFAULT_INTERVAL, DEFAULT_INTERVAL, Duration::from_secs(1)]
        );
        assert_eq!(op.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_fetch() {
        let clock = ManualClock::new();
        let token = CancellationToken::new();
        token.cancel();
        let op = ScriptedOperation::never_completing("op-6");

        let err = poller(&clock, PollConfig::default())
            .run(&op, Some(&token))
            .await
            .unwrap_err();

        assert_eq!(err, PollError::Cancelled { operation_id: None });
        assert_eq!(op.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn cancellation_during_polling() {
        let clock = ManualClock::new();
        let token = CancellationToken::new();
        let op = ScriptedOperation::never_completing("op-7").cancel_after(2, token.clone());

        let err = poller(&clock, PollConfig::default())
            .run(&op, Some(&token))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PollError::Cancelled {
                operation_id: Some("op-7".into())
            }
        );
        assert_eq!(op.status_calls(), 2);
        assert_eq!(op.fetch_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_waits_the_interval() {
        let op = ScriptedOperation::new(
            Some("op-8"),
            vec![Ok(status(&[("a", false)])), Ok(status(&[("a", true)]))],
        );
        let started = tokio::time::Instant::now();

        let done = Poller::new(PollConfig::default())
            .run(&op, None)
            .await
            .unwrap();

        assert_eq!(done.status_queries, 2);
        assert!(started.elapsed() >= DEFAULT_INTERVAL);
    }
}

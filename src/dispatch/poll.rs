use std::future::Future;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::PollConfig;
use crate::dispatch::task::TaskKind;
use crate::error::ProxyError;

/// Anything that can answer a single status lookup for a task.
pub trait StatusSource: Send + Sync {
    fn task_status(
        &self,
        kind: TaskKind,
        task_id: &str,
    ) -> impl Future<Output = Result<Value, ProxyError>> + Send;
}

/// How a poll loop ended.
#[derive(Debug)]
pub enum PollOutcome {
    /// Terminal status observed; the last response body, verbatim.
    Completed(Value),
    /// Attempt budget exhausted while the task was still pending.
    TimedOut { attempts: u32 },
    /// The cancellation token fired before a terminal status was seen.
    Cancelled,
}

/// Fixed-interval status poller. No backoff, no jitter.
#[derive(Debug, Clone, Copy)]
pub struct TaskPoller {
    interval: Duration,
    max_attempts: u32,
}

impl TaskPoller {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    pub fn from_config(config: &PollConfig) -> Self {
        Self::new(config.interval, config.max_attempts)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Upper bound on time spent sleeping before a timeout is reported.
    pub fn worst_case(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }

    /// Poll until a terminal status, the attempt budget, or cancellation.
    ///
    /// Each attempt makes exactly one status call. Fetch and parse failures
    /// are logged and consume the attempt. There is no sleep after the last
    /// attempt.
    pub async fn poll<S: StatusSource>(
        &self,
        source: &S,
        kind: TaskKind,
        task_id: &str,
        cancel: &CancellationToken,
    ) -> PollOutcome {
        let start = Instant::now();

        for attempt in 1..=self.max_attempts {
            let fetched = tokio::select! {
                biased;
                () = cancel.cancelled() => return cancelled(kind, task_id, attempt),
                fetched = source.task_status(kind, task_id) => fetched,
            };

            match fetched {
                Ok(body) => match kind.classify(&body) {
                    Some(status) if status.is_terminal() => {
                        tracing::info!(
                            kind = %kind,
                            task_id,
                            attempt,
                            status = status.as_str(),
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "task reached terminal status"
                        );
                        return PollOutcome::Completed(body);
                    }
                    Some(status) => {
                        tracing::debug!(
                            kind = %kind,
                            task_id,
                            attempt,
                            status = status.as_str(),
                            "task still pending"
                        );
                    }
                    None => {
                        tracing::debug!(
                            kind = %kind,
                            task_id,
                            attempt,
                            "status response carried no status field"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        kind = %kind,
                        task_id,
                        attempt,
                        "status check failed: {e}"
                    );
                }
            }

            if attempt < self.max_attempts {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return cancelled(kind, task_id, attempt),
                    () = tokio::time::sleep(self.interval) => {}
                }
            }
        }

        tracing::warn!(
            kind = %kind,
            task_id,
            attempts = self.max_attempts,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "task did not reach a terminal status in time"
        );
        PollOutcome::TimedOut {
            attempts: self.max_attempts,
        }
    }
}

fn cancelled(kind: TaskKind, task_id: &str, attempt: u32) -> PollOutcome {
    tracing::info!(kind = %kind, task_id, attempt, "task polling cancelled");
    PollOutcome::Cancelled
}

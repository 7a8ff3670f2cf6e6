//! Fixed-interval polling until an operation reaches a terminal state.
//!
//! The loop has no iteration cap. It is bounded only by the caller's
//! cancellation token, which is checked before every query and raced against
//! every suspension point (the in-flight query and the inter-poll sleep).

use std::future::Future;
use std::time::Duration;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use super::resolve::PendingOperation;
use crate::error::{FleetError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Running,
    Succeeded,
    Failed,
}

impl OperationState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, OperationState::Running)
    }
}

/// One polled snapshot; a new one is produced on every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationStatus<T> {
    pub pending_operation_id: String,
    pub state:                OperationState,
    pub result:               Option<T>,
}

#[derive(Debug, Clone)]
pub struct PollingWaiter {
    interval:     Duration,
    call_timeout: Option<Duration>,
}

impl PollingWaiter {
    pub fn new(interval: Duration) -> Self {
        PollingWaiter { interval, call_timeout: None }
    }

    /// Bound each status query individually. An expired query is retried on
    /// the next tick, still subject to the overall cancellation token.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll `query` for `op` until it reports a terminal state.
    ///
    /// Returns the terminal snapshot, `Cancelled` once `cancel` fires, or the
    /// first non-transient query error.
    pub async fn wait<T, F, Fut>(
        &self,
        op:        &PendingOperation,
        cancel:    &CancellationToken,
        mut query: F,
    ) -> Result<OperationStatus<T>>
    where
        F:   FnMut(String) -> Fut,
        Fut: Future<Output = Result<OperationStatus<T>>>,
    {
        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(cancelled(op));
            }
            attempt += 1;
            debug!("polling {op} (attempt {attempt})");

            let call = self.bounded(query(op.id().to_string()));
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(op)),
                r = call => r,
            };

            match outcome {
                Ok(status) if status.state.is_terminal() => {
                    if !status.pending_operation_id.is_empty() && status.pending_operation_id != op.id() {
                        warn!("{op}: status reported for {}", status.pending_operation_id);
                    }
                    info!("{op} finished: {:?} after {attempt} poll(s)", status.state);
                    return Ok(status);
                }
                Ok(_) => {
                    debug!("{op} still running, next check in {}s", self.interval.as_secs());
                }
                Err(e) if e.is_transient() => {
                    warn!("{op}: status query failed ({e}), retrying in {}s", self.interval.as_secs());
                }
                Err(e) => return Err(e),
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(op)),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    async fn bounded<T, Fut>(&self, call: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
                Err(FleetError::Timeout(format!("status query exceeded {}s", limit.as_secs())))
            }),
            None => call.await,
        }
    }
}

fn cancelled(op: &PendingOperation) -> FleetError {
    FleetError::Cancelled(format!("gave up waiting on {op}"))
}

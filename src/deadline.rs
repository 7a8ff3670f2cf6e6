//! Caller deadline expressed as a cancellation token.
//!
//! A [`Deadline`] owns a child of the caller's token that is cancelled either
//! when the parent is cancelled (e.g. Ctrl-C) or when the timeout elapses.

use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta};
use log::debug;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Deadline {
    token:      CancellationToken,
    expires_at: Option<DateTime<Local>>,
    timer:      JoinHandle<()>,
}

impl Deadline {
    /// Must be called from within a tokio runtime.
    pub fn after(parent: &CancellationToken, timeout: Duration) -> Self {
        let token = parent.child_token();
        let expires_at = TimeDelta::from_std(timeout)
            .ok()
            .and_then(|d| Local::now().checked_add_signed(d));

        let t = token.clone();
        let timer = tokio::spawn(async move {
            tokio::select! {
                _ = t.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    debug!("operation deadline reached after {}s", timeout.as_secs());
                    t.cancel();
                }
            }
        });

        Deadline { token, expires_at, timer }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Wall-clock expiry, for log messages. `None` if it does not fit a date.
    pub fn expires_at(&self) -> Option<DateTime<Local>> {
        self.expires_at
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

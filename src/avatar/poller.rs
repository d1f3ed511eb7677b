// src/avatar/poller.rs
//! Bounded status polling for a submitted talk.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{resolve, JobHandle, PollOutcome, TalksApi};
use crate::did_client::DidError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Attempt budget and spacing. Worst case wall clock is roughly
/// `max_attempts * interval` plus request latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("status check failed: {0}")]
    Transport(#[from] DidError),

    #[error("polling cancelled")]
    Cancelled,
}

pub struct JobPoller {
    api: Arc<dyn TalksApi>,
    settings: PollSettings,
    shutdown: CancellationToken,
}

impl JobPoller {
    pub fn new(api: Arc<dyn TalksApi>, settings: PollSettings, shutdown: CancellationToken) -> Self {
        Self { api, settings, shutdown }
    }

    /// Poll until the talk is ready, fails, or the attempt budget is spent.
    ///
    /// Never returns `Ok(PollOutcome::Pending)`. A transport error on any
    /// attempt ends the loop immediately. A budget of zero is treated as one.
    pub async fn poll(&self, handle: JobHandle) -> Result<PollOutcome, PollError> {
        let mut attempts_remaining = self.settings.max_attempts.max(1);

        loop {
            let body = self.api.fetch_status(&handle).await?;

            match resolve(&body) {
                PollOutcome::Pending => {
                    tracing::debug!(
                        talk_id = %handle.job_id(),
                        status = ?body.get("status"),
                        attempts_remaining,
                        "talk still pending"
                    );
                }
                terminal => return Ok(terminal),
            }

            attempts_remaining -= 1;
            if attempts_remaining == 0 {
                tracing::warn!(
                    talk_id = %handle.job_id(),
                    attempts = self.settings.max_attempts,
                    "talk did not finish before the attempt budget ran out"
                );
                return Ok(PollOutcome::TimedOut);
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => return Err(PollError::Cancelled),
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }
    }
}

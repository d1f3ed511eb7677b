// src/avatar/workflow.rs
//! End-to-end "text in, video URL out".

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::{AvatarProfile, GenerationRequest, JobPoller, PollOutcome, PollSettings, TalksApi};
use crate::config::DidConfig;
use crate::did_client::DidClient;

pub const NOT_CONFIGURED: &str = "not configured";
pub const GENERIC_FAILURE: &str = "video generation failed unexpectedly";

/// Exactly one of the two fields is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowResult {
    pub result_url: Option<String>,
    pub error_message: Option<String>,
}

impl WorkflowResult {
    pub fn ready(url: impl Into<String>) -> Self {
        Self { result_url: Some(url.into()), error_message: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { result_url: None, error_message: Some(message.into()) }
    }

    pub fn is_success(&self) -> bool {
        self.result_url.is_some()
    }
}

#[derive(Clone)]
pub struct AvatarVideoWorkflow {
    /// `None` when no credential is configured; every run fails fast.
    api: Option<Arc<dyn TalksApi>>,
    profile: AvatarProfile,
    settings: PollSettings,
    shutdown: CancellationToken,
}

impl AvatarVideoWorkflow {
    pub fn new(api: Option<Arc<dyn TalksApi>>, profile: AvatarProfile, settings: PollSettings) -> Self {
        Self {
            api,
            profile,
            settings,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn from_config(config: &DidConfig) -> Self {
        let api = DidClient::from_config(config).map(|client| Arc::new(client) as Arc<dyn TalksApi>);
        let settings = PollSettings {
            max_attempts: config.poll_attempts,
            interval: config.poll_interval,
        };
        Self::new(api, AvatarProfile::from_config(config), settings)
    }

    /// Stop in-flight polls when this token is cancelled (server shutdown).
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api.is_some()
    }

    /// Generate a talking-avatar video for `response_text`.
    ///
    /// Never panics and never returns an error type: every failure, including
    /// a panic inside the job, is folded into `WorkflowResult::error_message`.
    pub async fn run(&self, response_text: &str) -> WorkflowResult {
        let Some(api) = self.api.clone() else {
            tracing::warn!("D-ID API key not configured. Set env var DID_API_KEY.");
            return WorkflowResult::failed(NOT_CONFIGURED);
        };

        let request = self.profile.request_for(response_text);
        let poller = JobPoller::new(api.clone(), self.settings, self.shutdown.clone());

        // The job owns its handle and runs on its own task; we only wait on the join handle.
        let job = tokio::spawn(generate(api, poller, request));

        match job.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Avatar video job aborted: {}", e);
                WorkflowResult::failed(GENERIC_FAILURE)
            }
        }
    }
}

async fn generate(api: Arc<dyn TalksApi>, poller: JobPoller, request: GenerationRequest) -> WorkflowResult {
    let handle = match api.create_talk(&request).await {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!("D-ID talk submission failed: {}", e);
            return WorkflowResult::failed(format!("video submission failed: {}", e));
        }
    };
    tracing::info!(talk_id = %handle.job_id(), "🎬 D-ID talk submitted, polling for result");

    match poller.poll(handle).await {
        Ok(PollOutcome::Ready(url)) => {
            tracing::info!(result_url = %url, "D-ID talk ready");
            WorkflowResult::ready(url)
        }
        Ok(PollOutcome::Failed(reason)) => {
            tracing::error!("D-ID error: {}", reason);
            WorkflowResult::failed(format!("video generation failed: {}", reason))
        }
        Ok(PollOutcome::TimedOut | PollOutcome::Pending) => {
            WorkflowResult::failed("video generation timed out")
        }
        Err(e) => {
            tracing::error!("D-ID video generation failed: {}", e);
            WorkflowResult::failed(format!("video generation failed: {}", e))
        }
    }
}

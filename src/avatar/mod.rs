// src/avatar/mod.rs
//! Talking-avatar video generation.
//! A talk is submitted once, then polled on a bounded schedule until the
//! remote service hands back a video URL, reports a failure, or we give up.

use async_trait::async_trait;

use crate::config::DidConfig;
use crate::did_client::DidError;

mod poller;
mod resolver;
mod workflow;

pub use poller::{JobPoller, PollError, PollSettings, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};
pub use resolver::{resolve, PollOutcome};
pub use workflow::{AvatarVideoWorkflow, WorkflowResult, GENERIC_FAILURE, NOT_CONFIGURED};

/// Which avatar speaks, and with which voice.
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarProfile {
    pub avatar_id: String,
    pub voice_provider: String,
    pub voice_id: String,
}

impl AvatarProfile {
    pub fn from_config(config: &DidConfig) -> Self {
        Self {
            avatar_id: config.avatar_id.clone(),
            voice_provider: config.voice_provider.clone(),
            voice_id: config.voice_id.clone(),
        }
    }

    pub fn request_for(&self, prompt_text: &str) -> GenerationRequest {
        GenerationRequest {
            prompt_text: prompt_text.to_string(),
            avatar_id: self.avatar_id.clone(),
            voice_provider: self.voice_provider.clone(),
            voice_id: self.voice_id.clone(),
        }
    }
}

impl Default for AvatarProfile {
    fn default() -> Self {
        Self::from_config(&DidConfig::default())
    }
}

/// One video-generation request; consumed by the submitter.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt_text: String,
    pub avatar_id: String,
    pub voice_provider: String,
    pub voice_id: String,
}

/// Opaque identifier of a talk accepted by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    job_id: String,
}

impl JobHandle {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self { job_id: job_id.into() }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}

/// The two remote calls the workflow needs: create a talk, read its status.
#[async_trait]
pub trait TalksApi: Send + Sync {
    async fn create_talk(&self, request: &GenerationRequest) -> Result<JobHandle, DidError>;

    /// Returns the raw status body. Decoding into a [`PollOutcome`] is left to [`resolve`].
    async fn fetch_status(&self, handle: &JobHandle) -> Result<serde_json::Value, DidError>;
}

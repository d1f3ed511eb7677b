// D-ID Talks API Client
// Creates talking-avatar videos from text and reports their progress

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::avatar::{GenerationRequest, JobHandle, TalksApi};
use crate::config::DidConfig;

const CREATE_TIMEOUT: Duration = Duration::from_secs(30);
const STATUS_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct DidClient {
    client: Client,
    auth_header: String,
    base_url: String,
    status_timeout: Duration,
}

// ============================================================================
// API REQUEST/RESPONSE STRUCTURES
// ============================================================================

#[derive(Serialize, Debug)]
pub struct CreateTalkRequest {
    pub script: TalkScript,
    pub avatar_id: String,
}

#[derive(Serialize, Debug)]
pub struct TalkScript {
    #[serde(rename = "type")]
    pub kind: String, // always "text"
    pub input: String,
    pub provider: VoiceProvider,
    pub ssml: bool,
}

#[derive(Serialize, Debug)]
pub struct VoiceProvider {
    #[serde(rename = "type")]
    pub kind: String, // "microsoft", "elevenlabs", ...
    pub voice_id: String,
}

#[derive(Deserialize, Debug)]
struct CreateTalkResponse {
    #[serde(default)]
    id: Option<String>,
}

impl From<&GenerationRequest> for CreateTalkRequest {
    fn from(request: &GenerationRequest) -> Self {
        Self {
            script: TalkScript {
                kind: "text".to_string(),
                input: request.prompt_text.clone(),
                provider: VoiceProvider {
                    kind: request.voice_provider.clone(),
                    voice_id: request.voice_id.clone(),
                },
                ssml: false,
            },
            avatar_id: request.avatar_id.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DidError {
    #[error("D-ID request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("D-ID API error ({status}): {body}")]
    Api { status: StatusCode, body: String },

    #[error("D-ID returned malformed JSON: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("D-ID response did not include a talk id")]
    MissingTalkId,
}

// ============================================================================
// IMPLEMENTATION
// ============================================================================

impl DidClient {
    pub fn new(api_key: &str, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            auth_header: format!("Basic {}", basic_credential(api_key)),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            status_timeout: STATUS_TIMEOUT,
        }
    }

    /// Override the per-call timeout on status checks (15 s by default).
    pub fn with_status_timeout(mut self, timeout: Duration) -> Self {
        self.status_timeout = timeout;
        self
    }

    /// `None` when no usable credential is configured.
    pub fn from_config(config: &DidConfig) -> Option<Self> {
        config
            .api_key
            .as_deref()
            .map(|key| Self::new(key, config.base_url.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST /talks - returns the id of the new talk
    pub async fn create_talk(&self, request: &GenerationRequest) -> Result<JobHandle, DidError> {
        let url = format!("{}/talks", self.base_url);
        let request_body = CreateTalkRequest::from(request);

        let response = self.client
            .post(&url)
            .header("Authorization", &self.auth_header)
            .json(&request_body)
            .timeout(CREATE_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(DidError::Api { status, body });
        }

        let created: CreateTalkResponse = serde_json::from_str(&body)?;
        match created.id.filter(|id| !id.is_empty()) {
            Some(id) => Ok(JobHandle::new(id)),
            None => Err(DidError::MissingTalkId),
        }
    }

    /// GET /talks/{id} - raw status body
    ///
    /// Error statuses are not errors as long as the body is JSON; the resolver
    /// reads them as pending. A body that is not JSON at all (an HTML error
    /// page, say) is `MalformedResponse` and ends polling.
    pub async fn get_talk(&self, talk_id: &str) -> Result<Value, DidError> {
        let url = format!("{}/talks/{}", self.base_url, talk_id);

        let response = self.client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .timeout(self.status_timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!("D-ID status check for {} returned {}: {}", talk_id, status, body);
        }

        let value = serde_json::from_str(&body)?;
        Ok(value)
    }
}

#[async_trait]
impl TalksApi for DidClient {
    async fn create_talk(&self, request: &GenerationRequest) -> Result<JobHandle, DidError> {
        DidClient::create_talk(self, request).await
    }

    async fn fetch_status(&self, handle: &JobHandle) -> Result<Value, DidError> {
        self.get_talk(handle.job_id()).await
    }
}

/// D-ID keys are issued as `user:password`; the header wants them base64'd.
/// Keys without a colon are assumed to be encoded already.
fn basic_credential(api_key: &str) -> String {
    if api_key.contains(':') {
        STANDARD.encode(api_key)
    } else {
        api_key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::AvatarProfile;

    #[test]
    fn test_create_talk_request_serialization() {
        let request = AvatarProfile::default().request_for("Hello there");
        let json = serde_json::to_value(CreateTalkRequest::from(&request)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "script": {
                    "type": "text",
                    "input": "Hello there",
                    "provider": {"type": "microsoft", "voice_id": "en-US-JennyMultilingualNeural"},
                    "ssml": false
                },
                "avatar_id": "amy"
            })
        );
    }

    #[test]
    fn test_basic_credential_encodes_raw_pairs_only() {
        assert_eq!(basic_credential("user:pass"), "dXNlcjpwYXNz");
        assert_eq!(basic_credential("dXNlcjpwYXNz"), "dXNlcjpwYXNz");
    }

    #[test]
    fn test_from_config_requires_key() {
        let mut config = DidConfig::default();
        assert!(DidClient::from_config(&config).is_none());

        config.api_key = Some("key".to_string());
        config.base_url = "http://localhost:9999/".to_string();
        let client = DidClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9999");
        assert_eq!(client.status_timeout, STATUS_TIMEOUT);

        let client = client.with_status_timeout(Duration::from_millis(250));
        assert_eq!(client.status_timeout, Duration::from_millis(250));
    }
}

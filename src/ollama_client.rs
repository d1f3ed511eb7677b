// Ollama API Client
// Non-streaming text generation against a local Ollama server

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::OllamaConfig;

/// Returned to the user whenever the model cannot be reached.
pub const FALLBACK_RESPONSE: &str = "Sorry, I couldn't get a response from the model.";

/// Returned when Ollama answers without a `response` field.
pub const EMPTY_RESPONSE: &str = "No response from model.";

const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Serialize, Debug)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum OllamaError {
    #[error("Ollama request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ollama API error ({status}): {body}")]
    Api { status: StatusCode, body: String },
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &OllamaConfig) -> Self {
        Self::new(config.base_url.clone(), config.model.clone())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// POST /api/generate with streaming disabled
    pub async fn generate(&self, prompt: &str) -> Result<String, OllamaError> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self.client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .timeout(GENERATE_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(OllamaError::Api { status, body });
        }

        let generated: GenerateResponse = response.json().await?;
        Ok(generated.response.unwrap_or_else(|| EMPTY_RESPONSE.to_string()))
    }

    /// Like [`generate`](Self::generate), but any failure becomes [`FALLBACK_RESPONSE`].
    pub async fn chat(&self, prompt: &str) -> String {
        match self.generate(prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Error communicating with Ollama: {}", e);
                FALLBACK_RESPONSE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_generate_sends_model_and_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_json(serde_json::json!({
                "model": "llama3",
                "prompt": "Why is the sky blue?",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama3",
                "response": "Rayleigh scattering.",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri(), "llama3");
        assert_eq!(client.generate("Why is the sky blue?").await.unwrap(), "Rayleigh scattering.");
    }

    #[tokio::test]
    async fn test_missing_response_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"done": true})))
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri(), "llama3");
        assert_eq!(client.chat("hi").await, EMPTY_RESPONSE);
    }

    #[tokio::test]
    async fn test_server_error_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri(), "llama3");
        assert!(matches!(
            client.generate("hi").await,
            Err(OllamaError::Api { status, .. }) if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert_eq!(client.chat("hi").await, FALLBACK_RESPONSE);
    }

    #[tokio::test]
    async fn test_unreachable_server_falls_back() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let client = OllamaClient::new(format!("http://{}", addr), "llama3");
        assert_eq!(client.chat("hi").await, FALLBACK_RESPONSE);
    }
}

// src/handlers/process.rs
//! POST /process - prompt in, text / audio / avatar video out

use axum::{
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::AppError;
use crate::AppState;

pub const VIDEO_FAILED: &str = "Video generation failed.";

#[derive(Deserialize, Debug)]
pub struct ProcessRequest {
    #[serde(default)]
    pub prompt: String,
    /// Kept as raw JSON so `null` or a number is an invalid mode, not a bad body.
    #[serde(default = "default_mode")]
    pub mode: Value,
}

impl Default for ProcessRequest {
    fn default() -> Self {
        Self { prompt: String::new(), mode: default_mode() }
    }
}

fn default_mode() -> Value {
    Value::from("text")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Text,
    Audio,
    Video,
}

impl FromStr for Mode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Mode::Text),
            "audio" => Ok(Mode::Audio),
            "video" => Ok(Mode::Video),
            other => Err(AppError::InvalidMode(other.to_string())),
        }
    }
}

impl TryFrom<&Value> for Mode {
    type Error = AppError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(s) => s.parse(),
            None => Err(AppError::InvalidMode(value.to_string())),
        }
    }
}

/// An empty or `null` body is read as `{}`.
fn parse_request(body: &[u8]) -> Result<ProcessRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ProcessRequest::default());
    }
    serde_json::from_slice::<Option<ProcessRequest>>(body)
        .map(Option::unwrap_or_default)
        .map_err(AppError::InvalidBody)
}

pub async fn process(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let request = parse_request(&body)?;

    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::EmptyPrompt);
    }
    let mode = Mode::try_from(&request.mode)?;

    tracing::info!(?mode, prompt_chars = prompt.chars().count(), "💬 Processing prompt");
    let response_text = state.ollama.chat(prompt).await;

    let response = match mode {
        Mode::Text => Json(json!({ "response": response_text })).into_response(),

        Mode::Audio => {
            let audio_path = state.speech.synthesize(&response_text).await?;
            let file_name = audio_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| AppError::Internal(format!("bad audio path {}", audio_path.display())))?;

            Json(json!({
                "response": response_text,
                "audio_url": format!("/static/audio/{}", file_name),
            }))
            .into_response()
        }

        Mode::Video => {
            let result = state.avatar.run(&response_text).await;
            match result.result_url {
                Some(video_url) => Json(json!({
                    "response": response_text,
                    "video_url": video_url,
                }))
                .into_response(),
                None => {
                    tracing::warn!(
                        reason = result.error_message.as_deref().unwrap_or("unknown"),
                        "Avatar video unavailable"
                    );
                    (
                        StatusCode::BAD_GATEWAY,
                        Json(json!({
                            "response": response_text,
                            "video_url": null,
                            "error": VIDEO_FAILED,
                        })),
                    )
                        .into_response()
                }
            }
        }
    };

    Ok(response)
}

pub fn process_routes() -> Router {
    Router::new().route("/process", post(process))
}

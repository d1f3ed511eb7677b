// src/speech.rs
// Text-to-speech via the Google Translate speech endpoint.
// Each call writes a fresh <uuid>.mp3 into the audio directory.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

use crate::config::SpeechConfig;

/// The endpoint refuses longer `q` values.
const MAX_CHUNK_CHARS: usize = 100;
const SEGMENT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "Mozilla/5.0 (compatible; avatar-chat)";

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("No text to speak")]
    EmptyText,

    #[error("TTS request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TTS API error ({status}) on segment {segment}")]
    Api { status: StatusCode, segment: usize },

    #[error("Failed to write audio file: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` and return the path of the written audio file.
    async fn synthesize(&self, text: &str) -> Result<PathBuf, SpeechError>;
}

#[derive(Clone)]
pub struct GoogleTts {
    client: Client,
    base_url: String,
    lang: String,
    audio_dir: PathBuf,
}

impl GoogleTts {
    pub fn new(base_url: impl Into<String>, lang: impl Into<String>, audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            lang: lang.into(),
            audio_dir: audio_dir.into(),
        }
    }

    pub fn from_config(config: &SpeechConfig, audio_dir: &Path) -> Self {
        Self::new(config.base_url.clone(), config.lang.clone(), audio_dir)
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    async fn fetch_segment(&self, chunk: &str, idx: usize, total: usize) -> Result<Vec<u8>, SpeechError> {
        let url = format!("{}/translate_tts", self.base_url);
        let total = total.to_string();
        let idx_param = idx.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self.client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.lang.as_str()),
                ("q", chunk),
                ("total", total.as_str()),
                ("idx", idx_param.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .timeout(SEGMENT_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SpeechError::Api { status: response.status(), segment: idx });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str) -> Result<PathBuf, SpeechError> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        // MP3 frames concatenate cleanly, so segments are simply appended.
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            audio.extend(self.fetch_segment(chunk, idx, chunks.len()).await?);
        }

        tokio::fs::create_dir_all(&self.audio_dir).await?;
        let audio_path = self.audio_dir.join(format!("{}.mp3", Uuid::new_v4()));
        tokio::fs::write(&audio_path, &audio).await?;

        tracing::info!(
            "🗣️ Synthesized {} segment(s), {} bytes -> {}",
            chunks.len(),
            audio.len(),
            audio_path.display()
        );
        Ok(audio_path)
    }
}

/// Split `text` into pieces of at most `max_chars` characters on whitespace.
/// Words longer than the limit are cut mid-word.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

// src/config.rs
//! Process-wide configuration, read once at startup and handed to each client.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_STATIC_DIR: &str = "static";

pub const DEFAULT_DID_BASE_URL: &str = "https://api.d-id.com";
pub const DEFAULT_AVATAR_ID: &str = "amy";
pub const DEFAULT_VOICE_PROVIDER: &str = "microsoft";
pub const DEFAULT_VOICE_ID: &str = "en-US-JennyMultilingualNeural";
pub const DEFAULT_POLL_ATTEMPTS: u32 = 30;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

pub const DEFAULT_TTS_URL: &str = "https://translate.google.com";
pub const DEFAULT_TTS_LANG: &str = "en";

/// Values shipped in sample env files that must not be sent as a credential.
const PLACEHOLDER_API_KEYS: &[&str] = &[
    "YOUR_DID_API_KEY",
    "REPLACE_ME_WITH_BASE64_BASIC_KEY",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

/// D-ID talks settings. `api_key` is `None` when the feature is disabled.
#[derive(Debug, Clone)]
pub struct DidConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub avatar_id: String,
    pub voice_provider: String,
    pub voice_id: String,
    pub poll_attempts: u32,
    pub poll_interval: Duration,
}

impl Default for DidConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_DID_BASE_URL.to_string(),
            avatar_id: DEFAULT_AVATAR_ID.to_string(),
            voice_provider: DEFAULT_VOICE_PROVIDER.to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub base_url: String,
    pub lang: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub static_dir: PathBuf,
    pub did: DidConfig,
    pub ollama: OllamaConfig,
    pub speech: SpeechConfig,
}

impl AppConfig {
    /// Read configuration from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup, so tests never touch the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let poll_attempts = parse_positive(&lookup, "DID_POLL_ATTEMPTS", DEFAULT_POLL_ATTEMPTS as u64)?;
        let poll_interval_secs =
            parse_positive(&lookup, "DID_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;

        let did = DidConfig {
            api_key: normalize_api_key(lookup("DID_API_KEY")),
            base_url: get("DID_BASE_URL", DEFAULT_DID_BASE_URL),
            avatar_id: get("DID_AVATAR_ID", DEFAULT_AVATAR_ID),
            voice_provider: get("DID_VOICE_PROVIDER", DEFAULT_VOICE_PROVIDER),
            voice_id: get("DID_VOICE_ID", DEFAULT_VOICE_ID),
            poll_attempts: u32::try_from(poll_attempts).map_err(|_| ConfigError::InvalidNumber {
                key: "DID_POLL_ATTEMPTS",
                value: poll_attempts.to_string(),
            })?,
            poll_interval: Duration::from_secs(poll_interval_secs),
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR", DEFAULT_BIND_ADDR),
            static_dir: PathBuf::from(get("STATIC_DIR", DEFAULT_STATIC_DIR)),
            did,
            ollama: OllamaConfig {
                base_url: get("OLLAMA_URL", DEFAULT_OLLAMA_URL),
                model: get("OLLAMA_MODEL", DEFAULT_OLLAMA_MODEL),
            },
            speech: SpeechConfig {
                base_url: get("TTS_URL", DEFAULT_TTS_URL),
                lang: get("TTS_LANG", DEFAULT_TTS_LANG),
            },
        })
    }

    /// Synthesized speech is written here and served under `/static/audio/`.
    pub fn audio_dir(&self) -> PathBuf {
        self.static_dir.join("audio")
    }

    pub fn video_dir(&self) -> PathBuf {
        self.static_dir.join("video")
    }
}

/// Drop empty and placeholder credentials so the avatar feature stays disabled.
pub fn normalize_api_key(raw: Option<String>) -> Option<String> {
    let key = raw?.trim().to_string();
    if key.is_empty() || PLACEHOLDER_API_KEYS.contains(&key.as_str()) {
        return None;
    }
    Some(key)
}

fn parse_positive<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_string()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => match v.parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::InvalidNumber { key, value: v }),
        },
    }
}

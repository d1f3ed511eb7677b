// lib.rs - Library root shared by the server binary and the integration tests
pub mod avatar;
pub mod config;
pub mod did_client;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ollama_client;
pub mod speech;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub use avatar::{AvatarVideoWorkflow, PollOutcome, WorkflowResult};
pub use config::AppConfig;
pub use error::AppError;

// AppState holds the configuration plus one client per collaborator: the local model,
// speech synthesis and the avatar video workflow
pub struct AppState {
    pub config: AppConfig,
    pub ollama: ollama_client::OllamaClient,
    pub speech: Arc<dyn speech::SpeechSynthesizer>,
    pub avatar: AvatarVideoWorkflow,
}

impl AppState {
    /// Build every client from configuration. `shutdown` stops in-flight video polls.
    pub fn from_config(config: AppConfig, shutdown: CancellationToken) -> Self {
        let ollama = ollama_client::OllamaClient::from_config(&config.ollama);
        let speech = Arc::new(speech::GoogleTts::from_config(&config.speech, &config.audio_dir()));
        let avatar = AvatarVideoWorkflow::from_config(&config.did).with_shutdown(shutdown);

        Self {
            config,
            ollama,
            speech,
            avatar,
        }
    }
}

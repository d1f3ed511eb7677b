use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use avatar_chat::{handlers, AppConfig, AppState};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging().expect("Failed to initialize logging");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Synthesized audio lands in static/audio; static/video sits alongside it
    for dir in [config.audio_dir(), config.video_dir()] {
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!("Failed to create {} directory: {}", dir.display(), e);
        } else {
            tracing::info!("{} directory ready", dir.display());
        }
    }

    if config.did.api_key.is_some() {
        tracing::info!("Initializing D-ID avatar client (avatar: {})...", config.did.avatar_id);
    } else {
        tracing::warn!("DID_API_KEY not found. Video mode will answer with 502.");
        tracing::info!("To enable avatar videos, set: DID_API_KEY");
    }
    tracing::info!("Using Ollama model {} at {}", config.ollama.model, config.ollama.base_url);

    let shutdown = CancellationToken::new();
    let bind_addr = config.bind_addr.clone();
    let shared_state = Arc::new(AppState::from_config(config, shutdown.clone()));
    let app = handlers::router(shared_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {}: {}", bind_addr, e));
    tracing::info!("listening on {}", listener.local_addr().expect("bound listener has an address"));

    axum::serve(listener, app.into_make_service_with_connect_info::<std::net::SocketAddr>())
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .expect("server error");
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown requested, cancelling in-flight video polls");
    shutdown.cancel();
}

// Production-grade logging configuration
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                "debug,avatar_chat=trace,reqwest=info,hyper=info,tower=info".to_string()
            } else {
                "info,avatar_chat=info,reqwest=warn,hyper=warn,tower=warn".to_string()
            }
        });

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for log aggregation
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!("🧑‍🚀 Avatar chat starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Build mode: {}", if cfg!(debug_assertions) { "development" } else { "production" });
    tracing::info!("Log level: {}", log_level);

    Ok(())
}

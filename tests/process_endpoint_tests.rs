//! End-to-end tests for `POST /process` and the static routes.
//!
//! The router is served on an ephemeral port; Ollama, the speech endpoint and
//! D-ID are all wiremock servers.

use std::collections::HashMap;
use std::sync::Arc;

use avatar_chat::ollama_client::FALLBACK_RESPONSE;
use avatar_chat::{handlers, AppConfig, AppState};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestApp {
    base_url: String,
    http: reqwest::Client,
    ollama: MockServer,
    tts: MockServer,
    did: MockServer,
    static_dir: tempfile::TempDir,
}

impl TestApp {
    async fn spawn(did_key: Option<&str>) -> Self {
        let ollama = MockServer::start().await;
        let tts = MockServer::start().await;
        let did = MockServer::start().await;
        let static_dir = tempfile::tempdir().unwrap();

        let mut vars = HashMap::from([
            ("OLLAMA_URL".to_string(), ollama.uri()),
            ("TTS_URL".to_string(), tts.uri()),
            ("DID_BASE_URL".to_string(), did.uri()),
            ("DID_POLL_ATTEMPTS".to_string(), "3".to_string()),
            ("DID_POLL_INTERVAL_SECS".to_string(), "1".to_string()),
            ("STATIC_DIR".to_string(), static_dir.path().display().to_string()),
        ]);
        if let Some(key) = did_key {
            vars.insert("DID_API_KEY".to_string(), key.to_string());
        }
        let config = AppConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();

        let state = Arc::new(AppState::from_config(config, CancellationToken::new()));
        let app = handlers::router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            http: reqwest::Client::new(),
            ollama,
            tts,
            did,
            static_dir,
        }
    }

    async fn model_replies(&self, text: &str) {
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": text})))
            .mount(&self.ollama)
            .await;
    }

    async fn process(&self, body: Value) -> (u16, Value) {
        let response = self.http
            .post(format!("{}/process", self.base_url))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }
}

// === Validation ===

#[tokio::test]
async fn test_empty_prompt_is_rejected_without_calling_the_model() {
    let app = TestApp::spawn(None).await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&app.ollama).await;

    let (status, body) = app.process(json!({"prompt": "   ", "mode": "text"})).await;

    assert_eq!(status, 400);
    assert_eq!(body, json!({"error": "Prompt is empty."}));
}

#[tokio::test]
async fn test_missing_body_reads_as_empty_prompt() {
    let app = TestApp::spawn(None).await;

    let response = app.http.post(format!("{}/process", app.base_url)).send().await.unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Prompt is empty.");
}

#[tokio::test]
async fn test_invalid_mode_is_rejected() {
    let app = TestApp::spawn(None).await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&app.ollama).await;

    let (status, body) = app.process(json!({"prompt": "hi", "mode": "hologram"})).await;

    assert_eq!(status, 400);
    assert_eq!(body, json!({"error": "Invalid mode selected."}));
}

#[tokio::test]
async fn test_null_or_numeric_mode_is_an_invalid_mode() {
    let app = TestApp::spawn(None).await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&app.ollama).await;

    for mode in [Value::Null, json!(7)] {
        let (status, body) = app.process(json!({"prompt": "hi", "mode": mode})).await;
        assert_eq!(status, 400);
        assert_eq!(body, json!({"error": "Invalid mode selected."}));
    }
}

// === Text ===

#[tokio::test]
async fn test_text_mode_returns_model_output() {
    let app = TestApp::spawn(None).await;
    app.model_replies("Hello, human.").await;

    let (status, body) = app.process(json!({"prompt": "Say hello"})).await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({"response": "Hello, human."}));
}

#[tokio::test]
async fn test_model_failure_still_answers_200_with_fallback() {
    let app = TestApp::spawn(None).await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.ollama)
        .await;

    let (status, body) = app.process(json!({"prompt": "hi", "mode": "text"})).await;

    assert_eq!(status, 200);
    assert_eq!(body["response"], FALLBACK_RESPONSE);
}

// === Audio ===

#[tokio::test]
async fn test_audio_mode_writes_mp3_and_serves_it() {
    let app = TestApp::spawn(None).await;
    app.model_replies("Short answer.").await;
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .and(query_param("q", "Short answer."))
        .and(query_param("tl", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3fake-mp3".to_vec()))
        .expect(1)
        .mount(&app.tts)
        .await;

    let (status, body) = app.process(json!({"prompt": "hi", "mode": "audio"})).await;

    assert_eq!(status, 200);
    assert_eq!(body["response"], "Short answer.");
    let audio_url = body["audio_url"].as_str().unwrap();
    assert!(audio_url.starts_with("/static/audio/") && audio_url.ends_with(".mp3"), "{audio_url}");

    let file_name = audio_url.trim_start_matches("/static/audio/");
    let on_disk = std::fs::read(app.static_dir.path().join("audio").join(file_name)).unwrap();
    assert_eq!(on_disk, b"ID3fake-mp3");

    let served = app.http.get(format!("{}{}", app.base_url, audio_url)).send().await.unwrap();
    assert_eq!(served.status().as_u16(), 200);
    assert_eq!(served.bytes().await.unwrap().as_ref(), b"ID3fake-mp3");
}

#[tokio::test]
async fn test_audio_mode_speech_failure_is_500() {
    let app = TestApp::spawn(None).await;
    app.model_replies("Something to say.").await;
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&app.tts)
        .await;

    let (status, body) = app.process(json!({"prompt": "hi", "mode": "audio"})).await;

    assert_eq!(status, 500);
    assert_eq!(body, json!({"error": "Internal server error"}));
}

// === Video ===

#[tokio::test]
async fn test_video_mode_returns_result_url() {
    let app = TestApp::spawn(Some("test-key")).await;
    app.model_replies("I am an avatar.").await;
    Mock::given(method("POST"))
        .and(path("/talks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "abc"})))
        .mount(&app.did)
        .await;
    Mock::given(method("GET"))
        .and(path("/talks/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "done",
            "result_url": "https://x/video.mp4"
        })))
        .mount(&app.did)
        .await;

    let (status, body) = app.process(json!({"prompt": "hi", "mode": "video"})).await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({"response": "I am an avatar.", "video_url": "https://x/video.mp4"}));
}

#[tokio::test]
async fn test_video_mode_without_key_is_502_with_null_url() {
    let app = TestApp::spawn(None).await;
    app.model_replies("No avatar today.").await;

    let (status, body) = app.process(json!({"prompt": "hi", "mode": "video"})).await;

    assert_eq!(status, 502);
    assert_eq!(
        body,
        json!({
            "response": "No avatar today.",
            "video_url": null,
            "error": "Video generation failed."
        })
    );
    assert!(app.did.received_requests().await.unwrap().is_empty());
}

// === Static routes ===

#[tokio::test]
async fn test_index_and_health() {
    let app = TestApp::spawn(None).await;

    let index = app.http.get(format!("{}/", app.base_url)).send().await.unwrap();
    assert_eq!(index.status().as_u16(), 200);
    let page = index.text().await.unwrap();
    assert!(page.contains("/process"));
    assert!(page.contains("localStorage") && page.contains("new-chat-btn"));

    let health: Value = app.http
        .get(format!("{}/health", app.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"status": "ok"}));
}

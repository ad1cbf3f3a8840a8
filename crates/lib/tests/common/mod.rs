//! Shared helpers: mock completion and LINE servers, a relay config pointing at them, a running relay.

#![allow(dead_code)]

use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use relay_core::channels::LineChannel;
use relay_core::config::Config;
use relay_core::gateway::{GatewayState, VersionSource};
use relay_core::llm::OpenAiClient;
use relay_core::storage::FileStorage;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SECRET: &str = "integration-secret";

pub fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("relay-it-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock");
    let addr = listener.local_addr().expect("mock addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

/// Mock `/completions`: records prompts; answers with `reply` or fails with 500 when `reply` is None.
pub async fn mock_completions(reply: Option<&'static str>) -> (String, Arc<Mutex<Vec<String>>>) {
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let seen = prompts.clone();
    let app = Router::new().route(
        "/completions",
        post(move |Json(body): Json<serde_json::Value>| {
            let seen = seen.clone();
            async move {
                let prompt = body["prompt"].as_str().unwrap_or("").to_string();
                seen.lock().unwrap().push(prompt);
                match reply {
                    Some(text) => (
                        StatusCode::OK,
                        Json(serde_json::json!({ "choices": [{ "text": format!("\n\n{}", text) }] })),
                    ),
                    None => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(serde_json::json!({ "error": { "message": "boom" } })),
                    ),
                }
            }
        }),
    );
    (serve(app).await, prompts)
}

/// Mock LINE reply API: records `(authorization, replyToken, text)`.
pub async fn mock_line() -> (String, Arc<Mutex<Vec<(String, String, String)>>>) {
    let replies = Arc::new(Mutex::new(Vec::new()));
    let seen = replies.clone();
    let app = Router::new().route(
        "/v2/bot/message/reply",
        post(move |headers: HeaderMap, Json(body): Json<serde_json::Value>| {
            let seen = seen.clone();
            async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                let token = body["replyToken"].as_str().unwrap_or("").to_string();
                let text = body["messages"][0]["text"].as_str().unwrap_or("").to_string();
                seen.lock().unwrap().push((auth, token, text));
                Json(serde_json::json!({}))
            }
        }),
    );
    (serve(app).await, replies)
}

pub fn relay_config(openai_base: String, line_base: String) -> Config {
    let mut config = Config::default();
    config.server.bind = "127.0.0.1".to_string();
    config.line.api_base_url = line_base;
    config.openai.base_url = openai_base;
    config.storage.path = Some(temp_dir().join("storage.json"));
    config
}

/// State built from explicit credentials, so LINE_CHANNEL_SECRET and friends in the
/// environment cannot change what the test signs against.
pub fn relay_state(config: Config) -> GatewayState {
    let completer = OpenAiClient::new(&config.openai, "sk-integration".to_string())
        .expect("completion client");
    let dispatcher = LineChannel::new(&config.line, "line-access-token".to_string())
        .expect("line channel");
    let storage_path = config
        .storage
        .path
        .clone()
        .unwrap_or_else(|| temp_dir().join("storage.json"));
    GatewayState {
        channel_secret: Arc::from(SECRET),
        completer: Arc::new(completer),
        dispatcher: Arc::new(dispatcher),
        storage: Arc::new(FileStorage::new(storage_path)),
        versions: VersionSource::new(config.version.source_url.clone()),
        config: Arc::new(config),
    }
}

/// Serve the relay on a free local port and wait until `GET /` answers.
pub async fn start_relay(config: Config) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind relay");
    let base = format!("http://{}", listener.local_addr().expect("relay addr"));
    let state = relay_state(config);
    tokio::spawn(async move {
        let _ = relay_core::gateway::serve(listener, state).await;
    });
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client");
    for _ in 0..100 {
        if client.get(format!("{}/", base)).send().await.is_ok() {
            return base;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("relay did not come up on {} within 5s", base);
}

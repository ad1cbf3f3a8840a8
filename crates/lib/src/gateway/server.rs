//! Relay HTTP server (single port).

use crate::channels::{InboundBatch, LineChannel, ReplyDispatcher};
use crate::config::{self, Config};
use crate::gateway::version::{current_version, HealthResponse, VersionSource};
use crate::llm::{CompletionBackend, OpenAiClient};
use crate::routing::{self, PipelineError, ProcessReport};
use crate::signature::{self, SignatureError, SIGNATURE_HEADER};
use crate::storage::{FileStorage, Storage};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Shared state for the server: config, backends, storage handle.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    /// Resolved LINE channel secret (env or config).
    pub channel_secret: Arc<str>,
    pub completer: Arc<dyn CompletionBackend>,
    pub dispatcher: Arc<dyn ReplyDispatcher>,
    pub storage: Arc<dyn Storage>,
    pub versions: VersionSource,
}

impl GatewayState {
    /// Resolve credentials once and build the OpenAI, LINE and storage collaborators.
    pub fn from_config(config: Config) -> Result<Self> {
        let channel_secret = config::resolve_channel_secret(&config).context(
            "LINE channel secret not configured (set line.channelSecret or LINE_CHANNEL_SECRET)",
        )?;
        let access_token = config::resolve_channel_access_token(&config).context(
            "LINE channel access token not configured (set line.channelAccessToken or LINE_CHANNEL_ACCESS_TOKEN)",
        )?;
        let api_key = config::resolve_openai_api_key(&config)
            .context("OpenAI API key not configured (set openai.apiKey or OPENAI_API_KEY)")?;

        let completer = OpenAiClient::new(&config.openai, api_key)?;
        let dispatcher = LineChannel::new(&config.line, access_token)?;
        let storage = FileStorage::new(config::resolve_storage_path(&config));
        let versions = VersionSource::new(config.version.source_url.clone());
        Ok(Self {
            config: Arc::new(config),
            channel_secret: Arc::from(channel_secret),
            completer: Arc::new(completer),
            dispatcher: Arc::new(dispatcher),
            storage: Arc::new(storage),
            versions,
        })
    }
}

/// Why a webhook request did not finish with 200.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("signature rejected: {0}")]
    Signature(#[from] SignatureError),
    #[error("malformed webhook body: {0}")]
    MalformedBody(#[from] serde_json::Error),
    #[error("storage initialization failed: {0:#}")]
    Storage(anyhow::Error),
    #[error("processing failed: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Routes: `GET /` and `POST {server.webhookPath}`.
pub fn build_router(state: GatewayState) -> Router {
    let webhook_path = config::normalize_webhook_path(&state.config.server.webhook_path);
    Router::new()
        .route("/", get(health_http))
        .route(&webhook_path, post(line_webhook))
        .with_state(state)
}

/// Start the server with the given config and serve until SIGINT/SIGTERM.
pub async fn run_gateway(config: Config) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.bind.trim(), config.server.port);
    let state = GatewayState::from_config(config)?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    serve(listener, state).await
}

/// Serve an already-built state on a bound listener until SIGINT/SIGTERM.
pub async fn serve(listener: tokio::net::TcpListener, state: GatewayState) -> Result<()> {
    let webhook_path = config::normalize_webhook_path(&state.config.server.webhook_path);
    let local_addr = listener
        .local_addr()
        .context("reading listener address")?;
    log::info!("relay listening on {} (webhook {})", local_addr, webhook_path);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("relay server exited")?;
    log::info!("relay stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// AUTH → PROCESS. Signature is checked against the raw body before anything is parsed.
async fn handle_webhook(
    state: &GatewayState,
    headers: &HeaderMap,
    body: &[u8],
    report: &mut ProcessReport,
) -> Result<(), WebhookError> {
    let claimed = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    signature::verify_signature(&state.channel_secret, body, claimed)?;

    let batch: InboundBatch = serde_json::from_slice(body)?;
    state
        .storage
        .initialize()
        .await
        .map_err(WebhookError::Storage)?;
    routing::process_events(
        &batch.events,
        state.completer.as_ref(),
        state.dispatcher.as_ref(),
        report,
    )
    .await?;
    Ok(())
}

/// POST {webhookPath} — LINE webhook. 200 on full-batch success, 401 on bad signature,
/// 400 on an unparseable body, 500 on any processing failure.
async fn line_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let mut report = ProcessReport::default();
    let status = match handle_webhook(&state, &headers, &body, &mut report).await {
        Ok(()) => {
            log::debug!(
                "webhook: {} replied, {} skipped",
                report.delivered.len(),
                report.skipped
            );
            StatusCode::OK
        }
        Err(WebhookError::Signature(e)) => {
            log::warn!("webhook: rejected request: {}", e);
            StatusCode::UNAUTHORIZED
        }
        Err(e @ WebhookError::MalformedBody(_)) => {
            log::warn!("webhook: {}", e);
            StatusCode::BAD_REQUEST
        }
        Err(e @ (WebhookError::Storage(_) | WebhookError::Pipeline(_))) => {
            log::error!("webhook: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if state.config.server.debug {
        print_exchanges(&report);
    }
    status
}

/// Debug mode: dump what was asked and answered in this request, including exchanges
/// delivered before a failure.
fn print_exchanges(report: &ProcessReport) {
    for (i, exchange) in report.delivered.iter().enumerate() {
        log::info!("[{}] prompt: {}", i, exchange.prompt);
        log::info!("[{}] reply: {}", i, exchange.reply);
    }
}

/// GET / — 302 to server.appUrl when set, else status and version JSON.
async fn health_http(State(state): State<GatewayState>) -> Response {
    let app_url = state
        .config
        .server
        .app_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());
    if let Some(url) = app_url {
        return (StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response();
    }
    let latest_version = state.versions.latest().await;
    Json(HealthResponse {
        status: "OK".to_string(),
        current_version: current_version().to_string(),
        latest_version,
    })
    .into_response()
}

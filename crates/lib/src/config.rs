//! Configuration types and loading.
//!
//! Config is loaded once from a JSON file (e.g. `~/.relay/config.json`) and environment,
//! then passed by reference into the clients. Pipeline code never reads the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings (port, webhook path, redirect, debug).
    #[serde(default)]
    pub server: ServerConfig,

    /// LINE Messaging API credentials and endpoint.
    #[serde(default)]
    pub line: LineConfig,

    /// Completion backend settings (OpenAI-compatible).
    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub version: VersionConfig,
}

/// Server bind, port, webhook path and health behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for HTTP (default 3000).
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_server_bind")]
    pub bind: String,

    /// Path LINE POSTs webhook events to (default "/webhook").
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,

    /// When set, `GET /` redirects here instead of returning the health JSON.
    #[serde(default)]
    pub app_url: Option<String>,

    /// Print each processed exchange after a webhook request.
    #[serde(default)]
    pub debug: bool,
}

fn default_server_port() -> u16 {
    3000
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_webhook_path() -> String {
    "/webhook".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
            webhook_path: default_webhook_path(),
            app_url: None,
            debug: false,
        }
    }
}

/// LINE channel config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineConfig {
    /// Channel secret used to verify `x-line-signature`. Overridden by LINE_CHANNEL_SECRET env.
    #[serde(default)]
    pub channel_secret: Option<String>,
    /// Long-lived channel access token for the reply API. Overridden by LINE_CHANNEL_ACCESS_TOKEN env.
    #[serde(default)]
    pub channel_access_token: Option<String>,
    /// Messaging API base (default "https://api.line.me").
    #[serde(default = "default_line_api_base")]
    pub api_base_url: String,
    /// Reply call timeout in seconds (default 10).
    #[serde(default = "default_line_timeout")]
    pub timeout_secs: u64,
}

fn default_line_api_base() -> String {
    "https://api.line.me".to_string()
}

fn default_line_timeout() -> u64 {
    10
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            channel_secret: None,
            channel_access_token: None,
            api_base_url: default_line_api_base(),
            timeout_secs: default_line_timeout(),
        }
    }
}

/// Completion backend config. Model and length are fixed here, never derived from input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiConfig {
    /// API key. Overridden by OPENAI_API_KEY env.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL up to and including the version segment (default "https://api.openai.com/v1").
    #[serde(default = "default_openai_base")]
    pub base_url: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Completion call timeout in seconds (default 30).
    #[serde(default = "default_openai_timeout")]
    pub timeout_secs: u64,
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4".to_string()
}

fn default_max_tokens() -> u32 {
    200
}

fn default_openai_timeout() -> u64 {
    30
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base(),
            model: default_openai_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_openai_timeout(),
        }
    }
}

/// Storage location. Default is `storage.json` next to the default config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Where `GET /` looks up the latest published version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionConfig {
    /// URL of a JSON document with a top-level `version` string. Unset → latestVersion is null.
    #[serde(default)]
    pub source_url: Option<String>,
}

/// Non-empty trimmed env var value.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn config_value(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve the LINE channel secret: env LINE_CHANNEL_SECRET overrides config.
pub fn resolve_channel_secret(config: &Config) -> Option<String> {
    env_value("LINE_CHANNEL_SECRET").or_else(|| config_value(config.line.channel_secret.as_ref()))
}

/// Resolve the LINE channel access token: env LINE_CHANNEL_ACCESS_TOKEN overrides config.
pub fn resolve_channel_access_token(config: &Config) -> Option<String> {
    env_value("LINE_CHANNEL_ACCESS_TOKEN")
        .or_else(|| config_value(config.line.channel_access_token.as_ref()))
}

/// Resolve the completion API key: env OPENAI_API_KEY overrides config.
pub fn resolve_openai_api_key(config: &Config) -> Option<String> {
    env_value("OPENAI_API_KEY").or_else(|| config_value(config.openai.api_key.as_ref()))
}

/// Normalise the webhook path so it always starts with a single '/'.
pub fn normalize_webhook_path(path: &str) -> String {
    let p = path.trim().trim_start_matches('/');
    format!("/{}", p)
}

fn relay_home() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".relay"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("RELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| relay_home().join("config.json"))
}

/// Resolve the storage file: `storage.path` when set, else `~/.relay/storage.json`.
pub fn resolve_storage_path(config: &Config) -> PathBuf {
    match &config.storage.path {
        Some(p) if !p.as_os_str().is_empty() => p.clone(),
        _ => relay_home().join("storage.json"),
    }
}

/// Load config from the given path (or RELAY_CONFIG_PATH / default). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_deployment() {
        let c = Config::default();
        assert_eq!(c.server.port, 3000);
        assert_eq!(c.server.webhook_path, "/webhook");
        assert_eq!(c.openai.model, "gpt-4");
        assert_eq!(c.openai.max_tokens, 200);
        assert_eq!(c.line.api_base_url, "https://api.line.me");
        assert!(!c.server.debug);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let c: Config = serde_json::from_str(
            r#"{"server":{"webhookPath":"/hook","debug":true},"openai":{"maxTokens":64}}"#,
        )
        .unwrap();
        assert_eq!(c.server.webhook_path, "/hook");
        assert!(c.server.debug);
        assert_eq!(c.server.port, 3000);
        assert_eq!(c.openai.max_tokens, 64);
        assert_eq!(c.openai.model, "gpt-4");
    }

    #[test]
    fn blank_config_values_are_ignored() {
        assert_eq!(config_value(Some(&"  ".to_string())), None);
        assert_eq!(config_value(Some(&" abc ".to_string())), Some("abc".to_string()));
    }

    #[test]
    fn webhook_path_is_normalized() {
        assert_eq!(normalize_webhook_path("webhook"), "/webhook");
        assert_eq!(normalize_webhook_path("//line/hook"), "/line/hook");
        assert_eq!(normalize_webhook_path("/api/webhook"), "/api/webhook");
    }

    #[test]
    fn storage_path_override() {
        let mut c = Config::default();
        c.storage.path = Some(PathBuf::from("/var/lib/relay/store.json"));
        assert_eq!(
            resolve_storage_path(&c),
            PathBuf::from("/var/lib/relay/store.json")
        );
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let path = std::env::temp_dir().join("relay-config-test-does-not-exist.json");
        let (c, used) = load_config(Some(path.clone())).unwrap();
        assert_eq!(used, path);
        assert_eq!(c.server.port, 3000);
    }
}

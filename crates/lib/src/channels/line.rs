//! LINE channel: reply via the Messaging API (`POST /v2/bot/message/reply`).

use crate::channels::reply::{DeliveryError, ReplyDispatcher};
use crate::config::LineConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const REPLY_PATH: &str = "/v2/bot/message/reply";

/// Reply request body: one reply token, one text message.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReplyEnvelope {
    pub reply_token: String,
    pub messages: Vec<OutgoingMessage>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutgoingMessage {
    Text { text: String },
}

impl ReplyEnvelope {
    pub fn text(reply_token: &str, text: &str) -> Self {
        Self {
            reply_token: reply_token.to_string(),
            messages: vec![OutgoingMessage::Text {
                text: text.to_string(),
            }],
        }
    }
}

/// LINE reply client, authenticated with the channel access token.
pub struct LineChannel {
    api_base: String,
    access_token: String,
    client: reqwest::Client,
}

impl LineChannel {
    pub fn new(config: &LineConfig, access_token: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("building line http client")?;
        Ok(Self {
            api_base: config.api_base_url.trim_end_matches('/').to_string(),
            access_token,
            client,
        })
    }

    /// Send a prepared envelope.
    pub async fn send_reply(&self, envelope: &ReplyEnvelope) -> Result<(), DeliveryError> {
        let url = format!("{}{}", self.api_base, REPLY_PATH);
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(envelope)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(DeliveryError::Api(format!("{} {}", status, body)));
        }
        Ok(())
    }
}

#[async_trait]
impl ReplyDispatcher for LineChannel {
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), DeliveryError> {
        self.send_reply(&ReplyEnvelope::text(reply_token, text)).await
    }
}

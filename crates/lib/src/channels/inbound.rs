//! Inbound webhook payload: `{ "destination": ..., "events": [...] }`.
//!
//! Event and message kinds are tagged on `type`. Kinds this relay does not answer decode to
//! `Unhandled` instead of failing the whole batch.

use serde::Deserialize;

/// One webhook call's events, in platform delivery order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundBatch {
    #[serde(default)]
    pub destination: Option<String>,
    /// Absent on LINE's endpoint verification call; treated as empty.
    #[serde(default)]
    pub events: Vec<InboundEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundEvent {
    Message {
        /// Absent for events delivered in standby mode; such events cannot be answered.
        #[serde(rename = "replyToken", default)]
        reply_token: Option<String>,
        message: EventMessage,
    },
    /// follow, unfollow, postback, join, ...
    #[serde(other)]
    Unhandled,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventMessage {
    Text {
        #[serde(default)]
        text: Option<String>,
    },
    /// image, sticker, location, ...
    #[serde(other)]
    Unhandled,
}

impl InboundEvent {
    /// `(text, reply_token)` when this is an answerable text message event; `None` for
    /// everything else, including text messages without a reply token or text.
    pub fn as_text_message(&self) -> Option<(&str, &str)> {
        match self {
            InboundEvent::Message {
                reply_token: Some(reply_token),
                message: EventMessage::Text { text: Some(text) },
            } => Some((text.as_str(), reply_token.as_str())),
            _ => None,
        }
    }
}

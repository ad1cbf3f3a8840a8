//! Reply delivery seam between the event router and a messaging platform.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("reply request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("reply api error: {0}")]
    Api(String),
}

/// Delivers one text reply addressed by a single-use reply token.
#[async_trait]
pub trait ReplyDispatcher: Send + Sync {
    /// Send `text` to the thread `reply_token` was issued for. Expired or reused tokens are
    /// rejected remotely and surface as [`DeliveryError::Api`]. Not retried.
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), DeliveryError>;
}

//! Messaging channel (LINE): inbound webhook event model and reply delivery.
//!
//! The gateway deserializes the webhook body into an [`InboundBatch`]; replies go out through a
//! [`ReplyDispatcher`], implemented for LINE by [`LineChannel`].

mod inbound;
mod line;
mod reply;

pub use inbound::{EventMessage, InboundBatch, InboundEvent};
pub use line::{LineChannel, OutgoingMessage, ReplyEnvelope};
pub use reply::{DeliveryError, ReplyDispatcher};

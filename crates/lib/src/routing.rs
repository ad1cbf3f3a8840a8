//! Event routing: walk a webhook batch in order, answer each text message with one completion.
//!
//! For every qualifying event the completion call and the reply call finish before the next
//! event starts. The first failure halts the batch and is returned; the router never logs.

use crate::channels::{DeliveryError, InboundEvent, ReplyDispatcher};
use crate::llm::{CompletionBackend, CompletionError};

/// A delivered prompt/reply pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub prompt: String,
    pub reply: String,
}

/// What a batch run got through. On failure it holds everything up to the failing event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Exchanges in delivery order.
    pub delivered: Vec<Exchange>,
    /// Events that were not text messages, or whose text was blank.
    pub skipped: usize,
}

/// Per-event failure that halted the batch. `index` is the event's position in the batch.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("event {index}: {source}")]
    Completion {
        index: usize,
        #[source]
        source: CompletionError,
    },
    #[error("event {index}: {source}")]
    Delivery {
        index: usize,
        #[source]
        source: DeliveryError,
    },
}

/// Process `events` strictly in order, fail-fast, recording progress into `report`.
pub async fn process_events<C, D>(
    events: &[InboundEvent],
    completer: &C,
    dispatcher: &D,
    report: &mut ProcessReport,
) -> Result<(), PipelineError>
where
    C: CompletionBackend + ?Sized,
    D: ReplyDispatcher + ?Sized,
{
    for (index, event) in events.iter().enumerate() {
        let Some((text, reply_token)) = event.as_text_message() else {
            report.skipped += 1;
            continue;
        };
        if text.trim().is_empty() {
            report.skipped += 1;
            continue;
        }
        let reply = completer
            .complete(text)
            .await
            .map_err(|source| PipelineError::Completion { index, source })?;
        dispatcher
            .reply(reply_token, &reply)
            .await
            .map_err(|source| PipelineError::Delivery { index, source })?;
        report.delivered.push(Exchange {
            prompt: text.to_string(),
            reply,
        });
    }
    Ok(())
}

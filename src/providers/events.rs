//! Intermediate event model produced by provider adapters
//!
//! Contract:
//! - A provider stream yields 0..n non-terminal events (`RoleAnnounced`, `TextDelta`)
//!   followed by at most one terminal event (`Completed` or `Failed`).
//! - Nothing is yielded after a terminal event.
//! - A stream that ends without a terminal event is treated as a failure by the consumer.

use std::pin::Pin;

use futures::Stream;

use crate::wire::FinishReason;

/// One step of a provider's reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The backend announced the assistant role
    RoleAnnounced,
    /// A fragment of reply text
    TextDelta(String),
    /// The reply is finished
    Completed(FinishReason),
    /// The backend failed after the call was accepted
    Failed(String),
}

impl ProviderEvent {
    /// Returns true for `Completed` and `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }
}

/// How a backend delivers reply text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Small fragments as they are generated; forwarded one chunk per fragment
    Incremental,
    /// Complete messages; re-segmented into word fragments before emission
    Whole,
}

/// Boxed stream of provider events
pub type EventStream = Pin<Box<dyn Stream<Item = ProviderEvent> + Send>>;

/// A lazy, finite, non-restartable event sequence from one provider call
pub struct ProviderStream {
    pub events: EventStream,
    pub delivery: Delivery,
}

impl ProviderStream {
    pub fn new(events: EventStream, delivery: Delivery) -> Self {
        Self { events, delivery }
    }
}

impl std::fmt::Debug for ProviderStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderStream")
            .field("delivery", &self.delivery)
            .finish_non_exhaustive()
    }
}

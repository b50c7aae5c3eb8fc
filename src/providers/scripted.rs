//! Scripted provider for tests
//!
//! Replays a fixed event list and records how far the consumer pulled, so
//! tests can observe backpressure and disconnect behavior.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;

use super::{
    Completion, CompletionProvider, Delivery, ProviderCall, ProviderError, ProviderEvent,
    ProviderStream,
};
use crate::wire::FinishReason;

/// Observes a scripted stream from the outside
#[derive(Debug, Clone, Default)]
pub struct StreamProbe {
    pulled: Arc<AtomicUsize>,
    dropped: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
    last_call: Arc<std::sync::Mutex<Option<ProviderCall>>>,
}

impl StreamProbe {
    /// Events handed to the consumer so far
    pub fn pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }

    /// Whether the event stream has been dropped
    pub fn dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }

    /// Number of `complete` and `stream` calls
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent call
    pub fn last_call(&self) -> Option<ProviderCall> {
        self.last_call
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: &ProviderCall) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_call
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(call.clone());
    }
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Provider that replays a fixed script
pub struct ScriptedProvider {
    name: &'static str,
    display_name: &'static str,
    available: bool,
    default_model: String,
    delivery: Delivery,
    events: Vec<ProviderEvent>,
    start_failure: Option<u16>,
    probe: StreamProbe,
}

impl ScriptedProvider {
    /// An available provider replying "Hi there"
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            display_name: "Scripted",
            available: true,
            default_model: "scripted-model".to_string(),
            delivery: Delivery::Incremental,
            events: vec![
                ProviderEvent::TextDelta("Hi there".to_string()),
                ProviderEvent::Completed(FinishReason::Stop),
            ],
            start_failure: None,
            probe: StreamProbe::default(),
        }
    }

    /// Reply with `text` as one whole message
    pub fn replying(name: &'static str, text: &str) -> Self {
        Self::new(name)
            .with_delivery(Delivery::Whole)
            .with_events(vec![
                ProviderEvent::TextDelta(text.to_string()),
                ProviderEvent::Completed(FinishReason::Stop),
            ])
    }

    pub fn with_events(mut self, events: Vec<ProviderEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn with_default_model(mut self, model: &str) -> Self {
        self.default_model = model.to_string();
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Fail before any event with the given upstream status
    pub fn failing_with_status(mut self, status: u16) -> Self {
        self.start_failure = Some(status);
        self
    }

    pub fn probe(&self) -> StreamProbe {
        self.probe.clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn display_name(&self) -> &'static str {
        self.display_name
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn empty_reply(&self) -> &'static str {
        "Nothing to say."
    }

    async fn complete(&self, call: &ProviderCall) -> Result<Completion, ProviderError> {
        self.probe.record(call);
        if let Some(status) = self.start_failure {
            return Err(ProviderError::from_status(status, "scripted failure".to_string()));
        }

        let mut content = String::new();
        let mut finish_reason = FinishReason::Stop;
        for event in &self.events {
            match event {
                ProviderEvent::TextDelta(text) => content.push_str(text),
                ProviderEvent::Completed(reason) => {
                    finish_reason = *reason;
                    break;
                }
                ProviderEvent::Failed(message) => {
                    return Err(ProviderError::Stream(message.clone()))
                }
                ProviderEvent::RoleAnnounced => {}
            }
        }
        Ok(Completion {
            content,
            finish_reason,
        })
    }

    async fn stream(&self, call: &ProviderCall) -> Result<ProviderStream, ProviderError> {
        self.probe.record(call);
        if let Some(status) = self.start_failure {
            return Err(ProviderError::from_status(status, "scripted failure".to_string()));
        }

        let flag = DropFlag(self.probe.dropped.clone());
        let pulled = self.probe.pulled.clone();
        let events = futures::stream::iter(self.events.clone()).map(move |event| {
            let _alive = &flag;
            pulled.fetch_add(1, Ordering::SeqCst);
            event
        });

        Ok(ProviderStream::new(Box::pin(events), self.delivery))
    }
}

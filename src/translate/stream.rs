//! Stream translator
//!
//! Turns a provider's event stream into OpenAI `chat.completion.chunk` SSE frames.
//!
//! Guarantees for every stream that starts:
//! - the role chunk is the first frame and appears once
//! - `data: [DONE]` is the last frame and appears once
//! - every chunk carries the same `id` and `created`
//! - nothing is pulled from the provider after a terminal event

use std::convert::Infallible;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use super::ResponseMeta;
use crate::providers::{Delivery, EventStream, ProviderError, ProviderEvent, ProviderStream};
use crate::routes::metrics;
use crate::streaming::{format_sse_chunk, format_sse_done};
use crate::wire::{Delta, FinishReason, Role, StreamChoice, StreamChunk};

const CHUNK_OBJECT: &str = "chat.completion.chunk";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslatorState {
    /// Nothing emitted yet
    Start,
    /// Role chunk emitted, no content yet
    RoleSent,
    /// At least one content chunk emitted
    Streaming,
    /// `[DONE]` emitted
    Terminated,
}

/// How a translated stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Failed,
    /// The provider stream ended without a terminal event
    Truncated,
}

impl StreamOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamOutcome::Completed => "completed",
            StreamOutcome::Failed => "failed",
            StreamOutcome::Truncated => "truncated",
        }
    }
}

/// Event-at-a-time state machine producing SSE frames
#[derive(Debug)]
pub struct StreamTranslator {
    meta: ResponseMeta,
    delivery: Delivery,
    empty_reply: &'static str,
    state: TranslatorState,
    content_chunks: u64,
    outcome: Option<StreamOutcome>,
}

impl StreamTranslator {
    pub fn new(meta: ResponseMeta, delivery: Delivery, empty_reply: &'static str) -> Self {
        Self {
            meta,
            delivery,
            empty_reply,
            state: TranslatorState::Start,
            content_chunks: 0,
            outcome: None,
        }
    }

    pub fn meta(&self) -> &ResponseMeta {
        &self.meta
    }

    pub fn state(&self) -> TranslatorState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == TranslatorState::Terminated
    }

    pub fn content_chunks(&self) -> u64 {
        self.content_chunks
    }

    pub fn outcome(&self) -> Option<StreamOutcome> {
        self.outcome
    }

    /// Frames produced by one provider event
    pub fn on_event(&mut self, event: ProviderEvent) -> Vec<Bytes> {
        if self.is_terminated() {
            return Vec::new();
        }

        let mut frames = Vec::new();
        self.ensure_role(&mut frames);

        match event {
            ProviderEvent::RoleAnnounced => {}
            ProviderEvent::TextDelta(text) => match self.delivery {
                Delivery::Incremental => self.push_content(&text, &mut frames),
                Delivery::Whole => {
                    for word in segment_words(&text) {
                        self.push_content(word, &mut frames);
                    }
                }
            },
            ProviderEvent::Completed(reason) => {
                if self.state != TranslatorState::Streaming {
                    let placeholder = self.empty_reply;
                    debug!(completion_id = %self.meta.id, "Empty reply, sending placeholder");
                    self.push_content(placeholder, &mut frames);
                }
                self.finish(reason, StreamOutcome::Completed, &mut frames);
            }
            ProviderEvent::Failed(message) => {
                warn!(
                    completion_id = %self.meta.id,
                    error = %message,
                    "Provider failed mid-stream, closing stream"
                );
                self.finish(FinishReason::Stop, StreamOutcome::Failed, &mut frames);
            }
        }

        frames
    }

    /// Frames owed when the provider stream ends without a terminal event
    pub fn on_exhausted(&mut self) -> Vec<Bytes> {
        if self.is_terminated() {
            return Vec::new();
        }
        warn!(
            completion_id = %self.meta.id,
            "Provider stream ended without a terminal event"
        );

        let mut frames = Vec::new();
        self.ensure_role(&mut frames);
        self.finish(FinishReason::Stop, StreamOutcome::Truncated, &mut frames);
        frames
    }

    fn ensure_role(&mut self, frames: &mut Vec<Bytes>) {
        if self.state == TranslatorState::Start {
            frames.push(self.chunk(Delta::role(Role::Assistant), None));
            self.state = TranslatorState::RoleSent;
        }
    }

    fn push_content(&mut self, text: &str, frames: &mut Vec<Bytes>) {
        if text.is_empty() {
            return;
        }
        frames.push(self.chunk(Delta::content(text), None));
        self.content_chunks += 1;
        self.state = TranslatorState::Streaming;
    }

    fn finish(&mut self, reason: FinishReason, outcome: StreamOutcome, frames: &mut Vec<Bytes>) {
        frames.push(self.chunk(Delta::default(), Some(reason)));
        frames.push(format_sse_done());
        self.state = TranslatorState::Terminated;
        self.outcome = Some(outcome);
    }

    fn chunk(&self, delta: Delta, finish_reason: Option<FinishReason>) -> Bytes {
        format_sse_chunk(&StreamChunk {
            id: self.meta.id.clone(),
            object: CHUNK_OBJECT.to_string(),
            created: self.meta.created,
            model: self.meta.model.clone(),
            system_fingerprint: None,
            choices: vec![StreamChoice {
                index: 0,
                delta,
                logprobs: None,
                finish_reason,
            }],
        })
    }
}

/// Split whole-message text into word fragments
///
/// Each fragment after the first starts with the whitespace that preceded its
/// word; trailing whitespace stays on the last fragment. Concatenating the
/// fragments yields the input exactly.
pub fn segment_words(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut prev_is_word = false;

    for (i, c) in text.char_indices() {
        let is_space = c.is_whitespace();
        if is_space && prev_is_word && i > start {
            segments.push(&text[start..i]);
            start = i;
        }
        prev_is_word = !is_space;
    }

    if start < text.len() {
        let tail = &text[start..];
        match segments.pop() {
            Some(last) if tail.trim().is_empty() => segments.push(&text[start - last.len()..]),
            Some(last) => {
                segments.push(last);
                segments.push(tail);
            }
            None => segments.push(tail),
        }
    }
    segments
}

/// A provider stream whose first event is known to not be a failure
pub struct PrimedStream {
    first: ProviderEvent,
    rest: EventStream,
    delivery: Delivery,
}

impl PrimedStream {
    pub fn delivery(&self) -> Delivery {
        self.delivery
    }
}

/// Pull the first event before committing to an SSE response
///
/// A failure here can still be reported as an HTTP error, since no bytes have
/// been sent to the client.
pub async fn prime(stream: ProviderStream) -> Result<PrimedStream, ProviderError> {
    let ProviderStream {
        mut events,
        delivery,
    } = stream;

    match events.next().await {
        Some(ProviderEvent::Failed(message)) => Err(ProviderError::Stream(message)),
        Some(first) => Ok(PrimedStream {
            first,
            rest: events,
            delivery,
        }),
        None => Err(ProviderError::Stream(
            "provider stream ended before producing any event".to_string(),
        )),
    }
}

/// Logs and counts streams that are dropped before `[DONE]`
struct DisconnectGuard {
    completion_id: String,
    provider: &'static str,
    finished: bool,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                completion_id = %self.completion_id,
                provider = self.provider,
                "Client disconnected before the stream finished"
            );
            metrics::record_stream_termination(self.provider, "client_disconnect");
        }
    }
}

/// The SSE response body for a primed provider stream
///
/// Each frame is its own body chunk. Dropping the body drops the provider
/// stream, which closes the upstream connection.
pub fn sse_stream(
    mut translator: StreamTranslator,
    primed: PrimedStream,
    provider: &'static str,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    async_stream::stream! {
        let PrimedStream { first, rest: mut events, .. } = primed;
        let mut guard = DisconnectGuard {
            completion_id: translator.meta().id.clone(),
            provider,
            finished: false,
        };

        let mut frames = translator.on_event(first);
        loop {
            let terminated = translator.is_terminated();
            // The client may drop the body as soon as it reads [DONE]
            if terminated {
                guard.finished = true;
                record_finished(&translator, provider);
            }
            for frame in frames {
                yield Ok::<Bytes, Infallible>(frame);
            }
            if terminated {
                break;
            }

            frames = match events.next().await {
                Some(event) => translator.on_event(event),
                None => translator.on_exhausted(),
            };
        }
    }
}

fn record_finished(translator: &StreamTranslator, provider: &'static str) {
    let outcome = translator.outcome().unwrap_or(StreamOutcome::Completed);
    metrics::record_stream_chunks(provider, translator.content_chunks());
    metrics::record_stream_termination(provider, outcome.as_str());
    debug!(
        completion_id = %translator.meta().id,
        chunks = translator.content_chunks(),
        outcome = outcome.as_str(),
        "Stream finished"
    );
}

//! Response translation
//!
//! [`stream`] turns provider events into SSE chunk frames; [`reshape`] turns a
//! whole completion into a single response body.

pub mod reshape;
pub mod stream;

use chrono::Utc;
use uuid::Uuid;

pub use reshape::reshape;
pub use stream::{prime, segment_words, sse_stream, PrimedStream, StreamTranslator, TranslatorState};

/// Identity shared by every body produced for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    /// `chatcmpl-<uuid>`
    pub id: String,
    /// Unix timestamp (seconds), fixed when the response starts
    pub created: i64,
    pub model: String,
}

impl ResponseMeta {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            id: format!("chatcmpl-{}", Uuid::new_v4()),
            created: Utc::now().timestamp(),
            model: model.into(),
        }
    }
}

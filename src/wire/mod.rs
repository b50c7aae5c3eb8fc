//! OpenAI-compatible wire types
//!
//! The request body accepted by `/v1/chat/completions`, the single-response and
//! streaming-chunk bodies it returns, and the normalized conversation handed to
//! providers.

pub mod request;
pub mod response;
pub mod types;

pub use request::{ChatCompletionRequest, InboundMessage};
pub use response::{
    ChatCompletionResponse, Choice, ChoiceMessage, Delta, StreamChoice, StreamChunk, Usage,
};
pub use types::{Content, ContentPart, Conversation, FinishReason, Message, Role};

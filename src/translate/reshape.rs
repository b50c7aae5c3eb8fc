//! Non-streaming response reshaping

use super::ResponseMeta;
use crate::providers::Completion;
use crate::wire::{ChatCompletionResponse, Choice, ChoiceMessage, Role, Usage};

const COMPLETION_OBJECT: &str = "chat.completion";

/// Build the single-response body for a completion
///
/// Pure: the same inputs always give the same body. An empty completion is
/// replaced with `empty_reply`.
pub fn reshape(
    completion: &Completion,
    meta: &ResponseMeta,
    empty_reply: &str,
) -> ChatCompletionResponse {
    let content = if completion.content.is_empty() {
        empty_reply.to_string()
    } else {
        completion.content.clone()
    };

    ChatCompletionResponse {
        id: meta.id.clone(),
        object: COMPLETION_OBJECT.to_string(),
        created: meta.created,
        model: meta.model.clone(),
        choices: vec![Choice {
            index: 0,
            message: ChoiceMessage {
                role: Role::Assistant,
                content,
            },
            finish_reason: completion.finish_reason,
        }],
        usage: Usage::unavailable(),
    }
}

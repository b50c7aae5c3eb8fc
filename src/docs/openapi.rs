//! OpenAPI specification for the gateway
//!
//! Aggregates all endpoints and schemas into a single OpenAPI document.

use utoipa::OpenApi;

use crate::{
    error::{ErrorBody, ErrorResponse},
    providers::{ProviderInfo, ProviderListing},
    routes::health::{HealthResponse, HealthStats, HealthStatus, ProviderCheck, SimpleHealthResponse},
    wire::{
        ChatCompletionRequest, ChatCompletionResponse, Choice, ChoiceMessage, Content, ContentPart,
        Delta, FinishReason, InboundMessage, Role, StreamChoice, StreamChunk, Usage,
    },
};

/// OpenAPI specification for Switchboard
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Switchboard API",
        version = "1.0.0",
        description = "OpenAI-compatible chat completions gateway routing to pluggable providers"
    ),
    paths(
        crate::routes::chat::chat_completions,
        crate::routes::providers::list_providers,
        crate::routes::health::health_check,
        crate::routes::health::readiness_check,
        crate::routes::health::liveness_check
    ),
    components(
        schemas(
            // Types
            Role,
            FinishReason,
            ContentPart,
            Content,
            InboundMessage,
            // Request
            ChatCompletionRequest,
            // Response
            Usage,
            ChoiceMessage,
            Choice,
            ChatCompletionResponse,
            Delta,
            StreamChoice,
            StreamChunk,
            // Providers
            ProviderInfo,
            ProviderListing,
            // Health
            HealthStatus,
            ProviderCheck,
            HealthStats,
            HealthResponse,
            SimpleHealthResponse,
            // Error
            ErrorBody,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Chat", description = "Chat completion endpoints"),
        (name = "Providers", description = "Provider discovery"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

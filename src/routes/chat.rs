//! Chat completions endpoint
//!
//! OpenAI-compatible chat completions API endpoint.
//! Handles both streaming and non-streaming responses.
//!
//! # Request Format
//!
//! ```json
//! {
//!   "model": "gpt-4o-mini",   // Optional, provider default when absent
//!   "messages": [...],        // Required, at least one user message
//!   "stream": false,          // Optional, defaults to false
//!   "session_id": "abc",      // Optional, continues a session
//!   "provider": "agent"       // Optional, configured default when absent
//! }
//! ```

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, instrument};

use crate::{
    error::{AppError, AppResult},
    providers::{CompletionProvider, ProviderCall, RoutingOverrides},
    routes::metrics::{record_request, set_active_sessions},
    translate::{prime, reshape, sse_stream, ResponseMeta, StreamTranslator},
    wire::ChatCompletionRequest,
    AppState,
};

/// Response header carrying the resolved session id
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Chat completions handler
#[utoipa::path(
    post,
    path = "/v1/chat/completions",
    tag = "Chat",
    request_body = ChatCompletionRequest,
    params(
        ("x-agent-id" = Option<String>, Header, description = "Overrides the configured agent id"),
        ("x-agent-alias-id" = Option<String>, Header, description = "Overrides the configured agent alias id"),
        ("x-agent-region" = Option<String>, Header, description = "Overrides the configured agent region")
    ),
    responses(
        (status = 200, description = "Completion (JSON) or chunk stream (text/event-stream)", body = crate::wire::ChatCompletionResponse,
            headers(("x-session-id" = String, description = "Session id to send back on the next turn"))),
        (status = 400, description = "Invalid request or unknown provider", body = crate::error::ErrorResponse),
        (status = 502, description = "Provider failed", body = crate::error::ErrorResponse),
        (status = 503, description = "Provider not configured", body = crate::error::ErrorResponse)
    )
)]
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let start = Instant::now();

    let request: ChatCompletionRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))?;
    let conversation = request.conversation().map_err(AppError::Validation)?;

    let provider = state.providers.select(request.provider.as_deref())?;
    let model = request
        .requested_model()
        .map(str::to_string)
        .unwrap_or_else(|| provider.default_model());

    let session = state
        .sessions
        .resolve(request.requested_session(), provider.name());
    set_active_sessions(state.sessions.len());

    info!(
        provider = provider.name(),
        model = %model,
        stream = request.stream,
        messages = conversation.len(),
        session_id = %session.id,
        "Processing chat completion request"
    );

    let call = ProviderCall {
        conversation,
        model,
        session_handle: session.backend_handle,
        routing: RoutingOverrides::from_headers(&headers),
    };

    let result = if request.stream {
        handle_streaming(provider.as_ref(), call).await
    } else {
        handle_non_streaming(provider.as_ref(), call).await
    };

    let status = if result.is_ok() { "ok" } else { "error" };
    record_request(
        provider.name(),
        request.stream,
        status,
        start.elapsed().as_secs_f64(),
    );

    let mut response = result?;
    if let Ok(value) = HeaderValue::from_str(&session.id) {
        response.headers_mut().insert(SESSION_ID_HEADER, value);
    }
    Ok(response)
}

/// Handle non-streaming chat completion
#[instrument(skip_all, fields(provider = provider.name(), model = %call.model))]
async fn handle_non_streaming(
    provider: &dyn CompletionProvider,
    call: ProviderCall,
) -> AppResult<Response> {
    let completion = provider
        .complete(&call)
        .await
        .map_err(|e| AppError::backend(provider.name(), e))?;

    let meta = ResponseMeta::new(call.model);
    let body = reshape(&completion, &meta, provider.empty_reply());

    info!(
        completion_id = %meta.id,
        content_len = completion.content.len(),
        finish_reason = ?completion.finish_reason,
        "Chat completion finished"
    );

    Ok(Json(body).into_response())
}

/// Handle streaming chat completion
///
/// The first provider event is awaited before the response is built, so a
/// backend that fails up front yields a JSON error instead of an SSE body.
#[instrument(skip_all, fields(provider = provider.name(), model = %call.model))]
async fn handle_streaming(
    provider: &dyn CompletionProvider,
    call: ProviderCall,
) -> AppResult<Response> {
    let stream = provider
        .stream(&call)
        .await
        .map_err(|e| AppError::backend(provider.name(), e))?;
    let primed = prime(stream)
        .await
        .map_err(|e| AppError::backend(provider.name(), e))?;

    let meta = ResponseMeta::new(call.model);
    let completion_id = meta.id.clone();
    let translator = StreamTranslator::new(meta, primed.delivery(), provider.empty_reply());

    let body = Body::from_stream(sse_stream(translator, primed, provider.name()));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header("X-Accel-Buffering", "no")
        .body(body)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build response: {}", e)))?;

    info!(completion_id = %completion_id, "Streaming chat started");

    Ok(response)
}

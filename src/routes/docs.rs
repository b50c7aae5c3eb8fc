//! OpenAPI document endpoint

use axum::Json;
use utoipa::OpenApi;

use crate::docs::ApiDoc;

/// Serve the OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

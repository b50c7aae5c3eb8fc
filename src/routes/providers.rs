//! Provider listing endpoint

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{providers::ProviderListing, AppState};

/// List registered providers and the configured default
#[utoipa::path(
    get,
    path = "/v1/providers",
    tag = "Providers",
    responses((status = 200, description = "Registered providers", body = ProviderListing))
)]
pub async fn list_providers(State(state): State<Arc<AppState>>) -> Json<ProviderListing> {
    Json(state.providers.listing())
}

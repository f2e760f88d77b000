//! Rendition API handlers.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use renditions_core::{MediaType, ProviderSummary, RenditionError, RenditionInput};

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ConvertParams {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProviderListResponse {
    pub providers: Vec<ProviderSummary>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub active: bool,
    /// Loaders the discovery cycle was started for.
    pub loaders: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/renditions
///
/// List registered providers.
pub async fn list_providers(State(state): State<Arc<AppState>>) -> Json<ProviderListResponse> {
    let providers = state.renditions().providers().await;
    let count = providers.len();
    Json(ProviderListResponse { providers, count })
}

/// POST /api/v1/renditions/convert?source=..&target=..[&filename=..]
///
/// Convert the request body and stream back the rendition.
pub async fn convert(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConvertParams>,
    body: Body,
) -> Response {
    let source = match MediaType::parse(&params.source) {
        Ok(mt) => mt,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };
    let target = match MediaType::parse(&params.target) {
        Ok(mt) => mt,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    let mut input =
        RenditionInput::from_stream(body.into_data_stream().map_err(std::io::Error::other));
    if let Some(name) = params.filename {
        input = input.with_file_name(name);
    }

    match state.renditions().convert(&source, input, &target).await {
        Ok(stream) => (
            [(header::CONTENT_TYPE, target.essence())],
            Body::from_stream(stream),
        )
            .into_response(),
        Err(e @ RenditionError::NoProvider { .. }) => error_response(StatusCode::NOT_FOUND, e),
        Err(e) => {
            warn!("Conversion {} -> {} failed: {}", source, target, e);
            error_response(StatusCode::BAD_GATEWAY, e)
        }
    }
}

/// POST /api/v1/renditions/reload
///
/// Start one discovery cycle for every configured service in the
/// background. Health probes may back off for a long time, so results are
/// only reported through logs and metrics.
pub async fn reload(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ReloadResponse>) {
    let executor = Arc::clone(state.executor());
    let response = ReloadResponse {
        active: executor.is_active(),
        loaders: executor
            .loader_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    };

    if response.active {
        tokio::spawn(async move {
            let outcomes = executor.run_once().await;
            let loaded = outcomes.iter().filter(|o| o.is_success()).count();
            info!("Reload finished: {}/{} loaders succeeded", loaded, outcomes.len());
        });
    }

    (StatusCode::ACCEPTED, Json(response))
}

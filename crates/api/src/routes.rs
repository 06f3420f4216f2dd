use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use prometheus::Encoder;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use common::validate::ensure_utc_timestamp;

use crate::error::{ApiError, ApiResult};
use crate::launcher::RunLauncher;

#[derive(Clone)]
pub struct ApiState {
    pub trigger_token: String,
    pub metrics_path: &'static str,
    pub launcher: Arc<dyn RunLauncher>,
}

pub fn build_router(state: Arc<ApiState>) -> Router {
    let metrics_path: &'static str = state.metrics_path;
    Router::new()
        .route("/healthz", get(healthz))
        .route("/runs", post(trigger_run))
        .route(metrics_path, get(metrics))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct TriggerQuery {
    since: Option<String>,
}

#[instrument(skip(state, headers))]
async fn trigger_run(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<TriggerQuery>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    authorize(&state, &headers)?;

    if let Some(since) = query.since.as_deref() {
        ensure_utc_timestamp(since)
            .map_err(|_| ApiError::bad_request("since must be a strict UTC ISO-8601 timestamp"))?;
    }

    state
        .launcher
        .launch(query.since.clone())
        .map_err(|err| ApiError::internal(err.to_string()))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "status": "accepted", "since": query.since })),
    ))
}

fn authorize(state: &ApiState, headers: &HeaderMap) -> ApiResult<()> {
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    match provided {
        Some(token) if token == state.trigger_token => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}

async fn metrics() -> ApiResult<impl IntoResponse> {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    let content_type = encoder.format_type().to_string();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|err| ApiError::internal(err.to_string()))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        buffer,
    ))
}

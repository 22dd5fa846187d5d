//! HTTP handlers for the gateway routes.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::error::MusicError;
use crate::types::{AudioReference, GeneratedAudio};

use super::keys::{fingerprint, ANONYMOUS_FINGERPRINT};
use super::server::AppState;
use super::types::{
    AgentInfo, GenerateRequest, GenerateResponse, HealthResponse, SetPreferredRequest,
};
use super::usage::{UsageRecord, UsageStatus};

/// Header carrying the gateway API key.
pub const API_KEY_HEADER: &str = "x-api-key";

const DEFAULT_USAGE_LIMIT: usize = 100;

fn api_key(headers: &HeaderMap) -> Option<&str> {
    headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok())
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<String, MusicError> {
    state.keys.authorize(api_key(headers))
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        preferred_provider: state.coordinator.preferred_provider(),
        providers: state.coordinator.provider_names(),
    })
}

/// `GET /agents`
pub async fn agents(State(state): State<Arc<AppState>>) -> Json<Vec<AgentInfo>> {
    let statuses = state.coordinator.provider_statuses().await;
    Json(statuses.into_iter().map(AgentInfo::from).collect())
}

/// `POST /music-generator`
pub async fn generate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let requested_duration = body
        .as_ref()
        .ok()
        .and_then(|Json(req)| req.duration)
        .map(|d| d.max(0.0).round() as u32)
        .unwrap_or(0);

    let key_fingerprint = match authorize(&state, &headers) {
        Ok(fp) => fp,
        Err(e) => {
            let fp = api_key(&headers)
                .map(fingerprint)
                .unwrap_or_else(|| ANONYMOUS_FINGERPRINT.to_string());
            record_failure(&state, fp, requested_duration, started, &e);
            return e.into_response();
        }
    };

    match run_generation(&state, body).await {
        Ok(response) => {
            let latency_ms = started.elapsed().as_millis() as u64;
            tracing::info!(
                key = %key_fingerprint,
                provider = %response.metadata.provider,
                duration = response.duration,
                latency_ms,
                "music generated"
            );
            state.usage.record(UsageRecord {
                timestamp: Utc::now(),
                key_fingerprint,
                provider: Some(response.metadata.provider.clone()),
                status: UsageStatus::Success,
                duration: response.duration,
                latency_ms,
                error_code: None,
            });
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            record_failure(&state, key_fingerprint, requested_duration, started, &e);
            e.into_response()
        }
    }
}

async fn run_generation(
    state: &AppState,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<GenerateResponse, MusicError> {
    let Json(request) =
        body.map_err(|e| MusicError::invalid_request(format!("Invalid request body: {}", e)))?;
    let (prompt, config) = request.validate()?;

    let audio = state.coordinator.generate(&prompt, &config).await?;
    let url = store(state, &audio).await?;

    Ok(GenerateResponse::new(
        url,
        audio.duration_sec,
        audio.format.as_str(),
        &audio.metadata.provider,
        audio.metadata.created_at,
    ))
}

async fn store(state: &AppState, audio: &GeneratedAudio) -> Result<String, MusicError> {
    match audio.audio {
        AudioReference::Uri(ref uri) => Ok(uri.clone()),
        AudioReference::Inline(_) => Ok(state.store.put(audio).await?.url),
    }
}

fn record_failure(
    state: &AppState,
    key_fingerprint: String,
    duration: u32,
    started: Instant,
    err: &MusicError,
) {
    let latency_ms = started.elapsed().as_millis() as u64;
    tracing::warn!(
        key = %key_fingerprint,
        code = %err.code,
        latency_ms,
        error = %err.message,
        "music generation request failed"
    );
    state.usage.record(UsageRecord {
        timestamp: Utc::now(),
        key_fingerprint,
        provider: None,
        status: UsageStatus::Error,
        duration,
        latency_ms,
        error_code: Some(err.code.as_str().to_string()),
    });
}

/// `PUT /providers/preferred`
pub async fn set_preferred(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<SetPreferredRequest>, JsonRejection>,
) -> Result<Json<HealthResponse>, MusicError> {
    authorize(&state, &headers)?;
    let Json(request) =
        body.map_err(|e| MusicError::invalid_request(format!("Invalid request body: {}", e)))?;

    state.coordinator.set_preferred_provider(request.name.trim())?;
    Ok(health(State(state)).await)
}

#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    pub limit: Option<usize>,
}

/// `GET /usage`
pub async fn usage(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<UsageQuery>, QueryRejection>,
) -> Result<Response, MusicError> {
    authorize(&state, &headers)?;
    let Query(query) =
        query.map_err(|e| MusicError::invalid_request(format!("Invalid query string: {}", e)))?;
    let rows = state
        .usage
        .recent(query.limit.unwrap_or(DEFAULT_USAGE_LIMIT));
    Ok(Json(rows).into_response())
}

/// `GET /audio/{file}`
pub async fn audio(
    State(state): State<Arc<AppState>>,
    Path(file_name): Path<String>,
) -> Result<Response, MusicError> {
    match state.store.read(&file_name).await? {
        Some((bytes, format)) => {
            Ok(([(header::CONTENT_TYPE, format.content_type())], bytes).into_response())
        }
        None => Err(MusicError::audio_not_found(&file_name)),
    }
}

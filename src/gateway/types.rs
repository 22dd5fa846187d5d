//! Request and response bodies for the HTTP gateway.

use std::collections::BTreeSet;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MusicError;
use crate::generation::ProviderStatus;
use crate::providers::ProviderKind;
use crate::types::{GenerationConfig, Tempo};

/// Maximum prompt length in characters.
pub const MAX_PROMPT_CHARS: usize = 1000;

/// Duration used when a request does not specify one.
pub const DEFAULT_REQUEST_DURATION_SEC: u32 = 60;

pub const MIN_DURATION_SEC: f64 = 10.0;
pub const MAX_DURATION_SEC: f64 = 300.0;
pub const MIN_TEMPO_BPM: f64 = 40.0;
pub const MAX_TEMPO_BPM: f64 = 180.0;

/// Tempo as sent by clients: a BPM number or a descriptor word.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TempoInput {
    Bpm(f64),
    Descriptor(String),
}

/// Parameters for the generation endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateRequest {
    pub prompt: String,
    pub duration: Option<f64>,
    pub style: Option<String>,
    pub mood: Option<String>,
    pub tempo: Option<TempoInput>,
    pub key: Option<String>,
    pub instruments: Vec<String>,
    pub binaural: bool,
    pub frequency: Option<f64>,
    pub include_vocals: bool,
}

impl GenerateRequest {
    /// Validates the request and converts it into prompt text and config.
    pub fn validate(&self) -> Result<(String, GenerationConfig), MusicError> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(MusicError::empty_prompt());
        }
        let chars = prompt.chars().count();
        if chars > MAX_PROMPT_CHARS {
            return Err(MusicError::prompt_too_long(chars));
        }

        let duration_sec = match self.duration {
            None => DEFAULT_REQUEST_DURATION_SEC,
            Some(d) if d.is_finite() && (MIN_DURATION_SEC..=MAX_DURATION_SEC).contains(&d) => {
                d.round() as u32
            }
            Some(d) => return Err(MusicError::invalid_duration(d)),
        };

        let tempo = match self.tempo {
            None => None,
            Some(TempoInput::Bpm(bpm)) => {
                if !bpm.is_finite() || !(MIN_TEMPO_BPM..=MAX_TEMPO_BPM).contains(&bpm) {
                    return Err(MusicError::invalid_tempo(bpm));
                }
                Some(Tempo::Bpm(bpm.round() as u32))
            }
            Some(TempoInput::Descriptor(ref word)) if word.trim().is_empty() => None,
            Some(TempoInput::Descriptor(ref word)) => Some(Tempo::parse(word)),
        };

        let binaural_frequency = match self.frequency {
            None => None,
            Some(f) if f.is_finite() && f > 0.0 => Some(f as f32),
            Some(f) => {
                return Err(MusicError::invalid_request(format!(
                    "Invalid frequency: {} Hz (must be > 0)",
                    f
                )))
            }
        };

        let instruments: BTreeSet<String> = self
            .instruments
            .iter()
            .map(|i| i.trim())
            .filter(|i| !i.is_empty())
            .map(str::to_string)
            .collect();

        let config = GenerationConfig {
            duration_sec,
            style: non_blank(&self.style),
            mood: non_blank(&self.mood),
            tempo,
            key: non_blank(&self.key),
            instruments,
            include_vocals: self.include_vocals,
            binaural: self.binaural,
            binaural_frequency,
        };

        Ok((prompt.to_string(), config))
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Provenance included in a success response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// ISO-8601 creation time of the audio.
    pub generation_time: String,
    pub provider: String,
}

/// Success body of the generation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub status: String,
    pub url: String,
    pub duration: u32,
    pub format: String,
    pub metadata: ResponseMetadata,
}

impl GenerateResponse {
    pub fn new(
        url: String,
        duration: u32,
        format: &str,
        provider: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: "success".to_string(),
            url,
            duration,
            format: format.to_string(),
            metadata: ResponseMetadata {
                generation_time: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                provider: provider.to_string(),
            },
        }
    }
}

/// Error body returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
    pub code: String,
}

impl From<&MusicError> for ErrorResponse {
    fn from(err: &MusicError) -> Self {
        Self {
            status: "error".to_string(),
            error: err.message.clone(),
            code: err.code.as_str().to_string(),
        }
    }
}

impl IntoResponse for MusicError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub preferred_provider: String,
    pub providers: Vec<String>,
}

/// One entry of `GET /agents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    pub kind: ProviderKind,
    pub status: String,
    pub max_duration: u32,
    pub supports_vocals: bool,
    pub preferred: bool,
}

impl From<ProviderStatus> for AgentInfo {
    fn from(status: ProviderStatus) -> Self {
        Self {
            name: status.name,
            kind: status.kind,
            status: if status.healthy { "healthy" } else { "unavailable" }.to_string(),
            max_duration: status.max_duration_sec,
            supports_vocals: status.supports_vocals,
            preferred: status.preferred,
        }
    }
}

/// Body of `PUT /providers/preferred`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetPreferredRequest {
    pub name: String,
}

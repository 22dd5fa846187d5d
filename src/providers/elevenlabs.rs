//! Hosted text-to-music provider backed by the ElevenLabs music API.
//!
//! Sends the prompt to `POST /v1/music` and returns the MP3 body as an
//! inline artifact. HTTP statuses and transport failures are mapped onto
//! [`ProviderErrorKind`](crate::error::ProviderErrorKind); nothing is retried here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

use crate::config::ServiceConfig;
use crate::error::{MusicError, ProviderError, Result};
use crate::types::{AudioFormat, AudioReference, GeneratedAudio, GenerationConfig};

use super::{MusicProvider, ProviderKind};

/// Registry name of the hosted provider.
pub const ELEVENLABS_PROVIDER: &str = "elevenlabs";

/// Environment variable holding the credential.
pub const API_KEY_ENV: &str = "ELEVENLABS_API_KEY";

/// Public API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";

/// Longest composition the API accepts, in seconds.
pub const MAX_DURATION_SEC: u32 = 300;

/// Shortest composition the API accepts, in seconds.
pub const MIN_DURATION_SEC: u32 = 10;

const MODEL_ID: &str = "music_v1";
const OUTPUT_FORMAT: &str = "mp3_44100_128";
const API_KEY_HEADER: &str = "xi-api-key";
const MAX_DETAIL_CHARS: usize = 200;

#[derive(Debug, Serialize)]
struct ComposeRequest<'a> {
    prompt: &'a str,
    music_length_ms: u64,
    model_id: &'a str,
    force_instrumental: bool,
}

/// Provider calling the ElevenLabs music endpoint.
#[derive(Clone)]
pub struct ElevenLabsProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    request_timeout: Duration,
    health_timeout: Duration,
}

impl std::fmt::Debug for ElevenLabsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsProvider")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("health_timeout", &self.health_timeout)
            .finish_non_exhaustive()
    }
}

impl ElevenLabsProvider {
    /// Creates a provider for the given key and base URL.
    ///
    /// Fails with `MISSING_CREDENTIAL` when the key is blank, so a missing
    /// credential surfaces at construction rather than mid-generation.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(MusicError::missing_credential(API_KEY_ENV));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(180),
            health_timeout: Duration::from_secs(2),
        })
    }

    /// Creates the provider from service configuration.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let api_key = config
            .elevenlabs_api_key
            .as_deref()
            .ok_or_else(|| MusicError::missing_credential(API_KEY_ENV))?;

        Ok(Self::new(api_key, &config.elevenlabs_base_url)?
            .with_request_timeout(config.request_timeout())
            .with_health_timeout(config.health_timeout()))
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl MusicProvider for ElevenLabsProvider {
    fn name(&self) -> &str {
        ELEVENLABS_PROVIDER
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Hosted
    }

    fn max_duration_sec(&self) -> u32 {
        MAX_DURATION_SEC
    }

    fn supports_vocals(&self) -> bool {
        true
    }

    async fn health_check(&self) -> bool {
        let result = self
            .client
            .get(format!("{}/v1/user", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.health_timeout)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "elevenlabs health check rejected");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "elevenlabs health check failed");
                false
            }
        }
    }

    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> std::result::Result<GeneratedAudio, ProviderError> {
        let duration_sec = config.clamped_duration(MAX_DURATION_SEC);
        if duration_sec < MIN_DURATION_SEC {
            return Err(ProviderError::invalid_request(format!(
                "duration {}s is below the {}s minimum",
                duration_sec, MIN_DURATION_SEC
            )));
        }

        let body = ComposeRequest {
            prompt,
            music_length_ms: duration_sec as u64 * 1000,
            model_id: MODEL_ID,
            force_instrumental: !config.include_vocals,
        };

        let resp = self
            .client
            .post(format!("{}/v1/music", self.base_url))
            .query(&[("output_format", OUTPUT_FORMAT)])
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(map_status(status, &detail));
        }

        let bytes = resp.bytes().await.map_err(map_transport_error)?;
        if bytes.is_empty() {
            return Err(ProviderError::upstream_unavailable(
                "music endpoint returned an empty body",
            ));
        }

        Ok(GeneratedAudio::new(
            AudioReference::Inline(bytes.to_vec()),
            duration_sec,
            AudioFormat::Mp3,
            ELEVENLABS_PROVIDER,
            prompt,
            config,
        ))
    }
}

/// Maps a non-success HTTP status onto a provider error kind.
pub fn map_status(status: StatusCode, detail: &str) -> ProviderError {
    let detail: String = detail.chars().take(MAX_DETAIL_CHARS).collect();
    let message = if detail.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("HTTP {}: {}", status.as_u16(), detail)
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::authentication_failed(message)
        }
        StatusCode::PAYMENT_REQUIRED | StatusCode::TOO_MANY_REQUESTS => {
            ProviderError::quota_exceeded(message)
        }
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
            ProviderError::invalid_request(message)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ProviderError::timeout(message),
        _ => ProviderError::upstream_unavailable(message),
    }
}

fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::timeout(format!("request timed out: {}", e))
    } else {
        ProviderError::upstream_unavailable(format!("request failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorKind;

    use axum::extract::Query;
    use axum::http::HeaderMap;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    const TEST_KEY: &str = "test-key";

    async fn fake_user(headers: HeaderMap) -> StatusCode {
        match headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
            Some(TEST_KEY) => StatusCode::OK,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    async fn fake_music(
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
        Json(body): Json<serde_json::Value>,
    ) -> (StatusCode, Vec<u8>) {
        if headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) != Some(TEST_KEY) {
            return (StatusCode::UNAUTHORIZED, b"invalid api key".to_vec());
        }
        if query.get("output_format").map(String::as_str) != Some(OUTPUT_FORMAT) {
            return (StatusCode::BAD_REQUEST, b"bad output format".to_vec());
        }
        match body["prompt"].as_str() {
            Some("quota") => (StatusCode::TOO_MANY_REQUESTS, b"slow down".to_vec()),
            Some("broken") => (StatusCode::BAD_GATEWAY, Vec::new()),
            _ => {
                let ms = body["music_length_ms"].as_u64().unwrap_or(0);
                (StatusCode::OK, format!("ID3-fake-mp3-{}", ms).into_bytes())
            }
        }
    }

    async fn spawn_fake_api() -> String {
        let app = Router::new()
            .route("/v1/user", get(fake_user))
            .route("/v1/music", post(fake_music));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn blank_key_is_missing_credential() {
        let err = ElevenLabsProvider::new("  ", DEFAULT_BASE_URL).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::MissingCredential);
    }

    #[test]
    fn from_config_without_key_fails() {
        let config = ServiceConfig::default();
        assert!(ElevenLabsProvider::from_config(&config).is_err());
    }

    #[test]
    fn status_mapping() {
        let kind = |s: StatusCode| map_status(s, "").kind;
        assert_eq!(kind(StatusCode::UNAUTHORIZED), ProviderErrorKind::AuthenticationFailed);
        assert_eq!(kind(StatusCode::FORBIDDEN), ProviderErrorKind::AuthenticationFailed);
        assert_eq!(kind(StatusCode::PAYMENT_REQUIRED), ProviderErrorKind::QuotaExceeded);
        assert_eq!(kind(StatusCode::TOO_MANY_REQUESTS), ProviderErrorKind::QuotaExceeded);
        assert_eq!(kind(StatusCode::UNPROCESSABLE_ENTITY), ProviderErrorKind::InvalidRequest);
        assert_eq!(kind(StatusCode::GATEWAY_TIMEOUT), ProviderErrorKind::Timeout);
        assert_eq!(kind(StatusCode::SERVICE_UNAVAILABLE), ProviderErrorKind::UpstreamUnavailable);
    }

    #[test]
    fn status_detail_is_truncated() {
        let long = "x".repeat(1000);
        let err = map_status(StatusCode::BAD_REQUEST, &long);
        assert!(err.message.len() < 300);
    }

    #[tokio::test]
    async fn generate_returns_mp3_bytes() {
        let base = spawn_fake_api().await;
        let provider = ElevenLabsProvider::new(TEST_KEY, &base).unwrap();
        assert!(provider.health_check().await);

        let audio = provider
            .generate("calm", &GenerationConfig::new(400))
            .await
            .unwrap();
        assert_eq!(audio.format, AudioFormat::Mp3);
        assert_eq!(audio.duration_sec, MAX_DURATION_SEC);
        assert_eq!(audio.metadata.provider, ELEVENLABS_PROVIDER);
        assert_eq!(audio.bytes().unwrap(), b"ID3-fake-mp3-300000");
    }

    #[tokio::test]
    async fn maps_upstream_failures() {
        let base = spawn_fake_api().await;
        let provider = ElevenLabsProvider::new(TEST_KEY, &base).unwrap();
        let config = GenerationConfig::new(30);

        let err = provider.generate("quota", &config).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::QuotaExceeded);

        let err = provider.generate("broken", &config).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::UpstreamUnavailable);
    }

    #[tokio::test]
    async fn wrong_key_is_unhealthy_and_rejected() {
        let base = spawn_fake_api().await;
        let provider = ElevenLabsProvider::new("wrong", &base).unwrap();
        assert!(!provider.health_check().await);

        let err = provider
            .generate("calm", &GenerationConfig::new(30))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::AuthenticationFailed);
    }

    #[tokio::test]
    async fn unreachable_host_is_unhealthy() {
        let provider = ElevenLabsProvider::new(TEST_KEY, "http://127.0.0.1:9")
            .unwrap()
            .with_health_timeout(Duration::from_millis(200));
        assert!(!provider.health_check().await);

        let err = provider
            .generate("calm", &GenerationConfig::new(30))
            .await
            .unwrap_err();
        assert!(matches!(
            err.kind,
            ProviderErrorKind::UpstreamUnavailable | ProviderErrorKind::Timeout
        ));
    }

    #[tokio::test]
    async fn too_short_is_invalid_request() {
        let provider = ElevenLabsProvider::new(TEST_KEY, "http://127.0.0.1:9").unwrap();
        let err = provider
            .generate("calm", &GenerationConfig::new(5))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
    }
}

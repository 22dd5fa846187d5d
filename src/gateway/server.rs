//! HTTP server for the music generation gateway.
//!
//! Serves the generation endpoint, provider listing and administration
//! routes, and the stored audio files.

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::generation::Coordinator;
use crate::storage::AudioStore;

use super::handlers;
use super::keys::ApiKeyRegistry;
use super::usage::UsageLog;

/// State shared across all request handlers.
#[derive(Debug)]
pub struct AppState {
    pub coordinator: Coordinator,
    pub store: AudioStore,
    pub keys: ApiKeyRegistry,
    pub usage: UsageLog,
}

impl AppState {
    pub fn new(coordinator: Coordinator, store: AudioStore, keys: ApiKeyRegistry) -> Self {
        Self {
            coordinator,
            store,
            keys,
            usage: UsageLog::default(),
        }
    }

    /// Builds the coordinator, store and key registry for a configuration.
    pub async fn from_config(config: &ServiceConfig) -> crate::error::Result<Self> {
        let store = AudioStore::from_config(config).await?;
        Ok(Self::new(
            Coordinator::from_config(config),
            store,
            ApiKeyRegistry::from_keys(&config.api_keys),
        ))
    }
}

/// Builds the router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/test", get(handlers::health))
        .route("/agents", get(handlers::agents))
        .route("/music-generator", post(handlers::generate))
        .route("/generate", post(handlers::generate))
        .route("/providers/preferred", put(handlers::set_preferred))
        .route("/usage", get(handlers::usage))
        .route("/audio/{file}", get(handlers::audio))
        .with_state(state)
}

/// Serves the gateway on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

/// Runs the gateway described by the configuration.
pub async fn run_server(config: ServiceConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize gateway: {e}"))?;

    if state.keys.is_open() {
        tracing::warn!("no gateway API keys configured, generation endpoint is open");
    }

    let listener = TcpListener::bind(config.bind_addr).await?;
    let listen_addr = listener.local_addr()?;

    tracing::info!(
        listen_addr = %listen_addr,
        public_url = %config.effective_public_url(),
        storage = %state.store.dir().display(),
        preferred = %state.coordinator.preferred_provider(),
        providers = ?state.coordinator.provider_names(),
        "music gateway starting"
    );

    serve(listener, Arc::new(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::SyntheticToneProvider;

    async fn spawn(keys: &[&str]) -> (String, Arc<AppState>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let coordinator = Coordinator::new("synthetic").with_preferred_provider("synthetic");
        coordinator.add_provider(Arc::new(
            SyntheticToneProvider::new().with_sample_rate(8_000),
        ));
        let store = AudioStore::open(tmp.path(), base.clone(), 10).await.unwrap();
        let state = Arc::new(AppState::new(
            coordinator,
            store,
            ApiKeyRegistry::from_keys(keys.iter().copied()),
        ));

        let serve_state = state.clone();
        tokio::spawn(async move {
            serve(listener, serve_state).await.ok();
        });
        (base, state, tmp)
    }

    #[tokio::test]
    async fn health_lists_providers() {
        let (base, _state, _tmp) = spawn(&[]).await;
        let body: serde_json::Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["preferred_provider"], "synthetic");
        assert_eq!(body["providers"][0], "synthetic");
    }

    #[tokio::test]
    async fn agents_report_health() {
        let (base, _state, _tmp) = spawn(&[]).await;
        let body: serde_json::Value = reqwest::get(format!("{}/agents", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body[0]["name"], "synthetic");
        assert_eq!(body[0]["kind"], "synthetic");
        assert_eq!(body[0]["status"], "healthy");
        assert_eq!(body[0]["preferred"], true);
    }

    #[tokio::test]
    async fn open_gateway_generates_and_serves_audio() {
        let (base, state, _tmp) = spawn(&[]).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/music-generator", base))
            .json(&serde_json::json!({"prompt": "gentle rain", "duration": 10, "tempo": 60}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["format"], "wav");
        assert_eq!(body["duration"], 10);
        assert_eq!(body["metadata"]["provider"], "synthetic");

        let url = body["url"].as_str().unwrap();
        assert!(url.starts_with(&format!("{}/audio/", base)));
        let audio = reqwest::get(url).await.unwrap();
        assert_eq!(audio.headers()["content-type"], "audio/wav");
        let bytes = audio.bytes().await.unwrap();
        assert_eq!(&bytes[..4], b"RIFF");

        let rows = state.usage.recent(10);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, crate::gateway::UsageStatus::Success);
    }

    #[tokio::test]
    async fn validation_errors_are_structured() {
        let (base, state, _tmp) = spawn(&[]).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/generate", base))
            .json(&serde_json::json!({"prompt": "x", "duration": 500}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["code"], "INVALID_DURATION");

        let resp = client
            .post(format!("{}/generate", base))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["code"], "INVALID_REQUEST");

        assert_eq!(state.usage.len(), 2);
    }

    #[tokio::test]
    async fn keys_are_enforced() {
        let (base, _state, _tmp) = spawn(&["secret"]).await;
        let client = reqwest::Client::new();
        let body = serde_json::json!({"prompt": "rain", "duration": 10});

        let resp = client
            .post(format!("{}/music-generator", base))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["code"], "MISSING_API_KEY");

        let resp = client
            .post(format!("{}/music-generator", base))
            .header("X-API-Key", "wrong")
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);

        let resp = client
            .post(format!("{}/music-generator", base))
            .header("X-API-Key", "secret")
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let resp = client.get(format!("{}/usage", base)).send().await.unwrap();
        assert_eq!(resp.status(), 401);

        let rows: serde_json::Value = client
            .get(format!("{}/usage?limit=1", base))
            .header("X-API-Key", "secret")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(rows.as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["status"], "success");
        assert_eq!(rows[0]["key_fingerprint"], crate::gateway::fingerprint("secret"));
    }

    #[tokio::test]
    async fn preferred_provider_can_be_changed() {
        let (base, state, _tmp) = spawn(&[]).await;
        state.coordinator.add_provider(Arc::new(
            SyntheticToneProvider::new()
                .with_sample_rate(8_000)
                .with_name("backup"),
        ));
        let client = reqwest::Client::new();

        let resp = client
            .put(format!("{}/providers/preferred", base))
            .json(&serde_json::json!({"name": "backup"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(state.coordinator.preferred_provider(), "backup");

        let resp = client
            .put(format!("{}/providers/preferred", base))
            .json(&serde_json::json!({"name": "nope"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["code"], "PROVIDER_NOT_FOUND");
    }

    #[tokio::test]
    async fn malformed_usage_query_is_structured() {
        let (base, _state, _tmp) = spawn(&[]).await;
        let resp = reqwest::get(format!("{}/usage?limit=abc", base)).await.unwrap();
        assert_eq!(resp.status(), 400);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "INVALID_REQUEST");

        let resp = reqwest::get(format!("{}/usage?limit=5", base)).await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn unknown_audio_is_not_found() {
        let (base, _state, _tmp) = spawn(&[]).await;
        let resp = reqwest::get(format!("{}/audio/missing.wav", base)).await.unwrap();
        assert_eq!(resp.status(), 404);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["code"], "AUDIO_NOT_FOUND");
    }

    #[tokio::test]
    async fn no_providers_is_server_error() {
        let tmp = tempfile::tempdir().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let store = AudioStore::open(tmp.path(), base.clone(), 10).await.unwrap();
        let state = Arc::new(AppState::new(
            Coordinator::new("synthetic"),
            store,
            ApiKeyRegistry::new(),
        ));
        tokio::spawn(async move {
            serve(listener, state).await.ok();
        });

        let resp = reqwest::Client::new()
            .post(format!("{}/music-generator", base))
            .json(&serde_json::json!({"prompt": "rain"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["code"], "ALL_PROVIDERS_UNAVAILABLE");
    }
}

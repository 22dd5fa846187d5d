//! Service configuration module.
//!
//! Contains the runtime configuration for the meditation music service:
//! hosted provider credential, provider preference, gateway binding,
//! storage location and timeouts.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::generation::SegmentPolicy;
use crate::providers::elevenlabs::{API_KEY_ENV, DEFAULT_BASE_URL};
use crate::providers::{ELEVENLABS_PROVIDER, SYNTHETIC_PROVIDER};

/// Default gateway bind address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Default number of files kept in audio storage.
pub const DEFAULT_STORAGE_MAX_FILES: usize = 200;

/// Runtime configuration for the service.
///
/// This configuration is typically loaded from environment variables at
/// startup and then overridden by command-line arguments.
#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Hosted provider API key. If None, the hosted provider is not registered.
    pub elevenlabs_api_key: Option<String>,

    /// Hosted provider base URL.
    pub elevenlabs_base_url: String,

    /// Name of the provider tried first.
    pub preferred_provider: String,

    /// Name of the provider tried when the preferred one fails.
    pub fallback_provider: String,

    /// Address the HTTP gateway listens on.
    pub bind_addr: SocketAddr,

    /// Base URL used when building audio URLs.
    /// If None, derived from `bind_addr`.
    pub public_url: Option<String>,

    /// Directory for generated audio files.
    /// If None, uses the platform-specific default cache location.
    pub storage_path: Option<PathBuf>,

    /// Maximum number of files kept in storage before eviction.
    pub storage_max_files: usize,

    /// Gateway API keys accepted in the X-API-Key header.
    /// Empty means the gateway is open.
    pub api_keys: Vec<String>,

    /// Timeout for one hosted generation call, in seconds.
    pub request_timeout_secs: u64,

    /// Time budget for provider health checks, in milliseconds.
    pub health_timeout_ms: u64,

    /// What to do when a request is longer than a provider can render.
    pub segment_policy: SegmentPolicy,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("elevenlabs_api_key", &self.elevenlabs_api_key.as_ref().map(|_| "<set>"))
            .field("elevenlabs_base_url", &self.elevenlabs_base_url)
            .field("preferred_provider", &self.preferred_provider)
            .field("fallback_provider", &self.fallback_provider)
            .field("bind_addr", &self.bind_addr)
            .field("public_url", &self.public_url)
            .field("storage_path", &self.storage_path)
            .field("storage_max_files", &self.storage_max_files)
            .field("api_keys", &self.api_keys.len())
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("health_timeout_ms", &self.health_timeout_ms)
            .field("segment_policy", &self.segment_policy)
            .finish()
    }
}

impl ServiceConfig {
    /// Creates a new ServiceConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ServiceConfig from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `ELEVENLABS_API_KEY` - Hosted provider credential
    /// - `ELEVENLABS_BASE_URL` - Hosted provider base URL
    /// - `MUSIC_PREFERRED_PROVIDER` - Provider tried first
    /// - `MUSIC_BIND_ADDR` - Gateway bind address
    /// - `MUSIC_PUBLIC_URL` - Base URL for audio links
    /// - `MUSIC_STORAGE_PATH` - Audio output directory
    /// - `MUSIC_STORAGE_MAX_FILES` - Stored file limit
    /// - `MUSIC_API_KEYS` - Comma-separated gateway keys
    /// - `MUSIC_REQUEST_TIMEOUT_SECS` - Hosted generation timeout
    /// - `MUSIC_HEALTH_TIMEOUT_MS` - Health check budget
    /// - `MUSIC_SEGMENT_POLICY` - `clamp` or `reject`
    ///
    /// Falls back to defaults for unset or invalid variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(key) = lookup(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.elevenlabs_api_key = Some(key.trim().to_string());
            }
        }

        if let Some(url) = lookup("ELEVENLABS_BASE_URL") {
            if !url.trim().is_empty() {
                config.elevenlabs_base_url = url.trim().to_string();
            }
        }

        if let Some(name) = lookup("MUSIC_PREFERRED_PROVIDER") {
            if !name.trim().is_empty() {
                config.preferred_provider = name.trim().to_lowercase();
            }
        }

        if let Some(addr) = lookup("MUSIC_BIND_ADDR") {
            if let Ok(addr) = addr.trim().parse::<SocketAddr>() {
                config.bind_addr = addr;
            }
        }

        if let Some(url) = lookup("MUSIC_PUBLIC_URL") {
            if !url.trim().is_empty() {
                config.public_url = Some(url.trim().to_string());
            }
        }

        if let Some(path) = lookup("MUSIC_STORAGE_PATH") {
            if !path.trim().is_empty() {
                config.storage_path = Some(PathBuf::from(path));
            }
        }

        if let Some(max_str) = lookup("MUSIC_STORAGE_MAX_FILES") {
            if let Ok(max) = max_str.trim().parse::<usize>() {
                if max > 0 {
                    config.storage_max_files = max;
                }
            }
        }

        if let Some(keys) = lookup("MUSIC_API_KEYS") {
            config.api_keys = keys
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(secs_str) = lookup("MUSIC_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs_str.trim().parse::<u64>() {
                if (1..=3600).contains(&secs) {
                    config.request_timeout_secs = secs;
                }
            }
        }

        if let Some(ms_str) = lookup("MUSIC_HEALTH_TIMEOUT_MS") {
            if let Ok(ms) = ms_str.trim().parse::<u64>() {
                if (1..=60_000).contains(&ms) {
                    config.health_timeout_ms = ms;
                }
            }
        }

        if let Some(policy) = lookup("MUSIC_SEGMENT_POLICY") {
            if let Some(policy) = SegmentPolicy::parse(&policy) {
                config.segment_policy = policy;
            }
        }

        config
    }

    /// Returns the effective public base URL, without a trailing slash.
    pub fn effective_public_url(&self) -> String {
        match self.public_url {
            Some(ref url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}", self.bind_addr),
        }
    }

    /// Returns the effective storage path, using platform defaults if not specified.
    pub fn effective_storage_path(&self) -> PathBuf {
        if let Some(ref path) = self.storage_path {
            path.clone()
        } else {
            default_storage_path()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        if self.preferred_provider.trim().is_empty() {
            return Some("preferred provider name must not be empty".to_string());
        }

        if self.fallback_provider.trim().is_empty() {
            return Some("fallback provider name must not be empty".to_string());
        }

        if self.storage_max_files == 0 {
            return Some("storage_max_files must be > 0".to_string());
        }

        if self.request_timeout_secs == 0 {
            return Some("request timeout must be > 0 seconds".to_string());
        }

        if self.health_timeout_ms == 0 {
            return Some("health timeout must be > 0 milliseconds".to_string());
        }

        if let Some(ref url) = self.public_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Some(format!("public url must be http(s): {}", url));
            }
        }

        None
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            elevenlabs_api_key: None,
            elevenlabs_base_url: DEFAULT_BASE_URL.to_string(),
            preferred_provider: ELEVENLABS_PROVIDER.to_string(),
            fallback_provider: SYNTHETIC_PROVIDER.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            public_url: None,
            storage_path: None,
            storage_max_files: DEFAULT_STORAGE_MAX_FILES,
            api_keys: Vec::new(),
            request_timeout_secs: 180,
            health_timeout_ms: 2000,
            segment_policy: SegmentPolicy::default(),
        }
    }
}

/// Returns the platform-specific default audio storage path.
///
/// Uses the `directories` crate to find appropriate locations:
/// - macOS: ~/Library/Caches/meditation-music/audio
/// - Linux: ~/.cache/meditation-music/audio
/// - Windows: C:\Users\<user>\AppData\Local\meditation-music\cache\audio
fn default_storage_path() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "meditation-music") {
        proj_dirs.cache_dir().join("audio")
    } else {
        // Fallback to current directory
        PathBuf::from("./audio")
    }
}

//! Generation coordinator.
//!
//! Builds the prompt, then walks the preferred provider and the fallback in
//! order. Each provider is health-checked before it is called, and a failed
//! provider is never retried within the same request.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::error::{
    AttemptOutcome, GenerationError, MusicError, ProviderAttempt, ProviderErrorKind, Result,
};
use crate::prompt::build_prompt;
use crate::providers::{
    ElevenLabsProvider, MusicProvider, ProviderKind, SyntheticToneProvider, ELEVENLABS_PROVIDER,
};
use crate::types::{GeneratedAudio, GenerationConfig};

/// Default time budget for a single health check.
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_millis(2000);

/// How a request longer than a provider's maximum is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentPolicy {
    /// The provider shortens the audio; metadata keeps the requested length.
    #[default]
    Clamp,
    /// Providers that cannot render the full length are skipped.
    Reject,
}

impl SegmentPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "clamp" => Some(SegmentPolicy::Clamp),
            "reject" => Some(SegmentPolicy::Reject),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentPolicy::Clamp => "clamp",
            SegmentPolicy::Reject => "reject",
        }
    }
}

/// Point-in-time view of one registered provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub kind: ProviderKind,
    pub healthy: bool,
    pub max_duration_sec: u32,
    pub supports_vocals: bool,
    pub preferred: bool,
}

/// Immutable registry snapshot. Mutations build a new one and swap it in.
#[derive(Clone, Default)]
struct Registry {
    providers: HashMap<String, Arc<dyn MusicProvider>>,
    preferred: String,
}

/// Routes generation requests across registered providers.
///
/// Concurrent `generate` calls share a snapshot of the registry; changing the
/// preferred provider or the provider set only affects calls that start after
/// the change.
pub struct Coordinator {
    registry: RwLock<Arc<Registry>>,
    fallback: String,
    health_timeout: Duration,
    segment_policy: SegmentPolicy,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.snapshot();
        let mut names: Vec<&String> = registry.providers.keys().collect();
        names.sort();
        f.debug_struct("Coordinator")
            .field("providers", &names)
            .field("preferred", &registry.preferred)
            .field("fallback", &self.fallback)
            .field("health_timeout", &self.health_timeout)
            .field("segment_policy", &self.segment_policy)
            .finish()
    }
}

impl Coordinator {
    /// Creates an empty coordinator with the given fallback provider name.
    ///
    /// The preferred provider defaults to the hosted provider's name.
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            registry: RwLock::new(Arc::new(Registry {
                providers: HashMap::new(),
                preferred: ELEVENLABS_PROVIDER.to_string(),
            })),
            fallback: fallback.into(),
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            segment_policy: SegmentPolicy::default(),
        }
    }

    /// Sets the preferred provider without checking registration.
    pub fn with_preferred_provider(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.update(|registry| registry.preferred = name);
        self
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn with_segment_policy(mut self, policy: SegmentPolicy) -> Self {
        self.segment_policy = policy;
        self
    }

    /// Builds the coordinator for a service configuration.
    ///
    /// The hosted provider is registered only when a credential is present.
    /// The synthetic provider is always registered.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let coordinator = Self::new(config.fallback_provider.clone())
            .with_preferred_provider(config.preferred_provider.clone())
            .with_health_timeout(config.health_timeout())
            .with_segment_policy(config.segment_policy);

        match ElevenLabsProvider::from_config(config) {
            Ok(provider) => {
                coordinator.add_provider(Arc::new(provider));
            }
            Err(e) => {
                tracing::warn!(error = %e.message, "hosted provider not registered");
            }
        }

        coordinator.add_provider(Arc::new(SyntheticToneProvider::new()));
        coordinator
    }

    /// Registers a provider, replacing any provider with the same name.
    pub fn add_provider(&self, provider: Arc<dyn MusicProvider>) {
        let name = provider.name().to_string();
        tracing::info!(provider = %name, kind = %provider.kind(), "provider registered");
        self.update(|registry| {
            registry.providers.insert(name, provider);
        });
    }

    /// Unregisters a provider. Returns false if it was not registered.
    pub fn remove_provider(&self, name: &str) -> bool {
        let removed = self.update(|registry| registry.providers.remove(name).is_some());
        if removed {
            tracing::info!(provider = %name, "provider removed");
        }
        removed
    }

    /// Changes the provider tried first on subsequent calls.
    pub fn set_preferred_provider(&self, name: &str) -> Result<()> {
        self.update(|registry| {
            if !registry.providers.contains_key(name) {
                return Err(MusicError::provider_not_found(name));
            }
            registry.preferred = name.to_string();
            Ok(())
        })?;
        tracing::info!(provider = %name, "preferred provider changed");
        Ok(())
    }

    pub fn preferred_provider(&self) -> String {
        self.snapshot().preferred.clone()
    }

    pub fn fallback_provider(&self) -> &str {
        &self.fallback
    }

    pub fn segment_policy(&self) -> SegmentPolicy {
        self.segment_policy
    }

    /// Registered provider names, sorted.
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.snapshot().providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn provider(&self, name: &str) -> Option<Arc<dyn MusicProvider>> {
        self.snapshot().providers.get(name).cloned()
    }

    /// Health-checks every registered provider, sorted by name.
    pub async fn provider_statuses(&self) -> Vec<ProviderStatus> {
        let registry = self.snapshot();
        let mut providers: Vec<&Arc<dyn MusicProvider>> = registry.providers.values().collect();
        providers.sort_by(|a, b| a.name().cmp(b.name()));

        let mut statuses = Vec::with_capacity(providers.len());
        for provider in providers {
            statuses.push(ProviderStatus {
                name: provider.name().to_string(),
                kind: provider.kind(),
                healthy: self.is_healthy(provider.as_ref()).await,
                max_duration_sec: provider.max_duration_sec(),
                supports_vocals: provider.supports_vocals(),
                preferred: provider.name() == registry.preferred,
            });
        }
        statuses
    }

    /// Generates audio for the user's text.
    ///
    /// Provider failures never escape; when no provider produces audio the
    /// result is a single [`GenerationError::AllProvidersUnavailable`]
    /// listing every attempt.
    pub async fn generate(
        &self,
        user_text: &str,
        config: &GenerationConfig,
    ) -> std::result::Result<GeneratedAudio, GenerationError> {
        if let Some(reason) = config.validate() {
            return Err(GenerationError::InvalidConfig(reason));
        }

        let registry = self.snapshot();
        if registry.providers.is_empty() {
            tracing::warn!("generation requested with no providers registered");
            return Err(GenerationError::AllProvidersUnavailable {
                attempts: Vec::new(),
            });
        }

        let prompt = build_prompt(user_text, config);
        tracing::debug!(prompt = %prompt, "prompt built");

        let mut chain = vec![registry.preferred.as_str()];
        if self.fallback != registry.preferred {
            chain.push(self.fallback.as_str());
        }

        let mut attempts = Vec::with_capacity(chain.len());
        for name in chain {
            let outcome = match registry.providers.get(name) {
                None => AttemptOutcome::NotRegistered,
                Some(provider) => match self.attempt(provider.as_ref(), &prompt, config).await {
                    Ok(audio) => return Ok(audio),
                    Err(outcome) => outcome,
                },
            };
            tracing::warn!(provider = %name, outcome = %outcome, "provider did not produce audio");
            attempts.push(ProviderAttempt {
                provider: name.to_string(),
                outcome,
            });
        }

        let err = GenerationError::AllProvidersUnavailable { attempts };
        tracing::error!(error = %err, "generation failed");
        Err(err)
    }

    async fn attempt(
        &self,
        provider: &dyn MusicProvider,
        prompt: &str,
        config: &GenerationConfig,
    ) -> std::result::Result<GeneratedAudio, AttemptOutcome> {
        if !self.is_healthy(provider).await {
            return Err(AttemptOutcome::Unhealthy);
        }

        let max_sec = provider.max_duration_sec();
        if self.segment_policy == SegmentPolicy::Reject && config.duration_sec > max_sec {
            return Err(AttemptOutcome::DurationExceedsSingleSegment {
                requested_sec: config.duration_sec,
                max_sec,
            });
        }

        let audio = provider.generate(prompt, config).await.map_err(|e| {
            tracing::warn!(provider = %provider.name(), error = %e, "provider failed");
            AttemptOutcome::Failed(e.kind)
        })?;

        if audio.duration_sec > max_sec {
            tracing::error!(
                provider = %provider.name(),
                duration_sec = audio.duration_sec,
                max_sec,
                "provider returned audio longer than its maximum"
            );
            return Err(AttemptOutcome::Failed(ProviderErrorKind::UpstreamUnavailable));
        }

        if audio.was_clamped() {
            tracing::info!(
                provider = %provider.name(),
                requested_sec = config.duration_sec,
                duration_sec = audio.duration_sec,
                "duration clamped to provider maximum"
            );
        }

        tracing::info!(
            provider = %provider.name(),
            duration_sec = audio.duration_sec,
            format = %audio.format,
            "generation succeeded"
        );
        Ok(audio)
    }

    async fn is_healthy(&self, provider: &dyn MusicProvider) -> bool {
        match tokio::time::timeout(self.health_timeout, provider.health_check()).await {
            Ok(healthy) => healthy,
            Err(_) => {
                tracing::warn!(provider = %provider.name(), "health check timed out");
                false
            }
        }
    }

    fn snapshot(&self) -> Arc<Registry> {
        self.registry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Applies `f` to a copy of the registry and swaps it in, all under the
    /// write lock.
    fn update<T, F: FnOnce(&mut Registry) -> T>(&self, f: F) -> T {
        let mut guard = self.registry.write().unwrap_or_else(|e| e.into_inner());
        let mut next = Registry::clone(&guard);
        let out = f(&mut next);
        *guard = Arc::new(next);
        out
    }
}

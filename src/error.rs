//! Error types for the meditation music service.
//!
//! Three layers of errors exist:
//! - [`ProviderError`]: a single provider failed; the coordinator turns it
//!   into a decision to try the next provider.
//! - [`GenerationError`]: the coordinator's own terminal outcome.
//! - [`MusicError`]: service-level error with a stable code, used at the
//!   HTTP and CLI boundaries.

use std::fmt;

use thiserror::Error;

/// Error codes returned by the service in error responses.
///
/// These codes let clients programmatically handle specific error conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Prompt text is invalid.
    /// Trigger: Empty prompt or exceeds 1000 characters.
    InvalidPrompt,

    /// Requested duration is outside valid range.
    /// Trigger: Duration outside 10-300 second range.
    InvalidDuration,

    /// Requested tempo is outside valid range.
    /// Trigger: Tempo outside 40-180 BPM.
    InvalidTempo,

    /// Request body could not be parsed or a field is malformed.
    InvalidRequest,

    /// No API key was supplied to a protected endpoint.
    MissingApiKey,

    /// The supplied API key is not registered.
    InvalidApiKey,

    /// The hosted provider credential is not configured.
    MissingCredential,

    /// Requested provider name is not registered.
    ProviderNotFound,

    /// Every provider failed or was ineligible.
    AllProvidersUnavailable,

    /// Generated audio could not be written to storage.
    StorageFailed,

    /// Audio samples could not be encoded into a container.
    EncodingFailed,

    /// No stored audio file has the requested name.
    AudioNotFound,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidPrompt => "INVALID_PROMPT",
            ErrorCode::InvalidDuration => "INVALID_DURATION",
            ErrorCode::InvalidTempo => "INVALID_TEMPO",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::MissingApiKey => "MISSING_API_KEY",
            ErrorCode::InvalidApiKey => "INVALID_API_KEY",
            ErrorCode::MissingCredential => "MISSING_CREDENTIAL",
            ErrorCode::ProviderNotFound => "PROVIDER_NOT_FOUND",
            ErrorCode::AllProvidersUnavailable => "ALL_PROVIDERS_UNAVAILABLE",
            ErrorCode::StorageFailed => "STORAGE_FAILED",
            ErrorCode::EncodingFailed => "ENCODING_FAILED",
            ErrorCode::AudioNotFound => "AUDIO_NOT_FOUND",
        }
    }

    /// Returns a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::InvalidPrompt => "Prompt must be non-empty and at most 1000 characters",
            ErrorCode::InvalidDuration => "Duration must be between 10 and 300 seconds",
            ErrorCode::InvalidTempo => "Tempo must be between 40 and 180 BPM",
            ErrorCode::InvalidRequest => "Request body is malformed",
            ErrorCode::MissingApiKey => "An API key is required for this endpoint",
            ErrorCode::InvalidApiKey => "The supplied API key is not valid",
            ErrorCode::MissingCredential => "The hosted music provider has no API key configured",
            ErrorCode::ProviderNotFound => "No provider is registered under that name",
            ErrorCode::AllProvidersUnavailable => "No music provider could fulfil the request",
            ErrorCode::StorageFailed => "Generated audio could not be stored",
            ErrorCode::EncodingFailed => "Audio could not be encoded",
            ErrorCode::AudioNotFound => "No stored audio file has that name",
        }
    }

    /// Returns a recovery hint suggesting how to resolve this error.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCode::InvalidPrompt => {
                "Provide a descriptive prompt between 1 and 1000 characters \
                 (e.g., 'calming music for deep sleep')"
            }
            ErrorCode::InvalidDuration => {
                "Specify a duration between 10 and 300 seconds (e.g., duration: 60)"
            }
            ErrorCode::InvalidTempo => "Specify a tempo between 40 and 180 BPM (e.g., tempo: 70)",
            ErrorCode::InvalidRequest => "Send a JSON body with at least a 'prompt' field",
            ErrorCode::MissingApiKey => "Send your key in the X-API-Key header",
            ErrorCode::InvalidApiKey => "Check the key for typos or request a new one",
            ErrorCode::MissingCredential => {
                "Set ELEVENLABS_API_KEY, or rely on the synthetic provider"
            }
            ErrorCode::ProviderNotFound => "Query GET /agents for the registered provider names",
            ErrorCode::AllProvidersUnavailable => {
                "Try again later, or check provider credentials and quota"
            }
            ErrorCode::StorageFailed => {
                "Check that MUSIC_STORAGE_PATH exists and is writable, and that disk space is available"
            }
            ErrorCode::EncodingFailed => "Try a shorter duration or restart the service",
            ErrorCode::AudioNotFound => {
                "Use the url returned by the generation endpoint; old files are evicted"
            }
        }
    }

    /// Returns the HTTP status the gateway reports for this code.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::InvalidPrompt
            | ErrorCode::InvalidDuration
            | ErrorCode::InvalidTempo
            | ErrorCode::InvalidRequest
            | ErrorCode::ProviderNotFound => 400,
            ErrorCode::MissingApiKey | ErrorCode::InvalidApiKey => 401,
            ErrorCode::AudioNotFound => 404,
            ErrorCode::MissingCredential
            | ErrorCode::AllProvidersUnavailable
            | ErrorCode::StorageFailed
            | ErrorCode::EncodingFailed => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for service operations.
#[derive(Debug)]
pub struct MusicError {
    /// The error code identifying the type of error.
    pub code: ErrorCode,
    /// Human-readable error message with context.
    pub message: String,
    /// Optional underlying cause of the error.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl MusicError {
    /// Creates a new MusicError with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new MusicError with an underlying cause.
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an INVALID_PROMPT error for empty prompts.
    pub fn empty_prompt() -> Self {
        Self::new(ErrorCode::InvalidPrompt, "Prompt cannot be empty")
    }

    /// Creates an INVALID_PROMPT error for prompts that are too long.
    pub fn prompt_too_long(len: usize) -> Self {
        Self::new(
            ErrorCode::InvalidPrompt,
            format!("Prompt too long: {} characters (maximum 1000)", len),
        )
    }

    /// Creates an INVALID_DURATION error.
    pub fn invalid_duration(duration: f64) -> Self {
        Self::new(
            ErrorCode::InvalidDuration,
            format!(
                "Invalid duration: {} seconds (must be between 10 and 300)",
                duration
            ),
        )
    }

    /// Creates an INVALID_TEMPO error.
    pub fn invalid_tempo(tempo: f64) -> Self {
        Self::new(
            ErrorCode::InvalidTempo,
            format!("Invalid tempo: {} BPM (must be between 40 and 180)", tempo),
        )
    }

    /// Creates an INVALID_REQUEST error.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, reason)
    }

    /// Creates a MISSING_API_KEY error.
    pub fn missing_api_key() -> Self {
        Self::new(ErrorCode::MissingApiKey, "API key required")
    }

    /// Creates an INVALID_API_KEY error.
    pub fn invalid_api_key() -> Self {
        Self::new(ErrorCode::InvalidApiKey, "Invalid API key")
    }

    /// Creates a MISSING_CREDENTIAL error for a hosted provider.
    pub fn missing_credential(variable: &str) -> Self {
        Self::new(
            ErrorCode::MissingCredential,
            format!("Hosted provider credential not set ({})", variable),
        )
    }

    /// Creates a PROVIDER_NOT_FOUND error.
    pub fn provider_not_found(name: &str) -> Self {
        Self::new(
            ErrorCode::ProviderNotFound,
            format!("Provider not registered: {}", name),
        )
    }

    /// Creates a STORAGE_FAILED error.
    pub fn storage_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::StorageFailed,
            format!("Failed to store audio: {}", reason.into()),
        )
    }

    /// Creates an ENCODING_FAILED error.
    pub fn encoding_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::EncodingFailed,
            format!("Failed to encode audio: {}", reason.into()),
        )
    }

    /// Creates an AUDIO_NOT_FOUND error.
    pub fn audio_not_found(file_name: &str) -> Self {
        Self::new(
            ErrorCode::AudioNotFound,
            format!("Audio not found: {}", file_name),
        )
    }

    /// Returns the HTTP status for this error.
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for MusicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}. Recovery: {}",
            self.code,
            self.message,
            self.code.recovery_hint()
        )
    }
}

impl std::error::Error for MusicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<GenerationError> for MusicError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::InvalidConfig(reason) => MusicError::invalid_request(reason),
            err @ GenerationError::AllProvidersUnavailable { .. } => MusicError::with_source(
                ErrorCode::AllProvidersUnavailable,
                "Music generation failed: no provider available",
                err,
            ),
        }
    }
}

/// Result type alias using MusicError.
pub type Result<T> = std::result::Result<T, MusicError>;

/// Failure categories a provider may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// Credential rejected by the upstream API.
    AuthenticationFailed,
    /// Upstream quota or rate limit exhausted.
    QuotaExceeded,
    /// Upstream unreachable or returned a server error.
    UpstreamUnavailable,
    /// Upstream rejected the request contents.
    InvalidRequest,
    /// Upstream did not answer within the time budget.
    Timeout,
}

impl ProviderErrorKind {
    /// Returns the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::AuthenticationFailed => "authentication_failed",
            ProviderErrorKind::QuotaExceeded => "quota_exceeded",
            ProviderErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ProviderErrorKind::InvalidRequest => "invalid_request",
            ProviderErrorKind::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single provider's failure to generate audio.
///
/// Transport-level errors are folded into one of the [`ProviderErrorKind`]s
/// and never escape verbatim.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::AuthenticationFailed, message)
    }

    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::QuotaExceeded, message)
    }

    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::UpstreamUnavailable, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message)
    }
}

/// Why a provider did not produce the result.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// No provider is registered under the name.
    NotRegistered,
    /// The health check failed or timed out.
    Unhealthy,
    /// The request is longer than the provider can render in one piece.
    DurationExceedsSingleSegment { requested_sec: u32, max_sec: u32 },
    /// The provider was called and failed.
    Failed(ProviderErrorKind),
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::NotRegistered => write!(f, "not registered"),
            AttemptOutcome::Unhealthy => write!(f, "unhealthy"),
            AttemptOutcome::DurationExceedsSingleSegment {
                requested_sec,
                max_sec,
            } => write!(
                f,
                "duration {}s exceeds single segment limit {}s",
                requested_sec, max_sec
            ),
            AttemptOutcome::Failed(kind) => write!(f, "failed ({})", kind),
        }
    }
}

/// Record of one provider considered by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderAttempt {
    pub provider: String,
    pub outcome: AttemptOutcome,
}

/// Terminal failures of the generation coordinator.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("invalid generation config: {0}")]
    InvalidConfig(String),

    #[error("all providers unavailable ({})", summarize_attempts(.attempts))]
    AllProvidersUnavailable { attempts: Vec<ProviderAttempt> },
}

fn summarize_attempts(attempts: &[ProviderAttempt]) -> String {
    if attempts.is_empty() {
        return "no providers registered".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.provider, a.outcome))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_as_str() {
        assert_eq!(ErrorCode::InvalidPrompt.as_str(), "INVALID_PROMPT");
        assert_eq!(ErrorCode::InvalidDuration.as_str(), "INVALID_DURATION");
        assert_eq!(ErrorCode::MissingApiKey.as_str(), "MISSING_API_KEY");
        assert_eq!(
            ErrorCode::AllProvidersUnavailable.as_str(),
            "ALL_PROVIDERS_UNAVAILABLE"
        );
    }

    #[test]
    fn error_code_http_status() {
        assert_eq!(ErrorCode::InvalidPrompt.http_status(), 400);
        assert_eq!(ErrorCode::InvalidTempo.http_status(), 400);
        assert_eq!(ErrorCode::MissingApiKey.http_status(), 401);
        assert_eq!(ErrorCode::InvalidApiKey.http_status(), 401);
        assert_eq!(ErrorCode::AllProvidersUnavailable.http_status(), 500);
        assert_eq!(ErrorCode::StorageFailed.http_status(), 500);
        assert_eq!(ErrorCode::AudioNotFound.http_status(), 404);
    }

    #[test]
    fn error_code_recovery_hints_not_empty() {
        for code in [
            ErrorCode::InvalidPrompt,
            ErrorCode::InvalidDuration,
            ErrorCode::InvalidTempo,
            ErrorCode::InvalidRequest,
            ErrorCode::MissingApiKey,
            ErrorCode::InvalidApiKey,
            ErrorCode::MissingCredential,
            ErrorCode::ProviderNotFound,
            ErrorCode::AllProvidersUnavailable,
            ErrorCode::StorageFailed,
            ErrorCode::EncodingFailed,
            ErrorCode::AudioNotFound,
        ] {
            assert!(!code.recovery_hint().is_empty());
            assert!(!code.description().is_empty());
        }
    }

    #[test]
    fn music_error_display() {
        let err = MusicError::invalid_duration(400.0);
        assert!(err.to_string().contains("INVALID_DURATION"));
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("Recovery:"));
    }

    #[test]
    fn all_providers_unavailable_summary() {
        let err = GenerationError::AllProvidersUnavailable {
            attempts: vec![
                ProviderAttempt {
                    provider: "elevenlabs".to_string(),
                    outcome: AttemptOutcome::Failed(ProviderErrorKind::QuotaExceeded),
                },
                ProviderAttempt {
                    provider: "synthetic".to_string(),
                    outcome: AttemptOutcome::Unhealthy,
                },
            ],
        };
        let text = err.to_string();
        assert!(text.contains("elevenlabs: failed (quota_exceeded)"));
        assert!(text.contains("synthetic: unhealthy"));

        let empty = GenerationError::AllProvidersUnavailable { attempts: vec![] };
        assert!(empty.to_string().contains("no providers registered"));
    }

    #[test]
    fn generation_error_maps_to_music_error() {
        let err: MusicError = GenerationError::AllProvidersUnavailable { attempts: vec![] }.into();
        assert_eq!(err.code, ErrorCode::AllProvidersUnavailable);
        assert_eq!(err.http_status(), 500);
        assert!(std::error::Error::source(&err).is_some());

        let err: MusicError = GenerationError::InvalidConfig("duration must be > 0".into()).into();
        assert_eq!(err.http_status(), 400);
    }
}

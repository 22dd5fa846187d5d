//! HTTP gateway for music generation.
//!
//! Exposes the coordinator over JSON/HTTP with API-key checks, usage
//! logging and serving of stored audio files.

pub mod handlers;
pub mod keys;
pub mod server;
pub mod types;
pub mod usage;

// Re-export commonly used items
pub use keys::{fingerprint, hash_key, ApiKeyRegistry};
pub use server::{router, run_server, serve, AppState};
pub use types::{ErrorResponse, GenerateRequest, GenerateResponse};
pub use usage::{UsageLog, UsageRecord, UsageStatus};

//! Generation module.
//!
//! Provides the coordinator that routes requests across music providers.

pub mod coordinator;

// Re-export commonly used items
pub use coordinator::{Coordinator, ProviderStatus, SegmentPolicy, DEFAULT_HEALTH_TIMEOUT};

//! In-memory usage log for the generation endpoint.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of rows kept.
pub const DEFAULT_USAGE_CAPACITY: usize = 1000;

/// Outcome recorded for a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageStatus {
    Success,
    Error,
}

/// One generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub timestamp: DateTime<Utc>,
    pub key_fingerprint: String,
    /// Provider that produced the audio, if any.
    pub provider: Option<String>,
    pub status: UsageStatus,
    /// Delivered duration in seconds, or the requested one on failure.
    pub duration: u32,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

/// Bounded log; the oldest rows are dropped first.
#[derive(Debug)]
pub struct UsageLog {
    rows: Mutex<VecDeque<UsageRecord>>,
    capacity: usize,
}

impl Default for UsageLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_USAGE_CAPACITY)
    }
}

impl UsageLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            rows: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_USAGE_CAPACITY))),
            capacity,
        }
    }

    pub fn record(&self, record: UsageRecord) {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        while rows.len() >= self.capacity {
            rows.pop_front();
        }
        rows.push_back(record);
    }

    /// Returns up to `limit` rows, newest first.
    pub fn recent(&self, limit: usize) -> Vec<UsageRecord> {
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

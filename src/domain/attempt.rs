//! Attempt records - one generate-then-test cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::outcome::TestOutcome;

/// One recorded cycle. Immutable once pushed onto the loop's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    /// 1-based ordinal
    pub index: u32,
    pub source: String,
    /// SHA-256 of `source`, hex encoded
    pub digest: String,
    /// Feedback that was sent to produce this source; empty for attempt 1
    pub feedback: String,
    pub outcome: TestOutcome,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl Attempt {
    pub fn is_success(&self) -> bool {
        self.outcome.success
    }

    /// First 12 hex chars of the digest, for logs
    pub fn short_digest(&self) -> &str {
        &self.digest[..self.digest.len().min(12)]
    }
}

/// An attempt whose source exists but has not been tested yet.
#[derive(Debug, Clone)]
pub struct PendingAttempt {
    pub index: u32,
    pub source: String,
    pub feedback: String,
    pub started_at: DateTime<Utc>,
}

impl PendingAttempt {
    pub fn new(index: u32, source: String, feedback: String) -> Self {
        Self {
            index,
            source,
            feedback,
            started_at: Utc::now(),
        }
    }

    /// Seal the attempt with its test outcome
    pub fn finish(self, outcome: TestOutcome) -> Attempt {
        let duration_ms = (Utc::now() - self.started_at).num_milliseconds().max(0) as u64;
        Attempt {
            index: self.index,
            digest: source_digest(&self.source),
            source: self.source,
            feedback: self.feedback,
            outcome,
            started_at: self.started_at,
            duration_ms,
        }
    }
}

pub fn source_digest(source: &str) -> String {
    hex::encode(Sha256::digest(source.as_bytes()))
}

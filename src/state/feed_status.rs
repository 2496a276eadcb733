//! Per-feed health tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of the most recent fetches of one realtime feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedStatus {
    pub feed_id: u32,
    /// Time of the last fetch that decoded cleanly
    pub last_success: Option<DateTime<Utc>>,
    /// Future arrivals held from the last good fetch
    pub arrivals: usize,
    /// Error of the last failed fetch, cleared by the next success
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
}

impl FeedStatus {
    pub fn new(feed_id: u32) -> Self {
        Self {
            feed_id,
            last_success: None,
            arrivals: 0,
            last_error: None,
            consecutive_failures: 0,
        }
    }

    pub fn record_success(&mut self, at: DateTime<Utc>, arrivals: usize) {
        self.last_success = Some(at);
        self.arrivals = arrivals;
        self.last_error = None;
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self, error: String) {
        self.last_error = Some(error);
        self.consecutive_failures += 1;
        if self.consecutive_failures > 1 {
            tracing::debug!(
                "Feed {} has failed {} times in a row",
                self.feed_id,
                self.consecutive_failures
            );
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.last_success.is_some() && self.last_error.is_none()
    }
}

//! Presentation-level analytics rollup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Running counters for one presentation, created with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rollup {
    pub presentation_id: Uuid,
    /// Incremented on every tracked view ping.
    pub total_views: u64,
    /// Incremented once per new session.
    pub unique_viewers: u64,
    /// Seconds, recomputed from session records.
    pub avg_time_spent: f64,
    pub updated_at: DateTime<Utc>,
}

impl Rollup {
    pub fn new(presentation_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            presentation_id,
            total_views: 0,
            unique_viewers: 0,
            avg_time_spent: 0.0,
            updated_at: now,
        }
    }

    /// Counts a view; `new_session` also counts a unique viewer.
    pub fn record_view(&mut self, new_session: bool, now: DateTime<Utc>) {
        self.total_views += 1;
        if new_session {
            self.unique_viewers += 1;
        }
        self.updated_at = now;
    }
}

/// Arithmetic mean; zero for an empty input.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

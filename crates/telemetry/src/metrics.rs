//! In-process metrics.
//!
//! A [`Metrics`] registry is created at startup and shared through the
//! application state; services record into it and `/health` reports a
//! snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Latency histogram in milliseconds.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, +inf
    buckets: [AtomicU64; 10],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 9] = [1, 5, 10, 25, 50, 100, 250, 500, 1000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len());
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    /// Records the time elapsed since `start`.
    pub fn observe_since(&self, start: Instant) {
        self.observe(start.elapsed().as_millis() as u64);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Bucket upper bounds with their counts; `None` is the overflow bucket.
    pub fn buckets(&self) -> Vec<(Option<u64>, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .map(|&b| Some(b))
            .chain(std::iter::once(None))
            .zip(self.buckets.iter())
            .map(|(bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Metrics for tracking, access and generation.
#[derive(Debug, Default)]
pub struct Metrics {
    // Tracking
    pub views_tracked: Counter,
    pub sessions_created: Counter,
    pub engagement_updates: Counter,
    pub tracking_rejected: Counter,
    pub rollup_failures: Counter,

    // Version access
    pub access_view: Counter,
    pub access_edit: Counter,
    pub access_denied: Counter,
    pub access_expired: Counter,

    // Authoring
    pub presentations_created: Counter,
    pub versions_created: Counter,
    pub webhooks_received: Counter,
    pub webhook_failures: Counter,

    // Latency
    pub track_view_latency_ms: Histogram,
    pub track_engagement_latency_ms: Histogram,
    pub analytics_latency_ms: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            views_tracked: self.views_tracked.get(),
            sessions_created: self.sessions_created.get(),
            engagement_updates: self.engagement_updates.get(),
            tracking_rejected: self.tracking_rejected.get(),
            rollup_failures: self.rollup_failures.get(),
            access_view: self.access_view.get(),
            access_edit: self.access_edit.get(),
            access_denied: self.access_denied.get(),
            access_expired: self.access_expired.get(),
            presentations_created: self.presentations_created.get(),
            versions_created: self.versions_created.get(),
            webhooks_received: self.webhooks_received.get(),
            webhook_failures: self.webhook_failures.get(),
            track_view_latency_mean_ms: self.track_view_latency_ms.mean(),
            track_engagement_latency_mean_ms: self.track_engagement_latency_ms.mean(),
            analytics_latency_mean_ms: self.analytics_latency_ms.mean(),
        }
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub views_tracked: u64,
    pub sessions_created: u64,
    pub engagement_updates: u64,
    pub tracking_rejected: u64,
    pub rollup_failures: u64,
    pub access_view: u64,
    pub access_edit: u64,
    pub access_denied: u64,
    pub access_expired: u64,
    pub presentations_created: u64,
    pub versions_created: u64,
    pub webhooks_received: u64,
    pub webhook_failures: u64,
    pub track_view_latency_mean_ms: f64,
    pub track_engagement_latency_mean_ms: f64,
    pub analytics_latency_mean_ms: f64,
}

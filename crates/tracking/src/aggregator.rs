//! Analytics aggregation over session records.
//!
//! The free functions are pure and work on any slice of records; the
//! [`Analytics`] service loads the records for a presentation or version
//! and assembles the report types the API returns.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use proposal_core::limits::{RECENT_SESSIONS_LIMIT, TOP_K};
use proposal_core::{mean, Result, SessionRecord};
use proposal_store::Store;
use telemetry::Metrics;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeviceBreakdown {
    pub desktop: u64,
    pub mobile: u64,
    pub tablet: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationCount {
    pub country: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionStat {
    pub section_id: String,
    /// Sessions that viewed the section.
    pub views: u64,
    /// Seconds, with each session's time split evenly over its sections.
    pub avg_time: f64,
}

/// Presentation-wide report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationAnalytics {
    pub presentation_id: Uuid,
    pub total_views: u64,
    pub unique_viewers: u64,
    pub avg_time_spent: f64,
    pub scroll_depth_avg: f64,
    pub top_sections: Vec<SectionStat>,
    pub device_breakdown: DeviceBreakdown,
    pub location_data: Vec<LocationCount>,
}

/// Single-version report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub version_id: Uuid,
    /// One per session record.
    pub total_views: u64,
    pub unique_sessions: u64,
    pub avg_time_spent: f64,
    pub avg_scroll_depth: f64,
    /// Most recent records, newest first.
    pub views: Vec<SessionRecord>,
}

/// Counts sessions per device class by case-insensitive substring match.
pub fn device_breakdown(sessions: &[SessionRecord]) -> DeviceBreakdown {
    let mut breakdown = DeviceBreakdown::default();
    for device in sessions.iter().filter_map(|s| s.device.as_deref()) {
        let device = device.to_lowercase();
        if device.contains("desktop") {
            breakdown.desktop += 1;
        }
        if device.contains("mobile") {
            breakdown.mobile += 1;
        }
        if device.contains("tablet") {
            breakdown.tablet += 1;
        }
    }
    breakdown
}

/// Top countries by session count; ties keep first appearance.
pub fn location_ranking(sessions: &[SessionRecord]) -> Vec<LocationCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<LocationCount> = Vec::new();

    for country in sessions.iter().filter_map(|s| s.country.as_deref()) {
        match index.get(country) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(country, counts.len());
                counts.push(LocationCount {
                    country: country.to_string(),
                    count: 1,
                });
            }
        }
    }

    // stable: equal counts stay in first-appearance order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_K);
    counts
}

/// Most viewed sections with an even-split time estimate.
pub fn top_sections(sessions: &[SessionRecord]) -> Vec<SectionStat> {
    struct Acc<'a> {
        section_id: &'a str,
        views: u64,
        total_time: f64,
    }

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut accs: Vec<Acc> = Vec::new();

    for session in sessions {
        let n = session.sections_viewed.len();
        if n == 0 {
            continue;
        }
        let share = session.time_spent / n as f64;

        for section in &session.sections_viewed {
            let i = *index.entry(section.as_str()).or_insert_with(|| {
                accs.push(Acc {
                    section_id: section,
                    views: 0,
                    total_time: 0.0,
                });
                accs.len() - 1
            });
            accs[i].views += 1;
            accs[i].total_time += share;
        }
    }

    accs.sort_by(|a, b| b.views.cmp(&a.views));
    accs.into_iter()
        .take(TOP_K)
        .map(|acc| SectionStat {
            section_id: acc.section_id.to_string(),
            views: acc.views,
            avg_time: acc.total_time / acc.views as f64,
        })
        .collect()
}

pub fn scroll_depth_avg(sessions: &[SessionRecord]) -> f64 {
    mean(sessions.iter().map(|s| s.scroll_depth))
}

pub fn time_spent_avg(sessions: &[SessionRecord]) -> f64 {
    mean(sessions.iter().map(|s| s.time_spent))
}

/// Summary of one version's records.
pub fn version_summary(version_id: Uuid, sessions: &[SessionRecord]) -> VersionSummary {
    let unique_sessions = {
        let mut ids: Vec<&str> = sessions.iter().map(|s| s.session_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len() as u64
    };

    let mut recent: Vec<SessionRecord> = sessions.to_vec();
    recent.sort_by(|a, b| b.viewed_at.cmp(&a.viewed_at));
    recent.truncate(RECENT_SESSIONS_LIMIT);

    VersionSummary {
        version_id,
        total_views: sessions.len() as u64,
        unique_sessions,
        avg_time_spent: time_spent_avg(sessions),
        avg_scroll_depth: scroll_depth_avg(sessions),
        views: recent,
    }
}

/// Loads records and builds reports.
#[derive(Clone)]
pub struct Analytics {
    store: Arc<dyn Store>,
    metrics: Arc<Metrics>,
}

impl Analytics {
    pub fn new(store: Arc<dyn Store>, metrics: Arc<Metrics>) -> Self {
        Self { store, metrics }
    }

    /// Rollup counters plus breakdowns over every version's sessions.
    pub async fn presentation(&self, presentation_id: Uuid) -> Result<PresentationAnalytics> {
        let start = Instant::now();

        let rollup = self.store.get_rollup(presentation_id).await?;
        let sessions = self.store.sessions_for_presentation(presentation_id).await?;

        let report = PresentationAnalytics {
            presentation_id,
            total_views: rollup.total_views,
            unique_viewers: rollup.unique_viewers,
            avg_time_spent: rollup.avg_time_spent,
            scroll_depth_avg: scroll_depth_avg(&sessions),
            top_sections: top_sections(&sessions),
            device_breakdown: device_breakdown(&sessions),
            location_data: location_ranking(&sessions),
        };

        self.metrics.analytics_latency_ms.observe_since(start);
        debug!(
            presentation_id = %presentation_id,
            sessions = sessions.len(),
            "Built presentation analytics"
        );
        Ok(report)
    }

    /// Summary for one version.
    ///
    /// An id with no session records, known or not, yields an all-zero
    /// summary.
    pub async fn version(&self, version_id: Uuid) -> Result<VersionSummary> {
        let start = Instant::now();

        let sessions = self.store.sessions_for_version(version_id).await?;
        let summary = version_summary(version_id, &sessions);

        self.metrics.analytics_latency_ms.observe_since(start);
        Ok(summary)
    }
}

//! Session tracking and analytics aggregation.
//!
//! [`SessionTracker`] turns client pings into session records and keeps the
//! per-presentation rollup current; [`Analytics`] builds reports from them.

pub mod aggregator;
pub mod enrichment;
pub mod tracker;

pub use aggregator::{
    Analytics, DeviceBreakdown, LocationCount, PresentationAnalytics, SectionStat,
    VersionSummary,
};
pub use enrichment::UserAgentEnricher;
pub use tracker::SessionTracker;

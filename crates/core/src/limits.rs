//! Size and range limits for tracking and authoring payloads.
//!
//! Tracking calls come from an uncontrolled browser, so every list and
//! string a client can send is capped before anything touches storage.
//!
//! The `#[validate]` derive macro requires literal values in attributes,
//! so field limits are duplicated there. Keep both in sync when modifying.

// === Tracking ===

/// Client session id max length.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Section ids accepted per engagement update.
pub const MAX_SECTIONS_PER_UPDATE: usize = 500;

/// Click events accepted per engagement update.
pub const MAX_CLICKS_PER_UPDATE: usize = 500;

/// Section id / click element id max length.
pub const MAX_ELEMENT_ID_LEN: usize = 256;

/// User agent string max length.
pub const MAX_USER_AGENT_LEN: usize = 512;

/// IP address max length (IPv6 = 45 chars).
pub const MAX_IP_LEN: usize = 45;

/// Country / city / device / browser label max length.
pub const MAX_LABEL_LEN: usize = 128;

/// Scroll depth bounds (percent).
pub const MIN_SCROLL_DEPTH: f64 = 0.0;
pub const MAX_SCROLL_DEPTH: f64 = 100.0;

// === Analytics ===

/// Entries returned by the country leaderboard and top sections.
pub const TOP_K: usize = 10;

/// Raw session records returned with a version summary.
pub const RECENT_SESSIONS_LIMIT: usize = 50;

// === Authoring ===

/// Presentation title length bounds.
pub const MIN_TITLE_LEN: usize = 1;
pub const MAX_TITLE_LEN: usize = 200;

/// Serialized variable map max size (64KB).
pub const MAX_VARIABLES_BYTES: usize = 64 * 1024;

/// Version password max length.
pub const MAX_PASSWORD_LEN: usize = 256;

// === Identifiers ===

/// Length of generated version slugs.
pub const VERSION_SLUG_LEN: usize = 12;

/// Length of generated view / edit tokens.
pub const TOKEN_LEN: usize = 32;

/// Max length of the title-derived part of a presentation slug.
pub const MAX_SLUG_STEM_LEN: usize = 48;

/// Webhook log entries retained; older entries are pruned on insert.
pub const MAX_WEBHOOK_LOGS: usize = 1000;

//! Authoring side of the proposal engine: presentations, recipient
//! versions, the template catalogue and the CRM deal webhook.

pub mod links;
pub mod presentations;
pub mod templates;
pub mod versions;
pub mod webhook;

pub use links::{LinkBuilder, VersionLinks};
pub use presentations::{PresentationDetail, Presentations, VersionDigest};
pub use templates::{builtin_templates, find_template, Templates};
pub use versions::{IssuedVersion, VersionListing, VersionView, Versions};
pub use webhook::{Deal, DealOutcome, DealPayload, DealWebhook};

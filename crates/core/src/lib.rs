//! Core types, access rules and content substitution for proposal presentations.

pub mod analytics;
pub mod auth;
pub mod content;
pub mod error;
pub mod limits;
pub mod presentation;
pub mod proposal;
pub mod schema;
pub mod session;
pub mod substitute;
pub mod template;
pub mod version;
pub mod webhook;

pub use analytics::*;
pub use auth::*;
pub use error::{Error, Result};
pub use presentation::*;
pub use session::*;
pub use template::{NewTemplate, Template, TemplateVariable, VariableKind};
pub use version::*;
pub use webhook::*;

//! Request validation.
//!
//! Everything here runs before any store mutation.

use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::{Error, Result, ValidationErrorCode};
use crate::limits::MAX_VARIABLES_BYTES;
use crate::presentation::{NewPresentation, PresentationPatch};
use crate::session::{TrackEngagement, TrackView};
use crate::substitute::VariableMap;
use crate::template::NewTemplate;
use crate::version::NewVersion;

/// Lists failing fields as `path: code`, sorted by path.
///
/// Rejected values are never included.
pub fn describe_errors(errors: &ValidationErrors) -> Vec<String> {
    fn walk(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
        for (field, kind) in errors.errors() {
            let path = if prefix.is_empty() {
                field.to_string()
            } else {
                format!("{}.{}", prefix, field)
            };
            match kind {
                ValidationErrorsKind::Field(list) => {
                    for e in list {
                        let reason = e.message.as_deref().unwrap_or(&*e.code);
                        out.push(format!("{}: {}", path, reason));
                    }
                }
                ValidationErrorsKind::Struct(nested) => walk(&path, nested, out),
                ValidationErrorsKind::List(items) => {
                    for (i, nested) in items {
                        walk(&format!("{}[{}]", path, i), nested, out);
                    }
                }
            }
        }
    }

    let mut out = Vec::new();
    walk("", errors, &mut out);
    out.sort();
    out
}

fn invalid(scope: &str, errors: &ValidationErrors) -> Error {
    Error::validation(format!("{}: {}", scope, describe_errors(errors).join(", ")))
}

/// Validates a view ping.
pub fn validate_track_view(view: &TrackView) -> Result<()> {
    view.validate().map_err(|e| invalid("trackView", &e))
}

/// Validates an engagement update.
pub fn validate_track_engagement(engagement: &TrackEngagement) -> Result<()> {
    engagement
        .validate()
        .map_err(|e| invalid("trackEngagement", &e))?;

    // JSON cannot carry NaN/inf, but internal callers can
    if let Some(t) = engagement.update.time_spent {
        if !t.is_finite() {
            return Err(Error::validation("timeSpent must be finite"));
        }
    }
    if let Some(d) = engagement.update.scroll_depth {
        if !d.is_finite() {
            return Err(Error::validation("scrollDepth must be finite"));
        }
    }

    Ok(())
}

/// Rejects variable maps larger than the serialized size limit.
pub fn validate_variables(variables: &VariableMap) -> Result<()> {
    let size = serde_json::to_vec(variables)?.len();
    if size > MAX_VARIABLES_BYTES {
        return Err(Error::validation_code(
            ValidationErrorCode::PayloadTooLarge,
            format!(
                "variables {}KB exceeds {}KB limit",
                size / 1024,
                MAX_VARIABLES_BYTES / 1024
            ),
        ));
    }
    Ok(())
}

pub fn validate_new_version(new: &NewVersion) -> Result<()> {
    new.validate().map_err(|e| invalid("version", &e))?;
    validate_variables(&new.variables)
}

pub fn validate_new_presentation(new: &NewPresentation) -> Result<()> {
    new.validate().map_err(|e| invalid("presentation", &e))
}

pub fn validate_presentation_patch(patch: &PresentationPatch) -> Result<()> {
    patch.validate().map_err(|e| invalid("presentation", &e))
}

pub fn validate_new_template(new: &NewTemplate) -> Result<()> {
    new.validate().map_err(|e| invalid("template", &e))
}

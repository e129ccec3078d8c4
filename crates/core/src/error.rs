//! Unified error types for the proposal engine.
//!
//! Error codes:
//! - ACCESS_001-004: Version access errors
//! - NOT_FOUND_001-006: Missing entities
//! - VALID_001-002: Validation errors
//! - STORE_001-002: Storage errors

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Version access error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessErrorCode {
    /// ACCESS_001: Token matches neither the view nor the edit token
    InvalidToken,
    /// ACCESS_002: Operation needs the edit token
    EditTokenRequired,
    /// ACCESS_003: Version expiry has passed
    Expired,
    /// ACCESS_004: Version is password protected
    PasswordRequired,
}

impl AccessErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "ACCESS_001",
            Self::EditTokenRequired => "ACCESS_002",
            Self::Expired => "ACCESS_003",
            Self::PasswordRequired => "ACCESS_004",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidToken => 403,
            Self::EditTokenRequired => 403,
            Self::Expired => 410,
            Self::PasswordRequired => 403,
        }
    }
}

/// Entity kinds that can be reported missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundCode {
    Presentation,
    Version,
    Session,
    Template,
    Owner,
    Analytics,
}

impl NotFoundCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Presentation => "NOT_FOUND_001",
            Self::Version => "NOT_FOUND_002",
            Self::Session => "NOT_FOUND_003",
            Self::Template => "NOT_FOUND_004",
            Self::Owner => "NOT_FOUND_005",
            Self::Analytics => "NOT_FOUND_006",
        }
    }

    /// Human readable entity name.
    pub fn entity(&self) -> &'static str {
        match self {
            Self::Presentation => "Presentation",
            Self::Version => "Version",
            Self::Session => "Session",
            Self::Template => "Template",
            Self::Owner => "Owner",
            Self::Analytics => "Analytics",
        }
    }
}

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// VALID_001: Malformed or out-of-range input
    InvalidFormat,
    /// VALID_002: Payload exceeds a size limit
    PayloadTooLarge,
}

impl ValidationErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "VALID_001",
            Self::PayloadTooLarge => "VALID_002",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidFormat => 400,
            Self::PayloadTooLarge => 413,
        }
    }
}

/// Storage error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// STORE_001: Unique key already taken
    Conflict,
    /// STORE_002: Backend failed the operation
    Unavailable,
}

impl StoreErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Conflict => "STORE_001",
            Self::Unavailable => "STORE_002",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::Conflict => 409,
            Self::Unavailable => 500,
        }
    }
}

/// Unified error type for the proposal engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Version access was refused.
    #[error("[{code}] {message}")]
    Access {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Referenced entity does not exist.
    #[error("[{code}] {message}")]
    NotFound { code: &'static str, message: String },

    /// Validation error with code.
    #[error("[{code}] {message}")]
    ValidationWithCode {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Storage error with code.
    #[error("[{code}] {message}")]
    Store {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an access error.
    pub fn access(code: AccessErrorCode, msg: impl Into<String>) -> Self {
        Self::Access {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a not-found error for the given entity kind.
    pub fn not_found(code: NotFoundCode) -> Self {
        Self::NotFound {
            code: code.code(),
            message: format!("{} not found", code.entity()),
        }
    }

    /// Create a validation error with code.
    pub fn validation_code(code: ValidationErrorCode, msg: impl Into<String>) -> Self {
        Self::ValidationWithCode {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a storage error.
    pub fn store(code: StoreErrorCode, msg: impl Into<String>) -> Self {
        Self::Store {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::store(StoreErrorCode::Conflict, msg)
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error reports a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this is the given access refusal.
    pub fn is_access(&self, code: AccessErrorCode) -> bool {
        matches!(self, Self::Access { code: c, .. } if *c == code.code())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Access { http_status, .. } => *http_status,
            Self::NotFound { .. } => 404,
            Self::ValidationWithCode { http_status, .. } => *http_status,
            Self::Store { http_status, .. } => *http_status,
            Self::Validation(_) => 400,
            Self::Serialization(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Access { code, .. } => code,
            Self::NotFound { code, .. } => code,
            Self::ValidationWithCode { code, .. } => code,
            Self::Store { code, .. } => code,
            Self::Validation(_) | Self::Serialization(_) => ValidationErrorCode::InvalidFormat.code(),
            Self::Internal(_) => StoreErrorCode::Unavailable.code(),
        }
    }
}

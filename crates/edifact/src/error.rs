//! Error types for interchange building, parsing and validation.

use thiserror::Error;

/// Error categories, one per failure family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Configuration key not set or locked
    Configuration,
    /// E002: Segment tag unknown or segment line malformed
    Segment,
    /// E003: Segment order does not match the blueprint
    UnexpectedSegment,
    /// E004: Segment failed its own element checks
    SelfValidation,
    /// E005: Underlying stream failure
    Io,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::Configuration => "E001",
            ErrorCode::Segment => "E002",
            ErrorCode::UnexpectedSegment => "E003",
            ErrorCode::SelfValidation => "E004",
            ErrorCode::Io => "E005",
        }
    }
}

/// Configuration lookup or mutation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("[E001] configuration {key} not set")]
    NotSet { key: String },

    #[error("[E001] interchange already building, prebuild configuration {key} is locked")]
    Locked { key: String },

    #[error("[E001] configuration {key} holds {found}, expected {expected}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Failure resolving or parsing a single segment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    #[error("[E002] unknown segment {tag:?}")]
    Unknown { tag: String },

    #[error("[E002] segment line starts with {found:?}, expected {expected}")]
    TagMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("[E002] malformed segment line: {reason}")]
    Malformed { reason: &'static str },
}

/// Structural or segment-internal validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(
        "[E003] unexpected segment {actual} at position {position}, expected {}",
        .expected.as_deref().unwrap_or("end of interchange")
    )]
    UnexpectedSegment {
        expected: Option<String>,
        actual: String,
        position: usize,
    },

    #[error("[E004] segment {tag} element {element} component {component}: {reason}")]
    SegmentInvalid {
        tag: &'static str,
        element: usize,
        component: usize,
        reason: &'static str,
    },
}

/// Any failure raised by this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Segment(#[from] SegmentError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("[E005] stream error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Config(_) => ErrorCode::Configuration,
            Error::Segment(_) => ErrorCode::Segment,
            Error::Validation(ValidationError::UnexpectedSegment { .. }) => {
                ErrorCode::UnexpectedSegment
            }
            Error::Validation(ValidationError::SegmentInvalid { .. }) => ErrorCode::SelfValidation,
            Error::Io(_) => ErrorCode::Io,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

//! Diagnostics emitted while loading canvas data.

use itemize_config::ReferenceFrame;

use crate::format::{FormatError, RejectedStroke};

/// Why a load degraded to an empty drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// A serialized document was not valid JSON
    Unparseable,
    /// A normalized document had unreadable metadata or a non-array `paths`
    MalformedDocument,
    /// Neither normalized, legacy, nor a string
    Unrecognized,
}

impl From<&FormatError> for FallbackReason {
    fn from(err: &FormatError) -> Self {
        match err {
            FormatError::Parse(_) => Self::Unparseable,
            FormatError::MalformedMetadata(_) | FormatError::PathsNotArray { .. } => {
                Self::MalformedDocument
            }
            FormatError::Unrecognized { .. } => Self::Unrecognized,
        }
    }
}

/// Which path a load took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Nothing was stored
    Empty,
    /// A normalized document was denormalized onto the canvas
    Normalized,
    /// A legacy pixel array, rescaled when its capture size was known and differed
    Legacy { rescaled: bool },
    /// The input was unusable and an empty drawing was returned
    Fallback(FallbackReason),
}

/// Events delivered to diagnostic listeners.
///
/// Loading never fails, so these are the only way a host can notice that a
/// stored drawing was discarded or loaded with suspicious metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadDiagnostic {
    /// Stored data was discarded and an empty drawing returned
    Discarded { reason: FallbackReason, message: String },
    /// Individual strokes were unreadable and left out of the drawing
    MalformedStrokes { rejected: Vec<RejectedStroke> },
    /// Document was written by a newer format version
    NewerVersion { version: u32 },
    /// Document was saved against a different reference frame than the active one
    ReferenceMismatch {
        stored: ReferenceFrame,
        active: ReferenceFrame,
    },
}

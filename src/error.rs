//! Error types for the pagination pass.
//!
//! Three kinds matter to callers:
//! - [`PagedError::Configuration`] – invalid page geometry, raised before the
//!   document is touched.
//! - [`PagedError::MeasurementInconsistency`] – geometry changed under the
//!   pass; the pipeline retries from scratch.
//! - [`PagedError::Unsupported`] – a known-unhandled layout interaction. The
//!   partitioner records these and finishes best-effort instead of failing.

use thiserror::Error;

use crate::dom::NodeId;

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, PagedError>;

#[derive(Error, Debug)]
pub enum PagedError {
    /// Zero/negative printable area or otherwise unusable paper settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A structural interaction the engine deliberately does not resolve.
    #[error("unsupported layout case at node {node}: {reason}")]
    Unsupported { node: NodeId, reason: UnsupportedReason },

    /// Geometry observed to change between two reads of the same pass.
    #[error("measurement inconsistency: {0}")]
    MeasurementInconsistency(String),

    /// The layout host failed to produce geometry.
    #[error("layout error: {0}")]
    Layout(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a boundary could not be resolved faithfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedReason {
    /// Relatively positioned box with a vertical offset at a page boundary.
    RelativeOffset,
    /// Transformed box at a page boundary.
    Transform,
    /// Negative margin pulling content over a parent's border/padding edge.
    NegativeMarginCompensation,
    /// A single line taller than an empty page.
    OversizedLine,
}

impl std::fmt::Display for UnsupportedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UnsupportedReason::RelativeOffset => "relative offset across a page boundary",
            UnsupportedReason::Transform => "transform across a page boundary",
            UnsupportedReason::NegativeMarginCompensation => "negative margin compensation",
            UnsupportedReason::OversizedLine => "single line taller than the page body",
        };
        f.write_str(s)
    }
}

impl PagedError {
    /// True for errors after which the whole pass should be re-run.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PagedError::MeasurementInconsistency(_))
    }
}

impl From<taffy::TaffyError> for PagedError {
    fn from(e: taffy::TaffyError) -> Self {
        PagedError::Layout(e.to_string())
    }
}

// ── Core error types ──
//
// User-facing errors from arc-core. Transport failures never show up here
// directly: they arrive as `AskFinished::Error(message)` and only become a
// `CoreError` when a caller unwraps them or reads a poisoned resource.

use thiserror::Error;

use crate::model::ResourceName;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Resource state ───────────────────────────────────────────────
    #[error("resource is not loaded: {resource}")]
    NotLoaded { resource: ResourceName },

    /// The last load of the resource failed; carries the server message verbatim.
    #[error("{message}")]
    ResourceFailed {
        resource: ResourceName,
        message: String,
    },

    #[error("record not available: {resource}/#{id}")]
    RecordNotAvailable { resource: ResourceName, id: i64 },

    // ── Operation errors ─────────────────────────────────────────────
    /// An `Error` outcome unwrapped by `unwrap_or_fail`.
    #[error("{message}")]
    Failed { message: String },

    #[error("operation is still loading")]
    StillLoading,

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Invalid record: {message}")]
    InvalidRecord { message: String },

    // ── Routing errors ───────────────────────────────────────────────
    #[error("Unknown resource: {name}")]
    UnknownResource { name: String },

    #[error("Invalid notification: {reason}")]
    InvalidNotification { reason: String },

    #[error(transparent)]
    Api(#[from] arc_api::Error),
}

impl CoreError {
    /// Returns `true` for "record not available" lookups.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotAvailable { .. })
    }
}

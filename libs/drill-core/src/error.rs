//! Error types for drill-core.

use thiserror::Error;

/// Errors raised while turning raw module content into drill items.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("invalid module json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("module {module_id} has no drill items")]
    EmptyModule { module_id: String },

    #[error("item {index} of module {module_id} has no acceptable answers")]
    MissingAnswers { module_id: String, index: usize },

    #[error("module {module_id} could not be read: {reason}")]
    Unavailable { module_id: String, reason: String },
}

/// Errors reported by a progress storage backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage write failed for {key}: {reason}")]
    Write { key: String, reason: String },
}

//! Error types for session operations.

use thiserror::Error;

use crate::model::LabelId;

/// Errors that can occur while loading, saving or editing a session.
///
/// Per-label anomalies found while loading (dangling ids, orphaned chain
/// links) are not errors: they are logged and recorded in the event log.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The session document is structurally unusable
    #[error("Malformed session: {message}")]
    MalformedSession {
        /// Description of what is wrong with the document
        message: String,
    },

    /// Navigation was requested on a session without items
    #[error("Cannot navigate: the session has no items")]
    InvalidNavigation,

    /// A label id passed to a graph operation does not exist
    #[error("Label not found: {id}")]
    LabelNotFound {
        /// The missing label id
        id: LabelId,
    },

    /// A requested parent/child or previous/next link breaks a graph invariant
    #[error("Invalid link: {message}")]
    InvalidLink {
        /// Why the link was refused
        message: String,
    },

    /// I/O error in a session backend
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON syntax or serialization error
    #[error("JSON error: {0}")]
    Json(serde_json::Error),
}

impl SessionError {
    /// Create a malformed session error with a message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedSession {
            message: message.into(),
        }
    }

    /// Create an invalid link error with a message.
    pub fn invalid_link(message: impl Into<String>) -> Self {
        Self::InvalidLink {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SessionError {
    /// Data errors (missing fields, wrong types) mean the document itself is
    /// malformed; everything else is reported as a JSON error.
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            serde_json::error::Category::Data => Self::malformed(err.to_string()),
            _ => Self::Json(err),
        }
    }
}

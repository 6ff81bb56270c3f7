//! Error types for the WhatsApp tester core.
//!
//! # Design
//! Nothing here is fatal. Every variant can be rendered with
//! `ApiError::to_value` into the error object that is shown in place of a
//! backend response, after which the form stays usable.

use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend (or asset host) answered with a non-2xx status. The body
    /// is kept verbatim.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (connection refused, DNS, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// User-facing upload failure message, e.g. "Image upload failed.".
    #[error("{0}")]
    UploadFailed(String),

    #[error("a request is already in flight")]
    AlreadySending,

    #[error("unknown message kind: {0}")]
    UnknownKind(String),

    #[error("unknown recipient type: {0}")]
    UnknownRecipientType(String),

    #[error("{0}")]
    Location(String),
}

impl ApiError {
    /// Short machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Http { .. } => "http",
            ApiError::Transport(_) => "transport",
            ApiError::UploadFailed(_) => "upload",
            ApiError::AlreadySending => "already_sending",
            ApiError::UnknownKind(_) => "unknown_kind",
            ApiError::UnknownRecipientType(_) => "unknown_recipient_type",
            ApiError::Location(_) => "location",
        }
    }

    /// The error object displayed where a response would have been.
    ///
    /// For HTTP failures the backend's body is forwarded unchanged: parsed as
    /// JSON when possible, otherwise as the raw string.
    pub fn to_value(&self) -> Value {
        match self {
            ApiError::Http { status, body } => json!({
                "error": self.kind(),
                "status": status,
                "body": crate::client::body_to_value(body),
            }),
            other => json!({
                "error": other.kind(),
                "message": other.to_string(),
            }),
        }
    }
}

//! Error types for the Brightcove API client.
//!
//! # Design
//! Transport failures and non-2xx responses are surfaced unchanged: the
//! `ureq` error is carried as-is and `HttpError` keeps the raw status code
//! and body. Service-level errors (an `error` key inside a 200 response) are
//! not errors at this layer; callers inspect the returned JSON themselves.

use thiserror::Error;

/// Errors returned by the request builder, the response parsers and the
/// blocking transport.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The caller's parameters were neither a mapping nor a parseable query
    /// string, or POST parameters did not serialize to a JSON object.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The server returned a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be parsed as JSON.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request envelope could not be serialized.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// Network, TLS or timeout failure reported by the HTTP agent.
    #[error(transparent)]
    Transport(#[from] ureq::Error),

    /// Reading the upload source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

//! Error types for the Online Labs API client.
//!
//! # Design
//! Every failure reaches the immediate caller exactly once; nothing is
//! retried or swallowed. Error statuses keep the raw response text because
//! the API reports problems as JSON bodies that callers may want to inspect
//! verbatim. Decode failures keep the offending bytes for diagnosis.

use std::path::PathBuf;

use crate::transport::TransportError;

/// Errors returned by `OnlineLabsClient` operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No response was obtained: DNS, connect, TLS, timeout or a broken body.
    #[error("transport failure: {0}")]
    Transport(#[source] TransportError),

    /// The API answered with a status of 300 or above.
    #[error("[{status}] {body}")]
    Api { status: u16, body: String },

    /// The response body was not valid JSON or did not match the expected shape.
    #[error("decoding response failed: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// A request payload could not be serialized.
    #[error("encoding request failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// A local file could not be read.
    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    /// HTTP status of an `Api` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

//! Consul client errors

use thiserror::Error;

/// Errors that can occur when interacting with the Consul HTTP API
#[derive(Debug, Error)]
pub enum ConsulError {
    /// The client could not be constructed (bad host, port, or scheme)
    #[error("Connection error: {0}")]
    Connection(String),

    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Consul returned a non-success status
    #[error("Consul API error: {status} - {body}")]
    Api {
        status: u16,
        body: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

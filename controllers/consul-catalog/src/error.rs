//! Controller-specific error types.
//!
//! This module defines error types specific to the catalog controller
//! that are not covered by upstream library errors.

use consul_client::ConsulError;
use thiserror::Error;

/// Errors that can occur while reconciling a catalog entry.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Parameters rejected before any network call
    #[error("Invalid parameters: {0}")]
    Validation(String),

    /// The Consul client could not be constructed; nothing was attempted
    #[error("Failed to connect to Consul: {0}")]
    Connection(#[source] ConsulError),

    /// A catalog call failed after the client was built
    #[error("Consul error: {0}")]
    Consul(#[from] ConsulError),
}

impl ControllerError {
    /// Whether no catalog operation could be attempted at all
    pub fn is_fatal(&self) -> bool {
        matches!(self, ControllerError::Connection(_))
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            ControllerError::Validation(_) => 2,
            ControllerError::Connection(_) | ControllerError::Consul(_) => 1,
        }
    }
}

//! Error types for service handle operations

use thiserror::Error;
use upnp_eventing::TransportError;
use upnp_soap::SoapError;

/// Errors surfaced by service handle operations.
///
/// None of these are fatal: a failed subscribe leaves the handle
/// Unsubscribed and may be retried, and a failed action reports the
/// transport or remote condition to the caller.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Subscribe or unsubscribe failed at the transport layer
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An action invocation failed (network, decode, or remote fault)
    #[error(transparent)]
    Soap(#[from] SoapError),

    /// A well-formed action response lacked an expected field
    #[error("response to {action} is missing field {field}")]
    MissingField { action: String, field: String },
}

/// Type alias for results of service handle operations
pub type Result<T> = std::result::Result<T, ServiceError>;

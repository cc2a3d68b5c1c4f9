//! Error types for the SOAP action layer

use thiserror::Error;

/// Errors that can occur while invoking a UPnP action
#[derive(Debug, Error)]
pub enum SoapError {
    /// Network or HTTP communication error reported by the invoker
    #[error("network error: {0}")]
    Network(String),

    /// The response document could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// The remote party returned a well-formed UPnP error response
    #[error("UPnP error {code}: {description}")]
    Fault { code: i32, description: String },
}

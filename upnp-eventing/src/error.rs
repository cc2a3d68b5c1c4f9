//! Error types for the eventing core

use thiserror::Error;

/// Errors reported by the underlying transport's subscription primitives
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level failure reaching the remote party
    #[error("network error: {0}")]
    Network(String),

    /// The remote party rejected the request with the given status code
    #[error("request rejected: status {0}")]
    Rejected(i32),
}

/// Errors decoding an event propertyset document
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The raw payload was not well-formed XML
    #[error("XML parse error: {0}")]
    Xml(String),

    /// The document root is not a propertyset
    #[error("expected propertyset document, got <{0}>")]
    NotPropertySet(String),

    /// The propertyset contains an element other than a property
    #[error("unexpected <{0}> element in propertyset")]
    UnexpectedElement(String),

    /// A property element carries no variable child
    #[error("property element carries no variable")]
    EmptyProperty,
}

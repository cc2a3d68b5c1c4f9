//! Subscription registry and event-dispatch core for UPnP control points
//!
//! A control point subscribes to many remote services at once, but the
//! underlying transport library delivers every notification through one
//! process-wide callback. This crate provides the pieces that bridge the
//! two worlds:
//!
//! - [`decoder`]: turns a GENA propertyset document into a
//!   variable-name/value mapping
//! - [`registry`]: the SID-keyed dispatch table shared by all
//!   subscriptions, serialized behind a single lock
//! - [`gateway`]: the one callback installed with the transport,
//!   demultiplexing variable-change events through the registry
//! - [`transport`]: the contract the underlying transport library has to
//!   fulfill (subscribe/unsubscribe primitives, per-category handler
//!   registration)
//!
//! Service-level lifecycle (subscribe, resubscribe, reporter
//! installation) lives in the `upnp-control` crate on top of this one.

pub mod decoder;
mod error;
pub mod gateway;
pub mod registry;
pub mod transport;

pub use decoder::{decode_property_set, decode_property_set_xml, DecodedEvent};
pub use error::{DecodeError, TransportError};
pub use gateway::{EventGateway, RenewalWatcher};
pub use registry::{EventCallback, SubscriptionRegistry};
pub use transport::{
    EventHandler, EventKind, EventTransport, SubscriptionGrant, TransportEvent,
    DEFAULT_SUBSCRIPTION_TIMEOUT_SECS,
};

//! Collaborator contract with the underlying UPnP transport library
//!
//! The transport owns SSDP, HTTP, and the GENA wire protocol. The core
//! only needs its subscribe/unsubscribe primitives and a way to install
//! one process-wide handler per event category; everything it delivers
//! arrives as a [`TransportEvent`] on a thread the transport owns.

use std::sync::Arc;

use xmltree::Element;

use crate::error::{DecodeError, TransportError};

/// Default renewal timeout requested on subscribe, in seconds.
///
/// The transport renews automatically at this cadence; the granted value
/// may differ and is reported in the [`SubscriptionGrant`].
pub const DEFAULT_SUBSCRIPTION_TIMEOUT_SECS: u32 = 1800;

/// The event categories delivered by the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SubscribeComplete,
    RenewalComplete,
    UnsubscribeComplete,
    AutoRenewalFailed,
    VariableChange,
}

impl EventKind {
    /// All categories, in handler-registration order
    pub const ALL: [EventKind; 5] = [
        EventKind::SubscribeComplete,
        EventKind::RenewalComplete,
        EventKind::UnsubscribeComplete,
        EventKind::AutoRenewalFailed,
        EventKind::VariableChange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SubscribeComplete => "subscribe-complete",
            EventKind::RenewalComplete => "renewal-complete",
            EventKind::UnsubscribeComplete => "unsubscribe-complete",
            EventKind::AutoRenewalFailed => "autorenewal-failed",
            EventKind::VariableChange => "variable-change",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful subscription: the SID minted by the remote party and the
/// renewal timeout it actually granted.
#[derive(Debug, Clone)]
pub struct SubscriptionGrant {
    pub sid: String,
    pub timeout_seconds: u32,
}

/// One notification delivered by the transport layer
#[derive(Debug, Clone)]
pub enum TransportEvent {
    SubscribeComplete {
        sid: String,
    },
    RenewalComplete {
        sid: String,
    },
    UnsubscribeComplete {
        sid: String,
    },
    AutoRenewalFailed {
        sid: String,
    },
    VariableChange {
        sid: String,
        /// GENA event sequence number
        event_key: u32,
        /// Parsed propertyset document
        payload: Element,
    },
}

impl TransportEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TransportEvent::SubscribeComplete { .. } => EventKind::SubscribeComplete,
            TransportEvent::RenewalComplete { .. } => EventKind::RenewalComplete,
            TransportEvent::UnsubscribeComplete { .. } => EventKind::UnsubscribeComplete,
            TransportEvent::AutoRenewalFailed { .. } => EventKind::AutoRenewalFailed,
            TransportEvent::VariableChange { .. } => EventKind::VariableChange,
        }
    }

    pub fn sid(&self) -> &str {
        match self {
            TransportEvent::SubscribeComplete { sid }
            | TransportEvent::RenewalComplete { sid }
            | TransportEvent::UnsubscribeComplete { sid }
            | TransportEvent::AutoRenewalFailed { sid }
            | TransportEvent::VariableChange { sid, .. } => sid,
        }
    }
}

/// Handler installed with the transport for one event category
pub type EventHandler = Arc<dyn Fn(TransportEvent) -> Result<(), DecodeError> + Send + Sync>;

/// Subscription primitives of the underlying UPnP transport library.
///
/// `subscribe` and `unsubscribe` are synchronous-with-timeout at the
/// transport layer; `register_event_handler` is called once per
/// [`EventKind`] during gateway installation.
pub trait EventTransport: Send + Sync {
    /// Subscribe to `event_url`, requesting a `timeout_seconds` renewal
    /// timeout. The transport renews the subscription automatically.
    fn subscribe(
        &self,
        event_url: &str,
        timeout_seconds: u32,
    ) -> Result<SubscriptionGrant, TransportError>;

    /// Cancel the subscription identified by `sid`
    fn unsubscribe(&self, sid: &str) -> Result<(), TransportError>;

    /// Install `handler` for one event category
    fn register_event_handler(&self, kind: EventKind, handler: EventHandler);
}

//! SID-keyed callback dispatch table
//!
//! One registry instance is shared between the transport-facing gateway
//! and every service handle in the process. All mutation goes through a
//! single lock; lookups copy the callback reference out and invoke it
//! after the lock is released, so a reporter is free to call back into
//! the registry (e.g. to resubscribe) without deadlocking.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::decoder::DecodedEvent;

/// Callback registered for one subscription, invoked with each decoded event
pub type EventCallback = Arc<dyn Fn(&DecodedEvent) + Send + Sync>;

#[derive(Default)]
struct Inner {
    callbacks: HashMap<String, EventCallback>,
    gateway_installed: bool,
}

/// Table mapping a subscription identifier (SID) to its registered callback.
///
/// Entries are created when a service handle completes a subscribe and
/// removed only by its unregister path; an event arriving for an unknown
/// SID is an expected race (unsubscribe vs. in-flight delivery) and is
/// logged, never an error.
pub struct SubscriptionRegistry {
    inner: Mutex<Inner>,
}

impl SubscriptionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Install `callback` for `sid`, replacing any previous entry.
    ///
    /// Replacement should not occur in normal operation (SIDs are newly
    /// minted per subscribe) but is tolerated defensively.
    pub fn register(&self, sid: impl Into<String>, callback: EventCallback) {
        let sid = sid.into();
        let mut inner = self.inner.lock();
        if inner.callbacks.insert(sid.clone(), callback).is_some() {
            debug!(%sid, "replaced existing callback registration");
        }
    }

    /// Remove the entry for `sid`, returning whether one existed
    pub fn unregister(&self, sid: &str) -> bool {
        self.inner.lock().callbacks.remove(sid).is_some()
    }

    /// Copy out the callback registered for `sid`, if any
    pub fn callback_for(&self, sid: &str) -> Option<EventCallback> {
        self.inner.lock().callbacks.get(sid).cloned()
    }

    pub fn is_registered(&self, sid: &str) -> bool {
        self.inner.lock().callbacks.contains_key(sid)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to the callback registered for `sid`.
    ///
    /// Returns `true` if a callback was invoked. An unknown SID is logged
    /// and reported as `false`. The callback runs outside the lock.
    pub fn dispatch(&self, sid: &str, event: &DecodedEvent) -> bool {
        let callback = {
            let inner = self.inner.lock();
            inner.callbacks.get(sid).cloned()
        };

        match callback {
            Some(callback) => {
                callback(event);
                true
            }
            None => {
                info!(%sid, "no callback registered for event");
                false
            }
        }
    }

    /// Flip the one-time gateway-install flag, returning its previous value.
    ///
    /// Shares the dispatch lock so concurrent installers serialize.
    pub(crate) fn mark_gateway_installed(&self) -> bool {
        let mut inner = self.inner.lock();
        std::mem::replace(&mut inner.gateway_installed, true)
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("subscriptions", &self.len())
            .finish()
    }
}

//! The single entry point handed to the transport layer
//!
//! The transport multiplexes every event-related notification in the
//! process through one callback. The gateway is that callback: it is
//! stateless beyond a reference to the [`SubscriptionRegistry`], and it
//! demultiplexes variable-change events through the registry while the
//! remaining lifecycle categories are observational.
//!
//! The gateway deliberately performs no automatic resubscription: an
//! autorenewal failure is logged and (optionally) surfaced to the
//! application through a renewal watcher, and recovery is the
//! application's decision via its service handle's resubscribe path.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::decoder::decode_property_set;
use crate::error::DecodeError;
use crate::registry::SubscriptionRegistry;
use crate::transport::{EventKind, EventTransport, TransportEvent};

/// Application hook observing autorenewal failures, invoked with the SID
/// of the subscription the transport could no longer renew
pub type RenewalWatcher = Arc<dyn Fn(&str) + Send + Sync>;

/// Demultiplexes transport notifications into per-SID callbacks
pub struct EventGateway {
    registry: Arc<SubscriptionRegistry>,
    renewal_watcher: Option<RenewalWatcher>,
}

impl EventGateway {
    /// Install the gateway with `transport`, registering one shared
    /// handler for every [`EventKind`].
    ///
    /// Idempotent per registry: only the first call registers handlers,
    /// guarded by the registry's dispatch lock.
    pub fn install(registry: Arc<SubscriptionRegistry>, transport: &dyn EventTransport) {
        Self::do_install(registry, transport, None)
    }

    /// Like [`EventGateway::install`], additionally wiring a watcher that
    /// observes autorenewal failures.
    ///
    /// Must be called before any service handle installs the plain
    /// gateway for the same registry, or the watcher is silently ignored
    /// by the install flag.
    pub fn install_with_renewal_watcher(
        registry: Arc<SubscriptionRegistry>,
        transport: &dyn EventTransport,
        watcher: RenewalWatcher,
    ) {
        Self::do_install(registry, transport, Some(watcher))
    }

    fn do_install(
        registry: Arc<SubscriptionRegistry>,
        transport: &dyn EventTransport,
        renewal_watcher: Option<RenewalWatcher>,
    ) {
        if registry.mark_gateway_installed() {
            return;
        }
        debug!("installing transport event gateway");

        let gateway = Arc::new(Self {
            registry,
            renewal_watcher,
        });
        for kind in EventKind::ALL {
            let gateway = Arc::clone(&gateway);
            transport.register_event_handler(kind, Arc::new(move |event| gateway.handle(event)));
        }
    }

    /// Demultiplex one transport notification.
    ///
    /// Variable-change events are decoded and dispatched through the
    /// registry; a decode failure is logged and returned upward without
    /// any dispatch. All other categories are logged only.
    pub fn handle(&self, event: TransportEvent) -> Result<(), DecodeError> {
        match event {
            TransportEvent::SubscribeComplete { sid }
            | TransportEvent::RenewalComplete { sid }
            | TransportEvent::UnsubscribeComplete { sid } => {
                debug!(%sid, "subscription lifecycle event");
                Ok(())
            }
            TransportEvent::AutoRenewalFailed { sid } => {
                warn!(%sid, "autorenewal failed, subscription may be stale");
                if let Some(watcher) = &self.renewal_watcher {
                    watcher(&sid);
                }
                Ok(())
            }
            TransportEvent::VariableChange {
                sid,
                event_key,
                payload,
            } => {
                debug!(%sid, event_key, "variable change event");
                let props = decode_property_set(&payload).map_err(|e| {
                    error!(%sid, error = %e, "could not decode event propertyset");
                    e
                })?;
                self.registry.dispatch(&sid, &props);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::DecodedEvent;
    use crate::error::TransportError;
    use crate::transport::{EventHandler, SubscriptionGrant};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use xmltree::Element;

    /// Transport stub that records the handlers handed to it
    #[derive(Default)]
    struct RecordingTransport {
        handlers: Mutex<Vec<(EventKind, EventHandler)>>,
    }

    impl EventTransport for RecordingTransport {
        fn subscribe(
            &self,
            _event_url: &str,
            timeout_seconds: u32,
        ) -> Result<SubscriptionGrant, TransportError> {
            Ok(SubscriptionGrant {
                sid: "uuid:stub".to_string(),
                timeout_seconds,
            })
        }

        fn unsubscribe(&self, _sid: &str) -> Result<(), TransportError> {
            Ok(())
        }

        fn register_event_handler(&self, kind: EventKind, handler: EventHandler) {
            self.handlers.lock().push((kind, handler));
        }
    }

    fn propertyset(xml: &str) -> Element {
        Element::parse(xml.as_bytes()).unwrap()
    }

    fn gateway(registry: &Arc<SubscriptionRegistry>) -> EventGateway {
        EventGateway {
            registry: Arc::clone(registry),
            renewal_watcher: None,
        }
    }

    #[test]
    fn test_install_registers_all_kinds_once() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let transport = RecordingTransport::default();

        EventGateway::install(Arc::clone(&registry), &transport);
        EventGateway::install(Arc::clone(&registry), &transport);

        let handlers = transport.handlers.lock();
        assert_eq!(handlers.len(), EventKind::ALL.len());
        for (expected, (kind, _)) in EventKind::ALL.iter().zip(handlers.iter()) {
            assert_eq!(expected, kind);
        }
    }

    #[test]
    fn test_installed_handler_routes_to_registry() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let transport = RecordingTransport::default();
        EventGateway::install(Arc::clone(&registry), &transport);

        let count = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&count);
        registry.register(
            "uuid:s1",
            Arc::new(move |_: &DecodedEvent| {
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let handler = {
            let handlers = transport.handlers.lock();
            handlers
                .iter()
                .find(|(kind, _)| *kind == EventKind::VariableChange)
                .map(|(_, h)| Arc::clone(h))
                .unwrap()
        };

        let result = handler(TransportEvent::VariableChange {
            sid: "uuid:s1".to_string(),
            event_key: 1,
            payload: propertyset(
                r#"<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0">
                    <e:property><Volume>10</Volume></e:property>
                </e:propertyset>"#,
            ),
        });

        assert!(result.is_ok());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_decode_failure_skips_dispatch() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let count = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&count);
        registry.register(
            "uuid:s1",
            Arc::new(move |_: &DecodedEvent| {
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let result = gateway(&registry).handle(TransportEvent::VariableChange {
            sid: "uuid:s1".to_string(),
            event_key: 1,
            payload: propertyset("<garbage/>"),
        });

        assert!(result.is_err());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_lifecycle_events_are_observational() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let gw = gateway(&registry);

        for event in [
            TransportEvent::SubscribeComplete {
                sid: "uuid:s1".to_string(),
            },
            TransportEvent::RenewalComplete {
                sid: "uuid:s1".to_string(),
            },
            TransportEvent::UnsubscribeComplete {
                sid: "uuid:s1".to_string(),
            },
            TransportEvent::AutoRenewalFailed {
                sid: "uuid:s1".to_string(),
            },
        ] {
            assert!(gw.handle(event).is_ok());
        }
    }

    #[test]
    fn test_autorenewal_failure_notifies_watcher() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let failed = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&failed);
        let gw = EventGateway {
            registry,
            renewal_watcher: Some(Arc::new(move |sid: &str| {
                sink.lock().push(sid.to_string());
            })),
        };

        gw.handle(TransportEvent::AutoRenewalFailed {
            sid: "uuid:stale".to_string(),
        })
        .unwrap();

        assert_eq!(failed.lock().as_slice(), &["uuid:stale".to_string()]);
    }

    #[test]
    fn test_unknown_sid_event_is_swallowed() {
        let registry = Arc::new(SubscriptionRegistry::new());

        let result = gateway(&registry).handle(TransportEvent::VariableChange {
            sid: "uuid:ghost".to_string(),
            event_key: 1,
            payload: propertyset(
                r#"<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0">
                    <e:property><Volume>10</Volume></e:property>
                </e:propertyset>"#,
            ),
        });

        // Orphaned events are logged, never errors
        assert!(result.is_ok());
    }
}

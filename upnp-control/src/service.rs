//! Per-remote-service subscription lifecycle and action invocation
//!
//! A [`ServiceHandle`] binds one remote service's event and control URLs
//! to the shared subscription registry and transport. It owns at most one
//! active subscription at a time: registering a reporter subscribes and
//! installs a forwarding callback under the minted SID, clearing the
//! reporter unsubscribes, and [`ServiceHandle::resubscribe`] trades a
//! suspected-stale subscription for a fresh one while keeping the
//! callback.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};
use upnp_eventing::{
    DecodedEvent, EventCallback, EventGateway, EventTransport, SubscriptionRegistry,
    DEFAULT_SUBSCRIPTION_TIMEOUT_SECS,
};
use upnp_soap::{ActionInvoker, FromSoapValue, SoapArgs, SoapResponse, ToSoapValue};

use crate::description::{resolve_url, DeviceDescription, ServiceDescription};
use crate::error::{Result, ServiceError};

/// Application-side observer of a service's state-variable changes.
///
/// Installed with [`ServiceHandle::install_reporter`] and invoked from a
/// transport-owned callback thread, always with a successfully decoded
/// event, never with an error.
pub trait VarEventReporter: Send + Sync {
    fn properties_changed(&self, props: &DecodedEvent);
}

/// Handle to one service on a remote device.
///
/// The handle is Subscribed exactly while it holds a SID; all operations
/// report failures through [`ServiceError`] and leave the process
/// running. Dropping a handle unregisters its subscription so the shared
/// registry never outlives an owner with a dangling entry.
pub struct ServiceHandle {
    registry: Arc<SubscriptionRegistry>,
    transport: Arc<dyn EventTransport>,
    invoker: Arc<dyn ActionInvoker>,
    action_url: String,
    event_url: String,
    service_type: String,
    device_udn: String,
    friendly_name: String,
    manufacturer: String,
    model_name: String,
    subscription_timeout: u32,
    sid: Option<String>,
    reporter: Option<Arc<dyn VarEventReporter>>,
}

impl ServiceHandle {
    /// Bind a handle to `service` as described by `device`.
    ///
    /// Also installs the transport event gateway for `registry`; only the
    /// first handle constructed against a registry actually registers
    /// handlers.
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        transport: Arc<dyn EventTransport>,
        invoker: Arc<dyn ActionInvoker>,
        device: &DeviceDescription,
        service: &ServiceDescription,
    ) -> Self {
        EventGateway::install(Arc::clone(&registry), transport.as_ref());

        Self {
            action_url: resolve_url(&device.url_base, &service.control_url),
            event_url: resolve_url(&device.url_base, &service.event_sub_url),
            service_type: service.service_type.clone(),
            device_udn: device.udn.clone(),
            friendly_name: device.friendly_name.clone(),
            manufacturer: device.manufacturer.clone(),
            model_name: device.model_name.clone(),
            subscription_timeout: DEFAULT_SUBSCRIPTION_TIMEOUT_SECS,
            sid: None,
            reporter: None,
            registry,
            transport,
            invoker,
        }
    }

    /// Bind to the first service of `service_type` described by `device`,
    /// or `None` if the device does not offer one.
    pub fn from_device(
        registry: Arc<SubscriptionRegistry>,
        transport: Arc<dyn EventTransport>,
        invoker: Arc<dyn ActionInvoker>,
        device: &DeviceDescription,
        service_type: &str,
    ) -> Option<Self> {
        device
            .service_of_type(service_type)
            .map(|service| Self::new(registry, transport, invoker, device, service))
    }

    /// Override the renewal timeout requested on subscribe
    pub fn with_subscription_timeout(mut self, timeout_seconds: u32) -> Self {
        self.subscription_timeout = timeout_seconds;
        self
    }

    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    pub fn device_id(&self) -> &str {
        &self.device_udn
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    pub fn action_url(&self) -> &str {
        &self.action_url
    }

    pub fn event_url(&self) -> &str {
        &self.event_url
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn is_subscribed(&self) -> bool {
        self.sid.is_some()
    }

    /// The SID of the active subscription, if any
    pub fn subscription_id(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    /// The currently installed reporter, if any
    pub fn reporter(&self) -> Option<Arc<dyn VarEventReporter>> {
        self.reporter.clone()
    }

    fn subscribe(&mut self) -> Result<()> {
        debug!(event_url = %self.event_url, "subscribing");
        let grant = self
            .transport
            .subscribe(&self.event_url, self.subscription_timeout)
            .map_err(|e| {
                warn!(event_url = %self.event_url, error = %e, "subscribe failed");
                e
            })?;
        debug!(sid = %grant.sid, timeout = grant.timeout_seconds, "subscribed");
        self.sid = Some(grant.sid);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        // The local SID and registry entry are cleared whatever the
        // transport reports: a SID the remote side may already have
        // invalidated must not survive locally.
        if let Some(sid) = self.sid.take() {
            debug!(%sid, "unsubscribing");
            if let Err(e) = self.transport.unsubscribe(&sid) {
                warn!(%sid, error = %e, "unsubscribe failed");
            }
            self.registry.unregister(&sid);
        }
    }

    /// Subscribe (when Unsubscribed) and install `callback` under the
    /// resulting SID.
    ///
    /// On an already-Subscribed handle the callback replaces the entry
    /// for the current SID without a new transport subscribe. A failed
    /// subscribe installs nothing and returns the transport error; the
    /// caller may retry.
    pub fn register_callback(&mut self, callback: EventCallback) -> Result<()> {
        if self.sid.is_none() {
            self.subscribe()?;
        }
        if let Some(sid) = &self.sid {
            debug!(%sid, event_url = %self.event_url, "registering callback");
            self.registry.register(sid.clone(), callback);
        }
        Ok(())
    }

    /// Drop the subscription and its dispatch entry.
    ///
    /// Safe to call on an already-Unsubscribed handle (no-op). Transport
    /// failures are logged, not propagated: local state is authoritative.
    pub fn unregister_callback(&mut self) {
        self.unsubscribe();
    }

    /// Replace a suspected-stale subscription with a fresh one, keeping
    /// the registered callback.
    ///
    /// Meant for recovery after a reported autorenewal failure or a
    /// resumed process; it is never invoked automatically. If no callback
    /// is registered for the current SID the inconsistency is logged and
    /// the handle keeps its (orphaned) SID.
    pub fn resubscribe(&mut self) -> Result<()> {
        debug!(service_type = %self.service_type, "resubscribing");
        let Some(sid) = self.sid.clone() else {
            info!("resubscribe: no active subscription");
            return Ok(());
        };
        let Some(callback) = self.registry.callback_for(&sid) else {
            info!(%sid, "resubscribe: no callback registered for subscription");
            return Ok(());
        };
        self.unregister_callback();
        self.register_callback(callback)
    }

    /// Install (or clear) the reporter for this service.
    ///
    /// Installing subscribes and forwards every decoded event to
    /// `reporter`; a new reporter replaces the previous one. Passing
    /// `None` unsubscribes. When the subscribe fails no reporter is
    /// installed and the handle stays Unsubscribed.
    pub fn install_reporter(&mut self, reporter: Option<Arc<dyn VarEventReporter>>) -> Result<()> {
        match &reporter {
            Some(r) => {
                let target = Arc::clone(r);
                self.register_callback(Arc::new(move |props: &DecodedEvent| {
                    target.properties_changed(props)
                }))?;
            }
            None => self.unregister_callback(),
        }
        self.reporter = reporter;
        Ok(())
    }

    /// Invoke a named action against the service's control URL
    pub fn run_action(&self, args: SoapArgs) -> Result<SoapResponse> {
        self.invoker.invoke(&self.action_url, &args).map_err(|e| {
            info!(action = args.name(), error = %e, "action failed");
            ServiceError::from(e)
        })
    }

    /// Invoke an action that takes no arguments, discarding the response
    pub fn run_trivial_action(&self, action: &str) -> Result<()> {
        self.run_action(SoapArgs::new(&self.service_type, action))
            .map(|_| ())
    }

    /// Invoke a no-argument action and extract one named, typed result
    /// value from the response
    pub fn run_simple_get<T: FromSoapValue>(&self, action: &str, field: &str) -> Result<T> {
        let response = self.run_action(SoapArgs::new(&self.service_type, action))?;
        response.get::<T>(field).ok_or_else(|| {
            info!(action, field, "missing field in response");
            ServiceError::MissingField {
                action: action.to_string(),
                field: field.to_string(),
            }
        })
    }

    /// Invoke an action carrying one named argument, discarding the
    /// response
    pub fn run_simple_action(
        &self,
        action: &str,
        field: &str,
        value: impl ToSoapValue,
    ) -> Result<()> {
        self.run_action(SoapArgs::new(&self.service_type, action).arg(field, value))
            .map(|_| ())
    }
}

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        debug!(event_url = %self.event_url, sid = ?self.sid, "dropping service handle");
        self.unregister_callback();
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("service_type", &self.service_type)
            .field("event_url", &self.event_url)
            .field("sid", &self.sid)
            .finish()
    }
}

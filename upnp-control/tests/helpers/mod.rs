//! Shared mock collaborators for the integration tests.
//!
//! `MockTransport` and `MockInvoker` stand in for the underlying UPnP
//! transport and SOAP layers without any network I/O. Both support
//! configurable failure modes so error paths can be driven, and both
//! record the calls made against them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use upnp_control::{DeviceDescription, ServiceDescription, VarEventReporter};
use upnp_eventing::{
    DecodeError, DecodedEvent, EventHandler, EventKind, EventTransport, SubscriptionGrant,
    TransportError, TransportEvent,
};
use upnp_soap::{ActionInvoker, SoapArgs, SoapError, SoapResponse};
use xmltree::Element;

pub const RENDERING_CONTROL: &str = "urn:schemas-upnp-org:service:RenderingControl:1";
pub const AV_TRANSPORT: &str = "urn:schemas-upnp-org:service:AVTransport:1";

/// A device description as the discovery layer would resolve it
pub fn media_renderer() -> DeviceDescription {
    DeviceDescription {
        url_base: "http://192.168.1.40:1400/".to_string(),
        udn: "uuid:RINCON_000E58A0".to_string(),
        friendly_name: "Living Room".to_string(),
        manufacturer: "Acme".to_string(),
        model_name: "Renderer One".to_string(),
        services: vec![
            ServiceDescription {
                service_type: AV_TRANSPORT.to_string(),
                service_id: "urn:upnp-org:serviceId:AVTransport".to_string(),
                control_url: "MediaRenderer/AVTransport/Control".to_string(),
                event_sub_url: "MediaRenderer/AVTransport/Event".to_string(),
            },
            ServiceDescription {
                service_type: RENDERING_CONTROL.to_string(),
                service_id: "urn:upnp-org:serviceId:RenderingControl".to_string(),
                control_url: "MediaRenderer/RenderingControl/Control".to_string(),
                event_sub_url: "MediaRenderer/RenderingControl/Event".to_string(),
            },
        ],
    }
}

/// Render a propertyset document for the given variable/value pairs
pub fn propertyset(pairs: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (name, value) in pairs {
        body.push_str(&format!("<e:property><{name}>{value}</{name}></e:property>"));
    }
    format!(r#"<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0">{body}</e:propertyset>"#)
}

/// Transport double that mints sequential SIDs, tracks active
/// subscriptions, and records the handlers the gateway installs.
pub struct MockTransport {
    next_sid: AtomicU32,
    fail_subscribe: AtomicBool,
    state: Mutex<TransportState>,
}

#[derive(Default)]
struct TransportState {
    active: Vec<String>,
    handlers: HashMap<EventKind, EventHandler>,
    requested_timeouts: Vec<u32>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_sid: AtomicU32::new(0),
            fail_subscribe: AtomicBool::new(false),
            state: Mutex::new(TransportState::default()),
        })
    }

    /// Configure the transport to fail subscribe requests
    pub fn set_fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// SIDs the transport currently considers subscribed
    pub fn active_sids(&self) -> Vec<String> {
        self.state.lock().unwrap().active.clone()
    }

    /// Renewal timeouts requested by each subscribe call, in order
    pub fn requested_timeouts(&self) -> Vec<u32> {
        self.state.lock().unwrap().requested_timeouts.clone()
    }

    /// Deliver an event the way the transport's callback thread would.
    ///
    /// The handler is copied out before invocation so a callback is free
    /// to call back into the transport (e.g. resubscribe).
    pub fn deliver(&self, event: TransportEvent) -> Result<(), DecodeError> {
        let handler = {
            let state = self.state.lock().unwrap();
            state
                .handlers
                .get(&event.kind())
                .cloned()
                .expect("gateway handler installed")
        };
        handler(event)
    }

    pub fn deliver_variable_change(
        &self,
        sid: &str,
        event_key: u32,
        xml: &str,
    ) -> Result<(), DecodeError> {
        let payload = Element::parse(xml.as_bytes()).expect("test payload parses");
        self.deliver(TransportEvent::VariableChange {
            sid: sid.to_string(),
            event_key,
            payload,
        })
    }
}

impl EventTransport for MockTransport {
    fn subscribe(
        &self,
        _event_url: &str,
        timeout_seconds: u32,
    ) -> Result<SubscriptionGrant, TransportError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(TransportError::Network(
                "mock failure: subscribe disabled".to_string(),
            ));
        }
        let n = self.next_sid.fetch_add(1, Ordering::SeqCst) + 1;
        let sid = format!("uuid:mock-{n}");
        {
            let mut state = self.state.lock().unwrap();
            state.active.push(sid.clone());
            state.requested_timeouts.push(timeout_seconds);
        }
        Ok(SubscriptionGrant {
            sid,
            timeout_seconds,
        })
    }

    fn unsubscribe(&self, sid: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        match state.active.iter().position(|s| s == sid) {
            Some(pos) => {
                state.active.remove(pos);
                Ok(())
            }
            None => Err(TransportError::Rejected(412)),
        }
    }

    fn register_event_handler(&self, kind: EventKind, handler: EventHandler) {
        self.state.lock().unwrap().handlers.insert(kind, handler);
    }
}

/// SOAP invoker double with per-action staged responses and faults
pub struct MockInvoker {
    state: Mutex<InvokerState>,
}

#[derive(Default)]
struct InvokerState {
    responses: HashMap<String, SoapResponse>,
    faults: HashMap<String, (i32, String)>,
    calls: Vec<(String, SoapArgs)>,
}

impl MockInvoker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(InvokerState::default()),
        })
    }

    /// Stage the response fields returned for `action`
    pub fn stage_response(&self, action: &str, fields: &[(&str, &str)]) {
        let mut response = SoapResponse::new(format!("{action}Response"));
        for (name, value) in fields {
            response.insert(*name, *value);
        }
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(action.to_string(), response);
    }

    /// Stage a UPnP fault returned for `action`
    pub fn stage_fault(&self, action: &str, code: i32, description: &str) {
        self.state
            .lock()
            .unwrap()
            .faults
            .insert(action.to_string(), (code, description.to_string()));
    }

    /// Every invocation made, as (action URL, args)
    pub fn calls(&self) -> Vec<(String, SoapArgs)> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl ActionInvoker for MockInvoker {
    fn invoke(&self, action_url: &str, args: &SoapArgs) -> Result<SoapResponse, SoapError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((action_url.to_string(), args.clone()));

        if let Some((code, description)) = state.faults.get(args.name()) {
            return Err(SoapError::Fault {
                code: *code,
                description: description.clone(),
            });
        }
        if let Some(response) = state.responses.get(args.name()) {
            return Ok(response.clone());
        }
        // Unstaged actions succeed with an empty response
        Ok(SoapResponse::new(format!("{}Response", args.name())))
    }
}

/// Reporter that records every event it is handed
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<DecodedEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<DecodedEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl VarEventReporter for RecordingReporter {
    fn properties_changed(&self, props: &DecodedEvent) {
        self.events.lock().unwrap().push(props.clone());
    }
}

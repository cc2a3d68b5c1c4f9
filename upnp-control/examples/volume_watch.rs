//! Watch a renderer's volume through an in-memory transport.
//!
//! No network involved: a scripted transport stands in for the
//! underlying UPnP library and pushes propertyset documents through the
//! gateway, which is enough to see the subscribe → dispatch →
//! resubscribe flow end to end.
//!
//! ```sh
//! UPNP_LOG_LEVEL=debug cargo run --example volume_watch
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use upnp_control::logging::{init_logging, LoggingMode};
use upnp_control::{DeviceDescription, ServiceDescription, ServiceHandle, VarEventReporter};
use upnp_eventing::{
    DecodeError, DecodedEvent, EventHandler, EventKind, EventTransport, SubscriptionGrant,
    SubscriptionRegistry, TransportError, TransportEvent,
};
use upnp_soap::{ActionInvoker, SoapArgs, SoapError, SoapResponse};
use xmltree::Element;

/// Stands in for the UPnP transport library: mints SIDs and lets the
/// example feed events to whatever handler the gateway installed.
struct ScriptedTransport {
    next_sid: AtomicU32,
    handlers: Mutex<HashMap<EventKind, EventHandler>>,
}

impl ScriptedTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            next_sid: AtomicU32::new(0),
            handlers: Mutex::new(HashMap::new()),
        })
    }

    fn push_volume(&self, sid: &str, volume: u32) -> Result<(), DecodeError> {
        let xml = format!(
            r#"<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0">
                <e:property><Volume>{volume}</Volume></e:property>
            </e:propertyset>"#
        );
        let handler = self
            .handlers
            .lock()
            .unwrap()
            .get(&EventKind::VariableChange)
            .cloned()
            .expect("gateway installed");
        handler(TransportEvent::VariableChange {
            sid: sid.to_string(),
            event_key: 0,
            payload: Element::parse(xml.as_bytes()).expect("valid propertyset"),
        })
    }
}

impl EventTransport for ScriptedTransport {
    fn subscribe(
        &self,
        event_url: &str,
        timeout_seconds: u32,
    ) -> Result<SubscriptionGrant, TransportError> {
        let n = self.next_sid.fetch_add(1, Ordering::SeqCst) + 1;
        println!("transport: SUBSCRIBE {event_url}");
        Ok(SubscriptionGrant {
            sid: format!("uuid:example-{n}"),
            timeout_seconds,
        })
    }

    fn unsubscribe(&self, sid: &str) -> Result<(), TransportError> {
        println!("transport: UNSUBSCRIBE {sid}");
        Ok(())
    }

    fn register_event_handler(&self, kind: EventKind, handler: EventHandler) {
        self.handlers.lock().unwrap().insert(kind, handler);
    }
}

/// Answers GetVolume with a fixed value
struct ScriptedInvoker;

impl ActionInvoker for ScriptedInvoker {
    fn invoke(&self, action_url: &str, args: &SoapArgs) -> Result<SoapResponse, SoapError> {
        println!("invoker: {} on {action_url}", args.name());
        let mut response = SoapResponse::new(format!("{}Response", args.name()));
        if args.name() == "GetVolume" {
            response.insert("CurrentVolume", "25");
        }
        Ok(response)
    }
}

struct PrintReporter;

impl VarEventReporter for PrintReporter {
    fn properties_changed(&self, props: &DecodedEvent) {
        for (name, value) in props {
            println!("reporter: {name} = {value}");
        }
    }
}

fn renderer() -> DeviceDescription {
    DeviceDescription {
        url_base: "http://192.168.1.40:1400/".to_string(),
        udn: "uuid:example-renderer".to_string(),
        friendly_name: "Living Room".to_string(),
        manufacturer: "Acme".to_string(),
        model_name: "Renderer One".to_string(),
        services: vec![ServiceDescription {
            service_type: "urn:schemas-upnp-org:service:RenderingControl:1".to_string(),
            service_id: "urn:upnp-org:serviceId:RenderingControl".to_string(),
            control_url: "MediaRenderer/RenderingControl/Control".to_string(),
            event_sub_url: "MediaRenderer/RenderingControl/Event".to_string(),
        }],
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingMode::Development)?;

    let registry = Arc::new(SubscriptionRegistry::new());
    let transport = ScriptedTransport::new();

    let mut handle = ServiceHandle::from_device(
        Arc::clone(&registry),
        transport.clone(),
        Arc::new(ScriptedInvoker),
        &renderer(),
        "urn:schemas-upnp-org:service:RenderingControl:1",
    )
    .expect("renderer offers RenderingControl");

    handle.install_reporter(Some(Arc::new(PrintReporter) as Arc<dyn VarEventReporter>))?;
    let sid = handle.subscription_id().expect("subscribed").to_string();

    transport.push_volume(&sid, 10)?;
    transport.push_volume(&sid, 20)?;

    // Pretend the subscription went stale and recover
    handle.resubscribe()?;
    let fresh = handle.subscription_id().expect("resubscribed").to_string();
    println!("resubscribed: {sid} -> {fresh}");
    transport.push_volume(&fresh, 30)?;

    let volume: u32 = handle.run_simple_get("GetVolume", "CurrentVolume")?;
    println!("GetVolume says {volume}");

    handle.install_reporter(None)?;
    Ok(())
}

//! SOAP action interface layer for UPnP control points
//!
//! This crate defines the value types exchanged with a UPnP service's
//! control endpoint: an outgoing argument list (`SoapArgs`), a decoded
//! response (`SoapResponse`), and the `ActionInvoker` trait implemented
//! by whatever performs the actual HTTP/SOAP round trip. The wire
//! encoding itself is out of scope; this crate only knows how to build
//! payload fragments and pick fields (or a UPnP fault) out of a parsed
//! response envelope.

mod error;

pub use error::SoapError;

use std::collections::HashMap;
use xmltree::Element;

/// Conversion of a typed argument value into its SOAP string form
pub trait ToSoapValue {
    fn to_soap_value(&self) -> String;
}

impl ToSoapValue for &str {
    fn to_soap_value(&self) -> String {
        (*self).to_string()
    }
}

impl ToSoapValue for String {
    fn to_soap_value(&self) -> String {
        self.clone()
    }
}

impl ToSoapValue for i32 {
    fn to_soap_value(&self) -> String {
        self.to_string()
    }
}

impl ToSoapValue for u32 {
    fn to_soap_value(&self) -> String {
        self.to_string()
    }
}

impl ToSoapValue for bool {
    // UPnP booleans are conventionally sent as "1"/"0"
    fn to_soap_value(&self) -> String {
        if *self { "1".to_string() } else { "0".to_string() }
    }
}

/// Conversion of a SOAP string value into a typed result
pub trait FromSoapValue: Sized {
    fn from_soap_value(s: &str) -> Option<Self>;
}

impl FromSoapValue for String {
    fn from_soap_value(s: &str) -> Option<Self> {
        Some(s.to_string())
    }
}

impl FromSoapValue for i32 {
    fn from_soap_value(s: &str) -> Option<Self> {
        s.trim().parse().ok()
    }
}

impl FromSoapValue for u32 {
    fn from_soap_value(s: &str) -> Option<Self> {
        s.trim().parse().ok()
    }
}

impl FromSoapValue for bool {
    fn from_soap_value(s: &str) -> Option<Self> {
        match s.trim() {
            "1" | "true" | "yes" => Some(true),
            "0" | "false" | "no" => Some(false),
            _ => None,
        }
    }
}

/// An outgoing UPnP action: service type, action name, and the ordered
/// argument list.
///
/// Argument order is preserved because UPnP services validate arguments
/// positionally against their service description.
#[derive(Debug, Clone)]
pub struct SoapArgs {
    service_type: String,
    name: String,
    args: Vec<(String, String)>,
}

impl SoapArgs {
    /// Create an action with no arguments
    pub fn new(service_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument, converting the value to its SOAP string form
    pub fn arg(mut self, name: impl Into<String>, value: impl ToSoapValue) -> Self {
        self.args.push((name.into(), value.to_soap_value()));
        self
    }

    /// The action name, e.g. `"GetVolume"`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The service type URN this action belongs to
    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    /// The arguments in the order they were added
    pub fn args(&self) -> &[(String, String)] {
        &self.args
    }

    /// Render the arguments as the XML payload fragment placed inside
    /// the action element of a SOAP body.
    pub fn to_payload(&self) -> String {
        let mut payload = String::new();
        for (name, value) in &self.args {
            payload.push_str(&format!("<{name}>{}</{name}>", xml_escape(value)));
        }
        payload
    }
}

/// A decoded action response: the fields of the `<u:XxxResponse>`
/// element, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct SoapResponse {
    name: String,
    fields: HashMap<String, String>,
}

impl SoapResponse {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: HashMap::new(),
        }
    }

    /// The response element name, e.g. `"GetVolumeResponse"`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert a field. Used by invoker implementations and tests.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Look up a field as a raw string
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Look up a field and convert it to the requested type
    pub fn get<T: FromSoapValue>(&self, name: &str) -> Option<T> {
        self.fields.get(name).and_then(|v| T::from_soap_value(v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Extract the response for `action` from a parsed SOAP envelope.
    ///
    /// Checks for a SOAP fault first: a fault carrying a `UPnPError`
    /// detail is decoded into [`SoapError::Fault`] with the remote error
    /// code and description. Otherwise the `<{action}Response>` element's
    /// children become the response fields.
    pub fn from_envelope(action: &str, envelope: &Element) -> Result<Self, SoapError> {
        let body = envelope
            .get_child("Body")
            .ok_or_else(|| SoapError::Decode("missing SOAP Body".to_string()))?;

        if let Some(fault) = body.get_child("Fault") {
            return Err(decode_fault(fault));
        }

        let response_name = format!("{action}Response");
        let response = body.get_child(response_name.as_str()).ok_or_else(|| {
            SoapError::Decode(format!("missing {response_name} element"))
        })?;

        let mut fields = HashMap::new();
        for child in response.children.iter().filter_map(|n| n.as_element()) {
            let text = child.get_text().map(|t| t.into_owned()).unwrap_or_default();
            fields.insert(child.name.clone(), text);
        }

        Ok(Self {
            name: response_name,
            fields,
        })
    }
}

/// Performs the SOAP round trip for one action against a control URL.
///
/// Implemented by the transport side of a control point; the eventing
/// core only ever calls through this trait.
pub trait ActionInvoker: Send + Sync {
    fn invoke(&self, action_url: &str, args: &SoapArgs) -> Result<SoapResponse, SoapError>;
}

fn decode_fault(fault: &Element) -> SoapError {
    let upnp_error = fault
        .get_child("detail")
        .and_then(|d| d.get_child("UPnPError"));

    let code = upnp_error
        .and_then(|e| e.get_child("errorCode"))
        .and_then(|c| c.get_text())
        .and_then(|t| t.trim().parse::<i32>().ok())
        .unwrap_or(-1);

    let description = upnp_error
        .and_then(|e| e.get_child("errorDescription"))
        .and_then(|d| d.get_text())
        .map(|t| t.trim().to_string())
        .unwrap_or_default();

    SoapError::Fault { code, description }
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

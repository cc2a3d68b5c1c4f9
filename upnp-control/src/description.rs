//! Resolved device and service descriptions
//!
//! These are the output of the (external) description/discovery layer:
//! a device's identity plus, per service, the relative control and event
//! URLs a handle needs. The discovery layer hands them over already
//! parsed; this module only carries them and resolves the URLs.

use serde::{Deserialize, Serialize};
use url::Url;

/// One service advertised in a device description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescription {
    /// Service type URN, e.g. `urn:schemas-upnp-org:service:RenderingControl:1`
    pub service_type: String,
    /// Service identifier within the device
    pub service_id: String,
    /// Control URL, relative to the device URL base
    pub control_url: String,
    /// Event subscription URL, relative to the device URL base
    pub event_sub_url: String,
}

/// A device description resolved by the discovery layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescription {
    /// Base URL against which the services' relative URLs resolve
    pub url_base: String,
    /// Unique device name (UDN)
    pub udn: String,
    pub friendly_name: String,
    pub manufacturer: String,
    pub model_name: String,
    pub services: Vec<ServiceDescription>,
}

impl DeviceDescription {
    /// First service whose type matches `service_type` exactly
    pub fn service_of_type(&self, service_type: &str) -> Option<&ServiceDescription> {
        self.services
            .iter()
            .find(|s| s.service_type == service_type)
    }
}

/// Join a device's URL base with a control or event URL.
///
/// An absolute `relative` wins over the base. Inputs that do not parse
/// as URLs fall back to plain path concatenation so a handle can still
/// be constructed from a sloppy description.
pub fn resolve_url(base: &str, relative: &str) -> String {
    match Url::parse(base).and_then(|b| b.join(relative)) {
        Ok(url) => url.to_string(),
        Err(_) => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            relative.trim_start_matches('/')
        ),
    }
}

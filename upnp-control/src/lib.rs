//! UPnP control-point service handles
//!
//! This crate ties the eventing core (`upnp-eventing`) and the SOAP
//! action layer (`upnp-soap`) together into the object application code
//! works with: a [`ServiceHandle`] bound to one service on one remote
//! device.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use upnp_control::{ServiceHandle, VarEventReporter};
//! use upnp_eventing::SubscriptionRegistry;
//!
//! let registry = Arc::new(SubscriptionRegistry::new());
//! let mut rendering = ServiceHandle::from_device(
//!     Arc::clone(&registry),
//!     transport,
//!     invoker,
//!     &device,
//!     "urn:schemas-upnp-org:service:RenderingControl:1",
//! ).expect("device offers RenderingControl");
//!
//! rendering.install_reporter(Some(my_reporter))?;
//! let volume: u32 = rendering.run_simple_get("GetVolume", "CurrentVolume")?;
//! ```
//!
//! The registry is an explicit, injectable instance so tests (and
//! multi-network applications) can run several independent dispatch
//! tables; pass the same `Arc` to every handle that shares a transport.

pub mod description;
mod error;
pub mod logging;
pub mod service;

pub use description::{resolve_url, DeviceDescription, ServiceDescription};
pub use error::{Result, ServiceError};
pub use service::{ServiceHandle, VarEventReporter};

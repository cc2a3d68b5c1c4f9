//! GENA propertyset decoding
//!
//! An event notification carries a propertyset document listing the
//! state variables that changed:
//!
//! ```xml
//! <e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0">
//!   <e:property><Volume>10</Volume></e:property>
//!   <e:property><Mute>0</Mute></e:property>
//! </e:propertyset>
//! ```
//!
//! Decoding is all-or-nothing: a malformed document yields an error and
//! no partial mapping. An event with zero changed variables is valid and
//! decodes to an empty mapping.

use std::collections::HashMap;

use xmltree::Element;

use crate::error::DecodeError;

/// A decoded event: variable name mapped to its new value
pub type DecodedEvent = HashMap<String, String>;

/// Decode a parsed propertyset document into a name/value mapping.
///
/// Each `property` child must contain one variable element whose text is
/// the new value; a missing text node decodes as the empty string. If the
/// same variable appears more than once the last occurrence wins.
pub fn decode_property_set(doc: &Element) -> Result<DecodedEvent, DecodeError> {
    if doc.name != "propertyset" {
        return Err(DecodeError::NotPropertySet(doc.name.clone()));
    }

    let mut props = DecodedEvent::new();
    for property in doc.children.iter().filter_map(|n| n.as_element()) {
        if property.name != "property" {
            return Err(DecodeError::UnexpectedElement(property.name.clone()));
        }
        let variable = property
            .children
            .iter()
            .filter_map(|n| n.as_element())
            .next()
            .ok_or(DecodeError::EmptyProperty)?;
        let value = variable
            .get_text()
            .map(|t| t.into_owned())
            .unwrap_or_default();
        props.insert(variable.name.clone(), value);
    }

    Ok(props)
}

/// Parse `xml` and decode it as a propertyset
pub fn decode_property_set_xml(xml: &str) -> Result<DecodedEvent, DecodeError> {
    let doc = Element::parse(xml.as_bytes()).map_err(|e| DecodeError::Xml(e.to_string()))?;
    decode_property_set(&doc)
}

//! Scalar codecs
//!
//! The structural layer in [`crate::documents`] knows nothing about the
//! lexical form of typed values. Whenever it reads or writes an attribute
//! value or an element body it goes through the [`XmlText`] capability of
//! the target type. Three types need more than the default handling and
//! live in their own modules:
//!
//! - [`optional`]: presence tracking for optional boolean/integer attributes
//! - [`binary`]: base64 binary payloads
//! - [`datetime`]: schema date-time text with a fallback offset form
//!
//! The primitive impls below follow the XSD lexical spaces of
//! `xs:boolean`, `xs:integer` and `xs:double`.

pub mod binary;
pub mod datetime;
pub mod optional;

pub use binary::Base64Binary;
pub use datetime::XsdDateTime;
pub use optional::{settle, AttributeOverlay};

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::num::IntErrorKind;

lazy_static::lazy_static! {
    /// XSD boolean value mapping
    pub static ref XSD_BOOLEAN_MAP: HashMap<&'static str, bool> = {
        let mut m = HashMap::new();
        m.insert("false", false);
        m.insert("0", false);
        m.insert("true", true);
        m.insert("1", true);
        m
    };
}

/// Lexical mapping between a typed value and its XML text.
///
/// `to_xml_text` returning `None` means "emit nothing": the attribute or
/// element is left out of the output entirely.
pub trait XmlText: Sized {
    /// Decode the value from attribute or element text
    fn from_xml_text(text: &str) -> Result<Self>;

    /// Encode the value, or `None` to omit it
    fn to_xml_text(&self) -> Option<String>;
}

impl XmlText for String {
    fn from_xml_text(text: &str) -> Result<Self> {
        Ok(text.to_string())
    }

    fn to_xml_text(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl XmlText for bool {
    fn from_xml_text(text: &str) -> Result<Self> {
        XSD_BOOLEAN_MAP
            .get(text.trim())
            .copied()
            .ok_or_else(|| Error::format("not a valid xs:boolean", text))
    }

    fn to_xml_text(&self) -> Option<String> {
        Some(if *self { "true" } else { "false" }.to_string())
    }
}

fn int_error(kind: &IntErrorKind, type_name: &str, text: &str) -> Error {
    match kind {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            Error::range(format!("value out of range for {}", type_name), text)
        }
        _ => Error::format(format!("not a valid {}", type_name), text),
    }
}

impl XmlText for u32 {
    fn from_xml_text(text: &str) -> Result<Self> {
        text.trim()
            .parse::<u32>()
            .map_err(|e| int_error(e.kind(), "xs:nonNegativeInteger", text))
    }

    fn to_xml_text(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl XmlText for i64 {
    fn from_xml_text(text: &str) -> Result<Self> {
        text.trim()
            .parse::<i64>()
            .map_err(|e| int_error(e.kind(), "xs:integer", text))
    }

    fn to_xml_text(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl XmlText for f64 {
    fn from_xml_text(text: &str) -> Result<Self> {
        let value = text.trim();
        match value {
            "NaN" => Ok(f64::NAN),
            "INF" | "+INF" => Ok(f64::INFINITY),
            "-INF" => Ok(f64::NEG_INFINITY),
            // Rust also accepts "inf" and "nan" spellings that XSD does not
            _ if value
                .chars()
                .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') =>
            {
                Err(Error::format("not a valid xs:double", text))
            }
            _ => value
                .parse::<f64>()
                .map_err(|_| Error::format("not a valid xs:double", text)),
        }
    }

    fn to_xml_text(&self) -> Option<String> {
        let text = if self.is_nan() {
            "NaN".to_string()
        } else if *self == f64::INFINITY {
            "INF".to_string()
        } else if *self == f64::NEG_INFINITY {
            "-INF".to_string()
        } else {
            self.to_string()
        };
        Some(text)
    }
}

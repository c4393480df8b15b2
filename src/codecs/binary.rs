//! Base64 binary codec
//!
//! `xs:base64Binary` payloads (the `data` element of a binary artifact
//! value) are carried as raw bytes and written with the standard alphabet
//! and `=` padding. Decoding takes the text literally: it must already be
//! canonical, padded base64.

use super::XmlText;
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::Deref;

/// Byte payload with a base64 text form
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Base64Binary(pub Vec<u8>);

impl Base64Binary {
    /// Wrap raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Standard padded base64 text of the payload
    pub fn encode(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// Decode standard padded base64 text
    pub fn decode(text: &str) -> Result<Self> {
        STANDARD
            .decode(text)
            .map(Self)
            .map_err(|e| Error::format(format!("not a valid base64 encoding ({})", e), text))
    }

    /// Unwrap the raw bytes
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for Base64Binary {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Base64Binary {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl XmlText for Base64Binary {
    fn from_xml_text(text: &str) -> Result<Self> {
        Self::decode(text)
    }

    fn to_xml_text(&self) -> Option<String> {
        Some(self.encode())
    }
}

impl Serialize for Base64Binary {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Base64Binary {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::decode(&s).map_err(serde::de::Error::custom)
    }
}

//! Optional-attribute overlay
//!
//! Boolean and integer attributes have no natural "absent" value: a
//! `revision` that is missing and one that reads `0` both settle to `0`.
//! The overlay decodes such attributes into nullable shadows first, so a
//! decoder can see whether the attribute was present, and then settles
//! each shadow onto the zero value of its type.
//!
//! Records keep the shadow (`Option<T>`) and offer zero-value accessors
//! built on [`settle`], so both views stay available after decoding.

use super::XmlText;
use crate::documents::Element;
use crate::error::Result;

/// Presence-tracking view over the attributes of one element.
///
/// Built right before a record is decoded and dropped right after; it
/// borrows the element and holds no state of its own.
#[derive(Debug, Clone, Copy)]
pub struct AttributeOverlay<'a> {
    element: &'a Element,
}

impl<'a> AttributeOverlay<'a> {
    /// Overlay the attributes of `element`
    pub fn new(element: &'a Element) -> Self {
        Self { element }
    }

    /// Decode `name` into its shadow: `None` when the attribute is absent,
    /// `Some` when present, even if the value is the zero value
    pub fn shadow<T: XmlText>(&self, name: &str) -> Result<Option<T>> {
        self.element.attr_value(name)
    }

    /// Decode `name` and settle it onto the real field
    pub fn settled<T: XmlText + Default>(&self, name: &str) -> Result<T> {
        self.shadow(name).map(settle)
    }

    /// True when the attribute is present on the element
    pub fn is_present(&self, name: &str) -> bool {
        self.element.get_attribute(name).is_some()
    }
}

/// Copy a shadow onto its real field; an unset shadow yields the zero value
pub fn settle<T: Default>(shadow: Option<T>) -> T {
    shadow.unwrap_or_default()
}

//! Error types for ocil-rs
//!
//! This module defines all error types used throughout the library.
//! Scalar codecs report [`Error::Format`] or [`Error::Range`]; the
//! structural layer adds document-level failures around them.

use std::fmt;
use thiserror::Error;

/// Result type alias using the ocil Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ocil operations
#[derive(Error, Debug)]
pub enum Error {
    /// Text does not match the lexical grammar of the target type
    #[error("format error: {0}")]
    Format(ValueError),

    /// Text is lexically valid but denotes an impossible value
    #[error("range error: {0}")]
    Range(ValueError),

    /// A required element or attribute is absent
    #[error("missing {0}")]
    Missing(String),

    /// An element appeared where the schema does not allow it
    #[error("unexpected element: {0}")]
    UnexpectedElement(String),

    /// The document declares a schema version that is not accepted
    #[error("schema version error: {0}")]
    Version(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing or writing error
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON rendering error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a format error with the offending text attached
    pub fn format(message: impl Into<String>, text: &str) -> Self {
        Error::Format(ValueError::new(message).with_text(text))
    }

    /// Shorthand for a range error with the offending text attached
    pub fn range(message: impl Into<String>, text: &str) -> Self {
        Error::Range(ValueError::new(message).with_text(text))
    }

    /// Attach the name of the field being decoded to a codec error.
    ///
    /// Other variants pass through untouched. An existing field name is
    /// kept, so the innermost context wins.
    pub fn with_field(self, field: impl Into<String>) -> Self {
        match self {
            Error::Format(e) if e.field.is_none() => Error::Format(e.with_field(field)),
            Error::Range(e) if e.field.is_none() => Error::Range(e.with_field(field)),
            other => other,
        }
    }

    /// True for failures raised by a scalar codec
    pub fn is_codec_error(&self) -> bool {
        matches!(self, Error::Format(_) | Error::Range(_))
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::Xml(e.to_string())
    }
}

/// Offending value reported by a scalar codec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueError {
    /// Error message
    pub message: String,
    /// Element or `element@attribute` that carried the value
    pub field: Option<String>,
    /// The text that failed to decode
    pub text: Option<String>,
}

impl ValueError {
    /// Create a new value error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
            text: None,
        }
    }

    /// Set the field name
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the offending text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref field) = self.field {
            write!(f, " (field '{}')", field)?;
        }

        if let Some(ref text) = self.text {
            write!(f, ": {:?}", text)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValueError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_error_display() {
        let err = ValueError::new("not a valid xs:boolean")
            .with_field("artifact@persistent")
            .with_text("yes");

        let msg = format!("{}", err);
        assert!(msg.contains("not a valid xs:boolean"));
        assert!(msg.contains("artifact@persistent"));
        assert!(msg.contains("\"yes\""));
    }

    #[test]
    fn test_with_field_keeps_innermost() {
        let err = Error::format("bad", "x")
            .with_field("inner")
            .with_field("outer");
        match err {
            Error::Format(e) => assert_eq!(e.field.as_deref(), Some("inner")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_with_field_ignores_structural_errors() {
        let err = Error::Missing("attribute 'id' on <artifact>".to_string()).with_field("x");
        assert!(matches!(err, Error::Missing(_)));
        assert!(!err.is_codec_error());
    }

    #[test]
    fn test_range_is_codec_error() {
        assert!(Error::range("month out of range", "2024-13-01T00:00:00").is_codec_error());
    }
}

//! # ocil-rs
//!
//! Typed Rust bindings for OCIL 2.0 (Open Checklist Interactive Language)
//! documents, the SCAP format for interactive questionnaires and their
//! evaluated results.
//!
//! ## Layers
//!
//! - [`codecs`]: lexical codecs for scalar values, including the three
//!   that need special handling (optional attributes, base64 payloads and
//!   schema date-times)
//! - [`documents`]: a `quick-xml` backed element tree, reader and writer
//! - [`model`]: the OCIL record tree with decoders and encoders
//!
//! ## Example
//!
//! ```rust,ignore
//! use ocil::Ocil;
//!
//! let ocil = Ocil::from_xml(&std::fs::read_to_string("checklist.xml")?)?;
//! println!("{} questions", ocil.questions.questions.len());
//!
//! let xml = ocil.to_xml()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod config;
pub mod error;
pub mod limits;
pub mod namespaces;

// Scalar codecs and the structural layer around them
pub mod codecs;
pub mod documents;

// OCIL records
pub mod model;

// Re-exports for convenience
pub use codecs::{Base64Binary, XmlText, XsdDateTime};
pub use config::{ReadOptions, VersionPolicy, WriteOptions};
pub use error::{Error, Result};
pub use model::Ocil;

/// Version of the ocil-rs library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// OCIL 2.0 namespace
pub const OCIL_NAMESPACE: &str = "http://scap.nist.gov/schema/ocil/2.0";

/// XML Schema instance namespace (`xsi:type`, `xsi:schemaLocation`)
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

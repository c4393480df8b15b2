//! Limits applied while reading OCIL documents
//!
//! These limits bound the resources a single document may consume
//! before it reaches the record decoders.

use crate::error::{Error, Result};

/// Document reading limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum element nesting depth
    pub max_xml_depth: usize,

    /// Maximum XML input size in bytes
    pub max_xml_size: usize,

    /// Maximum number of attributes per element
    pub max_attributes: usize,

    /// Maximum number of namespace declarations per element
    pub max_namespaces: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_xml_depth: 256,
            max_xml_size: 64 * 1024 * 1024, // 64 MB
            max_attributes: 256,
            max_namespaces: 64,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_xml_depth: 64,
            max_xml_size: 4 * 1024 * 1024, // 4 MB
            max_attributes: 32,
            max_namespaces: 16,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_xml_depth: 4096,
            max_xml_size: 1024 * 1024 * 1024, // 1 GB
            max_attributes: 4096,
            max_namespaces: 1024,
        }
    }

    /// Nesting depth of the element being opened
    pub fn check_xml_depth(&self, depth: usize) -> Result<()> {
        check("element depth", depth, self.max_xml_depth)
    }

    /// Size of the whole input in bytes
    pub fn check_xml_size(&self, size: usize) -> Result<()> {
        check("document size in bytes", size, self.max_xml_size)
    }

    /// Attributes on one element
    pub fn check_attributes(&self, count: usize) -> Result<()> {
        check("attributes on one element", count, self.max_attributes)
    }

    /// Namespace declarations on one element
    pub fn check_namespaces(&self, count: usize) -> Result<()> {
        check("namespace declarations on one element", count, self.max_namespaces)
    }
}

fn check(what: &str, value: usize, max: usize) -> Result<()> {
    if value > max {
        return Err(Error::LimitExceeded(format!("{} is {}, at most {} allowed", what, value, max)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_xml_depth, 256);
        assert!(limits.check_xml_depth(100).is_ok());
        assert!(limits.check_xml_depth(300).is_err());
    }

    #[test]
    fn test_strict_limits() {
        let limits = Limits::strict();
        assert!(limits.max_xml_depth < Limits::default().max_xml_depth);
        assert!(limits.check_xml_depth(100).is_err());
    }

    #[test]
    fn test_permissive_limits() {
        let limits = Limits::permissive();
        assert!(limits.max_xml_depth > Limits::default().max_xml_depth);
        assert!(limits.check_xml_depth(1000).is_ok());
    }

    #[test]
    fn test_limit_message() {
        let limits = Limits::strict();
        match limits.check_xml_depth(65) {
            Err(Error::LimitExceeded(msg)) => assert_eq!(msg, "element depth is 65, at most 64 allowed"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_check_xml_size() {
        let limits = Limits::default();
        assert!(limits.check_xml_size(1024).is_ok());
        assert!(matches!(
            limits.check_xml_size(200 * 1024 * 1024),
            Err(Error::LimitExceeded(_))
        ));
    }

    #[test]
    fn test_check_attributes_and_namespaces() {
        let limits = Limits::strict();
        assert!(limits.check_attributes(32).is_ok());
        assert!(limits.check_attributes(33).is_err());
        assert!(limits.check_namespaces(16).is_ok());
        assert!(limits.check_namespaces(17).is_err());
    }
}

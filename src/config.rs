//! Reading and writing options
//!
//! Builder-style configuration for [`crate::model::Ocil::from_xml_with`]
//! and [`crate::model::Ocil::to_xml_with`].

use crate::limits::Limits;

/// How the decoder treats a `schema_version` it does not know
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionPolicy {
    /// Reject unknown versions
    #[default]
    Strict,
    /// Decode unknown versions with the newest known rules
    Lax,
}

/// Configuration for reading documents
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Resource limits for the XML reader
    limits: Limits,
    /// Schema version policy
    version_policy: VersionPolicy,
    /// Whether the root must be in the OCIL namespace
    require_namespace: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            version_policy: VersionPolicy::default(),
            require_namespace: true,
        }
    }
}

impl ReadOptions {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the reader limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Get the version policy
    pub fn version_policy(&self) -> VersionPolicy {
        self.version_policy
    }

    /// Check if the OCIL namespace is required on the root
    pub fn require_namespace(&self) -> bool {
        self.require_namespace
    }

    /// Set reader limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the version policy
    pub fn with_version_policy(mut self, policy: VersionPolicy) -> Self {
        self.version_policy = policy;
        self
    }

    /// Set whether the OCIL namespace is required
    pub fn with_require_namespace(mut self, require: bool) -> Self {
        self.require_namespace = require;
        self
    }
}

/// Configuration for writing documents
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Indentation width; 0 writes everything on one line
    indent: usize,
    /// Whether to emit the XML declaration
    declaration: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            declaration: true,
        }
    }
}

impl WriteOptions {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Compact output: no indentation, no declaration
    pub fn compact() -> Self {
        Self {
            indent: 0,
            declaration: false,
        }
    }

    /// Get indentation width
    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Check if the XML declaration is written
    pub fn declaration(&self) -> bool {
        self.declaration
    }

    /// Set indentation width
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Set whether to write the XML declaration
    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_defaults() {
        let options = ReadOptions::default();
        assert_eq!(options.version_policy(), VersionPolicy::Strict);
        assert!(options.require_namespace());
        assert_eq!(options.limits(), &Limits::default());
    }

    #[test]
    fn test_read_builder() {
        let options = ReadOptions::new()
            .with_version_policy(VersionPolicy::Lax)
            .with_require_namespace(false)
            .with_limits(Limits::strict());
        assert_eq!(options.version_policy(), VersionPolicy::Lax);
        assert!(!options.require_namespace());
        assert_eq!(options.limits().max_xml_depth, Limits::strict().max_xml_depth);
    }

    #[test]
    fn test_write_builder() {
        let options = WriteOptions::new().with_indent(4).with_declaration(false);
        assert_eq!(options.indent(), 4);
        assert!(!options.declaration());

        let compact = WriteOptions::compact();
        assert_eq!(compact.indent(), 0);
        assert!(!compact.declaration());
    }
}

//! XML namespace handling
//!
//! This module provides qualified names (QNames) and the prefix scopes
//! used to resolve them while reading, and to pick prefixes while
//! writing.

use crate::error::{Error, Result};
use crate::XML_NAMESPACE;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// Qualified name (QName) - combination of namespace and local name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|s| s.into()),
            local_name: local_name.into(),
        }
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    /// True when the name lives in `namespace`
    pub fn is_in(&self, namespace: &str) -> bool {
        self.namespace.as_deref() == Some(namespace)
    }
}

impl Serialize for QName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

/// Namespace scope for resolving and choosing prefixes.
///
/// On a parsed element it holds only the declarations made on that
/// element; while reading, the parser merges them into an inherited scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NamespaceContext {
    /// Mapping from prefix to namespace URI, in declaration order
    prefixes: IndexMap<Prefix, NamespaceUri>,
    /// Default namespace (no prefix)
    #[serde(skip_serializing_if = "Option::is_none")]
    default_namespace: Option<NamespaceUri>,
}

impl NamespaceContext {
    /// Create a new empty namespace context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a namespace prefix mapping
    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Set the default namespace
    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) {
        self.default_namespace = Some(namespace.into());
    }

    /// Get the namespace for a prefix
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.prefixes.get(prefix).map(|s| s.as_str())
    }

    /// Get the default namespace
    pub fn get_default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Find a prefix bound to `namespace`
    pub fn prefix_for(&self, namespace: &str) -> Option<&str> {
        if namespace == XML_NAMESPACE {
            return Some("xml");
        }
        self.prefixes
            .iter()
            .find(|(_, uri)| uri.as_str() == namespace)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// Number of declarations held by this context
    pub fn len(&self) -> usize {
        self.prefixes.len() + usize::from(self.default_namespace.is_some())
    }

    /// True when nothing is declared
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overlay the declarations of `inner` on top of this scope
    pub fn extend(&mut self, inner: &NamespaceContext) {
        if let Some(ref ns) = inner.default_namespace {
            self.default_namespace = Some(ns.clone());
        }
        for (prefix, uri) in &inner.prefixes {
            self.prefixes.insert(prefix.clone(), uri.clone());
        }
    }

    /// Declarations as `(attribute name, uri)` pairs, ready to be written
    pub fn declarations(&self) -> Vec<(String, &str)> {
        let mut decls = Vec::with_capacity(self.len());
        if let Some(ref ns) = self.default_namespace {
            decls.push(("xmlns".to_string(), ns.as_str()));
        }
        for (prefix, uri) in &self.prefixes {
            decls.push((format!("xmlns:{}", prefix), uri.as_str()));
        }
        decls
    }

    /// Resolve a prefixed element name to a QName
    pub fn resolve(&self, prefixed_name: &str) -> Result<QName> {
        if let Some((prefix, local)) = prefixed_name.split_once(':') {
            let namespace = self
                .get_namespace(prefix)
                .ok_or_else(|| Error::Xml(format!("unknown namespace prefix: {}", prefix)))?;
            Ok(QName::namespaced(namespace, local))
        } else {
            Ok(QName::new(self.default_namespace.clone(), prefixed_name))
        }
    }

    /// Resolve a prefixed attribute name; unprefixed attributes have no namespace
    pub fn resolve_attribute(&self, prefixed_name: &str) -> Result<QName> {
        if prefixed_name.contains(':') {
            self.resolve(prefixed_name)
        } else {
            Ok(QName::local(prefixed_name))
        }
    }
}

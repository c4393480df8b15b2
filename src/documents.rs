//! XML document handling
//!
//! This module provides the element tree the record decoders walk, a
//! `quick-xml` reader that builds it, and a writer that turns it back
//! into text. Typed values go in and out through [`XmlText`].

use crate::codecs::XmlText;
use crate::config::WriteOptions;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::{NamespaceContext, QName};
use crate::{OCIL_NAMESPACE, XSI_NAMESPACE};
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::Serialize;
use std::io::Write;

/// XML Element in the document tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    /// Element qualified name
    pub qname: QName,
    /// Element attributes, in document order
    pub attributes: IndexMap<QName, String>,
    /// Text content (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
    /// Namespace declarations made on this element
    #[serde(skip_serializing_if = "NamespaceContext::is_empty")]
    pub namespaces: NamespaceContext,
}

impl Element {
    /// Create a new element
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            attributes: IndexMap::new(),
            text: None,
            children: Vec::new(),
            namespaces: NamespaceContext::new(),
        }
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace.as_deref()
    }

    /// Get an unqualified attribute value; attributes in a namespace are
    /// only reachable through [`Element::get_attribute_qname`]
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(qname, _)| qname.namespace.is_none() && qname.local_name == name)
            .map(|(_, value)| value.as_str())
    }

    /// Get an attribute value by qualified name
    pub fn get_attribute_qname(&self, qname: &QName) -> Option<&str> {
        self.attributes.get(qname).map(|s| s.as_str())
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Set text content
    pub fn set_text(&mut self, text: String) {
        self.text = Some(text);
    }

    /// True for elements in the OCIL namespace or in no namespace
    pub fn is_ocil(&self) -> bool {
        matches!(self.namespace(), None | Some(OCIL_NAMESPACE))
    }

    /// True when this is the OCIL (or unqualified) element `local_name`
    pub fn is_named(&self, local_name: &str) -> bool {
        self.is_ocil() && self.local_name() == local_name
    }

    /// Find child elements by name, see [`Element::is_named`]
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.children_named(local_name).collect()
    }

    /// Iterate over child elements with the given name.
    ///
    /// Children in a foreign namespace never match, so extension content
    /// cannot stand in for an OCIL field of the same local name.
    pub fn children_named<'a, 'b>(
        &'a self,
        local_name: &'b str,
    ) -> impl Iterator<Item = &'a Element> + 'b
    where
        'a: 'b,
    {
        self.children.iter().filter(move |e| e.is_named(local_name))
    }

    /// First child element with the given name
    pub fn child(&self, local_name: &str) -> Option<&Element> {
        self.children.iter().find(|e| e.is_named(local_name))
    }

    /// Field label used in error messages for an attribute of this element
    fn attr_field(&self, name: &str) -> String {
        format!("{}@{}", self.local_name(), name)
    }

    // =========================================================================
    // Typed access
    // =========================================================================

    /// Decode an attribute, `None` when it is absent
    pub fn attr_value<T: XmlText>(&self, name: &str) -> Result<Option<T>> {
        self.get_attribute(name)
            .map(|text| T::from_xml_text(text).map_err(|e| e.with_field(self.attr_field(name))))
            .transpose()
    }

    /// Decode an attribute in `namespace`, such as `xml:lang`
    pub fn ns_attr_value<T: XmlText>(&self, namespace: &str, name: &str) -> Result<Option<T>> {
        self.get_attribute_qname(&QName::namespaced(namespace, name))
            .map(|text| T::from_xml_text(text).map_err(|e| e.with_field(self.attr_field(name))))
            .transpose()
    }

    /// Decode an attribute the schema requires
    pub fn required_attr<T: XmlText>(&self, name: &str) -> Result<T> {
        self.attr_value(name)?.ok_or_else(|| {
            Error::Missing(format!("attribute '{}' on <{}>", name, self.local_name()))
        })
    }

    /// Decode the text content; an empty element reads as empty text
    pub fn text_value<T: XmlText>(&self) -> Result<T> {
        T::from_xml_text(self.text.as_deref().unwrap_or(""))
            .map_err(|e| e.with_field(self.local_name().to_string()))
    }

    /// First child with the given name, or a missing-element error
    pub fn required_child(&self, local_name: &str) -> Result<&Element> {
        self.child(local_name).ok_or_else(|| {
            Error::Missing(format!("element <{}> in <{}>", local_name, self.local_name()))
        })
    }

    /// Decode the text of the first child with the given name
    pub fn child_value<T: XmlText>(&self, local_name: &str) -> Result<Option<T>> {
        self.child(local_name).map(|e| e.text_value()).transpose()
    }

    /// Decode the text of a child the schema requires
    pub fn required_child_value<T: XmlText>(&self, local_name: &str) -> Result<T> {
        self.required_child(local_name)?.text_value()
    }

    /// Decode the text of every child with the given name
    pub fn child_values<T: XmlText>(&self, local_name: &str) -> Result<Vec<T>> {
        self.children_named(local_name)
            .map(|e| e.text_value())
            .collect()
    }

    // =========================================================================
    // Building
    // =========================================================================

    /// Set an attribute from a typed value; omitted when the codec says so
    pub fn set_attr<T: XmlText>(&mut self, name: &str, value: &T) {
        if let Some(text) = value.to_xml_text() {
            self.attributes.insert(QName::local(name), text);
        }
    }

    /// Set an optional attribute; `None` writes nothing
    pub fn set_opt_attr<T: XmlText>(&mut self, name: &str, value: &Option<T>) {
        if let Some(v) = value {
            self.set_attr(name, v);
        }
    }

    /// Set an attribute in a foreign namespace
    pub fn set_ns_attr<T: XmlText>(&mut self, namespace: &str, name: &str, value: &T) {
        if let Some(text) = value.to_xml_text() {
            self.attributes.insert(QName::namespaced(namespace, name), text);
        }
    }

    /// Append a child in this element's namespace carrying `value` as text.
    ///
    /// Nothing is appended when the codec omits the value.
    pub fn push_value<T: XmlText>(&mut self, local_name: &str, value: &T) {
        if let Some(text) = value.to_xml_text() {
            let mut child = self.new_child(local_name);
            child.set_text(text);
            self.add_child(child);
        }
    }

    /// Append a text child for an optional value
    pub fn push_opt_value<T: XmlText>(&mut self, local_name: &str, value: &Option<T>) {
        if let Some(v) = value {
            self.push_value(local_name, v);
        }
    }

    /// Append one text child per value
    pub fn push_values<T: XmlText>(&mut self, local_name: &str, values: &[T]) {
        for v in values {
            self.push_value(local_name, v);
        }
    }

    /// Create an element in the same namespace as this one
    pub fn new_child(&self, local_name: &str) -> Element {
        Element::new(QName::new(self.qname.namespace.clone(), local_name))
    }
}

/// XML Document representation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Root element of the document
    pub root: Option<Element>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a root element
    pub fn with_root(root: Element) -> Self {
        Self { root: Some(root) }
    }

    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes())
    }

    /// Parse an XML document from bytes using default limits
    pub fn parse(xml: &[u8]) -> Result<Self> {
        Self::parse_with_limits(xml, &Limits::default())
    }

    /// Parse an XML document from bytes
    pub fn parse_with_limits(xml: &[u8], limits: &Limits) -> Result<Self> {
        limits.check_xml_size(xml.len())?;

        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);

        let mut doc = Document::new();
        let mut element_stack: Vec<Element> = Vec::new();
        // Inherited namespace scope, one entry per open element
        let mut scopes: Vec<NamespaceContext> = vec![NamespaceContext::new()];
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    limits.check_xml_depth(element_stack.len() + 1)?;
                    let (element, scope) = Self::parse_element(&e, current_scope(&scopes), limits)?;
                    element_stack.push(element);
                    scopes.push(scope);
                }
                Ok(Event::End(_)) => {
                    if scopes.len() > 1 {
                        scopes.pop();
                    }
                    if let Some(current) = element_stack.pop() {
                        if let Some(parent) = element_stack.last_mut() {
                            parent.add_child(current);
                        } else {
                            set_root(&mut doc, current)?;
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    limits.check_xml_depth(element_stack.len() + 1)?;
                    let (element, _) = Self::parse_element(&e, current_scope(&scopes), limits)?;
                    if let Some(parent) = element_stack.last_mut() {
                        parent.add_child(element);
                    } else {
                        set_root(&mut doc, element)?;
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                        append_text(current, &text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = String::from_utf8(e.into_inner().into_owned())
                            .map_err(|e| Error::Xml(format!("Invalid CDATA content: {}", e)))?;
                        append_text(current, &text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // Ignore other events (comments, processing instructions, etc.)
            }
            buf.clear();
        }

        if let Some(open) = element_stack.last() {
            return Err(Error::Xml(format!(
                "unexpected end of document inside <{}>",
                open.local_name()
            )));
        }

        Ok(doc)
    }

    /// Parse element from BytesStart event, returning it with its scope
    fn parse_element(
        start: &BytesStart,
        parent_scope: &NamespaceContext,
        limits: &Limits,
    ) -> Result<(Element, NamespaceContext)> {
        let name_bytes = start.name();
        let name = std::str::from_utf8(name_bytes.as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?
            .to_string();

        let mut declarations = NamespaceContext::new();
        let mut raw_attributes = Vec::new();

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            // Handle namespace declarations
            if attr_name == "xmlns" {
                declarations.set_default_namespace(&attr_value);
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                declarations.add_prefix(prefix, &attr_value);
            } else {
                raw_attributes.push((attr_name, attr_value));
            }
        }

        limits.check_attributes(raw_attributes.len())?;
        limits.check_namespaces(declarations.len())?;

        let mut scope = parent_scope.clone();
        scope.extend(&declarations);

        let mut element = Element::new(scope.resolve(&name)?);
        for (attr_name, attr_value) in raw_attributes {
            element
                .attributes
                .insert(scope.resolve_attribute(&attr_name)?, attr_value);
        }
        element.namespaces = declarations;

        Ok((element, scope))
    }

    /// Get the root element
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// Get the root element mutably
    pub fn root_mut(&mut self) -> Option<&mut Element> {
        self.root.as_mut()
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// Write the document to `out`
    pub fn write_to<W: Write>(&self, out: W, options: &WriteOptions) -> Result<W> {
        let mut writer = if options.indent() > 0 {
            Writer::new_with_indent(out, b' ', options.indent())
        } else {
            Writer::new(out)
        };

        if options.declaration() {
            writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        }

        if let Some(ref root) = self.root {
            write_element(&mut writer, root, &NamespaceContext::new())?;
        }

        let mut out = writer.into_inner();
        if options.indent() > 0 {
            out.write_all(b"\n")?;
        }
        Ok(out)
    }

    /// Render the document as a string
    pub fn to_xml_string(&self, options: &WriteOptions) -> Result<String> {
        let bytes = self.write_to(Vec::new(), options)?;
        String::from_utf8(bytes).map_err(|e| Error::Xml(format!("Invalid UTF-8 output: {}", e)))
    }
}

fn current_scope(scopes: &[NamespaceContext]) -> &NamespaceContext {
    // The stack always holds the document-level scope at the bottom
    &scopes[scopes.len() - 1]
}

fn set_root(doc: &mut Document, element: Element) -> Result<()> {
    if let Some(ref root) = doc.root {
        return Err(Error::Xml(format!(
            "second root element <{}> after <{}>",
            element.local_name(),
            root.local_name()
        )));
    }
    doc.root = Some(element);
    Ok(())
}

/// Append a trimmed text run. In mixed content a run that follows a child
/// element is separated from the text before it by one space.
fn append_text(element: &mut Element, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    let after_child = !element.children.is_empty();
    match element.text {
        Some(ref mut existing) => {
            if after_child && !existing.is_empty() {
                existing.push(' ');
            }
            existing.push_str(text);
        }
        None => element.text = Some(text.to_string()),
    }
}

/// Prefix conventionally used for a namespace the writer must declare
fn conventional_prefix(namespace: &str, scope: &NamespaceContext) -> String {
    if namespace == XSI_NAMESPACE && scope.get_namespace("xsi").is_none() {
        return "xsi".to_string();
    }
    let mut n = 0;
    loop {
        let candidate = format!("ns{}", n);
        if scope.get_namespace(&candidate).is_none() {
            return candidate;
        }
        n += 1;
    }
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    element: &Element,
    parent_scope: &NamespaceContext,
) -> Result<()> {
    let mut scope = parent_scope.clone();
    scope.extend(&element.namespaces);
    let mut declarations = element.namespaces.clone();

    let name = match element.namespace() {
        Some(ns) if scope.get_default_namespace() == Some(ns) => element.local_name().to_string(),
        Some(ns) => match scope.prefix_for(ns) {
            Some(prefix) => format!("{}:{}", prefix, element.local_name()),
            None => {
                declarations.set_default_namespace(ns);
                scope.set_default_namespace(ns);
                element.local_name().to_string()
            }
        },
        None => element.local_name().to_string(),
    };

    let mut attributes = Vec::with_capacity(element.attributes.len());
    for (qname, value) in &element.attributes {
        let attr_name = match qname.namespace.as_deref() {
            None => qname.local_name.clone(),
            Some(ns) => {
                let prefix = match scope.prefix_for(ns) {
                    Some(prefix) => prefix.to_string(),
                    None => {
                        let prefix = conventional_prefix(ns, &scope);
                        declarations.add_prefix(prefix.as_str(), ns);
                        scope.add_prefix(prefix.as_str(), ns);
                        prefix
                    }
                };
                format!("{}:{}", prefix, qname.local_name)
            }
        };
        attributes.push((attr_name, value.as_str()));
    }

    let mut start = BytesStart::new(name.as_str());
    for (attr_name, uri) in declarations.declarations() {
        start.push_attribute((attr_name.as_str(), uri));
    }
    for (attr_name, value) in &attributes {
        start.push_attribute((attr_name.as_str(), *value));
    }

    if element.text.is_none() && element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(ref text) = element.text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in &element.children {
        write_element(writer, child, &scope)?;
    }
    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
    Ok(())
}

//! Generator metadata, document information and schema versions

use super::{decode_all, push_all, ocil_element, FromElement, ToElement};
use crate::codecs::{XmlText, XsdDateTime};
use crate::config::VersionPolicy;
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::model::common::User;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// OCIL schema version named by `generator/schema_version`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SchemaVersion {
    /// OCIL 2.0
    #[default]
    V2_0,
    /// Any version this crate has no rules for, as written
    Other(String),
}

impl SchemaVersion {
    /// Version text as written in documents
    pub fn as_str(&self) -> &str {
        match self {
            SchemaVersion::V2_0 => "2.0",
            SchemaVersion::Other(v) => v,
        }
    }

    /// True for versions with their own section rules
    pub fn is_known(&self) -> bool {
        !matches!(self, SchemaVersion::Other(_))
    }

    /// Section rules to decode a document of this version with
    pub fn rules(&self, policy: VersionPolicy) -> Result<&'static SectionRules> {
        match (self, policy) {
            (SchemaVersion::V2_0, _) => Ok(&SectionRules::OCIL_2_0),
            (SchemaVersion::Other(_), VersionPolicy::Lax) => Ok(&SectionRules::OCIL_2_0),
            (SchemaVersion::Other(v), VersionPolicy::Strict) => Err(Error::Version(format!(
                "unsupported schema version '{}'",
                v
            ))),
        }
    }
}

impl XmlText for SchemaVersion {
    fn from_xml_text(text: &str) -> Result<Self> {
        let value = text.trim();
        let number = Decimal::from_str(value)
            .map_err(|_| Error::format("not a valid xs:decimal", text))?;
        // "2", "2.0" and "2.00" name the same version
        if number == Decimal::new(2, 0) {
            Ok(SchemaVersion::V2_0)
        } else {
            Ok(SchemaVersion::Other(value.to_string()))
        }
    }

    fn to_xml_text(&self) -> Option<String> {
        Some(self.as_str().to_string())
    }
}

impl Serialize for SchemaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which top-level sections a schema version requires and allows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionRules {
    /// Sections that must be present
    pub required: &'static [&'static str],
    /// Sections that may be present
    pub optional: &'static [&'static str],
}

impl SectionRules {
    /// OCIL 2.0 top-level layout
    pub const OCIL_2_0: SectionRules = SectionRules {
        required: &["generator", "questionnaires", "test_actions", "questions"],
        optional: &["document", "artifacts", "variables", "results"],
    };

    /// True when `name` is a section of this layout
    pub fn allows(&self, name: &str) -> bool {
        self.required.contains(&name) || self.optional.contains(&name)
    }

    /// Check the children of the root against the layout.
    ///
    /// Unknown sections are an error under the strict policy and skipped
    /// under the lax one.
    pub fn check(&self, root: &Element, policy: VersionPolicy) -> Result<()> {
        for name in self.required {
            root.required_child(name)?;
        }
        if policy == VersionPolicy::Strict {
            let known = |c: &&Element| c.is_ocil() && self.allows(c.local_name());
            if let Some(unknown) = root.children.iter().find(|c| !known(c)) {
                return Err(super::unexpected_child(unknown, root));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Generator
// =============================================================================

/// Information about the tool and people that produced a document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Generator {
    /// Producing tool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    /// Version of the producing tool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_version: Option<String>,
    /// Document authors
    pub authors: Vec<User>,
    /// Schema version the document follows
    pub schema_version: SchemaVersion,
    /// Creation time; the zero value is never written
    pub timestamp: XsdDateTime,
    /// Extension content, kept as opaque element trees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<Vec<Element>>,
}

impl FromElement for Generator {
    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            product_name: element.child_value("product_name")?,
            product_version: element.child_value("product_version")?,
            authors: decode_all(element, "author")?,
            schema_version: element.required_child_value("schema_version")?,
            timestamp: element.child_value("timestamp")?.unwrap_or_default(),
            additional_data: element
                .child("additional_data")
                .map(|extension| extension.children.clone()),
        })
    }
}

impl ToElement for Generator {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.push_opt_value("product_name", &self.product_name);
        e.push_opt_value("product_version", &self.product_version);
        push_all(&mut e, "author", &self.authors);
        e.push_value("schema_version", &self.schema_version);
        e.push_value("timestamp", &self.timestamp);
        if let Some(ref items) = self.additional_data {
            let mut extension = e.new_child("additional_data");
            extension.children = items.clone();
            e.add_child(extension);
        }
        e
    }
}

// =============================================================================
// Document
// =============================================================================

/// Title, descriptions and notices of a document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentInfo {
    /// Document title
    pub title: String,
    /// Descriptions
    pub descriptions: Vec<String>,
    /// Notices
    pub notices: Vec<String>,
}

impl FromElement for DocumentInfo {
    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            title: element.required_child_value("title")?,
            descriptions: element.child_values("description")?,
            notices: element.child_values("notice")?,
        })
    }
}

impl ToElement for DocumentInfo {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.push_value("title", &self.title);
        e.push_values("description", &self.descriptions);
        e.push_values("notice", &self.notices);
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;

    fn element(xml: &str) -> Element {
        Document::from_string(xml).unwrap().root.unwrap()
    }

    #[test]
    fn test_schema_version_text() {
        assert_eq!(SchemaVersion::from_xml_text("2.0").unwrap(), SchemaVersion::V2_0);
        assert_eq!(SchemaVersion::from_xml_text(" 2 ").unwrap(), SchemaVersion::V2_0);
        assert_eq!(
            SchemaVersion::from_xml_text("2.1").unwrap(),
            SchemaVersion::Other("2.1".to_string())
        );
        assert_eq!(SchemaVersion::from_xml_text("2.00").unwrap(), SchemaVersion::V2_0);
        assert!(matches!(SchemaVersion::from_xml_text(""), Err(Error::Format(_))));
        assert!(matches!(SchemaVersion::from_xml_text("two"), Err(Error::Format(_))));
        assert_eq!(SchemaVersion::V2_0.to_string(), "2.0");
    }

    #[test]
    fn test_version_rules() {
        assert!(SchemaVersion::V2_0.rules(VersionPolicy::Strict).is_ok());
        let future = SchemaVersion::Other("3.0".to_string());
        assert!(!future.is_known());
        assert!(matches!(
            future.rules(VersionPolicy::Strict),
            Err(Error::Version(_))
        ));
        assert_eq!(
            future.rules(VersionPolicy::Lax).unwrap(),
            &SectionRules::OCIL_2_0
        );
    }

    #[test]
    fn test_section_check() {
        let root = element(
            "<ocil><generator/><questionnaires/><test_actions/><questions/><extras/></ocil>",
        );
        let rules = SectionRules::OCIL_2_0;
        assert!(matches!(
            rules.check(&root, VersionPolicy::Strict),
            Err(Error::UnexpectedElement(_))
        ));
        assert!(rules.check(&root, VersionPolicy::Lax).is_ok());

        let root = element("<ocil><generator/><questions/></ocil>");
        assert!(matches!(
            rules.check(&root, VersionPolicy::Lax),
            Err(Error::Missing(_))
        ));
    }

    #[test]
    fn test_generator_round_trip() {
        let e = element(
            r#"<generator>
                 <product_name>checker</product_name>
                 <author><name>Ada</name></author>
                 <schema_version>2.0</schema_version>
                 <timestamp>2024-03-05T12:00:00.5</timestamp>
                 <additional_data><vendor:hint xmlns:vendor="urn:vendor" level="3">x</vendor:hint></additional_data>
               </generator>"#,
        );
        let generator = Generator::from_element(&e).unwrap();
        assert_eq!(generator.product_name.as_deref(), Some("checker"));
        assert_eq!(generator.authors[0].name, "Ada");
        assert_eq!(
            generator.timestamp.format().as_deref(),
            Some("2024-03-05T12:00:00.5")
        );
        let extension = generator.additional_data.as_ref().unwrap();
        assert_eq!(extension.len(), 1);
        assert!(extension[0].qname.is_in("urn:vendor"));

        let again = Generator::from_element(&generator.to_element("generator")).unwrap();
        assert_eq!(again, generator);
    }

    #[test]
    fn test_generator_requires_schema_version() {
        let e = element("<generator><product_name>x</product_name></generator>");
        assert!(matches!(Generator::from_element(&e), Err(Error::Missing(_))));
    }

    #[test]
    fn test_document_info() {
        let e = element(
            "<document><title>Audit</title><notice>n1</notice><notice>n2</notice></document>",
        );
        let info = DocumentInfo::from_element(&e).unwrap();
        assert_eq!(info.title, "Audit");
        assert!(info.descriptions.is_empty());
        assert_eq!(info.notices, ["n1", "n2"]);
    }
}

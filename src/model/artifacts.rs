//! Artifacts: evidence requested by test actions and supplied with results

use super::{decode_required, ocil_element, set_xsi_type, xsi_type, FromElement, ToElement};
use crate::codecs::{settle, AttributeOverlay, Base64Binary, XsdDateTime};
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::model::common::{Text, User};
use serde::Serialize;

/// Evidence that may be collected during an assessment
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Artifact {
    /// Artifact id
    pub id: String,
    /// Whether the artifact should be kept after the assessment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent: Option<bool>,
    /// Revision number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
    /// Title
    pub title: Text,
    /// What to collect
    pub description: Text,
    /// Free-form notes
    pub notes: Vec<String>,
}

impl Artifact {
    /// `persistent` settled onto its zero value
    pub fn persistent(&self) -> bool {
        settle(self.persistent)
    }

    /// `revision` settled onto its zero value
    pub fn revision(&self) -> u32 {
        settle(self.revision)
    }
}

impl FromElement for Artifact {
    fn from_element(element: &Element) -> Result<Self> {
        let overlay = AttributeOverlay::new(element);
        Ok(Self {
            id: element.required_attr("id")?,
            persistent: overlay.shadow("persistent")?,
            revision: overlay.shadow("revision")?,
            title: decode_required(element, "title")?,
            description: decode_required(element, "description")?,
            notes: element.child_values("notes")?,
        })
    }
}

impl ToElement for Artifact {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.set_attr("id", &self.id);
        e.set_opt_attr("persistent", &self.persistent);
        e.set_opt_attr("revision", &self.revision);
        e.push_values("notes", &self.notes);
        e.add_child(self.title.to_element("title"));
        e.add_child(self.description.to_element("description"));
        e
    }
}

/// Collected artifact content, selected by `xsi:type`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArtifactValue {
    /// `TextArtifactValueType`
    Text {
        /// MIME type of the data
        mime_type: String,
        /// Text content
        data: String,
    },
    /// `BinaryArtifactValueType`, carried as base64
    Binary {
        /// MIME type of the data
        mime_type: String,
        /// Raw bytes
        data: Base64Binary,
    },
    /// `ReferenceArtifactValueType`
    Reference {
        /// Where the artifact can be retrieved
        href: String,
    },
}

impl ArtifactValue {
    /// Schema type name written to `xsi:type`
    pub fn type_name(&self) -> &'static str {
        match self {
            ArtifactValue::Text { .. } => "TextArtifactValueType",
            ArtifactValue::Binary { .. } => "BinaryArtifactValueType",
            ArtifactValue::Reference { .. } => "ReferenceArtifactValueType",
        }
    }
}

impl FromElement for ArtifactValue {
    fn from_element(element: &Element) -> Result<Self> {
        let type_name = xsi_type(element).ok_or_else(|| {
            Error::Missing(format!("attribute 'xsi:type' on <{}>", element.local_name()))
        })?;
        match type_name {
            "TextArtifactValueType" => Ok(ArtifactValue::Text {
                mime_type: element.required_attr("mime_type")?,
                data: element.required_child_value("data")?,
            }),
            "BinaryArtifactValueType" => Ok(ArtifactValue::Binary {
                mime_type: element.required_attr("mime_type")?,
                data: element.required_child_value("data")?,
            }),
            "ReferenceArtifactValueType" => Ok(ArtifactValue::Reference {
                href: element.required_child("reference")?.required_attr("href")?,
            }),
            other => Err(Error::UnexpectedElement(format!(
                "xsi:type '{}' on <{}>",
                other,
                element.local_name()
            ))),
        }
    }
}

impl ToElement for ArtifactValue {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        set_xsi_type(&mut e, self.type_name());
        match self {
            ArtifactValue::Text { mime_type, data } => {
                e.set_attr("mime_type", mime_type);
                e.push_value("data", data);
            }
            ArtifactValue::Binary { mime_type, data } => {
                e.set_attr("mime_type", mime_type);
                e.push_value("data", data);
            }
            ArtifactValue::Reference { href } => {
                let mut reference = e.new_child("reference");
                reference.set_attr("href", href);
                e.add_child(reference);
            }
        }
        e
    }
}

/// Artifact content supplied for an assessment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactResult {
    /// Id of the artifact this result is for
    pub artifact_ref: String,
    /// When the content was collected; the zero value is never written
    pub timestamp: XsdDateTime,
    /// Collected content
    pub value: ArtifactValue,
    /// Tool or process that provided the content
    pub provider: String,
    /// Person who submitted the content
    pub submitter: User,
}

impl FromElement for ArtifactResult {
    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            artifact_ref: element.required_attr("artifact_ref")?,
            timestamp: element.attr_value("timestamp")?.unwrap_or_default(),
            value: decode_required(element, "artifact_value")?,
            provider: element.required_child_value("provider")?,
            submitter: decode_required(element, "submitter")?,
        })
    }
}

impl ToElement for ArtifactResult {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.set_attr("artifact_ref", &self.artifact_ref);
        e.set_attr("timestamp", &self.timestamp);
        e.add_child(self.value.to_element("artifact_value"));
        e.push_value("provider", &self.provider);
        e.add_child(self.submitter.to_element("submitter"));
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

    const XSI: &str = r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#;

    #[test]
    fn test_artifact_presence_and_settled_view() {
        let absent = Artifact::from_element(&element(
            r#"<artifact id="a:1"><title>Log</title><description>Audit log</description></artifact>"#,
        ))
        .unwrap();
        let zero = Artifact::from_element(&element(
            r#"<artifact id="a:1" persistent="false" revision="0"><title>Log</title><description>Audit log</description></artifact>"#,
        ))
        .unwrap();

        assert_eq!(absent.persistent, None);
        assert_eq!(zero.persistent, Some(false));
        assert_eq!(absent.revision, None);
        assert_eq!(zero.revision, Some(0));
        assert_eq!(absent.persistent(), zero.persistent());
        assert_eq!(absent.revision(), zero.revision());

        // presence survives re-encoding
        let encoded = zero.to_element("artifact");
        assert_eq!(encoded.get_attribute("persistent"), Some("false"));
        assert_eq!(encoded.get_attribute("revision"), Some("0"));
        assert!(absent.to_element("artifact").get_attribute("persistent").is_none());
    }

    #[test]
    fn test_binary_artifact_value() {
        let e = element(&format!(
            r#"<artifact_value {} xsi:type="BinaryArtifactValueType" mime_type="application/octet-stream"><data>AP8Q</data></artifact_value>"#,
            XSI
        ));
        let value = ArtifactValue::from_element(&e).unwrap();
        match &value {
            ArtifactValue::Binary { data, .. } => assert_eq!(data.to_vec(), vec![0x00, 0xFF, 0x10]),
            other => panic!("unexpected value: {other:?}"),
        }

        let encoded = value.to_element("artifact_value");
        assert_eq!(encoded.child("data").unwrap().text.as_deref(), Some("AP8Q"));
        assert_eq!(crate::model::xsi_type(&encoded), Some("BinaryArtifactValueType"));
    }

    #[test]
    fn test_bad_binary_reports_field() {
        let e = element(&format!(
            r#"<artifact_value {} xsi:type="BinaryArtifactValueType" mime_type="x"><data>abc!</data></artifact_value>"#,
            XSI
        ));
        match ArtifactValue::from_element(&e) {
            Err(Error::Format(err)) => {
                assert_eq!(err.field.as_deref(), Some("data"));
                assert_eq!(err.text.as_deref(), Some("abc!"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_artifact_value_types() {
        let reference = ArtifactValue::from_element(&element(&format!(
            r#"<artifact_value {} xsi:type="ocil:ReferenceArtifactValueType"><reference href="https://example.com/log"/></artifact_value>"#,
            XSI
        )))
        .unwrap();
        assert_eq!(
            reference,
            ArtifactValue::Reference {
                href: "https://example.com/log".to_string()
            }
        );

        assert!(matches!(
            ArtifactValue::from_element(&element("<artifact_value/>")),
            Err(Error::Missing(_))
        ));
        assert!(matches!(
            ArtifactValue::from_element(&element(&format!(
                r#"<artifact_value {} xsi:type="VideoArtifactValueType"/>"#,
                XSI
            ))),
            Err(Error::UnexpectedElement(_))
        ));
    }

    #[test]
    fn test_artifact_result_timestamp_attribute() {
        let xml = format!(
            r#"<artifact_result {} artifact_ref="a:1" timestamp="2024-03-05T12:00:00Z">
                 <artifact_value xsi:type="TextArtifactValueType" mime_type="text/plain"><data>ok</data></artifact_value>
                 <provider>scanner</provider>
                 <submitter><name>Ada</name></submitter>
               </artifact_result>"#,
            XSI
        );
        let result = ArtifactResult::from_element(&element(&xml)).unwrap();
        assert_eq!(
            result.timestamp.format().as_deref(),
            Some("2024-03-05T12:00:00")
        );
        assert_eq!(
            result.to_element("artifact_result").get_attribute("timestamp"),
            Some("2024-03-05T12:00:00")
        );

        let unstamped = ArtifactResult {
            timestamp: XsdDateTime::ZERO,
            ..result
        };
        assert!(unstamped
            .to_element("artifact_result")
            .get_attribute("timestamp")
            .is_none());
    }
}

//! Types shared across OCIL sections
//!
//! Enumerated tokens, localized text, users and targets, references.

use super::{ocil_element, FromElement, ToElement};
use crate::codecs::{settle, AttributeOverlay, XmlText};
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::XML_NAMESPACE;
use serde::Serialize;
use std::fmt;

/// Declare an enumeration whose XML form is a fixed token per variant
macro_rules! xml_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Schema token for this value
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }
        }

        impl XmlText for $name {
            fn from_xml_text(text: &str) -> Result<Self> {
                match text.trim() {
                    $( $text => Ok($name::$variant), )+
                    _ => Err(Error::format(
                        concat!("not a valid ", stringify!($name)),
                        text,
                    )),
                }
            }

            fn to_xml_text(&self) -> Option<String> {
                Some(self.as_str().to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

xml_enum! {
    /// Outcome of a test action or questionnaire
    ResultType {
        /// The check passed
        Pass => "PASS",
        /// The check failed
        Fail => "FAIL",
        /// The outcome could not be determined
        Unknown => "UNKNOWN",
        /// An error prevented evaluation
        Error => "ERROR",
        /// The check was not performed
        NotTested => "NOT_TESTED",
        /// The check does not apply to the target
        NotApplicable => "NOT_APPLICABLE",
    }
}

impl ResultType {
    /// True for the exceptional results (everything but PASS and FAIL)
    pub fn is_exceptional(&self) -> bool {
        !matches!(self, ResultType::Pass | ResultType::Fail)
    }
}

xml_enum! {
    /// Boolean operator combining test action results
    OperatorType {
        /// All referenced actions must pass
        And => "AND",
        /// At least one referenced action must pass
        Or => "OR",
    }
}

xml_enum! {
    /// How a user responded to a question
    UserResponseType {
        /// The question was answered
        Answered => "ANSWERED",
        /// The user did not know the answer
        Unknown => "UNKNOWN",
        /// The question was not asked
        NotTested => "NOT_TESTED",
        /// The question does not apply
        NotApplicable => "NOT_APPLICABLE",
    }
}

xml_enum! {
    /// Data type of a variable value
    VariableDataType {
        /// Free text
        Text => "TEXT",
        /// Numeric value
        Numeric => "NUMERIC",
    }
}

xml_enum! {
    /// Answer labels of a boolean question
    BooleanQuestionModel {
        /// Yes / No
        YesNo => "MODEL_YES_NO",
        /// True / False
        TrueFalse => "MODEL_TRUE_FALSE",
    }
}

// =============================================================================
// Text
// =============================================================================

/// Text with an optional `xml:lang`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Text {
    /// Text content
    pub value: String,
    /// Language tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl Text {
    /// Text without a language tag
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            lang: None,
        }
    }
}

impl FromElement for Text {
    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            value: element.text_value()?,
            lang: element.ns_attr_value(XML_NAMESPACE, "lang")?,
        })
    }
}

impl ToElement for Text {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        if !self.value.is_empty() {
            e.set_text(self.value.clone());
        }
        if let Some(ref lang) = self.lang {
            e.set_ns_attr(XML_NAMESPACE, "lang", lang);
        }
        e
    }
}

// =============================================================================
// References
// =============================================================================

/// External reference with an optional link
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reference {
    /// Reference text
    pub value: String,
    /// Link target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Language tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl FromElement for Reference {
    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            value: element.text_value()?,
            href: element.attr_value("href")?,
            lang: element.ns_attr_value(XML_NAMESPACE, "lang")?,
        })
    }
}

impl ToElement for Reference {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        if !self.value.is_empty() {
            e.set_text(self.value.clone());
        }
        e.set_opt_attr("href", &self.href);
        if let Some(ref lang) = self.lang {
            e.set_ns_attr(XML_NAMESPACE, "lang", lang);
        }
        e
    }
}

/// Reference to an artifact that should be collected
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArtifactRef {
    /// Referenced artifact id
    pub idref: String,
    /// Whether the artifact must be provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

impl ArtifactRef {
    /// `required` settled onto its zero value
    pub fn required(&self) -> bool {
        settle(self.required)
    }
}

impl FromElement for ArtifactRef {
    fn from_element(element: &Element) -> Result<Self> {
        let overlay = AttributeOverlay::new(element);
        Ok(Self {
            idref: element.required_attr("idref")?,
            required: overlay.shadow("required")?,
        })
    }
}

impl ToElement for ArtifactRef {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.set_attr("idref", &self.idref);
        e.set_opt_attr("required", &self.required);
        e
    }
}

// =============================================================================
// Users and targets
// =============================================================================

/// A person: author, submitter, or user target
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct User {
    /// Display name
    pub name: String,
    /// Organizations the user belongs to
    pub organizations: Vec<String>,
    /// Positions held
    pub positions: Vec<String>,
    /// Email addresses
    pub emails: Vec<String>,
    /// Free-form notes
    pub notes: Vec<String>,
    /// Revision number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
}

impl User {
    /// User with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// `revision` settled onto its zero value
    pub fn revision(&self) -> u32 {
        settle(self.revision)
    }
}

impl FromElement for User {
    fn from_element(element: &Element) -> Result<Self> {
        let overlay = AttributeOverlay::new(element);
        Ok(Self {
            name: element.required_child_value("name")?,
            organizations: element.child_values("organization")?,
            positions: element.child_values("position")?,
            emails: element.child_values("email")?,
            notes: element.child_values("notes")?,
            revision: overlay.shadow("revision")?,
        })
    }
}

impl ToElement for User {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.set_opt_attr("revision", &self.revision);
        e.push_values("notes", &self.notes);
        e.push_value("name", &self.name);
        e.push_values("organization", &self.organizations);
        e.push_values("position", &self.positions);
        e.push_values("email", &self.emails);
        e
    }
}

/// A system under assessment
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemTarget {
    /// System name
    pub name: String,
    /// Owning organization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// IP addresses of the system
    pub ipaddresses: Vec<String>,
    /// Description of the system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Text>,
    /// Free-form notes
    pub notes: Vec<String>,
    /// Revision number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
}

impl FromElement for SystemTarget {
    fn from_element(element: &Element) -> Result<Self> {
        let overlay = AttributeOverlay::new(element);
        Ok(Self {
            name: element.required_child_value("name")?,
            organization: element.child_value("organization")?,
            ipaddresses: element.child_values("ipaddress")?,
            description: super::decode_opt(element, "description")?,
            notes: element.child_values("notes")?,
            revision: overlay.shadow("revision")?,
        })
    }
}

impl ToElement for SystemTarget {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.set_opt_attr("revision", &self.revision);
        e.push_values("notes", &self.notes);
        e.push_value("name", &self.name);
        e.push_opt_value("organization", &self.organization);
        e.push_values("ipaddress", &self.ipaddresses);
        super::push_opt(&mut e, "description", &self.description);
        e
    }
}

/// Member of the `target` substitution group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    /// `<user>`
    User(User),
    /// `<system>`
    System(SystemTarget),
}

impl Target {
    /// Decode any member of the group; `None` for elements outside it
    pub fn decode(element: &Element) -> Option<Result<Self>> {
        match element.local_name() {
            "user" => Some(User::from_element(element).map(Target::User)),
            "system" => Some(SystemTarget::from_element(element).map(Target::System)),
            _ => None,
        }
    }

    /// Encode under the member's own element name
    pub fn encode(&self) -> Element {
        match self {
            Target::User(u) => u.to_element("user"),
            Target::System(s) => s.to_element("system"),
        }
    }
}

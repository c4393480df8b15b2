//! OCIL record model
//!
//! One record type per schema type, each decoded from and encoded to a
//! [`documents::Element`](crate::documents::Element). Substitution groups
//! (test actions, questions, variables, question results, targets) are
//! enums; members selected by `xsi:type` (artifact values, set
//! expressions) likewise.
//!
//! Optional boolean and integer attributes are kept as `Option<T>` so a
//! decoded record still knows which of them were present; each record
//! offers zero-value accessors for the settled view.

pub mod artifacts;
pub mod common;
pub mod generator;
pub mod questionnaires;
pub mod questions;
pub mod results;
pub mod test_actions;
pub mod variables;

pub use artifacts::{Artifact, ArtifactResult, ArtifactValue};
pub use common::{
    ArtifactRef, BooleanQuestionModel, OperatorType, Reference, ResultType, SystemTarget,
    Target, Text, User, UserResponseType, VariableDataType,
};
pub use generator::{DocumentInfo, Generator, SchemaVersion, SectionRules};
pub use questionnaires::{Operation, Questionnaire, TestActionRef};
pub use questions::{
    BooleanQuestion, Choice, ChoiceGroup, ChoiceQuestion, Instructions, NumericQuestion,
    Question, QuestionCommon, QuestionText, Questions, Step, StringQuestion,
};
pub use results::{
    AnsweredQuestion, QuestionResult, QuestionnaireResult, Results, TestActionResult,
};
pub use test_actions::{
    ChoiceCondition, CompoundTestAction, ConditionOutcome, EqualsCondition, PatternCondition,
    PatternMatch, QuestionTestAction, RangeBound, RangeCondition, TestAction,
    TestActionCondition, TestActionKind, ValueRange,
};
pub use variables::{SetExpression, SetExpressionKind, Variable, VariableCommon, VariableKind};

use crate::codecs::XsdDateTime;
use crate::config::{ReadOptions, WriteOptions};
use crate::documents::{Document, Element};
use crate::error::{Error, Result};
use crate::namespaces::QName;
use crate::{OCIL_NAMESPACE, XSI_NAMESPACE};
use serde::Serialize;

/// Decode a record from the element that carries it
pub trait FromElement: Sized {
    /// Build the record from `element`
    fn from_element(element: &Element) -> Result<Self>;
}

/// Encode a record as an element with the given name
pub trait ToElement {
    /// Build the element for this record
    fn to_element(&self, name: &str) -> Element;
}

/// Create an element in the OCIL namespace
pub fn ocil_element(name: &str) -> Element {
    Element::new(QName::namespaced(OCIL_NAMESPACE, name))
}

/// Decode the first child named `name`, if any
pub(crate) fn decode_opt<T: FromElement>(parent: &Element, name: &str) -> Result<Option<T>> {
    parent.child(name).map(T::from_element).transpose()
}

/// Decode the first child named `name`, which must exist
pub(crate) fn decode_required<T: FromElement>(parent: &Element, name: &str) -> Result<T> {
    T::from_element(parent.required_child(name)?)
}

/// Decode every child named `name`
pub(crate) fn decode_all<T: FromElement>(parent: &Element, name: &str) -> Result<Vec<T>> {
    parent.children_named(name).map(T::from_element).collect()
}

/// Decode the items of a wrapper element such as `<references>`; an absent
/// wrapper yields no items
pub(crate) fn decode_wrapped<T: FromElement>(
    parent: &Element,
    wrapper: &str,
    item: &str,
) -> Result<Vec<T>> {
    match parent.child(wrapper) {
        Some(container) => decode_all(container, item),
        None => Ok(Vec::new()),
    }
}

/// Decode every child of `container` through a substitution group decoder.
///
/// Children in a foreign namespace are never group members.
pub(crate) fn decode_group<T>(
    container: &Element,
    decode: impl Fn(&Element) -> Option<Result<T>>,
) -> Result<Vec<T>> {
    container
        .children
        .iter()
        .map(|child| {
            let member = if child.is_ocil() { decode(child) } else { None };
            member.unwrap_or_else(|| Err(unexpected_child(child, container)))
        })
        .collect()
}

pub(crate) fn unexpected_child(child: &Element, container: &Element) -> Error {
    let name = if child.is_ocil() {
        child.local_name().to_string()
    } else {
        child.qname.to_string()
    };
    Error::UnexpectedElement(format!("<{}> in <{}>", name, container.local_name()))
}

pub(crate) fn push_opt<T: ToElement>(parent: &mut Element, name: &str, item: &Option<T>) {
    if let Some(item) = item {
        parent.add_child(item.to_element(name));
    }
}

pub(crate) fn push_all<T: ToElement>(parent: &mut Element, name: &str, items: &[T]) {
    for item in items {
        parent.add_child(item.to_element(name));
    }
}

/// Append a wrapper element holding `items`; nothing when there are none
pub(crate) fn push_wrapped<T: ToElement>(
    parent: &mut Element,
    wrapper: &str,
    item: &str,
    items: &[T],
) {
    if !items.is_empty() {
        let mut container = parent.new_child(wrapper);
        push_all(&mut container, item, items);
        parent.add_child(container);
    }
}

/// Local part of the `xsi:type` attribute, prefix stripped
pub(crate) fn xsi_type(element: &Element) -> Option<&str> {
    element
        .get_attribute_qname(&QName::namespaced(XSI_NAMESPACE, "type"))
        .map(|t| t.rsplit(':').next().unwrap_or(t))
}

pub(crate) fn set_xsi_type(element: &mut Element, type_name: &str) {
    element.set_ns_attr(XSI_NAMESPACE, "type", &type_name.to_string());
}

// =============================================================================
// Document root
// =============================================================================

/// An OCIL document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ocil {
    /// Generator metadata
    pub generator: Generator,
    /// Document title and notices
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentInfo>,
    /// Questionnaires
    pub questionnaires: Vec<Questionnaire>,
    /// Test actions
    pub test_actions: Vec<TestAction>,
    /// Questions and choice groups
    pub questions: Questions,
    /// Artifacts that may be collected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Vec<Artifact>>,
    /// Variables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<Variable>>,
    /// Results of an assessment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Results>,
    /// `xsi:schemaLocation` of the root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_location: Option<String>,
}

impl Ocil {
    /// Minimal document with empty sections, stamped with `timestamp`
    pub fn skeleton(timestamp: XsdDateTime) -> Self {
        Self {
            generator: Generator {
                timestamp,
                ..Generator::default()
            },
            document: None,
            questionnaires: Vec::new(),
            test_actions: Vec::new(),
            questions: Questions::default(),
            artifacts: None,
            variables: None,
            results: None,
            schema_location: None,
        }
    }

    /// Parse a document with default options
    pub fn from_xml(xml: &str) -> Result<Self> {
        Self::from_xml_with(xml, &ReadOptions::default())
    }

    /// Parse a document
    pub fn from_xml_with(xml: &str, options: &ReadOptions) -> Result<Self> {
        let doc = Document::parse_with_limits(xml.as_bytes(), options.limits())?;
        Self::from_document(&doc, options)
    }

    /// Decode an already parsed document
    pub fn from_document(doc: &Document, options: &ReadOptions) -> Result<Self> {
        let root = doc
            .root()
            .ok_or_else(|| Error::Missing("root element <ocil>".to_string()))?;

        if root.local_name() != "ocil" {
            return Err(Error::UnexpectedElement(format!(
                "root <{}>, expected <ocil>",
                root.local_name()
            )));
        }
        if options.require_namespace() && !root.qname.is_in(OCIL_NAMESPACE) {
            return Err(Error::UnexpectedElement(format!(
                "root {} is not in the OCIL namespace",
                root.qname
            )));
        }

        let generator: Generator = decode_required(root, "generator")?;
        let rules = generator.schema_version.rules(options.version_policy())?;
        rules.check(root, options.version_policy())?;

        let questionnaires = match root.child("questionnaires") {
            Some(container) => decode_all(container, "questionnaire")?,
            None => Vec::new(),
        };
        let test_actions = match root.child("test_actions") {
            Some(container) => decode_group(container, TestAction::decode)?,
            None => Vec::new(),
        };
        let artifacts = root
            .child("artifacts")
            .map(|container| decode_all(container, "artifact"))
            .transpose()?;
        let variables = root
            .child("variables")
            .map(|container| decode_group(container, Variable::decode))
            .transpose()?;

        Ok(Self {
            generator,
            document: decode_opt(root, "document")?,
            questionnaires,
            test_actions,
            questions: decode_opt(root, "questions")?.unwrap_or_default(),
            artifacts,
            variables,
            results: decode_opt(root, "results")?,
            schema_location: root
                .get_attribute_qname(&QName::namespaced(XSI_NAMESPACE, "schemaLocation"))
                .map(str::to_string),
        })
    }

    /// Build the element tree for this document
    pub fn to_document(&self) -> Document {
        let mut root = ocil_element("ocil");
        root.namespaces.set_default_namespace(OCIL_NAMESPACE);
        root.namespaces.add_prefix("xsi", XSI_NAMESPACE);
        if let Some(ref location) = self.schema_location {
            root.set_ns_attr(XSI_NAMESPACE, "schemaLocation", location);
        }

        root.add_child(self.generator.to_element("generator"));
        push_opt(&mut root, "document", &self.document);

        let mut questionnaires = ocil_element("questionnaires");
        push_all(&mut questionnaires, "questionnaire", &self.questionnaires);
        root.add_child(questionnaires);

        let mut test_actions = ocil_element("test_actions");
        for action in &self.test_actions {
            test_actions.add_child(action.encode());
        }
        root.add_child(test_actions);

        root.add_child(self.questions.to_element("questions"));

        if let Some(ref artifacts) = self.artifacts {
            let mut container = ocil_element("artifacts");
            push_all(&mut container, "artifact", artifacts);
            root.add_child(container);
        }
        if let Some(ref variables) = self.variables {
            let mut container = ocil_element("variables");
            for variable in variables {
                container.add_child(variable.encode());
            }
            root.add_child(container);
        }
        push_opt(&mut root, "results", &self.results);

        Document::with_root(root)
    }

    /// Render as XML with default options
    pub fn to_xml(&self) -> Result<String> {
        self.to_xml_with(&WriteOptions::default())
    }

    /// Render as XML
    pub fn to_xml_with(&self, options: &WriteOptions) -> Result<String> {
        self.to_document().to_xml_string(options)
    }

    /// Render the record tree as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Find a question by id
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.questions.iter().find(|q| q.id() == id)
    }

    /// Find a test action by id
    pub fn test_action(&self, id: &str) -> Option<&TestAction> {
        self.test_actions.iter().find(|a| a.id() == id)
    }
}

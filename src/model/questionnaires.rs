//! Questionnaires and the operations that combine test actions

use super::{
    decode_opt, decode_required, decode_wrapped, ocil_element, push_all, push_opt, push_wrapped,
    FromElement, ToElement,
};
use crate::codecs::{settle, AttributeOverlay};
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::model::common::{OperatorType, Reference, Text};
use serde::Serialize;

/// Reference to a test action, optionally negated
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TestActionRef {
    /// Id of the referenced test action or questionnaire
    pub value: String,
    /// Invert the referenced result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negate: Option<bool>,
}

impl TestActionRef {
    /// Plain reference to `id`
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            value: id.into(),
            negate: None,
        }
    }

    /// `negate` settled onto its zero value
    pub fn negate(&self) -> bool {
        settle(self.negate)
    }
}

impl FromElement for TestActionRef {
    fn from_element(element: &Element) -> Result<Self> {
        let overlay = AttributeOverlay::new(element);
        Ok(Self {
            value: element.text_value()?,
            negate: overlay.shadow("negate")?,
        })
    }
}

impl ToElement for TestActionRef {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.set_opt_attr("negate", &self.negate);
        e.set_text(self.value.clone());
        e
    }
}

/// Test action references combined with a boolean operator
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Operation {
    /// Combining operator; AND when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<OperatorType>,
    /// Invert the combined result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negate: Option<bool>,
    /// Referenced test actions, at least one
    pub test_action_refs: Vec<TestActionRef>,
}

impl Operation {
    /// Operator in effect
    pub fn operator(&self) -> OperatorType {
        self.operation.unwrap_or(OperatorType::And)
    }

    /// `negate` settled onto its zero value
    pub fn negate(&self) -> bool {
        settle(self.negate)
    }
}

impl FromElement for Operation {
    fn from_element(element: &Element) -> Result<Self> {
        let overlay = AttributeOverlay::new(element);
        let test_action_refs: Vec<TestActionRef> =
            super::decode_all(element, "test_action_ref")?;
        if test_action_refs.is_empty() {
            return Err(Error::Missing(format!(
                "element <test_action_ref> in <{}>",
                element.local_name()
            )));
        }
        Ok(Self {
            operation: element.attr_value("operation")?,
            negate: overlay.shadow("negate")?,
            test_action_refs,
        })
    }
}

impl ToElement for Operation {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.set_opt_attr("operation", &self.operation);
        e.set_opt_attr("negate", &self.negate);
        push_all(&mut e, "test_action_ref", &self.test_action_refs);
        e
    }
}

/// A questionnaire: the top-level unit of an OCIL checklist
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Questionnaire {
    /// Questionnaire id
    pub id: String,
    /// Only evaluated as part of another questionnaire
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_only: Option<bool>,
    /// Revision number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Text>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Text>,
    /// External references
    pub references: Vec<Reference>,
    /// Test actions evaluated for this questionnaire
    pub actions: Operation,
    /// Free-form notes
    pub notes: Vec<String>,
}

impl Questionnaire {
    /// `child_only` settled onto its zero value
    pub fn child_only(&self) -> bool {
        settle(self.child_only)
    }

    /// `revision` settled onto its zero value
    pub fn revision(&self) -> u32 {
        settle(self.revision)
    }
}

impl FromElement for Questionnaire {
    fn from_element(element: &Element) -> Result<Self> {
        let overlay = AttributeOverlay::new(element);
        Ok(Self {
            id: element.required_attr("id")?,
            child_only: overlay.shadow("child_only")?,
            revision: overlay.shadow("revision")?,
            title: decode_opt(element, "title")?,
            description: decode_opt(element, "description")?,
            references: decode_wrapped(element, "references", "reference")?,
            actions: decode_required(element, "actions")?,
            notes: element.child_values("notes")?,
        })
    }
}

impl ToElement for Questionnaire {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.set_attr("id", &self.id);
        e.set_opt_attr("child_only", &self.child_only);
        e.set_opt_attr("revision", &self.revision);
        e.push_values("notes", &self.notes);
        push_opt(&mut e, "title", &self.title);
        push_opt(&mut e, "description", &self.description);
        push_wrapped(&mut e, "references", "reference", &self.references);
        e.add_child(self.actions.to_element("actions"));
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
    fn test_questionnaire_decode() {
        let e = element(
            r#"<questionnaire id="ocil:example:questionnaire:1" child_only="false">
                 <title>Password policy</title>
                 <references><reference href="https://example.com/p">Policy 4.2</reference></references>
                 <actions operation="OR">
                   <test_action_ref>ocil:example:testaction:1</test_action_ref>
                   <test_action_ref negate="true">ocil:example:testaction:2</test_action_ref>
                 </actions>
               </questionnaire>"#,
        );
        let q = Questionnaire::from_element(&e).unwrap();
        assert_eq!(q.id, "ocil:example:questionnaire:1");
        assert_eq!(q.child_only, Some(false));
        assert_eq!(q.revision, None);
        assert_eq!(q.title.as_ref().unwrap().value, "Password policy");
        assert_eq!(q.references[0].href.as_deref(), Some("https://example.com/p"));
        assert_eq!(q.actions.operator(), OperatorType::Or);
        assert!(!q.actions.negate());
        assert_eq!(q.actions.test_action_refs.len(), 2);
        assert!(q.actions.test_action_refs[1].negate());

        let again = Questionnaire::from_element(&q.to_element("questionnaire")).unwrap();
        assert_eq!(again, q);
    }

    #[test]
    fn test_operation_defaults_to_and() {
        let e = element("<actions><test_action_ref>a</test_action_ref></actions>");
        let op = Operation::from_element(&e).unwrap();
        assert_eq!(op.operation, None);
        assert_eq!(op.operator(), OperatorType::And);

        let encoded = op.to_element("actions");
        assert!(encoded.get_attribute("operation").is_none());
        assert!(encoded.get_attribute("negate").is_none());
    }

    #[test]
    fn test_operation_needs_a_reference() {
        assert!(matches!(
            Operation::from_element(&element("<actions/>")),
            Err(Error::Missing(_))
        ));
        assert!(matches!(
            Operation::from_element(&element(r#"<actions operation="XOR"><test_action_ref>a</test_action_ref></actions>"#)),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_questionnaire_requires_actions() {
        let e = element(r#"<questionnaire id="q"/>"#);
        assert!(matches!(Questionnaire::from_element(&e), Err(Error::Missing(_))));
    }
}

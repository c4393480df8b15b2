//! Test actions: how question answers map onto results
//!
//! The `test_action` substitution group has five members. The compound
//! one combines other test actions; the four question test actions share
//! their common fields in [`QuestionTestAction`] and differ only in the
//! conditions that match an answer, kept in [`TestActionKind`].

use super::{
    decode_all, decode_opt, decode_required, decode_wrapped, ocil_element, push_all, push_opt,
    push_wrapped, FromElement, ToElement,
};
use crate::codecs::{settle, AttributeOverlay, XmlText};
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::model::common::{ArtifactRef, Reference, ResultType, Text};
use crate::model::questionnaires::{Operation, TestActionRef};
use regex::Regex;
use serde::Serialize;

// =============================================================================
// Conditions
// =============================================================================

/// What a matched condition yields
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOutcome {
    /// A fixed result
    Result(ResultType),
    /// The result of another test action
    TestAction(TestActionRef),
}

/// Outcome of a condition plus the artifacts to collect when it matches
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestActionCondition {
    /// Result or follow-up test action
    pub outcome: ConditionOutcome,
    /// Artifacts requested when the condition matches
    pub artifact_refs: Vec<ArtifactRef>,
}

impl TestActionCondition {
    /// Condition yielding a fixed result
    pub fn result(result: ResultType) -> Self {
        Self {
            outcome: ConditionOutcome::Result(result),
            artifact_refs: Vec::new(),
        }
    }

    /// Condition deferring to another test action
    pub fn test_action(reference: TestActionRef) -> Self {
        Self {
            outcome: ConditionOutcome::TestAction(reference),
            artifact_refs: Vec::new(),
        }
    }
}

impl FromElement for TestActionCondition {
    fn from_element(element: &Element) -> Result<Self> {
        let outcome = if let Some(result) = element.child_value("result")? {
            ConditionOutcome::Result(result)
        } else if let Some(reference) = decode_opt(element, "test_action_ref")? {
            ConditionOutcome::TestAction(reference)
        } else {
            return Err(Error::Missing(format!(
                "element <result> or <test_action_ref> in <{}>",
                element.local_name()
            )));
        };
        Ok(Self {
            outcome,
            artifact_refs: decode_wrapped(element, "artifact_refs", "artifact_ref")?,
        })
    }
}

impl ToElement for TestActionCondition {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        match self.outcome {
            ConditionOutcome::Result(ref result) => e.push_value("result", result),
            ConditionOutcome::TestAction(ref reference) => {
                e.add_child(reference.to_element("test_action_ref"))
            }
        }
        push_wrapped(&mut e, "artifact_refs", "artifact_ref", &self.artifact_refs);
        e
    }
}

/// Condition matching one of several choices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceCondition {
    /// Choice ids that match
    pub choice_refs: Vec<String>,
    /// What a match yields
    pub condition: TestActionCondition,
}

impl FromElement for ChoiceCondition {
    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            choice_refs: at_least_one(element, "choice_ref", element.child_values("choice_ref")?)?,
            condition: TestActionCondition::from_element(element)?,
        })
    }
}

impl ToElement for ChoiceCondition {
    fn to_element(&self, name: &str) -> Element {
        let mut e = self.condition.to_element(name);
        e.push_values("choice_ref", &self.choice_refs);
        e
    }
}

/// Condition matching numeric answers equal to one of several values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EqualsCondition {
    /// Values that match
    pub values: Vec<f64>,
    /// Variable receiving the answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub var_ref: Option<String>,
    /// What a match yields
    pub condition: TestActionCondition,
}

impl FromElement for EqualsCondition {
    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            values: at_least_one(element, "value", element.child_values("value")?)?,
            var_ref: element.attr_value("var_ref")?,
            condition: TestActionCondition::from_element(element)?,
        })
    }
}

impl ToElement for EqualsCondition {
    fn to_element(&self, name: &str) -> Element {
        let mut e = self.condition.to_element(name);
        e.set_opt_attr("var_ref", &self.var_ref);
        e.push_values("value", &self.values);
        e
    }
}

/// One end of a numeric range
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RangeBound {
    /// Bound value
    pub value: f64,
    /// Whether the bound itself is inside the range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusive: Option<bool>,
    /// Variable supplying the bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub var_ref: Option<String>,
}

impl RangeBound {
    /// `inclusive` settled onto its zero value
    pub fn inclusive(&self) -> bool {
        settle(self.inclusive)
    }

    /// True when `x` is on the inner side of this bound
    fn admits(&self, x: f64, lower: bool) -> bool {
        match (lower, self.inclusive()) {
            (true, true) => x >= self.value,
            (true, false) => x > self.value,
            (false, true) => x <= self.value,
            (false, false) => x < self.value,
        }
    }
}

impl FromElement for RangeBound {
    fn from_element(element: &Element) -> Result<Self> {
        let overlay = AttributeOverlay::new(element);
        Ok(Self {
            value: element.text_value()?,
            inclusive: overlay.shadow("inclusive")?,
            var_ref: element.attr_value("var_ref")?,
        })
    }
}

impl ToElement for RangeBound {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.set_opt_attr("inclusive", &self.inclusive);
        e.set_opt_attr("var_ref", &self.var_ref);
        if let Some(text) = self.value.to_xml_text() {
            e.set_text(text);
        }
        e
    }
}

/// Numeric range with optional ends
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValueRange {
    /// Lower bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<RangeBound>,
    /// Upper bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<RangeBound>,
}

impl ValueRange {
    /// True when `x` lies inside the range; a missing end is unbounded
    pub fn contains(&self, x: f64) -> bool {
        self.min.as_ref().map_or(true, |b| b.admits(x, true))
            && self.max.as_ref().map_or(true, |b| b.admits(x, false))
    }
}

impl FromElement for ValueRange {
    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            min: decode_opt(element, "min")?,
            max: decode_opt(element, "max")?,
        })
    }
}

impl ToElement for ValueRange {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        push_opt(&mut e, "min", &self.min);
        push_opt(&mut e, "max", &self.max);
        e
    }
}

/// Condition matching numeric answers inside one of several ranges
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeCondition {
    /// Ranges that match
    pub ranges: Vec<ValueRange>,
    /// What a match yields
    pub condition: TestActionCondition,
}

impl FromElement for RangeCondition {
    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            ranges: at_least_one(element, "range", decode_all(element, "range")?)?,
            condition: TestActionCondition::from_element(element)?,
        })
    }
}

impl ToElement for RangeCondition {
    fn to_element(&self, name: &str) -> Element {
        let mut e = self.condition.to_element(name);
        push_all(&mut e, "range", &self.ranges);
        e
    }
}

/// Regular expression an answer is matched against
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatternMatch {
    /// Pattern text
    pub value: String,
    /// Variable receiving the answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub var_ref: Option<String>,
}

impl PatternMatch {
    /// Compile the pattern
    pub fn regex(&self) -> Result<Regex> {
        Regex::new(&self.value).map_err(|e| {
            Error::format(format!("not a valid pattern: {}", e), &self.value).with_field("pattern")
        })
    }

    /// True when the pattern matches somewhere in `answer`
    pub fn is_match(&self, answer: &str) -> Result<bool> {
        Ok(self.regex()?.is_match(answer))
    }
}

impl FromElement for PatternMatch {
    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            value: element.text_value()?,
            var_ref: element.attr_value("var_ref")?,
        })
    }
}

impl ToElement for PatternMatch {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.set_opt_attr("var_ref", &self.var_ref);
        e.set_text(self.value.clone());
        e
    }
}

/// Condition matching string answers against patterns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternCondition {
    /// Patterns that match
    pub patterns: Vec<PatternMatch>,
    /// What a match yields
    pub condition: TestActionCondition,
}

impl FromElement for PatternCondition {
    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            patterns: at_least_one(element, "pattern", decode_all(element, "pattern")?)?,
            condition: TestActionCondition::from_element(element)?,
        })
    }
}

impl PatternCondition {
    /// True when any of the patterns matches `answer`
    pub fn matches(&self, answer: &str) -> Result<bool> {
        for pattern in &self.patterns {
            if pattern.is_match(answer)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl ToElement for PatternCondition {
    fn to_element(&self, name: &str) -> Element {
        let mut e = self.condition.to_element(name);
        push_all(&mut e, "pattern", &self.patterns);
        e
    }
}

fn at_least_one<T>(element: &Element, name: &str, items: Vec<T>) -> Result<Vec<T>> {
    if items.is_empty() {
        return Err(Error::Missing(format!(
            "element <{}> in <{}>",
            name,
            element.local_name()
        )));
    }
    Ok(items)
}

// =============================================================================
// Test actions
// =============================================================================

/// Test action combining other test actions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompoundTestAction {
    /// Test action id
    pub id: String,
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
    /// Combined test actions
    pub actions: Operation,
    /// Free-form notes
    pub notes: Vec<String>,
}

impl FromElement for CompoundTestAction {
    fn from_element(element: &Element) -> Result<Self> {
        let overlay = AttributeOverlay::new(element);
        Ok(Self {
            id: element.required_attr("id")?,
            revision: overlay.shadow("revision")?,
            title: decode_opt(element, "title")?,
            description: decode_opt(element, "description")?,
            references: decode_wrapped(element, "references", "reference")?,
            actions: decode_required(element, "actions")?,
            notes: element.child_values("notes")?,
        })
    }
}

impl ToElement for CompoundTestAction {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.set_attr("id", &self.id);
        e.set_opt_attr("revision", &self.revision);
        e.push_values("notes", &self.notes);
        push_opt(&mut e, "title", &self.title);
        push_opt(&mut e, "description", &self.description);
        push_wrapped(&mut e, "references", "reference", &self.references);
        e.add_child(self.actions.to_element("actions"));
        e
    }
}

/// Answer conditions specific to each question type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestActionKind {
    /// `boolean_question_test_action`
    Boolean {
        /// Taken when the answer is true
        when_true: TestActionCondition,
        /// Taken when the answer is false
        when_false: TestActionCondition,
    },
    /// `choice_question_test_action`
    Choice {
        /// Taken when one of the listed choices is selected
        when_choice: Vec<ChoiceCondition>,
    },
    /// `numeric_question_test_action`
    Numeric {
        /// Taken when the answer equals a listed value
        when_equals: Vec<EqualsCondition>,
        /// Taken when the answer lies in a listed range
        when_range: Vec<RangeCondition>,
    },
    /// `string_question_test_action`
    String {
        /// Taken when the answer matches a pattern
        when_pattern: Vec<PatternCondition>,
    },
}

impl TestActionKind {
    /// Element name of the group member
    pub fn element_name(&self) -> &'static str {
        match self {
            TestActionKind::Boolean { .. } => "boolean_question_test_action",
            TestActionKind::Choice { .. } => "choice_question_test_action",
            TestActionKind::Numeric { .. } => "numeric_question_test_action",
            TestActionKind::String { .. } => "string_question_test_action",
        }
    }

    fn decode(element: &Element) -> Option<Result<Self>> {
        let kind = match element.local_name() {
            "boolean_question_test_action" => Self::decode_boolean(element),
            "choice_question_test_action" => decode_all(element, "when_choice")
                .map(|when_choice| TestActionKind::Choice { when_choice }),
            "numeric_question_test_action" => Self::decode_numeric(element),
            "string_question_test_action" => decode_all(element, "when_pattern")
                .map(|when_pattern| TestActionKind::String { when_pattern }),
            _ => return None,
        };
        Some(kind)
    }

    fn decode_boolean(element: &Element) -> Result<Self> {
        Ok(TestActionKind::Boolean {
            when_true: decode_required(element, "when_true")?,
            when_false: decode_required(element, "when_false")?,
        })
    }

    fn decode_numeric(element: &Element) -> Result<Self> {
        Ok(TestActionKind::Numeric {
            when_equals: decode_all(element, "when_equals")?,
            when_range: decode_all(element, "when_range")?,
        })
    }

    fn encode_into(&self, e: &mut Element) {
        match self {
            TestActionKind::Boolean {
                when_true,
                when_false,
            } => {
                e.add_child(when_true.to_element("when_true"));
                e.add_child(when_false.to_element("when_false"));
            }
            TestActionKind::Choice { when_choice } => push_all(e, "when_choice", when_choice),
            TestActionKind::Numeric {
                when_equals,
                when_range,
            } => {
                push_all(e, "when_equals", when_equals);
                push_all(e, "when_range", when_range);
            }
            TestActionKind::String { when_pattern } => push_all(e, "when_pattern", when_pattern),
        }
    }
}

/// Test action that evaluates the answer to one question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionTestAction {
    /// Test action id
    pub id: String,
    /// Question whose answer is evaluated
    pub question_ref: String,
    /// Revision number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Text>,
    /// Taken when the user does not know the answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when_unknown: Option<TestActionCondition>,
    /// Taken when the question was not asked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when_not_tested: Option<TestActionCondition>,
    /// Taken when the question does not apply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when_not_applicable: Option<TestActionCondition>,
    /// Taken when evaluation fails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when_error: Option<TestActionCondition>,
    /// Free-form notes
    pub notes: Vec<String>,
    /// Answer conditions of the concrete member
    pub kind: TestActionKind,
}

impl QuestionTestAction {
    /// `revision` settled onto its zero value
    pub fn revision(&self) -> u32 {
        settle(self.revision)
    }

    fn decode(element: &Element) -> Option<Result<Self>> {
        let kind = TestActionKind::decode(element)?;
        Some(kind.and_then(|kind| {
            let overlay = AttributeOverlay::new(element);
            Ok(Self {
                id: element.required_attr("id")?,
                question_ref: element.required_attr("question_ref")?,
                revision: overlay.shadow("revision")?,
                title: decode_opt(element, "title")?,
                when_unknown: decode_opt(element, "when_unknown")?,
                when_not_tested: decode_opt(element, "when_not_tested")?,
                when_not_applicable: decode_opt(element, "when_not_applicable")?,
                when_error: decode_opt(element, "when_error")?,
                notes: element.child_values("notes")?,
                kind,
            })
        }))
    }

    fn encode(&self) -> Element {
        let mut e = ocil_element(self.kind.element_name());
        e.set_attr("id", &self.id);
        e.set_attr("question_ref", &self.question_ref);
        e.set_opt_attr("revision", &self.revision);
        e.push_values("notes", &self.notes);
        push_opt(&mut e, "title", &self.title);
        push_opt(&mut e, "when_unknown", &self.when_unknown);
        push_opt(&mut e, "when_not_tested", &self.when_not_tested);
        push_opt(&mut e, "when_not_applicable", &self.when_not_applicable);
        push_opt(&mut e, "when_error", &self.when_error);
        self.kind.encode_into(&mut e);
        e
    }
}

/// Member of the `test_action` substitution group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TestAction {
    /// `compound_test_action`
    Compound(CompoundTestAction),
    /// One of the four question test actions
    Question(QuestionTestAction),
}

impl TestAction {
    /// Test action id
    pub fn id(&self) -> &str {
        match self {
            TestAction::Compound(c) => &c.id,
            TestAction::Question(q) => &q.id,
        }
    }

    /// Element name of the group member
    pub fn element_name(&self) -> &'static str {
        match self {
            TestAction::Compound(_) => "compound_test_action",
            TestAction::Question(q) => q.kind.element_name(),
        }
    }

    /// Decode any member of the group; `None` for elements outside it
    pub fn decode(element: &Element) -> Option<Result<Self>> {
        if element.local_name() == "compound_test_action" {
            return Some(CompoundTestAction::from_element(element).map(TestAction::Compound));
        }
        QuestionTestAction::decode(element).map(|r| r.map(TestAction::Question))
    }

    /// Encode under the member's own element name
    pub fn encode(&self) -> Element {
        match self {
            TestAction::Compound(c) => c.to_element("compound_test_action"),
            TestAction::Question(q) => q.encode(),
        }
    }
}

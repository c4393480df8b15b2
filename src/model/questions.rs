//! Questions, instructions and choice groups

use super::{
    decode_all, decode_opt, ocil_element, push_all, push_opt, unexpected_child, FromElement,
    ToElement,
};
use crate::codecs::{settle, AttributeOverlay};
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::model::common::{BooleanQuestionModel, Reference, Text};
use serde::Serialize;

/// Question prompt with variable substitutions.
///
/// The prompt is mixed content; the text runs are joined with one space
/// where a `<sub>` stood, and the `<sub>` elements are kept in order after
/// the text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuestionText {
    /// Prompt text
    pub value: String,
    /// Variables substituted into the prompt, by id
    pub subs: Vec<String>,
}

impl FromElement for QuestionText {
    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            value: element.text_value()?,
            subs: element
                .children_named("sub")
                .map(|sub| sub.required_attr("var_ref"))
                .collect::<Result<_>>()?,
        })
    }
}

impl ToElement for QuestionText {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        if !self.value.is_empty() {
            e.set_text(self.value.clone());
        }
        for var_ref in &self.subs {
            let mut sub = e.new_child("sub");
            sub.set_attr("var_ref", var_ref);
            e.add_child(sub);
        }
        e
    }
}

/// One step of the instructions, possibly with sub-steps
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Step {
    /// What to do
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Text>,
    /// External references
    pub references: Vec<Reference>,
    /// Nested steps
    pub steps: Vec<Step>,
    /// The step has been carried out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_done: Option<bool>,
    /// The step must be carried out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,
}

impl Step {
    /// `is_done` settled onto its zero value
    pub fn is_done(&self) -> bool {
        settle(self.is_done)
    }

    /// `is_required` settled onto its zero value
    pub fn is_required(&self) -> bool {
        settle(self.is_required)
    }
}

impl FromElement for Step {
    fn from_element(element: &Element) -> Result<Self> {
        let overlay = AttributeOverlay::new(element);
        Ok(Self {
            description: decode_opt(element, "description")?,
            references: decode_all(element, "reference")?,
            steps: decode_all(element, "step")?,
            is_done: overlay.shadow("is_done")?,
            is_required: overlay.shadow("is_required")?,
        })
    }
}

impl ToElement for Step {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.set_opt_attr("is_done", &self.is_done);
        e.set_opt_attr("is_required", &self.is_required);
        push_opt(&mut e, "description", &self.description);
        push_all(&mut e, "reference", &self.references);
        push_all(&mut e, "step", &self.steps);
        e
    }
}

/// How to find the answer to a question
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Instructions {
    /// Heading
    pub title: Text,
    /// Steps in order
    pub steps: Vec<Step>,
}

impl FromElement for Instructions {
    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            title: super::decode_required(element, "title")?,
            steps: decode_all(element, "step")?,
        })
    }
}

impl ToElement for Instructions {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.add_child(self.title.to_element("title"));
        push_all(&mut e, "step", &self.steps);
        e
    }
}

/// A selectable answer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Choice {
    /// Choice id
    pub id: String,
    /// Label shown to the user
    pub value: String,
    /// Variable the label is taken from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub var_ref: Option<String>,
}

impl FromElement for Choice {
    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            id: element.required_attr("id")?,
            value: element.text_value()?,
            var_ref: element.attr_value("var_ref")?,
        })
    }
}

impl ToElement for Choice {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.set_attr("id", &self.id);
        e.set_opt_attr("var_ref", &self.var_ref);
        if !self.value.is_empty() {
            e.set_text(self.value.clone());
        }
        e
    }
}

/// Choices shared by several choice questions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChoiceGroup {
    /// Group id
    pub id: String,
    /// Choices in the group, at least one
    pub choices: Vec<Choice>,
}

impl FromElement for ChoiceGroup {
    fn from_element(element: &Element) -> Result<Self> {
        let choices: Vec<Choice> = decode_all(element, "choice")?;
        if choices.is_empty() {
            return Err(Error::Missing(format!(
                "element <choice> in <{}>",
                element.local_name()
            )));
        }
        Ok(Self {
            id: element.required_attr("id")?,
            choices,
        })
    }
}

impl ToElement for ChoiceGroup {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.set_attr("id", &self.id);
        push_all(&mut e, "choice", &self.choices);
        e
    }
}

// =============================================================================
// Questions
// =============================================================================

/// Fields every question carries
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuestionCommon {
    /// Question id
    pub id: String,
    /// Revision number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
    /// Prompts, at least one
    pub question_texts: Vec<QuestionText>,
    /// How to find the answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Instructions>,
    /// Free-form notes
    pub notes: Vec<String>,
}

impl QuestionCommon {
    /// `revision` settled onto its zero value
    pub fn revision(&self) -> u32 {
        settle(self.revision)
    }

    fn decode(element: &Element) -> Result<Self> {
        let overlay = AttributeOverlay::new(element);
        let question_texts: Vec<QuestionText> = decode_all(element, "question_text")?;
        if question_texts.is_empty() {
            return Err(Error::Missing(format!(
                "element <question_text> in <{}>",
                element.local_name()
            )));
        }
        Ok(Self {
            id: element.required_attr("id")?,
            revision: overlay.shadow("revision")?,
            question_texts,
            instructions: decode_opt(element, "instructions")?,
            notes: element.child_values("notes")?,
        })
    }

    fn encode(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.set_attr("id", &self.id);
        e.set_opt_attr("revision", &self.revision);
        e.push_values("notes", &self.notes);
        push_all(&mut e, "question_text", &self.question_texts);
        push_opt(&mut e, "instructions", &self.instructions);
        e
    }
}

/// Yes/no or true/false question
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BooleanQuestion {
    /// Shared question fields
    #[serde(flatten)]
    pub common: QuestionCommon,
    /// Preselected answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_answer: Option<bool>,
    /// Answer labels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<BooleanQuestionModel>,
}

impl BooleanQuestion {
    /// `default_answer` settled onto its zero value
    pub fn default_answer(&self) -> bool {
        settle(self.default_answer)
    }

    /// Answer labels in effect; yes/no when absent
    pub fn model(&self) -> BooleanQuestionModel {
        self.model.unwrap_or(BooleanQuestionModel::YesNo)
    }
}

/// Question answered by picking a choice
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChoiceQuestion {
    /// Shared question fields
    #[serde(flatten)]
    pub common: QuestionCommon,
    /// Preselected choice id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_answer_ref: Option<String>,
    /// Choices declared inline
    pub choices: Vec<Choice>,
    /// Choice groups pulled in by id
    pub choice_group_refs: Vec<String>,
}

/// Question answered with a number
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NumericQuestion {
    /// Shared question fields
    #[serde(flatten)]
    pub common: QuestionCommon,
    /// Preselected answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_answer: Option<f64>,
}

/// Question answered with free text
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StringQuestion {
    /// Shared question fields
    #[serde(flatten)]
    pub common: QuestionCommon,
    /// Preselected answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_answer: Option<String>,
}

/// Member of the `question` substitution group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Question {
    /// `boolean_question`
    Boolean(BooleanQuestion),
    /// `choice_question`
    Choice(ChoiceQuestion),
    /// `numeric_question`
    Numeric(NumericQuestion),
    /// `string_question`
    String(StringQuestion),
}

impl Question {
    /// Shared question fields
    pub fn common(&self) -> &QuestionCommon {
        match self {
            Question::Boolean(q) => &q.common,
            Question::Choice(q) => &q.common,
            Question::Numeric(q) => &q.common,
            Question::String(q) => &q.common,
        }
    }

    /// Question id
    pub fn id(&self) -> &str {
        &self.common().id
    }

    /// Element name of the group member
    pub fn element_name(&self) -> &'static str {
        match self {
            Question::Boolean(_) => "boolean_question",
            Question::Choice(_) => "choice_question",
            Question::Numeric(_) => "numeric_question",
            Question::String(_) => "string_question",
        }
    }

    /// Decode any member of the group; `None` for elements outside it
    pub fn decode(element: &Element) -> Option<Result<Self>> {
        let question = match element.local_name() {
            "boolean_question" => Self::decode_boolean(element),
            "choice_question" => Self::decode_choice(element),
            "numeric_question" => Self::decode_numeric(element),
            "string_question" => Self::decode_string(element),
            _ => return None,
        };
        Some(question)
    }

    fn decode_boolean(element: &Element) -> Result<Self> {
        let overlay = AttributeOverlay::new(element);
        Ok(Question::Boolean(BooleanQuestion {
            common: QuestionCommon::decode(element)?,
            default_answer: overlay.shadow("default_answer")?,
            model: element.attr_value("model")?,
        }))
    }

    fn decode_choice(element: &Element) -> Result<Self> {
        Ok(Question::Choice(ChoiceQuestion {
            common: QuestionCommon::decode(element)?,
            default_answer_ref: element.attr_value("default_answer_ref")?,
            choices: decode_all(element, "choice")?,
            choice_group_refs: element.child_values("choice_group_ref")?,
        }))
    }

    fn decode_numeric(element: &Element) -> Result<Self> {
        Ok(Question::Numeric(NumericQuestion {
            common: QuestionCommon::decode(element)?,
            default_answer: element.attr_value("default_answer")?,
        }))
    }

    fn decode_string(element: &Element) -> Result<Self> {
        Ok(Question::String(StringQuestion {
            common: QuestionCommon::decode(element)?,
            default_answer: element.attr_value("default_answer")?,
        }))
    }

    /// Encode under the member's own element name
    pub fn encode(&self) -> Element {
        let mut e = self.common().encode(self.element_name());
        match self {
            Question::Boolean(q) => {
                e.set_opt_attr("default_answer", &q.default_answer);
                e.set_opt_attr("model", &q.model);
            }
            Question::Choice(q) => {
                e.set_opt_attr("default_answer_ref", &q.default_answer_ref);
                push_all(&mut e, "choice", &q.choices);
                e.push_values("choice_group_ref", &q.choice_group_refs);
            }
            Question::Numeric(q) => e.set_opt_attr("default_answer", &q.default_answer),
            Question::String(q) => e.set_opt_attr("default_answer", &q.default_answer),
        }
        e
    }
}

/// Contents of the `<questions>` section
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Questions {
    /// Questions of every kind, in document order
    pub questions: Vec<Question>,
    /// Shared choice groups
    pub choice_groups: Vec<ChoiceGroup>,
}

impl Questions {
    /// Find a choice group by id
    pub fn choice_group(&self, id: &str) -> Option<&ChoiceGroup> {
        self.choice_groups.iter().find(|g| g.id == id)
    }

    /// Every choice a question offers: inline choices first, then the
    /// members of referenced groups. Unknown group ids contribute nothing.
    pub fn choices_for<'a>(&'a self, question: &'a ChoiceQuestion) -> Vec<&'a Choice> {
        let grouped = question
            .choice_group_refs
            .iter()
            .filter_map(|id| self.choice_group(id))
            .flat_map(|group| group.choices.iter());
        question.choices.iter().chain(grouped).collect()
    }
}

impl FromElement for Questions {
    fn from_element(element: &Element) -> Result<Self> {
        let mut questions = Self::default();
        for child in &element.children {
            if child.is_named("choice_group") {
                questions.choice_groups.push(ChoiceGroup::from_element(child)?);
                continue;
            }
            let member = if child.is_ocil() { Question::decode(child) } else { None };
            match member {
                Some(question) => questions.questions.push(question?),
                None => return Err(unexpected_child(child, element)),
            }
        }
        Ok(questions)
    }
}

impl ToElement for Questions {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        for question in &self.questions {
            e.add_child(question.encode());
        }
        push_all(&mut e, "choice_group", &self.choice_groups);
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
    fn test_boolean_question() {
        let e = element(
            r#"<boolean_question id="q:1" model="MODEL_TRUE_FALSE" default_answer="0">
                 <question_text>Is the firewall enabled on <sub var_ref="v:host"/>?</question_text>
               </boolean_question>"#,
        );
        let question = Question::decode(&e).unwrap().unwrap();
        let Question::Boolean(q) = &question else {
            panic!("expected a boolean question");
        };
        assert_eq!(q.model(), BooleanQuestionModel::TrueFalse);
        assert_eq!(q.default_answer, Some(false));
        assert!(!q.default_answer());
        assert_eq!(q.common.question_texts[0].subs, ["v:host"]);
        assert!(q.common.question_texts[0].value.starts_with("Is the firewall"));

        assert_eq!(Question::decode(&question.encode()).unwrap().unwrap(), question);
    }

    #[test]
    fn test_question_text_with_text_around_sub() {
        let e = element(
            r#"<question_text>Is the <sub var_ref="v:1"/> service enabled?</question_text>"#,
        );
        let text = QuestionText::from_element(&e).unwrap();
        assert_eq!(text.value, "Is the service enabled?");
        assert_eq!(text.subs, ["v:1"]);

        let again = QuestionText::from_element(&text.to_element("question_text")).unwrap();
        assert_eq!(again, text);
    }

    #[test]
    fn test_foreign_members_are_not_questions() {
        let e = element(
            r#"<questions xmlns:v="urn:vendor"><v:boolean_question id="q"><question_text>x</question_text></v:boolean_question></questions>"#,
        );
        match Questions::from_element(&e) {
            Err(Error::UnexpectedElement(what)) => assert!(what.contains("urn:vendor")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_boolean_question_defaults() {
        let e = element(r#"<boolean_question id="q:1"><question_text>ok?</question_text></boolean_question>"#);
        let Question::Boolean(q) = Question::decode(&e).unwrap().unwrap() else {
            panic!("expected a boolean question");
        };
        assert_eq!(q.default_answer, None);
        assert_eq!(q.model, None);
        assert_eq!(q.model(), BooleanQuestionModel::YesNo);

        let encoded = Question::Boolean(q).encode();
        assert!(encoded.get_attribute("default_answer").is_none());
        assert!(encoded.get_attribute("model").is_none());
    }

    #[test]
    fn test_instructions_nest() {
        let e = element(
            r#"<instructions>
                 <title>Check the settings</title>
                 <step is_required="true">
                   <description>Open the console</description>
                   <step is_done="1"><description>Log in</description></step>
                 </step>
               </instructions>"#,
        );
        let instructions = Instructions::from_element(&e).unwrap();
        assert_eq!(instructions.title.value, "Check the settings");
        let step = &instructions.steps[0];
        assert!(step.is_required());
        assert_eq!(step.is_done, None);
        assert!(step.steps[0].is_done());
        assert_eq!(Instructions::from_element(&instructions.to_element("instructions")).unwrap(), instructions);
    }

    #[test]
    fn test_questions_section_with_groups() {
        let e = element(
            r#"<questions>
                 <choice_question id="q:c" default_answer_ref="c:y">
                   <question_text>Pick one</question_text>
                   <choice id="c:x">Other</choice>
                   <choice_group_ref>g:yn</choice_group_ref>
                 </choice_question>
                 <numeric_question id="q:n" default_answer="8"><question_text>Length?</question_text></numeric_question>
                 <string_question id="q:s"><question_text>Name?</question_text></string_question>
                 <choice_group id="g:yn"><choice id="c:y">Yes</choice><choice id="c:n">No</choice></choice_group>
               </questions>"#,
        );
        let questions = Questions::from_element(&e).unwrap();
        assert_eq!(questions.questions.len(), 3);
        assert_eq!(questions.choice_groups.len(), 1);

        let Question::Choice(choice) = &questions.questions[0] else {
            panic!("expected a choice question");
        };
        let ids: Vec<_> = questions.choices_for(choice).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["c:x", "c:y", "c:n"]);

        let Question::Numeric(numeric) = &questions.questions[1] else {
            panic!("expected a numeric question");
        };
        assert_eq!(numeric.default_answer, Some(8.0));

        assert_eq!(Questions::from_element(&questions.to_element("questions")).unwrap(), questions);
    }

    #[test]
    fn test_question_errors() {
        let no_text = element(r#"<string_question id="q"/>"#);
        assert!(matches!(Question::decode(&no_text), Some(Err(Error::Missing(_)))));

        let unknown = element("<questions><date_question id=\"q\"/></questions>");
        assert!(matches!(
            Questions::from_element(&unknown),
            Err(Error::UnexpectedElement(_))
        ));

        let bad_default = element(
            r#"<numeric_question id="q" default_answer="eight"><question_text>n</question_text></numeric_question>"#,
        );
        match Question::decode(&bad_default) {
            Some(Err(Error::Format(e))) => {
                assert_eq!(e.field.as_deref(), Some("numeric_question@default_answer"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

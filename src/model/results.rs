//! Assessment results

use super::{
    decode_group, decode_opt, decode_wrapped, ocil_element, push_opt, push_wrapped,
    FromElement, ToElement,
};
use crate::codecs::XsdDateTime;
use crate::documents::Element;
use crate::error::Result;
use crate::model::artifacts::ArtifactResult;
use crate::model::common::{ResultType, Target, Text, UserResponseType};
use serde::Serialize;

/// Result of one questionnaire
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionnaireResult {
    /// Questionnaire id
    pub questionnaire_ref: String,
    /// Outcome
    pub result: ResultType,
    /// Artifacts supplied for the questionnaire
    pub artifact_results: Vec<ArtifactResult>,
}

impl FromElement for QuestionnaireResult {
    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            questionnaire_ref: element.required_attr("questionnaire_ref")?,
            result: element.required_attr("result")?,
            artifact_results: decode_wrapped(element, "artifact_results", "artifact_result")?,
        })
    }
}

impl ToElement for QuestionnaireResult {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.set_attr("questionnaire_ref", &self.questionnaire_ref);
        e.set_attr("result", &self.result);
        push_wrapped(&mut e, "artifact_results", "artifact_result", &self.artifact_results);
        e
    }
}

/// Result of one test action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestActionResult {
    /// Test action id
    pub test_action_ref: String,
    /// Outcome
    pub result: ResultType,
    /// Artifacts supplied for the test action
    pub artifact_results: Vec<ArtifactResult>,
}

impl FromElement for TestActionResult {
    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            test_action_ref: element.required_attr("test_action_ref")?,
            result: element.required_attr("result")?,
            artifact_results: decode_wrapped(element, "artifact_results", "artifact_result")?,
        })
    }
}

impl ToElement for TestActionResult {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.set_attr("test_action_ref", &self.test_action_ref);
        e.set_attr("result", &self.result);
        push_wrapped(&mut e, "artifact_results", "artifact_result", &self.artifact_results);
        e
    }
}

/// The answer recorded for a question, by question type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "answer", rename_all = "snake_case")]
pub enum AnsweredQuestion {
    /// `boolean_question_result`
    Boolean(Option<bool>),
    /// `choice_question_result`; the inner option is the `choice_ref`
    Choice(Option<Option<String>>),
    /// `numeric_question_result`
    Numeric(Option<f64>),
    /// `string_question_result`
    String(Option<String>),
}

impl AnsweredQuestion {
    /// Element name of the group member
    pub fn element_name(&self) -> &'static str {
        match self {
            AnsweredQuestion::Boolean(_) => "boolean_question_result",
            AnsweredQuestion::Choice(_) => "choice_question_result",
            AnsweredQuestion::Numeric(_) => "numeric_question_result",
            AnsweredQuestion::String(_) => "string_question_result",
        }
    }

    /// True when an answer element is present
    pub fn is_answered(&self) -> bool {
        match self {
            AnsweredQuestion::Boolean(a) => a.is_some(),
            AnsweredQuestion::Choice(a) => a.is_some(),
            AnsweredQuestion::Numeric(a) => a.is_some(),
            AnsweredQuestion::String(a) => a.is_some(),
        }
    }

    fn decode(element: &Element) -> Option<Result<Self>> {
        let answer = match element.local_name() {
            "boolean_question_result" => element.child_value("answer").map(AnsweredQuestion::Boolean),
            "choice_question_result" => element
                .child("answer")
                .map(|answer| answer.attr_value("choice_ref"))
                .transpose()
                .map(AnsweredQuestion::Choice),
            "numeric_question_result" => element.child_value("answer").map(AnsweredQuestion::Numeric),
            "string_question_result" => element.child_value("answer").map(AnsweredQuestion::String),
            _ => return None,
        };
        Some(answer)
    }

    fn encode_into(&self, e: &mut Element) {
        match self {
            AnsweredQuestion::Boolean(answer) => e.push_opt_value("answer", answer),
            AnsweredQuestion::Choice(Some(choice_ref)) => {
                let mut answer = e.new_child("answer");
                answer.set_opt_attr("choice_ref", choice_ref);
                e.add_child(answer);
            }
            AnsweredQuestion::Choice(None) => {}
            AnsweredQuestion::Numeric(answer) => e.push_opt_value("answer", answer),
            AnsweredQuestion::String(answer) => e.push_opt_value("answer", answer),
        }
    }
}

/// Member of the `question_result` substitution group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    /// Question id
    pub question_ref: String,
    /// How the user responded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<UserResponseType>,
    /// The recorded answer
    #[serde(flatten)]
    pub answer: AnsweredQuestion,
}

impl QuestionResult {
    /// Response in effect; ANSWERED when absent
    pub fn response(&self) -> UserResponseType {
        self.response.unwrap_or(UserResponseType::Answered)
    }

    /// Decode any member of the group; `None` for elements outside it
    pub fn decode(element: &Element) -> Option<Result<Self>> {
        let answer = AnsweredQuestion::decode(element)?;
        Some(answer.and_then(|answer| {
            Ok(Self {
                question_ref: element.required_attr("question_ref")?,
                response: element.attr_value("response")?,
                answer,
            })
        }))
    }

    /// Encode under the member's own element name
    pub fn encode(&self) -> Element {
        let mut e = ocil_element(self.answer.element_name());
        e.set_attr("question_ref", &self.question_ref);
        e.set_opt_attr("response", &self.response);
        self.answer.encode_into(&mut e);
        e
    }
}

/// The `<results>` section
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Results {
    /// When the assessment started; the zero value is never written
    pub start_time: XsdDateTime,
    /// When the assessment ended; the zero value is never written
    pub end_time: XsdDateTime,
    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Text>,
    /// Questionnaire outcomes
    pub questionnaire_results: Vec<QuestionnaireResult>,
    /// Test action outcomes
    pub test_action_results: Vec<TestActionResult>,
    /// Recorded answers
    pub question_results: Vec<QuestionResult>,
    /// Supplied artifacts
    pub artifact_results: Vec<ArtifactResult>,
    /// Users and systems assessed
    pub targets: Vec<Target>,
}

impl Results {
    /// Answer recorded for a question
    pub fn question_result(&self, question_ref: &str) -> Option<&QuestionResult> {
        self.question_results
            .iter()
            .find(|r| r.question_ref == question_ref)
    }

    /// Outcome recorded for a questionnaire
    pub fn questionnaire_result(&self, questionnaire_ref: &str) -> Option<ResultType> {
        self.questionnaire_results
            .iter()
            .find(|r| r.questionnaire_ref == questionnaire_ref)
            .map(|r| r.result)
    }
}

impl FromElement for Results {
    fn from_element(element: &Element) -> Result<Self> {
        let question_results = match element.child("question_results") {
            Some(container) => decode_group(container, QuestionResult::decode)?,
            None => Vec::new(),
        };
        let targets = match element.child("targets") {
            Some(container) => decode_group(container, Target::decode)?,
            None => Vec::new(),
        };
        Ok(Self {
            start_time: element.attr_value("start_time")?.unwrap_or_default(),
            end_time: element.attr_value("end_time")?.unwrap_or_default(),
            title: decode_opt(element, "title")?,
            questionnaire_results: decode_wrapped(
                element,
                "questionnaire_results",
                "questionnaire_result",
            )?,
            test_action_results: decode_wrapped(element, "test_action_results", "test_action_result")?,
            question_results,
            artifact_results: decode_wrapped(element, "artifact_results", "artifact_result")?,
            targets,
        })
    }
}

impl ToElement for Results {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        e.set_attr("start_time", &self.start_time);
        e.set_attr("end_time", &self.end_time);
        push_opt(&mut e, "title", &self.title);
        push_wrapped(
            &mut e,
            "questionnaire_results",
            "questionnaire_result",
            &self.questionnaire_results,
        );
        push_wrapped(&mut e, "test_action_results", "test_action_result", &self.test_action_results);
        if !self.question_results.is_empty() {
            let mut container = e.new_child("question_results");
            for result in &self.question_results {
                container.add_child(result.encode());
            }
            e.add_child(container);
        }
        push_wrapped(&mut e, "artifact_results", "artifact_result", &self.artifact_results);
        if !self.targets.is_empty() {
            let mut container = e.new_child("targets");
            for target in &self.targets {
                container.add_child(target.encode());
            }
            e.add_child(container);
        }
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;
    use crate::error::Error;

    fn element(xml: &str) -> Element {
        Document::from_string(xml).unwrap().root.unwrap()
    }

    #[test]
    fn test_question_results() {
        let e = element(
            r#"<results start_time="2024-03-05T12:00:00" end_time="2024-03-05T12:30:00Z">
                 <questionnaire_results>
                   <questionnaire_result questionnaire_ref="qn:1" result="PASS"/>
                 </questionnaire_results>
                 <question_results>
                   <boolean_question_result question_ref="q:b"><answer>true</answer></boolean_question_result>
                   <choice_question_result question_ref="q:c" response="ANSWERED"><answer choice_ref="c:y"/></choice_question_result>
                   <numeric_question_result question_ref="q:n" response="UNKNOWN"/>
                   <string_question_result question_ref="q:s"><answer>root</answer></string_question_result>
                 </question_results>
                 <targets><system><name>db01</name></system></targets>
               </results>"#,
        );
        let results = Results::from_element(&e).unwrap();
        assert_eq!(results.questionnaire_result("qn:1"), Some(ResultType::Pass));
        assert_eq!(results.question_results.len(), 4);

        let boolean = results.question_result("q:b").unwrap();
        assert_eq!(boolean.answer, AnsweredQuestion::Boolean(Some(true)));
        assert_eq!(boolean.response, None);
        assert_eq!(boolean.response(), UserResponseType::Answered);

        let choice = results.question_result("q:c").unwrap();
        assert_eq!(
            choice.answer,
            AnsweredQuestion::Choice(Some(Some("c:y".to_string())))
        );

        let numeric = results.question_result("q:n").unwrap();
        assert!(!numeric.answer.is_answered());
        assert_eq!(numeric.response(), UserResponseType::Unknown);

        assert_eq!(results.targets.len(), 1);
        assert_eq!(
            results.end_time,
            XsdDateTime::parse("2024-03-05T12:30:00").unwrap()
        );

        assert_eq!(Results::from_element(&results.to_element("results")).unwrap(), results);
    }

    #[test]
    fn test_zero_times_are_not_written() {
        let results = Results::default();
        let e = results.to_element("results");
        assert!(e.attributes.is_empty());
        assert!(e.children.is_empty());

        let reread = Results::from_element(&e).unwrap();
        assert!(reread.start_time.is_zero());
        assert!(reread.end_time.is_zero());
    }

    #[test]
    fn test_bad_result_token() {
        let e = element(
            r#"<results><test_action_results><test_action_result test_action_ref="t" result="MAYBE"/></test_action_results></results>"#,
        );
        match Results::from_element(&e) {
            Err(Error::Format(err)) => {
                assert_eq!(err.field.as_deref(), Some("test_action_result@result"));
                assert_eq!(err.text.as_deref(), Some("MAYBE"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_question_result_member() {
        let e = element(
            r#"<results><question_results><date_question_result question_ref="q"/></question_results></results>"#,
        );
        assert!(matches!(
            Results::from_element(&e),
            Err(Error::UnexpectedElement(_))
        ));
    }
}

//! Variables and the set expressions that assign local variables

use super::{decode_opt, ocil_element, push_opt, set_xsi_type, xsi_type, FromElement, ToElement};
use crate::codecs::{settle, AttributeOverlay};
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::model::common::{Text, VariableDataType};
use serde::Serialize;

/// Condition under which a local variable takes its value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SetExpressionKind {
    /// `SetExpressionBooleanType`: the boolean answer equals `value`
    Boolean {
        /// Answer to match
        value: bool,
    },
    /// `SetExpressionChoiceType`: the given choice was selected
    Choice {
        /// Choice to match
        choice_ref: String,
    },
    /// `SetExpressionPatternType`: the string answer matches
    Pattern {
        /// Pattern to match
        pattern: String,
    },
    /// `SetExpressionRangeType`: the numeric answer lies in `[min, max]`
    Range {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
}

impl SetExpressionKind {
    /// Schema type name written to `xsi:type`
    pub fn type_name(&self) -> &'static str {
        match self {
            SetExpressionKind::Boolean { .. } => "SetExpressionBooleanType",
            SetExpressionKind::Choice { .. } => "SetExpressionChoiceType",
            SetExpressionKind::Pattern { .. } => "SetExpressionPatternType",
            SetExpressionKind::Range { .. } => "SetExpressionRangeType",
        }
    }
}

/// Value assigned to a local variable when its condition holds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetExpression {
    /// Value assigned
    pub value: String,
    /// Condition, selected by `xsi:type`
    pub kind: SetExpressionKind,
}

impl FromElement for SetExpression {
    fn from_element(element: &Element) -> Result<Self> {
        let type_name = xsi_type(element).ok_or_else(|| {
            Error::Missing(format!("attribute 'xsi:type' on <{}>", element.local_name()))
        })?;
        let kind = match type_name {
            "SetExpressionBooleanType" => SetExpressionKind::Boolean {
                value: element.required_attr("value")?,
            },
            "SetExpressionChoiceType" => SetExpressionKind::Choice {
                choice_ref: element.required_attr("choice_ref")?,
            },
            "SetExpressionPatternType" => SetExpressionKind::Pattern {
                pattern: element.required_attr("pattern")?,
            },
            "SetExpressionRangeType" => SetExpressionKind::Range {
                min: element.required_attr("min")?,
                max: element.required_attr("max")?,
            },
            other => {
                return Err(Error::UnexpectedElement(format!(
                    "xsi:type '{}' on <{}>",
                    other,
                    element.local_name()
                )))
            }
        };
        Ok(Self {
            value: element.required_child_value("value")?,
            kind,
        })
    }
}

impl ToElement for SetExpression {
    fn to_element(&self, name: &str) -> Element {
        let mut e = ocil_element(name);
        set_xsi_type(&mut e, self.kind.type_name());
        match self.kind {
            SetExpressionKind::Boolean { ref value } => e.set_attr("value", value),
            SetExpressionKind::Choice { ref choice_ref } => e.set_attr("choice_ref", choice_ref),
            SetExpressionKind::Pattern { ref pattern } => e.set_attr("pattern", pattern),
            SetExpressionKind::Range { ref min, ref max } => {
                e.set_attr("min", min);
                e.set_attr("max", max);
            }
        }
        e.push_value("value", &self.value);
        e
    }
}

/// Fields every variable carries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableCommon {
    /// Variable id
    pub id: String,
    /// Data type of the value
    pub datatype: VariableDataType,
    /// Revision number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Text>,
    /// Free-form notes
    pub notes: Vec<String>,
}

impl VariableCommon {
    /// `revision` settled onto its zero value
    pub fn revision(&self) -> u32 {
        settle(self.revision)
    }
}

/// Where a variable gets its value from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VariableKind {
    /// `constant_variable`: a fixed value
    Constant {
        /// The value
        value: String,
    },
    /// `local_variable`: derived from the answer to a question
    Local {
        /// Question whose answer is used
        question_ref: String,
        /// Mapping from answer to value
        #[serde(skip_serializing_if = "Option::is_none")]
        set: Option<SetExpression>,
    },
    /// `external_variable`: supplied by the evaluating tool
    External,
}

impl VariableKind {
    /// Element name of the group member
    pub fn element_name(&self) -> &'static str {
        match self {
            VariableKind::Constant { .. } => "constant_variable",
            VariableKind::Local { .. } => "local_variable",
            VariableKind::External => "external_variable",
        }
    }
}

/// Member of the `variable` substitution group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    /// Shared variable fields
    #[serde(flatten)]
    pub common: VariableCommon,
    /// Member-specific fields
    #[serde(flatten)]
    pub kind: VariableKind,
}

impl Variable {
    /// Variable id
    pub fn id(&self) -> &str {
        &self.common.id
    }

    /// Decode any member of the group; `None` for elements outside it
    pub fn decode(element: &Element) -> Option<Result<Self>> {
        let kind = match element.local_name() {
            "constant_variable" => element
                .required_child_value("value")
                .map(|value| VariableKind::Constant { value }),
            "local_variable" => Self::decode_local(element),
            "external_variable" => Ok(VariableKind::External),
            _ => return None,
        };
        Some(kind.and_then(|kind| {
            let overlay = AttributeOverlay::new(element);
            Ok(Self {
                common: VariableCommon {
                    id: element.required_attr("id")?,
                    datatype: element.required_attr("datatype")?,
                    revision: overlay.shadow("revision")?,
                    description: decode_opt(element, "description")?,
                    notes: element.child_values("notes")?,
                },
                kind,
            })
        }))
    }

    fn decode_local(element: &Element) -> Result<VariableKind> {
        Ok(VariableKind::Local {
            question_ref: element.required_attr("question_ref")?,
            set: decode_opt(element, "set")?,
        })
    }

    /// Encode under the member's own element name
    pub fn encode(&self) -> Element {
        let mut e = ocil_element(self.kind.element_name());
        e.set_attr("id", &self.common.id);
        e.set_attr("datatype", &self.common.datatype);
        e.set_opt_attr("revision", &self.common.revision);
        e.push_values("notes", &self.common.notes);
        push_opt(&mut e, "description", &self.common.description);
        match self.kind {
            VariableKind::Constant { ref value } => e.push_value("value", value),
            VariableKind::Local {
                ref question_ref,
                ref set,
            } => {
                e.set_attr("question_ref", question_ref);
                push_opt(&mut e, "set", set);
            }
            VariableKind::External => {}
        }
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

    fn decode(xml: &str) -> Result<Variable> {
        Variable::decode(&element(xml)).unwrap()
    }

    #[test]
    fn test_constant_and_external() {
        let constant = decode(
            r#"<constant_variable id="v:min" datatype="NUMERIC"><value>8</value></constant_variable>"#,
        )
        .unwrap();
        assert_eq!(constant.id(), "v:min");
        assert_eq!(constant.common.datatype, VariableDataType::Numeric);
        assert_eq!(constant.kind, VariableKind::Constant { value: "8".to_string() });
        assert_eq!(Variable::decode(&constant.encode()).unwrap().unwrap(), constant);

        let external = decode(
            r#"<external_variable id="v:host" datatype="TEXT" revision="1"><description>Host name</description></external_variable>"#,
        )
        .unwrap();
        assert_eq!(external.kind, VariableKind::External);
        assert_eq!(external.common.revision(), 1);
        assert_eq!(Variable::decode(&external.encode()).unwrap().unwrap(), external);
    }

    #[test]
    fn test_local_variable_set_expressions() {
        let local = decode(
            r#"<local_variable xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
                   id="v:len" datatype="NUMERIC" question_ref="q:len">
                 <set xsi:type="SetExpressionRangeType" min="8" max="64"><value>ok</value></set>
               </local_variable>"#,
        )
        .unwrap();
        match &local.kind {
            VariableKind::Local { question_ref, set: Some(set) } => {
                assert_eq!(question_ref, "q:len");
                assert_eq!(set.value, "ok");
                assert_eq!(set.kind, SetExpressionKind::Range { min: 8.0, max: 64.0 });
            }
            other => panic!("unexpected kind: {other:?}"),
        }
        assert_eq!(Variable::decode(&local.encode()).unwrap().unwrap(), local);
    }

    #[test]
    fn test_set_expression_errors() {
        let missing_type = element(r#"<set value="true"><value>x</value></set>"#);
        assert!(matches!(
            SetExpression::from_element(&missing_type),
            Err(Error::Missing(_))
        ));

        let bad_bool = element(
            r#"<set xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
                    xsi:type="SetExpressionBooleanType" value="yes"><value>x</value></set>"#,
        );
        match SetExpression::from_element(&bad_bool) {
            Err(Error::Format(e)) => assert_eq!(e.field.as_deref(), Some("set@value")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_variable_errors() {
        assert!(Variable::decode(&element("<question/>")).is_none());
        assert!(matches!(
            decode(r#"<constant_variable id="v" datatype="DATE"><value>1</value></constant_variable>"#),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            decode(r#"<constant_variable id="v" datatype="TEXT"/>"#),
            Err(Error::Missing(_))
        ));
    }
}

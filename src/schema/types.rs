//! Submission and study config type definitions
//!
//! Answer shapes:
//! - string, number, boolean, or ordered list
//! - stored as JSON text, parsed back using the stored response type

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{SchemaError, SchemaResult, ValidationDetails};

/// Fixed enumeration of response type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Text,
    Number,
    Boolean,
    Scale,
    MultipleChoice,
    Checkbox,
}

impl ResponseType {
    pub const ALL: [ResponseType; 6] = [
        ResponseType::Text,
        ResponseType::Number,
        ResponseType::Boolean,
        ResponseType::Scale,
        ResponseType::MultipleChoice,
        ResponseType::Checkbox,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Text => "text",
            ResponseType::Number => "number",
            ResponseType::Boolean => "boolean",
            ResponseType::Scale => "scale",
            ResponseType::MultipleChoice => "multiple_choice",
            ResponseType::Checkbox => "checkbox",
        }
    }

    /// Answer shape this type expects when a study config is in force
    pub fn expected_shape(&self) -> &'static str {
        match self {
            ResponseType::Text | ResponseType::MultipleChoice => "string",
            ResponseType::Number | ResponseType::Scale => "number",
            ResponseType::Boolean => "boolean",
            ResponseType::Checkbox => "list",
        }
    }

    /// Returns true if the answer's runtime shape fits this type
    pub fn accepts(&self, answer: &Answer) -> bool {
        self.expected_shape() == answer.shape()
    }

    fn is_choice(&self) -> bool {
        matches!(self, ResponseType::MultipleChoice | ResponseType::Checkbox)
    }

    /// Comma separated list of every tag, for error messages
    pub fn enumeration() -> String {
        Self::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown response type '{}'", s))
    }
}

/// Polymorphic answer value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Boolean(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<Value>),
}

impl Answer {
    /// Builds an answer from a JSON value; `None` for null and objects
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Answer::Boolean(*b)),
            Value::Number(n) => Some(Answer::Number(n.clone())),
            Value::String(s) => Some(Answer::Text(s.clone())),
            Value::Array(items) => Some(Answer::List(items.clone())),
            Value::Null | Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Answer::Boolean(b) => Value::Bool(*b),
            Answer::Number(n) => Value::Number(n.clone()),
            Answer::Text(s) => Value::String(s.clone()),
            Answer::List(items) => Value::Array(items.clone()),
        }
    }

    /// Storage form: JSON text
    pub fn to_stored(&self) -> String {
        self.to_json().to_string()
    }

    /// Parses the storage form back.
    ///
    /// Text answers written as bare strings are accepted as-is.
    pub fn from_stored(stored: &str, response_type: ResponseType) -> Result<Self, String> {
        match serde_json::from_str::<Value>(stored) {
            Ok(value) => Answer::from_json(&value)
                .ok_or_else(|| format!("stored answer has unsupported shape: {}", stored)),
            Err(_) if response_type == ResponseType::Text => Ok(Answer::Text(stored.to_string())),
            Err(e) => Err(format!("stored {} answer is not valid JSON: {}", response_type, e)),
        }
    }

    /// Single spreadsheet cell form; lists are JSON-stringified
    pub fn to_cell(&self) -> String {
        match self {
            Answer::Boolean(b) => b.to_string(),
            Answer::Number(n) => n.to_string(),
            Answer::Text(s) => s.clone(),
            Answer::List(_) => self.to_stored(),
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Answer::Boolean(_) => "boolean",
            Answer::Number(_) => "number",
            Answer::Text(_) => "string",
            Answer::List(_) => "list",
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Answer::Text(s) => s.trim().is_empty(),
            Answer::List(items) => items.is_empty(),
            _ => false,
        }
    }
}

/// Lifecycle status of a survey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyStatus {
    InProgress,
    #[default]
    Completed,
    Abandoned,
}

impl SurveyStatus {
    pub const ALL: [SurveyStatus; 3] = [
        SurveyStatus::InProgress,
        SurveyStatus::Completed,
        SurveyStatus::Abandoned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SurveyStatus::InProgress => "in_progress",
            SurveyStatus::Completed => "completed",
            SurveyStatus::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for SurveyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SurveyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown survey status '{}'", s))
    }
}

/// One validated response entry
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedResponse {
    pub question_id: u32,
    pub question: String,
    pub answer: Answer,
    pub response_type: ResponseType,
}

/// A submission that passed validation.
///
/// Responses are sorted by question id.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveySubmission {
    pub patient_id: String,
    pub study_id: String,
    pub responses: Vec<SubmittedResponse>,
    /// Parsed `metadata.completedAt`
    pub completed_at: Option<DateTime<Utc>>,
    /// Metadata object as submitted
    pub metadata: Map<String, Value>,
    pub status: SurveyStatus,
}

/// Per-question constraints from a study config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// Conditional visibility hint. Not enforced server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependsOn {
    pub question_id: u32,
    pub value: Value,
}

fn default_required() -> bool {
    true
}

/// One question of a study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDef {
    pub id: u32,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: ResponseType,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<QuestionConstraints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<DependsOn>,
}

impl QuestionDef {
    /// Checks an answer against type, required flag and constraints.
    pub(crate) fn check_answer(&self, answer: &Answer, path: &str, out: &mut Vec<ValidationDetails>) {
        if !self.question_type.accepts(answer) {
            out.push(ValidationDetails::type_mismatch(
                path,
                format!("{} answer for {} question", self.question_type.expected_shape(), self.question_type),
                answer.shape(),
            ));
            return;
        }

        if self.required && answer.is_empty() {
            out.push(ValidationDetails::new(path, "answer to required question", "empty answer"));
            return;
        }

        let Some(constraints) = &self.constraints else {
            return;
        };

        match answer {
            Answer::Number(n) => {
                let value = n.as_f64().unwrap_or(f64::NAN);
                if let Some(min) = constraints.min {
                    if value < min {
                        out.push(ValidationDetails::new(path, format!("value >= {}", min), n.to_string()));
                    }
                }
                if let Some(max) = constraints.max {
                    if value > max {
                        out.push(ValidationDetails::new(path, format!("value <= {}", max), n.to_string()));
                    }
                }
            }
            Answer::Text(s) => {
                if let Some(max_length) = constraints.max_length {
                    let len = s.chars().count();
                    if len > max_length {
                        out.push(ValidationDetails::new(
                            path,
                            format!("at most {} characters", max_length),
                            format!("{} characters", len),
                        ));
                    }
                }
                if let Some(options) = &constraints.options {
                    if !options.iter().any(|o| o == s) {
                        out.push(ValidationDetails::new(path, "one of the configured options", format!("'{}'", s)));
                    }
                }
            }
            Answer::List(items) => {
                if let Some(options) = &constraints.options {
                    for (i, item) in items.iter().enumerate() {
                        let known = item.as_str().map(|s| options.iter().any(|o| o == s)).unwrap_or(false);
                        if !known {
                            out.push(ValidationDetails::new(
                                format!("{}[{}]", path, i),
                                "one of the configured options",
                                item.to_string(),
                            ));
                        }
                    }
                }
            }
            Answer::Boolean(_) => {}
        }
    }
}

fn default_allow_resubmission() -> bool {
    true
}

/// Study-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_timeout_minutes: Option<u32>,
    #[serde(default = "default_allow_resubmission")]
    pub allow_resubmission: bool,
}

impl Default for StudySettings {
    fn default() -> Self {
        Self {
            session_timeout_minutes: None,
            allow_resubmission: default_allow_resubmission(),
        }
    }
}

/// Question list and settings for one study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyConfig {
    pub study_id: String,
    pub questions: Vec<QuestionDef>,
    #[serde(default)]
    pub settings: StudySettings,
}

impl StudyConfig {
    pub fn new(study_id: impl Into<String>, questions: Vec<QuestionDef>) -> Self {
        Self {
            study_id: study_id.into(),
            questions,
            settings: StudySettings::default(),
        }
    }

    /// Number of responses a submission for this study must carry
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn question(&self, id: u32) -> Option<&QuestionDef> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Validates the config itself (not a submission)
    pub fn validate_structure(&self) -> SchemaResult<()> {
        let mut issues = Vec::new();

        if self.study_id.trim().is_empty() {
            issues.push(ValidationDetails::empty_string("studyId"));
        }
        if self.questions.is_empty() {
            issues.push(ValidationDetails::new("questions", "at least one question", "empty list"));
        }

        let mut seen = HashSet::new();
        for (i, question) in self.questions.iter().enumerate() {
            let path = format!("questions[{}]", i);
            let expected_id = (i + 1) as u32;
            if question.id != expected_id {
                issues.push(ValidationDetails::new(
                    format!("{}.id", path),
                    format!("id {}", expected_id),
                    question.id.to_string(),
                ));
            }
            seen.insert(question.id);

            if let Some(dep) = &question.depends_on {
                if dep.question_id == question.id || !seen.contains(&dep.question_id) {
                    issues.push(ValidationDetails::new(
                        format!("{}.dependsOn.questionId", path),
                        "an earlier question id",
                        dep.question_id.to_string(),
                    ));
                }
            }

            let constraints = question.constraints.clone().unwrap_or_default();
            if let (Some(min), Some(max)) = (constraints.min, constraints.max) {
                if min > max {
                    issues.push(ValidationDetails::new(
                        format!("{}.constraints", path),
                        "min <= max",
                        format!("min {} > max {}", min, max),
                    ));
                }
            }
            if question.question_type.is_choice()
                && constraints.options.as_ref().map_or(true, |o| o.is_empty())
            {
                issues.push(ValidationDetails::new(
                    format!("{}.constraints.options", path),
                    format!("non-empty options for {} question", question.question_type),
                    "no options",
                ));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::invalid_study_config(&self.study_id, issues))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(id: u32, question_type: ResponseType) -> QuestionDef {
        QuestionDef {
            id,
            text: format!("Question {}", id),
            question_type,
            required: true,
            constraints: None,
            depends_on: None,
        }
    }

    #[test]
    fn test_response_type_round_trip_names() {
        for t in ResponseType::ALL {
            assert_eq!(t.as_str().parse::<ResponseType>().unwrap(), t);
        }
        assert!("slider".parse::<ResponseType>().is_err());
        assert_eq!(serde_json::to_value(ResponseType::MultipleChoice).unwrap(), json!("multiple_choice"));
    }

    #[test]
    fn test_answer_from_json_rejects_null_and_objects() {
        assert!(Answer::from_json(&Value::Null).is_none());
        assert!(Answer::from_json(&json!({"a": 1})).is_none());
        assert_eq!(Answer::from_json(&json!(3)).unwrap().shape(), "number");
        assert_eq!(Answer::from_json(&json!(["a"])).unwrap().shape(), "list");
    }

    #[test]
    fn test_answer_stored_form_keeps_shape() {
        let list = Answer::List(vec![json!("a"), json!("b")]);
        assert_eq!(list.to_stored(), r#"["a","b"]"#);
        assert_eq!(Answer::from_stored(r#"["a","b"]"#, ResponseType::Checkbox).unwrap(), list);
        assert_eq!(
            Answer::from_stored("7", ResponseType::Scale).unwrap(),
            Answer::Number(serde_json::Number::from(7))
        );
    }

    #[test]
    fn test_bare_text_is_read_as_text() {
        assert_eq!(
            Answer::from_stored("plain words", ResponseType::Text).unwrap(),
            Answer::Text("plain words".into())
        );
        assert!(Answer::from_stored("plain words", ResponseType::Number).is_err());
    }

    #[test]
    fn test_answer_cells() {
        assert_eq!(Answer::Boolean(true).to_cell(), "true");
        assert_eq!(Answer::Text("x".into()).to_cell(), "x");
        assert_eq!(Answer::List(vec![json!("a"), json!("b")]).to_cell(), r#"["a","b"]"#);
    }

    #[test]
    fn test_status_default_is_completed() {
        assert_eq!(SurveyStatus::default(), SurveyStatus::Completed);
        assert_eq!("abandoned".parse::<SurveyStatus>().unwrap(), SurveyStatus::Abandoned);
    }

    #[test]
    fn test_study_config_structure_valid() {
        let config = StudyConfig::new(
            "S1",
            vec![question(1, ResponseType::Text), question(2, ResponseType::Boolean)],
        );
        assert!(config.validate_structure().is_ok());
        assert_eq!(config.question_count(), 2);
        assert!(config.settings.allow_resubmission);
    }

    #[test]
    fn test_study_config_collects_every_issue() {
        let mut q2 = question(3, ResponseType::Checkbox);
        q2.depends_on = Some(DependsOn {
            question_id: 9,
            value: json!(true),
        });
        let config = StudyConfig::new("S1", vec![question(1, ResponseType::Text), q2]);

        let err = config.validate_structure().unwrap_err();
        assert!(err.has_field("questions[1].id"));
        assert!(err.has_field("questions[1].dependsOn.questionId"));
        assert!(err.has_field("questions[1].constraints.options"));
    }

    #[test]
    fn test_study_config_json_shape() {
        let config: StudyConfig = serde_json::from_value(json!({
            "studyId": "S9",
            "questions": [
                {"id": 1, "text": "Pain level", "type": "scale", "constraints": {"min": 0, "max": 10}},
                {"id": 2, "text": "Notes", "type": "text", "required": false,
                 "dependsOn": {"questionId": 1, "value": 10}}
            ],
            "settings": {"allowResubmission": false, "sessionTimeoutMinutes": 30}
        }))
        .unwrap();

        assert!(config.validate_structure().is_ok());
        assert!(!config.settings.allow_resubmission);
        assert!(!config.questions[1].required);
        assert_eq!(config.questions[0].constraints.as_ref().unwrap().max, Some(10.0));
    }

    #[test]
    fn test_question_constraints_checked() {
        let mut q = question(1, ResponseType::Scale);
        q.constraints = Some(QuestionConstraints {
            min: Some(1.0),
            max: Some(5.0),
            ..Default::default()
        });

        let mut out = Vec::new();
        q.check_answer(&Answer::Number(serde_json::Number::from(9)), "responses[0].answer", &mut out);
        assert_eq!(out.len(), 1);
        assert!(out[0].expected.contains("<= 5"));

        out.clear();
        q.check_answer(&Answer::Text("9".into()), "responses[0].answer", &mut out);
        assert_eq!(out[0].actual, "string");
    }
}

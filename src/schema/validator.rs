//! Submission validator
//!
//! Validation semantics:
//! - patientId and studyId are non-empty strings
//! - responses holds exactly N entries, question ids unique and in [1, N]
//! - every answer is non-null and a string, number, boolean or list
//! - responseType is drawn from the fixed enumeration
//! - metadata.completedAt parses as an RFC 3339 date-time
//!
//! Every violation is reported, not only the first. The validator has no
//! side effects and never touches storage.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::errors::{SchemaError, SchemaResult, ValidationDetails};
use super::types::{
    Answer, ResponseType, StudyConfig, SubmittedResponse, SurveyStatus, SurveySubmission,
};

/// Question count used when a study has no registered config
pub const DEFAULT_QUESTION_COUNT: usize = 20;

/// Validates raw submission payloads.
///
/// Without a study config the contract is a fixed question count. With one,
/// the count comes from the config's question list and each answer is also
/// checked against its question definition.
pub struct SubmissionValidator<'a> {
    question_count: usize,
    study: Option<&'a StudyConfig>,
}

impl<'a> SubmissionValidator<'a> {
    /// Creates a validator for a fixed question count.
    pub fn new(question_count: usize) -> Self {
        Self {
            question_count,
            study: None,
        }
    }

    /// Creates a validator driven by a study's question list.
    pub fn for_study(config: &'a StudyConfig) -> Self {
        Self {
            question_count: config.question_count(),
            study: Some(config),
        }
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    /// Validates a submission payload.
    ///
    /// # Errors
    ///
    /// Returns `SURVEY_VALIDATION_FAILED` listing every failing field.
    pub fn validate(&self, payload: &Value) -> SchemaResult<SurveySubmission> {
        let obj = payload.as_object().ok_or_else(|| {
            SchemaError::validation_failed(vec![ValidationDetails::type_mismatch(
                "$root",
                "object",
                json_type_name(payload),
            )])
        })?;

        let mut issues = Vec::new();

        let patient_id = required_string(obj, "patientId", "patientId", &mut issues);
        let study_id = required_string(obj, "studyId", "studyId", &mut issues);

        if let (Some(config), Some(study_id)) = (self.study, study_id.as_deref()) {
            if config.study_id != study_id {
                issues.push(ValidationDetails::new(
                    "studyId",
                    format!("'{}'", config.study_id),
                    format!("'{}'", study_id),
                ));
            }
        }

        let responses = self.validate_responses(obj.get("responses"), &mut issues);
        let (completed_at, metadata) = validate_metadata(obj.get("metadata"), &mut issues);
        let status = validate_status(obj.get("status"), &mut issues);

        match (patient_id, study_id, responses) {
            (Some(patient_id), Some(study_id), Some(mut responses)) if issues.is_empty() => {
                responses.sort_by_key(|r| r.question_id);
                Ok(SurveySubmission {
                    patient_id,
                    study_id,
                    responses,
                    completed_at,
                    metadata,
                    status,
                })
            }
            _ => Err(SchemaError::validation_failed(issues)),
        }
    }

    fn validate_responses(
        &self,
        value: Option<&Value>,
        issues: &mut Vec<ValidationDetails>,
    ) -> Option<Vec<SubmittedResponse>> {
        let entries = match value {
            None => {
                issues.push(ValidationDetails::missing_field("responses"));
                return None;
            }
            Some(Value::Null) => {
                issues.push(ValidationDetails::null_value("responses"));
                return None;
            }
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                issues.push(ValidationDetails::type_mismatch("responses", "list", json_type_name(other)));
                return None;
            }
        };

        if entries.len() != self.question_count {
            issues.push(ValidationDetails::new(
                "responses",
                format!("exactly {} entries", self.question_count),
                format!("{} entries", entries.len()),
            ));
        }

        let mut first_seen: HashMap<u32, usize> = HashMap::new();
        let mut responses = Vec::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            let path = format!("responses[{}]", i);
            let Some(entry) = entry.as_object() else {
                issues.push(ValidationDetails::type_mismatch(&path, "object", json_type_name(entry)));
                continue;
            };

            let question_id = self.validate_question_id(entry, &path, i, &mut first_seen, issues);
            let question = required_string(entry, "question", &format!("{}.question", path), issues);
            let answer = validate_answer(entry.get("answer"), &format!("{}.answer", path), issues);
            let response_type =
                validate_response_type(entry.get("responseType"), &format!("{}.responseType", path), issues);

            if let (Some(question_id), Some(question), Some(answer), Some(response_type)) =
                (question_id, question, answer, response_type)
            {
                if let Some(def) = self.study.and_then(|config| config.question(question_id)) {
                    if def.question_type != response_type {
                        issues.push(ValidationDetails::new(
                            format!("{}.responseType", path),
                            format!("'{}' as configured for question {}", def.question_type, question_id),
                            format!("'{}'", response_type),
                        ));
                        continue;
                    }
                    def.check_answer(&answer, &format!("{}.answer", path), issues);
                }

                responses.push(SubmittedResponse {
                    question_id,
                    question,
                    answer,
                    response_type,
                });
            }
        }

        Some(responses)
    }

    fn validate_question_id(
        &self,
        entry: &Map<String, Value>,
        path: &str,
        index: usize,
        first_seen: &mut HashMap<u32, usize>,
        issues: &mut Vec<ValidationDetails>,
    ) -> Option<u32> {
        let field = format!("{}.questionId", path);
        let value = match entry.get("questionId") {
            None => {
                issues.push(ValidationDetails::missing_field(field));
                return None;
            }
            Some(value) => value,
        };

        let in_range = value
            .as_u64()
            .filter(|id| *id >= 1 && *id <= self.question_count as u64)
            .map(|id| id as u32);

        let Some(question_id) = in_range else {
            issues.push(ValidationDetails::new(
                field,
                format!("integer in [1, {}]", self.question_count),
                value.to_string(),
            ));
            return None;
        };

        if let Some(previous) = first_seen.get(&question_id) {
            issues.push(ValidationDetails::new(
                field,
                "unique question id",
                format!("duplicate of responses[{}]", previous),
            ));
            return None;
        }
        first_seen.insert(question_id, index);

        Some(question_id)
    }
}

/// Reads a required non-empty string field, reporting under `path`.
fn required_string(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    issues: &mut Vec<ValidationDetails>,
) -> Option<String> {
    match obj.get(key) {
        None => issues.push(ValidationDetails::missing_field(path)),
        Some(Value::Null) => issues.push(ValidationDetails::null_value(path)),
        Some(Value::String(s)) if s.trim().is_empty() => issues.push(ValidationDetails::empty_string(path)),
        Some(Value::String(s)) => return Some(s.clone()),
        Some(other) => issues.push(ValidationDetails::type_mismatch(path, "string", json_type_name(other))),
    }
    None
}

fn validate_answer(value: Option<&Value>, path: &str, issues: &mut Vec<ValidationDetails>) -> Option<Answer> {
    match value {
        None => {
            issues.push(ValidationDetails::missing_field(path));
            None
        }
        Some(Value::Null) => {
            issues.push(ValidationDetails::null_value(path));
            None
        }
        Some(value) => {
            let answer = Answer::from_json(value);
            if answer.is_none() {
                issues.push(ValidationDetails::type_mismatch(
                    path,
                    "string, number, boolean or list",
                    json_type_name(value),
                ));
            }
            answer
        }
    }
}

fn validate_response_type(
    value: Option<&Value>,
    path: &str,
    issues: &mut Vec<ValidationDetails>,
) -> Option<ResponseType> {
    match value {
        None => {
            issues.push(ValidationDetails::missing_field(path));
            None
        }
        Some(Value::String(tag)) => match tag.parse::<ResponseType>() {
            Ok(response_type) => Some(response_type),
            Err(_) => {
                issues.push(ValidationDetails::new(
                    path,
                    format!("one of [{}]", ResponseType::enumeration()),
                    format!("'{}'", tag),
                ));
                None
            }
        },
        Some(other) => {
            issues.push(ValidationDetails::type_mismatch(path, "string", json_type_name(other)));
            None
        }
    }
}

fn validate_metadata(
    value: Option<&Value>,
    issues: &mut Vec<ValidationDetails>,
) -> (Option<DateTime<Utc>>, Map<String, Value>) {
    let metadata = match value {
        None | Some(Value::Null) => return (None, Map::new()),
        Some(Value::Object(map)) => map,
        Some(other) => {
            issues.push(ValidationDetails::type_mismatch("metadata", "object", json_type_name(other)));
            return (None, Map::new());
        }
    };

    let completed_at = match metadata.get("completedAt") {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => match DateTime::parse_from_rfc3339(raw) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(_) => {
                issues.push(ValidationDetails::new(
                    "metadata.completedAt",
                    "RFC 3339 date-time",
                    format!("'{}'", raw),
                ));
                None
            }
        },
        Some(other) => {
            issues.push(ValidationDetails::type_mismatch(
                "metadata.completedAt",
                "date-time string",
                json_type_name(other),
            ));
            None
        }
    };

    for key in ["deviceInfo", "location"] {
        if let Some(value) = metadata.get(key) {
            if !value.is_string() {
                issues.push(ValidationDetails::type_mismatch(
                    format!("metadata.{}", key),
                    "string",
                    json_type_name(value),
                ));
            }
        }
    }

    (completed_at, metadata.clone())
}

fn validate_status(value: Option<&Value>, issues: &mut Vec<ValidationDetails>) -> SurveyStatus {
    match value {
        None | Some(Value::Null) => SurveyStatus::default(),
        Some(Value::String(raw)) => raw.parse().unwrap_or_else(|_| {
            issues.push(ValidationDetails::new(
                "status",
                "one of [in_progress, completed, abandoned]",
                format!("'{}'", raw),
            ));
            SurveyStatus::default()
        }),
        Some(other) => {
            issues.push(ValidationDetails::type_mismatch("status", "string", json_type_name(other)));
            SurveyStatus::default()
        }
    }
}

/// Returns the JSON type name for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{QuestionConstraints, QuestionDef};
    use serde_json::json;

    fn responses(count: u32) -> Vec<Value> {
        (1..=count)
            .map(|id| {
                json!({
                    "questionId": id,
                    "question": format!("Question {}", id),
                    "answer": "fine",
                    "responseType": "text"
                })
            })
            .collect()
    }

    fn payload(count: u32) -> Value {
        json!({
            "patientId": "P1",
            "studyId": "S1",
            "responses": responses(count)
        })
    }

    #[test]
    fn test_valid_submission_passes() {
        let validator = SubmissionValidator::new(DEFAULT_QUESTION_COUNT);
        let submission = validator.validate(&payload(20)).unwrap();

        assert_eq!(submission.patient_id, "P1");
        assert_eq!(submission.responses.len(), 20);
        assert_eq!(submission.status, SurveyStatus::Completed);
        assert!(submission.completed_at.is_none());
    }

    #[test]
    fn test_responses_sorted_by_question_id() {
        let mut body = payload(20);
        body["responses"].as_array_mut().unwrap().reverse();

        let submission = SubmissionValidator::new(20).validate(&body).unwrap();
        let ids: Vec<u32> = submission.responses.iter().map(|r| r.question_id).collect();
        assert_eq!(ids, (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_wrong_count_fails() {
        let validator = SubmissionValidator::new(20);
        for count in [19, 21] {
            let err = validator.validate(&payload(count)).unwrap_err();
            assert_eq!(err.code().code(), "SURVEY_VALIDATION_FAILED");
            assert!(err.has_field("responses"));
        }
    }

    #[test]
    fn test_duplicate_question_id_fails() {
        let mut body = payload(20);
        body["responses"][5]["questionId"] = json!(3);

        let err = SubmissionValidator::new(20).validate(&body).unwrap_err();
        assert!(err.has_field("responses[5].questionId"));
        assert!(err.details()[0].actual.contains("responses[2]"));
    }

    #[test]
    fn test_reports_every_failing_field() {
        let mut body = payload(20);
        body["patientId"] = json!("");
        body.as_object_mut().unwrap().remove("studyId");
        body["responses"][0]["answer"] = Value::Null;
        body["responses"][1]["responseType"] = json!("slider");
        body["responses"][2]["questionId"] = json!(0);
        body["responses"][3].as_object_mut().unwrap().remove("question");
        body["metadata"] = json!({"completedAt": "yesterday", "deviceInfo": 5});

        let err = SubmissionValidator::new(20).validate(&body).unwrap_err();
        for field in [
            "patientId",
            "studyId",
            "responses[0].answer",
            "responses[1].responseType",
            "responses[2].questionId",
            "responses[3].question",
            "metadata.completedAt",
            "metadata.deviceInfo",
        ] {
            assert!(err.has_field(field), "missing detail for {}", field);
        }
    }

    #[test]
    fn test_object_answer_rejected() {
        let mut body = payload(20);
        body["responses"][4]["answer"] = json!({"nested": true});

        let err = SubmissionValidator::new(20).validate(&body).unwrap_err();
        assert!(err.has_field("responses[4].answer"));
    }

    #[test]
    fn test_non_object_root_rejected() {
        let err = SubmissionValidator::new(20).validate(&json!([1, 2])).unwrap_err();
        assert!(err.has_field("$root"));
    }

    #[test]
    fn test_metadata_parsed() {
        let mut body = payload(20);
        body["metadata"] = json!({
            "completedAt": "2024-03-01T10:15:00+02:00",
            "deviceInfo": "tablet",
            "clinic": "north"
        });
        body["status"] = json!("abandoned");

        let submission = SubmissionValidator::new(20).validate(&body).unwrap();
        assert_eq!(
            submission.completed_at.unwrap().to_rfc3339(),
            "2024-03-01T08:15:00+00:00"
        );
        assert_eq!(submission.metadata["clinic"], json!("north"));
        assert_eq!(submission.status, SurveyStatus::Abandoned);
    }

    #[test]
    fn test_mixed_answer_shapes_accepted_without_config() {
        let mut body = payload(20);
        body["responses"][0]["answer"] = json!(4);
        body["responses"][1]["answer"] = json!(true);
        body["responses"][2]["answer"] = json!(["a", "b"]);

        assert!(SubmissionValidator::new(20).validate(&body).is_ok());
    }

    #[test]
    fn test_study_config_drives_count_and_types() {
        let config = StudyConfig::new(
            "S1",
            vec![
                QuestionDef {
                    id: 1,
                    text: "Pain".into(),
                    question_type: ResponseType::Scale,
                    required: true,
                    constraints: Some(QuestionConstraints {
                        min: Some(0.0),
                        max: Some(10.0),
                        ..Default::default()
                    }),
                    depends_on: None,
                },
                QuestionDef {
                    id: 2,
                    text: "Smoker".into(),
                    question_type: ResponseType::Boolean,
                    required: true,
                    constraints: None,
                    depends_on: None,
                },
            ],
        );
        let validator = SubmissionValidator::for_study(&config);
        assert_eq!(validator.question_count(), 2);

        let good = json!({
            "patientId": "P1",
            "studyId": "S1",
            "responses": [
                {"questionId": 1, "question": "Pain", "answer": 3, "responseType": "scale"},
                {"questionId": 2, "question": "Smoker", "answer": false, "responseType": "boolean"}
            ]
        });
        assert!(validator.validate(&good).is_ok());

        let bad = json!({
            "patientId": "P1",
            "studyId": "S1",
            "responses": [
                {"questionId": 1, "question": "Pain", "answer": 11, "responseType": "scale"},
                {"questionId": 2, "question": "Smoker", "answer": false, "responseType": "text"}
            ]
        });
        let err = validator.validate(&bad).unwrap_err();
        assert!(err.has_field("responses[0].answer"));
        assert!(err.has_field("responses[1].responseType"));
    }
}

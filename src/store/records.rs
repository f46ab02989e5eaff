//! Row types returned by the store

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use serde::Serialize;
use serde_json::Value;

use crate::schema::{Answer, ResponseType, SurveyStatus};

/// Storage form of every timestamp: RFC 3339, UTC, millisecond precision.
///
/// Fixed width and a `Z` suffix keep lexical and chronological order equal.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Survey header row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyRecord {
    pub id: String,
    pub patient_id: String,
    pub study_id: String,
    pub completed_at: String,
    pub metadata: Value,
    pub created_at: String,
    pub version: i64,
    pub status: SurveyStatus,
}

pub(crate) const SURVEY_COLUMNS: &str =
    "s.id, s.patient_id, s.study_id, s.completed_at, s.metadata, s.created_at, s.version, s.status";

impl SurveyRecord {
    /// Maps the first eight columns laid out as [`SURVEY_COLUMNS`].
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let metadata: String = row.get(4)?;
        let status: String = row.get(7)?;
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            study_id: row.get(2)?,
            completed_at: row.get(3)?,
            metadata: serde_json::from_str(&metadata).map_err(|e| conversion_error(4, e.to_string()))?,
            created_at: row.get(5)?,
            version: row.get(6)?,
            status: status.parse().map_err(|e: String| conversion_error(7, e))?,
        })
    }
}

/// One stored response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRecord {
    pub survey_id: String,
    pub question_id: u32,
    pub question: String,
    pub answer: Answer,
    pub response_type: ResponseType,
}

impl ResponseRecord {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let (answer, response_type) = answer_columns(row, 3, 4)?;
        Ok(Self {
            survey_id: row.get(0)?,
            question_id: row.get(1)?,
            question: row.get(2)?,
            answer,
            response_type,
        })
    }
}

/// Header plus responses ordered by question id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyDetail {
    pub survey: SurveyRecord,
    pub responses: Vec<ResponseRecord>,
}

/// Listing entry annotated with its response count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveySummary {
    #[serde(flatten)]
    pub survey: SurveyRecord,
    pub response_count: i64,
}

/// One page of a study listing.
///
/// `has_more` is true iff the page came back full.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyPage {
    pub surveys: Vec<SurveySummary>,
    pub has_more: bool,
}

/// Denormalized (survey, response) pair used by export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub survey_id: String,
    pub patient_id: String,
    pub study_id: String,
    pub completed_at: String,
    pub status: SurveyStatus,
    pub question_id: u32,
    pub question: String,
    pub answer: Answer,
    pub response_type: ResponseType,
}

impl ExportRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let status: String = row.get(4)?;
        let (answer, response_type) = answer_columns(row, 7, 8)?;
        Ok(Self {
            survey_id: row.get(0)?,
            patient_id: row.get(1)?,
            study_id: row.get(2)?,
            completed_at: row.get(3)?,
            status: status.parse().map_err(|e: String| conversion_error(4, e))?,
            question_id: row.get(5)?,
            question: row.get(6)?,
            answer,
            response_type,
        })
    }
}

/// Raw aggregate counts for one study
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudyCounts {
    pub total_surveys: u64,
    pub unique_patients: u64,
    pub total_responses: u64,
    pub first_survey_at: Option<String>,
    pub last_survey_at: Option<String>,
    pub in_progress: u64,
    pub completed: u64,
    pub abandoned: u64,
}

/// Decodes an answer using the response type stored next to it.
fn answer_columns(row: &Row<'_>, answer_idx: usize, type_idx: usize) -> rusqlite::Result<(Answer, ResponseType)> {
    let raw_type: String = row.get(type_idx)?;
    let response_type: ResponseType = raw_type.parse().map_err(|e: String| conversion_error(type_idx, e))?;
    let stored: String = row.get(answer_idx)?;
    let answer = Answer::from_stored(&stored, response_type).map_err(|e| conversion_error(answer_idx, e))?;
    Ok((answer, response_type))
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

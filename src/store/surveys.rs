//! Survey submission, lookup, listing and deletion

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::debug;
use uuid::Uuid;

use super::errors::{StoreError, StoreResult};
use super::records::{timestamp, ResponseRecord, SurveyDetail, SurveyPage, SurveyRecord, SurveySummary, SURVEY_COLUMNS};
use super::studies::load_study_config;
use super::SurveyStore;
use crate::fault_point::{points, FaultPoints};
use crate::schema::SurveySubmission;

impl SurveyStore {
    /// Writes the survey header and every response as one transaction.
    ///
    /// The new id is returned only after commit. Any failing insert rolls
    /// the whole submission back, header included.
    pub async fn submit(&self, submission: SurveySubmission) -> StoreResult<String> {
        let faults = self.faults.clone();
        self.db
            .call(move |conn| submit_tx(conn, &faults, &submission))
            .await
    }

    /// Fetches a survey and its responses ordered by question id.
    pub async fn get_by_id(&self, survey_id: &str) -> StoreResult<SurveyDetail> {
        let survey_id = survey_id.to_string();
        self.db.call(move |conn| get_by_id_tx(conn, &survey_id)).await
    }

    /// Lists a study's surveys, most recently completed first.
    ///
    /// `page` is 1-based; values below 1 are treated as 1.
    pub async fn list_by_study(&self, study_id: &str, page: u32, page_size: u32) -> StoreResult<SurveyPage> {
        let study_id = study_id.to_string();
        let page = page.max(1);
        self.db
            .call(move |conn| {
                let offset = i64::from(page - 1) * i64::from(page_size);
                let sql = format!(
                    "SELECT {SURVEY_COLUMNS}, \
                       (SELECT COUNT(*) FROM responses r WHERE r.survey_id = s.id) AS response_count \
                     FROM surveys s \
                     WHERE s.study_id = ?1 \
                     ORDER BY s.completed_at DESC, s.created_at DESC, s.id ASC \
                     LIMIT ?2 OFFSET ?3"
                );
                let mut stmt = conn.prepare_cached(&sql)?;
                let surveys = stmt
                    .query_map(params![study_id, i64::from(page_size), offset], |row| {
                        Ok(SurveySummary {
                            survey: SurveyRecord::from_row(row)?,
                            response_count: row.get(8)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                let has_more = page_size > 0 && surveys.len() == page_size as usize;
                Ok(SurveyPage { surveys, has_more })
            })
            .await
    }

    /// Deletes a survey and its responses.
    ///
    /// Responses are removed explicitly before the header so the result does
    /// not depend on foreign-key cascade support. Returns the number of
    /// responses removed.
    pub async fn delete(&self, survey_id: &str) -> StoreResult<usize> {
        let survey_id = survey_id.to_string();
        self.db
            .call(move |conn| {
                let tx = conn.transaction()?;
                let responses = tx.execute("DELETE FROM responses WHERE survey_id = ?1", [&survey_id])?;
                let surveys = tx.execute("DELETE FROM surveys WHERE id = ?1", [&survey_id])?;
                if surveys == 0 {
                    return Err(StoreError::SurveyNotFound(survey_id));
                }
                tx.commit()?;
                Ok(responses)
            })
            .await
    }
}

fn submit_tx(conn: &mut Connection, faults: &FaultPoints, submission: &SurveySubmission) -> StoreResult<String> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let previous_version: i64 = tx.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM surveys WHERE patient_id = ?1 AND study_id = ?2",
        params![submission.patient_id, submission.study_id],
        |row| row.get(0),
    )?;

    if previous_version > 0 {
        let allow_resubmission = load_study_config(&tx, &submission.study_id)?
            .map(|config| config.settings.allow_resubmission)
            .unwrap_or(true);
        if !allow_resubmission {
            return Err(StoreError::ResubmissionRejected {
                patient_id: submission.patient_id.clone(),
                study_id: submission.study_id.clone(),
            });
        }
    }

    let survey_id = Uuid::new_v4().to_string();
    let created_at = timestamp(Utc::now());
    let completed_at = submission
        .completed_at
        .map(timestamp)
        .unwrap_or_else(|| created_at.clone());
    let metadata = serde_json::Value::Object(submission.metadata.clone()).to_string();

    faults.check(points::SURVEY_INSERT)?;
    tx.execute(
        r#"
        INSERT INTO surveys(id, patient_id, study_id, completed_at, metadata, created_at, version, status)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            survey_id,
            submission.patient_id,
            submission.study_id,
            completed_at,
            metadata,
            created_at,
            previous_version + 1,
            submission.status.as_str(),
        ],
    )?;

    {
        let mut stmt = tx.prepare_cached(
            r#"
            INSERT INTO responses(survey_id, question_id, question, answer, response_type)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )?;
        for response in &submission.responses {
            faults.check(points::RESPONSE_INSERT)?;
            stmt.execute(params![
                survey_id,
                response.question_id,
                response.question,
                response.answer.to_stored(),
                response.response_type.as_str(),
            ])?;
        }
    }

    faults.check(points::BEFORE_COMMIT)?;
    tx.commit()?;

    debug!(
        survey_id = %survey_id,
        responses = submission.responses.len(),
        version = previous_version + 1,
        "survey committed"
    );
    Ok(survey_id)
}

fn get_by_id_tx(conn: &mut Connection, survey_id: &str) -> StoreResult<SurveyDetail> {
    let sql = format!("SELECT {SURVEY_COLUMNS} FROM surveys s WHERE s.id = ?1");
    let survey = conn
        .query_row(&sql, [survey_id], SurveyRecord::from_row)
        .optional()?
        .ok_or_else(|| StoreError::SurveyNotFound(survey_id.to_string()))?;

    let mut stmt = conn.prepare_cached(
        r#"
        SELECT survey_id, question_id, question, answer, response_type
        FROM responses
        WHERE survey_id = ?1
        ORDER BY question_id ASC
        "#,
    )?;
    let responses = stmt
        .query_map([survey_id], ResponseRecord::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SurveyDetail { survey, responses })
}

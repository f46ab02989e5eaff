//! Export queries
//!
//! Export is done in two steps so large studies never materialize at once:
//! the ordered survey ids are fetched first, then rows are read in batches
//! of ids. Batch boundaries fall between surveys, so each survey's rows stay
//! contiguous and in question order. A batch larger than
//! `MAX_IDS_PER_QUERY` is read in several queries.

use rusqlite::params_from_iter;

use super::errors::StoreResult;
use super::records::ExportRow;
use super::SurveyStore;

/// Ids bound into one `IN (...)` list, kept under SQLite's variable limit
pub const MAX_IDS_PER_QUERY: usize = 500;

impl SurveyStore {
    /// Survey ids of a study in export order.
    pub async fn export_survey_ids(&self, study_id: &str) -> StoreResult<Vec<String>> {
        let study_id = study_id.to_string();
        self.db
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(
                    r#"
                    SELECT id FROM surveys
                    WHERE study_id = ?1
                    ORDER BY completed_at DESC, created_at DESC, id ASC
                    "#,
                )?;
                let ids = stmt
                    .query_map([&study_id], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(ids)
            })
            .await
    }

    /// Every (survey, response) row for the given surveys.
    ///
    /// `survey_ids` must already be in export order (as returned by
    /// [`Self::export_survey_ids`]); rows keep that order, each survey's
    /// rows in question order.
    pub async fn export_rows(&self, survey_ids: Vec<String>) -> StoreResult<Vec<ExportRow>> {
        if survey_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.db
            .call(move |conn| {
                let mut rows = Vec::new();
                for chunk in survey_ids.chunks(MAX_IDS_PER_QUERY) {
                    let placeholders = vec!["?"; chunk.len()].join(", ");
                    let sql = format!(
                        "SELECT s.id, s.patient_id, s.study_id, s.completed_at, s.status, \
                           r.question_id, r.question, r.answer, r.response_type \
                         FROM surveys s \
                         JOIN responses r ON r.survey_id = s.id \
                         WHERE s.id IN ({placeholders}) \
                         ORDER BY s.completed_at DESC, s.created_at DESC, s.id ASC, r.question_id ASC"
                    );
                    let mut stmt = conn.prepare_cached(&sql)?;
                    let batch = stmt
                        .query_map(params_from_iter(chunk.iter()), ExportRow::from_row)?
                        .collect::<Result<Vec<_>, _>>()?;
                    rows.extend(batch);
                }
                Ok(rows)
            })
            .await
    }

    /// Whole-study export in one call. Intended for small studies and tests.
    pub async fn export_by_study(&self, study_id: &str) -> StoreResult<Vec<ExportRow>> {
        let ids = self.export_survey_ids(study_id).await?;
        self.export_rows(ids).await
    }
}

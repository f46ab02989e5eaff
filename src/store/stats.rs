//! Aggregate count queries feeding study analytics

use rusqlite::params;

use super::errors::StoreResult;
use super::records::StudyCounts;
use super::SurveyStore;

impl SurveyStore {
    /// Raw counts for a study. A study with no surveys yields all zeros.
    pub async fn stats_counts(&self, study_id: &str) -> StoreResult<StudyCounts> {
        let study_id = study_id.to_string();
        self.db
            .call(move |conn| {
                let mut counts = conn.query_row(
                    r#"
                    SELECT
                      COUNT(*),
                      COUNT(DISTINCT patient_id),
                      MIN(completed_at),
                      MAX(completed_at),
                      COALESCE(SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END), 0),
                      COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0),
                      COALESCE(SUM(CASE WHEN status = 'abandoned' THEN 1 ELSE 0 END), 0)
                    FROM surveys
                    WHERE study_id = ?1
                    "#,
                    params![study_id],
                    |row| {
                        Ok(StudyCounts {
                            total_surveys: row.get::<_, i64>(0)? as u64,
                            unique_patients: row.get::<_, i64>(1)? as u64,
                            total_responses: 0,
                            first_survey_at: row.get(2)?,
                            last_survey_at: row.get(3)?,
                            in_progress: row.get::<_, i64>(4)? as u64,
                            completed: row.get::<_, i64>(5)? as u64,
                            abandoned: row.get::<_, i64>(6)? as u64,
                        })
                    },
                )?;

                let total_responses: i64 = conn.query_row(
                    r#"
                    SELECT COUNT(*)
                    FROM responses r
                    JOIN surveys s ON s.id = r.survey_id
                    WHERE s.study_id = ?1
                    "#,
                    params![study_id],
                    |row| row.get(0),
                )?;
                counts.total_responses = total_responses as u64;

                Ok(counts)
            })
            .await
    }
}

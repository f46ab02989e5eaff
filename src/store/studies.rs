//! Study config persistence

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::errors::{StoreError, StoreResult};
use super::records::timestamp;
use super::SurveyStore;
use crate::schema::StudyConfig;

impl SurveyStore {
    /// Inserts or replaces a study's config.
    ///
    /// Callers validate the config structure first.
    pub async fn put_study_config(&self, config: StudyConfig) -> StoreResult<()> {
        self.db
            .call(move |conn| {
                let body = serde_json::to_string(&config).map_err(|e| StoreError::Corrupt(e.to_string()))?;
                conn.execute(
                    r#"
                    INSERT INTO study_configs(study_id, config, updated_at)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(study_id) DO UPDATE SET
                      config = excluded.config,
                      updated_at = excluded.updated_at
                    "#,
                    params![config.study_id, body, timestamp(Utc::now())],
                )?;
                Ok(())
            })
            .await
    }

    pub async fn get_study_config(&self, study_id: &str) -> StoreResult<Option<StudyConfig>> {
        let study_id = study_id.to_string();
        self.db.call(move |conn| load_study_config(conn, &study_id)).await
    }
}

/// Reads a config inside an existing connection or transaction.
pub(crate) fn load_study_config(conn: &Connection, study_id: &str) -> StoreResult<Option<StudyConfig>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT config FROM study_configs WHERE study_id = ?1",
            [study_id],
            |row| row.get(0),
        )
        .optional()?;

    body.map(|body| {
        serde_json::from_str(&body)
            .map_err(|e| StoreError::Corrupt(format!("study config '{}': {}", study_id, e)))
    })
    .transpose()
}

//! Survey Store
//!
//! Persists a survey header and its responses as one unit and serves the
//! read side: lookup, paginated listing, export and aggregate counts.
//!
//! # Guarantees
//!
//! - A submission is all-or-nothing; readers never see a partial response set
//! - The survey id is returned only after commit
//! - Failures are surfaced, never retried here
//!
//! # Usage
//!
//! ```ignore
//! let store = SurveyStore::new(Database::open_in_memory()?);
//! let id = store.submit(submission).await?;
//! let detail = store.get_by_id(&id).await?;
//! ```

mod database;
mod errors;
mod export;
mod records;
mod stats;
mod studies;
mod surveys;

pub use database::{default_database_path, Database};
pub use errors::{StoreError, StoreResult};
pub use export::MAX_IDS_PER_QUERY;
pub use records::{
    timestamp, ExportRow, ResponseRecord, StudyCounts, SurveyDetail, SurveyPage, SurveyRecord, SurveySummary,
};

use crate::fault_point::FaultPoints;

/// Survey store over an injected database handle.
///
/// Cloning is cheap and shares the handle.
#[derive(Debug, Clone)]
pub struct SurveyStore {
    db: Database,
    faults: FaultPoints,
}

impl SurveyStore {
    pub fn new(db: Database) -> Self {
        Self::with_faults(db, FaultPoints::new())
    }

    pub fn with_faults(db: Database, faults: FaultPoints) -> Self {
        Self { db, faults }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Fault points consulted on the submission path
    pub fn faults(&self) -> &FaultPoints {
        &self.faults
    }

    /// Closes the underlying handle.
    pub async fn close(&self) -> StoreResult<()> {
        self.db.close().await
    }
}

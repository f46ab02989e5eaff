//! # Store Errors
//!
//! Error types for the survey store.

use thiserror::Error;

use crate::fault_point::InjectedFault;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Survey store errors
#[derive(Debug, Error)]
pub enum StoreError {
    // ==================
    // Lookup / policy
    // ==================
    /// No survey with this id
    #[error("Survey not found: {0}")]
    SurveyNotFound(String),

    /// Study settings forbid a second submission by the same patient
    #[error("Resubmission not allowed: patient '{patient_id}' already submitted study '{study_id}'")]
    ResubmissionRejected { patient_id: String, study_id: String },

    // ==================
    // Storage failures
    // ==================
    /// SQLite reported an error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A fault point fired
    #[error("Injected fault at '{}' (hit {})", .0.point, .0.hit)]
    Fault(InjectedFault),

    /// A stored value could not be decoded
    #[error("Stored data is malformed: {0}")]
    Corrupt(String),

    /// The database handle was closed
    #[error("Database handle is closed")]
    Closed,

    /// The blocking storage task panicked or was cancelled
    #[error("Storage task failed: {0}")]
    Task(String),

    /// Creating the database directory failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::SurveyNotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::ResubmissionRejected { .. })
    }
}

impl From<InjectedFault> for StoreError {
    fn from(fault: InjectedFault) -> Self {
        StoreError::Fault(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(StoreError::SurveyNotFound("x".into()).is_not_found());
        assert!(StoreError::ResubmissionRejected {
            patient_id: "P1".into(),
            study_id: "S1".into()
        }
        .is_conflict());
        assert!(!StoreError::Closed.is_not_found());
    }

    #[test]
    fn test_fault_display() {
        let err = StoreError::from(InjectedFault {
            point: "response_insert".into(),
            hit: 20,
        });
        assert_eq!(err.to_string(), "Injected fault at 'response_insert' (hit 20)");
    }
}

//! Schema Validator subsystem
//!
//! Submissions are validated before any storage work begins.
//!
//! # Design Principles
//!
//! - Fixed question-count contract, or a study's question list when registered
//! - Every failing field is reported in one pass
//! - No coercion: answers keep the shape they were submitted with
//! - No side effects

mod errors;
mod loader;
mod types;
mod validator;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity, ValidationDetails};
pub use loader::StudyConfigLoader;
pub use types::{
    Answer, DependsOn, QuestionConstraints, QuestionDef, ResponseType, StudyConfig, StudySettings,
    SubmittedResponse, SurveyStatus, SurveySubmission,
};
pub use validator::{SubmissionValidator, DEFAULT_QUESTION_COUNT};

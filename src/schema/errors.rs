//! Schema error types for submission and study config validation
//!
//! Error codes:
//! - SURVEY_VALIDATION_FAILED (REJECT)
//! - STUDY_CONFIG_INVALID (REJECT)
//! - STUDY_CONFIG_MALFORMED (FATAL at boot)

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
    /// Process must not start (config files at boot)
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Submission payload violates the question contract
    SurveyValidationFailed,
    /// Study config is structurally invalid
    StudyConfigInvalid,
    /// Study config file could not be read or parsed
    StudyConfigMalformed,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::SurveyValidationFailed => "SURVEY_VALIDATION_FAILED",
            SchemaErrorCode::StudyConfigInvalid => "STUDY_CONFIG_INVALID",
            SchemaErrorCode::StudyConfigMalformed => "STUDY_CONFIG_MALFORMED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::StudyConfigMalformed => Severity::Fatal,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One failing field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDetails {
    /// Field path (e.g., "responses[3].answer")
    pub field: String,
    /// Expected type or condition
    pub expected: String,
    /// Actual value or type found
    pub actual: String,
}

impl ValidationDetails {
    pub fn new(field: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(field, "field to be present", "missing")
    }

    pub fn type_mismatch(field: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::new(field, expected, actual)
    }

    pub fn null_value(field: impl Into<String>) -> Self {
        Self::new(field, "non-null value", "null")
    }

    pub fn empty_string(field: impl Into<String>) -> Self {
        Self::new(field, "non-empty string", "empty string")
    }
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': expected {}, got {}", self.field, self.expected, self.actual)
    }
}

/// Schema error carrying every failing field
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    details: Vec<ValidationDetails>,
}

impl SchemaError {
    /// Create a submission validation error from the collected details
    pub fn validation_failed(details: Vec<ValidationDetails>) -> Self {
        Self {
            code: SchemaErrorCode::SurveyValidationFailed,
            message: format!("Submission failed validation ({} issue(s))", details.len()),
            details,
        }
    }

    /// Create a study config structure error
    pub fn invalid_study_config(study_id: &str, details: Vec<ValidationDetails>) -> Self {
        Self {
            code: SchemaErrorCode::StudyConfigInvalid,
            message: format!("Study config '{}' is invalid ({} issue(s))", study_id, details.len()),
            details,
        }
    }

    /// Create an error for an unreadable or unparsable config file
    pub fn malformed_study_config(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::StudyConfigMalformed,
            message: format!("Malformed study config '{}': {}", path.into(), reason.into()),
            details: Vec::new(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns every failing field
    pub fn details(&self) -> &[ValidationDetails] {
        &self.details
    }

    /// Returns true if any detail refers to the given field path
    pub fn has_field(&self, field: &str) -> bool {
        self.details.iter().any(|d| d.field == field)
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)?;
        for detail in &self.details {
            write!(f, "; {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

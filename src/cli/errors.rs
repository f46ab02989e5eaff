//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::schema::SchemaError;
use crate::store::StoreError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdout, output file)
    IoError,
    /// Database already exists
    AlreadyInitialized,
    /// Database has not been created yet
    NotInitialized,
    /// Startup failed
    BootFailed,
    /// A study config file is unusable
    StudyConfigError,
    /// Storage operation failed
    StoreError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "SURVEY_CLI_CONFIG_ERROR",
            Self::IoError => "SURVEY_CLI_IO_ERROR",
            Self::AlreadyInitialized => "SURVEY_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "SURVEY_CLI_NOT_INITIALIZED",
            Self::BootFailed => "SURVEY_CLI_BOOT_FAILED",
            Self::StudyConfigError => "SURVEY_CLI_STUDY_CONFIG_ERROR",
            Self::StoreError => "SURVEY_CLI_STORE_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn already_initialized(database: impl fmt::Display) -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            format!("Database already exists at {}", database),
        )
    }

    pub fn not_initialized(database: impl fmt::Display) -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            format!("No database at {}. Run 'survey-collector init' first.", database),
        )
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::new(CliErrorCode::StudyConfigError, e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self::new(CliErrorCode::StoreError, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_code() {
        let err = CliError::config_error("question_count must be > 0");
        assert_eq!(
            err.to_string(),
            "SURVEY_CLI_CONFIG_ERROR: question_count must be > 0"
        );
    }

    #[test]
    fn test_store_error_conversion() {
        let err = CliError::from(StoreError::Closed);
        assert_eq!(err.code(), &CliErrorCode::StoreError);
        assert_eq!(err.code_str(), "SURVEY_CLI_STORE_ERROR");
    }
}

//! Lifecycle events of the survey service
//!
//! Events are explicit and typed. Their string form is the `event` field of
//! the emitted tracing record.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & lifecycle
    /// Startup begins
    BootStart,
    /// Startup complete, ready to serve
    BootComplete,
    /// Startup aborted
    BootFailed,
    /// Configuration loaded
    ConfigLoaded,
    /// Study configs loaded from disk and registered
    StudyConfigsLoaded,
    /// Listener bound
    Serving,
    /// Shutdown signal received
    ShutdownStart,
    /// Storage closed, process exiting
    ShutdownComplete,

    // Submissions
    /// Survey committed
    SurveySubmitted,
    /// Submission failed validation or policy
    SubmissionRejected,
    /// Submission failed in storage and was rolled back
    SubmissionFailed,
    /// Survey and its responses removed
    SurveyDeleted,

    // Export
    /// Export stream opened
    ExportStarted,
    /// Export stream finished
    ExportComplete,
    /// Export stream aborted mid-way
    ExportFailed,

    // Study configuration
    /// Study config stored through the API
    StudyConfigUpdated,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOOT_START",
            Event::BootComplete => "BOOT_COMPLETE",
            Event::BootFailed => "BOOT_FAILED",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StudyConfigsLoaded => "STUDY_CONFIGS_LOADED",
            Event::Serving => "SERVING",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::SurveySubmitted => "SURVEY_SUBMITTED",
            Event::SubmissionRejected => "SUBMISSION_REJECTED",
            Event::SubmissionFailed => "SUBMISSION_FAILED",
            Event::SurveyDeleted => "SURVEY_DELETED",

            Event::ExportStarted => "EXPORT_STARTED",
            Event::ExportComplete => "EXPORT_COMPLETE",
            Event::ExportFailed => "EXPORT_FAILED",

            Event::StudyConfigUpdated => "STUDY_CONFIG_UPDATED",
        }
    }

    /// Returns true if this event ends the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::BootFailed)
    }

    /// Returns true for failures the process survives
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::SubmissionFailed | Event::ExportFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

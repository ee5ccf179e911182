//! Error taxonomy for a single trigger run
//!
//! Every failure that ends a run is a [`TriggerError`]; the exit code the
//! process reports is derived from it and nothing else. Transient status-poll
//! failures are logged inside the poll loop and never reach this type.

use crate::qms::{StartResult, TaskStatus};
use thiserror::Error;

/// Process exit codes
pub mod exit_codes {
    /// Task completed, was started without waiting, or help/version shown
    pub const SUCCESS: i32 = 0;
    /// Usage, resolution, trigger or polling failure
    pub const ERROR: i32 = 9;
    /// Anything unexpected (transport failure, malformed response, ...)
    pub const EXCEPTION: i32 = 10;
}

/// Fatal outcome of a run
#[derive(Error, Debug)]
pub enum TriggerError {
    /// Malformed or missing command-line input, or unreadable configuration
    #[error("{0}")]
    Usage(String),

    /// Locator found no task matching the selector
    #[error("TaskNotFound")]
    TaskNotFound,

    /// Remote service refused to start the task
    #[error("{0}")]
    Rejected(StartResult),

    /// No terminal status was observed before the timeout
    #[error("Failed to get execution status")]
    NoStatus,

    /// Task finished in a state other than Completed
    #[error("{status}")]
    TaskFailed {
        status: TaskStatus,
        log_file: Option<String>,
    },

    /// Anything else
    #[error("{0}")]
    Unhandled(String),
}

impl TriggerError {
    /// Exit code the process reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) | Self::TaskNotFound | Self::Rejected(_) | Self::NoStatus => {
                exit_codes::ERROR
            }
            Self::TaskFailed { status, .. } => status.code(),
            Self::Unhandled(_) => exit_codes::EXCEPTION,
        }
    }
}

impl From<anyhow::Error> for TriggerError {
    fn from(err: anyhow::Error) -> Self {
        Self::Unhandled(single_line(&format!("{:#}", err)))
    }
}

/// Collapse a possibly multi-line message into one log line
pub fn single_line(message: &str) -> String {
    message.split_whitespace().collect::<Vec<_>>().join(" ")
}

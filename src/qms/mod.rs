//! QlikView Management Service boundary
//!
//! [`QmsApi`] is the seam between the trigger pipeline and the remote
//! service. [`QmsClient`] talks SOAP over HTTP; tests substitute a scripted
//! implementation.

mod client;
mod xml;

pub use client::{QmsClient, DEFAULT_ADDRESS};

use crate::Result;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Short-lived authentication token required on every call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceKey(String);

impl ServiceKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A task as the remote service describes it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub name: String,
    pub id: String,
    /// Distribution service the task belongs to
    pub qds_id: String,
    pub enabled: bool,
}

/// Arguments for the trigger call
#[derive(Debug, Clone, Default)]
pub struct TriggerParams {
    pub task_name: String,
    pub password: Option<String>,
    pub variable_name: Option<String>,
    pub variable_values: Vec<String>,
}

/// Start result reported by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartResult {
    Success,
    /// Server-defined reason, kept verbatim (e.g. `TaskIsAlreadyRunning`)
    Other(String),
}

impl From<&str> for StartResult {
    fn from(value: &str) -> Self {
        match value.trim() {
            "Success" => Self::Success,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for StartResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "Success"),
            Self::Other(reason) => write!(f, "{}", reason),
        }
    }
}

/// Result of the trigger call; the execution handle only exists on success
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started { exec_id: String },
    Rejected(StartResult),
}

/// Execution state of a triggered task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Waiting,
    Running,
    Aborting,
    Failed,
    Warning,
    Completed,
    Unknown(String),
}

impl TaskStatus {
    /// Numeric status code, used as the process exit code on failure
    pub fn code(&self) -> i32 {
        match self {
            Self::Waiting => 1,
            Self::Running => 2,
            Self::Aborting => 3,
            Self::Failed => 4,
            Self::Warning => 5,
            Self::Completed => 6,
            Self::Unknown(_) => crate::error::exit_codes::ERROR,
        }
    }

    /// Polling stops once a terminal status is seen
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Waiting | Self::Running)
    }
}

impl FromStr for TaskStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let status = match s {
            "Waiting" | "1" => Self::Waiting,
            "Running" | "2" => Self::Running,
            "Aborting" | "3" => Self::Aborting,
            "Failed" | "4" => Self::Failed,
            "Warning" | "5" => Self::Warning,
            "Completed" | "0" | "6" => Self::Completed,
            other => Self::Unknown(other.to_string()),
        };
        Ok(status)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Running => write!(f, "Running"),
            Self::Aborting => write!(f, "Aborting"),
            Self::Failed => write!(f, "Failed"),
            Self::Warning => write!(f, "Warning"),
            Self::Completed => write!(f, "Completed"),
            Self::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

/// One status poll result. Timestamps are server-locale strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionStatus {
    pub status: TaskStatus,
    pub start_time: Option<String>,
    pub finish_time: Option<String>,
    pub log_file: Option<String>,
}

/// Operations the trigger pipeline needs from the management service
#[async_trait]
pub trait QmsApi: Send + Sync {
    /// Obtain a fresh time-limited service key
    async fn service_key(&self) -> Result<ServiceKey>;

    /// All EDX-enabled tasks whose name matches `name`
    async fn find_edx(&self, key: &ServiceKey, name: &str) -> Result<Vec<TaskDescriptor>>;

    /// Task by identifier; `None` when the service knows no such task
    async fn get_task(&self, key: &ServiceKey, id: &str) -> Result<Option<TaskDescriptor>>;

    async fn trigger_edx_task(
        &self,
        key: &ServiceKey,
        params: &TriggerParams,
    ) -> Result<TriggerOutcome>;

    async fn edx_task_status(&self, key: &ServiceKey, exec_id: &str) -> Result<ExecutionStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("Running".parse::<TaskStatus>().unwrap(), TaskStatus::Running);
        assert_eq!(" Failed ".parse::<TaskStatus>().unwrap(), TaskStatus::Failed);
        assert_eq!("5".parse::<TaskStatus>().unwrap(), TaskStatus::Warning);
        assert_eq!(
            "Exploded".parse::<TaskStatus>().unwrap(),
            TaskStatus::Unknown("Exploded".to_string())
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TaskStatus::Waiting.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Aborting.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Unknown("x".into()).is_terminal());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(TaskStatus::Aborting.code(), 3);
        assert_eq!(TaskStatus::Failed.code(), 4);
        assert_eq!(TaskStatus::Warning.code(), 5);
        assert_eq!(TaskStatus::Unknown("x".into()).code(), 9);
    }

    #[test]
    fn test_start_result() {
        assert_eq!(StartResult::from("Success"), StartResult::Success);
        let other = StartResult::from("TaskIsAlreadyRunning");
        assert_eq!(other.to_string(), "TaskIsAlreadyRunning");
    }
}

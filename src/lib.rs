//! qv-edx-trigger - trigger QlikView EDX tasks and wait for them
//!
//! Authenticates against the QlikView Management Service, resolves a task by
//! name or id, triggers it and polls until it reaches a terminal status. The
//! outcome is reported as a process exit code for schedulers and scripts.

pub mod app;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod options;
pub mod qms;

// Re-exports
pub use config::Settings;
pub use crate::core::{Completion, Executor, PollSchedule, RunReport, Timeout};
pub use error::{exit_codes, TriggerError};
pub use options::{ExecutionRequest, Invocation};

/// Result type alias
pub type Result<T> = anyhow::Result<T>;

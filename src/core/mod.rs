//! Core pipeline - task lookup, trigger & poll, result mapping

pub mod locator;
pub mod outcome;
mod executor;
mod scheduler;

pub use executor::{Completion, Executor, RunReport};
pub use outcome::Summary;
pub use scheduler::{PollSchedule, Timeout, KEY_REFRESH_THRESHOLD};

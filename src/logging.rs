//! Logger setup and per-run log context

use std::fmt;
use std::io::Write;

/// Initialize env_logger with a single-line format. `RUST_LOG` overrides the default filter.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .try_init();
}

/// Task selector and execution handle attached to every log line of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    pub task: String,
    pub exec_id: Option<String>,
}

impl LogContext {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            exec_id: None,
        }
    }

    /// Record the execution handle once the task has been started
    pub fn set_execution(&mut self, exec_id: impl Into<String>) {
        self.exec_id = Some(exec_id.into());
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}]",
            self.task,
            self.exec_id.as_deref().unwrap_or("-1")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display() {
        let mut ctx = LogContext::new("Nightly");
        assert_eq!(ctx.to_string(), "[Nightly] [-1]");

        ctx.set_execution("e-42");
        assert_eq!(ctx.to_string(), "[Nightly] [e-42]");
    }
}

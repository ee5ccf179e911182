//! Result Mapper - turns a run report into an exit code and log lines

use super::executor::{Completion, RunReport};
use crate::error::{exit_codes, TriggerError};
use crate::qms::ExecutionStatus;
use chrono::{NaiveDateTime, TimeDelta};

/// Timestamp layouts the management service produces under common locales
const TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Final verdict of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub exit_code: i32,
    /// Lines logged at error level when true, info otherwise
    pub failed: bool,
    pub lines: Vec<String>,
}

/// Map a run report to its exit code and log lines
pub fn summarize(report: &RunReport) -> Summary {
    match &report.result {
        Ok(Completion::Started) => Summary {
            exit_code: exit_codes::SUCCESS,
            failed: false,
            lines: Vec::new(),
        },
        Ok(Completion::Finished(status)) => Summary {
            exit_code: exit_codes::SUCCESS,
            failed: false,
            lines: vec![completed_line(status)],
        },
        Err(err) => error_summary(err),
    }
}

/// Summary for a failure that happened before any run could start
pub fn error_summary(err: &TriggerError) -> Summary {
    let code = err.exit_code();
    let mut lines = vec![format!("{} (Error code: {})", err, code)];

    if let TriggerError::TaskFailed { log_file, .. } = err {
        lines.push(format!("Logfile: {}", log_file.as_deref().unwrap_or_default()));
    }

    Summary {
        exit_code: code,
        failed: true,
        lines,
    }
}

/// Log the summary under the run's context and return the exit code
pub fn report(report: &RunReport) -> i32 {
    let summary = summarize(report);
    for line in &summary.lines {
        if summary.failed {
            log::error!("{} {}", report.context, line);
        } else {
            log::info!("{} {}", report.context, line);
        }
    }
    summary.exit_code
}

fn completed_line(status: &ExecutionStatus) -> String {
    match duration(status) {
        Some(span) => format!("{} (Duration: {})", status.status, format_span(span)),
        None => status.status.to_string(),
    }
}

/// Finish minus start, `None` if the timestamps are missing, unparsable or out of order.
///
/// Both timestamps must parse with the same layout; a day/month pair can
/// otherwise be read as month/day for one of them.
pub fn duration(status: &ExecutionStatus) -> Option<TimeDelta> {
    let start = status.start_time.as_deref()?.trim();
    let finish = status.finish_time.as_deref()?.trim();

    TIME_FORMATS
        .iter()
        .find_map(|format| {
            let start = NaiveDateTime::parse_from_str(start, format).ok()?;
            let finish = NaiveDateTime::parse_from_str(finish, format).ok()?;
            Some(finish - start)
        })
        .filter(|span| *span >= TimeDelta::zero())
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// `HH:MM:SS`
fn format_span(span: TimeDelta) -> String {
    let secs = span.num_seconds().unsigned_abs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

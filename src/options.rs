//! Option Resolver - command-line flags merged over configuration defaults

use crate::config::Settings;
use crate::core::{PollSchedule, Timeout};
use crate::error::{single_line, TriggerError};
use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser};
use std::ffi::OsString;
use std::time::Duration;

/// Trigger QlikView EDX enabled tasks from command line.
#[derive(Parser, Debug)]
#[command(name = "qv-edx-trigger", version, about)]
pub struct Cli {
    /// Name or ID of the task to trigger (case-sensitive)
    #[arg(short, long, value_name = "TASK_NAME_OR_ID")]
    pub task: String,

    /// Password for the task (if required)
    #[arg(short, long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Name of the variable to change
    #[arg(long, value_name = "NAME")]
    pub variable: Option<String>,

    /// Value(s) to assign the variable (semicolon or comma separated)
    #[arg(long, value_name = "VALUES")]
    pub values: Option<String>,

    /// Location of the QlikView Management Service [default: configured address]
    #[arg(short, long, value_name = "ADDRESS")]
    pub service: Option<String>,

    /// Seconds between status polls [default: configured, 10]
    #[arg(long, value_name = "SECONDS")]
    pub sleep: Option<u64>,

    /// Timeout in minutes, negative waits indefinitely, 0 does not wait [default: configured, -1]
    #[arg(long, value_name = "MINUTES", allow_negative_numbers = true)]
    pub timeout: Option<i64>,

    /// Seconds to wait before triggering the task [default: configured, 0]
    #[arg(long, value_name = "SECONDS")]
    pub wait: Option<u64>,

    /// Increase the verbosity level (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Everything a single run needs; immutable once resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub task: String,
    pub password: Option<String>,
    pub variable_name: Option<String>,
    pub variable_values: Vec<String>,
    /// Explicit management service address
    pub service: Option<String>,
    pub schedule: PollSchedule,
    /// Delay before the first remote call
    pub wait: Duration,
    pub verbosity: u8,
}

/// What the command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Help(String),
    Version(String),
    Execute(ExecutionRequest),
}

impl Cli {
    /// Merge parsed flags over the configured defaults
    pub fn into_request(self, settings: &Settings) -> ExecutionRequest {
        let interval = Duration::from_secs(self.sleep.unwrap_or(settings.sleep));
        let timeout = Timeout::from_minutes(self.timeout.unwrap_or(settings.timeout));

        ExecutionRequest {
            task: self.task,
            password: self.password,
            variable_name: self.variable,
            variable_values: self.values.as_deref().map(split_values).unwrap_or_default(),
            service: self.service.or_else(|| settings.service.clone()),
            schedule: PollSchedule::new(interval, timeout),
            wait: Duration::from_secs(self.wait.unwrap_or(settings.wait)),
            verbosity: self.verbose,
        }
    }
}

/// Split a `;` or `,` separated list, dropping empty entries
pub fn split_values(values: &str) -> Vec<String> {
    values
        .split([';', ','])
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Usage text shown for `--help` or an empty command line
pub fn usage() -> String {
    Cli::command().render_help().to_string()
}

/// Raw `--task` value, for logging failures that happen before parsing succeeds
pub fn task_selector(args: &[OsString]) -> Option<String> {
    let mut args = args.iter().skip(1).map(|a| a.to_string_lossy());

    while let Some(arg) = args.next() {
        if arg == "-t" || arg == "--task" {
            return args.next().map(|v| v.into_owned());
        }
        if let Some(value) = arg.strip_prefix("--task=") {
            return Some(value.to_string());
        }
        if let Some(value) = arg.strip_prefix("-t").filter(|v| !v.is_empty()) {
            return Some(value.trim_start_matches('=').to_string());
        }
    }

    None
}

/// Resolve process arguments (program name first) into an invocation
pub fn resolve<I, T>(args: I, settings: &Settings) -> Result<Invocation, TriggerError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if args.len() <= 1 {
        return Ok(Invocation::Help(usage()));
    }

    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(Invocation::Execute(cli.into_request(settings))),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp => Ok(Invocation::Help(err.render().to_string())),
            ErrorKind::DisplayVersion => Ok(Invocation::Version(err.render().to_string())),
            _ => Err(TriggerError::Usage(single_line(&err.render().to_string()))),
        },
    }
}

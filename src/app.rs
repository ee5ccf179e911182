//! Top-level dispatch - the single place an exit code is decided

use crate::config::Settings;
use crate::core::{outcome, Executor};
use crate::error::{exit_codes, single_line, TriggerError};
use crate::logging::LogContext;
use crate::options::{self, ExecutionRequest, Invocation};
use crate::qms::{QmsApi, QmsClient, DEFAULT_ADDRESS};
use std::ffi::OsString;

/// Resolve configuration and arguments, then run the request
pub async fn run<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let early_context =
        LogContext::new(options::task_selector(&args).unwrap_or_else(|| "-".to_string()));

    let settings = match Settings::auto_load() {
        Ok(settings) => settings,
        Err(e) => {
            let err = TriggerError::Usage(single_line(&format!("{:#}", e)));
            return fail(&early_context, &err);
        }
    };

    let request = match options::resolve(args, &settings) {
        Ok(Invocation::Help(text)) => {
            println!("{}", text.trim_end());
            return exit_codes::SUCCESS;
        }
        Ok(Invocation::Version(text)) => {
            println!("{}", text.trim_end());
            return exit_codes::SUCCESS;
        }
        Ok(Invocation::Execute(request)) => request,
        Err(err) => return fail(&early_context, &err),
    };

    let address = request.service.as_deref().unwrap_or(DEFAULT_ADDRESS);
    match QmsClient::new(address) {
        Ok(client) => execute(client, &request).await,
        Err(e) => fail(&LogContext::new(&request.task), &TriggerError::from(e)),
    }
}

/// Honour the pre-trigger wait, then trigger and map the outcome
pub async fn execute<C: QmsApi>(client: C, request: &ExecutionRequest) -> i32 {
    if !request.wait.is_zero() {
        println!("Waiting for {} seconds...", request.wait.as_secs());
        tokio::time::sleep(request.wait).await;
    }

    let report = Executor::new(client).execute(request).await;
    outcome::report(&report)
}

fn fail(context: &LogContext, err: &TriggerError) -> i32 {
    let summary = outcome::error_summary(err);
    for line in &summary.lines {
        log::error!("{} {}", context, line);
    }
    summary.exit_code
}

//! Trigger & Poll engine - starts an EDX task and waits for a terminal status
//!
//! Polling is a plain sleep-then-query loop on tokio's clock, so tests can
//! drive it with a paused runtime and a scripted [`QmsApi`].

use super::locator;
use super::scheduler::PollSchedule;
use crate::error::{single_line, TriggerError};
use crate::logging::LogContext;
use crate::options::ExecutionRequest;
use crate::qms::{ExecutionStatus, QmsApi, ServiceKey, TaskStatus, TriggerOutcome, TriggerParams};
use tokio::time::{sleep, Instant};

/// How a successful run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Triggered without waiting
    Started,
    /// Task reached Completed
    Finished(ExecutionStatus),
}

/// Result of one run together with the context it was logged under
#[derive(Debug)]
pub struct RunReport {
    pub context: LogContext,
    pub result: Result<Completion, TriggerError>,
}

/// Task executor - drives one request against the management service
pub struct Executor<C> {
    client: C,
}

impl<C: QmsApi> Executor<C> {
    /// Create a new executor
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Resolve, trigger and (unless fire-and-forget) poll the requested task
    pub async fn execute(&self, request: &ExecutionRequest) -> RunReport {
        let mut context = LogContext::new(&request.task);
        let result = self.trigger_and_wait(request, &mut context).await;
        RunReport { context, result }
    }

    async fn trigger_and_wait(
        &self,
        request: &ExecutionRequest,
        context: &mut LogContext,
    ) -> Result<Completion, TriggerError> {
        let key = self.client.service_key().await?;

        let task = locator::locate(&self.client, &key, &request.task)
            .await?
            .ok_or(TriggerError::TaskNotFound)?;

        let params = TriggerParams {
            task_name: task.name.clone(),
            password: request.password.clone(),
            variable_name: request.variable_name.clone(),
            variable_values: request.variable_values.clone(),
        };

        let exec_id = match self.client.trigger_edx_task(&key, &params).await? {
            TriggerOutcome::Started { exec_id } => exec_id,
            TriggerOutcome::Rejected(reason) => return Err(TriggerError::Rejected(reason)),
        };
        context.set_execution(&exec_id);

        if request.verbosity > 0 {
            log::info!(
                "{} Name: {}, ID: {}, Enabled: {}, Sleep: {} seconds, Timeout: {}",
                context,
                task.name,
                task.id,
                if task.enabled { "Yes" } else { "No" },
                request.schedule.interval.as_secs(),
                request.schedule.timeout
            );
        }
        log::info!("{} Started", context);

        if !request.schedule.waits() {
            return Ok(Completion::Started);
        }

        let status = self
            .poll(&request.schedule, key, &exec_id, request.verbosity, context)
            .await?
            .ok_or(TriggerError::NoStatus)?;

        if status.status == TaskStatus::Completed {
            Ok(Completion::Finished(status))
        } else {
            Err(TriggerError::TaskFailed {
                status: status.status,
                log_file: status.log_file,
            })
        }
    }

    /// Sleep-then-query until a terminal status or the timeout.
    ///
    /// A failed status query is logged and polling continues. Returns `None`
    /// when the timeout passes without a terminal status.
    async fn poll(
        &self,
        schedule: &PollSchedule,
        mut key: ServiceKey,
        exec_id: &str,
        verbosity: u8,
        context: &LogContext,
    ) -> crate::Result<Option<ExecutionStatus>> {
        let started = Instant::now();
        let mut latest: Option<ExecutionStatus> = None;

        loop {
            sleep(schedule.interval).await;

            if schedule.needs_key_refresh() {
                if verbosity > 1 {
                    log::info!("{} GetTimeLimitedServiceKey()", context);
                }
                key = self.client.service_key().await?;
            }

            match self.client.edx_task_status(&key, exec_id).await {
                Ok(status) => latest = Some(status),
                Err(e) => log::warn!("{} {}", context, single_line(&format!("{:#}", e))),
            }

            if let Some(status) = &latest {
                if verbosity > 1 && status.status != TaskStatus::Running {
                    log::info!("{} {}", context, status.status);
                }
                if status.status.is_terminal() {
                    return Ok(latest);
                }
            }

            if schedule.is_expired(started.elapsed()) {
                log::debug!("{} Poll timeout after {:?}", context, started.elapsed());
                return Ok(None);
            }
        }
    }
}

use gatekey_client::DeviceApiClient;
use gatekey_core::constants::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_MAX_WAIT_SECS};
use gatekey_core::{AuditContext, DeviceCommand, DeviceId, Fault, TaskId};
use gatekey_storage::{OperationLog, OperationLogRepository, SqliteOperationLogRepository};
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::outcome::OperationOutcome;

/// Tuning knobs for the operation orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct GateOperatorConfig {
    /// Wall-clock bound on waiting for the device action to terminate.
    pub poll_max_wait: Duration,

    /// Pause between consecutive action status queries.
    pub poll_interval: Duration,
}

impl Default for GateOperatorConfig {
    fn default() -> Self {
        Self {
            poll_max_wait: Duration::from_secs(DEFAULT_POLL_MAX_WAIT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl GateOperatorConfig {
    /// Set the completion-wait bound.
    #[must_use]
    pub fn poll_max_wait(mut self, max_wait: Duration) -> Self {
        self.poll_max_wait = max_wait;
        self
    }

    /// Set the pause between status queries.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Orchestrator for gate operations.
///
/// Combines the device API client with the audit repository: every
/// [`perform`](Self::perform) call drives one command through dispatch,
/// completion polling, and outcome classification, then records the attempt.
///
/// Operations for the same device are not serialized here; concurrent calls
/// proceed independently and the remote API is assumed to order the
/// resulting device actions.
pub struct GateOperator {
    client: DeviceApiClient,
    audit: SqliteOperationLogRepository,
    config: GateOperatorConfig,
}

impl GateOperator {
    /// Create an operator with default polling configuration.
    pub fn new(client: DeviceApiClient, pool: SqlitePool) -> Self {
        Self::with_config(client, pool, GateOperatorConfig::default())
    }

    /// Create an operator with explicit polling configuration.
    pub fn with_config(
        client: DeviceApiClient,
        pool: SqlitePool,
        config: GateOperatorConfig,
    ) -> Self {
        Self {
            client,
            audit: SqliteOperationLogRepository::new(pool),
            config,
        }
    }

    /// Dispatch `command` to `device_id`, wait for the device verdict, and
    /// record the attempt.
    ///
    /// Exactly one audit row is written per call - on completion, rejection,
    /// and fault alike. A failure to persist that row is reported through
    /// `tracing` and never changes the returned outcome: audit durability
    /// problems must not mask the result of the physical operation.
    pub async fn perform(
        &self,
        device_id: &DeviceId,
        command: DeviceCommand,
        audit: AuditContext,
    ) -> OperationOutcome {
        let (outcome, task_id) = self.execute(device_id, command).await;

        match &outcome {
            OperationOutcome::Completed { task_id } => {
                info!(
                    device_id = %device_id,
                    command = %command,
                    task_id = %task_id,
                    "gate operation completed"
                );
            }
            OperationOutcome::Rejected { reason } => {
                warn!(
                    device_id = %device_id,
                    command = %command,
                    reason = %reason,
                    "gate operation rejected by device"
                );
            }
            OperationOutcome::Failed { fault } => {
                error!(
                    device_id = %device_id,
                    command = %command,
                    kind = %fault.kind,
                    error = %fault,
                    "gate operation failed"
                );
            }
        }

        self.record(device_id, command, &outcome, task_id.as_ref(), &audit)
            .await;

        outcome
    }

    /// Run the operation itself, without audit concerns.
    ///
    /// Returns the outcome plus the task id for the audit row; a rejection
    /// carries its task id here even though the outcome variant does not.
    async fn execute(
        &self,
        device_id: &DeviceId,
        command: DeviceCommand,
    ) -> (OperationOutcome, Option<TaskId>) {
        let receipt = match self.client.dispatch(device_id, command).await {
            Ok(receipt) => receipt,
            Err(fault) => return (OperationOutcome::Failed { fault }, None),
        };

        let Some(task_id) = receipt.task_id else {
            // The API accepted the command but broke its contract.
            let fault = Fault::unknown("device API did not return a task id")
                .with_context("device_id", device_id.as_str());
            return (OperationOutcome::Failed { fault }, None);
        };

        let task = match self
            .client
            .await_completion(&task_id, self.config.poll_max_wait, self.config.poll_interval)
            .await
        {
            Ok(task) => task,
            Err(fault) => return (OperationOutcome::Failed { fault }, Some(task_id)),
        };

        if task.succeeded() {
            (
                OperationOutcome::Completed {
                    task_id: task_id.clone(),
                },
                Some(task_id),
            )
        } else {
            let reason = task
                .error
                .unwrap_or_else(|| "unknown device error".to_string());
            (OperationOutcome::Rejected { reason }, Some(task_id))
        }
    }

    /// Write the audit row, swallowing persistence failures.
    async fn record(
        &self,
        device_id: &DeviceId,
        command: DeviceCommand,
        outcome: &OperationOutcome,
        task_id: Option<&TaskId>,
        audit: &AuditContext,
    ) {
        let (success, error_message) = match outcome {
            OperationOutcome::Completed { .. } => (true, None),
            OperationOutcome::Rejected { reason } => (false, Some(reason.clone())),
            OperationOutcome::Failed { fault } => (false, Some(fault.message.clone())),
        };

        let log = OperationLog::new(device_id, command, success, task_id, error_message, audit);

        if let Err(e) = self.audit.create(&log).await {
            error!(
                device_id = %device_id,
                operation = %command,
                error = %e,
                "failed to persist gate operation record"
            );
        }
    }
}

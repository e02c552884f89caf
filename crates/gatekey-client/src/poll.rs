//! Polling for asynchronous device action completion.
//!
//! A command dispatch only queues an action; the device executes it some
//! time later and the API exposes progress through the action-result
//! endpoint. The poller repeatedly queries that endpoint (each query goes
//! through the retry loop, so transient faults inside a poll are themselves
//! retried) until the action terminates or a wall-clock deadline expires.
//!
//! A terminated-but-unsuccessful action is a normal terminal result here,
//! not a fault: the caller decides what a device-side rejection means.

use gatekey_core::{ActionTask, Fault, Result, TaskId};
use std::time::Duration;
use tracing::{debug, trace};

use crate::client::DeviceApiClient;

impl DeviceApiClient {
    /// Poll an action's status until it terminates or `max_wait` elapses.
    ///
    /// The elapsed time is measured on a monotonic clock starting at the
    /// first poll. Between polls the calling task suspends for
    /// `poll_interval`; unrelated tasks on the same runtime keep running.
    ///
    /// # Errors
    ///
    /// Returns a `Timeout` fault (carrying the task id and the configured
    /// wait bound) if no terminal status arrives within `max_wait`, or any
    /// classified fault from the underlying status queries once their own
    /// retry budget is exhausted.
    pub async fn await_completion(
        &self,
        task_id: &TaskId,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> Result<ActionTask> {
        let started = tokio::time::Instant::now();

        loop {
            let task = self.action_result(task_id).await?;

            if task.is_terminal() {
                debug!(
                    task_id = %task_id,
                    successful = task.succeeded(),
                    "device action terminated"
                );
                return Ok(task);
            }

            if started.elapsed() >= max_wait {
                return Err(Fault::timeout(
                    "timed out waiting for the device action to complete",
                )
                .with_context("task_id", task_id.as_str())
                .with_context("max_wait_ms", max_wait.as_millis().to_string()));
            }

            trace!(task_id = %task_id, status = %task.status, "device action still running");
            tokio::time::sleep(poll_interval).await;
        }
    }
}

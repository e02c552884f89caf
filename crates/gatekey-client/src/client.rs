use gatekey_core::constants::{
    API_ACTION_RESULT_PATH, API_DEVICES_PATH, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use gatekey_core::{
    ActionTask, DeviceCommand, DeviceId, DeviceInfo, DeviceStatus, Fault, Result, TaskId,
};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::retry::RetryPolicy;

/// Configuration for the device API client.
///
/// # Example
///
/// ```
/// use gatekey_client::{ApiClientConfig, RetryPolicy};
/// use std::time::Duration;
///
/// let config = ApiClientConfig::new("https://api.example.com/v1", "api-key")
///     .timeout(Duration::from_secs(5))
///     .max_retries(2)
///     .retry_policy(RetryPolicy::default());
/// ```
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL of the device API, without a trailing slash.
    pub base_url: String,

    /// Credential sent in the `Authorization` header.
    pub api_key: String,

    /// Timeout for a single HTTP attempt.
    pub timeout: Duration,

    /// Number of retries after a failed attempt (`max_retries + 1` attempts).
    pub max_retries: u32,

    /// Backoff between retried attempts.
    pub retry: RetryPolicy,
}

impl ApiClientConfig {
    /// Create a configuration with default timeout and retry settings.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry: RetryPolicy::default(),
        }
    }

    /// Set the per-attempt timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry budget.
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff policy.
    #[must_use]
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Receipt returned by a command dispatch.
///
/// A compliant API always returns a task id; `None` means the remote side
/// violated its contract, which the orchestrator reports as an `Unknown`
/// fault.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandReceipt {
    /// Identifier of the asynchronous action carrying out the command.
    #[serde(default)]
    pub task_id: Option<TaskId>,
}

/// Client for the smart-lock device API.
///
/// All operations go through a retrying sender: transient faults
/// (connection, timeout, uncategorized) are retried with exponential backoff
/// up to the configured budget, while authentication, missing-device, and
/// rate-limit faults propagate on the first occurrence.
///
/// The client holds only a connection pool and its configuration; share it
/// by reference across concurrent operations.
pub struct DeviceApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
    retry: RetryPolicy,
}

impl DeviceApiClient {
    /// Create a client from the given configuration.
    ///
    /// # Errors
    /// Returns a `ConnectionFailed` fault if the underlying HTTP client
    /// cannot be constructed (an environment problem, e.g. no TLS backend).
    pub fn new(config: ApiClientConfig) -> Result<Self> {
        debug!(base_url = %config.base_url, "creating device API client");

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Fault::connection_failed(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            max_retries: config.max_retries,
            retry: config.retry,
        })
    }

    /// List the devices registered to the configured credential.
    ///
    /// # Errors
    /// Returns a classified fault if the request fails after retries or the
    /// payload cannot be decoded.
    pub async fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        let payload = self.send(Method::GET, API_DEVICES_PATH, &[], None).await?;
        serde_json::from_value(payload)
            .map_err(|e| Fault::unknown(format!("malformed device list: {e}")))
    }

    /// Fetch one device's status.
    ///
    /// A payload that reports the device as unresponsive is turned into a
    /// `DeviceOffline` fault here: the request itself succeeded, but the
    /// device cannot currently act on commands.
    ///
    /// # Errors
    /// Returns a classified fault on request failure, undecodable payload,
    /// or an unresponsive device.
    pub async fn device_status(&self, device_id: &DeviceId) -> Result<DeviceStatus> {
        let path = format!("{API_DEVICES_PATH}/{device_id}");
        let payload = self.send(Method::GET, &path, &[], None).await?;

        let status: DeviceStatus = serde_json::from_value(payload).map_err(|e| {
            Fault::unknown(format!("malformed device status: {e}"))
                .with_context("device_id", device_id.as_str())
        })?;

        if status.is_unresponsive() {
            let mut fault = Fault::device_offline(device_id.as_str());
            if let Some(battery) = status.battery {
                fault = fault.with_context("battery", battery.to_string());
            }
            return Err(fault);
        }

        Ok(status)
    }

    /// Dispatch a command to a device.
    ///
    /// The remote API queues the command as an asynchronous action and
    /// returns its task id; poll [`await_completion`](Self::await_completion)
    /// for the verdict.
    ///
    /// # Errors
    /// Returns a classified fault if the dispatch fails after retries.
    pub async fn dispatch(
        &self,
        device_id: &DeviceId,
        command: DeviceCommand,
    ) -> Result<CommandReceipt> {
        debug!(device_id = %device_id, command = %command, "dispatching device command");

        let path = format!("{API_DEVICES_PATH}/{device_id}");
        let body = serde_json::json!({ "command": command });
        let payload = self.send(Method::POST, &path, &[], Some(body)).await?;

        serde_json::from_value(payload).map_err(|e| {
            Fault::unknown(format!("malformed dispatch response: {e}"))
                .with_context("device_id", device_id.as_str())
        })
    }

    /// Dispatch an unlock command.
    ///
    /// # Errors
    /// See [`dispatch`](Self::dispatch).
    pub async fn unlock(&self, device_id: &DeviceId) -> Result<CommandReceipt> {
        self.dispatch(device_id, DeviceCommand::Unlock).await
    }

    /// Dispatch a lock command.
    ///
    /// # Errors
    /// See [`dispatch`](Self::dispatch).
    pub async fn lock(&self, device_id: &DeviceId) -> Result<CommandReceipt> {
        self.dispatch(device_id, DeviceCommand::Lock).await
    }

    /// Dispatch a state-sync command.
    ///
    /// # Errors
    /// See [`dispatch`](Self::dispatch).
    pub async fn sync(&self, device_id: &DeviceId) -> Result<CommandReceipt> {
        self.dispatch(device_id, DeviceCommand::Sync).await
    }

    /// Query the current state of an asynchronous device action.
    ///
    /// # Errors
    /// Returns a classified fault if the query fails after retries or the
    /// payload cannot be decoded.
    pub async fn action_result(&self, task_id: &TaskId) -> Result<ActionTask> {
        let payload = self
            .send(
                Method::GET,
                API_ACTION_RESULT_PATH,
                &[("task_id", task_id.as_str())],
                None,
            )
            .await?;

        let mut task: ActionTask = serde_json::from_value(payload).map_err(|e| {
            Fault::unknown(format!("malformed action result: {e}"))
                .with_context("task_id", task_id.as_str())
        })?;
        task.task_id = task_id.clone();

        Ok(task)
    }

    /// Send a request through the retry loop.
    ///
    /// Makes up to `max_retries + 1` attempts. A non-retriable fault returns
    /// immediately; each retriable failure is surfaced as a `warn!` event and
    /// followed by an exponential-backoff suspension of the calling task.
    /// When the budget is exhausted, the last-seen fault is returned.
    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<Value> {
        let mut last_fault: Option<Fault> = None;

        for attempt in 0..=self.max_retries {
            match self.execute(method.clone(), path, query, body.as_ref()).await {
                Ok(payload) => return Ok(payload),
                Err(fault) if !fault.is_retriable() => return Err(fault),
                Err(fault) => {
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        endpoint = path,
                        error = %fault,
                        "device API request failed"
                    );
                    last_fault = Some(fault);
                }
            }

            if attempt < self.max_retries {
                tokio::time::sleep(self.retry.delay_for(attempt)).await;
            }
        }

        Err(last_fault.unwrap_or_else(|| {
            Fault::connection_failed("device API request failed with no recorded fault")
                .with_context("endpoint", path)
        }))
    }

    /// Perform exactly one HTTP call.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        trace!(method = %method, endpoint = path, "device API request");

        let mut request = self
            .http
            .request(method, &url)
            .header(reqwest::header::AUTHORIZATION, self.api_key.as_str());

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Err(Fault::timeout(format!("device API request timed out: {e}"))
                    .with_context("endpoint", path));
            }
            Err(e) => {
                return Err(
                    Fault::connection_failed(format!("device API connection failed: {e}"))
                        .with_context("endpoint", path),
                );
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(classify_error_response(status, path, &body_text));
        }

        response.json::<Value>().await.map_err(|e| {
            Fault::unknown(format!("malformed device API response: {e}"))
                .with_context("endpoint", path)
        })
    }
}

/// Map an HTTP error response onto the fault taxonomy.
fn classify_error_response(status: StatusCode, path: &str, body: &str) -> Fault {
    // Prefer the structured `error` field when the body carries one.
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string());

    let fault = match status.as_u16() {
        401 => Fault::unauthorized("device API rejected the configured API key"),
        404 => Fault::device_not_found(device_id_from_path(path)),
        429 => Fault::rate_limited(),
        408 | 504 => Fault::timeout("device API timed out"),
        _ => Fault::connection_failed(format!("device API error: {detail}")),
    };

    fault
        .with_context("endpoint", path)
        .with_context("status_code", status.as_u16().to_string())
        .with_context("response", detail)
}

/// Recover the device id from a `/devices/{id}` request path.
///
/// Used only to enrich `DeviceNotFound` fault context; paths that do not
/// address a single device yield `"unknown"`.
fn device_id_from_path(path: &str) -> &str {
    path.strip_prefix(API_DEVICES_PATH)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(|rest| rest.split(['/', '?']).next().unwrap_or(rest))
        .filter(|id| !id.is_empty())
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ApiClientConfig::new("https://api.example.com/v1", "key");

        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_config_builder() {
        let config = ApiClientConfig::new("https://api.example.com/v1", "key")
            .timeout(Duration::from_secs(3))
            .max_retries(1);

        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.max_retries, 1);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client =
            DeviceApiClient::new(ApiClientConfig::new("https://api.example.com/v1/", "key"))
                .unwrap();
        assert_eq!(client.base_url, "https://api.example.com/v1");
    }

    #[test]
    fn test_device_id_from_path() {
        assert_eq!(
            device_id_from_path("/devices/00000000-0000-0000-0000-000000000001"),
            "00000000-0000-0000-0000-000000000001"
        );
        assert_eq!(device_id_from_path("/devices/abc/extra"), "abc");
        assert_eq!(device_id_from_path("/devices"), "unknown");
        assert_eq!(device_id_from_path("/devices/"), "unknown");
        assert_eq!(device_id_from_path("/action-result"), "unknown");
    }

    #[test]
    fn test_classify_error_response_extracts_error_field() {
        let fault = classify_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "/devices",
            r#"{"error":"backend exploded"}"#,
        );

        assert_eq!(fault.kind, gatekey_core::FaultKind::ConnectionFailed);
        assert_eq!(
            fault.context.get("response").map(String::as_str),
            Some("backend exploded")
        );
        assert_eq!(
            fault.context.get("status_code").map(String::as_str),
            Some("500")
        );
    }

    #[test]
    fn test_classify_error_response_falls_back_to_raw_body() {
        let fault = classify_error_response(StatusCode::BAD_GATEWAY, "/devices", "oops");
        assert_eq!(
            fault.context.get("response").map(String::as_str),
            Some("oops")
        );
    }
}

//! Protocol constants for the smart-lock device API integration.
//!
//! This module centralizes the endpoint paths and the default timing values
//! used by the client and the operation orchestrator. The timing values are
//! defaults only; every one of them can be overridden through the client and
//! operator configuration structs.

// ============================================================================
// Device API Endpoints
// ============================================================================

/// Device collection endpoint.
///
/// `GET /devices` lists the devices registered to the credential;
/// `GET /devices/{id}` returns one device's status;
/// `POST /devices/{id}` dispatches a command to one device.
pub const API_DEVICES_PATH: &str = "/devices";

/// Action result endpoint.
///
/// `GET /action-result?task_id=...` returns the current state of an
/// asynchronous device action previously started by a command dispatch.
pub const API_ACTION_RESULT_PATH: &str = "/action-result";

// ============================================================================
// Request Timeout Configuration
// ============================================================================

/// Default per-request timeout for device API calls (seconds).
///
/// Applies to a single HTTP attempt, not to the whole retry budget.
///
/// # Value: 10 seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Retry Policy Defaults
// ============================================================================

/// Default number of retries after a failed attempt.
///
/// The retrying sender makes at most `DEFAULT_MAX_RETRIES + 1` attempts.
///
/// # Value: 3 retries (4 attempts)
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay before the first retry (milliseconds).
///
/// # Value: 100ms
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 100;

/// Multiplier applied to the delay after each failed attempt.
///
/// # Value: 2 (exponential backoff)
pub const DEFAULT_RETRY_MULTIPLIER: u32 = 2;

/// Ceiling on the inter-retry delay (milliseconds).
///
/// With the default base and multiplier the delay sequence is
/// 100, 200, 400, 800, 1000, 1000, ...
///
/// # Value: 1000ms
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 1000;

// ============================================================================
// Task Polling Defaults
// ============================================================================

/// Default wall-clock bound on waiting for a device action to terminate
/// (seconds).
///
/// Physical lock actuation is usually complete within a few seconds; 30
/// seconds covers slow devices without leaving a caller hanging indefinitely.
///
/// # Value: 30 seconds
pub const DEFAULT_POLL_MAX_WAIT_SECS: u64 = 30;

/// Default pause between consecutive action status queries (milliseconds).
///
/// # Value: 500ms
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

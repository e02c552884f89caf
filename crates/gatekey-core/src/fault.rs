//! Fault taxonomy for device API integration errors.
//!
//! Every error this system surfaces is a [`Fault`] carrying one of the seven
//! [`FaultKind`]s, a human-readable message, a remediation suggestion, and a
//! free-form diagnostic context map. Retry eligibility and the severity code
//! surfaced to hosts are derived from the kind alone, so callers can match on
//! the kind exhaustively and never see an unclassified error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Classification of a device API fault.
///
/// The set is closed: every failure in the integration layer maps to exactly
/// one of these kinds. Transient kinds are retried by the client's retrying
/// sender; the remaining kinds propagate on first occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultKind {
    /// Transport-level failure (DNS, connect, reset) or an unmapped HTTP error.
    ConnectionFailed,
    /// Transport timeout, HTTP 408/504, or a local completion-wait deadline.
    Timeout,
    /// HTTP 401 - the configured credential was rejected.
    Unauthorized,
    /// HTTP 404 - the device id is unknown to the remote API.
    DeviceNotFound,
    /// The device API answered, but reported the device as unresponsive.
    DeviceOffline,
    /// HTTP 429 - the credential exhausted its request quota.
    RateLimited,
    /// Anything that does not fit the categories above.
    Unknown,
}

impl FaultKind {
    /// Stable machine-readable code for this kind.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            FaultKind::ConnectionFailed => "CONNECTION_FAILED",
            FaultKind::Timeout => "TIMEOUT",
            FaultKind::Unauthorized => "UNAUTHORIZED",
            FaultKind::DeviceNotFound => "DEVICE_NOT_FOUND",
            FaultKind::DeviceOffline => "DEVICE_OFFLINE",
            FaultKind::RateLimited => "RATE_LIMITED",
            FaultKind::Unknown => "UNKNOWN",
        }
    }

    /// Whether a fault of this kind may be retried automatically.
    ///
    /// Authentication, missing-device, offline-device, and quota faults do
    /// not heal by retrying and propagate on first occurrence.
    #[must_use]
    pub fn is_retriable(self) -> bool {
        matches!(
            self,
            FaultKind::ConnectionFailed | FaultKind::Timeout | FaultKind::Unknown
        )
    }

    /// Severity code surfaced to hosts that map faults onto a transport.
    ///
    /// The values follow HTTP status semantics so a presentation layer can
    /// pass them through directly.
    #[must_use]
    pub fn severity(self) -> u16 {
        match self {
            FaultKind::ConnectionFailed => 503,
            FaultKind::Timeout => 504,
            FaultKind::Unauthorized => 401,
            FaultKind::DeviceNotFound => 404,
            FaultKind::DeviceOffline => 503,
            FaultKind::RateLimited => 429,
            FaultKind::Unknown => 500,
        }
    }

    /// Default remediation hint attached to faults of this kind.
    #[must_use]
    pub fn default_suggestion(self) -> &'static str {
        match self {
            FaultKind::ConnectionFailed => {
                "Check the network connection and try again shortly"
            }
            FaultKind::Timeout => "Wait a moment and try again",
            FaultKind::Unauthorized => "Check the configured API key",
            FaultKind::DeviceNotFound => "Check the device id",
            FaultKind::DeviceOffline => {
                "Check the device power and its network connection"
            }
            FaultKind::RateLimited => "Wait before sending further requests",
            FaultKind::Unknown => "Retry, and contact support if the problem persists",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A classified device API fault.
///
/// Faults are immutable once constructed; the builder-style
/// [`with_context`](Fault::with_context) and
/// [`with_suggestion`](Fault::with_suggestion) methods consume and return the
/// value. The context map is ordered (`BTreeMap`) and strictly diagnostic:
/// nothing in this system branches on its contents.
///
/// # Examples
///
/// ```
/// use gatekey_core::{Fault, FaultKind};
///
/// let fault = Fault::timeout("device API timed out")
///     .with_context("endpoint", "/devices/abc")
///     .with_context("status_code", "504");
///
/// assert_eq!(fault.kind, FaultKind::Timeout);
/// assert!(fault.is_retriable());
/// assert_eq!(fault.context["endpoint"], "/devices/abc");
/// ```
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct Fault {
    /// Classification, see [`FaultKind`].
    pub kind: FaultKind,

    /// Human-readable description of what failed.
    pub message: String,

    /// Human-actionable remediation hint.
    pub suggestion: String,

    /// Ordered diagnostic key/value pairs (endpoint, status code, ids, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

impl Fault {
    /// Create a fault of the given kind with the kind's default suggestion.
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            suggestion: kind.default_suggestion().to_string(),
            context: BTreeMap::new(),
        }
    }

    /// Add a diagnostic context entry.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Replace the default remediation suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    /// Whether this fault may be retried automatically.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        self.kind.is_retriable()
    }

    /// Severity code derived from the kind, see [`FaultKind::severity`].
    #[must_use]
    pub fn severity(&self) -> u16 {
        self.kind.severity()
    }

    /// Transport-level connection failure.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new(FaultKind::ConnectionFailed, message)
    }

    /// Transport timeout, gateway timeout, or completion-wait deadline.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Timeout, message)
    }

    /// Rejected credential.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Unauthorized, message)
    }

    /// Device id unknown to the remote API.
    pub fn device_not_found(device_id: &str) -> Self {
        Self::new(
            FaultKind::DeviceNotFound,
            format!("device {device_id} was not found"),
        )
        .with_context("device_id", device_id)
    }

    /// Device registered but reported unresponsive by the remote API.
    pub fn device_offline(device_id: &str) -> Self {
        Self::new(
            FaultKind::DeviceOffline,
            format!("device {device_id} is not responding"),
        )
        .with_context("device_id", device_id)
    }

    /// Request quota exhausted.
    pub fn rate_limited() -> Self {
        Self::new(FaultKind::RateLimited, "device API request limit reached")
    }

    /// Uncategorized failure.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Unknown, message)
    }
}

/// Specialized result type for device API operations.
pub type Result<T> = std::result::Result<T, Fault>;

use crate::fault::{Fault, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Device identifier (UUID-shaped, lowercase-normalized)
///
/// Identifies one smart-lock device towards the remote API. Only the *shape*
/// is validated here; whether a device with this id actually exists is known
/// only to the remote API and surfaces as a `DeviceNotFound` fault at call
/// time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a device id with shape validation.
    ///
    /// The input is trimmed and lowercased before validation.
    ///
    /// # Errors
    /// Returns an `Unknown` fault if the input is not a well-formed UUID.
    pub fn new(id: &str) -> Result<Self> {
        let id = id.trim().to_ascii_lowercase();
        Uuid::parse_str(&id)
            .map_err(|_| Fault::unknown(format!("invalid device id: {id}")))?;
        Ok(DeviceId(id))
    }

    /// Get the device id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DeviceId {
    type Err = Fault;

    fn from_str(s: &str) -> Result<Self> {
        DeviceId::new(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = Fault;

    fn try_from(value: String) -> Result<Self> {
        DeviceId::new(&value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> String {
        id.0
    }
}

/// Opaque identifier of an asynchronous device action.
///
/// Assigned by the remote API when a command is dispatched; never validated
/// locally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wrap a raw task id.
    pub fn new(id: impl Into<String>) -> Self {
        TaskId(id.into())
    }

    /// Get the task id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        TaskId(id.to_string())
    }
}

/// Command dispatched to a gate device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCommand {
    /// Release the lock so the gate can open.
    Unlock,
    /// Engage the lock.
    Lock,
    /// Refresh the device's reported state from the physical lock.
    Sync,
}

impl DeviceCommand {
    /// Wire form of the command, as sent in the dispatch body.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceCommand::Unlock => "unlock",
            DeviceCommand::Lock => "lock",
            DeviceCommand::Sync => "sync",
        }
    }

    /// Parse a wire-form command string.
    ///
    /// Returns `None` for anything that is not `unlock`, `lock`, or `sync`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unlock" => Some(DeviceCommand::Unlock),
            "lock" => Some(DeviceCommand::Lock),
            "sync" => Some(DeviceCommand::Sync),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DeviceCommand {
    type Err = Fault;

    fn from_str(s: &str) -> Result<Self> {
        DeviceCommand::parse(s)
            .ok_or_else(|| Fault::unknown(format!("invalid device command: {s}")))
    }
}

/// Remote-defined lifecycle state of an asynchronous device action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Accepted by the API, not yet picked up by the device.
    Pending,
    /// The device is executing the action.
    Processing,
    /// The action finished; consult `successful` for the outcome.
    Terminated,
}

impl TaskStatus {
    /// Whether this status ends the polling loop.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Terminated)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Terminated => "terminated",
        };
        write!(f, "{s}")
    }
}

/// Snapshot of an asynchronous device action.
///
/// Created when a command dispatch returns a task id and refreshed by each
/// status poll. A terminated task with `successful == Some(false)` is a
/// normal terminal result (the device rejected the operation), not a fault.
/// Tasks are never persisted; they are discarded once terminal or timed out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionTask {
    /// Identifier the remote API assigned to this action.
    #[serde(default)]
    pub task_id: TaskId,

    /// Current lifecycle state.
    pub status: TaskStatus,

    /// Outcome flag; meaningful only once the status is terminal.
    #[serde(default)]
    pub successful: Option<bool>,

    /// Device-reported diagnostic for an unsuccessful action.
    #[serde(default)]
    pub error: Option<String>,
}

impl ActionTask {
    /// Whether the action reached a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether the action terminated successfully.
    ///
    /// A missing `successful` flag on a terminated task counts as failure.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.is_terminal() && self.successful.unwrap_or(false)
    }
}

/// Status payload of one device, as returned by `GET /devices/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Whether the lock is currently engaged.
    #[serde(default)]
    pub locked: Option<bool>,

    /// Battery charge percentage.
    #[serde(default)]
    pub battery: Option<i64>,

    /// Whether the cloud can currently reach the device.
    #[serde(default)]
    pub responsive: Option<bool>,
}

impl DeviceStatus {
    /// Whether the payload explicitly reports the device as unreachable.
    ///
    /// Only an explicit `responsive: false` counts; a missing field is
    /// treated as responsive, matching the remote API's contract.
    #[must_use]
    pub fn is_unresponsive(&self) -> bool {
        self.responsive == Some(false)
    }
}

/// One entry of the device listing returned by `GET /devices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device identifier, UUID-shaped.
    pub device_id: String,

    /// Hardware serial number.
    #[serde(default)]
    pub serial: Option<String>,

    /// User-assigned display name.
    #[serde(default)]
    pub nickname: Option<String>,
}

/// Caller-supplied recognition metadata attached to the audit trail.
///
/// The orchestrator copies this verbatim into the operation log; nothing in
/// the integration layer branches on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditContext {
    /// Recognized license plate that triggered the operation.
    #[serde(default)]
    pub license_plate: Option<String>,

    /// Recognition confidence, 0-100.
    #[serde(default)]
    pub recognition_confidence: Option<f64>,
}

impl AuditContext {
    /// Empty context (no recognition metadata).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the recognized license plate.
    #[must_use]
    pub fn with_license_plate(mut self, plate: impl Into<String>) -> Self {
        self.license_plate = Some(plate.into());
        self
    }

    /// Attach the recognition confidence.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.recognition_confidence = Some(confidence);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("00000000-0000-0000-0000-000000000001")]
    #[case("  5A4B1F0E-9C3D-4E2F-8A1B-7C6D5E4F3A2B  ")]
    fn test_device_id_valid(#[case] input: &str) {
        let id = DeviceId::new(input).unwrap();
        assert_eq!(id.as_str(), input.trim().to_ascii_lowercase());
    }

    #[rstest]
    #[case("")]
    #[case("not-a-uuid")]
    #[case("00000000-0000-0000-0000")]
    fn test_device_id_invalid(#[case] input: &str) {
        assert!(DeviceId::new(input).is_err());
    }

    #[test]
    fn test_device_id_deserializes_with_validation() {
        let id: DeviceId =
            serde_json::from_str("\"00000000-0000-0000-0000-000000000001\"").unwrap();
        assert_eq!(id.as_str(), "00000000-0000-0000-0000-000000000001");

        let bad: std::result::Result<DeviceId, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }

    #[rstest]
    #[case(DeviceCommand::Unlock, "unlock")]
    #[case(DeviceCommand::Lock, "lock")]
    #[case(DeviceCommand::Sync, "sync")]
    fn test_command_wire_form(#[case] command: DeviceCommand, #[case] wire: &str) {
        assert_eq!(command.as_str(), wire);
        assert_eq!(DeviceCommand::parse(wire), Some(command));
    }

    #[test]
    fn test_command_parse_rejects_unknown() {
        assert_eq!(DeviceCommand::parse("open"), None);
        assert!("open".parse::<DeviceCommand>().is_err());
    }

    #[test]
    fn test_action_task_from_wire_payload() {
        let task: ActionTask = serde_json::from_str(
            r#"{"status": "terminated", "successful": false, "error": "battery low"}"#,
        )
        .unwrap();

        assert!(task.is_terminal());
        assert!(!task.succeeded());
        assert_eq!(task.error.as_deref(), Some("battery low"));
    }

    #[test]
    fn test_action_task_non_terminal() {
        let task: ActionTask = serde_json::from_str(r#"{"status": "processing"}"#).unwrap();
        assert!(!task.is_terminal());
        assert!(!task.succeeded());
        assert_eq!(task.successful, None);
    }

    #[test]
    fn test_action_task_terminated_without_flag_is_failure() {
        let task: ActionTask = serde_json::from_str(r#"{"status": "terminated"}"#).unwrap();
        assert!(task.is_terminal());
        assert!(!task.succeeded());
    }

    #[test]
    fn test_device_status_offline_detection() {
        let offline: DeviceStatus =
            serde_json::from_str(r#"{"locked": true, "battery": 85, "responsive": false}"#)
                .unwrap();
        assert!(offline.is_unresponsive());

        let online: DeviceStatus = serde_json::from_str(r#"{"locked": true}"#).unwrap();
        assert!(!online.is_unresponsive());
    }

    #[test]
    fn test_audit_context_builder() {
        let ctx = AuditContext::new()
            .with_license_plate("ABC-1234")
            .with_confidence(97.5);

        assert_eq!(ctx.license_plate.as_deref(), Some("ABC-1234"));
        assert_eq!(ctx.recognition_confidence, Some(97.5));
    }
}

use chrono::{DateTime, Utc};
use gatekey_core::{AuditContext, DeviceCommand, DeviceId, TaskId};
use serde::{Deserialize, Serialize};

/// Audit row describing one attempted gate operation
///
/// One row is created per invocation of the operation orchestrator,
/// regardless of the outcome - success, device-side rejection, or
/// integration fault. The orchestrator never reads rows back; hosts query
/// them through [`crate::repositories::OperationLogRepository`] for
/// monitoring and forensics.
///
/// # Fields
///
/// * `id` - Auto-increment primary key
/// * `device_id` - Device the command was addressed to
/// * `operation` - Wire form of the command (`unlock`, `lock`, `sync`)
/// * `success` - Whether the device executed the command
/// * `license_plate` - Recognized plate that triggered the operation, if any
/// * `recognition_confidence` - Recognition confidence (0-100), if any
/// * `task_id` - Remote action id, when dispatch got far enough to have one
/// * `error_message` - Device-reported reason or fault message on failure
/// * `created_at` - When the record was written
///
/// Rows are write-once: nothing in the system updates or deletes them, only
/// archiving jobs outside this codebase ever should.
///
/// # Examples
///
/// ```
/// use gatekey_core::{AuditContext, DeviceCommand, DeviceId, TaskId};
/// use gatekey_storage::OperationLog;
///
/// let device_id = DeviceId::new("00000000-0000-0000-0000-000000000001").unwrap();
/// let task_id = TaskId::from("task-1");
///
/// let log = OperationLog::new(
///     &device_id,
///     DeviceCommand::Unlock,
///     true,
///     Some(&task_id),
///     None,
///     &AuditContext::new().with_license_plate("ABC-1234"),
/// );
///
/// assert!(log.was_successful());
/// assert_eq!(log.get_command(), Some(DeviceCommand::Unlock));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OperationLog {
    /// Auto-increment primary key
    pub id: i64,

    /// Device the command was addressed to
    pub device_id: String,

    /// Wire form of the dispatched command
    ///
    /// Stored as TEXT; use [`get_command`](Self::get_command) to convert
    /// back to the [`DeviceCommand`] enum.
    pub operation: String,

    /// Whether the device executed the command
    ///
    /// `false` covers both device-side rejections and integration faults;
    /// `error_message` distinguishes them.
    pub success: bool,

    /// Recognized license plate that triggered the operation
    pub license_plate: Option<String>,

    /// Recognition confidence, 0-100
    pub recognition_confidence: Option<f64>,

    /// Remote action id, present when the dispatch returned one
    pub task_id: Option<String>,

    /// Device-reported reason or fault message, present on failure
    pub error_message: Option<String>,

    /// Record creation timestamp
    pub created_at: DateTime<Utc>,
}

impl OperationLog {
    /// Create a new operation log entry
    #[must_use]
    pub fn new(
        device_id: &DeviceId,
        command: DeviceCommand,
        success: bool,
        task_id: Option<&TaskId>,
        error_message: Option<String>,
        audit: &AuditContext,
    ) -> Self {
        Self {
            id: 0, // Will be set by database
            device_id: device_id.as_str().to_string(),
            operation: command.as_str().to_string(),
            success,
            license_plate: audit.license_plate.clone(),
            recognition_confidence: audit.recognition_confidence,
            task_id: task_id.map(|t| t.as_str().to_string()),
            error_message,
            created_at: Utc::now(),
        }
    }

    /// Get the operation as a typed command
    #[must_use]
    pub fn get_command(&self) -> Option<DeviceCommand> {
        DeviceCommand::parse(&self.operation)
    }

    /// Check if the device executed the command
    #[must_use]
    pub fn was_successful(&self) -> bool {
        self.success
    }

    /// Check if the operation failed (rejected or faulted)
    #[must_use]
    pub fn was_failed(&self) -> bool {
        !self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_device_id() -> DeviceId {
        DeviceId::new("00000000-0000-0000-0000-000000000001").unwrap()
    }

    #[test]
    fn test_new_success_row() {
        let task_id = TaskId::from("task-1");
        let log = OperationLog::new(
            &test_device_id(),
            DeviceCommand::Unlock,
            true,
            Some(&task_id),
            None,
            &AuditContext::new()
                .with_license_plate("ABC-1234")
                .with_confidence(98.5),
        );

        assert_eq!(log.device_id, "00000000-0000-0000-0000-000000000001");
        assert_eq!(log.operation, "unlock");
        assert!(log.was_successful());
        assert_eq!(log.task_id.as_deref(), Some("task-1"));
        assert_eq!(log.license_plate.as_deref(), Some("ABC-1234"));
        assert_eq!(log.recognition_confidence, Some(98.5));
        assert_eq!(log.error_message, None);
    }

    #[test]
    fn test_new_failure_row_without_task() {
        let log = OperationLog::new(
            &test_device_id(),
            DeviceCommand::Lock,
            false,
            None,
            Some("device API rejected the configured API key".to_string()),
            &AuditContext::new(),
        );

        assert!(log.was_failed());
        assert_eq!(log.task_id, None);
        assert_eq!(log.license_plate, None);
        assert!(log.error_message.is_some());
    }

    #[test]
    fn test_get_command_round_trip() {
        let log = OperationLog::new(
            &test_device_id(),
            DeviceCommand::Sync,
            true,
            None,
            None,
            &AuditContext::new(),
        );

        assert_eq!(log.get_command(), Some(DeviceCommand::Sync));
    }

    #[test]
    fn test_get_command_unknown_text() {
        let mut log = OperationLog::new(
            &test_device_id(),
            DeviceCommand::Sync,
            true,
            None,
            None,
            &AuditContext::new(),
        );
        log.operation = "reboot".to_string();

        assert_eq!(log.get_command(), None);
    }
}

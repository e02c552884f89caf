use gatekey_core::{Fault, TaskId};

/// Final result of one orchestrated gate operation.
///
/// Callers are expected to match exhaustively; a host presentation layer
/// maps the variants onto its own transport (HTTP status codes, display
/// messages, ...).
#[derive(Debug, Clone)]
pub enum OperationOutcome {
    /// The device executed the command.
    Completed {
        /// Remote action that carried the command out.
        task_id: TaskId,
    },

    /// The device received the command and refused it.
    ///
    /// A device-side verdict (low battery, jammed bolt, ...), not an
    /// integration fault; it is never retried automatically.
    Rejected {
        /// Device-reported reason.
        reason: String,
    },

    /// The integration layer faulted before a device verdict was reached.
    Failed {
        /// Classified fault, always one of the taxonomy kinds.
        fault: Fault,
    },
}

impl OperationOutcome {
    /// Returns `true` if the device executed the command.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, OperationOutcome::Completed { .. })
    }

    /// Returns `true` if the device refused the command.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, OperationOutcome::Rejected { .. })
    }

    /// Returns `true` if the integration layer faulted.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, OperationOutcome::Failed { .. })
    }

    /// The completed operation's task id, if any.
    #[must_use]
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            OperationOutcome::Completed { task_id } => Some(task_id),
            _ => None,
        }
    }

    /// The fault, if the operation failed.
    #[must_use]
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            OperationOutcome::Failed { fault } => Some(fault),
            _ => None,
        }
    }
}

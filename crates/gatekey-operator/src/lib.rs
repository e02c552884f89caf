//! Gate operation orchestration.
//!
//! This crate ties the device API client and the audit log together into the
//! top-level use case: *perform one gate operation and account for it*.
//! A [`GateOperator::perform`] call dispatches the command, waits for the
//! asynchronous device action to terminate, classifies the result into an
//! [`OperationOutcome`], and writes exactly one audit row - on every path,
//! including faults.
//!
//! # Outcome model
//!
//! Three things can happen to a gate operation, and they are deliberately
//! kept distinct:
//!
//! - [`OperationOutcome::Completed`] - the device executed the command.
//! - [`OperationOutcome::Rejected`] - the device received the command and
//!   refused it (low battery, jammed bolt). A device verdict, not an
//!   integration failure; it is never retried automatically.
//! - [`OperationOutcome::Failed`] - the integration layer faulted before a
//!   device verdict was reached (network, auth, timeout, ...).
//!
//! # Example
//!
//! ```no_run
//! use gatekey_client::{ApiClientConfig, DeviceApiClient};
//! use gatekey_core::{AuditContext, DeviceCommand, DeviceId};
//! use gatekey_operator::{GateOperator, OperationOutcome};
//! use gatekey_storage::{Database, DatabaseConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DeviceApiClient::new(ApiClientConfig::new(
//!     "https://api.example.com/v1",
//!     "api-key",
//! ))?;
//! let db = Database::new(DatabaseConfig::new("gatekey.db")).await?;
//! let operator = GateOperator::new(client, db.pool().clone());
//!
//! let device_id = DeviceId::new("00000000-0000-0000-0000-000000000001")?;
//! let audit = AuditContext::new().with_license_plate("ABC-1234");
//!
//! match operator.perform(&device_id, DeviceCommand::Unlock, audit).await {
//!     OperationOutcome::Completed { task_id } => println!("unlocked ({task_id})"),
//!     OperationOutcome::Rejected { reason } => println!("device refused: {reason}"),
//!     OperationOutcome::Failed { fault } => println!("fault: {fault}"),
//! }
//! # Ok(())
//! # }
//! ```

mod operator;
mod outcome;

pub use operator::{GateOperator, GateOperatorConfig};
pub use outcome::OperationOutcome;

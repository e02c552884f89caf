//! HTTP client for the smart-lock device API.
//!
//! This crate talks to the remote vendor service that controls the physical
//! gate locks. It layers three concerns on top of a plain HTTP call:
//!
//! - **Execution**: one request with a fixed timeout, converting transport
//!   and HTTP errors into classified [`gatekey_core::Fault`]s.
//! - **Retry**: a bounded retry loop with exponential backoff ([`RetryPolicy`])
//!   that retries transient fault kinds and propagates the rest immediately.
//! - **Polling**: command dispatches return a task id; `await_completion`
//!   polls the action-result endpoint until the task terminates or a
//!   wall-clock deadline expires.
//!
//! # Example
//!
//! ```no_run
//! use gatekey_client::{ApiClientConfig, DeviceApiClient};
//! use gatekey_core::DeviceId;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ApiClientConfig::new("https://api.example.com/v1", "api-key")
//!     .timeout(Duration::from_secs(5));
//! let client = DeviceApiClient::new(config)?;
//!
//! let device_id = DeviceId::new("00000000-0000-0000-0000-000000000001")?;
//! let receipt = client.unlock(&device_id).await?;
//! println!("dispatched: {:?}", receipt.task_id);
//! # Ok(())
//! # }
//! ```
//!
//! # Design Principles
//!
//! The retry policy is identical for every command; the client never inspects
//! what a request *means* before retrying it. Waiting (backoff, poll
//! interval) suspends only the calling task via `tokio::time::sleep`, so
//! concurrent operations in the same host are unaffected. There is no
//! mid-flight cancellation: once a request is sent it runs to completion or
//! to its transport timeout.

mod client;
mod poll;
mod retry;

pub use client::{ApiClientConfig, CommandReceipt, DeviceApiClient};
pub use retry::RetryPolicy;

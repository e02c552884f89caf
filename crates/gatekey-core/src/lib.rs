//! Core types for the gatekey smart-lock integration.
//!
//! This crate defines the vocabulary shared by every other gatekey crate:
//! the closed fault taxonomy ([`Fault`], [`FaultKind`]), the domain newtypes
//! ([`DeviceId`], [`TaskId`], [`DeviceCommand`]), the remote-task model
//! ([`ActionTask`]), and the protocol constants (endpoint paths, retry and
//! polling defaults).

pub mod constants;
pub mod fault;
pub mod types;

pub use fault::{Fault, FaultKind, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

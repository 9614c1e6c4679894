//! Bill workflow management for Siren.
//!
//! This module implements the bill lifecycle state machine: the role-based
//! transition policy, validation of guarded transitions and payment
//! recording, and the error taxonomy surfaced to callers.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (BillStatus, Role, Principal, Transition)
//! - `policy` - The single transition-policy table
//! - `service` - Stateless transition validation
//! - `error` - Workflow-specific error types

pub mod error;
pub mod policy;
pub mod service;
pub mod types;

#[cfg(test)]
mod policy_props;

pub use error::WorkflowError;
pub use service::{BillDraft, PaymentDraft, WorkflowService};
pub use types::{BillStatus, Principal, Role, Transition, ALL_ROLES, ALL_STATUSES};

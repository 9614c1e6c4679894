//! Workflow-specific error types.

use crate::workflow::types::{BillStatus, Role};
use siren_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by workflow validation and execution.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Input failed field validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Bill not found.
    #[error("Bill not found: {0}")]
    BillNotFound(Uuid),

    /// Ambulance not found.
    #[error("Ambulance not found: {0}")]
    AmbulanceNotFound(Uuid),

    /// The caller's account is deactivated.
    #[error("User account is inactive")]
    PrincipalInactive,

    /// The caller's role cannot create bills.
    #[error("Role {role} cannot create bills")]
    RoleCannotCreate {
        /// Role of the caller.
        role: Role,
    },

    /// The requested initial status is not allowed for the caller's role.
    #[error("Role {role} cannot create a bill in status {status}")]
    InitialStatusNotAllowed {
        /// Role of the caller.
        role: Role,
        /// Requested initial status.
        status: BillStatus,
    },

    /// The policy table does not allow this transition for this role.
    #[error("Role {role} cannot move a bill from {from} to {to}")]
    TransitionNotAllowed {
        /// Role of the caller.
        role: Role,
        /// Current bill status.
        from: BillStatus,
        /// Requested target status.
        to: BillStatus,
    },

    /// `PAID` was requested through the transition operation.
    #[error("PAID is reached by recording a payment, not by direct transition")]
    PaidViaTransition,

    /// The operator is not assigned to the bill's ambulance.
    #[error("User {operator} is not assigned to ambulance {ambulance}")]
    NotAssigned {
        /// The operator attempting the action.
        operator: Uuid,
        /// The ambulance the bill belongs to.
        ambulance: Uuid,
    },

    /// Payment recording attempted while the bill is not awaiting payment.
    #[error("Bill is in status {status}, payment can only be recorded in PENDING_PAYMENT")]
    NotReadyForPayment {
        /// Current bill status.
        status: BillStatus,
    },

    /// Database error during workflow execution.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for the error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::PaidViaTransition => 400,
            Self::PrincipalInactive
            | Self::RoleCannotCreate { .. }
            | Self::InitialStatusNotAllowed { .. }
            | Self::TransitionNotAllowed { .. }
            | Self::NotAssigned { .. } => 403,
            Self::BillNotFound(_) | Self::AmbulanceNotFound(_) => 404,
            Self::NotReadyForPayment { .. } => 409,
            Self::Database(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BillNotFound(_) => "BILL_NOT_FOUND",
            Self::AmbulanceNotFound(_) => "AMBULANCE_NOT_FOUND",
            Self::PrincipalInactive => "USER_INACTIVE",
            Self::RoleCannotCreate { .. } => "ROLE_CANNOT_CREATE",
            Self::InitialStatusNotAllowed { .. } => "INITIAL_STATUS_NOT_ALLOWED",
            Self::TransitionNotAllowed { .. } => "TRANSITION_NOT_ALLOWED",
            Self::PaidViaTransition => "PAID_VIA_TRANSITION",
            Self::NotAssigned { .. } => "NOT_ASSIGNED",
            Self::NotReadyForPayment { .. } => "NOT_READY_FOR_PAYMENT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err {
            WorkflowError::Validation(_) | WorkflowError::PaidViaTransition => {
                Self::Validation(message)
            }
            WorkflowError::BillNotFound(_) | WorkflowError::AmbulanceNotFound(_) => {
                Self::NotFound(message)
            }
            WorkflowError::PrincipalInactive
            | WorkflowError::RoleCannotCreate { .. }
            | WorkflowError::InitialStatusNotAllowed { .. }
            | WorkflowError::TransitionNotAllowed { .. }
            | WorkflowError::NotAssigned { .. } => Self::Forbidden(message),
            WorkflowError::NotReadyForPayment { .. } => Self::Conflict(message),
            WorkflowError::Database(_) => Self::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(WorkflowError::Validation("x".into()).status_code(), 400);
        assert_eq!(WorkflowError::PaidViaTransition.status_code(), 400);
        assert_eq!(WorkflowError::PrincipalInactive.status_code(), 403);
        assert_eq!(
            WorkflowError::TransitionNotAllowed {
                role: Role::Level1,
                from: BillStatus::PendingL2,
                to: BillStatus::PendingPayment,
            }
            .status_code(),
            403
        );
        assert_eq!(
            WorkflowError::BillNotFound(Uuid::new_v4()).status_code(),
            404
        );
        assert_eq!(
            WorkflowError::NotReadyForPayment {
                status: BillStatus::Paid
            }
            .status_code(),
            409
        );
        assert_eq!(WorkflowError::Database("down".into()).status_code(), 500);
    }

    #[test]
    fn test_app_error_mapping_preserves_status() {
        let err = WorkflowError::NotReadyForPayment {
            status: BillStatus::PendingL1,
        };
        let status = err.status_code();
        let app: AppError = err.into();
        assert_eq!(app.status_code(), status);
        assert_eq!(app.error_code(), "CONFLICT");
    }

    #[test]
    fn test_transition_message_names_role_and_statuses() {
        let err = WorkflowError::TransitionNotAllowed {
            role: Role::Accounts,
            from: BillStatus::PendingL1,
            to: BillStatus::Paid,
        };
        let msg = err.to_string();
        assert!(msg.contains("ACCOUNTS"));
        assert!(msg.contains("PENDING_L1"));
        assert!(msg.contains("PAID"));
    }
}

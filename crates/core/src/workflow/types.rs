//! Workflow domain types for bill lifecycle management.
//!
//! This module defines the core types used for managing bill status
//! transitions through the review-and-payment workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Bill status in the approval workflow.
///
/// Bills progress through these states from submission to payment:
/// - `PENDING_L1` → `PENDING_L2` | `RETURNED_L1` | `REJECTED_L1` (level-1 review)
/// - `PENDING_L2` → `PENDING_PAYMENT` | `RETURNED_L2` | `REJECTED_L2` (level-2 review)
/// - `PENDING_PAYMENT` → `PAID` (payment recording only)
///
/// `RETURNED_L1`/`RETURNED_L2` are dead ends: no role moves a bill out of
/// them, and re-submission means creating a fresh bill upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillStatus {
    /// Awaiting level-1 review.
    PendingL1,
    /// Awaiting level-2 review.
    PendingL2,
    /// Approved through both levels, awaiting payment.
    PendingPayment,
    /// Payment recorded (terminal).
    Paid,
    /// Sent back by level-1 review (dead end, no re-entry transition).
    ReturnedL1,
    /// Rejected by level-1 review (terminal).
    RejectedL1,
    /// Sent back by level-2 review (dead end, no re-entry transition).
    ReturnedL2,
    /// Rejected by level-2 review (terminal).
    RejectedL2,
}

/// All bill statuses, for iteration in tests and wire validation.
pub const ALL_STATUSES: [BillStatus; 8] = [
    BillStatus::PendingL1,
    BillStatus::PendingL2,
    BillStatus::PendingPayment,
    BillStatus::Paid,
    BillStatus::ReturnedL1,
    BillStatus::RejectedL1,
    BillStatus::ReturnedL2,
    BillStatus::RejectedL2,
];

impl BillStatus {
    /// Returns the wire representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingL1 => "PENDING_L1",
            Self::PendingL2 => "PENDING_L2",
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::Paid => "PAID",
            Self::ReturnedL1 => "RETURNED_L1",
            Self::RejectedL1 => "REJECTED_L1",
            Self::ReturnedL2 => "RETURNED_L2",
            Self::RejectedL2 => "REJECTED_L2",
        }
    }

    /// Parses a status from its wire representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING_L1" => Some(Self::PendingL1),
            "PENDING_L2" => Some(Self::PendingL2),
            "PENDING_PAYMENT" => Some(Self::PendingPayment),
            "PAID" => Some(Self::Paid),
            "RETURNED_L1" => Some(Self::ReturnedL1),
            "REJECTED_L1" => Some(Self::RejectedL1),
            "RETURNED_L2" => Some(Self::ReturnedL2),
            "REJECTED_L2" => Some(Self::RejectedL2),
            _ => None,
        }
    }

    /// Returns true for terminal statuses.
    ///
    /// `RETURNED_*` are dead ends under the current policy but are not
    /// flagged terminal in the data model, so they report false here.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::RejectedL1 | Self::RejectedL2)
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User role in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full access, including the administrative reroute override.
    Admin,
    /// Submits bills for their assigned ambulances.
    Operator,
    /// First-level reviewer.
    Level1,
    /// Second-level reviewer.
    Level2,
    /// Records payments.
    Accounts,
}

/// All roles, for iteration in tests.
pub const ALL_ROLES: [Role; 5] = [
    Role::Admin,
    Role::Operator,
    Role::Level1,
    Role::Level2,
    Role::Accounts,
];

impl Role {
    /// Returns the wire representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Operator => "OPERATOR",
            Self::Level1 => "LEVEL1",
            Self::Level2 => "LEVEL2",
            Self::Accounts => "ACCOUNTS",
        }
    }

    /// Parses a role from its wire representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ADMIN" => Some(Self::Admin),
            "OPERATOR" => Some(Self::Operator),
            "LEVEL1" => Some(Self::Level1),
            "LEVEL2" => Some(Self::Level2),
            "ACCOUNTS" => Some(Self::Accounts),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The authenticated caller, as supplied by the upstream request layer.
///
/// The engine trusts only id, role, and active flag; authentication itself
/// happens upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    /// User id.
    pub id: Uuid,
    /// Workflow role.
    pub role: Role,
    /// Inactive principals are rejected by every operation.
    pub is_active: bool,
}

impl Principal {
    /// Creates a new principal.
    #[must_use]
    pub const fn new(id: Uuid, role: Role, is_active: bool) -> Self {
        Self {
            id,
            role,
            is_active,
        }
    }
}

/// A validated status transition, ready to be applied atomically together
/// with its audit log row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Status before the transition. `None` only for the creation entry.
    pub from: Option<BillStatus>,
    /// Status after the transition.
    pub to: BillStatus,
    /// The user performing the transition.
    pub actor: Uuid,
    /// Optional note recorded in the audit log.
    pub note: Option<String>,
    /// When the transition was validated.
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(BillStatus::PendingL1.as_str(), "PENDING_L1");
        assert_eq!(BillStatus::PendingPayment.as_str(), "PENDING_PAYMENT");
        assert_eq!(BillStatus::Paid.as_str(), "PAID");
        assert_eq!(BillStatus::RejectedL2.as_str(), "REJECTED_L2");
    }

    #[test]
    fn test_status_parse_round_trip() {
        for status in ALL_STATUSES {
            assert_eq!(BillStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BillStatus::parse("pending_l1"), Some(BillStatus::PendingL1));
        assert_eq!(BillStatus::parse("invalid"), None);
    }

    #[test]
    fn test_status_terminal() {
        assert!(BillStatus::Paid.is_terminal());
        assert!(BillStatus::RejectedL1.is_terminal());
        assert!(BillStatus::RejectedL2.is_terminal());
        // Returned statuses are dead ends but not flagged terminal.
        assert!(!BillStatus::ReturnedL1.is_terminal());
        assert!(!BillStatus::ReturnedL2.is_terminal());
        assert!(!BillStatus::PendingL1.is_terminal());
    }

    #[test]
    fn test_role_parse_round_trip() {
        for role in ALL_ROLES {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("operator"), Some(Role::Operator));
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn test_status_serde_wire_form() {
        let json = serde_json::to_string(&BillStatus::PendingPayment).unwrap();
        assert_eq!(json, "\"PENDING_PAYMENT\"");
    }
}

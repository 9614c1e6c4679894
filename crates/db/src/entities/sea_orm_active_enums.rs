//! Database enum types mapped to Postgres enums.
//!
//! Conversions to and from the domain enums live here so repositories never
//! match on raw database values.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use siren_core::workflow;

/// Bill status enum, stored as the `bill_status` Postgres type.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "bill_status")]
pub enum BillStatus {
    /// Awaiting level-1 review.
    #[sea_orm(string_value = "PENDING_L1")]
    PendingL1,
    /// Awaiting level-2 review.
    #[sea_orm(string_value = "PENDING_L2")]
    PendingL2,
    /// Awaiting payment.
    #[sea_orm(string_value = "PENDING_PAYMENT")]
    PendingPayment,
    /// Paid.
    #[sea_orm(string_value = "PAID")]
    Paid,
    /// Returned by level-1 review.
    #[sea_orm(string_value = "RETURNED_L1")]
    ReturnedL1,
    /// Rejected by level-1 review.
    #[sea_orm(string_value = "REJECTED_L1")]
    RejectedL1,
    /// Returned by level-2 review.
    #[sea_orm(string_value = "RETURNED_L2")]
    ReturnedL2,
    /// Rejected by level-2 review.
    #[sea_orm(string_value = "REJECTED_L2")]
    RejectedL2,
}

impl From<workflow::BillStatus> for BillStatus {
    fn from(status: workflow::BillStatus) -> Self {
        match status {
            workflow::BillStatus::PendingL1 => Self::PendingL1,
            workflow::BillStatus::PendingL2 => Self::PendingL2,
            workflow::BillStatus::PendingPayment => Self::PendingPayment,
            workflow::BillStatus::Paid => Self::Paid,
            workflow::BillStatus::ReturnedL1 => Self::ReturnedL1,
            workflow::BillStatus::RejectedL1 => Self::RejectedL1,
            workflow::BillStatus::ReturnedL2 => Self::ReturnedL2,
            workflow::BillStatus::RejectedL2 => Self::RejectedL2,
        }
    }
}

impl From<&BillStatus> for workflow::BillStatus {
    fn from(status: &BillStatus) -> Self {
        match status {
            BillStatus::PendingL1 => Self::PendingL1,
            BillStatus::PendingL2 => Self::PendingL2,
            BillStatus::PendingPayment => Self::PendingPayment,
            BillStatus::Paid => Self::Paid,
            BillStatus::ReturnedL1 => Self::ReturnedL1,
            BillStatus::RejectedL1 => Self::RejectedL1,
            BillStatus::ReturnedL2 => Self::ReturnedL2,
            BillStatus::RejectedL2 => Self::RejectedL2,
        }
    }
}

/// User role enum, stored as the `user_role` Postgres type.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
pub enum UserRole {
    /// Full access including the reroute override.
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    /// Submits bills.
    #[sea_orm(string_value = "OPERATOR")]
    Operator,
    /// First-level reviewer.
    #[sea_orm(string_value = "LEVEL1")]
    Level1,
    /// Second-level reviewer.
    #[sea_orm(string_value = "LEVEL2")]
    Level2,
    /// Records payments.
    #[sea_orm(string_value = "ACCOUNTS")]
    Accounts,
}

impl From<workflow::Role> for UserRole {
    fn from(role: workflow::Role) -> Self {
        match role {
            workflow::Role::Admin => Self::Admin,
            workflow::Role::Operator => Self::Operator,
            workflow::Role::Level1 => Self::Level1,
            workflow::Role::Level2 => Self::Level2,
            workflow::Role::Accounts => Self::Accounts,
        }
    }
}

impl From<&UserRole> for workflow::Role {
    fn from(role: &UserRole) -> Self {
        match role {
            UserRole::Admin => Self::Admin,
            UserRole::Operator => Self::Operator,
            UserRole::Level1 => Self::Level1,
            UserRole::Level2 => Self::Level2,
            UserRole::Accounts => Self::Accounts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siren_core::workflow::{ALL_ROLES, ALL_STATUSES};

    #[test]
    fn test_status_conversion_round_trip() {
        for status in ALL_STATUSES {
            let db: BillStatus = status.into();
            assert_eq!(workflow::BillStatus::from(&db), status);
        }
    }

    #[test]
    fn test_role_conversion_round_trip() {
        for role in ALL_ROLES {
            let db: UserRole = role.into();
            assert_eq!(workflow::Role::from(&db), role);
        }
    }
}

//! The role-based transition policy.
//!
//! This is the single source of truth for which status changes each role may
//! perform. Every entry point (guarded transitions, payment recording, bill
//! creation) consults this table instead of re-implementing role checks per
//! call site.

use crate::workflow::types::{BillStatus, Role};

/// Returns the set of statuses `role` may move a bill to from `current`.
///
/// Pure and total over the (role, status) domain; pairs outside the policy
/// table yield the empty set. The ADMIN rows are an administrative
/// override: an admin may reroute any bill (terminal ones included) to any
/// of the three pending statuses, bypassing the hierarchical order.
#[must_use]
pub fn allowed_next_statuses(role: Role, current: BillStatus) -> &'static [BillStatus] {
    match (role, current) {
        (Role::Level1, BillStatus::PendingL1) => &[
            BillStatus::PendingL2,
            BillStatus::ReturnedL1,
            BillStatus::RejectedL1,
        ],
        (Role::Level2, BillStatus::PendingL2) => &[
            BillStatus::PendingPayment,
            BillStatus::ReturnedL2,
            BillStatus::RejectedL2,
        ],
        // PAID is reachable only through payment recording; the transition
        // operation refuses it even though the policy row exists.
        (Role::Accounts, BillStatus::PendingPayment) => &[BillStatus::Paid],
        (Role::Admin, _) => &[
            BillStatus::PendingL1,
            BillStatus::PendingL2,
            BillStatus::PendingPayment,
        ],
        _ => &[],
    }
}

/// Returns the statuses a bill created by `role` may start in.
///
/// Operators always start bills at `PENDING_L1`; admins may choose any of
/// the three pending statuses. Other roles cannot create bills.
#[must_use]
pub fn initial_statuses(role: Role) -> &'static [BillStatus] {
    match role {
        Role::Operator => &[BillStatus::PendingL1],
        Role::Admin => &[
            BillStatus::PendingL1,
            BillStatus::PendingL2,
            BillStatus::PendingPayment,
        ],
        _ => &[],
    }
}

/// Checks whether `role` may move a bill from `current` to `target`.
#[must_use]
pub fn is_allowed(role: Role, current: BillStatus, target: BillStatus) -> bool {
    allowed_next_statuses(role, current).contains(&target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::ALL_STATUSES;
    use rstest::rstest;

    #[test]
    fn test_level1_acts_only_on_pending_l1() {
        assert_eq!(
            allowed_next_statuses(Role::Level1, BillStatus::PendingL1),
            &[
                BillStatus::PendingL2,
                BillStatus::ReturnedL1,
                BillStatus::RejectedL1,
            ]
        );
        for status in ALL_STATUSES {
            if status != BillStatus::PendingL1 {
                assert!(allowed_next_statuses(Role::Level1, status).is_empty());
            }
        }
    }

    #[test]
    fn test_level2_acts_only_on_pending_l2() {
        assert_eq!(
            allowed_next_statuses(Role::Level2, BillStatus::PendingL2),
            &[
                BillStatus::PendingPayment,
                BillStatus::ReturnedL2,
                BillStatus::RejectedL2,
            ]
        );
        for status in ALL_STATUSES {
            if status != BillStatus::PendingL2 {
                assert!(allowed_next_statuses(Role::Level2, status).is_empty());
            }
        }
    }

    #[test]
    fn test_accounts_acts_only_on_pending_payment() {
        assert_eq!(
            allowed_next_statuses(Role::Accounts, BillStatus::PendingPayment),
            &[BillStatus::Paid]
        );
        for status in ALL_STATUSES {
            if status != BillStatus::PendingPayment {
                assert!(allowed_next_statuses(Role::Accounts, status).is_empty());
            }
        }
    }

    #[test]
    fn test_admin_override_from_any_status() {
        // Including terminal statuses: the reroute escape hatch is deliberate.
        for status in ALL_STATUSES {
            assert_eq!(
                allowed_next_statuses(Role::Admin, status),
                &[
                    BillStatus::PendingL1,
                    BillStatus::PendingL2,
                    BillStatus::PendingPayment,
                ]
            );
        }
    }

    #[test]
    fn test_admin_can_reroute_paid_bill() {
        assert!(is_allowed(Role::Admin, BillStatus::Paid, BillStatus::PendingL2));
    }

    #[test]
    fn test_operator_has_no_transitions() {
        for status in ALL_STATUSES {
            assert!(allowed_next_statuses(Role::Operator, status).is_empty());
        }
    }

    #[rstest]
    #[case(Role::Operator, &[BillStatus::PendingL1])]
    #[case(Role::Admin, &[BillStatus::PendingL1, BillStatus::PendingL2, BillStatus::PendingPayment])]
    #[case(Role::Level1, &[])]
    #[case(Role::Level2, &[])]
    #[case(Role::Accounts, &[])]
    fn test_initial_statuses(#[case] role: Role, #[case] expected: &[BillStatus]) {
        assert_eq!(initial_statuses(role), expected);
    }

    #[test]
    fn test_returned_statuses_are_dead_ends() {
        for status in [BillStatus::ReturnedL1, BillStatus::ReturnedL2] {
            for role in [Role::Operator, Role::Level1, Role::Level2, Role::Accounts] {
                assert!(allowed_next_statuses(role, status).is_empty());
            }
        }
    }
}

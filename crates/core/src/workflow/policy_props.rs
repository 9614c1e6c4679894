//! Property-based tests for the transition policy.

use proptest::prelude::*;

use crate::workflow::policy;
use crate::workflow::types::{BillStatus, Role, ALL_ROLES, ALL_STATUSES};

fn any_status() -> impl Strategy<Value = BillStatus> {
    proptest::sample::select(ALL_STATUSES.to_vec())
}

fn any_role() -> impl Strategy<Value = Role> {
    proptest::sample::select(ALL_ROLES.to_vec())
}

proptest! {
    /// The policy is total: every (role, status) pair yields a well-formed
    /// set, and membership agrees with `is_allowed`.
    #[test]
    fn policy_total_and_consistent(role in any_role(), current in any_status()) {
        let allowed = policy::allowed_next_statuses(role, current);
        for status in ALL_STATUSES {
            prop_assert_eq!(
                policy::is_allowed(role, current, status),
                allowed.contains(&status)
            );
        }
    }

    /// No role except ADMIN can move a bill out of a terminal status.
    #[test]
    fn terminal_statuses_are_final_for_non_admins(role in any_role(), current in any_status()) {
        prop_assume!(current.is_terminal());
        prop_assume!(role != Role::Admin);
        prop_assert!(policy::allowed_next_statuses(role, current).is_empty());
    }

    /// ADMIN reroutes always land on a pending status, never a terminal or
    /// returned one.
    #[test]
    fn admin_targets_are_pending(current in any_status(), target in any_status()) {
        if policy::is_allowed(Role::Admin, current, target) {
            prop_assert!(matches!(
                target,
                BillStatus::PendingL1 | BillStatus::PendingL2 | BillStatus::PendingPayment
            ));
        }
    }

    /// PAID is only ever reachable by ACCOUNTS from PENDING_PAYMENT.
    #[test]
    fn paid_only_from_accounts(role in any_role(), current in any_status()) {
        if policy::is_allowed(role, current, BillStatus::Paid) {
            prop_assert_eq!(role, Role::Accounts);
            prop_assert_eq!(current, BillStatus::PendingPayment);
        }
    }

    /// Non-admin transitions never move a bill backwards in the chain;
    /// reviewers only forward, return, or reject at their own level.
    #[test]
    fn reviewer_sets_match_their_level(current in any_status(), target in any_status()) {
        if policy::is_allowed(Role::Level1, current, target) {
            prop_assert_eq!(current, BillStatus::PendingL1);
        }
        if policy::is_allowed(Role::Level2, current, target) {
            prop_assert_eq!(current, BillStatus::PendingL2);
        }
    }
}

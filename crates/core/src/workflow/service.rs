//! Stateless workflow validation.
//!
//! `WorkflowService` validates bill creation, guarded transitions, and
//! payment recording against the policy table and produces the `Transition`
//! record to persist. It holds no state and touches no storage; the
//! repository layer re-runs these checks inside its transaction before
//! applying the result.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::policy;
use crate::workflow::types::{BillStatus, Principal, Role, Transition};

/// Note recorded on the audit entry written at bill creation.
const CREATION_NOTE: &str = "Bill submitted";

/// Validated input for creating a bill.
#[derive(Debug, Clone)]
pub struct BillDraft {
    /// Ambulance the expense belongs to.
    pub ambulance_id: Uuid,
    /// Short title of the expense.
    pub title: String,
    /// Vendor the expense was incurred with.
    pub vendor: String,
    /// Claimed amount. Must be positive.
    pub amount: Decimal,
    /// ISO 4217 currency code tagging the amount.
    pub currency: String,
    /// Vendor invoice number.
    pub invoice_number: String,
    /// Date on the vendor invoice.
    pub invoice_date: NaiveDate,
    /// Optional free-form description.
    pub description: Option<String>,
}

impl BillDraft {
    /// Validates field-level constraints.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.title.trim().len() < 3 {
            return Err(WorkflowError::Validation(
                "title must be at least 3 characters".to_string(),
            ));
        }
        if self.vendor.trim().len() < 2 {
            return Err(WorkflowError::Validation(
                "vendor must be at least 2 characters".to_string(),
            ));
        }
        if self.amount <= Decimal::ZERO {
            return Err(WorkflowError::Validation(
                "amount must be positive".to_string(),
            ));
        }
        let currency = self.currency.trim();
        if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(WorkflowError::Validation(
                "currency must be a three-letter ISO 4217 code".to_string(),
            ));
        }
        if self.invoice_number.trim().len() < 2 {
            return Err(WorkflowError::Validation(
                "invoice number must be at least 2 characters".to_string(),
            ));
        }
        Ok(())
    }
}

/// Validated input for recording a payment.
#[derive(Debug, Clone)]
pub struct PaymentDraft {
    /// Amount actually paid. Must be positive.
    pub amount_paid: Decimal,
    /// Payment mode (NEFT, cheque, cash, ...).
    pub payment_mode: String,
    /// Bank/UTR reference number.
    pub reference_no: String,
    /// Date the payment was executed, which may precede the recording.
    pub payment_date: NaiveDate,
    /// Optional remarks kept on the payment record.
    pub notes: Option<String>,
}

impl PaymentDraft {
    /// Validates field-level constraints.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.amount_paid <= Decimal::ZERO {
            return Err(WorkflowError::Validation(
                "amount paid must be positive".to_string(),
            ));
        }
        if self.payment_mode.trim().len() < 2 {
            return Err(WorkflowError::Validation(
                "payment mode must be at least 2 characters".to_string(),
            ));
        }
        if self.reference_no.trim().len() < 2 {
            return Err(WorkflowError::Validation(
                "reference number must be at least 2 characters".to_string(),
            ));
        }
        Ok(())
    }
}

/// Stateless validator for all workflow mutations.
pub struct WorkflowService;

impl WorkflowService {
    /// Validates bill creation and returns the creation transition.
    ///
    /// Operators always start bills at `PENDING_L1` and may not request
    /// another status. Admins must pick one of the three pending statuses
    /// explicitly. Other roles cannot create bills at all.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError` when the caller is inactive, the role
    /// cannot create bills, or the requested initial status is off-policy.
    pub fn validate_create(
        principal: &Principal,
        initial: Option<BillStatus>,
    ) -> Result<Transition, WorkflowError> {
        if !principal.is_active {
            return Err(WorkflowError::PrincipalInactive);
        }

        let allowed = policy::initial_statuses(principal.role);
        if allowed.is_empty() {
            return Err(WorkflowError::RoleCannotCreate {
                role: principal.role,
            });
        }

        let status = match (principal.role, initial) {
            (Role::Operator, None) => BillStatus::PendingL1,
            (_, Some(status)) if allowed.contains(&status) => status,
            (_, Some(status)) => {
                return Err(WorkflowError::InitialStatusNotAllowed {
                    role: principal.role,
                    status,
                });
            }
            // Admins must pick explicitly so that a reroute into the middle
            // of the chain is never accidental.
            (Role::Admin, None) => {
                return Err(WorkflowError::Validation(
                    "an initial status is required".to_string(),
                ));
            }
            (_, None) => {
                return Err(WorkflowError::RoleCannotCreate {
                    role: principal.role,
                });
            }
        };

        Ok(Transition {
            from: None,
            to: status,
            actor: principal.id,
            note: Some(CREATION_NOTE.to_string()),
            at: Utc::now(),
        })
    }

    /// Validates a guarded status transition.
    ///
    /// `PAID` is refused here for every role, admins included; the only way
    /// to reach it is `validate_payment`.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError` when the caller is inactive, the target is
    /// `PAID`, or the policy table has no matching row.
    pub fn validate_transition(
        principal: &Principal,
        current: BillStatus,
        target: BillStatus,
        note: Option<String>,
    ) -> Result<Transition, WorkflowError> {
        if !principal.is_active {
            return Err(WorkflowError::PrincipalInactive);
        }
        if target == BillStatus::Paid {
            return Err(WorkflowError::PaidViaTransition);
        }
        if !policy::is_allowed(principal.role, current, target) {
            return Err(WorkflowError::TransitionNotAllowed {
                role: principal.role,
                from: current,
                to: target,
            });
        }

        Ok(Transition {
            from: Some(current),
            to: target,
            actor: principal.id,
            note,
            at: Utc::now(),
        })
    }

    /// Validates payment recording and returns the `PAID` transition.
    ///
    /// The audit note is generated from the payment mode; callers cannot
    /// supply their own.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError` when the caller is inactive or not
    /// ACCOUNTS, or the bill is not awaiting payment.
    pub fn validate_payment(
        principal: &Principal,
        current: BillStatus,
        payment_mode: &str,
    ) -> Result<Transition, WorkflowError> {
        if !principal.is_active {
            return Err(WorkflowError::PrincipalInactive);
        }
        if principal.role != Role::Accounts {
            return Err(WorkflowError::TransitionNotAllowed {
                role: principal.role,
                from: current,
                to: BillStatus::Paid,
            });
        }
        if !policy::is_allowed(Role::Accounts, current, BillStatus::Paid) {
            return Err(WorkflowError::NotReadyForPayment { status: current });
        }

        Ok(Transition {
            from: Some(current),
            to: BillStatus::Paid,
            actor: principal.id,
            note: Some(format!("Payment recorded ({payment_mode})")),
            at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn principal(role: Role) -> Principal {
        Principal::new(Uuid::new_v4(), role, true)
    }

    fn draft() -> BillDraft {
        BillDraft {
            ambulance_id: Uuid::new_v4(),
            title: "Oxygen cylinder refill".to_string(),
            vendor: "MedSupply Co".to_string(),
            amount: dec!(4500.00),
            currency: "INR".to_string(),
            invoice_number: "INV-2231".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2026, 2, 14).unwrap(),
            description: None,
        }
    }

    #[test]
    fn test_operator_creates_at_pending_l1() {
        let t = WorkflowService::validate_create(&principal(Role::Operator), None).unwrap();
        assert_eq!(t.from, None);
        assert_eq!(t.to, BillStatus::PendingL1);
        assert_eq!(t.note.as_deref(), Some("Bill submitted"));
    }

    #[test]
    fn test_operator_may_name_pending_l1_explicitly() {
        let t = WorkflowService::validate_create(
            &principal(Role::Operator),
            Some(BillStatus::PendingL1),
        )
        .unwrap();
        assert_eq!(t.to, BillStatus::PendingL1);
    }

    #[test]
    fn test_operator_cannot_pick_initial_status() {
        let err = WorkflowService::validate_create(
            &principal(Role::Operator),
            Some(BillStatus::PendingPayment),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InitialStatusNotAllowed { .. }
        ));
    }

    #[test]
    fn test_admin_must_pick_initial_status() {
        let err = WorkflowService::validate_create(&principal(Role::Admin), None).unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));

        let t = WorkflowService::validate_create(
            &principal(Role::Admin),
            Some(BillStatus::PendingPayment),
        )
        .unwrap();
        assert_eq!(t.to, BillStatus::PendingPayment);
    }

    #[test]
    fn test_admin_cannot_create_terminal_bill() {
        let err =
            WorkflowService::validate_create(&principal(Role::Admin), Some(BillStatus::Paid))
                .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InitialStatusNotAllowed { .. }
        ));
    }

    #[test]
    fn test_reviewers_cannot_create_bills() {
        for role in [Role::Level1, Role::Level2, Role::Accounts] {
            let err = WorkflowService::validate_create(&principal(role), None).unwrap_err();
            assert!(matches!(err, WorkflowError::RoleCannotCreate { .. }));
        }
    }

    #[test]
    fn test_inactive_principal_rejected_everywhere() {
        let inactive = Principal::new(Uuid::new_v4(), Role::Admin, false);
        assert!(matches!(
            WorkflowService::validate_create(&inactive, Some(BillStatus::PendingL1)),
            Err(WorkflowError::PrincipalInactive)
        ));
        assert!(matches!(
            WorkflowService::validate_transition(
                &inactive,
                BillStatus::PendingL1,
                BillStatus::PendingL2,
                None
            ),
            Err(WorkflowError::PrincipalInactive)
        ));
        let inactive_accounts = Principal::new(Uuid::new_v4(), Role::Accounts, false);
        assert!(matches!(
            WorkflowService::validate_payment(&inactive_accounts, BillStatus::PendingPayment, "NEFT"),
            Err(WorkflowError::PrincipalInactive)
        ));
    }

    // Happy path: L1 forwards, L2 approves, accounts pays.
    #[test]
    fn test_full_approval_chain() {
        let t1 = WorkflowService::validate_transition(
            &principal(Role::Level1),
            BillStatus::PendingL1,
            BillStatus::PendingL2,
            Some("Looks fine".to_string()),
        )
        .unwrap();
        assert_eq!(t1.from, Some(BillStatus::PendingL1));
        assert_eq!(t1.to, BillStatus::PendingL2);

        let t2 = WorkflowService::validate_transition(
            &principal(Role::Level2),
            BillStatus::PendingL2,
            BillStatus::PendingPayment,
            None,
        )
        .unwrap();
        assert_eq!(t2.to, BillStatus::PendingPayment);

        let t3 = WorkflowService::validate_payment(
            &principal(Role::Accounts),
            BillStatus::PendingPayment,
            "NEFT",
        )
        .unwrap();
        assert_eq!(t3.to, BillStatus::Paid);
        assert_eq!(t3.note.as_deref(), Some("Payment recorded (NEFT)"));
    }

    #[test]
    fn test_level1_cannot_skip_to_payment() {
        let err = WorkflowService::validate_transition(
            &principal(Role::Level1),
            BillStatus::PendingL1,
            BillStatus::PendingPayment,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::TransitionNotAllowed { .. }));
    }

    #[test]
    fn test_paid_refused_via_transition_even_for_accounts() {
        let err = WorkflowService::validate_transition(
            &principal(Role::Accounts),
            BillStatus::PendingPayment,
            BillStatus::Paid,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::PaidViaTransition));
    }

    #[test]
    fn test_paid_refused_via_transition_for_admin() {
        let err = WorkflowService::validate_transition(
            &principal(Role::Admin),
            BillStatus::PendingPayment,
            BillStatus::Paid,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::PaidViaTransition));
    }

    #[test]
    fn test_admin_reroutes_rejected_bill() {
        let t = WorkflowService::validate_transition(
            &principal(Role::Admin),
            BillStatus::RejectedL2,
            BillStatus::PendingL1,
            Some("Reopening after vendor correction".to_string()),
        )
        .unwrap();
        assert_eq!(t.to, BillStatus::PendingL1);
    }

    #[test]
    fn test_payment_requires_accounts_role() {
        let err = WorkflowService::validate_payment(
            &principal(Role::Admin),
            BillStatus::PendingPayment,
            "NEFT",
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::TransitionNotAllowed { .. }));
    }

    #[test]
    fn test_payment_requires_pending_payment_status() {
        for status in [BillStatus::PendingL1, BillStatus::Paid, BillStatus::ReturnedL2] {
            let err =
                WorkflowService::validate_payment(&principal(Role::Accounts), status, "cheque")
                    .unwrap_err();
            assert!(matches!(err, WorkflowError::NotReadyForPayment { .. }));
        }
    }

    #[test]
    fn test_bill_draft_validation() {
        assert!(draft().validate().is_ok());

        let mut d = draft();
        d.title = "ab".to_string();
        assert!(matches!(d.validate(), Err(WorkflowError::Validation(_))));

        let mut d = draft();
        d.vendor = "x".to_string();
        assert!(matches!(d.validate(), Err(WorkflowError::Validation(_))));

        let mut d = draft();
        d.amount = dec!(0);
        assert!(matches!(d.validate(), Err(WorkflowError::Validation(_))));

        let mut d = draft();
        d.amount = dec!(-12.50);
        assert!(matches!(d.validate(), Err(WorkflowError::Validation(_))));

        let mut d = draft();
        d.invoice_number = "7".to_string();
        assert!(matches!(d.validate(), Err(WorkflowError::Validation(_))));

        let mut d = draft();
        d.currency = "rupees".to_string();
        assert!(matches!(d.validate(), Err(WorkflowError::Validation(_))));

        let mut d = draft();
        d.currency = "inr".to_string();
        assert!(matches!(d.validate(), Err(WorkflowError::Validation(_))));
    }

    #[test]
    fn test_payment_draft_validation() {
        let p = PaymentDraft {
            amount_paid: dec!(4500.00),
            payment_mode: "NEFT".to_string(),
            reference_no: "UTR-88341".to_string(),
            payment_date: NaiveDate::from_ymd_opt(2026, 2, 20).unwrap(),
            notes: None,
        };
        assert!(p.validate().is_ok());

        let mut bad = p.clone();
        bad.amount_paid = dec!(0);
        assert!(matches!(bad.validate(), Err(WorkflowError::Validation(_))));

        let mut bad = p.clone();
        bad.payment_mode = "n".to_string();
        assert!(matches!(bad.validate(), Err(WorkflowError::Validation(_))));

        let mut bad = p;
        bad.reference_no = " ".to_string();
        assert!(matches!(bad.validate(), Err(WorkflowError::Validation(_))));
    }
}

//! Workflow repository for bill state transitions.
//!
//! All mutations run inside a single database transaction: the bill row is
//! locked with `SELECT ... FOR UPDATE`, the policy is re-validated against
//! the locked status, and the status change, payment row, and audit entry
//! commit or roll back together. A concurrent writer that loses the lock
//! race re-validates against the new status and fails cleanly.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use siren_core::workflow::{
    BillDraft, BillStatus, PaymentDraft, Principal, Role, WorkflowError, WorkflowService,
};

use crate::entities::{ambulances, bills, payments, sea_orm_active_enums, user_regions};

use super::assignment::AssignmentRepository;
use super::audit::AuditRepository;

/// Filters for the bill queue, applied on top of role scoping.
#[derive(Debug, Clone, Default)]
pub struct BillQuery {
    /// Only bills in this status.
    pub status: Option<BillStatus>,
    /// Only bills in this region.
    pub region_id: Option<Uuid>,
    /// Only bills for this ambulance.
    pub ambulance_id: Option<Uuid>,
}

/// A bill together with its payment, when one exists.
#[derive(Debug, Clone)]
pub struct BillWithPayment {
    /// The bill.
    pub bill: bills::Model,
    /// The recorded payment, if any.
    pub payment: Option<payments::Model>,
}

/// Workflow repository for bill state transitions.
#[derive(Debug, Clone)]
pub struct WorkflowRepository {
    db: DatabaseConnection,
}

impl WorkflowRepository {
    /// Creates a new workflow repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a bill and its creation audit entry atomically.
    ///
    /// Operators may only submit bills for ambulances they are assigned to;
    /// admins may submit for any ambulance, in which case the bill is
    /// attributed to the ambulance's first assigned operator (or the admin
    /// when none is assigned). The bill snapshots the ambulance's region at
    /// creation time.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, the ambulance is missing, the
    /// operator is not assigned, or a database operation fails.
    pub async fn create_bill(
        &self,
        principal: &Principal,
        draft: &BillDraft,
        initial: Option<BillStatus>,
    ) -> Result<bills::Model, WorkflowError> {
        draft.validate()?;
        let transition = WorkflowService::validate_create(principal, initial)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let ambulance = ambulances::Entity::find_by_id(draft.ambulance_id)
            .one(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::AmbulanceNotFound(draft.ambulance_id))?;

        let created_by = match principal.role {
            Role::Operator => {
                let assigned = AssignmentRepository::is_assigned(&txn, principal.id, ambulance.id)
                    .await
                    .map_err(|e| WorkflowError::Database(e.to_string()))?;
                if !assigned {
                    return Err(WorkflowError::NotAssigned {
                        operator: principal.id,
                        ambulance: ambulance.id,
                    });
                }
                principal.id
            }
            // Admin-submitted bills land in the queue of whoever usually
            // runs this ambulance.
            Role::Admin => AssignmentRepository::first_operator(&txn, ambulance.id)
                .await
                .map_err(|e| WorkflowError::Database(e.to_string()))?
                .unwrap_or(principal.id),
            Role::Level1 | Role::Level2 | Role::Accounts => principal.id,
        };

        let now = Utc::now().into();
        let bill = bills::ActiveModel {
            id: Set(Uuid::new_v4()),
            ambulance_id: Set(ambulance.id),
            region_id: Set(ambulance.region_id),
            created_by: Set(created_by),
            title: Set(draft.title.trim().to_string()),
            vendor: Set(draft.vendor.trim().to_string()),
            amount: Set(draft.amount),
            currency: Set(draft.currency.trim().to_string()),
            invoice_number: Set(draft.invoice_number.trim().to_string()),
            invoice_date: Set(draft.invoice_date),
            description: Set(draft.description.clone()),
            status: Set(transition.to.into()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let bill = bill
            .insert(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        AuditRepository::append(&txn, bill.id, &transition)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        Ok(bill)
    }

    /// Applies a guarded status transition.
    ///
    /// The bill row is locked for the duration of the transaction and the
    /// policy is re-validated against the locked status, so concurrent
    /// transitions serialize and the loser gets a policy error against the
    /// winner's status.
    ///
    /// # Errors
    ///
    /// Returns an error if the bill is missing, the policy refuses the
    /// transition, or a database operation fails.
    pub async fn transition_bill(
        &self,
        principal: &Principal,
        bill_id: Uuid,
        target: BillStatus,
        note: Option<String>,
    ) -> Result<bills::Model, WorkflowError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let bill = Self::lock_bill(&txn, bill_id).await?;
        let current = (&bill.status).into();

        let transition = WorkflowService::validate_transition(principal, current, target, note)?;

        let now = Utc::now().into();
        let mut active: bills::ActiveModel = bill.into();
        active.status = Set(transition.to.into());
        active.updated_at = Set(now);

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        AuditRepository::append(&txn, updated.id, &transition)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        Ok(updated)
    }

    /// Records a payment: payment row, `PAID` status, and audit entry in
    /// one transaction.
    ///
    /// A second attempt finds the bill already `PAID` under the lock and
    /// fails with a conflict, so the unique payment per bill holds without
    /// relying on the constraint alone.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, the bill is not awaiting
    /// payment, or a database operation fails.
    pub async fn record_payment(
        &self,
        principal: &Principal,
        bill_id: Uuid,
        draft: &PaymentDraft,
    ) -> Result<(bills::Model, payments::Model), WorkflowError> {
        draft.validate()?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let bill = Self::lock_bill(&txn, bill_id).await?;
        let current = (&bill.status).into();

        let transition = WorkflowService::validate_payment(principal, current, &draft.payment_mode)?;

        let now = Utc::now().into();

        // An earlier payment row can survive an admin reroute of a PAID
        // bill; paying again overwrites it instead of violating the unique
        // constraint.
        let existing = payments::Entity::find()
            .filter(payments::Column::BillId.eq(bill.id))
            .one(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let payment = match existing {
            Some(previous) => {
                let mut active: payments::ActiveModel = previous.into();
                active.amount_paid = Set(draft.amount_paid);
                active.payment_mode = Set(draft.payment_mode.trim().to_string());
                active.reference_no = Set(draft.reference_no.trim().to_string());
                active.payment_date = Set(draft.payment_date);
                active.notes = Set(draft.notes.clone());
                active.paid_by = Set(principal.id);
                active.paid_at = Set(now);
                active
                    .update(&txn)
                    .await
                    .map_err(|e| WorkflowError::Database(e.to_string()))?
            }
            None => {
                let payment = payments::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    bill_id: Set(bill.id),
                    amount_paid: Set(draft.amount_paid),
                    payment_mode: Set(draft.payment_mode.trim().to_string()),
                    reference_no: Set(draft.reference_no.trim().to_string()),
                    payment_date: Set(draft.payment_date),
                    notes: Set(draft.notes.clone()),
                    paid_by: Set(principal.id),
                    paid_at: Set(now),
                };
                payment
                    .insert(&txn)
                    .await
                    .map_err(|e| WorkflowError::Database(e.to_string()))?
            }
        };

        let mut active: bills::ActiveModel = bill.into();
        active.status = Set(transition.to.into());
        active.updated_at = Set(now);

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        AuditRepository::append(&txn, updated.id, &transition)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        Ok((updated, payment))
    }

    /// Finds a bill with its payment, if recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the bill is missing or the query fails.
    pub async fn find_bill(&self, bill_id: Uuid) -> Result<BillWithPayment, WorkflowError> {
        let bill = bills::Entity::find_by_id(bill_id)
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::BillNotFound(bill_id))?;

        let payment = payments::Entity::find()
            .filter(payments::Column::BillId.eq(bill_id))
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        Ok(BillWithPayment { bill, payment })
    }

    /// Lists bills visible to the caller, newest first.
    ///
    /// Scoping by role:
    /// - ADMIN sees everything.
    /// - OPERATOR sees bills they submitted.
    /// - LEVEL1, LEVEL2, and ACCOUNTS see bills in their regions; when no
    ///   status filter is given their queue defaults to the status they act
    ///   on (`PENDING_L1`, `PENDING_L2`, `PENDING_PAYMENT` respectively).
    ///
    /// Query filters narrow the scoped set further.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list_bills_for(
        &self,
        principal: &Principal,
        query: &BillQuery,
    ) -> Result<Vec<bills::Model>, WorkflowError> {
        let mut select = bills::Entity::find();

        match principal.role {
            Role::Admin => {}
            Role::Operator => {
                select = select.filter(bills::Column::CreatedBy.eq(principal.id));
            }
            Role::Level1 | Role::Level2 | Role::Accounts => {
                let region_ids: Vec<Uuid> = user_regions::Entity::find()
                    .filter(user_regions::Column::UserId.eq(principal.id))
                    .all(&self.db)
                    .await
                    .map_err(|e| WorkflowError::Database(e.to_string()))?
                    .into_iter()
                    .map(|link| link.region_id)
                    .collect();
                select = select.filter(bills::Column::RegionId.is_in(region_ids));
            }
        }

        let status = query.status.or(match principal.role {
            Role::Level1 => Some(BillStatus::PendingL1),
            Role::Level2 => Some(BillStatus::PendingL2),
            Role::Accounts => Some(BillStatus::PendingPayment),
            Role::Admin | Role::Operator => None,
        });
        if let Some(status) = status {
            let db_status: sea_orm_active_enums::BillStatus = status.into();
            select = select.filter(bills::Column::Status.eq(db_status));
        }
        if let Some(region_id) = query.region_id {
            select = select.filter(bills::Column::RegionId.eq(region_id));
        }
        if let Some(ambulance_id) = query.ambulance_id {
            select = select.filter(bills::Column::AmbulanceId.eq(ambulance_id));
        }

        select
            .order_by_desc(bills::Column::CreatedAt)
            .order_by_desc(bills::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }

    /// Fetches the bill row under an exclusive lock.
    async fn lock_bill<C>(conn: &C, bill_id: Uuid) -> Result<bills::Model, WorkflowError>
    where
        C: sea_orm::ConnectionTrait,
    {
        bills::Entity::find_by_id(bill_id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::BillNotFound(bill_id))
    }
}

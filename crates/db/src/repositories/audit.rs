//! Audit log repository for the bill status history.
//!
//! Writes go through `append`, which takes any connection so callers can
//! write the audit row inside the same transaction as the status change.
//! The log is append-only; there is no update or delete path.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use siren_core::workflow::Transition;

use crate::entities::bill_status_logs;

/// Audit log repository.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    db: DatabaseConnection,
}

impl AuditRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends an audit entry for a validated transition.
    ///
    /// Takes the caller's connection so the entry joins the caller's
    /// transaction. Log ids are UUIDv7 so insertion order survives equal
    /// timestamps.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn append<C: ConnectionTrait>(
        conn: &C,
        bill_id: Uuid,
        transition: &Transition,
    ) -> Result<bill_status_logs::Model, DbErr> {
        let entry = bill_status_logs::ActiveModel {
            id: Set(Uuid::now_v7()),
            bill_id: Set(bill_id),
            from_status: Set(transition.from.map(Into::into)),
            to_status: Set(transition.to.into()),
            actor_id: Set(transition.actor),
            note: Set(transition.note.clone()),
            created_at: Set(transition.at.into()),
        };

        entry.insert(conn).await
    }

    /// Lists the status history for a bill, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_bill(
        &self,
        bill_id: Uuid,
    ) -> Result<Vec<bill_status_logs::Model>, DbErr> {
        bill_status_logs::Entity::find()
            .filter(bill_status_logs::Column::BillId.eq(bill_id))
            .order_by_desc(bill_status_logs::Column::CreatedAt)
            .order_by_desc(bill_status_logs::Column::Id)
            .all(&self.db)
            .await
    }

    /// Lists actions performed by a user across all bills, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_actor(
        &self,
        actor_id: Uuid,
        limit: u64,
    ) -> Result<Vec<bill_status_logs::Model>, DbErr> {
        use sea_orm::QuerySelect;

        bill_status_logs::Entity::find()
            .filter(bill_status_logs::Column::ActorId.eq(actor_id))
            .order_by_desc(bill_status_logs::Column::CreatedAt)
            .order_by_desc(bill_status_logs::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
    }
}

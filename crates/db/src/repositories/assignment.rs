//! Assignment repository for operator/ambulance links.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use siren_core::assignment::{reconcile, AssignmentDiff};

use crate::entities::{ambulance_operators, ambulances, users};

/// Assignment repository for operator/ambulance links.
#[derive(Debug, Clone)]
pub struct AssignmentRepository {
    db: DatabaseConnection,
}

impl AssignmentRepository {
    /// Creates a new assignment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the ambulances an operator is assigned to, by name then id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_assigned_ambulances(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ambulances::Model>, DbErr> {
        ambulance_operators::Entity::find()
            .filter(ambulance_operators::Column::UserId.eq(user_id))
            .find_also_related(ambulances::Entity)
            .order_by_asc(ambulances::Column::Name)
            .order_by_asc(ambulances::Column::Id)
            .all(&self.db)
            .await
            .map(|links| {
                links
                    .into_iter()
                    .filter_map(|(_, ambulance)| ambulance)
                    .collect()
            })
    }

    /// Lists the operators assigned to an ambulance.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_operators(&self, ambulance_id: Uuid) -> Result<Vec<users::Model>, DbErr> {
        ambulance_operators::Entity::find()
            .filter(ambulance_operators::Column::AmbulanceId.eq(ambulance_id))
            .find_also_related(users::Entity)
            .all(&self.db)
            .await
            .map(|links| links.into_iter().filter_map(|(_, user)| user).collect())
    }

    /// Whether the operator is assigned to the ambulance.
    ///
    /// Takes any connection so transactional callers can check under their
    /// own lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn is_assigned<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        ambulance_id: Uuid,
    ) -> Result<bool, DbErr> {
        ambulance_operators::Entity::find()
            .filter(ambulance_operators::Column::UserId.eq(user_id))
            .filter(ambulance_operators::Column::AmbulanceId.eq(ambulance_id))
            .one(conn)
            .await
            .map(|link| link.is_some())
    }

    /// Returns the ambulance's first assigned operator, earliest assignment
    /// first, or `None` when nobody is assigned.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn first_operator<C: ConnectionTrait>(
        conn: &C,
        ambulance_id: Uuid,
    ) -> Result<Option<Uuid>, DbErr> {
        ambulance_operators::Entity::find()
            .filter(ambulance_operators::Column::AmbulanceId.eq(ambulance_id))
            .order_by_asc(ambulance_operators::Column::CreatedAt)
            .order_by_asc(ambulance_operators::Column::Id)
            .one(conn)
            .await
            .map(|link| link.map(|l| l.user_id))
    }

    /// Replaces an ambulance's operator set with the desired one.
    ///
    /// Computes the minimal diff and applies only the changed links. Runs on
    /// the caller's connection so the ambulance create/update transaction
    /// carries the reconciliation with it; the parent row and its assignment
    /// set commit or roll back together. Returns the applied diff.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub async fn reconcile_operators<C: ConnectionTrait>(
        conn: &C,
        ambulance_id: Uuid,
        desired: &[Uuid],
    ) -> Result<AssignmentDiff, DbErr> {
        let existing: Vec<Uuid> = ambulance_operators::Entity::find()
            .filter(ambulance_operators::Column::AmbulanceId.eq(ambulance_id))
            .all(conn)
            .await?
            .into_iter()
            .map(|link| link.user_id)
            .collect();

        let diff = reconcile(&existing, desired);

        if !diff.to_remove.is_empty() {
            ambulance_operators::Entity::delete_many()
                .filter(ambulance_operators::Column::AmbulanceId.eq(ambulance_id))
                .filter(ambulance_operators::Column::UserId.is_in(diff.to_remove.clone()))
                .exec(conn)
                .await?;
        }

        for user_id in &diff.to_add {
            let link = ambulance_operators::ActiveModel {
                id: Set(Uuid::new_v4()),
                ambulance_id: Set(ambulance_id),
                user_id: Set(*user_id),
                created_at: Set(Utc::now().into()),
            };
            link.insert(conn).await?;
        }

        Ok(diff)
    }
}

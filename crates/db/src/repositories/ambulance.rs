//! Ambulance repository for fleet management.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::ambulances;

use super::assignment::AssignmentRepository;

/// Fields that can be updated on an ambulance.
#[derive(Debug, Clone, Default)]
pub struct UpdateAmbulanceInput {
    /// New display name.
    pub name: Option<String>,
    /// Move to a different region. Existing bills keep their snapshot.
    pub region_id: Option<Uuid>,
    /// Activate or deactivate.
    pub is_active: Option<bool>,
    /// Replace the assigned operator set.
    pub operator_ids: Option<Vec<Uuid>>,
}

/// Ambulance repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct AmbulanceRepository {
    db: DatabaseConnection,
}

impl AmbulanceRepository {
    /// Creates a new ambulance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an ambulance with its initial operator assignments.
    ///
    /// The row and its assignment links commit in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if a write fails, including on duplicate code.
    pub async fn create(
        &self,
        code: &str,
        name: &str,
        region_id: Uuid,
        operator_ids: &[Uuid],
    ) -> Result<ambulances::Model, DbErr> {
        let txn = self.db.begin().await?;

        let now = Utc::now().into();
        let ambulance = ambulances::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.trim().to_string()),
            name: Set(name.trim().to_string()),
            region_id: Set(region_id),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let ambulance = ambulance.insert(&txn).await?;

        AssignmentRepository::reconcile_operators(&txn, ambulance.id, operator_ids).await?;

        txn.commit().await?;
        Ok(ambulance)
    }

    /// Finds an ambulance by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ambulances::Model>, DbErr> {
        ambulances::Entity::find_by_id(id).one(&self.db).await
    }

    /// Lists ambulances, optionally narrowed to a region.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self, region_id: Option<Uuid>) -> Result<Vec<ambulances::Model>, DbErr> {
        let mut select = ambulances::Entity::find();
        if let Some(region_id) = region_id {
            select = select.filter(ambulances::Column::RegionId.eq(region_id));
        }
        select
            .order_by_asc(ambulances::Column::Code)
            .all(&self.db)
            .await
    }

    /// Applies a partial update, reconciling operator assignments in the
    /// same transaction when a new set is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the ambulance is missing or a write fails.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateAmbulanceInput,
    ) -> Result<Option<ambulances::Model>, DbErr> {
        let txn = self.db.begin().await?;

        let Some(ambulance) = ambulances::Entity::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        let mut active: ambulances::ActiveModel = ambulance.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(region_id) = input.region_id {
            active.region_id = Set(region_id);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&txn).await?;

        if let Some(operator_ids) = input.operator_ids {
            AssignmentRepository::reconcile_operators(&txn, id, &operator_ids).await?;
        }

        txn.commit().await?;
        Ok(Some(updated))
    }
}

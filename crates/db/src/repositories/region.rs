//! Region repository.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::entities::regions;

/// Region repository.
#[derive(Debug, Clone)]
pub struct RegionRepository {
    db: DatabaseConnection,
}

impl RegionRepository {
    /// Creates a new region repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a region.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including on duplicate name.
    pub async fn create(
        &self,
        name: &str,
        city: &str,
        state: &str,
    ) -> Result<regions::Model, DbErr> {
        let region = regions::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.trim().to_string()),
            city: Set(city.trim().to_string()),
            state: Set(state.trim().to_string()),
            created_at: Set(Utc::now().into()),
        };
        region.insert(&self.db).await
    }

    /// Lists all regions by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self) -> Result<Vec<regions::Model>, DbErr> {
        regions::Entity::find()
            .order_by_asc(regions::Column::Name)
            .all(&self.db)
            .await
    }
}

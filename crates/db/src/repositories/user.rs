//! User repository for database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use siren_core::assignment::reconcile;
use siren_core::workflow::Role;

use crate::entities::{regions, user_regions, users};

/// Fields that can be updated on a user.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// Activate or deactivate the account.
    pub is_active: Option<bool>,
    /// Replace the region scope.
    pub region_ids: Option<Vec<Uuid>>,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// Creates a new user with their region scope.
    ///
    /// The user row and its region links commit in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if a database write fails.
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        full_name: &str,
        role: Role,
        region_ids: &[Uuid],
    ) -> Result<users::Model, DbErr> {
        let txn = self.db.begin().await?;

        let now = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.trim().to_lowercase()),
            password_hash: Set(password_hash.to_string()),
            full_name: Set(full_name.trim().to_string()),
            role: Set(role.into()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let user = user.insert(&txn).await?;

        Self::reconcile_regions(&txn, user.id, region_ids).await?;

        txn.commit().await?;
        Ok(user)
    }

    /// Lists all users, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<users::Model>, DbErr> {
        users::Entity::find()
            .order_by_desc(users::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Applies a partial update, reconciling the region scope in the same
    /// transaction when a new set is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is missing or a write fails.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateUserInput,
    ) -> Result<Option<users::Model>, DbErr> {
        let txn = self.db.begin().await?;

        let Some(user) = users::Entity::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&txn).await?;

        if let Some(region_ids) = input.region_ids {
            Self::reconcile_regions(&txn, id, &region_ids).await?;
        }

        txn.commit().await?;
        Ok(Some(updated))
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Lists the regions a user is scoped to.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_regions(&self, user_id: Uuid) -> Result<Vec<regions::Model>, DbErr> {
        user_regions::Entity::find()
            .filter(user_regions::Column::UserId.eq(user_id))
            .find_also_related(regions::Entity)
            .all(&self.db)
            .await
            .map(|links| links.into_iter().filter_map(|(_, region)| region).collect())
    }

    /// Brings the user's region links to the desired set, touching only the
    /// changed links. Runs on the caller's transaction.
    async fn reconcile_regions<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        desired: &[Uuid],
    ) -> Result<(), DbErr> {
        let existing: Vec<Uuid> = user_regions::Entity::find()
            .filter(user_regions::Column::UserId.eq(user_id))
            .all(conn)
            .await?
            .into_iter()
            .map(|link| link.region_id)
            .collect();

        let diff = reconcile(&existing, desired);

        if !diff.to_remove.is_empty() {
            user_regions::Entity::delete_many()
                .filter(user_regions::Column::UserId.eq(user_id))
                .filter(user_regions::Column::RegionId.is_in(diff.to_remove))
                .exec(conn)
                .await?;
        }

        for region_id in &diff.to_add {
            let link = user_regions::ActiveModel {
                user_id: Set(user_id),
                region_id: Set(*region_id),
            };
            link.insert(conn).await?;
        }

        Ok(())
    }
}

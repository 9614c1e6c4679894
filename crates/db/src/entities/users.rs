//! `SeaORM` entity for the users table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use siren_core::workflow::Principal;

use super::sea_orm_active_enums::UserRole;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Builds the workflow principal this user acts as.
    #[must_use]
    pub fn principal(&self) -> Principal {
        Principal::new(self.id, (&self.role).into(), self.is_active)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bills::Entity")]
    Bills,
    #[sea_orm(has_many = "super::bill_status_logs::Entity")]
    BillStatusLogs,
}

impl Related<super::bills::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bills.def()
    }
}

impl Related<super::bill_status_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillStatusLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` entity for the bills table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::BillStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub ambulance_id: Uuid,
    /// Region snapshot taken from the ambulance at creation time, so later
    /// ambulance moves do not rewrite bill history.
    pub region_id: Uuid,
    pub created_by: Uuid,
    pub title: String,
    pub vendor: String,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount: Decimal,
    /// ISO 4217 code tagging the amount.
    pub currency: String,
    pub invoice_number: String,
    pub invoice_date: Date,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub status: BillStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ambulances::Entity",
        from = "Column::AmbulanceId",
        to = "super::ambulances::Column::Id"
    )]
    Ambulances,
    #[sea_orm(
        belongs_to = "super::regions::Entity",
        from = "Column::RegionId",
        to = "super::regions::Column::Id"
    )]
    Regions,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatedBy",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::bill_status_logs::Entity")]
    BillStatusLogs,
    #[sea_orm(has_one = "super::payments::Entity")]
    Payments,
    #[sea_orm(has_many = "super::attachments::Entity")]
    Attachments,
}

impl Related<super::ambulances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ambulances.def()
    }
}

impl Related<super::regions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Regions.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::bill_status_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillStatusLogs.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::attachments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

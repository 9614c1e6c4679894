//! `SeaORM` entity definitions.

pub mod ambulance_operators;
pub mod ambulances;
pub mod attachments;
pub mod bill_status_logs;
pub mod bills;
pub mod payments;
pub mod regions;
pub mod sea_orm_active_enums;
pub mod user_regions;
pub mod users;

//! Attachment repository for bill file metadata.
//!
//! File bytes live in object storage; this repository only tracks the
//! metadata rows that point at them.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use crate::entities::attachments;

/// Input for registering an uploaded attachment.
#[derive(Debug, Clone)]
pub struct CreateAttachmentInput {
    /// Attachment ID, chosen by the caller so the storage key can embed it.
    pub id: Uuid,
    /// Bill the file belongs to.
    pub bill_id: Uuid,
    /// Original filename.
    pub file_name: String,
    /// Object storage key.
    pub storage_key: String,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub file_size: i64,
    /// Uploading user.
    pub uploaded_by: Uuid,
}

/// Attachment repository.
#[derive(Debug, Clone)]
pub struct AttachmentRepository {
    db: DatabaseConnection,
}

impl AttachmentRepository {
    /// Creates a new attachment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers an uploaded attachment.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, input: CreateAttachmentInput) -> Result<attachments::Model, DbErr> {
        let attachment = attachments::ActiveModel {
            id: Set(input.id),
            bill_id: Set(input.bill_id),
            file_name: Set(input.file_name),
            storage_key: Set(input.storage_key),
            content_type: Set(input.content_type),
            file_size: Set(input.file_size),
            uploaded_by: Set(input.uploaded_by),
            created_at: Set(Utc::now().into()),
        };
        attachment.insert(&self.db).await
    }

    /// Lists attachments for a bill, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_bill(&self, bill_id: Uuid) -> Result<Vec<attachments::Model>, DbErr> {
        attachments::Entity::find()
            .filter(attachments::Column::BillId.eq(bill_id))
            .order_by_asc(attachments::Column::CreatedAt)
            .all(&self.db)
            .await
    }
}

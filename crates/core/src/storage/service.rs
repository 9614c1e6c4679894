//! Storage service implementation using Apache OpenDAL.

use opendal::{services, ErrorKind, Operator};
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Metadata about a stored attachment.
#[derive(Debug, Clone)]
pub struct AttachmentMetadata {
    /// Storage key.
    pub storage_key: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Content type.
    pub content_type: Option<String>,
}

/// Storage service for bill attachments.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
        }
    }

    /// Validate an upload against config constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if file size or MIME type is invalid.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }
        if !self.config.is_mime_type_allowed(content_type) {
            return Err(StorageError::invalid_mime_type(content_type));
        }
        Ok(())
    }

    /// Generate the storage key for a bill attachment.
    ///
    /// Format: `bills/{bill_id}/{attachment_id}-{sanitized_filename}`
    #[must_use]
    pub fn generate_storage_key(bill_id: Uuid, attachment_id: Uuid, filename: &str) -> String {
        format!(
            "bills/{bill_id}/{attachment_id}-{}",
            sanitize_filename(filename)
        )
    }

    /// Store attachment bytes under the given key.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the write fails.
    pub async fn store(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<AttachmentMetadata, StorageError> {
        self.validate_upload(content_type, bytes.len() as u64)?;

        let size = bytes.len() as u64;
        self.operator.write(key, bytes).await?;

        Ok(AttachmentMetadata {
            storage_key: key.to_string(),
            file_size: size,
            content_type: Some(content_type.to_string()),
        })
    }

    /// Read attachment bytes back from storage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the key does not exist.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let buffer = self.operator.read(key).await?;
        Ok(buffer.to_vec())
    }

    /// Delete a file from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Check if a file exists in storage.
    pub async fn exists(&self, key: &str) -> bool {
        match self.operator.stat(key).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(_) => false,
        }
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

/// Sanitize filename for storage key.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("invoice.pdf"), "invoice.pdf");
        assert_eq!(sanitize_filename("fuel bill (march).pdf"), "fuel_bill__march_.pdf");
        assert_eq!(sanitize_filename("scan@#$.jpg"), "scan___.jpg");
    }

    #[test]
    fn test_generate_storage_key() {
        let bill_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").expect("valid uuid");
        let att_id = Uuid::parse_str("6ba7b810-9dad-11d1-80b4-00c04fd430c8").expect("valid uuid");

        let key = StorageService::generate_storage_key(bill_id, att_id, "invoice (1).pdf");
        assert_eq!(
            key,
            "bills/550e8400-e29b-41d4-a716-446655440000/6ba7b810-9dad-11d1-80b4-00c04fd430c8-invoice__1_.pdf"
        );
    }

    #[tokio::test]
    async fn test_local_fs_round_trip() {
        let dir = std::env::temp_dir().join(format!("siren-storage-{}", Uuid::new_v4()));
        let service =
            StorageService::from_config(StorageConfig::new(StorageProvider::local_fs(&dir)))
                .expect("local fs operator");

        let key = StorageService::generate_storage_key(Uuid::new_v4(), Uuid::new_v4(), "a.pdf");
        let meta = service
            .store(&key, "application/pdf", b"%PDF-1.4 test".to_vec())
            .await
            .expect("store");
        assert_eq!(meta.file_size, 13);

        assert!(service.exists(&key).await);
        let bytes = service.read(&key).await.expect("read");
        assert_eq!(bytes, b"%PDF-1.4 test");

        service.delete(&key).await.expect("delete");
        assert!(!service.exists(&key).await);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_store_rejects_oversize_and_bad_mime() {
        let dir = std::env::temp_dir().join(format!("siren-storage-{}", Uuid::new_v4()));
        let mut config = StorageConfig::new(StorageProvider::local_fs(&dir));
        config.max_file_size = 8;
        let service = StorageService::from_config(config).expect("local fs operator");

        let err = service
            .store("k1", "application/pdf", vec![0u8; 9])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::FileTooLarge { .. }));

        let err = service
            .store("k2", "application/x-msdownload", vec![0u8; 4])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidMimeType { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }
}

//! Attachment file storage built on Apache OpenDAL.

pub mod config;
pub mod error;
pub mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{AttachmentMetadata, StorageService};

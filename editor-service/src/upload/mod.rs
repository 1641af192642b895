//! Upload pipeline.
//!
//! Pure "bytes in, (content, metadata) out": validate the file, store
//! the original under a collision-resistant name, convert it to markup,
//! and return the markup plus metadata. No state is retained between
//! calls.

pub mod docx;
pub mod executor;
pub mod pdf;

use chrono::{DateTime, Utc};
use editor_core::error::AppError;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

use crate::services::storage::Storage;
use crate::upload::executor::CommandExecutor;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Failure classes of the pipeline, each with a user-actionable message.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File type not detected")]
    UndetectedType,

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File size {size} exceeds {limit} byte limit")]
    Oversize { size: usize, limit: usize },

    #[error("Failed to read {0} file")]
    Unreadable(&'static str),

    #[error("Failed to convert {kind} document: {reason}")]
    ConversionFailed { kind: &'static str, reason: String },

    #[error("Failed to upload file to storage: {0}")]
    StorageFailed(String),
}

impl From<UploadError> for AppError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::UndetectedType
            | UploadError::UnsupportedType(_)
            | UploadError::Oversize { .. } => AppError::BadRequest(anyhow::anyhow!(e)),
            UploadError::Unreadable(_) | UploadError::ConversionFailed { .. } => {
                AppError::FileProcessingError(e.to_string())
            }
            UploadError::StorageFailed(_) => AppError::StorageError(anyhow::anyhow!(e)),
        }
    }
}

/// Metadata returned alongside the converted markup.
#[derive(Debug, Clone, Serialize)]
pub struct UploadMetadata {
    pub original_name: String,
    pub stored_name: String,
    pub mime_type: String,
    pub size: usize,
    pub storage_key: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Result of a processed upload.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedUpload {
    pub content: String,
    pub metadata: UploadMetadata,
}

pub struct UploadPipeline {
    storage: Arc<dyn Storage>,
    executor: CommandExecutor,
    max_file_size: usize,
}

impl UploadPipeline {
    pub fn new(storage: Arc<dyn Storage>, max_file_size: usize) -> Self {
        Self {
            storage,
            executor: CommandExecutor::new(Duration::from_secs(60)),
            max_file_size,
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Type and size checks. Runs before any storage write.
    pub fn validate(&self, mime_type: &str, size: usize) -> Result<(), UploadError> {
        if mime_type.is_empty() {
            return Err(UploadError::UndetectedType);
        }
        if mime_type != MIME_PDF && mime_type != MIME_DOCX {
            return Err(UploadError::UnsupportedType(mime_type.to_string()));
        }
        if size > self.max_file_size {
            return Err(UploadError::Oversize {
                size,
                limit: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Validate, archive the original, convert to markup.
    #[instrument(skip(self, data), fields(name = %original_name, mime = %mime_type, size = data.len()))]
    pub async fn process(
        &self,
        original_name: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<ProcessedUpload, UploadError> {
        self.validate(mime_type, data.len())?;

        let uploaded_at = Utc::now();
        let stored = stored_name(original_name, uploaded_at.timestamp_millis());
        let storage_key = format!("originals/{stored}");
        self.storage
            .upload(&storage_key, data)
            .await
            .map_err(|e| UploadError::StorageFailed(e.to_string()))?;

        let content = match mime_type {
            MIME_PDF => pdf::convert(&self.executor, data).await?,
            _ => docx::convert(&self.executor, data).await?,
        };

        info!(storage_key = %storage_key, content_len = content.len(), "Processed upload");

        Ok(ProcessedUpload {
            content,
            metadata: UploadMetadata {
                original_name: original_name.to_string(),
                stored_name: stored,
                mime_type: mime_type.to_string(),
                size: data.len(),
                storage_key,
                uploaded_at,
            },
        })
    }
}

/// Collision-resistant stored name: `{stem}_{millis}.{ext}`.
fn stored_name(original_name: &str, millis: i64) -> String {
    match original_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{millis}.{ext}"),
        _ => format!("{original_name}_{millis}"),
    }
}

/// Title for a document created from an upload: the file name stem.
pub fn title_from_file_name(original_name: &str) -> String {
    match original_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => original_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::InMemoryStorage;

    fn pipeline(storage: Arc<InMemoryStorage>) -> UploadPipeline {
        UploadPipeline::new(storage as Arc<dyn Storage>, 1024)
    }

    #[test]
    fn stored_name_embeds_the_timestamp() {
        assert_eq!(stored_name("essay.pdf", 1700000000000), "essay_1700000000000.pdf");
        assert_eq!(stored_name("notes", 42), "notes_42");
        assert_eq!(stored_name(".hidden", 42), ".hidden_42");
    }

    #[test]
    fn title_strips_the_extension() {
        assert_eq!(title_from_file_name("essay.pdf"), "essay");
        assert_eq!(title_from_file_name("notes"), "notes");
    }

    #[tokio::test]
    async fn missing_mime_type_is_rejected() {
        let storage = Arc::new(InMemoryStorage::new());
        let result = pipeline(Arc::clone(&storage)).process("a.pdf", "", b"x").await;
        assert!(matches!(result, Err(UploadError::UndetectedType)));
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn unsupported_mime_type_is_rejected() {
        let storage = Arc::new(InMemoryStorage::new());
        let result = pipeline(Arc::clone(&storage))
            .process("a.txt", "text/plain", b"x")
            .await;
        assert!(matches!(result, Err(UploadError::UnsupportedType(_))));
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn oversize_file_is_rejected_before_any_storage_write() {
        let storage = Arc::new(InMemoryStorage::new());
        let data = vec![0u8; 2048];
        let result = pipeline(Arc::clone(&storage))
            .process("a.pdf", MIME_PDF, &data)
            .await;
        assert!(matches!(
            result,
            Err(UploadError::Oversize { size: 2048, limit: 1024 })
        ));
        assert!(storage.is_empty());
    }
}

use async_trait::async_trait;
use editor_core::error::AppError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{info, instrument};

/// Blob storage for uploaded source files.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn upload(&self, key: &str, data: &[u8]) -> Result<(), AppError>;
    async fn download(&self, key: &str) -> Result<Vec<u8>, AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

/// Stores blobs under a base directory on the local filesystem.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, AppError> {
        if key.split('/').any(|part| part == "..") {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Invalid storage key: {key}"
            )));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    #[instrument(skip(self, data), fields(key = %key, size = data.len()))]
    async fn upload(&self, key: &str, data: &[u8]) -> Result<(), AppError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::StorageError(anyhow::anyhow!(e)))?;
        }
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::StorageError(anyhow::anyhow!(e)))?;
        info!("Stored object at {}", path.display());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn download(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound(
                anyhow::anyhow!("Object not found: {key}"),
            )),
            Err(e) => Err(AppError::StorageError(anyhow::anyhow!(e))),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::StorageError(anyhow::anyhow!(e))),
        }
    }
}

/// Keeps blobs in a process-local map. Used by tests.
#[derive(Default)]
pub struct InMemoryStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.files
            .lock()
            .expect("in-memory storage lock poisoned")
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.files
            .lock()
            .expect("in-memory storage lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn upload(&self, key: &str, data: &[u8]) -> Result<(), AppError> {
        self.files
            .lock()
            .expect("in-memory storage lock poisoned")
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, AppError> {
        self.files
            .lock()
            .expect("in-memory storage lock poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Object not found: {key}")))
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.files
            .lock()
            .expect("in-memory storage lock poisoned")
            .remove(key);
        Ok(())
    }
}

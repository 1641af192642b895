//! Document state manager.
//!
//! Holds the active document, the document list, the save-in-flight
//! flag and the last error, and mediates all reads and writes through
//! the persistence gateway. Editor content changes arrive here and are
//! debounced into a single write per quiet period.

use editor_core::error::AppError;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::models::{CreateDocument, Document, UpdateDocument};
use crate::services::gateway::{validate_title, PersistenceGateway};
use crate::state::autosave::SaveScheduler;

#[derive(Default)]
struct Inner {
    current: Option<Document>,
    documents: Vec<Document>,
    saving: bool,
    error: Option<String>,
}

/// Point-in-time view of the manager, for rendering and assertions.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DocumentSnapshot {
    pub current: Option<Document>,
    pub documents: Vec<Document>,
    pub saving: bool,
    pub error: Option<String>,
}

pub struct DocumentState {
    gateway: Arc<dyn PersistenceGateway>,
    autosave: SaveScheduler,
    debounce: Duration,
    inner: Mutex<Inner>,
}

impl DocumentState {
    pub fn new(gateway: Arc<dyn PersistenceGateway>, debounce: Duration) -> Self {
        Self {
            gateway,
            autosave: SaveScheduler::new(),
            debounce,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("document state lock poisoned")
    }

    fn begin(&self) {
        let mut inner = self.lock();
        inner.saving = true;
        inner.error = None;
    }

    fn fail(&self, error: &AppError) {
        let mut inner = self.lock();
        inner.saving = false;
        inner.error = Some(error.to_string());
    }

    /// Fetch the full document list. On failure the list is emptied
    /// rather than left stale.
    #[instrument(skip(self))]
    pub async fn load_all(&self) -> Result<Vec<Document>, AppError> {
        self.begin();
        match self.gateway.list_documents().await {
            Ok(documents) => {
                let mut inner = self.lock();
                inner.documents = documents.clone();
                inner.saving = false;
                Ok(documents)
            }
            Err(e) => {
                let mut inner = self.lock();
                inner.saving = false;
                inner.error = Some(e.to_string());
                inner.documents.clear();
                Err(e)
            }
        }
    }

    /// Fetch one document and make it current. On failure the current
    /// slot is cleared so a stale document is never left displayed.
    #[instrument(skip(self))]
    pub async fn load(&self, id: Uuid) -> Result<Document, AppError> {
        self.begin();
        match self.gateway.get_document(id).await {
            Ok(document) => {
                let mut inner = self.lock();
                inner.current = Some(document.clone());
                inner.saving = false;
                Ok(document)
            }
            Err(e) => {
                let mut inner = self.lock();
                inner.saving = false;
                inner.error = Some(e.to_string());
                inner.current = None;
                Err(e)
            }
        }
    }

    /// Create a new document and adopt it as current. Only valid when
    /// no document is loaded; use `update` for edits to an existing one.
    #[instrument(skip(self, content), fields(title = %title))]
    pub async fn save(&self, title: &str, content: &str) -> Result<Document, AppError> {
        let already_loaded = self.lock().current.is_some();
        if already_loaded {
            let e = AppError::BadRequest(anyhow::anyhow!(
                "A document is already loaded; update it instead of saving a new one"
            ));
            self.fail(&e);
            return Err(e);
        }

        let title = title.trim();
        if let Err(e) = validate_title(title) {
            self.fail(&e);
            return Err(e);
        }

        self.begin();
        let input = CreateDocument {
            title: title.to_string(),
            content: content.to_string(),
        };
        match self.gateway.create_document(&input).await {
            Ok(document) => {
                let mut inner = self.lock();
                inner.current = Some(document.clone());
                // Guard against duplicate creation races in the list.
                inner.documents.retain(|d| d.id != document.id);
                inner.documents.push(document.clone());
                inner.saving = false;
                info!(document_id = %document.id, "Created document");
                Ok(document)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Write through a partial update, then replace the list entry and
    /// (if the identifiers match) the current document. The update is
    /// never applied locally before the write resolves.
    #[instrument(skip(self, updates))]
    pub async fn update(&self, id: Uuid, updates: UpdateDocument) -> Result<Document, AppError> {
        let updates = UpdateDocument {
            title: updates.title.map(|t| t.trim().to_string()),
            content: updates.content,
        };
        if let Some(title) = &updates.title {
            if let Err(e) = validate_title(title) {
                self.fail(&e);
                return Err(e);
            }
        }

        self.begin();
        match self.gateway.update_document(id, &updates).await {
            Ok(document) => {
                let mut inner = self.lock();
                for entry in &mut inner.documents {
                    if entry.id == id {
                        *entry = document.clone();
                    }
                }
                if inner.current.as_ref().map(|d| d.id) == Some(id) {
                    inner.current = Some(document.clone());
                }
                inner.saving = false;
                Ok(document)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Delete from the store, then drop the list entry and the current
    /// slot if it matches.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.begin();
        match self.gateway.delete_document(id).await {
            Ok(()) => {
                let mut inner = self.lock();
                inner.documents.retain(|d| d.id != id);
                if inner.current.as_ref().map(|d| d.id) == Some(id) {
                    inner.current = None;
                }
                inner.saving = false;
                info!(document_id = %id, "Deleted document");
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Debounce a content edit into a deferred write. A new edit within
    /// the window cancels the pending one, so only the latest content
    /// in a burst is persisted.
    pub fn schedule_autosave(self: Arc<Self>, id: Uuid, content: String) {
        let state = Arc::clone(&self);
        self.autosave.schedule(self.debounce, async move {
            let updates = UpdateDocument {
                title: None,
                content: Some(content),
            };
            if let Err(e) = state.update(id, updates).await {
                warn!(document_id = %id, error = %e, "Autosave failed");
            }
        });
    }

    /// Drop any pending autosave without running it.
    pub fn cancel_pending_save(&self) {
        self.autosave.cancel_pending();
    }

    pub fn has_pending_save(&self) -> bool {
        self.autosave.has_pending()
    }

    pub fn set_current(&self, document: Option<Document>) {
        self.lock().current = document;
    }

    pub fn clear_error(&self) {
        self.lock().error = None;
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        let inner = self.lock();
        DocumentSnapshot {
            current: inner.current.clone(),
            documents: inner.documents.clone(),
            saving: inner.saving,
            error: inner.error.clone(),
        }
    }
}

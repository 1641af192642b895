//! In-memory persistence gateway.
//!
//! Backs the state managers in tests and in local development when no
//! Postgres instance is available. Semantics (validation, ordering,
//! error taxonomy) mirror the Postgres gateway.

use async_trait::async_trait;
use chrono::Utc;
use editor_core::error::AppError;
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    ConversationMessage, ConversationSession, CreateDocument, CreateSuggestion, Document, Feedback,
    MessageRole, SessionWithMessages, Suggestion, UpdateDocument,
};
use crate::services::gateway::{validate_message_content, validate_title, PersistenceGateway};

#[derive(Default)]
struct Store {
    documents: Vec<Document>,
    suggestions: Vec<Suggestion>,
    sessions: Vec<ConversationSession>,
    messages: Vec<ConversationMessage>,
    calls: Vec<&'static str>,
}

/// Volatile gateway over process memory.
#[derive(Default)]
pub struct InMemoryGateway {
    store: Mutex<Store>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the gateway operations issued so far, in call order.
    /// Lets tests assert which store calls an operation did (or did
    /// not) produce.
    pub fn recorded_calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().expect("in-memory store lock poisoned")
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn create_document(&self, input: &CreateDocument) -> Result<Document, AppError> {
        validate_title(&input.title)?;

        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            content: input.content.clone(),
            version: 1,
            created_at: now,
            updated_at: now,
        };

        let mut store = self.lock();
        store.calls.push("create_document");
        store.documents.push(document.clone());

        Ok(document)
    }

    async fn get_document(&self, id: Uuid) -> Result<Document, AppError> {
        let mut store = self.lock();
        store.calls.push("get_document");
        store
            .documents
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document not found")))
    }

    async fn update_document(
        &self,
        id: Uuid,
        input: &UpdateDocument,
    ) -> Result<Document, AppError> {
        let title = input.title.as_deref().map(str::trim);
        if let Some(t) = title {
            validate_title(t)?;
        }

        let mut store = self.lock();
        store.calls.push("update_document");
        let document = store
            .documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document not found")))?;

        if let Some(t) = title {
            document.title = t.to_string();
        }
        if let Some(content) = &input.content {
            document.content = content.clone();
        }
        document.version += 1;
        document.updated_at = Utc::now();

        Ok(document.clone())
    }

    async fn delete_document(&self, id: Uuid) -> Result<(), AppError> {
        let mut store = self.lock();
        store.calls.push("delete_document");
        let before = store.documents.len();
        store.documents.retain(|d| d.id != id);
        if store.documents.len() == before {
            return Err(AppError::NotFound(anyhow::anyhow!("Document not found")));
        }
        // Cascade, as the schema's foreign keys do.
        let session_ids: Vec<Uuid> = store
            .sessions
            .iter()
            .filter(|s| s.document_id == id)
            .map(|s| s.id)
            .collect();
        store.suggestions.retain(|s| s.document_id != id);
        store.sessions.retain(|s| s.document_id != id);
        store
            .messages
            .retain(|m| !session_ids.contains(&m.session_id));
        Ok(())
    }

    async fn list_documents(&self) -> Result<Vec<Document>, AppError> {
        let mut store = self.lock();
        store.calls.push("list_documents");
        let mut documents = store.documents.clone();
        documents.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(documents)
    }

    async fn create_suggestion(&self, input: &CreateSuggestion) -> Result<Suggestion, AppError> {
        validate_message_content(&input.prompt)?;

        let mut store = self.lock();
        store.calls.push("create_suggestion");
        if !store.documents.iter().any(|d| d.id == input.document_id) {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Referenced record does not exist"
            )));
        }

        let suggestion = Suggestion {
            id: Uuid::new_v4(),
            document_id: input.document_id,
            prompt: input.prompt.clone(),
            content: input.content.clone(),
            kind: input.kind.clone(),
            context: input.context.clone(),
            feedback: None,
            created_at: Utc::now(),
        };
        store.suggestions.push(suggestion.clone());

        Ok(suggestion)
    }

    async fn list_suggestions(&self, document_id: Uuid) -> Result<Vec<Suggestion>, AppError> {
        let mut store = self.lock();
        store.calls.push("list_suggestions");
        let mut suggestions: Vec<Suggestion> = store
            .suggestions
            .iter()
            .filter(|s| s.document_id == document_id)
            .cloned()
            .collect();
        suggestions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(suggestions)
    }

    async fn update_suggestion_feedback(
        &self,
        id: Uuid,
        feedback: Feedback,
    ) -> Result<Suggestion, AppError> {
        let mut store = self.lock();
        store.calls.push("update_suggestion_feedback");
        let suggestion = store
            .suggestions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Suggestion not found")))?;
        suggestion.feedback = Some(feedback.as_str().to_string());
        Ok(suggestion.clone())
    }

    async fn delete_suggestions(&self, document_id: Uuid) -> Result<u64, AppError> {
        let mut store = self.lock();
        store.calls.push("delete_suggestions");
        let before = store.suggestions.len();
        store.suggestions.retain(|s| s.document_id != document_id);
        Ok((before - store.suggestions.len()) as u64)
    }

    async fn create_session(&self, document_id: Uuid) -> Result<ConversationSession, AppError> {
        let mut store = self.lock();
        store.calls.push("create_session");
        if !store.documents.iter().any(|d| d.id == document_id) {
            return Err(AppError::NotFound(anyhow::anyhow!("Document not found")));
        }

        let session = ConversationSession {
            id: Uuid::new_v4(),
            document_id,
            mode: "support".to_string(),
            created_at: Utc::now(),
        };
        store.sessions.push(session.clone());

        Ok(session)
    }

    async fn list_sessions(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<ConversationSession>, AppError> {
        let mut store = self.lock();
        store.calls.push("list_sessions");
        let mut sessions: Vec<ConversationSession> = store
            .sessions
            .iter()
            .filter(|s| s.document_id == document_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn get_session_with_messages(&self, id: Uuid) -> Result<SessionWithMessages, AppError> {
        let mut store = self.lock();
        store.calls.push("get_session_with_messages");
        let session = store
            .sessions
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session not found")))?;
        let mut messages: Vec<ConversationMessage> = store
            .messages
            .iter()
            .filter(|m| m.session_id == id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.order_index);
        Ok(SessionWithMessages { session, messages })
    }

    async fn append_message(
        &self,
        session_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<ConversationMessage, AppError> {
        validate_message_content(content)?;

        let mut store = self.lock();
        store.calls.push("append_message");
        if !store.sessions.iter().any(|s| s.id == session_id) {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Referenced record does not exist"
            )));
        }

        let next_index = store
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .map(|m| m.order_index + 1)
            .max()
            .unwrap_or(0);

        let message = ConversationMessage {
            id: Uuid::new_v4(),
            session_id,
            role: role.as_str().to_string(),
            content: content.to_string(),
            order_index: next_index,
            created_at: Utc::now(),
        };
        store.messages.push(message.clone());

        Ok(message)
    }

    async fn list_messages(
        &self,
        session_id: Uuid,
    ) -> Result<Vec<ConversationMessage>, AppError> {
        let mut store = self.lock();
        store.calls.push("list_messages");
        let mut messages: Vec<ConversationMessage> = store
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.order_index);
        Ok(messages)
    }

    async fn clear_messages(&self, session_id: Uuid) -> Result<u64, AppError> {
        let mut store = self.lock();
        store.calls.push("clear_messages");
        let before = store.messages.len();
        store.messages.retain(|m| m.session_id != session_id);
        Ok((before - store.messages.len()) as u64)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

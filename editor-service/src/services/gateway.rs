//! Persistence gateway contract.
//!
//! A typed wrapper over the backing store. Writes validate their
//! required fields before issuing any request, and every backend error
//! is normalized into the `AppError` taxonomy — callers never see
//! store-native error shapes.

use async_trait::async_trait;
use editor_core::error::AppError;
use uuid::Uuid;

use crate::models::{
    ConversationMessage, ConversationSession, CreateDocument, CreateSuggestion, Document, Feedback,
    MessageRole, SessionWithMessages, Suggestion, UpdateDocument,
};

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    // Documents
    async fn create_document(&self, input: &CreateDocument) -> Result<Document, AppError>;
    async fn get_document(&self, id: Uuid) -> Result<Document, AppError>;
    async fn update_document(&self, id: Uuid, input: &UpdateDocument)
        -> Result<Document, AppError>;
    async fn delete_document(&self, id: Uuid) -> Result<(), AppError>;
    /// Most recently updated first.
    async fn list_documents(&self) -> Result<Vec<Document>, AppError>;

    // Suggestions
    async fn create_suggestion(&self, input: &CreateSuggestion) -> Result<Suggestion, AppError>;
    /// Most recently created first.
    async fn list_suggestions(&self, document_id: Uuid) -> Result<Vec<Suggestion>, AppError>;
    async fn update_suggestion_feedback(
        &self,
        id: Uuid,
        feedback: Feedback,
    ) -> Result<Suggestion, AppError>;
    /// Delete every suggestion for a document; returns the count removed.
    async fn delete_suggestions(&self, document_id: Uuid) -> Result<u64, AppError>;

    // Conversations
    async fn create_session(&self, document_id: Uuid) -> Result<ConversationSession, AppError>;
    /// Most recently created first.
    async fn list_sessions(&self, document_id: Uuid)
        -> Result<Vec<ConversationSession>, AppError>;
    async fn get_session_with_messages(&self, id: Uuid) -> Result<SessionWithMessages, AppError>;
    /// Append with the next order index for the session.
    async fn append_message(
        &self,
        session_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<ConversationMessage, AppError>;
    /// Ascending order index.
    async fn list_messages(&self, session_id: Uuid)
        -> Result<Vec<ConversationMessage>, AppError>;
    /// Delete every message for a session, keeping the session record.
    async fn clear_messages(&self, session_id: Uuid) -> Result<u64, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

/// Fail fast on an empty (after trim) document title.
pub fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Document title must not be empty"
        )));
    }
    Ok(())
}

/// Fail fast on an empty message body.
pub fn validate_message_content(content: &str) -> Result<(), AppError> {
    if content.trim().is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Message content must not be empty"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_titles_are_rejected() {
        assert!(validate_title("").is_err());
        assert!(validate_title("   \t ").is_err());
        assert!(validate_title("Notes").is_ok());
    }

    #[test]
    fn empty_message_content_is_rejected() {
        assert!(validate_message_content("  ").is_err());
        assert!(validate_message_content("hello").is_ok());
    }
}

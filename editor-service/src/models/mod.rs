//! Domain models for editor-service.

mod conversation;
mod document;
mod suggestion;

pub use conversation::{
    AssistantMode, ClearScope, ConversationMessage, ConversationSession, MessageRole,
    SessionWithMessages,
};
pub use document::{CreateDocument, Document, UpdateDocument};
pub use suggestion::{CreateSuggestion, Feedback, Suggestion, SUGGESTION_KIND_GENERATION};

//! Conversation session and message models for editor-service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Assistant operating mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantMode {
    #[default]
    Create,
    Support,
}

impl AssistantMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssistantMode::Create => "create",
            AssistantMode::Support => "support",
        }
    }
}

/// Role of a conversation message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A scoped Q&A thread tied to one document.
///
/// Sessions are never deleted automatically; clearing a transcript
/// removes messages but keeps the session record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ConversationSession {
    pub id: Uuid,
    pub document_id: Uuid,
    pub mode: String,
    pub created_at: DateTime<Utc>,
}

/// An append-only message within a session.
///
/// `order_index` is strictly increasing per session, starting at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ConversationMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: String,
    pub content: String,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

/// Shallow nested fetch of a session and its ordered messages.
#[derive(Debug, Clone, Serialize)]
pub struct SessionWithMessages {
    pub session: ConversationSession,
    pub messages: Vec<ConversationMessage>,
}

/// Deletion scope for the assistant "clear" action.
///
/// Suggestions are cleared per document; transcripts per session. The
/// two are distinct operations and never combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ClearScope {
    Suggestions { document_id: Uuid },
    Transcript { session_id: Uuid },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_scope_round_trips_through_tagged_json() {
        let scope = ClearScope::Suggestions {
            document_id: Uuid::new_v4(),
        };
        let json = serde_json::to_string(&scope).unwrap();
        assert!(json.contains("\"scope\":\"suggestions\""));
        let back: ClearScope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scope);

        let scope = ClearScope::Transcript {
            session_id: Uuid::new_v4(),
        };
        let json = serde_json::to_string(&scope).unwrap();
        assert!(json.contains("\"scope\":\"transcript\""));
        let back: ClearScope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scope);
    }
}

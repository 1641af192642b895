//! Suggestion model for editor-service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Kind tag for suggestions produced by the content-generation flow.
pub const SUGGESTION_KIND_GENERATION: &str = "generation";

/// User feedback on a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Positive,
    Negative,
}

impl Feedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::Positive => "positive",
            Feedback::Negative => "negative",
        }
    }
}

/// A persisted AI-generated response, scoped to one document.
///
/// Immutable after creation except for the `feedback` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Suggestion {
    pub id: Uuid,
    pub document_id: Uuid,
    pub prompt: String,
    pub content: String,
    pub kind: String,
    pub context: Option<String>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateSuggestion {
    pub document_id: Uuid,
    pub prompt: String,
    pub content: String,
    pub kind: String,
    pub context: Option<String>,
}

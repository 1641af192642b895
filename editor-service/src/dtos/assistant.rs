use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{AssistantMode, ConversationMessage, Feedback, Suggestion};

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateSuggestionRequest {
    pub document_id: Uuid,
    #[validate(length(min = 1, message = "Instruction must not be empty"))]
    pub instruction: String,
    /// Current editor markup, stripped to plain text for context.
    #[serde(default)]
    pub editor_html: String,
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: AssistantMode,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AskRequest {
    #[validate(length(min = 1, message = "Question must not be empty"))]
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub feedback: Feedback,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TextRequest {
    #[validate(length(min = 1, message = "Text must not be empty"))]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionListResponse {
    pub suggestions: Vec<Suggestion>,
    pub success_count: u64,
    pub failure_count: u64,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub session_id: Option<Uuid>,
    pub messages: Vec<ConversationMessage>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedTextResponse {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub cleared: &'static str,
}

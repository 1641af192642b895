//! Chat completion provider abstractions and implementations.
//!
//! A trait-based seam over the assistant backend so the state managers
//! can run against a real API or a mock interchangeably.

pub mod mock;
pub mod openai;

use async_trait::async_trait;
use editor_core::error::AppError;
use thiserror::Error;

/// System prompt for suggestion generation.
pub const WRITING_ASSISTANT_PROMPT: &str = "You are a professional writing assistant. Your task is to help improve and enhance text while maintaining its core message. Provide responses in HTML format using appropriate paragraph tags.";

/// System prompt for the alternatives operation.
pub const ALTERNATIVES_PROMPT: &str = "You are a professional writing assistant. Provide 3 alternative versions of the given text, each improving it in a different way. Format the response as HTML with each suggestion in a separate paragraph tag.";

/// System prompt for the analysis operation.
pub const ANALYSIS_PROMPT: &str = "Analyze the given text and provide insights about its style, tone, and potential improvements. Format the response as HTML with appropriate paragraph tags.";

/// System prompt for support-mode conversations.
pub const SUPPORT_ASSISTANT_PROMPT: &str = "You are a helpful writing support assistant. Answer questions about the user's document and about writing in general. Provide responses in HTML format using appropriate paragraph tags.";

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("No content generated")]
    Empty,
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        AppError::InferenceError(e.to_string())
    }
}

/// Role of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One turn of a chat completion request.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Trait for chat completion backends.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Run a completion over the given turns and return the assistant reply.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}

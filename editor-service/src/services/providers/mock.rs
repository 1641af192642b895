//! Mock provider implementation for testing and local development.

use super::{ChatMessage, ChatProvider, ProviderError};
use async_trait::async_trait;
use std::sync::Mutex;

/// Mock chat provider. Records every request it receives so tests can
/// assert whether (and with what turns) the backend was called.
pub struct MockChatProvider {
    enabled: bool,
    reply: String,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockChatProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            reply: "<p>Mock assistant reply.</p>".to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Use a fixed reply instead of the default one.
    pub fn with_reply(enabled: bool, reply: impl Into<String>) -> Self {
        Self {
            enabled,
            reply: reply.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, oldest first.
    pub fn recorded_calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().expect("mock provider lock poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock provider lock poisoned").len()
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        self.calls
            .lock()
            .expect("mock provider lock poisoned")
            .push(messages.to_vec());

        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock chat provider not enabled".to_string(),
            ));
        }

        Ok(self.reply.clone())
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock chat provider not enabled".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_requests_and_replies() {
        let provider = MockChatProvider::with_reply(true, "<p>ok</p>");
        let reply = provider
            .complete(&[ChatMessage::user("hello")])
            .await
            .unwrap();
        assert_eq!(reply, "<p>ok</p>");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.recorded_calls()[0][0].content, "hello");
    }

    #[tokio::test]
    async fn disabled_provider_errors() {
        let provider = MockChatProvider::new(false);
        let result = provider.complete(&[ChatMessage::user("hello")]).await;
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }
}

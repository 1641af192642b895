//! Assistant state manager.
//!
//! Dual-mode state machine over the AI surface. Create mode holds a
//! reverse-chronological suggestion list; support mode holds an ordered
//! conversation transcript tied to one session per document. All
//! inference goes through the `ChatProvider` seam and all persistence
//! through the gateway.

use editor_core::error::AppError;
use metrics::counter;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::markup::strip_markup;
use crate::models::{
    AssistantMode, ClearScope, ConversationMessage, CreateSuggestion, Feedback, MessageRole,
    Suggestion, SUGGESTION_KIND_GENERATION,
};
use crate::services::gateway::PersistenceGateway;
use crate::services::providers::{
    ChatMessage, ChatProvider, ALTERNATIVES_PROMPT, ANALYSIS_PROMPT, SUPPORT_ASSISTANT_PROMPT,
    WRITING_ASSISTANT_PROMPT,
};

#[derive(Default)]
struct Inner {
    mode: AssistantMode,
    document_id: Option<Uuid>,
    suggestions: Vec<Suggestion>,
    transcript: Vec<ConversationMessage>,
    active_session: Option<Uuid>,
    selected: Option<Uuid>,
    loading: bool,
    error: Option<String>,
    success_count: u64,
    failure_count: u64,
}

/// Point-in-time view of the manager.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AssistantSnapshot {
    pub mode: AssistantMode,
    pub document_id: Option<Uuid>,
    pub suggestions: Vec<Suggestion>,
    pub transcript: Vec<ConversationMessage>,
    pub active_session: Option<Uuid>,
    pub selected: Option<Uuid>,
    pub loading: bool,
    pub error: Option<String>,
    pub success_count: u64,
    pub failure_count: u64,
}

pub struct AssistantState {
    gateway: Arc<dyn PersistenceGateway>,
    provider: Arc<dyn ChatProvider>,
    inner: Mutex<Inner>,
}

impl AssistantState {
    pub fn new(gateway: Arc<dyn PersistenceGateway>, provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            gateway,
            provider,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("assistant state lock poisoned")
    }

    fn begin(&self) {
        let mut inner = self.lock();
        inner.loading = true;
        inner.error = None;
    }

    fn fail(&self, error: &AppError) {
        let mut inner = self.lock();
        inner.loading = false;
        inner.error = Some(error.to_string());
    }

    /// Point the assistant at a document (or at none). Switching
    /// documents drops the active session and transcript; suggestions
    /// are reloaded for the new document.
    #[instrument(skip(self))]
    pub async fn set_document(&self, document_id: Option<Uuid>) -> Result<(), AppError> {
        {
            let mut inner = self.lock();
            inner.document_id = document_id;
            inner.active_session = None;
            inner.transcript.clear();
            inner.selected = None;
            if document_id.is_none() {
                inner.suggestions.clear();
                return Ok(());
            }
        }

        let id = match document_id {
            Some(id) => id,
            None => return Ok(()),
        };

        self.begin();
        match self.gateway.list_suggestions(id).await {
            Ok(suggestions) => {
                let mut inner = self.lock();
                inner.suggestions = suggestions;
                inner.loading = false;
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Generate a suggestion from the current editor content and a user
    /// instruction. The content is stripped to plain text and sent as
    /// context; the persisted suggestion is prepended to the list.
    #[instrument(skip(self, instruction, editor_html))]
    pub async fn generate(
        &self,
        instruction: &str,
        editor_html: &str,
    ) -> Result<Suggestion, AppError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Instruction must not be empty"
            )));
        }

        let document_id = self.lock().document_id.ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("No document selected for the assistant"))
        })?;

        let context = strip_markup(editor_html);
        if context.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Add some content to the document before generating"
            )));
        }

        self.begin();
        let full_prompt = format!("Context:\n{context}\n\nPrompt: {instruction}");
        let messages = [
            ChatMessage::system(WRITING_ASSISTANT_PROMPT),
            ChatMessage::user(full_prompt),
        ];

        let content = match self.provider.complete(&messages).await {
            Ok(content) => content,
            Err(e) => {
                let e = AppError::from(e);
                self.record_failure(&e);
                return Err(e);
            }
        };

        let input = CreateSuggestion {
            document_id,
            prompt: instruction.to_string(),
            content,
            kind: SUGGESTION_KIND_GENERATION.to_string(),
            context: Some("With editor content".to_string()),
        };
        match self.gateway.create_suggestion(&input).await {
            Ok(suggestion) => {
                let mut inner = self.lock();
                inner.suggestions.insert(0, suggestion.clone());
                inner.loading = false;
                inner.success_count += 1;
                drop(inner);
                counter!("assistant_suggestions_total", "outcome" => "success").increment(1);
                info!(suggestion_id = %suggestion.id, "Generated suggestion");
                Ok(suggestion)
            }
            Err(e) => {
                self.record_failure(&e);
                Err(e)
            }
        }
    }

    fn record_failure(&self, error: &AppError) {
        {
            let mut inner = self.lock();
            inner.loading = false;
            inner.error = Some(error.to_string());
            inner.failure_count += 1;
        }
        counter!("assistant_suggestions_total", "outcome" => "failure").increment(1);
    }

    /// Switch into support mode: reuse the most recently created
    /// session for the document if one exists, else create one, then
    /// load its full message history.
    #[instrument(skip(self))]
    pub async fn enter_support(&self) -> Result<(), AppError> {
        let document_id = self.lock().document_id.ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("No document selected for the assistant"))
        })?;

        self.begin();
        let session = match self.gateway.list_sessions(document_id).await {
            Ok(sessions) => match sessions.into_iter().next() {
                Some(session) => session,
                None => match self.gateway.create_session(document_id).await {
                    Ok(session) => session,
                    Err(e) => {
                        self.fail(&e);
                        return Err(e);
                    }
                },
            },
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        match self.gateway.list_messages(session.id).await {
            Ok(messages) => {
                let mut inner = self.lock();
                inner.mode = AssistantMode::Support;
                inner.active_session = Some(session.id);
                inner.transcript = messages;
                inner.loading = false;
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Switch back to create mode. The transcript is kept so a
    /// transient excursion into create mode loses nothing, but the
    /// active session reference is cleared until support is re-entered.
    pub fn leave_support(&self) {
        let mut inner = self.lock();
        inner.mode = AssistantMode::Create;
        inner.active_session = None;
    }

    /// Send a support-mode question. The prior transcript is replayed
    /// as role-tagged turns; both the question and the reply are
    /// persisted and appended in that order.
    #[instrument(skip(self, question))]
    pub async fn ask(&self, question: &str) -> Result<ConversationMessage, AppError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Question must not be empty"
            )));
        }

        let (session_id, history) = {
            let inner = self.lock();
            let session_id = inner.active_session.ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!("No active support session"))
            })?;
            (session_id, inner.transcript.clone())
        };

        self.begin();
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(SUPPORT_ASSISTANT_PROMPT));
        for turn in &history {
            let message = match turn.role.as_str() {
                "assistant" => ChatMessage::assistant(turn.content.clone()),
                _ => ChatMessage::user(turn.content.clone()),
            };
            messages.push(message);
        }
        messages.push(ChatMessage::user(question));

        let reply = match self.provider.complete(&messages).await {
            Ok(reply) => reply,
            Err(e) => {
                let e = AppError::from(e);
                self.record_failure(&e);
                return Err(e);
            }
        };

        let user_message = match self
            .gateway
            .append_message(session_id, MessageRole::User, question)
            .await
        {
            Ok(message) => message,
            Err(e) => {
                self.record_failure(&e);
                return Err(e);
            }
        };
        let assistant_message = match self
            .gateway
            .append_message(session_id, MessageRole::Assistant, &reply)
            .await
        {
            Ok(message) => message,
            Err(e) => {
                self.record_failure(&e);
                return Err(e);
            }
        };

        let mut inner = self.lock();
        inner.transcript.push(user_message);
        inner.transcript.push(assistant_message.clone());
        inner.loading = false;
        inner.success_count += 1;
        Ok(assistant_message)
    }

    /// Scoped deletion: suggestions for a document, or the transcript
    /// of one session. Never both.
    #[instrument(skip(self))]
    pub async fn clear(&self, scope: ClearScope) -> Result<(), AppError> {
        match scope {
            ClearScope::Suggestions { document_id } => {
                self.begin();
                match self.gateway.delete_suggestions(document_id).await {
                    Ok(removed) => {
                        let mut inner = self.lock();
                        inner.suggestions.clear();
                        inner.selected = None;
                        inner.error = None;
                        inner.loading = false;
                        info!(document_id = %document_id, removed, "Cleared suggestions");
                        Ok(())
                    }
                    Err(e) => {
                        self.fail(&e);
                        Err(e)
                    }
                }
            }
            ClearScope::Transcript { session_id } => {
                self.begin();
                match self.gateway.clear_messages(session_id).await {
                    Ok(removed) => {
                        let mut inner = self.lock();
                        inner.transcript.clear();
                        inner.loading = false;
                        info!(session_id = %session_id, removed, "Cleared transcript");
                        Ok(())
                    }
                    Err(e) => {
                        self.fail(&e);
                        Err(e)
                    }
                }
            }
        }
    }

    /// Build the clear scope implied by the current mode, for callers
    /// that expose a single mode-scoped "clear" action.
    pub fn current_clear_scope(&self) -> Result<ClearScope, AppError> {
        let inner = self.lock();
        match inner.mode {
            AssistantMode::Create => {
                let document_id = inner.document_id.ok_or_else(|| {
                    AppError::BadRequest(anyhow::anyhow!("No document selected for the assistant"))
                })?;
                Ok(ClearScope::Suggestions { document_id })
            }
            AssistantMode::Support => {
                let session_id = inner.active_session.ok_or_else(|| {
                    AppError::BadRequest(anyhow::anyhow!("No active support session"))
                })?;
                Ok(ClearScope::Transcript { session_id })
            }
        }
    }

    /// Record feedback on a suggestion. Applied to local state first;
    /// a persistence failure is logged but not rolled back.
    #[instrument(skip(self))]
    pub async fn feedback(&self, suggestion_id: Uuid, feedback: Feedback) -> Result<(), AppError> {
        {
            let mut inner = self.lock();
            let found = inner
                .suggestions
                .iter_mut()
                .find(|s| s.id == suggestion_id)
                .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Suggestion not found")))?;
            found.feedback = Some(feedback.as_str().to_string());
        }

        if let Err(e) = self
            .gateway
            .update_suggestion_feedback(suggestion_id, feedback)
            .await
        {
            warn!(suggestion_id = %suggestion_id, error = %e, "Failed to persist feedback");
        }
        Ok(())
    }

    /// Produce three alternative phrasings of the given text.
    pub async fn alternatives(&self, text: &str) -> Result<String, AppError> {
        self.one_shot(ALTERNATIVES_PROMPT, text).await
    }

    /// Analyze style and tone of the given text.
    pub async fn analyze(&self, text: &str) -> Result<String, AppError> {
        self.one_shot(ANALYSIS_PROMPT, text).await
    }

    async fn one_shot(&self, system_prompt: &str, text: &str) -> Result<String, AppError> {
        let text = strip_markup(text);
        if text.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Text must not be empty"
            )));
        }

        self.begin();
        let messages = [ChatMessage::system(system_prompt), ChatMessage::user(text)];
        match self.provider.complete(&messages).await {
            Ok(reply) => {
                self.lock().loading = false;
                Ok(reply)
            }
            Err(e) => {
                let e = AppError::from(e);
                self.fail(&e);
                Err(e)
            }
        }
    }

    pub fn select(&self, suggestion_id: Option<Uuid>) {
        self.lock().selected = suggestion_id;
    }

    pub fn clear_error(&self) {
        self.lock().error = None;
    }

    pub fn snapshot(&self) -> AssistantSnapshot {
        let inner = self.lock();
        AssistantSnapshot {
            mode: inner.mode,
            document_id: inner.document_id,
            suggestions: inner.suggestions.clone(),
            transcript: inner.transcript.clone(),
            active_session: inner.active_session,
            selected: inner.selected,
            loading: inner.loading,
            error: inner.error.clone(),
            success_count: inner.success_count,
            failure_count: inner.failure_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateDocument;
    use crate::services::memory::InMemoryGateway;
    use crate::services::providers::mock::MockChatProvider;

    struct Fixture {
        gateway: Arc<InMemoryGateway>,
        provider: Arc<MockChatProvider>,
        state: AssistantState,
        document_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let gateway = Arc::new(InMemoryGateway::new());
        let provider = Arc::new(MockChatProvider::with_reply(true, "<p>Generated.</p>"));
        let document = gateway
            .create_document(&CreateDocument {
                title: "Essay".to_string(),
                content: "<p>Hello world</p>".to_string(),
            })
            .await
            .unwrap();
        let state = AssistantState::new(
            Arc::clone(&gateway) as Arc<dyn PersistenceGateway>,
            Arc::clone(&provider) as Arc<dyn ChatProvider>,
        );
        state.set_document(Some(document.id)).await.unwrap();
        Fixture {
            gateway,
            provider,
            state,
            document_id: document.id,
        }
    }

    #[tokio::test]
    async fn generate_composes_context_and_persists_the_suggestion() {
        let f = fixture().await;
        let suggestion = f
            .state
            .generate("Make it formal", "<p>Hello <b>world</b></p>")
            .await
            .unwrap();

        assert_eq!(suggestion.content, "<p>Generated.</p>");
        assert_eq!(suggestion.prompt, "Make it formal");
        assert_eq!(suggestion.kind, SUGGESTION_KIND_GENERATION);

        let calls = f.provider.recorded_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0].content, WRITING_ASSISTANT_PROMPT);
        assert_eq!(
            calls[0][1].content,
            "Context:\nHello world\n\nPrompt: Make it formal"
        );

        let snapshot = f.state.snapshot();
        assert_eq!(snapshot.suggestions[0].id, suggestion.id);
        assert_eq!(snapshot.success_count, 1);
        assert_eq!(snapshot.failure_count, 0);

        let persisted = f.gateway.list_suggestions(f.document_id).await.unwrap();
        assert_eq!(persisted.len(), 1);
    }

    #[tokio::test]
    async fn generate_rejects_empty_context_without_calling_the_provider() {
        let f = fixture().await;
        let result = f.state.generate("Improve this", "<p>   </p>").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(f.provider.call_count(), 0);
        assert_eq!(f.state.snapshot().failure_count, 0);
    }

    #[tokio::test]
    async fn mode_round_trip_preserves_suggestions_and_transcript() {
        let f = fixture().await;
        f.state
            .generate("Summarize", "<p>Some text</p>")
            .await
            .unwrap();

        f.state.enter_support().await.unwrap();
        f.state.ask("What tone is this?").await.unwrap();
        let transcript_len = f.state.snapshot().transcript.len();
        assert_eq!(transcript_len, 2);

        f.state.leave_support();
        let snapshot = f.state.snapshot();
        assert_eq!(snapshot.mode, AssistantMode::Create);
        assert!(snapshot.active_session.is_none());
        assert_eq!(snapshot.suggestions.len(), 1);
        assert_eq!(snapshot.transcript.len(), transcript_len);

        f.state.enter_support().await.unwrap();
        let snapshot = f.state.snapshot();
        assert_eq!(snapshot.mode, AssistantMode::Support);
        assert_eq!(snapshot.transcript.len(), transcript_len);
        assert_eq!(snapshot.suggestions.len(), 1);
    }

    #[tokio::test]
    async fn support_sessions_are_reused_not_duplicated() {
        let f = fixture().await;
        f.state.enter_support().await.unwrap();
        let first = f.state.snapshot().active_session;
        f.state.leave_support();
        f.state.enter_support().await.unwrap();
        assert_eq!(f.state.snapshot().active_session, first);

        let sessions = f.gateway.list_sessions(f.document_id).await.unwrap();
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn ask_without_a_session_issues_no_calls() {
        let f = fixture().await;
        let calls_before = f.gateway.recorded_calls().len();

        let result = f.state.ask("Anyone there?").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(f.provider.call_count(), 0);
        assert_eq!(f.gateway.recorded_calls().len(), calls_before);
    }

    #[tokio::test]
    async fn ask_replays_the_transcript_as_turns() {
        let f = fixture().await;
        f.state.enter_support().await.unwrap();
        f.state.ask("First question").await.unwrap();
        f.state.ask("Second question").await.unwrap();

        let calls = f.provider.recorded_calls();
        let last = &calls[1];
        assert_eq!(last[0].content, SUPPORT_ASSISTANT_PROMPT);
        assert_eq!(last[1].content, "First question");
        assert_eq!(last[2].content, "<p>Generated.</p>");
        assert_eq!(last[3].content, "Second question");
    }

    #[tokio::test]
    async fn clear_is_scoped_to_exactly_one_record_type() {
        let f = fixture().await;
        f.state
            .generate("Summarize", "<p>Some text</p>")
            .await
            .unwrap();
        f.state.enter_support().await.unwrap();
        f.state.ask("A question").await.unwrap();
        let session_id = f.state.snapshot().active_session.unwrap();

        f.state
            .clear(ClearScope::Suggestions {
                document_id: f.document_id,
            })
            .await
            .unwrap();
        let calls = f.gateway.recorded_calls();
        assert!(calls.contains(&"delete_suggestions"));
        assert!(!calls.contains(&"clear_messages"));
        assert!(f.state.snapshot().suggestions.is_empty());
        assert_eq!(f.state.snapshot().transcript.len(), 2);

        f.state
            .clear(ClearScope::Transcript { session_id })
            .await
            .unwrap();
        assert!(f.gateway.recorded_calls().contains(&"clear_messages"));
        assert!(f.state.snapshot().transcript.is_empty());
        // The session record itself survives.
        assert!(f
            .gateway
            .get_session_with_messages(session_id)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn feedback_is_applied_locally_and_persisted() {
        let f = fixture().await;
        let suggestion = f
            .state
            .generate("Summarize", "<p>Some text</p>")
            .await
            .unwrap();

        f.state
            .feedback(suggestion.id, Feedback::Positive)
            .await
            .unwrap();

        let snapshot = f.state.snapshot();
        assert_eq!(
            snapshot.suggestions[0].feedback.as_deref(),
            Some("positive")
        );
        let persisted = f.gateway.list_suggestions(f.document_id).await.unwrap();
        assert_eq!(persisted[0].feedback.as_deref(), Some("positive"));
    }

    #[tokio::test]
    async fn provider_failure_bumps_the_failure_counter() {
        let gateway = Arc::new(InMemoryGateway::new());
        let provider = Arc::new(MockChatProvider::new(false));
        let document = gateway
            .create_document(&CreateDocument {
                title: "Essay".to_string(),
                content: String::new(),
            })
            .await
            .unwrap();
        let state = AssistantState::new(
            Arc::clone(&gateway) as Arc<dyn PersistenceGateway>,
            Arc::clone(&provider) as Arc<dyn ChatProvider>,
        );
        state.set_document(Some(document.id)).await.unwrap();

        let result = state.generate("Improve", "<p>text</p>").await;
        assert!(matches!(result, Err(AppError::InferenceError(_))));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.failure_count, 1);
        assert!(snapshot.error.is_some());
        assert!(!snapshot.loading);
    }
}

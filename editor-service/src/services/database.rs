//! Postgres-backed persistence gateway.

use async_trait::async_trait;
use editor_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{
    ConversationMessage, ConversationSession, CreateDocument, CreateSuggestion, Document, Feedback,
    MessageRole, SessionWithMessages, Suggestion, UpdateDocument,
};
use crate::services::gateway::{validate_message_content, validate_title, PersistenceGateway};

const DOCUMENT_COLUMNS: &str = "id, title, content, version, created_at, updated_at";
const SUGGESTION_COLUMNS: &str =
    "id, document_id, prompt, content, kind, context, feedback, created_at";
const SESSION_COLUMNS: &str = "id, document_id, mode, created_at";
const MESSAGE_COLUMNS: &str = "id, session_id, role, content, order_index, created_at";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "editor-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

/// Normalize a sqlx error into the fixed taxonomy.
///
/// Callers of the gateway never observe backend-native error codes;
/// every failure comes back as not-found, conflict, permission-denied,
/// misconfiguration, or unknown.
fn normalize(operation: &str, e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::RowNotFound => {
            AppError::NotFound(anyhow::anyhow!("No matching record for {}", operation))
        }
        sqlx::Error::Database(db_err) => {
            if db_err.is_unique_violation() {
                return AppError::Conflict(anyhow::anyhow!(
                    "A record with these values already exists"
                ));
            }
            if db_err.is_foreign_key_violation() {
                return AppError::NotFound(anyhow::anyhow!(
                    "Referenced record does not exist"
                ));
            }
            match db_err.code().as_deref() {
                // undefined_table: schema was never provisioned
                Some("42P01") => AppError::Misconfiguration(anyhow::anyhow!(
                    "Database table not found; ensure migrations have been applied"
                )),
                // insufficient_privilege
                Some("42501") => AppError::Forbidden(anyhow::anyhow!(
                    "You don't have permission to perform this operation"
                )),
                _ => AppError::DatabaseError(anyhow::anyhow!("Failed to {}: {}", operation, e)),
            }
        }
        _ => AppError::DatabaseError(anyhow::anyhow!("Failed to {}: {}", operation, e)),
    }
}

#[async_trait]
impl PersistenceGateway for Database {
    #[instrument(skip(self, input))]
    async fn create_document(&self, input: &CreateDocument) -> Result<Document, AppError> {
        validate_title(&input.title)?;

        let id = Uuid::new_v4();
        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            INSERT INTO documents (id, title, content)
            VALUES ($1, $2, $3)
            RETURNING {DOCUMENT_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(input.title.trim())
        .bind(&input.content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| normalize("create document", e))?;

        info!(document_id = %document.id, title = %document.title, "Document created");

        Ok(document)
    }

    #[instrument(skip(self), fields(document_id = %id))]
    async fn get_document(&self, id: Uuid) -> Result<Document, AppError> {
        sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| normalize("fetch document", e))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document not found")))
    }

    #[instrument(skip(self, input), fields(document_id = %id))]
    async fn update_document(
        &self,
        id: Uuid,
        input: &UpdateDocument,
    ) -> Result<Document, AppError> {
        let title = input.title.as_deref().map(str::trim);
        if let Some(t) = title {
            validate_title(t)?;
        }

        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(title)
        .bind(&input.content)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| normalize("update document", e))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document not found")))?;

        info!(document_id = %document.id, version = document.version, "Document updated");

        Ok(document)
    }

    #[instrument(skip(self), fields(document_id = %id))]
    async fn delete_document(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| normalize("delete document", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Document not found")));
        }

        info!(document_id = %id, "Document deleted");

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_documents(&self) -> Result<Vec<Document>, AppError> {
        sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY updated_at DESC",
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| normalize("list documents", e))
    }

    #[instrument(skip(self, input), fields(document_id = %input.document_id))]
    async fn create_suggestion(&self, input: &CreateSuggestion) -> Result<Suggestion, AppError> {
        validate_message_content(&input.prompt)?;

        let id = Uuid::new_v4();
        let suggestion = sqlx::query_as::<_, Suggestion>(&format!(
            r#"
            INSERT INTO suggestions (id, document_id, prompt, content, kind, context)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SUGGESTION_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(input.document_id)
        .bind(&input.prompt)
        .bind(&input.content)
        .bind(&input.kind)
        .bind(&input.context)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| normalize("create suggestion", e))?;

        info!(suggestion_id = %suggestion.id, "Suggestion created");

        Ok(suggestion)
    }

    #[instrument(skip(self), fields(document_id = %document_id))]
    async fn list_suggestions(&self, document_id: Uuid) -> Result<Vec<Suggestion>, AppError> {
        sqlx::query_as::<_, Suggestion>(&format!(
            r#"
            SELECT {SUGGESTION_COLUMNS}
            FROM suggestions
            WHERE document_id = $1
            ORDER BY created_at DESC
            "#,
        ))
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| normalize("fetch suggestions", e))
    }

    #[instrument(skip(self), fields(suggestion_id = %id))]
    async fn update_suggestion_feedback(
        &self,
        id: Uuid,
        feedback: Feedback,
    ) -> Result<Suggestion, AppError> {
        sqlx::query_as::<_, Suggestion>(&format!(
            r#"
            UPDATE suggestions
            SET feedback = $2
            WHERE id = $1
            RETURNING {SUGGESTION_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(feedback.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| normalize("update suggestion feedback", e))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Suggestion not found")))
    }

    #[instrument(skip(self), fields(document_id = %document_id))]
    async fn delete_suggestions(&self, document_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM suggestions WHERE document_id = $1")
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(|e| normalize("delete suggestions", e))?;

        info!(
            document_id = %document_id,
            removed = result.rows_affected(),
            "Suggestions cleared"
        );

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(document_id = %document_id))]
    async fn create_session(&self, document_id: Uuid) -> Result<ConversationSession, AppError> {
        // Verify the document exists so the caller gets not-found
        // instead of a constraint failure message.
        self.get_document(document_id).await?;

        let id = Uuid::new_v4();
        let session = sqlx::query_as::<_, ConversationSession>(&format!(
            r#"
            INSERT INTO conversation_sessions (id, document_id, mode)
            VALUES ($1, $2, 'support')
            RETURNING {SESSION_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(document_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| normalize("create conversation session", e))?;

        info!(session_id = %session.id, document_id = %document_id, "Conversation session created");

        Ok(session)
    }

    #[instrument(skip(self), fields(document_id = %document_id))]
    async fn list_sessions(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<ConversationSession>, AppError> {
        sqlx::query_as::<_, ConversationSession>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM conversation_sessions
            WHERE document_id = $1
            ORDER BY created_at DESC
            "#,
        ))
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| normalize("fetch document sessions", e))
    }

    #[instrument(skip(self), fields(session_id = %id))]
    async fn get_session_with_messages(&self, id: Uuid) -> Result<SessionWithMessages, AppError> {
        let session = sqlx::query_as::<_, ConversationSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM conversation_sessions WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| normalize("fetch conversation session", e))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session not found")))?;

        let messages = self.list_messages(id).await?;

        Ok(SessionWithMessages { session, messages })
    }

    #[instrument(skip(self, content), fields(session_id = %session_id, role = role.as_str()))]
    async fn append_message(
        &self,
        session_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<ConversationMessage, AppError> {
        validate_message_content(content)?;

        let id = Uuid::new_v4();
        let message = sqlx::query_as::<_, ConversationMessage>(&format!(
            r#"
            INSERT INTO conversation_messages (id, session_id, role, content, order_index)
            SELECT $1, $2, $3, $4, COALESCE(MAX(order_index) + 1, 0)
            FROM conversation_messages
            WHERE session_id = $2
            RETURNING {MESSAGE_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(session_id)
        .bind(role.as_str())
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| normalize("add conversation message", e))?;

        Ok(message)
    }

    #[instrument(skip(self), fields(session_id = %session_id))]
    async fn list_messages(
        &self,
        session_id: Uuid,
    ) -> Result<Vec<ConversationMessage>, AppError> {
        sqlx::query_as::<_, ConversationMessage>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM conversation_messages
            WHERE session_id = $1
            ORDER BY order_index ASC
            "#,
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| normalize("fetch session messages", e))
    }

    #[instrument(skip(self), fields(session_id = %session_id))]
    async fn clear_messages(&self, session_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM conversation_messages WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| normalize("clear session messages", e))?;

        info!(
            session_id = %session_id,
            removed = result.rows_affected(),
            "Conversation messages cleared"
        );

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}

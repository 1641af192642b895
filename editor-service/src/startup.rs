use crate::config::{EditorConfig, ProviderKind};
use crate::handlers;
use crate::services::providers::mock::MockChatProvider;
use crate::services::providers::openai::{OpenAiConfig, OpenAiProvider};
use crate::services::providers::ChatProvider;
use crate::services::{Database, LocalStorage, PersistenceGateway, Storage};
use crate::state::{AssistantState, DocumentState};
use crate::upload::UploadPipeline;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use editor_core::error::AppError;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn PersistenceGateway>,
    pub provider: Arc<dyn ChatProvider>,
    pub storage: Arc<dyn Storage>,
    pub documents: Arc<DocumentState>,
    pub assistant: Arc<AssistantState>,
    pub uploads: Arc<UploadPipeline>,
}

impl AppState {
    /// Wire the application state from its backends. Constructed once
    /// at startup; no ambient globals.
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        provider: Arc<dyn ChatProvider>,
        storage: Arc<dyn Storage>,
        debounce: Duration,
        max_file_size: usize,
    ) -> Self {
        let documents = Arc::new(DocumentState::new(Arc::clone(&gateway), debounce));
        let assistant = Arc::new(AssistantState::new(
            Arc::clone(&gateway),
            Arc::clone(&provider),
        ));
        let uploads = Arc::new(UploadPipeline::new(Arc::clone(&storage), max_file_size));

        Self {
            gateway,
            provider,
            storage,
            documents,
            assistant,
            uploads,
        }
    }
}

/// Headroom on top of the configured file cap for multipart framing,
/// so an exactly-at-the-limit file still reaches the pipeline's own
/// size check instead of being cut off by the body limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.uploads.max_file_size() + MULTIPART_OVERHEAD);
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics))
        .route("/workspace", get(handlers::documents::workspace))
        .route(
            "/documents",
            get(handlers::documents::list_documents).post(handlers::documents::create_document),
        )
        .route(
            "/documents/:id",
            get(handlers::documents::get_document)
                .put(handlers::documents::update_document)
                .delete(handlers::documents::delete_document),
        )
        .route(
            "/documents/:id/autosave",
            post(handlers::documents::autosave_document),
        )
        .route(
            "/documents/upload",
            post(handlers::uploads::upload_document).layer(body_limit),
        )
        .route(
            "/assistant/suggestions",
            get(handlers::assistant::list_suggestions)
                .post(handlers::assistant::generate_suggestion),
        )
        .route(
            "/assistant/suggestions/:id/feedback",
            put(handlers::assistant::suggestion_feedback),
        )
        .route("/assistant/mode", post(handlers::assistant::set_mode))
        .route("/assistant/transcript", get(handlers::assistant::get_transcript))
        .route("/assistant/messages", post(handlers::assistant::ask))
        .route("/assistant/clear", post(handlers::assistant::clear))
        .route(
            "/assistant/alternatives",
            post(handlers::assistant::alternatives),
        )
        .route("/assistant/analyze", post(handlers::assistant::analyze))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: EditorConfig) -> Result<Self, AppError> {
        let database = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to Postgres: {}", e);
            e
        })?;
        database.run_migrations().await.map_err(|e| {
            tracing::error!("Failed to run migrations: {}", e);
            e
        })?;

        let provider: Arc<dyn ChatProvider> = match config.assistant.provider {
            ProviderKind::OpenAi => Arc::new(
                OpenAiProvider::new(OpenAiConfig {
                    api_key: config.assistant.api_key.clone(),
                    api_base: config.assistant.api_base.clone(),
                    model: config.assistant.model.clone(),
                })
                .map_err(AppError::from)?,
            ),
            ProviderKind::Mock => Arc::new(MockChatProvider::new(true)),
        };

        let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(&config.storage.local_path));

        let state = AppState::new(
            Arc::new(database),
            provider,
            storage,
            Duration::from_millis(config.autosave.debounce_ms),
            config.upload.max_file_size,
        );

        let app = router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use editor_service::services::memory::InMemoryGateway;
use editor_service::services::providers::mock::MockChatProvider;
use editor_service::services::providers::ChatProvider;
use editor_service::services::storage::InMemoryStorage;
use editor_service::services::{PersistenceGateway, Storage};
use editor_service::startup::{router, AppState};

pub const TEST_MAX_FILE_SIZE: usize = 1024;

pub struct TestApp {
    pub router: Router,
    pub gateway: Arc<InMemoryGateway>,
    pub provider: Arc<MockChatProvider>,
    pub storage: Arc<InMemoryStorage>,
}

/// App wired entirely to in-memory backends; no Postgres, no network.
pub fn spawn_app() -> TestApp {
    spawn_app_with_max_file_size(TEST_MAX_FILE_SIZE)
}

pub fn spawn_app_with_max_file_size(max_file_size: usize) -> TestApp {
    let gateway = Arc::new(InMemoryGateway::new());
    let provider = Arc::new(MockChatProvider::with_reply(true, "<p>Mock reply.</p>"));
    let storage = Arc::new(InMemoryStorage::new());

    let state = AppState::new(
        Arc::clone(&gateway) as Arc<dyn PersistenceGateway>,
        Arc::clone(&provider) as Arc<dyn ChatProvider>,
        Arc::clone(&storage) as Arc<dyn Storage>,
        Duration::from_millis(50),
        max_file_size,
    );

    TestApp {
        router: router(state),
        gateway,
        provider,
        storage,
    }
}

impl TestApp {
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        send(self.router.clone(), request).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(self.router.clone(), request).await
    }

    pub async fn put_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("PUT")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(self.router.clone(), request).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        send(self.router.clone(), request).await
    }

    pub async fn post_empty(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        send(self.router.clone(), request).await
    }

    /// Single-file multipart upload request.
    pub async fn upload(
        &self,
        file_name: &str,
        mime_type: &str,
        data: &[u8],
    ) -> (StatusCode, Value) {
        let boundary = "test-boundary-7MA4YWxkTrZu0gW";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        if mime_type.is_empty() {
            body.extend_from_slice(b"\r\n");
        } else {
            body.extend_from_slice(format!("Content-Type: {mime_type}\r\n\r\n").as_bytes());
        }
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/documents/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        send(self.router.clone(), request).await
    }

    /// Create a document through the API and return its id value.
    /// Resets the workspace first, since create is only valid when no
    /// document is loaded.
    pub async fn create_document(&self, title: &str, content: &str) -> Value {
        let (status, _) = self.get("/workspace").await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = self
            .post_json(
                "/documents",
                serde_json::json!({ "title": title, "content": content }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body
    }
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response: Response<_> = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).to_string(),
        ))
    };
    (status, body)
}

mod common;

use axum::http::StatusCode;

use common::{spawn_app, spawn_app_with_max_file_size, TEST_MAX_FILE_SIZE};

#[tokio::test]
async fn oversize_upload_is_rejected_without_a_storage_write() {
    let app = spawn_app();
    let data = vec![0u8; TEST_MAX_FILE_SIZE + 1];

    let (status, body) = app.upload("big.pdf", "application/pdf", &data).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("exceeds"));
    assert!(app.storage.is_empty());
}

// A body above axum's stock 2 MB limit must still reach the pipeline
// and fail with the pipeline's own size message, not a multipart read
// error.
#[tokio::test]
async fn upload_above_two_megabytes_reaches_the_size_check() {
    let limit = 2 * 1024 * 1024 + 512 * 1024;
    let app = spawn_app_with_max_file_size(limit);
    let data = vec![0u8; 3 * 1024 * 1024];

    let (status, body) = app.upload("big.pdf", "application/pdf", &data).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"].as_str().unwrap().contains("exceeds"),
        "unexpected error: {body}"
    );
    assert!(app.storage.is_empty());
}

#[tokio::test]
async fn unsupported_file_type_is_rejected() {
    let app = spawn_app();

    let (status, body) = app.upload("notes.txt", "text/plain", b"plain text").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unsupported file type: text/plain");
    assert!(app.storage.is_empty());
}

#[tokio::test]
async fn missing_file_type_is_rejected() {
    let app = spawn_app();

    let (status, body) = app.upload("mystery", "", b"????").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "File type not detected");
    assert!(app.storage.is_empty());
}

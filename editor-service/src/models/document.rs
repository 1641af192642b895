//! Document model for editor-service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A titled piece of markup content.
///
/// `content` is an opaque HTML string; the editor surface owns its
/// structure. `version` counts successful updates and carries no
/// optimistic-concurrency semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateDocument {
    pub title: String,
    pub content: String,
}

/// Partial document update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateDocument {
    pub title: Option<String>,
    pub content: Option<String>,
}

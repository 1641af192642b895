//! editor-core: shared infrastructure for the editor backend.

pub mod config;
pub mod error;
pub mod observability;

//! In-process application state.
//!
//! The document and assistant managers hold the mutable session state
//! behind std mutexes. Locks are never held across an await; each
//! operation reads what it needs, runs its async work, then re-locks to
//! publish the outcome. Concurrent operations therefore resolve
//! last-write-wins.

pub mod assistant;
pub mod autosave;
pub mod documents;

pub use assistant::{AssistantSnapshot, AssistantState};
pub use autosave::SaveScheduler;
pub use documents::{DocumentSnapshot, DocumentState};

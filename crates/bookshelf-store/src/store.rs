// ABOUTME: The StoryStore trait that the HTTP layer depends on, plus its error type.
// ABOUTME: Implementations own id and timestamp assignment and the newest-first ordering.

use async_trait::async_trait;
use bookshelf_core::{Story, StoryDraft, ValidationError};
use thiserror::Error;

/// Errors raised by a story store. None of these are shown to HTTP callers.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid story: {0}")]
    Invalid(#[from] ValidationError),

    #[error("corrupt story row: {0}")]
    Corrupt(String),

    #[error("story store is closed")]
    Closed,

    #[error("story store lock poisoned")]
    Poisoned,

    #[error("blocking store task failed: {0}")]
    Task(String),
}

/// Durable collection of stories. Stories are created once and never
/// updated or deleted through this contract.
#[async_trait]
pub trait StoryStore: Send + Sync {
    /// All stories, newest `created_at` first. Stories sharing a timestamp
    /// come back in reverse insertion order.
    async fn list(&self) -> Result<Vec<Story>, PersistenceError>;

    /// Persist a new story in one atomic write, assigning `id` and `created_at`.
    /// Drafts that fail `StoryDraft::validate` are refused with `PersistenceError::Invalid`.
    async fn create(&self, draft: StoryDraft) -> Result<Story, PersistenceError>;

    /// End the store's lifecycle. Later calls fail with `PersistenceError::Closed`.
    async fn close(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}

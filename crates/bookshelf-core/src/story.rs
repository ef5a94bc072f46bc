// ABOUTME: Defines the Story record and the StoryDraft request used to create one.
// ABOUTME: Validation of drafts lives here so the API and the store agree on what is acceptable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ulid::Ulid;

/// Reasons a draft is refused before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("content must not be empty")]
    EmptyContent,

    #[error("imageUrl must be an http(s) URL or a path starting with '/'")]
    InvalidImageUrl,
}

/// A user-authored post. Content is plain text and stored verbatim;
/// consumers escape it when rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: Ulid,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Story {
    /// Build a story from a draft, generating a fresh ULID. The caller owns
    /// the creation timestamp so that ordering can be enforced by the store.
    pub fn from_draft(draft: StoryDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Ulid::new(),
            title: draft.title,
            content: draft.content,
            image_url: draft.image_url,
            created_at,
        }
    }
}

/// Request body for creating a story. `title` and `content` are required;
/// `imageUrl` may be omitted or null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDraft {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl StoryDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            image_url: None,
        }
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Check the draft without modifying it. Whitespace-only title or
    /// content counts as empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.content.trim().is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        if let Some(url) = &self.image_url {
            if !is_acceptable_image_url(url) {
                return Err(ValidationError::InvalidImageUrl);
            }
        }
        Ok(())
    }
}

fn is_acceptable_image_url(url: &str) -> bool {
    if url.trim() != url || url.chars().any(char::is_whitespace) {
        return false;
    }
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host_and_path) => !host_and_path.is_empty(),
        // Root-relative paths, but not protocol-relative ones.
        None => url.starts_with('/') && !url.starts_with("//") && url.len() > 1,
    }
}

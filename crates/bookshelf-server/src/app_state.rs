// ABOUTME: Shared application state for the bookshelf HTTP server.
// ABOUTME: Holds the injected story and image stores; handlers keep no state of their own.

use std::sync::Arc;

use bookshelf_store::{ImageStore, StoryStore};

use crate::config::DEFAULT_MAX_UPLOAD_BYTES;

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    pub stories: Arc<dyn StoryStore>,
    pub images: Arc<dyn ImageStore>,
    /// Prepended to `/uploads/<key>` when building image URLs. Empty yields
    /// root-relative URLs.
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create state around already-opened stores, with relative upload URLs
    /// and the default upload limit.
    pub fn new(stories: Arc<dyn StoryStore>, images: Arc<dyn ImageStore>) -> Self {
        Self {
            stories,
            images,
            public_base_url: String::new(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_upload_bytes(mut self, max: usize) -> Self {
        self.max_upload_bytes = max;
        self
    }

    /// Public URL under which an uploaded image is served.
    pub fn image_url(&self, key: &str) -> String {
        format!("{}/uploads/{}", self.public_base_url, key)
    }
}

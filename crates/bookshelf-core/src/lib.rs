// ABOUTME: Core library for bookshelf, containing the Story domain types.
// ABOUTME: This crate defines the shared data model used by the store and the HTTP server.

pub mod story;

pub use story::{Story, StoryDraft, ValidationError};

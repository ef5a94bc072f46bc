// ABOUTME: Persistence layer for bookshelf, owning story records and uploaded cover images.
// ABOUTME: Provides the StoryStore contract, its SQLite implementation, and a filesystem image store.

pub mod images;
pub mod sqlite;
pub mod store;

pub use images::{ImageError, ImageStore, LocalImageStore, StoredImage};
pub use sqlite::SqliteStoryStore;
pub use store::{PersistenceError, StoryStore};

// ABOUTME: HTTP server for bookshelf, exposing the story API and cover image uploads.
// ABOUTME: Uses Axum with an injected story store and image store shared across handlers.

pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod routes;

pub use app_state::{AppState, SharedState};
pub use config::{BookshelfConfig, ConfigError};
pub use error::{ApiError, ErrorBody};
pub use routes::create_router;

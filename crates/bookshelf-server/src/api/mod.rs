// ABOUTME: API module containing the HTTP handler functions for the bookshelf REST API.
// ABOUTME: Split into story listing/creation and cover image uploads.

pub mod stories;
pub mod uploads;

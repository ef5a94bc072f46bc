// ABOUTME: Story API handlers for listing and creating stories at /api/stories.
// ABOUTME: Each request maps to exactly one store call; failures become ApiError responses.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{Method, StatusCode};
use bookshelf_core::{Story, StoryDraft};

use crate::app_state::SharedState;
use crate::error::ApiError;

/// GET /api/stories - All stories, newest first.
pub async fn list_stories(State(state): State<SharedState>) -> Result<Json<Vec<Story>>, ApiError> {
    let stories = state.stories.list().await.map_err(ApiError::FetchStories)?;
    Ok(Json(stories))
}

/// POST /api/stories - Create a story from `{title, content, imageUrl?}`.
pub async fn create_story(
    State(state): State<SharedState>,
    payload: Result<Json<StoryDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Story>), ApiError> {
    let Json(draft) = payload.map_err(from_json_rejection)?;
    draft.validate()?;

    let story = state
        .stories
        .create(draft)
        .await
        .map_err(ApiError::CreateStory)?;

    tracing::info!(story_id = %story.id, "story created");
    Ok((StatusCode::CREATED, Json(story)))
}

/// Any other method on /api/stories.
pub async fn reject_method(method: Method) -> ApiError {
    ApiError::MethodNotAllowed {
        method,
        allow: "GET, POST",
    }
}

fn from_json_rejection(rejection: JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(rejection.body_text())
    } else {
        ApiError::BadRequest(rejection.body_text())
    }
}

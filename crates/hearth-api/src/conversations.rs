use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use hearth_types::api::{DeleteMessagesRequest, DeletedResponse, SendMessageRequest};
use hearth_types::models::Actor;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

/// Returns the sender's copy of the conversation.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = blocking(&state, move |engine, deadline| {
        engine.send_message(&actor.username, &req.to, &req.content, deadline)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

pub async fn previews(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let previews = blocking(&state, move |engine, deadline| {
        engine.list_previews(&actor.username, deadline)
    })
    .await?;
    Ok(Json(previews))
}

/// Opening a conversation marks it read for the caller.
pub async fn open(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = blocking(&state, move |engine, deadline| {
        engine.find_conversation(&actor.username, &username, deadline)
    })
    .await?;
    Ok(Json(conversation))
}

pub async fn delete_messages(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<DeleteMessagesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = blocking(&state, move |engine, deadline| {
        engine.delete_messages(&actor.username, &req.ids, deadline)
    })
    .await?;
    Ok(Json(DeletedResponse { deleted }))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |engine, deadline| {
        engine.delete_conversation(&actor.username, id, deadline)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

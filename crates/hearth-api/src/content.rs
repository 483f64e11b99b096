//! Stories, comments, replies, reactions, reports and the read-later list.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use hearth_types::api::{CreateCommentRequest, CreateStoryRequest, ReactRequest, ReportRequest};
use hearth_types::models::{Actor, FlagTarget, ReactableKind, Reaction};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

fn reactable_kind(segment: &str) -> Result<ReactableKind, ApiError> {
    segment.parse().map_err(ApiError::BadRequest)
}

pub async fn create_story(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateStoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let story = blocking(&state, move |engine, deadline| {
        engine.create_story(&actor, &req.title, &req.content, deadline)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(story)))
}

pub async fn get_story(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let story = blocking(&state, move |engine, deadline| engine.story(id, deadline)).await?;
    Ok(Json(story))
}

pub async fn update_story(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateStoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let story = blocking(&state, move |engine, deadline| {
        engine.update_story(id, &actor.username, &req.title, &req.content, deadline)
    })
    .await?;
    Ok(Json(story))
}

pub async fn delete_story(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |engine, deadline| {
        engine.delete_story(id, &actor.username, deadline)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let comments =
        blocking(&state, move |engine, deadline| engine.comments_for(story_id, deadline)).await?;
    Ok(Json(comments))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = blocking(&state, move |engine, deadline| {
        engine.create_comment(&actor, story_id, &req.content, deadline)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = blocking(&state, move |engine, deadline| {
        engine.update_comment(id, &actor.username, &req.content, deadline)
    })
    .await?;
    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |engine, deadline| {
        engine.delete_comment(id, &actor.username, deadline)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_replies(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let replies =
        blocking(&state, move |engine, deadline| engine.replies_for(comment_id, deadline)).await?;
    Ok(Json(replies))
}

pub async fn create_reply(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reply = blocking(&state, move |engine, deadline| {
        engine.create_reply(&actor, comment_id, &req.content, deadline)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

pub async fn update_reply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reply = blocking(&state, move |engine, deadline| {
        engine.update_reply(id, &actor.username, &req.content, deadline)
    })
    .await?;
    Ok(Json(reply))
}

pub async fn delete_reply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |engine, deadline| {
        engine.delete_reply(id, &actor.username, deadline)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_reactions(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = reactable_kind(&kind)?;
    let view = blocking(&state, move |engine, deadline| engine.reactable(kind, id, deadline)).await?;
    Ok(Json(view))
}

pub async fn react(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<ReactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = reactable_kind(&kind)?;
    let tally = blocking(&state, move |engine, deadline| match req.reaction {
        Reaction::Like => engine.like(kind, id, &actor.username, deadline),
        Reaction::Dislike => engine.dislike(kind, id, &actor.username, deadline),
    })
    .await?;
    Ok(Json(tally))
}

pub async fn report(
    State(state): State<AppState>,
    Path((kind, target)): Path<(String, String)>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<ReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = match kind.as_str() {
        "user" | "users" => "user",
        other => reactable_kind(other)?.as_str(),
    };
    let target = FlagTarget::from_parts(kind, &target)
        .ok_or_else(|| ApiError::BadRequest(format!("malformed {kind} id")))?;

    let flag = blocking(&state, move |engine, deadline| {
        engine.report(&actor, target, &req.reason, deadline)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(flag)))
}

pub async fn saved_stories(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let saved = blocking(&state, move |engine, deadline| {
        engine.saved_stories(&actor.username, deadline)
    })
    .await?;
    Ok(Json(saved))
}

pub async fn save_story(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let saved = blocking(&state, move |engine, deadline| {
        engine.save_story(&actor.username, story_id, deadline)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn unsave_story(
    State(state): State<AppState>,
    Path(story_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |engine, deadline| {
        engine.unsave_story(&actor.username, story_id, deadline)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use hearth_types::models::Actor;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

pub async fn edges(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let edges =
        blocking(&state, move |engine, deadline| engine.user_edges(&username, deadline)).await?;
    Ok(Json(edges))
}

pub async fn follow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |engine, deadline| {
        engine.follow(&actor.username, &username, deadline)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unfollow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |engine, deadline| {
        engine.unfollow(&actor.username, &username, deadline)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn block(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |engine, deadline| engine.block(&actor, &username, deadline)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unblock(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |engine, deadline| engine.unblock(&actor, &username, deadline)).await?;
    Ok(StatusCode::NO_CONTENT)
}

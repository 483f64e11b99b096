pub mod auth;
pub mod content;
pub mod conversations;
pub mod error;
pub mod middleware;
pub mod users;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};

use hearth_engine::{Deadline, Engine};

use crate::auth::AppState;
use crate::error::ApiError;

/// All routes. Everything outside `/auth` requires a bearer token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/stories", post(content::create_story))
        .route(
            "/stories/{id}",
            get(content::get_story)
                .put(content::update_story)
                .delete(content::delete_story),
        )
        .route(
            "/stories/{id}/comments",
            get(content::list_comments).post(content::create_comment),
        )
        .route(
            "/comments/{id}",
            put(content::update_comment).delete(content::delete_comment),
        )
        .route(
            "/comments/{id}/replies",
            get(content::list_replies).post(content::create_reply),
        )
        .route(
            "/replies/{id}",
            put(content::update_reply).delete(content::delete_reply),
        )
        .route(
            "/reactions/{kind}/{id}",
            get(content::get_reactions).post(content::react),
        )
        .route("/reports/{kind}/{target}", post(content::report))
        .route("/read-later", get(content::saved_stories))
        .route(
            "/read-later/{story_id}",
            post(content::save_story).delete(content::unsave_story),
        )
        .route("/users/{username}/edges", get(users::edges))
        .route(
            "/users/{username}/follow",
            post(users::follow).delete(users::unfollow),
        )
        .route(
            "/users/{username}/block",
            post(users::block).delete(users::unblock),
        )
        .route(
            "/messages",
            post(conversations::send_message).delete(conversations::delete_messages),
        )
        .route("/conversations", get(conversations::previews))
        .route("/conversations/with/{username}", get(conversations::open))
        .route("/conversations/{id}", delete(conversations::delete))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Run an engine operation off the async runtime with the request deadline.
pub(crate) async fn blocking<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&Engine, Deadline) -> hearth_engine::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let engine = state.engine.clone();
    let deadline = Deadline::after(state.request_timeout);
    let result = tokio::task::spawn_blocking(move || op(&engine, deadline)).await?;
    Ok(result?)
}

pub mod auth;
pub mod error;
pub mod middleware;
pub mod notes;
pub mod password;
pub mod token;
pub mod users;

mod convert;
mod validate;

use std::sync::Arc;

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use serde_json::{Value, json};

use inkpad_db::Store;

use crate::error::ApiError;
use crate::password::Hasher;
use crate::token::TokenIssuer;

pub type AppState = Arc<AppStateInner>;

/// Collaborators shared by every handler, built once at startup.
pub struct AppStateInner {
    pub store: Arc<dyn Store>,
    pub hasher: Hasher,
    pub tokens: TokenIssuer,
}

/// Assemble the HTTP surface. Note and user routes sit behind the auth gate;
/// registration, login and the health probe do not.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/notes/{id}",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/users/me/password", put(users::change_password))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Run store and hashing work off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state)).await?
}

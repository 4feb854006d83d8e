use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
};
use tracing::{info, warn};

use inkpad_db::Store;
use inkpad_types::api::{ChangePasswordRequest, MessageResponse, UpdateUserRequest};
use inkpad_types::models::User;

use crate::error::{ApiError, INVALID_OLD_PASSWORD, USER_NOT_FOUND};
use crate::middleware::AuthUser;
use crate::password::Hasher;
use crate::{AppState, convert, run_blocking, validate};

/// Callers may only act on their own profile.
pub fn authorize_ownership(authenticated_id: i64, requested_id: i64) -> bool {
    authenticated_id == requested_id
}

/// Resolve a `/users/{id}` path segment for `caller`. Unparseable ids and
/// other people's ids both come back as "user not found" so the response
/// never confirms that an id exists.
fn owned_user_id(caller: AuthUser, raw_id: &str) -> Result<i64, ApiError> {
    raw_id
        .parse::<i64>()
        .ok()
        .filter(|id| authorize_ownership(caller.id, *id))
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))
}

pub fn get_profile(store: &dyn Store, caller: AuthUser, raw_id: &str) -> Result<User, ApiError> {
    let id = owned_user_id(caller, raw_id)?;
    let row = store
        .find_user_by_id(id)?
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;
    Ok(convert::user(row))
}

pub fn update_profile(
    store: &dyn Store,
    caller: AuthUser,
    raw_id: &str,
    req: &UpdateUserRequest,
) -> Result<User, ApiError> {
    let id = owned_user_id(caller, raw_id)?;

    if let Some(username) = &req.username {
        validate::username(username)?;
    }
    if let Some(email) = &req.email {
        validate::email(email)?;
    }

    let row = store
        .update_user_profile(id, req.username.as_deref(), req.email.as_deref())?
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;

    info!(user_id = id, "Updated profile");
    Ok(convert::user(row))
}

pub fn delete_account(store: &dyn Store, caller: AuthUser, raw_id: &str) -> Result<(), ApiError> {
    let id = owned_user_id(caller, raw_id)?;
    if !store.delete_user(id)? {
        return Err(ApiError::NotFound(USER_NOT_FOUND));
    }

    info!(user_id = id, "Deleted account");
    Ok(())
}

/// Outstanding tokens stay valid after a password change; they expire on
/// their own schedule.
pub fn change_user_password(
    store: &dyn Store,
    hasher: &Hasher,
    caller: AuthUser,
    req: &ChangePasswordRequest,
) -> Result<(), ApiError> {
    let user = store
        .find_user_by_id(caller.id)?
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;

    if !hasher.verify(&req.old_password, &user.password)? {
        warn!(user_id = user.id, "Password change rejected: wrong old password");
        return Err(ApiError::Auth(INVALID_OLD_PASSWORD));
    }

    validate::password(&req.new_password)?;

    let password_hash = hasher.hash(&req.new_password)?;
    if !store.update_user_password(user.id, &password_hash)? {
        return Err(ApiError::NotFound(USER_NOT_FOUND));
    }

    info!(user_id = user.id, "Password changed");
    Ok(())
}

// -- Handlers --

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(caller): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_blocking(&state, move |s| get_profile(s.store.as_ref(), caller, &id)).await?;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(caller): Extension<AuthUser>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    // Ownership is settled before the body is looked at.
    owned_user_id(caller, &id)?;
    let Json(req) = body?;

    let user = run_blocking(&state, move |s| {
        update_profile(s.store.as_ref(), caller, &id, &req)
    })
    .await?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(caller): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    run_blocking(&state, move |s| delete_account(s.store.as_ref(), caller, &id)).await?;
    Ok(Json(MessageResponse::new("user deleted")))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;

    run_blocking(&state, move |s| {
        change_user_password(s.store.as_ref(), &s.hasher, caller, &req)
    })
    .await?;
    Ok(Json(MessageResponse::new("password changed")))
}

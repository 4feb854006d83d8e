use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use inkpad_db::Store;
use inkpad_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use inkpad_types::models::User;

use crate::error::{ALREADY_TAKEN, ApiError, INVALID_CREDENTIALS};
use crate::password::Hasher;
use crate::token::TokenIssuer;
use crate::{AppState, convert, run_blocking, validate};

/// Create an account.
///
/// The uniqueness pre-check only saves a hashing round for obvious
/// duplicates. The store's unique constraints are what actually hold when
/// two registrations race, and they surface as the same conflict.
pub fn register_user(
    store: &dyn Store,
    hasher: &Hasher,
    req: &RegisterRequest,
) -> Result<User, ApiError> {
    if store.user_exists(&req.username, &req.email)? {
        warn!("Registration rejected: username or email already taken");
        return Err(ApiError::Conflict(ALREADY_TAKEN));
    }

    validate::username(&req.username)?;
    validate::email(&req.email)?;
    validate::password(&req.password)?;

    let password_hash = hasher.hash(&req.password)?;
    let row = store.create_user(&req.username, &req.email, &password_hash)?;

    info!(user_id = row.id, "Registered user {}", row.username);
    Ok(convert::user(row))
}

/// Exchange credentials for a session token. An unknown identifier and a
/// wrong password produce the same error.
pub fn login_user(
    store: &dyn Store,
    hasher: &Hasher,
    tokens: &TokenIssuer,
    req: &LoginRequest,
    now: DateTime<Utc>,
) -> Result<String, ApiError> {
    validate::required("identifier", &req.identifier)?;
    validate::password(&req.password)?;

    let Some(user) = store.find_user_by_login(&req.identifier)? else {
        warn!("Login failed: unknown identifier");
        return Err(ApiError::Auth(INVALID_CREDENTIALS));
    };

    if !hasher.verify(&req.password, &user.password)? {
        warn!(user_id = user.id, "Login failed: wrong password");
        return Err(ApiError::Auth(INVALID_CREDENTIALS));
    }

    let token = tokens.issue(user.id, now)?;
    info!(user_id = user.id, "User logged in");
    Ok(token)
}

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;

    let user = run_blocking(&state, move |s| {
        register_user(s.store.as_ref(), &s.hasher, &req)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "user registered".to_string(),
            user,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;

    let token = run_blocking(&state, move |s| {
        login_user(s.store.as_ref(), &s.hasher, &s.tokens, &req, Utc::now())
    })
    .await?;

    Ok(Json(LoginResponse { token }))
}

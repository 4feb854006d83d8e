use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::AppState;
use crate::error::{ApiError, INVALID_TOKEN, TOKEN_REQUIRED};
use crate::token::TokenIssuer;

/// Identity attached to a request by [`require_auth`]. Only the gate
/// constructs it; handlers read it through `Extension<AuthUser>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
}

/// Resolve the bearer token in `headers` to an identity.
///
/// A missing header, a non-UTF-8 header or one without the `Bearer ` prefix
/// is rejected as "token required". Any verification failure is rejected as
/// "invalid token" without saying which check failed.
pub fn authenticate(
    headers: &HeaderMap,
    tokens: &TokenIssuer,
    now: DateTime<Utc>,
) -> Result<AuthUser, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Auth(TOKEN_REQUIRED))?;

    let id = tokens.verify(token, now).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        ApiError::Auth(INVALID_TOKEN)
    })?;

    Ok(AuthUser { id })
}

/// Extract and validate the JWT from the Authorization header.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(req.headers(), &state.tokens, Utc::now())?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

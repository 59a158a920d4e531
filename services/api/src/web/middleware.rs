//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::web::auth::decode_token;
use crate::web::state::AppState;

/// Middleware that validates the bearer token and extracts the user id.
///
/// If valid, inserts the user id into request extensions for handlers to use.
/// If invalid, missing, expired, or naming an inactive user, returns 401.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract the Authorization header.
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Strip the bearer scheme.
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 3. Decode and validate the token.
    let user_id = decode_token(token, &state.config.secret).map_err(|e| {
        debug!("Rejected bearer token: {:?}", e);
        StatusCode::UNAUTHORIZED
    })?;

    // 4. The user must still exist and be active.
    let user = state
        .db
        .get_user_by_id(user_id)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    if !user.is_active {
        return Err(StatusCode::UNAUTHORIZED);
    }

    // 5. Insert the user id into request extensions and continue.
    req.extensions_mut().insert(user_id);
    Ok(next.run(req).await)
}

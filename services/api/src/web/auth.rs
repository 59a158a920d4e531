//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user registration and JWT login, plus the
//! token helpers used by the bearer middleware.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;
use course_summary_core::ports::PortError;

/// Bearer tokens are valid for one hour.
const TOKEN_LIFETIME_SECS: i64 = 3600;

//=========================================================================================
// JWT Claims and Helpers
//=========================================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated user's id.
    pub sub: Uuid,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

/// Signs a one-hour bearer token for the given user.
pub fn issue_token(user_id: Uuid, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id,
        exp: Utc::now().timestamp() + TOKEN_LIFETIME_SECS,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decodes and validates a bearer token, returning the user id it names.
pub fn decode_token(token: &str, secret: &str) -> Result<Uuid, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims.sub)
}

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserOut {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_superuser: bool,
}

#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Password rules carried over from the original user manager: at least
/// three characters, and the password must not contain the e-mail address.
fn validate_password(password: &str, email: &str) -> Result<(), String> {
    if password.len() < 3 {
        return Err("Password should be at least 3 characters".to_string());
    }
    if password.contains(email) {
        return Err("Password should not contain e-mail".to_string());
    }
    Ok(())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserOut),
        (status = 400, description = "Invalid password or email already registered"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    validate_password(&req.password, &req.email).map_err(|reason| (StatusCode::BAD_REQUEST, reason))?;

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to hash password".to_string(),
            )
        })?
        .to_string();

    let user = state
        .db
        .create_user(&req.email, &password_hash)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => (
                StatusCode::BAD_REQUEST,
                "A user with this email already exists".to_string(),
            ),
            other => {
                error!("Failed to create user: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create user".to_string(),
                )
            }
        })?;

    let response = UserOut {
        id: user.id,
        email: user.email,
        is_active: user.is_active,
        is_verified: user.is_verified,
        is_superuser: user.is_superuser,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /auth/jwt/login - Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/auth/jwt/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let bad_credentials = || (StatusCode::BAD_REQUEST, "Invalid email or password".to_string());

    let creds = state
        .db
        .get_user_by_email(&req.email)
        .await
        .map_err(|_| bad_credentials())?;

    let parsed_hash = PasswordHash::new(&creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Authentication error".to_string(),
        )
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();
    if !valid || !creds.is_active {
        return Err(bad_credentials());
    }

    let access_token = issue_token(creds.id, &state.config.secret).map_err(|e| {
        error!("Failed to sign token: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to issue token".to_string(),
        )
    })?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_the_user_id() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, "test-secret").unwrap();
        assert_eq!(decode_token(&token, "test-secret").unwrap(), user_id);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = issue_token(Uuid::new_v4(), "test-secret").unwrap();
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            exp: Utc::now().timestamp() - 120,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(decode_token(&token, "test-secret").is_err());
    }

    #[test]
    fn password_rules_match_the_user_manager() {
        assert!(validate_password("ab", "a@b.com").is_err());
        assert!(validate_password("longenough-a@b.com-x", "a@b.com").is_err());
        assert!(validate_password("hunter2", "a@b.com").is_ok());
    }
}

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{error, info};
use uuid::Uuid;

use lodge_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::session::create_token;
use crate::state::{AppState, with_db};

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_username(&req.username)?;
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            ApiError::Internal("Internal server error")
        })?
        .to_string();

    let user_id = Uuid::new_v4();
    let username = req.username.clone();
    with_db(&state, move |db| {
        db.create_user(&user_id.to_string(), &username, &password_hash)
    })
    .await
    .map_err(|e| match e {
        ApiError::Conflict(_) => ApiError::Conflict("username is already taken".into()),
        e => e,
    })?;

    let token = issue(&state, user_id, &req.username)?;
    info!("User {} registered as {}", user_id, req.username);

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.clone();
    let user = with_db(&state, move |db| db.get_user_by_username(&username))
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password).map_err(|e| {
        error!("Stored password hash for {} is unreadable: {}", user.id, e);
        ApiError::Internal("Internal server error")
    })?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::InvalidCredentials)?;

    let user_id: Uuid = user.id.parse().map_err(|e| {
        error!("Corrupt user id '{}': {}", user.id, e);
        ApiError::Internal("Internal server error")
    })?;

    let token = issue(&state, user_id, &user.username)?;

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        token,
    }))
}

fn validate_username(username: &str) -> Result<(), ApiError> {
    if !(3..=32).contains(&username.chars().count()) {
        return Err(ApiError::Validation(
            "username must be 3 to 32 characters".into(),
        ));
    }
    Ok(())
}

fn issue(state: &AppState, user_id: Uuid, username: &str) -> Result<String, ApiError> {
    create_token(&state.jwt_secret, state.token_ttl, user_id, username).map_err(|e| {
        error!("Token signing failed: {}", e);
        ApiError::Internal("Internal server error")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_length_counts_characters() {
        assert!(validate_username(&"é".repeat(17)).is_ok());
        assert!(validate_username(&"é".repeat(32)).is_ok());
        assert!(validate_username(&"é".repeat(33)).is_err());
        assert!(validate_username("ab").is_err());
    }
}

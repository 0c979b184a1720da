use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::warn;

use thrift_db::Database;
use thrift_types::api::{LoginRequest, RegisterRequest, RegisterResponse, StatusMessage};

use crate::error::ApiError;
use crate::session::{SESSION_COOKIE, SessionStore};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionStore,
    pub allowed_email_domain: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.first_name.is_empty()
        || req.last_name.is_empty()
        || req.email.is_empty()
        || req.password.is_empty()
    {
        return Err(ApiError::validation("Missing fields"));
    }

    if !req.email.ends_with(&state.allowed_email_domain) {
        return Err(ApiError::Validation(format!(
            "Invalid email domain. Please use your {} email.",
            state.allowed_email_domain
        )));
    }

    let password_hash = hash_password(&req.password)?;

    let user_id = state
        .db
        .create_user(
            &req.email,
            &req.first_name,
            &req.last_name,
            &password_hash,
            None,
            None,
        )
        .map_err(|e| {
            // duplicate email and store failures are masked identically here
            warn!("registration failed for {}: {:#}", req.email, e);
            ApiError::validation("User already exists or other database error.")
        })?;

    Ok(Json(RegisterResponse {
        status: "success".into(),
        message: "Registration successful.".into(),
        user_id,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let user = state.db.get_user(&req.email).map_err(ApiError::Internal)?;
    let verified = match &user {
        Some(user) => verify_password(&req.password, &user.password_hash),
        None => false,
    };

    if !verified {
        // a failed login leaves the caller anonymous
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            state
                .sessions
                .remove(cookie.value())
                .map_err(ApiError::Internal)?;
        }
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let token = state
        .sessions
        .create(&req.email)
        .map_err(ApiError::Internal)?;
    let jar = jar.add(session_cookie(token));

    Ok((jar, Json(StatusMessage::success("Logged in"))))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state
            .sessions
            .remove(cookie.value())
            .map_err(ApiError::Internal)?;
    }
    let jar = jar.remove(session_cookie(String::new()));

    Ok((jar, Json(StatusMessage::success("Logged out"))))
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .build()
}

pub(crate) fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Argon2 verification is constant-time with respect to the submitted
/// password.
pub(crate) fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("hunter2!").unwrap();
        assert_ne!(hash, "hunter2!");
        assert!(verify_password("hunter2!", &hash));
        assert!(!verify_password("hunter3!", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same-password", &a));
        assert!(verify_password("same-password", &b));
    }
}

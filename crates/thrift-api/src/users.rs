use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;

use thrift_db::ConstraintViolation;
use thrift_db::models::UserRow;
use thrift_types::api::{
    CreateUserRequest, MessageBody, UpdateUserRequest, UserCreated, UserResponse,
};

use crate::auth::{AppState, hash_password};
use crate::error::ApiError;
use crate::run_blocking;

/// Profile projection for JSON responses. The password hash stays out of
/// every serialized shape.
pub(crate) fn user_response(row: UserRow) -> UserResponse {
    UserResponse {
        email: row.email,
        first_name: row.first_name,
        last_name: row.last_name,
        bio: row.bio,
        profile_picture: row.profile_picture.map(|bytes| B64.encode(bytes)),
    }
}

pub(crate) fn decode_image(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<Vec<u8>>, ApiError> {
    match value {
        Some(encoded) => B64
            .decode(encoded.as_bytes())
            .map(Some)
            .map_err(|_| ApiError::Validation(format!("{} must be valid base64", field))),
        None => Ok(None),
    }
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let row = run_blocking(move || db.db.get_user(&email))
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(user_response(row)))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let CreateUserRequest {
        first_name,
        last_name,
        email,
        password,
        bio,
        profile_picture,
    } = req;

    if first_name.is_empty() || last_name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ApiError::validation(
            "Missing required data in the request body",
        ));
    }

    let picture = decode_image("profile_picture", profile_picture)?;
    let password_hash = hash_password(&password)?;

    let db = state.clone();
    let user_id = run_blocking(move || {
        db.db.create_user(
            &email,
            &first_name,
            &last_name,
            &password_hash,
            bio.as_deref(),
            picture.as_deref(),
        )
    })
    .await
    .map_err(|e| {
        if e.downcast_ref::<ConstraintViolation>().is_some() {
            ApiError::Conflict("User already exists".into())
        } else {
            ApiError::Internal(e)
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(UserCreated {
            message: "User created".into(),
            user_id,
        }),
    ))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.is_empty() {
        return Err(ApiError::validation("No data provided for update"));
    }

    let UpdateUserRequest {
        first_name,
        last_name,
        bio,
        password,
        profile_picture,
    } = req;

    let picture = decode_image("profile_picture", profile_picture)?;
    let password_hash = match password.as_deref() {
        Some(p) => Some(hash_password(p)?),
        None => None,
    };

    // existence is checked with a separate read; the update itself reports
    // success even when it matches zero rows
    let db = state.clone();
    let target = email.clone();
    if run_blocking(move || db.db.get_user(&target))
        .await
        .map_err(ApiError::Internal)?
        .is_none()
    {
        return Err(ApiError::NotFound("User"));
    }

    let db = state.clone();
    run_blocking(move || {
        db.db.update_user(
            &email,
            first_name.as_deref(),
            last_name.as_deref(),
            bio.as_deref(),
            password_hash.as_deref(),
            picture.as_deref(),
        )
    })
    .await
    .map_err(ApiError::Internal)?;

    Ok(Json(MessageBody::new("User updated")))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let target = email.clone();
    if run_blocking(move || db.db.get_user(&target))
        .await
        .map_err(ApiError::Internal)?
        .is_none()
    {
        return Err(ApiError::NotFound("User"));
    }

    let db = state.clone();
    run_blocking(move || db.db.delete_user(&email))
        .await
        .map_err(ApiError::Internal)?;

    Ok(StatusCode::NO_CONTENT)
}

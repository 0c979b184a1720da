//! Dashboard routes: multipart profile updates and listing creation for
//! the logged-in user, plus the profile fetch backing the dashboard page.

use axum::{
    Extension, Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
};

use thrift_types::api::{ListingCreated, StatusMessage};

use crate::auth::{AppState, hash_password};
use crate::error::ApiError;
use crate::listings::map_listing_constraint;
use crate::run_blocking;
use crate::session::SessionUser;
use crate::users::user_response;

pub async fn get_user_profile(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let email = user.email;
    let row = run_blocking(move || db.db.get_user(&email))
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(user_response(row)))
}

/// PUT /dashboard — update the session user's profile from a multipart
/// form. Text fields are optional; an attached `profile_picture` file
/// replaces the stored blob. Store failures surface to the caller.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut first_name = None;
    let mut last_name = None;
    let mut bio = None;
    let mut password = None;
    let mut picture: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "first_name" => first_name = non_empty(field.text().await.map_err(bad_multipart)?),
            "last_name" => last_name = non_empty(field.text().await.map_err(bad_multipart)?),
            "bio" => bio = non_empty(field.text().await.map_err(bad_multipart)?),
            "password" => password = non_empty(field.text().await.map_err(bad_multipart)?),
            "profile_picture" => {
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                if !bytes.is_empty() {
                    picture = Some(bytes.to_vec());
                }
            }
            _ => {}
        }
    }

    let password_hash = match password.as_deref() {
        Some(p) => Some(hash_password(p)?),
        None => None,
    };

    let db = state.clone();
    let email = user.email;
    let updated = run_blocking(move || {
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

    if updated == 0 {
        return Err(ApiError::NotFound("User"));
    }

    Ok(Json(StatusMessage::success("Profile updated successfully")))
}

/// POST /dashboard — create a listing owned by the session user from a
/// multipart form. The photo file is optional here.
pub async fn create_listing(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut quality = None;
    let mut description = None;
    let mut asking_price = None;
    let mut photo: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "quality" => quality = non_empty(field.text().await.map_err(bad_multipart)?),
            "description" => description = non_empty(field.text().await.map_err(bad_multipart)?),
            "asking_price" => asking_price = non_empty(field.text().await.map_err(bad_multipart)?),
            "photo" => {
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                if !bytes.is_empty() {
                    photo = Some(bytes.to_vec());
                }
            }
            _ => {}
        }
    }

    let (Some(quality), Some(description), Some(asking_price)) =
        (quality, description, asking_price)
    else {
        return Err(ApiError::validation(
            "Missing required data in the request body",
        ));
    };

    let asking_price: f64 = asking_price
        .trim()
        .parse()
        .map_err(|_| ApiError::validation("asking_price must be a number"))?;

    let db = state.clone();
    let email = user.email;
    let listing_id = run_blocking(move || {
        db.db
            .create_listing(&email, photo.as_deref(), &quality, &description, asking_price)
    })
    .await
    .map_err(map_listing_constraint)?;

    Ok((
        StatusCode::CREATED,
        Json(ListingCreated {
            message: "Listing created".into(),
            listing_id,
        }),
    ))
}

fn bad_multipart(err: MultipartError) -> ApiError {
    ApiError::Validation(format!("malformed multipart body: {}", err))
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

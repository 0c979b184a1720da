use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use tracing::error;

use thrift_db::ConstraintViolation;
use thrift_db::models::ListingRow;
use thrift_types::api::{
    CreateListingRequest, ListingCreated, ListingResponse, MessageBody, UpdateListingRequest,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::users::decode_image;
use crate::{parse_sqlite_datetime, run_blocking};

pub(crate) fn listing_response(row: ListingRow) -> ListingResponse {
    ListingResponse {
        email: row.email,
        photo: row.photo.map(|bytes| B64.encode(bytes)),
        quality: row.quality,
        description: row.description,
        asking_price: row.asking_price,
        listing_type: row.item_type,
        created_at: parse_sqlite_datetime(&row.created_at),
    }
}

/// Map a constraint failure on listing creation: the one-listing-per-user
/// key collides, or the owning user row is missing.
pub(crate) fn map_listing_constraint(e: anyhow::Error) -> ApiError {
    match e.downcast_ref::<ConstraintViolation>() {
        Some(v) if v.0.contains("FOREIGN KEY") => ApiError::validation("User does not exist"),
        Some(_) => ApiError::Conflict("Listing already exists for this user".into()),
        None => ApiError::Internal(e),
    }
}

/// Context for the shop page: every listing with its photo base64-encoded
/// for embedding. A store failure degrades to an empty shop.
pub async fn shop(State(state): State<AppState>) -> Json<Vec<ListingResponse>> {
    let db = state.clone();
    let rows = match run_blocking(move || db.db.all_listings()).await {
        Ok(rows) => rows,
        Err(e) => {
            error!("failed to query listings: {:#}", e);
            Vec::new()
        }
    };

    Json(rows.into_iter().map(listing_response).collect())
}

pub async fn get_listing(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let row = run_blocking(move || db.db.get_listing(&email))
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound("Listing"))?;

    Ok(Json(listing_response(row)))
}

pub async fn create_listing(
    State(state): State<AppState>,
    Json(req): Json<CreateListingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let CreateListingRequest {
        email,
        photo,
        quality,
        description,
        asking_price,
    } = req;

    // photo is required at this entry point, unlike the dashboard route
    if email.is_empty()
        || quality.is_empty()
        || description.is_empty()
        || asking_price.is_none()
        || photo.as_deref().is_none_or(str::is_empty)
    {
        return Err(ApiError::validation(
            "Missing required data in the request body",
        ));
    }
    let asking_price = asking_price.unwrap_or_default();
    let photo_bytes = decode_image("photo", photo)?;

    let db = state.clone();
    let listing_id = run_blocking(move || {
        db.db.create_listing(
            &email,
            photo_bytes.as_deref(),
            &quality,
            &description,
            asking_price,
        )
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

pub async fn update_listing(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(req): Json<UpdateListingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.is_empty() {
        return Err(ApiError::validation("No data provided for update"));
    }

    let UpdateListingRequest {
        photo,
        quality,
        description,
        asking_price,
        listing_type,
    } = req;

    let photo_bytes = decode_image("photo", photo)?;

    let db = state.clone();
    let target = email.clone();
    if run_blocking(move || db.db.get_listing(&target))
        .await
        .map_err(ApiError::Internal)?
        .is_none()
    {
        return Err(ApiError::NotFound("Listing"));
    }

    let db = state.clone();
    run_blocking(move || {
        db.db.update_listing(
            &email,
            photo_bytes.as_deref(),
            quality.as_deref(),
            description.as_deref(),
            asking_price,
            listing_type.as_deref(),
        )
    })
    .await
    .map_err(ApiError::Internal)?;

    Ok(Json(MessageBody::new("Listing updated")))
}

pub async fn delete_listing(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let target = email.clone();
    if run_blocking(move || db.db.get_listing(&target))
        .await
        .map_err(ApiError::Internal)?
        .is_none()
    {
        return Err(ApiError::NotFound("Listing"));
    }

    let db = state.clone();
    run_blocking(move || db.db.delete_listing(&email))
        .await
        .map_err(ApiError::Internal)?;

    Ok(StatusCode::NO_CONTENT)
}

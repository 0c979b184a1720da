use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use thrift_db::ConstraintViolation;
use thrift_db::models::MessageRow;
use thrift_types::api::{
    CreateMessageRequest, MessageBody, MessageCreated, MessageResponse, UpdateMessageRequest,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::parse_sqlite_datetime;

fn message_response(row: MessageRow) -> MessageResponse {
    MessageResponse {
        message_id: row.id,
        sender_id: row.sender_id,
        receiver_id: row.receiver_id,
        message_text: row.body,
        timestamp: parse_sqlite_datetime(&row.created_at),
    }
}

pub async fn get_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_message(message_id)
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound("Message"))?;

    Ok(Json(message_response(row)))
}

pub async fn create_message(
    State(state): State<AppState>,
    Json(req): Json<CreateMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.sender_id.is_empty() || req.receiver_id.is_empty() || req.message_text.is_empty() {
        return Err(ApiError::validation(
            "Missing required data in the request body",
        ));
    }

    let message_id = state
        .db
        .create_message(&req.sender_id, &req.receiver_id, &req.message_text)
        .map_err(|e| {
            if e.downcast_ref::<ConstraintViolation>().is_some() {
                ApiError::validation("Sender or receiver does not exist")
            } else {
                ApiError::Internal(e)
            }
        })?;

    Ok((
        StatusCode::CREATED,
        Json(MessageCreated {
            message: "Message created".into(),
            message_id,
        }),
    ))
}

pub async fn update_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
    Json(req): Json<UpdateMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.message_text.is_empty() {
        return Err(ApiError::validation("No data provided for update"));
    }

    if state
        .db
        .get_message(message_id)
        .map_err(ApiError::Internal)?
        .is_none()
    {
        return Err(ApiError::NotFound("Message"));
    }

    state
        .db
        .update_message(message_id, &req.message_text)
        .map_err(ApiError::Internal)?;

    Ok(Json(MessageBody::new("Message updated")))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if state
        .db
        .get_message(message_id)
        .map_err(ApiError::Internal)?
        .is_none()
    {
        return Err(ApiError::NotFound("Message"));
    }

    state
        .db
        .delete_message(message_id)
        .map_err(ApiError::Internal)?;

    Ok(StatusCode::NO_CONTENT)
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -- Envelopes --

/// `{status, message}` body used by the auth routes and every error path.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusMessage {
    pub status: String,
    pub message: String,
}

impl StatusMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".into(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            message: message.into(),
        }
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub status: String,
    pub message: String,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub bio: Option<String>,
    /// Base64-encoded image bytes.
    pub profile_picture: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub password: Option<String>,
    pub profile_picture: Option<String>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.bio.is_none()
            && self.password.is_none()
            && self.profile_picture.is_none()
    }
}

/// Profile projection. The stored password hash is never part of this type.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    /// Base64-encoded image bytes, if a picture is stored.
    pub profile_picture: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserCreated {
    pub message: String,
    pub user_id: i64,
}

// -- Listings --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateListingRequest {
    #[serde(default)]
    pub email: String,
    /// Base64-encoded photo bytes.
    pub photo: Option<String>,
    #[serde(default)]
    pub quality: String,
    #[serde(default)]
    pub description: String,
    pub asking_price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateListingRequest {
    pub photo: Option<String>,
    pub quality: Option<String>,
    pub description: Option<String>,
    pub asking_price: Option<f64>,
    pub listing_type: Option<String>,
}

impl UpdateListingRequest {
    pub fn is_empty(&self) -> bool {
        self.photo.is_none()
            && self.quality.is_none()
            && self.description.is_none()
            && self.asking_price.is_none()
            && self.listing_type.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListingResponse {
    pub email: String,
    /// Base64-encoded photo bytes, if a photo is stored.
    pub photo: Option<String>,
    pub quality: Option<String>,
    pub description: Option<String>,
    pub asking_price: Option<f64>,
    pub listing_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListingCreated {
    pub message: String,
    pub listing_id: i64,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMessageRequest {
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub receiver_id: String,
    #[serde(default)]
    pub message_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMessageRequest {
    #[serde(default)]
    pub message_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message_id: i64,
    pub sender_id: String,
    pub receiver_id: String,
    pub message_text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageCreated {
    pub message: String,
    pub message_id: i64,
}

/// Generic `{message}` body for resource update responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Database row types — these map directly to SQLite rows.
/// Distinct from the thrift-types API DTOs to keep the DB layer independent.

pub struct UserRow {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub password_hash: String,
    pub profile_picture: Option<Vec<u8>>,
    pub created_at: String,
}

pub struct ListingRow {
    pub email: String,
    pub photo: Option<Vec<u8>>,
    pub quality: Option<String>,
    pub description: Option<String>,
    pub asking_price: Option<f64>,
    pub item_type: Option<String>,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: i64,
    pub sender_id: String,
    pub receiver_id: String,
    pub body: String,
    pub created_at: String,
}

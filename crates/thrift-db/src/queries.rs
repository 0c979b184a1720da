use crate::models::{ListingRow, MessageRow, UserRow};
use crate::{ConstraintViolation, Database};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
        bio: Option<&str>,
        profile_picture: Option<&[u8]>,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (email, first_name, last_name, bio, password_hash, profile_picture)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![email, first_name, last_name, bio, password_hash, profile_picture],
            )
            .map_err(constraint_or_other)?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, email))
    }

    /// Partial update: unsupplied fields keep their stored values.
    /// Returns the number of rows affected — zero for an unknown email.
    pub fn update_user(
        &self,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        bio: Option<&str>,
        password_hash: Option<&str>,
        profile_picture: Option<&[u8]>,
    ) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE users SET
                     first_name      = COALESCE(?2, first_name),
                     last_name       = COALESCE(?3, last_name),
                     bio             = COALESCE(?4, bio),
                     password_hash   = COALESCE(?5, password_hash),
                     profile_picture = COALESCE(?6, profile_picture)
                 WHERE email = ?1",
                rusqlite::params![email, first_name, last_name, bio, password_hash, profile_picture],
            )?;
            Ok(n)
        })
    }

    pub fn delete_user(&self, email: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM users WHERE email = ?1", [email])?;
            Ok(n)
        })
    }

    // -- Listings --

    pub fn create_listing(
        &self,
        email: &str,
        photo: Option<&[u8]>,
        quality: &str,
        description: &str,
        asking_price: f64,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO listings (email, photo, quality, description, asking_price)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![email, photo, quality, description, asking_price],
            )
            .map_err(constraint_or_other)?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_listing(&self, email: &str) -> Result<Option<ListingRow>> {
        self.with_conn(|conn| query_listing(conn, email))
    }

    pub fn all_listings(&self) -> Result<Vec<ListingRow>> {
        self.with_conn(query_all_listings)
    }

    pub fn update_listing(
        &self,
        email: &str,
        photo: Option<&[u8]>,
        quality: Option<&str>,
        description: Option<&str>,
        asking_price: Option<f64>,
        item_type: Option<&str>,
    ) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE listings SET
                     photo        = COALESCE(?2, photo),
                     quality      = COALESCE(?3, quality),
                     description  = COALESCE(?4, description),
                     asking_price = COALESCE(?5, asking_price),
                     item_type    = COALESCE(?6, item_type)
                 WHERE email = ?1",
                rusqlite::params![email, photo, quality, description, asking_price, item_type],
            )?;
            Ok(n)
        })
    }

    pub fn delete_listing(&self, email: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM listings WHERE email = ?1", [email])?;
            Ok(n)
        })
    }

    // -- Messages --

    pub fn create_message(&self, sender_id: &str, receiver_id: &str, body: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (sender_id, receiver_id, body) VALUES (?1, ?2, ?3)",
                rusqlite::params![sender_id, receiver_id, body],
            )
            .map_err(constraint_or_other)?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    pub fn update_message(&self, id: i64, body: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE messages SET body = ?2 WHERE id = ?1",
                rusqlite::params![id, body],
            )?;
            Ok(n)
        })
    }

    pub fn delete_message(&self, id: i64) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(n)
        })
    }
}

fn query_user(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT email, first_name, last_name, bio, password_hash, profile_picture, created_at
         FROM users WHERE email = ?1",
    )?;

    let row = stmt
        .query_row([email], |row| {
            Ok(UserRow {
                email: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                bio: row.get(3)?,
                password_hash: row.get(4)?,
                profile_picture: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_listing(conn: &Connection, email: &str) -> Result<Option<ListingRow>> {
    let mut stmt = conn.prepare(
        "SELECT email, photo, quality, description, asking_price, item_type, created_at
         FROM listings WHERE email = ?1",
    )?;

    let row = stmt
        .query_row([email], |row| {
            Ok(ListingRow {
                email: row.get(0)?,
                photo: row.get(1)?,
                quality: row.get(2)?,
                description: row.get(3)?,
                asking_price: row.get(4)?,
                item_type: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_all_listings(conn: &Connection) -> Result<Vec<ListingRow>> {
    let mut stmt = conn.prepare(
        "SELECT email, photo, quality, description, asking_price, item_type, created_at
         FROM listings ORDER BY created_at DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ListingRow {
                email: row.get(0)?,
                photo: row.get(1)?,
                quality: row.get(2)?,
                description: row.get(3)?,
                asking_price: row.get(4)?,
                item_type: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_message(conn: &Connection, id: i64) -> Result<Option<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, sender_id, receiver_id, body, created_at FROM messages WHERE id = ?1",
    )?;

    let row = stmt
        .query_row([id], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                sender_id: row.get(1)?,
                receiver_id: row.get(2)?,
                body: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn constraint_or_other(e: rusqlite::Error) -> anyhow::Error {
    match e {
        rusqlite::Error::SqliteFailure(err, msg)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            anyhow::Error::new(ConstraintViolation(
                msg.unwrap_or_else(|| "unique or foreign key constraint failed".into()),
            ))
        }
        other => other.into(),
    }
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

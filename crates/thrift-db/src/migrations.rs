use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            email           TEXT PRIMARY KEY,
            first_name      TEXT NOT NULL,
            last_name       TEXT NOT NULL,
            bio             TEXT,
            password_hash   TEXT NOT NULL,
            profile_picture BLOB,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- email doubles as the primary key, so each user holds at most
        -- one listing at a time
        CREATE TABLE IF NOT EXISTS listings (
            email        TEXT PRIMARY KEY REFERENCES users(email),
            photo        BLOB,
            quality      TEXT,
            description  TEXT,
            asking_price REAL,
            item_type    TEXT,
            created_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS messages (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id   TEXT NOT NULL REFERENCES users(email),
            receiver_id TEXT NOT NULL REFERENCES users(email),
            body        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_receiver
            ON messages(receiver_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

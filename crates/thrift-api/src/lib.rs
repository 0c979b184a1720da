pub mod auth;
pub mod error;
pub mod listings;
pub mod messages;
pub mod profile;
pub mod routes;
pub mod session;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use routes::router;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

/// Run a rusqlite call on the blocking pool, flattening the join error
/// into the result.
pub(crate) async fn run_blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => Err(anyhow::anyhow!("blocking task join error: {}", e)),
    }
}

/// SQLite stores `datetime('now')` as "YYYY-MM-DD HH:MM:SS" without a
/// timezone. Parse as naive UTC and convert, accepting RFC 3339 too.
pub(crate) fn parse_sqlite_datetime(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

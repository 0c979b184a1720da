use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use thrift_api::session::SessionStore;
use thrift_api::{AppState, AppStateInner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thrift_server=debug,thrift_api=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("THRIFT_DB_PATH").unwrap_or_else(|_| "carolina_thrift.db".into());
    let host = std::env::var("THRIFT_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("THRIFT_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let email_domain =
        std::env::var("THRIFT_EMAIL_DOMAIN").unwrap_or_else(|_| "ecu.edu".into());
    let session_ttl_hours: i64 = std::env::var("THRIFT_SESSION_TTL_HOURS")
        .unwrap_or_else(|_| "24".into())
        .parse()?;

    // Init database
    let db = thrift_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        sessions: SessionStore::new(chrono::Duration::hours(session_ttl_hours)),
        allowed_email_domain: email_domain,
    });

    let app = thrift_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Carolina Thrift server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

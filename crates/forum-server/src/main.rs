use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use forum_web::auth::{AppState, AppStateInner};
use forum_web::routes::router;
use forum_web::session::SessionStore;

/// Fixed upper bound per request; the database client itself sets no
/// deadline of its own.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forum_server=debug,forum_web=debug,forum_db=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("FORUM_DB_PATH").unwrap_or_else(|_| "forum.db".into());
    let host = std::env::var("FORUM_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("FORUM_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let session_ttl_hours: u64 = std::env::var("FORUM_SESSION_TTL_HOURS")
        .unwrap_or_else(|_| "24".into())
        .parse()?;

    // Init database
    let db = forum_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let sessions = SessionStore::new(Duration::from_secs(session_ttl_hours * 60 * 60));
    let state: AppState = Arc::new(AppStateInner { db, sessions });

    let app = router(state)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Forum listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fitlog::cache::{Debouncer, TtlCache};
use fitlog::config::Config;
use fitlog::progress::DashboardCache;
use fitlog::repositories::SessionRepository;
use fitlog::routes::{self, AppStates};
use fitlog::storage::PhotoStorage;
use fitlog::version::GIT_VERSION;
use fitlog::{db, migrations};

/// How often expired sessions and cache entries are swept.
const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fitlog=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    tracing::info!(version = GIT_VERSION, "Connecting to database: {}", config.database_url);

    let pool = db::create_pool(&config.database_url)?;
    migrations::run_migrations(&pool)?;

    let storage = PhotoStorage::new(&config.upload_dir);
    storage.ensure_dir().await?;

    let dashboard_cache: DashboardCache = TtlCache::new(config.cache_ttl);
    let debouncer = Debouncer::new(config.debounce_window);
    let session_repo = SessionRepository::new(pool.clone());

    spawn_housekeeping(session_repo.clone(), dashboard_cache.clone());

    let states = AppStates::new(&pool, storage, dashboard_cache, debouncer);
    let app = routes::create_router(states, pool, session_repo, config.max_upload_bytes);

    let addr = config.server_addr();
    tracing::info!("Starting server at http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn spawn_housekeeping(session_repo: SessionRepository, dashboard_cache: DashboardCache) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HOUSEKEEPING_INTERVAL);
        loop {
            interval.tick().await;
            match session_repo.cleanup_expired().await {
                Ok(removed) => tracing::debug!(removed, "Expired sessions removed"),
                Err(e) => tracing::warn!("Session cleanup failed: {}", e),
            }
            let purged = dashboard_cache.purge_expired();
            tracing::debug!(purged, "Expired dashboard entries purged");
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

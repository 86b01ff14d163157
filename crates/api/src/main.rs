use std::net::SocketAddr;
use std::sync::Arc;

use bookings_api::config::ServerConfig;
use bookings_api::router::build_app_router;
use bookings_api::state::AppState;
use bookings_db::{BookingStore, PgStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        store_timeout_secs = config.store_timeout_secs,
        secure_cookie = config.session.secure_cookie,
        "Loaded booking site configuration",
    );

    let store = open_booking_store(&config).await;
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    // Bind and serve until SIGINT/SIGTERM.
    let addr = SocketAddr::new(
        config.host.parse().expect("HOST must be an IP address"),
        config.port,
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "Booking site listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Booking site stopped");
}

/// Log to stdout, filtered by `RUST_LOG`.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookings_api=debug,bookings_db=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Connect to `DATABASE_URL`, verify it, bring the room/reservation schema up
/// to date and wrap the pool in a deadline-bounded store.
async fn open_booking_store(config: &ServerConfig) -> Arc<dyn BookingStore> {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = bookings_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    bookings_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    bookings_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Booking store ready");

    Arc::new(PgStore::new(pool, config.store_timeout()))
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("SIGINT received, draining requests"),
        () = terminate => tracing::info!("SIGTERM received, draining requests"),
    }
}

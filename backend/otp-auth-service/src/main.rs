/// OTP Auth Service Main Entry Point
///
/// Starts the HTTP server with:
/// - PostgreSQL connection pool
/// - Redis connection manager
/// - SMS dispatcher (Fast2SMS or log-only)
/// - Blacklist sweeper (background task)
use anyhow::{Context, Result};
use otp_auth_service::{
    cache::{KeyValueStore, RedisKeyValueStore},
    config::Settings,
    db::{IdentityStore, PgIdentityStore},
    http::{build_router, AppState},
    security::JwtIssuer,
    services::{dispatcher_from_settings, spawn_blacklist_sweeper, SessionLifecycle, SmsDispatcher},
};
use redis_utils::RedisPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "otp_auth_service=info,info".into()),
        )
        .with_target(false)
        .json()
        .init();

    info!("Starting OTP Auth Service");

    // Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    // Initialize database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .acquire_timeout(Duration::from_secs(settings.database.acquire_timeout))
        .connect(&settings.database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    info!(
        "Database pool initialized with {} max connections",
        settings.database.max_connections
    );

    // Run database migrations
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations completed");

    // Initialize Redis connection pool
    let redis_pool = RedisPool::connect(&settings.redis.url)
        .await
        .context("Failed to connect to Redis")?;
    info!("Redis connection manager initialized");

    let kv: Arc<dyn KeyValueStore> = Arc::new(
        RedisKeyValueStore::new(redis_pool.manager())
            .with_timeout(Duration::from_secs(settings.redis.response_timeout)),
    );
    let identities: Arc<dyn IdentityStore> = Arc::new(PgIdentityStore::new(db_pool.clone()));

    let issuer = JwtIssuer::from_secret(
        &settings.jwt.secret,
        settings.jwt.issuer.clone(),
        chrono::Duration::seconds(settings.policy.token_ttl_secs as i64),
    )
    .context("Failed to initialize JWT issuer")?;

    let sms: Arc<dyn SmsDispatcher> = Arc::from(
        dispatcher_from_settings(&settings.sms).context("Failed to initialize SMS dispatcher")?,
    );

    let lifecycle = SessionLifecycle::new(identities, kv, issuer, sms, &settings.policy);

    // Spawn blacklist sweeper (background task)
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = spawn_blacklist_sweeper(
        lifecycle.revocations(),
        settings.policy.sweep_interval(),
        shutdown_rx,
    );

    let router = build_router(AppState::new(lifecycle));

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Starting HTTP server on {}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server error")?;

    // Stop background tasks
    let _ = shutdown_tx.send(true);
    if let Err(err) = sweeper.await {
        error!("Blacklist sweeper terminated abnormally: {}", err);
    }
    db_pool.close().await;

    info!("OTP auth service shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutting down gracefully...");
}

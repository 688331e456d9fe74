use blog_portal::{
    AppState, SessionStore,
    config::{AppConfig, Env},
    create_router,
    repository::{PostgresRepository, RepositoryState, ensure_schema},
};
use chrono::Duration;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Entry point: configuration, logging, database, session table, HTTP
/// server, in that order, each failing fast.
#[tokio::main]
async fn main() {
    // Load .env before the configuration reads the environment.
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // RUST_LOG wins; otherwise sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "blog_portal=debug,tower_http=info,axum=trace".into());

    // Pretty output for local debugging, JSON for log aggregation in
    // production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("application starting in {:?} mode", config.env);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: failed to connect to Postgres. Check DATABASE_URL.");

    // Bring the tables up if this is a fresh database.
    ensure_schema(&pool)
        .await
        .expect("FATAL: failed to create database schema");

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;
    let sessions = Arc::new(SessionStore::new(Duration::hours(config.session_ttl_hours)));

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        repo,
        sessions,
        config,
    };

    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: failed to bind listener");

    tracing::info!("listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("FATAL: server error");
}

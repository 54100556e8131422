use std::sync::Arc;

use auth::Authenticator;
use auth::PasswordHasher;
use auth::TokenService;
use chrono::Duration;
use identity_service::config::Config;
use identity_service::config::StorageBackend;
use identity_service::domain::user::ports::AuthGatePort;
use identity_service::domain::user::service::AuthGate;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::InMemoryUserStore;
use identity_service::outbound::repositories::PostgresUserStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        storage = ?config.storage.backend,
        key_strategy = ?config.jwt.key_strategy,
        expiration_hours = config.jwt.expiration_hours,
        password_cost = config.password.cost,
        "Configuration loaded"
    );

    let key_strategy = config.jwt.key_strategy()?;
    if key_strategy.is_ephemeral() {
        tracing::warn!(
            "Using a generated signing key; issued tokens become invalid on restart \
             and are not accepted by other instances"
        );
    }

    let token_service = TokenService::new(key_strategy.signing_key()?)
        .with_validity(Duration::hours(config.jwt.expiration_hours));
    let password_hasher = PasswordHasher::with_cost(config.password.cost)?;
    let authenticator = Arc::new(Authenticator::new(password_hasher, token_service));

    let auth_gate: Arc<dyn AuthGatePort> = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!(storage = "memory", "Using in-memory user store");
            Arc::new(AuthGate::new(
                Arc::new(InMemoryUserStore::new()),
                Arc::clone(&authenticator),
            ))
        }
        StorageBackend::Postgres => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(config.storage.max_connections)
                .connect(config.storage.database_url()?)
                .await?;
            tracing::info!(
                max_connections = config.storage.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            let store = PostgresUserStore::new(pg_pool);
            store.migrate().await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            Arc::new(AuthGate::new(Arc::new(store), Arc::clone(&authenticator)))
        }
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    axum::serve(http_listener, create_router(auth_gate))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server exited successfully");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

use std::net::TcpListener;
use std::sync::Arc;

use credential_service::auth::{CredentialService, TokenCodec};
use credential_service::configuration::{get_configuration, Settings, StoreBackend};
use credential_service::startup::{run, spawn_purge_task};
use credential_service::store::{
    InMemoryTokenStateStore, InMemoryUserStore, PgTokenStateStore, PgUserStore, TokenStateStore,
    UserStore,
};
use credential_service::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting credential service");

    let configuration = get_configuration().map_err(|e| {
        tracing::error!("Failed to read configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    // Invalid settings are fatal to startup, never to a request
    configuration.jwt.validate().map_err(|e| {
        tracing::error!("Invalid JWT configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    configuration.store.validate().map_err(|e| {
        tracing::error!("Invalid store configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let (users, tokens) = build_stores(&configuration).await?;
    spawn_purge_task(tokens.clone(), configuration.store.purge_interval());

    let service = CredentialService::new(
        users,
        tokens,
        TokenCodec::new(&configuration.jwt),
        configuration.store.operation_timeout(),
    );

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, service)?.await
}

async fn build_stores(
    configuration: &Settings,
) -> std::io::Result<(Arc<dyn UserStore>, Arc<dyn TokenStateStore>)> {
    match configuration.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory stores, all state is lost on restart");
            Ok((
                Arc::new(InMemoryUserStore::new()),
                Arc::new(InMemoryTokenStateStore::new()),
            ))
        }
        StoreBackend::Postgres => {
            let database = configuration.database.as_ref().ok_or_else(|| {
                tracing::error!("Missing required config: database");
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
            })?;

            tracing::info!("Attempting to connect to database");
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(configuration.store.operation_timeout())
                .connect(&database.connection_string())
                .await
                .map_err(|e| {
                    tracing::error!("Failed to create connection pool: {}", e);
                    std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        "Database connection error",
                    )
                })?;

            sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, "Migration error")
            })?;

            Ok((
                Arc::new(PgUserStore::new(pool.clone())),
                Arc::new(PgTokenStateStore::new(pool)),
            ))
        }
    }
}

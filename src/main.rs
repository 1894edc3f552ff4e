use anyhow::Context;
use chrono::Utc;
use rusty_library_lending::{
    adapters::{
        memory::MemoryStore,
        postgres::{
            PostgresAccountRepository, PostgresBookRepository, PostgresLendingStore,
            PostgresLoanQueries, PostgresPatronRepository,
        },
    },
    api::{AppState, create_router},
    application::{
        ServiceDependencies,
        accounts::{TokenIssuer, ensure_admin},
    },
    config::{AppConfig, LogFormat, StorageBackend},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "rusty_library_lending={},tower_http=debug",
            config.logging.level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn build_dependencies(
    config: &AppConfig,
    token_issuer: Arc<TokenIssuer>,
) -> anyhow::Result<ServiceDependencies> {
    match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .connect(&config.database.url)
                .await
                .context("Failed to connect to database")?;

            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;

            tracing::info!("Database migrations completed");

            Ok(ServiceDependencies {
                lending_store: Arc::new(PostgresLendingStore::new(pool.clone())),
                loan_queries: Arc::new(PostgresLoanQueries::new(pool.clone())),
                book_repository: Arc::new(PostgresBookRepository::new(pool.clone())),
                patron_repository: Arc::new(PostgresPatronRepository::new(pool.clone())),
                account_repository: Arc::new(PostgresAccountRepository::new(pool)),
                token_issuer,
            })
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");

            let store = Arc::new(MemoryStore::new());
            Ok(ServiceDependencies {
                lending_store: store.clone(),
                loan_queries: store.clone(),
                book_repository: store.clone(),
                patron_repository: store.clone(),
                account_repository: store,
                token_issuer,
            })
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config);

    tracing::info!(
        "Starting rusty-library-lending v{}",
        env!("CARGO_PKG_VERSION")
    );

    let token_issuer = Arc::new(TokenIssuer::new(
        &config.auth.jwt_secret,
        config.auth.jwt_issuer.clone(),
        config.auth.jwt_expiration_hours,
    ));

    let service_deps = build_dependencies(&config, token_issuer).await?;

    if let Some((email, password)) = config.auth.seed_admin() {
        ensure_admin(&service_deps, email, password, Utc::now())
            .await
            .context("Failed to seed administrator account")?;
    }

    let app = create_router(Arc::new(AppState { service_deps }));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

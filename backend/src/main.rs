//! Reception and Release Management - Backend Server

use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rnr_backend::{
    adapters::{MemoryStore, PgStore, RecordingPlatform},
    config::{LogFormat, StorageBackend},
    create_app,
    external::PlatformClient,
    ports::{Chatter, Ports, ReportRenderer},
    AppState, Config,
};

/// Record storage selected by configuration
enum Storage {
    Postgres(PgStore),
    Memory(MemoryStore),
}

impl Storage {
    fn ports<P>(&self, platform: Arc<P>, web_base_url: &str) -> Ports
    where
        P: Chatter + ReportRenderer + 'static,
    {
        match self {
            Storage::Postgres(store) => store.ports(platform, web_base_url),
            Storage::Memory(store) => store.ports(platform, web_base_url),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    init_tracing(config.logging.format);

    tracing::info!("Starting Reception and Release Management Server");
    tracing::info!("Environment: {}", config.environment);

    let (db, storage) = match config.storage.backend {
        StorageBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&config.database.url)
                .await?;
            tracing::info!("Database connection established");

            // Run migrations in development
            if config.environment == "development" {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&db_pool).await?;
                tracing::info!("Migrations completed");
            }

            let store = PgStore::new(db_pool.clone());
            (Some(db_pool), Storage::Postgres(store))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, records are lost on shutdown");
            (None, Storage::Memory(MemoryStore::new()))
        }
    };

    let web_base_url = config.platform.web_base_url.as_str();
    let ports = if config.platform_enabled() {
        tracing::info!("Platform API: {}", config.platform.api_endpoint);
        let client = PlatformClient::new(&config.platform)?;
        storage.ports(Arc::new(client), web_base_url)
    } else {
        tracing::warn!("No platform API configured, chatter and reports are only logged");
        storage.ports(Arc::new(RecordingPlatform::new()), web_base_url)
    };

    let state = AppState {
        db,
        ports,
        config: Arc::new(config.clone()),
    };

    let app = create_app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "rnr_backend=debug,rnr_server=debug,tower_http=debug,sqlx=warn".into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use catering_api::{app, worker, AppState};
use catering_core::{
    BookingRepository, Clock, NotificationDispatcher, StoreProbe, SystemClock, UserRepository,
};
use catering_store::app_config::{Config, NotificationProvider};
use catering_store::{
    BrevoDispatcher, ConsoleDispatcher, DbClient, InMemoryStore, PgBookingRepository,
    PgUserRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MEMORY_URL: &str = "memory://";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "catering_api=debug,catering_lifecycle=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting catering API on port {}", config.server.port);

    let notifier: Arc<dyn NotificationDispatcher> = match config.notifications.provider {
        NotificationProvider::Brevo => {
            let brevo = config
                .notifications
                .brevo
                .clone()
                .context("notifications.provider is brevo but [notifications.brevo] is missing")?;
            Arc::new(BrevoDispatcher::new(brevo)?)
        }
        NotificationProvider::Console => {
            tracing::warn!("Console notifications enabled, emails will only be logged");
            Arc::new(ConsoleDispatcher::new())
        }
    };

    let (bookings, users, probe): (
        Arc<dyn BookingRepository>,
        Arc<dyn UserRepository>,
        Arc<dyn StoreProbe>,
    ) = if config.database.url == MEMORY_URL {
        tracing::warn!("Using the in-memory store, data is lost on exit");
        let store = Arc::new(InMemoryStore::new());
        let bookings: Arc<dyn BookingRepository> = store.clone();
        let users: Arc<dyn UserRepository> = store.clone();
        let probe: Arc<dyn StoreProbe> = store;
        (bookings, users, probe)
    } else {
        let db = DbClient::new(&config.database.url, config.database.max_connections)
            .await
            .context("Failed to connect to Postgres")?;
        db.migrate().await.context("Failed to run migrations")?;
        let bookings: Arc<dyn BookingRepository> = Arc::new(PgBookingRepository::new(db.pool.clone()));
        let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(db.pool.clone()));
        let probe: Arc<dyn StoreProbe> = Arc::new(db);
        (bookings, users, probe)
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let app_state = AppState::new(bookings, users, probe, notifier, clock);

    if config.sweeper.enabled {
        tokio::spawn(worker::start_expiry_worker(
            app_state.sweeper.clone(),
            tokio::time::Duration::from_secs(config.sweeper.interval_seconds.max(1)),
        ));
    } else {
        tracing::warn!("Expiry sweeper disabled; run POST /v1/bookings/expired/check manually");
    }

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

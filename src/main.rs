use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rakht_setu::config::{GatewayKind, Settings, StorageBackend};
use rakht_setu::routes::{self, handle_json_payload_error, handle_query_payload_error, AppState};
use rakht_setu::services::{
    CampaignRepository, DeliveryGateway, DonorRepository, InMemoryRepository, LogGateway,
    NotificationDeduper, NotificationDispatcher, PostgresRepository, RequestRepository,
    WebhookGateway,
};

/// Repositories handed to the application, all backed by the same store
struct Storage {
    donors: Arc<dyn DonorRepository>,
    requests: Arc<dyn RequestRepository>,
    campaigns: Arc<dyn CampaignRepository>,
}

impl Storage {
    fn shared<R>(repo: R) -> Self
    where
        R: DonorRepository + RequestRepository + CampaignRepository + 'static,
    {
        let repo = Arc::new(repo);
        Self {
            donors: repo.clone(),
            requests: repo.clone(),
            campaigns: repo,
        }
    }
}

fn startup_error(message: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, message.to_string())
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

async fn build_storage(settings: &Settings) -> std::io::Result<Storage> {
    match settings.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            Ok(Storage::shared(InMemoryRepository::new()))
        }
        StorageBackend::Postgres => {
            let url = settings
                .database
                .url
                .as_deref()
                .ok_or_else(|| startup_error("database.url is required for postgres storage"))?;

            let repo = PostgresRepository::from_settings(
                url,
                settings.database.max_connections,
                settings.database.min_connections,
                settings.database.acquire_timeout_secs,
                settings.database.idle_timeout_secs,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                startup_error(e)
            })?;

            info!(
                "PostgreSQL repository initialized (max: {} connections)",
                settings.database.max_connections.unwrap_or(10)
            );

            Ok(Storage::shared(repo))
        }
    }
}

fn build_gateway(settings: &Settings) -> std::io::Result<Arc<dyn DeliveryGateway>> {
    let notifications = &settings.notifications;

    match notifications.gateway {
        GatewayKind::Log => Ok(Arc::new(LogGateway)),
        GatewayKind::Webhook => {
            let url = notifications
                .webhook_url
                .clone()
                .ok_or_else(|| startup_error("notifications.webhook_url is required for the webhook gateway"))?;

            let gateway = WebhookGateway::new(
                url,
                notifications.webhook_token.clone(),
                Duration::from_secs(notifications.timeout_secs),
            )
            .map_err(startup_error)?;

            Ok(Arc::new(gateway))
        }
    }
}

async fn build_deduper(settings: &Settings) -> Option<Arc<NotificationDeduper>> {
    let cache = &settings.cache;
    if cache.dedupe_ttl_secs == 0 {
        info!("Alert de-duplication disabled");
        return None;
    }

    let deduper = match cache.redis_url.as_deref() {
        Some(url) => {
            match NotificationDeduper::with_redis(url, cache.dedupe_capacity, cache.dedupe_ttl_secs).await {
                Ok(d) => {
                    info!("Alert seen-set shared through Redis (TTL: {}s)", cache.dedupe_ttl_secs);
                    d
                }
                Err(e) => {
                    error!("Failed to connect to Redis ({}), using a local seen-set", e);
                    NotificationDeduper::new(cache.dedupe_capacity, cache.dedupe_ttl_secs)
                }
            }
        }
        None => NotificationDeduper::new(cache.dedupe_capacity, cache.dedupe_ttl_secs),
    };

    Some(Arc::new(deduper))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| startup_error(format!("Configuration error: {}", e)))?;

    init_logging(&settings);

    info!("Starting RakhtSetu donor matching service...");

    let storage = build_storage(&settings).await?;
    let gateway = build_gateway(&settings)?;
    info!("Alert gateway: {}", gateway.name());

    let deduper = build_deduper(&settings).await;
    let dispatcher = Arc::new(NotificationDispatcher::new(gateway, deduper));

    let (app_state, worker) = AppState::new(
        storage.donors,
        storage.requests,
        storage.campaigns,
        dispatcher,
        &settings.matching,
        settings.notifications.queue_capacity,
        settings.storage.backend.as_str(),
    );

    info!("Search radii: {:?}", app_state.radii);

    worker.spawn();

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}

// Service exports
pub mod dedupe;
pub mod gateway;
pub mod notifier;
pub mod postgres;
pub mod repository;

pub use dedupe::{DedupeError, NotificationDeduper};
pub use gateway::{Alert, DeliveryError, DeliveryGateway, LogGateway, WebhookGateway};
pub use notifier::{
    broadcast_channel, format_alert_message, BroadcastQueue, BroadcastWorker,
    NotificationDispatcher,
};
pub use postgres::PostgresRepository;
pub use repository::{
    CampaignRepository, DonorRepository, InMemoryRepository, RepositoryError, RequestRepository,
};

// Route exports
pub mod campaigns;
pub mod donors;
pub mod health;
pub mod requests;

use actix_web::{error, http::StatusCode, web, HttpRequest, HttpResponse};
use std::sync::Arc;
use thiserror::Error;

use crate::config::MatchingSettings;
use crate::core::matcher::{DonorMatcher, MatchError, RequestLocator, SearchRadii};
use crate::models::{ErrorResponse, ValidationError};
use crate::services::{
    broadcast_channel, BroadcastQueue, BroadcastWorker, CampaignRepository, DonorRepository,
    NotificationDispatcher, RepositoryError, RequestRepository,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub donors: Arc<dyn DonorRepository>,
    pub requests: Arc<dyn RequestRepository>,
    pub campaigns: Arc<dyn CampaignRepository>,
    pub matcher: DonorMatcher,
    pub locator: RequestLocator,
    pub broadcast: BroadcastQueue,
    pub radii: SearchRadii,
    pub storage: &'static str,
}

impl AppState {
    /// Wire handlers and the broadcast worker around the storage backends
    ///
    /// The worker is returned unstarted; the caller decides where it runs.
    pub fn new(
        donors: Arc<dyn DonorRepository>,
        requests: Arc<dyn RequestRepository>,
        campaigns: Arc<dyn CampaignRepository>,
        dispatcher: Arc<NotificationDispatcher>,
        matching: &MatchingSettings,
        queue_capacity: usize,
        storage: &'static str,
    ) -> (Self, BroadcastWorker) {
        let radii = matching.radii();
        let matcher = DonorMatcher::new(donors.clone(), matching.lookup_timeout());
        let locator = RequestLocator::new(requests.clone(), matching.lookup_timeout());
        let (broadcast, receiver) = broadcast_channel(queue_capacity);

        let worker = BroadcastWorker::new(
            receiver,
            matcher.clone(),
            dispatcher,
            requests.clone(),
            radii.broadcast_km,
            matching.auto_mark_matched,
        );

        let state = Self {
            donors,
            requests,
            campaigns,
            matcher,
            locator,
            broadcast,
            radii,
            storage,
        };

        (state, worker)
    }
}

/// Error returned by handlers, rendered as an [`ErrorResponse`]
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_failed",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Unavailable(_) => "service_unavailable",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => ApiError::NotFound(msg),
            RepositoryError::Invalid(e @ ValidationError::BackwardTransition { .. }) => {
                ApiError::Conflict(e.to_string())
            }
            RepositoryError::Invalid(e) => ApiError::Validation(e),
            RepositoryError::Corrupt(msg) => ApiError::Internal(msg),
            other => {
                tracing::error!("Storage failure: {}", other);
                ApiError::Unavailable("Storage is unavailable, try again later".to_string())
            }
        }
    }
}

impl From<MatchError> for ApiError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::Validation(e) => ApiError::Validation(e),
            MatchError::Lookup(e) => e.into(),
            MatchError::Timeout(after) => {
                tracing::warn!("Proximity lookup timed out after {:?}", after);
                ApiError::Unavailable(format!("Lookup timed out after {:?}", after))
            }
        }
    }
}

impl error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

/// JSON error for malformed bodies and query strings
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure).service(
        web::scope("/api/v1")
            .configure(donors::configure)
            .configure(requests::configure)
            .configure(campaigns::configure),
    );
}

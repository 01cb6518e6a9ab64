use actix_web::{web, HttpResponse};
use chrono::Utc;
use uuid::Uuid;

use crate::models::{
    format_distance_km, BloodRequestResponse, BroadcastResponse, CreateBloodRequest, GeoPoint,
    MatchPreviewQuery, MatchPreviewResponse, MatchResponse, NearbyRequestResponse,
    NearbyRequestsQuery, UpdateStatusRequest,
};
use crate::routes::{ApiError, AppState};

/// Configure blood request routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/requests", web::post().to(create_request))
        .route("/requests", web::get().to(list_requests))
        .route("/requests/nearby", web::get().to(nearby_requests))
        .route("/requests/{id}", web::get().to(get_request))
        .route("/requests/{id}", web::patch().to(update_status))
        .route("/requests/{id}/matches", web::get().to(preview_matches))
        .route("/requests/{id}/broadcast", web::post().to(broadcast_request));
}

/// POST /api/v1/requests
///
/// Request body:
/// ```json
/// {
///   "requesterName": "string",
///   "requesterPhone": "string",
///   "bloodGroup": "O-",
///   "unitsRequired": 2,
///   "hospitalName": "string",
///   "hospitalAddress": "string",
///   "latitude": 28.61,
///   "longitude": 77.21,
///   "urgency": "Critical"
/// }
/// ```
///
/// Responds once the request is stored; donor alerts go out in the background.
async fn create_request(
    state: web::Data<AppState>,
    body: web::Json<CreateBloodRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner().into_request(Utc::now())?;
    let request = state.requests.insert_request(request).await?;

    tracing::info!(
        request_id = %request.id,
        blood_group = %request.blood_group,
        urgency = request.urgency.as_str(),
        "Blood request created"
    );

    state.broadcast.enqueue(request.clone());

    Ok(HttpResponse::Created().json(BloodRequestResponse::from(&request)))
}

/// GET /api/v1/requests
async fn list_requests(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let requests: Vec<BloodRequestResponse> = state
        .requests
        .list_requests()
        .await?
        .iter()
        .map(BloodRequestResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(requests))
}

/// GET /api/v1/requests/nearby?lat=..&lng=..&radius=..
async fn nearby_requests(
    state: web::Data<AppState>,
    query: web::Query<NearbyRequestsQuery>,
) -> Result<HttpResponse, ApiError> {
    let origin = GeoPoint::from_parts(query.lat, query.lng)?;
    let radius_km = state.radii.resolve(query.radius, state.radii.nearby_request_km)?;

    let nearby: Vec<NearbyRequestResponse> = state
        .locator
        .find_nearby(&origin, radius_km)
        .await?
        .iter()
        .map(|(request, distance_km)| NearbyRequestResponse {
            request: BloodRequestResponse::from(request),
            distance_km: *distance_km,
            distance: format_distance_km(*distance_km, 1),
        })
        .collect();

    Ok(HttpResponse::Ok().json(nearby))
}

/// GET /api/v1/requests/{id}
async fn get_request(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let request = state.requests.get_request(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(BloodRequestResponse::from(&request)))
}

/// PATCH /api/v1/requests/{id}
///
/// Status only moves forward: pending -> matched -> completed.
async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    let status = body.parse_status()?;
    let request = state.requests.update_status(path.into_inner(), status).await?;

    tracing::info!(request_id = %request.id, status = %request.status, "Request status updated");

    Ok(HttpResponse::Ok().json(BloodRequestResponse::from(&request)))
}

/// GET /api/v1/requests/{id}/matches?radius=..
///
/// Donors a broadcast would alert, without sending anything.
async fn preview_matches(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<MatchPreviewQuery>,
) -> Result<HttpResponse, ApiError> {
    let request = state.requests.get_request(path.into_inner()).await?;
    let radius_km = state.radii.resolve(query.radius, state.radii.broadcast_km)?;

    let matches = state.matcher.find_matches(&request, radius_km).await?;

    Ok(HttpResponse::Ok().json(MatchPreviewResponse {
        request_id: request.id,
        radius_km,
        total_matches: matches.len(),
        matches: matches.iter().map(MatchResponse::from).collect(),
    }))
}

/// POST /api/v1/requests/{id}/broadcast
///
/// Re-queue alerts for an open request.
async fn broadcast_request(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let request = state.requests.get_request(path.into_inner()).await?;

    if !request.status.is_open() {
        return Err(ApiError::Conflict(format!(
            "Request {} is {}, nothing to broadcast",
            request.id, request.status
        )));
    }

    let request_id = request.id;
    let queued = state.broadcast.enqueue(request);

    if !queued {
        return Err(ApiError::Unavailable(
            "Broadcast queue is full, try again later".to_string(),
        ));
    }

    Ok(HttpResponse::Accepted().json(BroadcastResponse { request_id, queued }))
}

use actix_web::{web, HttpResponse};
use chrono::Utc;
use uuid::Uuid;

use crate::models::{
    parse_group_param, DonorFilter, DonorResponse, DonorUpdate, FilterDonorsQuery, GeoPoint,
    GroupFilter,
    NearbyDonorResponse, NearbyDonorsQuery, RecordDonationRequest, RegisterDonorRequest,
    UpdateAvailabilityRequest, UpdateLocationRequest,
};
use crate::routes::{ApiError, AppState};

/// Configure donor registry routes
///
/// Static paths are registered before `/donors/{id}` so they are not taken for ids.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/donors", web::post().to(register_donor))
        .route("/donors/nearby", web::get().to(nearby_donors))
        .route("/donors/filter", web::get().to(filter_donors))
        .route("/donors/{id}", web::get().to(get_donor))
        .route("/donors/{id}", web::delete().to(remove_donor))
        .route("/donors/{id}/location", web::patch().to(update_location))
        .route("/donors/{id}/availability", web::patch().to(update_availability))
        .route("/donors/{id}/donations", web::post().to(record_donation))
        .route("/donors/{id}/verify", web::put().to(verify_donor));
}

/// POST /api/v1/donors
async fn register_donor(
    state: web::Data<AppState>,
    body: web::Json<RegisterDonorRequest>,
) -> Result<HttpResponse, ApiError> {
    let donor = body.into_inner().into_donor(Utc::now())?;
    let donor = state.donors.insert_donor(donor).await?;

    tracing::info!(donor_id = %donor.id, blood_group = %donor.blood_group, "Registered donor");

    Ok(HttpResponse::Created().json(DonorResponse::from(&donor)))
}

/// GET /api/v1/donors/nearby?lat=..&lng=..&radius=..&bloodGroup=..&compatible=..
///
/// `bloodGroup` is an exact match unless `compatible=true`, in which case it
/// names the recipient and every compatible donor group is returned.
async fn nearby_donors(
    state: web::Data<AppState>,
    query: web::Query<NearbyDonorsQuery>,
) -> Result<HttpResponse, ApiError> {
    let origin = GeoPoint::from_parts(query.lat, query.lng)?;
    let radius_km = state.radii.resolve(query.radius, state.radii.nearby_donor_km)?;

    let filter = match parse_group_param(query.blood_group.as_deref())? {
        None => GroupFilter::Any,
        Some(group) if query.compatible => GroupFilter::CompatibleWith(group),
        Some(group) => GroupFilter::Exact(group),
    };

    let matches = state.matcher.find_nearby(&origin, radius_km, filter).await?;

    tracing::debug!(radius_km, found = matches.len(), "Nearby donor search");

    let body: Vec<NearbyDonorResponse> = matches.iter().map(NearbyDonorResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/v1/donors/filter?bloodGroup=..&available=..&eligible=..
async fn filter_donors(
    state: web::Data<AppState>,
    query: web::Query<FilterDonorsQuery>,
) -> Result<HttpResponse, ApiError> {
    let filter = DonorFilter {
        blood_group: parse_group_param(query.blood_group.as_deref())?,
        available: query.available,
    };

    let now = Utc::now();
    let donors: Vec<DonorResponse> = state
        .donors
        .list_donors(&filter)
        .await?
        .iter()
        .filter(|d| query.eligible.map_or(true, |wanted| d.is_eligible_at(now) == wanted))
        .map(DonorResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(donors))
}

/// GET /api/v1/donors/{id}
async fn get_donor(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let donor = state.donors.get_donor(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(DonorResponse::from(&donor)))
}

/// PATCH /api/v1/donors/{id}/location
async fn update_location(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateLocationRequest>,
) -> Result<HttpResponse, ApiError> {
    let point = body.to_geo_point()?;
    let donor = state
        .donors
        .update_donor(path.into_inner(), DonorUpdate::Location(point.into()))
        .await?;

    Ok(HttpResponse::Ok().json(DonorResponse::from(&donor)))
}

/// PATCH /api/v1/donors/{id}/availability
async fn update_availability(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateAvailabilityRequest>,
) -> Result<HttpResponse, ApiError> {
    let donor = state
        .donors
        .update_donor(path.into_inner(), DonorUpdate::Availability(body.availability))
        .await?;

    tracing::info!(donor_id = %donor.id, availability = donor.availability, "Donor availability changed");

    Ok(HttpResponse::Ok().json(DonorResponse::from(&donor)))
}

/// POST /api/v1/donors/{id}/donations
///
/// Body is optional; without a date the donation is recorded as today.
async fn record_donation(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: Option<web::Json<RecordDonationRequest>>,
) -> Result<HttpResponse, ApiError> {
    let record = body.map(web::Json::into_inner).unwrap_or_default();
    let date = record.date.unwrap_or_else(Utc::now);

    let donor = state
        .donors
        .update_donor(path.into_inner(), DonorUpdate::Donation(date))
        .await?;

    Ok(HttpResponse::Ok().json(DonorResponse::from(&donor)))
}

/// PUT /api/v1/donors/{id}/verify
async fn verify_donor(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let donor = state
        .donors
        .update_donor(path.into_inner(), DonorUpdate::Verified)
        .await?;

    Ok(HttpResponse::Ok().json(DonorResponse::from(&donor)))
}

/// DELETE /api/v1/donors/{id}
async fn remove_donor(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let donor = state
        .donors
        .update_donor(path.into_inner(), DonorUpdate::Removed)
        .await?;

    tracing::info!(donor_id = %donor.id, "Removed donor");

    Ok(HttpResponse::NoContent().finish())
}

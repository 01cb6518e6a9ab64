use actix_web::{web, HttpResponse};
use chrono::Utc;
use uuid::Uuid;

use crate::models::{CampaignResponse, CreateCampaignRequest, ListCampaignsQuery, UpdateCampaignRequest};
use crate::routes::{ApiError, AppState};

/// Configure donation campaign routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/campaigns", web::post().to(create_campaign))
        .route("/campaigns", web::get().to(list_campaigns))
        .route("/campaigns/{id}", web::get().to(get_campaign))
        .route("/campaigns/{id}", web::put().to(update_campaign))
        .route("/campaigns/{id}", web::delete().to(delete_campaign));
}

/// POST /api/v1/campaigns
///
/// Request body:
/// ```json
/// {
///   "title": "string",
///   "description": "string",
///   "city": "string",
///   "address": "string",
///   "latitude": 17.42,
///   "longitude": 78.47,
///   "date": "2024-08-15",
///   "time": "09:00 AM - 05:00 PM",
///   "organizer": "string",
///   "bloodGroupsNeeded": ["O-", "B+"],
///   "type": "Blood Drive"
/// }
/// ```
async fn create_campaign(
    state: web::Data<AppState>,
    body: web::Json<CreateCampaignRequest>,
) -> Result<HttpResponse, ApiError> {
    let now = Utc::now();
    let campaign = body.into_inner().into_campaign(now)?;
    let campaign = state.campaigns.insert_campaign(campaign).await?;

    tracing::info!(
        campaign_id = %campaign.id,
        city = %campaign.city,
        date = %campaign.date,
        "Campaign created"
    );

    Ok(HttpResponse::Created().json(CampaignResponse::new(&campaign, now.date_naive())))
}

/// GET /api/v1/campaigns?city=..&type=..&status=..&date=..
async fn list_campaigns(
    state: web::Data<AppState>,
    query: web::Query<ListCampaignsQuery>,
) -> Result<HttpResponse, ApiError> {
    let filter = query.to_filter()?;
    let today = Utc::now().date_naive();

    let campaigns: Vec<CampaignResponse> = state
        .campaigns
        .list_campaigns(&filter, today)
        .await?
        .iter()
        .map(|c| CampaignResponse::new(c, today))
        .collect();

    Ok(HttpResponse::Ok().json(campaigns))
}

/// GET /api/v1/campaigns/{id}
async fn get_campaign(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let campaign = state.campaigns.get_campaign(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(CampaignResponse::new(&campaign, Utc::now().date_naive())))
}

/// PUT /api/v1/campaigns/{id}
async fn update_campaign(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCampaignRequest>,
) -> Result<HttpResponse, ApiError> {
    let patch = body.into_inner().into_patch()?;
    let campaign = state.campaigns.update_campaign(path.into_inner(), patch).await?;

    Ok(HttpResponse::Ok().json(CampaignResponse::new(&campaign, Utc::now().date_naive())))
}

/// DELETE /api/v1/campaigns/{id}
async fn delete_campaign(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    state.campaigns.delete_campaign(id).await?;

    tracing::info!(campaign_id = %id, "Campaign deleted");

    Ok(HttpResponse::NoContent().finish())
}

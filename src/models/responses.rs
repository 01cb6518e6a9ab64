use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::campaign::{Campaign, CampaignStatus, CampaignType};
use crate::models::domain::{
    BloodGroup, BloodRequest, Donor, GeoJsonPoint, MatchResult, RequestStatus, Urgency,
};

/// Render a distance the way the clients display it, e.g. `"3.2 km"`
pub fn format_distance_km(distance_km: f64, decimals: usize) -> String {
    format!("{:.*} km", decimals, distance_km)
}

/// `{latitude, longitude}` view of a stored GeoJSON point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationResponse {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&GeoJsonPoint> for LocationResponse {
    fn from(point: &GeoJsonPoint) -> Self {
        Self {
            latitude: point.latitude(),
            longitude: point.longitude(),
        }
    }
}

/// Donor as returned by the registry endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub blood_group: BloodGroup,
    pub location: LocationResponse,
    pub availability: bool,
    pub last_donation_date: Option<DateTime<Utc>>,
    pub donation_count: u32,
    pub medical_history: Vec<String>,
    pub is_verified: bool,
    pub eligible: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Donor> for DonorResponse {
    fn from(donor: &Donor) -> Self {
        Self {
            id: donor.id,
            full_name: donor.full_name.clone(),
            email: donor.email.clone(),
            phone: donor.phone.clone(),
            blood_group: donor.blood_group,
            location: LocationResponse::from(&donor.location),
            availability: donor.availability,
            last_donation_date: donor.last_donation_date,
            donation_count: donor.donation_count,
            medical_history: donor.medical_history.clone(),
            is_verified: donor.is_verified,
            eligible: donor.is_eligible(),
            created_at: donor.created_at,
        }
    }
}

/// Entry of `GET /donors/nearby`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyDonorResponse {
    pub id: Uuid,
    pub name: String,
    pub blood_group: BloodGroup,
    pub phone: String,
    pub location: LocationResponse,
    pub distance_km: f64,
    pub distance: String,
    pub availability: bool,
    pub last_donation: Option<DateTime<Utc>>,
    pub donations: u32,
    pub eligible: bool,
}

impl From<&MatchResult> for NearbyDonorResponse {
    fn from(m: &MatchResult) -> Self {
        Self {
            id: m.donor.id,
            name: m.donor.full_name.clone(),
            blood_group: m.donor.blood_group,
            phone: m.donor.phone.clone(),
            location: LocationResponse::from(&m.donor.location),
            distance_km: m.distance_km,
            distance: format_distance_km(m.distance_km, 2),
            availability: m.donor.availability,
            last_donation: m.donor.last_donation_date,
            donations: m.donor.donation_count,
            eligible: m.donor.is_eligible(),
        }
    }
}

/// Blood request with its location converted back to `{latitude, longitude}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequestResponse {
    pub id: Uuid,
    pub requester_name: String,
    pub requester_phone: String,
    pub blood_group: BloodGroup,
    pub units_required: u32,
    pub hospital_name: String,
    pub hospital_address: String,
    pub location: LocationResponse,
    pub urgency: Urgency,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&BloodRequest> for BloodRequestResponse {
    fn from(request: &BloodRequest) -> Self {
        Self {
            id: request.id,
            requester_name: request.requester_name.clone(),
            requester_phone: request.requester_phone.clone(),
            blood_group: request.blood_group,
            units_required: request.units_required,
            hospital_name: request.hospital_name.clone(),
            hospital_address: request.hospital_address.clone(),
            location: LocationResponse::from(&request.location),
            urgency: request.urgency,
            status: request.status,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

/// Entry of `GET /requests/nearby`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyRequestResponse {
    #[serde(flatten)]
    pub request: BloodRequestResponse,
    pub distance_km: f64,
    pub distance: String,
}

/// One ranked donor in a match preview
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub donor_id: Uuid,
    pub name: String,
    pub blood_group: BloodGroup,
    pub distance_km: f64,
    pub compatible: bool,
}

impl From<&MatchResult> for MatchResponse {
    fn from(m: &MatchResult) -> Self {
        Self {
            donor_id: m.donor.id,
            name: m.donor.full_name.clone(),
            blood_group: m.donor.blood_group,
            distance_km: m.distance_km,
            compatible: m.compatible,
        }
    }
}

/// Response of `GET /requests/{id}/matches`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPreviewResponse {
    pub request_id: Uuid,
    pub radius_km: f64,
    pub total_matches: usize,
    pub matches: Vec<MatchResponse>,
}

/// Response of `POST /requests/{id}/broadcast`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastResponse {
    pub request_id: Uuid,
    pub queued: bool,
}

/// Label shown when a campaign welcomes every blood group
pub const ALL_GROUPS_LABEL: &str = "All Groups";

/// Campaign with its status resolved for today
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub organizer: String,
    #[serde(rename = "type")]
    pub campaign_type: CampaignType,
    pub date: NaiveDate,
    pub time: String,
    pub city: String,
    pub address: String,
    pub location: LocationResponse,
    pub status: CampaignStatus,
    pub blood_groups: Vec<String>,
    pub poster_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CampaignResponse {
    pub fn new(campaign: &Campaign, today: NaiveDate) -> Self {
        let blood_groups = if campaign.blood_groups_needed.is_empty() {
            vec![ALL_GROUPS_LABEL.to_string()]
        } else {
            campaign
                .blood_groups_needed
                .iter()
                .map(|g| g.as_str().to_string())
                .collect()
        };

        Self {
            id: campaign.id,
            title: campaign.title.clone(),
            description: campaign.description.clone(),
            organizer: campaign.organizer.clone(),
            campaign_type: campaign.campaign_type,
            date: campaign.date,
            time: campaign.time.clone(),
            city: campaign.city.clone(),
            address: campaign.address.clone(),
            location: LocationResponse::from(&campaign.location),
            status: campaign.status_on(today),
            blood_groups,
            poster_image_url: campaign.poster_image_url.clone(),
            created_at: campaign.created_at,
            updated_at: campaign.updated_at,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: String,
    pub timestamp: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

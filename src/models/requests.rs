use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::campaign::{Campaign, CampaignFilter, CampaignPatch, CampaignStatus, CampaignType};
use crate::models::domain::{
    BloodGroup, BloodRequest, Donor, GeoPoint, RequestStatus, Urgency, ValidationError,
};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Accept coordinates sent either as JSON numbers or numeric strings
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn validate_body<T: Validate>(body: &T) -> Result<(), ValidationError> {
    body.validate()
        .map_err(|errors| ValidationError::Field(errors.to_string()))
}

/// Body of `POST /requests`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBloodRequest {
    #[validate(length(min = 1, message = "requesterName is required"))]
    pub requester_name: String,
    #[validate(length(min = 1, message = "requesterPhone is required"))]
    pub requester_phone: String,
    pub blood_group: BloodGroup,
    pub units_required: i64,
    #[validate(length(min = 1, message = "hospitalName is required"))]
    pub hospital_name: String,
    #[validate(length(min = 1, message = "hospitalAddress is required"))]
    pub hospital_address: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub urgency: Urgency,
}

impl CreateBloodRequest {
    /// Validate the body and build a new pending request
    pub fn into_request(self, now: DateTime<Utc>) -> Result<BloodRequest, ValidationError> {
        let location = GeoPoint::from_parts(self.latitude, self.longitude)?;
        validate_body(&self)?;

        let units_required = u32::try_from(self.units_required)
            .ok()
            .filter(|units| *units >= 1)
            .ok_or(ValidationError::InvalidUnits(self.units_required))?;

        Ok(BloodRequest {
            id: Uuid::new_v4(),
            requester_name: self.requester_name,
            requester_phone: self.requester_phone,
            blood_group: self.blood_group,
            units_required,
            hospital_name: self.hospital_name,
            hospital_address: self.hospital_address,
            location: location.into(),
            urgency: self.urgency,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Body of `POST /donors`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDonorRequest {
    #[validate(length(min = 1, message = "fullName is required"))]
    pub full_name: String,
    #[validate(email)]
    #[serde(default)]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    pub blood_group: BloodGroup,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub last_donation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub availability: Option<bool>,
    #[serde(default)]
    pub medical_history: Vec<String>,
}

impl RegisterDonorRequest {
    pub fn into_donor(self, now: DateTime<Utc>) -> Result<Donor, ValidationError> {
        let location = GeoPoint::from_parts(self.latitude, self.longitude)?;
        validate_body(&self)?;

        Ok(Donor {
            id: Uuid::new_v4(),
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            blood_group: self.blood_group,
            location: location.into(),
            availability: self.availability.unwrap_or(true),
            last_donation_date: self.last_donation_date,
            donation_count: 0,
            medical_history: self.medical_history,
            is_verified: false,
            created_at: now,
            updated_at: now,
            removed_at: None,
        })
    }
}

/// Body of `PATCH /donors/{id}/location`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLocationRequest {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
}

impl UpdateLocationRequest {
    pub fn to_geo_point(&self) -> Result<GeoPoint, ValidationError> {
        GeoPoint::from_parts(self.latitude, self.longitude)
    }
}

/// Body of `PATCH /donors/{id}/availability`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub availability: bool,
}

/// Body of `POST /donors/{id}/donations`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordDonationRequest {
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Body of `PATCH /requests/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

impl UpdateStatusRequest {
    pub fn parse_status(&self) -> Result<RequestStatus, ValidationError> {
        self.status.parse()
    }
}

/// Parse an optional blood group query parameter; `All` means no filter
pub fn parse_group_param(value: Option<&str>) -> Result<Option<BloodGroup>, ValidationError> {
    match value.map(str::trim_start) {
        None | Some("") => Ok(None),
        Some(v) if v.trim().eq_ignore_ascii_case("all") => Ok(None),
        Some(v) => v.parse().map(Some),
    }
}

/// Query of `GET /donors/nearby`
#[derive(Debug, Clone, Deserialize)]
pub struct NearbyDonorsQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
    #[serde(rename = "bloodGroup")]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub compatible: bool,
}

/// Query of `GET /requests/nearby`
#[derive(Debug, Clone, Deserialize)]
pub struct NearbyRequestsQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
}

/// Query of `GET /donors/filter`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterDonorsQuery {
    #[serde(rename = "bloodGroup")]
    pub blood_group: Option<String>,
    pub available: Option<bool>,
    pub eligible: Option<bool>,
}

/// Query of `GET /requests/{id}/matches`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchPreviewQuery {
    pub radius: Option<f64>,
}

/// Parse a campaign day, given either as `YYYY-MM-DD` or a full RFC 3339 timestamp
pub fn parse_day(raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc).date_naive()))
        .map_err(|_| ValidationError::Field(format!("Invalid date '{}', expected YYYY-MM-DD", raw)))
}

/// Parse the groups a campaign asks for; "All" or "All Groups" means every group
pub fn parse_group_list(values: &[String]) -> Result<Vec<BloodGroup>, ValidationError> {
    let mut groups = Vec::new();
    for value in values {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("all") || trimmed.eq_ignore_ascii_case("all groups") {
            return Ok(Vec::new());
        }
        let group: BloodGroup = value.parse()?;
        if !groups.contains(&group) {
            groups.push(group);
        }
    }
    Ok(groups)
}

/// `All`, empty or absent means no filter
fn filter_param<T: std::str::FromStr<Err = ValidationError>>(
    value: Option<&str>,
) -> Result<Option<T>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("all") => Ok(None),
        Some(v) => v.parse().map(Some),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Body of `POST /campaigns`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    pub date: String,
    #[validate(length(min = 1, message = "time is required"))]
    pub time: String,
    #[validate(length(min = 1, message = "organizer is required"))]
    pub organizer: String,
    #[serde(default)]
    pub blood_groups_needed: Vec<String>,
    #[serde(default, alias = "posterImageURL")]
    pub poster_image_url: Option<String>,
    #[serde(rename = "type")]
    pub campaign_type: CampaignType,
}

impl CreateCampaignRequest {
    pub fn into_campaign(self, now: DateTime<Utc>) -> Result<Campaign, ValidationError> {
        let location = GeoPoint::from_parts(self.latitude, self.longitude)?;
        validate_body(&self)?;

        Ok(Campaign {
            id: Uuid::new_v4(),
            date: parse_day(&self.date)?,
            blood_groups_needed: parse_group_list(&self.blood_groups_needed)?,
            title: self.title,
            description: self.description,
            city: self.city,
            address: self.address,
            location: location.into(),
            time: self.time,
            organizer: self.organizer,
            poster_image_url: non_empty(self.poster_image_url),
            campaign_type: self.campaign_type,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Body of `PUT /campaigns/{id}`; absent or empty fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCampaignRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub organizer: Option<String>,
    pub blood_groups_needed: Option<Vec<String>>,
    #[serde(default, alias = "posterImageURL")]
    pub poster_image_url: Option<String>,
    #[serde(default, rename = "type")]
    pub campaign_type: Option<CampaignType>,
}

impl UpdateCampaignRequest {
    pub fn into_patch(self) -> Result<CampaignPatch, ValidationError> {
        let location = match (self.latitude, self.longitude) {
            (None, None) => None,
            (latitude, longitude) => Some(GeoPoint::from_parts(latitude, longitude)?.into()),
        };

        Ok(CampaignPatch {
            title: non_empty(self.title),
            description: non_empty(self.description),
            city: non_empty(self.city),
            address: non_empty(self.address),
            location,
            date: non_empty(self.date).as_deref().map(parse_day).transpose()?,
            time: non_empty(self.time),
            organizer: non_empty(self.organizer),
            blood_groups_needed: self
                .blood_groups_needed
                .as_deref()
                .map(parse_group_list)
                .transpose()?,
            poster_image_url: non_empty(self.poster_image_url),
            campaign_type: self.campaign_type,
        })
    }
}

/// Query of `GET /campaigns`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListCampaignsQuery {
    pub city: Option<String>,
    #[serde(rename = "type")]
    pub campaign_type: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
}

impl ListCampaignsQuery {
    pub fn to_filter(&self) -> Result<CampaignFilter, ValidationError> {
        Ok(CampaignFilter {
            city: non_empty(self.city.clone()),
            campaign_type: filter_param::<CampaignType>(self.campaign_type.as_deref())?,
            status: filter_param::<CampaignStatus>(self.status.as_deref())?,
            date: non_empty(self.date.clone()).as_deref().map(parse_day).transpose()?,
        })
    }
}

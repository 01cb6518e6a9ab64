use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Minimum gap between two whole-blood donations
pub const DONATION_DEFERRAL_DAYS: i64 = 90;

/// Errors raised while validating input at the service boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Location (latitude and longitude) is required")]
    MissingLocation,

    #[error("Invalid latitude {0}: must be a finite value in [-90, 90]")]
    InvalidLatitude(f64),

    #[error("Invalid longitude {0}: must be a finite value in [-180, 180]")]
    InvalidLongitude(f64),

    #[error("Unknown blood group '{0}'")]
    UnknownBloodGroup(String),

    #[error("Units required must be at least 1, got {0}")]
    InvalidUnits(i64),

    #[error("Invalid radius {0} km: must be positive and at most {1} km")]
    InvalidRadius(f64, f64),

    #[error("Unknown request status '{0}'")]
    UnknownStatus(String),

    #[error("Status cannot move from {from} back to {to}")]
    BackwardTransition { from: RequestStatus, to: RequestStatus },

    #[error("{0}")]
    Field(String),
}

/// ABO/Rh blood group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APositive,
        BloodGroup::ANegative,
        BloodGroup::BPositive,
        BloodGroup::BNegative,
        BloodGroup::AbPositive,
        BloodGroup::AbNegative,
        BloodGroup::OPositive,
        BloodGroup::ONegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::AbPositive => "AB+",
            BloodGroup::AbNegative => "AB-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // A bare '+' in a query string decodes to a space
        let trimmed = s.trim_start();
        let normalized = if trimmed.len() > 1 && trimmed.ends_with(' ') {
            format!("{}+", trimmed.trim_end())
        } else {
            trimmed.trim_end().to_string()
        };

        BloodGroup::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| ValidationError::UnknownBloodGroup(s.to_string()))
    }
}

/// Validated (latitude, longitude) pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = ValidationError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.latitude, raw.longitude)
    }
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::InvalidLongitude(longitude));
        }
        Ok(Self { latitude, longitude })
    }

    /// Build a point from optional inputs, as they arrive from loosely-typed clients
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Result<Self, ValidationError> {
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => Self::new(lat, lng),
            _ => Err(ValidationError::MissingLocation),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeoJsonKind {
    Point,
}

/// Stored location in GeoJSON order: `[longitude, latitude]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonPoint {
    #[serde(rename = "type")]
    pub kind: GeoJsonKind,
    pub coordinates: [f64; 2],
}

impl GeoJsonPoint {
    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }

    pub fn to_geo_point(&self) -> Result<GeoPoint, ValidationError> {
        GeoPoint::new(self.latitude(), self.longitude())
    }
}

impl From<GeoPoint> for GeoJsonPoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            kind: GeoJsonKind::Point,
            coordinates: [point.longitude(), point.latitude()],
        }
    }
}

/// Registered blood donor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    pub id: Uuid,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub phone: String,
    pub blood_group: BloodGroup,
    pub location: GeoJsonPoint,
    pub availability: bool,
    #[serde(default)]
    pub last_donation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub donation_count: u32,
    #[serde(default)]
    pub medical_history: Vec<String>,
    #[serde(default)]
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub removed_at: Option<DateTime<Utc>>,
}

impl Donor {
    pub fn is_removed(&self) -> bool {
        self.removed_at.is_some()
    }

    /// True when the donor has never donated or the deferral period has passed
    pub fn is_eligible_at(&self, now: DateTime<Utc>) -> bool {
        match self.last_donation_date {
            Some(last) => now - last >= Duration::days(DONATION_DEFERRAL_DAYS),
            None => true,
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.is_eligible_at(Utc::now())
    }
}

/// Single change to a stored donor, applied atomically by the repository
#[derive(Debug, Clone, PartialEq)]
pub enum DonorUpdate {
    Location(GeoJsonPoint),
    Availability(bool),
    /// Record a donation made at the given time and bump the donation count
    Donation(DateTime<Utc>),
    Verified,
    Removed,
}

impl DonorUpdate {
    pub fn apply(&self, donor: &mut Donor, now: DateTime<Utc>) {
        match self {
            DonorUpdate::Location(location) => donor.location = *location,
            DonorUpdate::Availability(available) => donor.availability = *available,
            DonorUpdate::Donation(date) => {
                donor.last_donation_date = Some(*date);
                donor.donation_count = donor.donation_count.saturating_add(1);
            }
            DonorUpdate::Verified => donor.is_verified = true,
            DonorUpdate::Removed => donor.removed_at = Some(now),
        }
        donor.updated_at = now;
    }
}

/// How urgently a request has to be served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Urgency {
    #[serde(alias = "critical")]
    Critical,
    #[serde(alias = "high")]
    High,
    #[default]
    #[serde(alias = "medium")]
    Medium,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Critical => "Critical",
            Urgency::High => "High",
            Urgency::Medium => "Medium",
        }
    }
}

impl FromStr for Urgency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "critical" => Ok(Urgency::Critical),
            "high" => Ok(Urgency::High),
            "medium" => Ok(Urgency::Medium),
            other => Err(ValidationError::Field(format!("Unknown urgency '{}'", other))),
        }
    }
}

/// Request lifecycle; only ever moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Matched,
    Completed,
}

impl RequestStatus {
    fn rank(&self) -> u8 {
        match self {
            RequestStatus::Pending => 0,
            RequestStatus::Matched => 1,
            RequestStatus::Completed => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Matched => "matched",
            RequestStatus::Completed => "completed",
        }
    }

    /// Open requests are still shown to donors browsing nearby
    pub fn is_open(&self) -> bool {
        !matches!(self, RequestStatus::Completed)
    }

    pub fn transition_to(self, next: RequestStatus) -> Result<RequestStatus, ValidationError> {
        if next.rank() < self.rank() {
            return Err(ValidationError::BackwardTransition { from: self, to: next });
        }
        Ok(next)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(RequestStatus::Pending),
            "matched" => Ok(RequestStatus::Matched),
            "completed" => Ok(RequestStatus::Completed),
            _ => Err(ValidationError::UnknownStatus(s.to_string())),
        }
    }
}

/// Blood request raised by a patient or hospital
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequest {
    pub id: Uuid,
    pub requester_name: String,
    pub requester_phone: String,
    pub blood_group: BloodGroup,
    pub units_required: u32,
    pub hospital_name: String,
    pub hospital_address: String,
    pub location: GeoJsonPoint,
    pub urgency: Urgency,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A donor that qualified for a request, with its distance from the hospital
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub donor: Donor,
    pub distance_km: f64,
    pub compatible: bool,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Which donor groups a proximity search accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupFilter {
    Any,
    Exact(BloodGroup),
    CompatibleWith(BloodGroup),
}

/// Candidate lookup handed to the donor repository
#[derive(Debug, Clone)]
pub struct DonorQuery {
    pub bounding_box: BoundingBox,
    /// Empty means every group
    pub groups: Vec<BloodGroup>,
    pub available_only: bool,
}

/// Candidate lookup handed to the request repository
#[derive(Debug, Clone)]
pub struct RequestQuery {
    pub bounding_box: BoundingBox,
    pub statuses: Vec<RequestStatus>,
}

/// Browse filter for the donor listing
#[derive(Debug, Clone, Default)]
pub struct DonorFilter {
    pub blood_group: Option<BloodGroup>,
    pub available: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blood_group_parsing() {
        assert_eq!("AB-".parse::<BloodGroup>().unwrap(), BloodGroup::AbNegative);
        assert_eq!("o+".parse::<BloodGroup>().unwrap(), BloodGroup::OPositive);
        assert_eq!("A ".parse::<BloodGroup>().unwrap(), BloodGroup::APositive);
        assert!(matches!(
            "C+".parse::<BloodGroup>(),
            Err(ValidationError::UnknownBloodGroup(_))
        ));
    }

    #[test]
    fn test_blood_group_serde_uses_symbols() {
        let json = serde_json::to_string(&BloodGroup::ONegative).unwrap();
        assert_eq!(json, "\"O-\"");
        let parsed: BloodGroup = serde_json::from_str("\"AB+\"").unwrap();
        assert_eq!(parsed, BloodGroup::AbPositive);
    }

    #[test]
    fn test_geo_point_rejects_out_of_range() {
        assert!(GeoPoint::new(28.6, 77.2).is_ok());
        assert_eq!(GeoPoint::new(91.0, 0.0), Err(ValidationError::InvalidLatitude(91.0)));
        assert_eq!(GeoPoint::new(0.0, -180.5), Err(ValidationError::InvalidLongitude(-180.5)));
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert_eq!(GeoPoint::from_parts(Some(1.0), None), Err(ValidationError::MissingLocation));
    }

    #[test]
    fn test_geojson_is_longitude_first() {
        let point = GeoPoint::new(28.6139, 77.2090).unwrap();
        let stored = GeoJsonPoint::from(point);
        assert_eq!(stored.coordinates, [77.2090, 28.6139]);

        let json = serde_json::to_value(stored).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(stored.to_geo_point().unwrap(), point);
    }

    #[test]
    fn test_status_moves_forward_only() {
        assert_eq!(
            RequestStatus::Pending.transition_to(RequestStatus::Matched),
            Ok(RequestStatus::Matched)
        );
        assert_eq!(
            RequestStatus::Pending.transition_to(RequestStatus::Completed),
            Ok(RequestStatus::Completed)
        );
        assert_eq!(
            RequestStatus::Matched.transition_to(RequestStatus::Matched),
            Ok(RequestStatus::Matched)
        );
        assert!(RequestStatus::Completed
            .transition_to(RequestStatus::Pending)
            .is_err());
    }

    #[test]
    fn test_donor_update_touches_one_field() {
        let now = Utc::now();
        let mut donor = Donor {
            id: Uuid::new_v4(),
            full_name: "Asha".to_string(),
            email: None,
            phone: "9000000000".to_string(),
            blood_group: BloodGroup::BPositive,
            location: GeoPoint::new(0.0, 0.0).unwrap().into(),
            availability: true,
            last_donation_date: None,
            donation_count: 4,
            medical_history: vec![],
            is_verified: false,
            created_at: now,
            updated_at: now,
            removed_at: None,
        };

        let donated = now - Duration::days(2);
        DonorUpdate::Donation(donated).apply(&mut donor, now);
        assert_eq!(donor.donation_count, 5);
        assert_eq!(donor.last_donation_date, Some(donated));
        assert!(donor.availability);

        DonorUpdate::Availability(false).apply(&mut donor, now);
        assert!(!donor.availability);
        assert_eq!(donor.donation_count, 5);

        DonorUpdate::Removed.apply(&mut donor, now);
        assert!(donor.is_removed());
    }

    #[test]
    fn test_eligibility_window() {
        let now = Utc::now();
        let mut donor = Donor {
            id: Uuid::new_v4(),
            full_name: "Asha".to_string(),
            email: None,
            phone: "9000000000".to_string(),
            blood_group: BloodGroup::BPositive,
            location: GeoPoint::new(0.0, 0.0).unwrap().into(),
            availability: true,
            last_donation_date: None,
            donation_count: 0,
            medical_history: vec![],
            is_verified: false,
            created_at: now,
            updated_at: now,
            removed_at: None,
        };
        assert!(donor.is_eligible_at(now));

        donor.last_donation_date = Some(now - Duration::days(30));
        assert!(!donor.is_eligible_at(now));

        donor.last_donation_date = Some(now - Duration::days(DONATION_DEFERRAL_DAYS));
        assert!(donor.is_eligible_at(now));
    }
}

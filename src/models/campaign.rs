use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::domain::{BloodGroup, GeoJsonPoint, ValidationError};

/// Kind of blood-donation campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampaignType {
    #[serde(rename = "Blood Drive")]
    BloodDrive,
    #[serde(rename = "Emergency Camp")]
    EmergencyCamp,
    #[serde(rename = "Awareness")]
    Awareness,
}

impl CampaignType {
    pub const ALL: [CampaignType; 3] = [
        CampaignType::BloodDrive,
        CampaignType::EmergencyCamp,
        CampaignType::Awareness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignType::BloodDrive => "Blood Drive",
            CampaignType::EmergencyCamp => "Emergency Camp",
            CampaignType::Awareness => "Awareness",
        }
    }
}

impl fmt::Display for CampaignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CampaignType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::Field(format!("Unknown campaign type '{}'", s)))
    }
}

/// Where a campaign stands relative to today; derived from its date, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampaignStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl CampaignStatus {
    /// Status of a campaign held on `date`, as seen on `today`
    pub fn on(date: NaiveDate, today: NaiveDate) -> Self {
        match date.cmp(&today) {
            Ordering::Greater => CampaignStatus::Upcoming,
            Ordering::Equal => CampaignStatus::Ongoing,
            Ordering::Less => CampaignStatus::Completed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Upcoming => "Upcoming",
            CampaignStatus::Ongoing => "Ongoing",
            CampaignStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Ok(CampaignStatus::Upcoming),
            "ongoing" => Ok(CampaignStatus::Ongoing),
            "completed" => Ok(CampaignStatus::Completed),
            _ => Err(ValidationError::Field(format!("Unknown campaign status '{}'", s))),
        }
    }
}

/// Blood-donation camp or drive held at one place on one day
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub city: String,
    pub address: String,
    pub location: GeoJsonPoint,
    pub date: NaiveDate,
    /// Free-form opening hours, e.g. "09:00 AM - 05:00 PM"
    pub time: String,
    pub organizer: String,
    /// Empty means every group is welcome
    #[serde(default)]
    pub blood_groups_needed: Vec<BloodGroup>,
    #[serde(default)]
    pub poster_image_url: Option<String>,
    pub campaign_type: CampaignType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn status_on(&self, today: NaiveDate) -> CampaignStatus {
        CampaignStatus::on(self.date, today)
    }
}

/// Browse filter for the campaign listing
#[derive(Debug, Clone, Default)]
pub struct CampaignFilter {
    /// Case-insensitive substring of the city
    pub city: Option<String>,
    pub campaign_type: Option<CampaignType>,
    pub status: Option<CampaignStatus>,
    pub date: Option<NaiveDate>,
}

/// Partial campaign update; `None` fields keep their stored value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub location: Option<GeoJsonPoint>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub organizer: Option<String>,
    pub blood_groups_needed: Option<Vec<BloodGroup>>,
    pub poster_image_url: Option<String>,
    pub campaign_type: Option<CampaignType>,
}

impl CampaignPatch {
    pub fn apply(&self, campaign: &mut Campaign, now: DateTime<Utc>) {
        fn set<T: Clone>(field: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *field = value.clone();
            }
        }

        set(&mut campaign.title, &self.title);
        set(&mut campaign.description, &self.description);
        set(&mut campaign.city, &self.city);
        set(&mut campaign.address, &self.address);
        set(&mut campaign.location, &self.location);
        set(&mut campaign.date, &self.date);
        set(&mut campaign.time, &self.time);
        set(&mut campaign.organizer, &self.organizer);
        set(&mut campaign.blood_groups_needed, &self.blood_groups_needed);
        set(&mut campaign.campaign_type, &self.campaign_type);
        if self.poster_image_url.is_some() {
            campaign.poster_image_url = self.poster_image_url.clone();
        }
        campaign.updated_at = now;
    }
}

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::core::filters::{
    matches_campaign_filter, matches_donor_filter, matches_donor_query, matches_request_query,
};
use crate::models::{
    BloodRequest, Campaign, CampaignFilter, CampaignPatch, Donor, DonorFilter, DonorQuery, DonorUpdate, RequestQuery, RequestStatus,
    ValidationError,
};

/// Errors raised by donor and request storage
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid update: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Donor storage used by the matcher and the registry endpoints
///
/// Removed donors are invisible to every read.
#[async_trait]
pub trait DonorRepository: Send + Sync {
    async fn insert_donor(&self, donor: Donor) -> Result<Donor, RepositoryError>;

    async fn get_donor(&self, id: Uuid) -> Result<Donor, RepositoryError>;

    /// Apply one change in place and return the updated donor
    ///
    /// Fails with `NotFound` for unknown or removed ids. Concurrent updates to
    /// different fields never overwrite each other.
    async fn update_donor(&self, id: Uuid, update: DonorUpdate) -> Result<Donor, RepositoryError>;

    async fn list_donors(&self, filter: &DonorFilter) -> Result<Vec<Donor>, RepositoryError>;

    /// Snapshot of candidate donors inside the query's bounding box
    async fn find_candidates(&self, query: &DonorQuery) -> Result<Vec<Donor>, RepositoryError>;

    async fn health_check(&self) -> Result<bool, RepositoryError>;
}

/// Blood request storage
#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn insert_request(&self, request: BloodRequest) -> Result<BloodRequest, RepositoryError>;

    async fn get_request(&self, id: Uuid) -> Result<BloodRequest, RepositoryError>;

    /// All requests, newest first
    async fn list_requests(&self) -> Result<Vec<BloodRequest>, RepositoryError>;

    async fn find_requests(&self, query: &RequestQuery) -> Result<Vec<BloodRequest>, RepositoryError>;

    /// Move a request forward in its lifecycle; backward moves are rejected atomically
    async fn update_status(
        &self,
        id: Uuid,
        status: RequestStatus,
    ) -> Result<BloodRequest, RepositoryError>;
}

/// Donation campaign storage
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    async fn insert_campaign(&self, campaign: Campaign) -> Result<Campaign, RepositoryError>;

    async fn get_campaign(&self, id: Uuid) -> Result<Campaign, RepositoryError>;

    /// Campaigns accepted by `filter`, soonest first; status is judged as of `today`
    async fn list_campaigns(
        &self,
        filter: &CampaignFilter,
        today: NaiveDate,
    ) -> Result<Vec<Campaign>, RepositoryError>;

    /// Apply a partial update in place and return the stored campaign
    async fn update_campaign(&self, id: Uuid, patch: CampaignPatch) -> Result<Campaign, RepositoryError>;

    async fn delete_campaign(&self, id: Uuid) -> Result<(), RepositoryError>;
}

fn donor_not_found(id: Uuid) -> RepositoryError {
    RepositoryError::NotFound(format!("Donor {} not found", id))
}

fn request_not_found(id: Uuid) -> RepositoryError {
    RepositoryError::NotFound(format!("Request {} not found", id))
}

fn campaign_not_found(id: Uuid) -> RepositoryError {
    RepositoryError::NotFound(format!("Campaign {} not found", id))
}

/// Process-local store, used for development and tests
#[derive(Default)]
pub struct InMemoryRepository {
    donors: RwLock<HashMap<Uuid, Donor>>,
    requests: RwLock<HashMap<Uuid, BloodRequest>>,
    campaigns: RwLock<HashMap<Uuid, Campaign>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DonorRepository for InMemoryRepository {
    async fn insert_donor(&self, donor: Donor) -> Result<Donor, RepositoryError> {
        self.donors.write().insert(donor.id, donor.clone());
        tracing::debug!(donor_id = %donor.id, "Stored donor");
        Ok(donor)
    }

    async fn get_donor(&self, id: Uuid) -> Result<Donor, RepositoryError> {
        self.donors
            .read()
            .get(&id)
            .filter(|d| !d.is_removed())
            .cloned()
            .ok_or_else(|| donor_not_found(id))
    }

    async fn update_donor(&self, id: Uuid, update: DonorUpdate) -> Result<Donor, RepositoryError> {
        let mut donors = self.donors.write();
        let donor = donors
            .get_mut(&id)
            .filter(|d| !d.is_removed())
            .ok_or_else(|| donor_not_found(id))?;

        update.apply(donor, Utc::now());
        Ok(donor.clone())
    }

    async fn list_donors(&self, filter: &DonorFilter) -> Result<Vec<Donor>, RepositoryError> {
        let mut donors: Vec<Donor> = self
            .donors
            .read()
            .values()
            .filter(|d| matches_donor_filter(d, filter))
            .cloned()
            .collect();
        donors.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(donors)
    }

    async fn find_candidates(&self, query: &DonorQuery) -> Result<Vec<Donor>, RepositoryError> {
        Ok(self
            .donors
            .read()
            .values()
            .filter(|d| matches_donor_query(d, query))
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<bool, RepositoryError> {
        Ok(true)
    }
}

#[async_trait]
impl RequestRepository for InMemoryRepository {
    async fn insert_request(&self, request: BloodRequest) -> Result<BloodRequest, RepositoryError> {
        self.requests.write().insert(request.id, request.clone());
        tracing::debug!(request_id = %request.id, "Stored blood request");
        Ok(request)
    }

    async fn get_request(&self, id: Uuid) -> Result<BloodRequest, RepositoryError> {
        self.requests
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| request_not_found(id))
    }

    async fn list_requests(&self) -> Result<Vec<BloodRequest>, RepositoryError> {
        let mut requests: Vec<BloodRequest> = self.requests.read().values().cloned().collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(requests)
    }

    async fn find_requests(&self, query: &RequestQuery) -> Result<Vec<BloodRequest>, RepositoryError> {
        Ok(self
            .requests
            .read()
            .values()
            .filter(|r| matches_request_query(r, query))
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: RequestStatus,
    ) -> Result<BloodRequest, RepositoryError> {
        let mut requests = self.requests.write();
        let request = requests.get_mut(&id).ok_or_else(|| request_not_found(id))?;

        let next = request.status.transition_to(status)?;
        if next != request.status {
            request.status = next;
            request.updated_at = Utc::now();
        }
        Ok(request.clone())
    }
}

#[async_trait]
impl CampaignRepository for InMemoryRepository {
    async fn insert_campaign(&self, campaign: Campaign) -> Result<Campaign, RepositoryError> {
        self.campaigns.write().insert(campaign.id, campaign.clone());
        tracing::debug!(campaign_id = %campaign.id, "Stored campaign");
        Ok(campaign)
    }

    async fn get_campaign(&self, id: Uuid) -> Result<Campaign, RepositoryError> {
        self.campaigns
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| campaign_not_found(id))
    }

    async fn list_campaigns(
        &self,
        filter: &CampaignFilter,
        today: NaiveDate,
    ) -> Result<Vec<Campaign>, RepositoryError> {
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .read()
            .values()
            .filter(|c| matches_campaign_filter(c, filter, today))
            .cloned()
            .collect();
        campaigns.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(campaigns)
    }

    async fn update_campaign(&self, id: Uuid, patch: CampaignPatch) -> Result<Campaign, RepositoryError> {
        let mut campaigns = self.campaigns.write();
        let campaign = campaigns.get_mut(&id).ok_or_else(|| campaign_not_found(id))?;

        patch.apply(campaign, Utc::now());
        Ok(campaign.clone())
    }

    async fn delete_campaign(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.campaigns
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| campaign_not_found(id))
    }
}

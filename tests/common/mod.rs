// Donor stores that fail, shared by the integration and HTTP tests
#![allow(dead_code)]

use async_trait::async_trait;
use rakht_setu::models::{Donor, DonorFilter, DonorQuery, DonorUpdate};
use rakht_setu::services::{DonorRepository, RepositoryError};
use uuid::Uuid;

fn offline() -> RepositoryError {
    RepositoryError::SqlxError(sqlx::Error::PoolTimedOut)
}

/// Every call fails as if the database were down
pub struct UnreachableDonors;

#[async_trait]
impl DonorRepository for UnreachableDonors {
    async fn insert_donor(&self, _donor: Donor) -> Result<Donor, RepositoryError> {
        Err(offline())
    }

    async fn get_donor(&self, _id: Uuid) -> Result<Donor, RepositoryError> {
        Err(offline())
    }

    async fn update_donor(&self, _id: Uuid, _update: DonorUpdate) -> Result<Donor, RepositoryError> {
        Err(offline())
    }

    async fn list_donors(&self, _filter: &DonorFilter) -> Result<Vec<Donor>, RepositoryError> {
        Err(offline())
    }

    async fn find_candidates(&self, _query: &DonorQuery) -> Result<Vec<Donor>, RepositoryError> {
        Err(offline())
    }

    async fn health_check(&self) -> Result<bool, RepositoryError> {
        Err(offline())
    }
}

/// Candidate lookups never complete
pub struct StalledDonors;

#[async_trait]
impl DonorRepository for StalledDonors {
    async fn insert_donor(&self, donor: Donor) -> Result<Donor, RepositoryError> {
        Ok(donor)
    }

    async fn get_donor(&self, id: Uuid) -> Result<Donor, RepositoryError> {
        Err(RepositoryError::NotFound(format!("Donor {} not found", id)))
    }

    async fn update_donor(&self, id: Uuid, _update: DonorUpdate) -> Result<Donor, RepositoryError> {
        Err(RepositoryError::NotFound(format!("Donor {} not found", id)))
    }

    async fn list_donors(&self, _filter: &DonorFilter) -> Result<Vec<Donor>, RepositoryError> {
        Ok(Vec::new())
    }

    async fn find_candidates(&self, _query: &DonorQuery) -> Result<Vec<Donor>, RepositoryError> {
        std::future::pending().await
    }

    async fn health_check(&self) -> Result<bool, RepositoryError> {
        Ok(true)
    }
}

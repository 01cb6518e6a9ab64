use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::core::{
    compatibility::can_donate_to,
    distance::{calculate_bounding_box, distance_km},
    filters::{groups_for, is_match_candidate},
};
use crate::models::{
    BloodRequest, Donor, DonorQuery, GeoJsonPoint, GeoPoint, GroupFilter, MatchResult,
    RequestQuery, RequestStatus, ValidationError,
};
use crate::services::repository::{DonorRepository, RepositoryError, RequestRepository};

/// Default radius for "find nearby donors" browsing
pub const DEFAULT_NEARBY_DONOR_RADIUS_KM: f64 = 10.0;

/// Default radius for alerting donors about a new request
pub const DEFAULT_BROADCAST_RADIUS_KM: f64 = 10.0;

/// Default radius for donors browsing open requests
pub const DEFAULT_NEARBY_REQUEST_RADIUS_KM: f64 = 50.0;

/// Largest radius a caller may ask for
pub const DEFAULT_MAX_RADIUS_KM: f64 = 500.0;

/// Errors surfaced by a proximity search
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Lookup failed: {0}")]
    Lookup(#[from] RepositoryError),

    #[error("Lookup timed out after {0:?}")]
    Timeout(Duration),
}

/// Search radii; the three defaults are deliberately independent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRadii {
    pub nearby_donor_km: f64,
    pub broadcast_km: f64,
    pub nearby_request_km: f64,
    pub max_km: f64,
}

impl Default for SearchRadii {
    fn default() -> Self {
        Self {
            nearby_donor_km: DEFAULT_NEARBY_DONOR_RADIUS_KM,
            broadcast_km: DEFAULT_BROADCAST_RADIUS_KM,
            nearby_request_km: DEFAULT_NEARBY_REQUEST_RADIUS_KM,
            max_km: DEFAULT_MAX_RADIUS_KM,
        }
    }
}

impl SearchRadii {
    /// Resolve a caller-supplied radius, falling back to `default_km`
    pub fn resolve(&self, requested: Option<f64>, default_km: f64) -> Result<f64, ValidationError> {
        let radius = requested.unwrap_or(default_km);
        if !radius.is_finite() || radius <= 0.0 || radius > self.max_km {
            return Err(ValidationError::InvalidRadius(radius, self.max_km));
        }
        Ok(radius)
    }
}

/// Keep items within `radius_km` of `origin`, nearest first, ties broken by id
fn within_radius<T>(
    origin: &GeoPoint,
    radius_km: f64,
    items: Vec<T>,
    location: impl Fn(&T) -> &GeoJsonPoint,
    id: impl Fn(&T) -> Uuid,
) -> Vec<(T, f64)> {
    let mut ranked: Vec<(T, f64)> = items
        .into_iter()
        .filter_map(|item| match location(&item).to_geo_point() {
            Ok(point) => {
                let distance = distance_km(origin, &point);
                (distance <= radius_km).then_some((item, distance))
            }
            Err(e) => {
                tracing::warn!(id = %id(&item), error = %e, "Skipping record with invalid stored location");
                None
            }
        })
        .collect();

    ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| id(&a.0).cmp(&id(&b.0))));
    ranked
}

/// Rank a candidate snapshot: filter by group policy, availability and radius, nearest first
///
/// Candidates are re-checked here so the result holds even when the repository
/// returns a superset of what was asked.
pub fn rank_donors(
    origin: &GeoPoint,
    radius_km: f64,
    filter: &GroupFilter,
    candidates: Vec<Donor>,
) -> Vec<MatchResult> {
    let eligible: Vec<Donor> = candidates
        .into_iter()
        .filter(|donor| is_match_candidate(donor, filter))
        .collect();

    within_radius(origin, radius_km, eligible, |d| &d.location, |d| d.id)
        .into_iter()
        .map(|(donor, distance_km)| {
            let compatible = match filter {
                GroupFilter::Any => true,
                GroupFilter::Exact(recipient) | GroupFilter::CompatibleWith(recipient) => {
                    can_donate_to(donor.blood_group, *recipient)
                }
            };
            MatchResult {
                donor,
                distance_km,
                compatible,
            }
        })
        .collect()
}

/// Donor matcher: compatible, available donors within a radius, nearest first
///
/// # Pipeline Stages
/// 1. Resolve the acceptable donor groups
/// 2. Bounding-box candidate lookup through the repository
/// 3. Haversine distance and radius cut
/// 4. Sort by distance, then donor id
#[derive(Clone)]
pub struct DonorMatcher {
    donors: Arc<dyn DonorRepository>,
    lookup_timeout: Duration,
}

impl DonorMatcher {
    pub fn new(donors: Arc<dyn DonorRepository>, lookup_timeout: Duration) -> Self {
        Self {
            donors,
            lookup_timeout,
        }
    }

    /// Donors that can give blood for `request`, within `radius_km` of its hospital
    pub async fn find_matches(
        &self,
        request: &BloodRequest,
        radius_km: f64,
    ) -> Result<Vec<MatchResult>, MatchError> {
        let origin = request.location.to_geo_point()?;
        let matches = self
            .find_nearby(&origin, radius_km, GroupFilter::CompatibleWith(request.blood_group))
            .await?;

        tracing::info!(
            request_id = %request.id,
            blood_group = %request.blood_group,
            radius_km,
            matches = matches.len(),
            "Matched donors for request"
        );

        Ok(matches)
    }

    /// Available donors around `origin` accepted by `filter`
    pub async fn find_nearby(
        &self,
        origin: &GeoPoint,
        radius_km: f64,
        filter: GroupFilter,
    ) -> Result<Vec<MatchResult>, MatchError> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(ValidationError::InvalidRadius(radius_km, f64::INFINITY).into());
        }

        let query = DonorQuery {
            bounding_box: calculate_bounding_box(origin, radius_km),
            groups: groups_for(&filter),
            available_only: true,
        };

        let candidates = tokio::time::timeout(self.lookup_timeout, self.donors.find_candidates(&query))
            .await
            .map_err(|_| MatchError::Timeout(self.lookup_timeout))??;

        tracing::debug!(candidates = candidates.len(), radius_km, "Fetched donor candidates");

        Ok(rank_donors(origin, radius_km, &filter, candidates))
    }
}

/// Finds open blood requests around a donor
#[derive(Clone)]
pub struct RequestLocator {
    requests: Arc<dyn RequestRepository>,
    lookup_timeout: Duration,
}

impl RequestLocator {
    pub fn new(requests: Arc<dyn RequestRepository>, lookup_timeout: Duration) -> Self {
        Self {
            requests,
            lookup_timeout,
        }
    }

    /// Pending and matched requests within `radius_km`, nearest first
    pub async fn find_nearby(
        &self,
        origin: &GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<(BloodRequest, f64)>, MatchError> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(ValidationError::InvalidRadius(radius_km, f64::INFINITY).into());
        }

        let query = RequestQuery {
            bounding_box: calculate_bounding_box(origin, radius_km),
            statuses: vec![RequestStatus::Pending, RequestStatus::Matched],
        };

        let candidates = tokio::time::timeout(self.lookup_timeout, self.requests.find_requests(&query))
            .await
            .map_err(|_| MatchError::Timeout(self.lookup_timeout))??;

        let open: Vec<BloodRequest> = candidates.into_iter().filter(|r| r.status.is_open()).collect();

        Ok(within_radius(origin, radius_km, open, |r| &r.location, |r| r.id))
    }
}

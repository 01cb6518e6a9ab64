use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::models::{
    BloodGroup, BloodRequest, Campaign, CampaignFilter, CampaignPatch, CampaignType, Donor, DonorFilter, DonorQuery, DonorUpdate, GeoJsonKind,
    GeoJsonPoint, RequestQuery, RequestStatus, Urgency,
};
use crate::services::repository::{
    CampaignRepository, DonorRepository, RepositoryError, RequestRepository,
};

const DONOR_COLUMNS: &str = "id, full_name, email, phone, blood_group, location, availability, \
     last_donation_date, donation_count, medical_history, is_verified, created_at, updated_at, removed_at";

const REQUEST_COLUMNS: &str = "id, requester_name, requester_phone, blood_group, units_required, \
     hospital_name, hospital_address, location, urgency, status, created_at, updated_at";

const CAMPAIGN_COLUMNS: &str = "id, title, description, city, address, location, campaign_date, \
     time_slot, organizer, blood_groups_needed, poster_image_url, campaign_type, created_at, updated_at";

/// PostgreSQL-backed donor, request and campaign store
///
/// Locations are stored as a `[longitude, latitude]` array, the same order as
/// the GeoJSON documents the API exposes. Candidate lookups push the bounding
/// box and the acceptable blood groups down into SQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Connect and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a repository from the optional database settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, RepositoryError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

fn corrupt(id: Uuid, what: &str, value: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Corrupt(format!("{} has invalid {}: {}", id, what, value))
}

fn location_from_column(id: Uuid, coordinates: Vec<f64>) -> Result<GeoJsonPoint, RepositoryError> {
    match coordinates.as_slice() {
        [lng, lat] => Ok(GeoJsonPoint {
            kind: GeoJsonKind::Point,
            coordinates: [*lng, *lat],
        }),
        _ => Err(corrupt(id, "location", format!("{:?}", coordinates))),
    }
}

fn parse_column<T: FromStr>(id: Uuid, what: &str, raw: String) -> Result<T, RepositoryError> {
    raw.parse().map_err(|_| corrupt(id, what, raw))
}

fn donor_from_row(row: &PgRow) -> Result<Donor, RepositoryError> {
    let id: Uuid = row.try_get("id")?;
    let donation_count: i64 = row.try_get("donation_count")?;

    Ok(Donor {
        id,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        blood_group: parse_column::<BloodGroup>(id, "blood group", row.try_get("blood_group")?)?,
        location: location_from_column(id, row.try_get("location")?)?,
        availability: row.try_get("availability")?,
        last_donation_date: row.try_get("last_donation_date")?,
        donation_count: u32::try_from(donation_count)
            .map_err(|_| corrupt(id, "donation count", donation_count))?,
        medical_history: row.try_get("medical_history")?,
        is_verified: row.try_get("is_verified")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        removed_at: row.try_get("removed_at")?,
    })
}

fn request_from_row(row: &PgRow) -> Result<BloodRequest, RepositoryError> {
    let id: Uuid = row.try_get("id")?;
    let units: i64 = row.try_get("units_required")?;

    Ok(BloodRequest {
        id,
        requester_name: row.try_get("requester_name")?,
        requester_phone: row.try_get("requester_phone")?,
        blood_group: parse_column::<BloodGroup>(id, "blood group", row.try_get("blood_group")?)?,
        units_required: u32::try_from(units).map_err(|_| corrupt(id, "units", units))?,
        hospital_name: row.try_get("hospital_name")?,
        hospital_address: row.try_get("hospital_address")?,
        location: location_from_column(id, row.try_get("location")?)?,
        urgency: parse_column::<Urgency>(id, "urgency", row.try_get("urgency")?)?,
        status: parse_column::<RequestStatus>(id, "status", row.try_get("status")?)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn campaign_from_row(row: &PgRow) -> Result<Campaign, RepositoryError> {
    let id: Uuid = row.try_get("id")?;
    let groups: Vec<String> = row.try_get("blood_groups_needed")?;

    Ok(Campaign {
        id,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        city: row.try_get("city")?,
        address: row.try_get("address")?,
        location: location_from_column(id, row.try_get("location")?)?,
        date: row.try_get("campaign_date")?,
        time: row.try_get("time_slot")?,
        organizer: row.try_get("organizer")?,
        blood_groups_needed: groups
            .into_iter()
            .map(|g| parse_column::<BloodGroup>(id, "blood group", g))
            .collect::<Result<_, _>>()?,
        poster_image_url: row.try_get("poster_image_url")?,
        campaign_type: parse_column::<CampaignType>(id, "campaign type", row.try_get("campaign_type")?)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// ILIKE pattern matching `needle` anywhere, with its own wildcards escaped
fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn group_names(groups: &[BloodGroup]) -> Vec<String> {
    groups.iter().map(|g| g.as_str().to_string()).collect()
}

#[async_trait]
impl DonorRepository for PostgresRepository {
    async fn insert_donor(&self, donor: Donor) -> Result<Donor, RepositoryError> {
        let query = r#"
            INSERT INTO donors (
                id, full_name, email, phone, blood_group, location, availability,
                last_donation_date, donation_count, medical_history, is_verified,
                created_at, updated_at, removed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#;

        sqlx::query(query)
            .bind(donor.id)
            .bind(&donor.full_name)
            .bind(&donor.email)
            .bind(&donor.phone)
            .bind(donor.blood_group.as_str())
            .bind(donor.location.coordinates.to_vec())
            .bind(donor.availability)
            .bind(donor.last_donation_date)
            .bind(i64::from(donor.donation_count))
            .bind(&donor.medical_history)
            .bind(donor.is_verified)
            .bind(donor.created_at)
            .bind(donor.updated_at)
            .bind(donor.removed_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!(donor_id = %donor.id, "Inserted donor");
        Ok(donor)
    }

    async fn get_donor(&self, id: Uuid) -> Result<Donor, RepositoryError> {
        let query = format!(
            "SELECT {} FROM donors WHERE id = $1 AND removed_at IS NULL",
            DONOR_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Donor {} not found", id)))?;

        donor_from_row(&row)
    }

    async fn update_donor(&self, id: Uuid, update: DonorUpdate) -> Result<Donor, RepositoryError> {
        // Each change touches only its own columns, so concurrent updates compose
        let assignment = match &update {
            DonorUpdate::Location(_) => "location = $3",
            DonorUpdate::Availability(_) => "availability = $3",
            DonorUpdate::Donation(_) => "last_donation_date = $3, donation_count = donation_count + 1",
            DonorUpdate::Verified => "is_verified = TRUE",
            DonorUpdate::Removed => "removed_at = $2",
        };

        let sql = format!(
            "UPDATE donors SET {}, updated_at = $2 WHERE id = $1 AND removed_at IS NULL RETURNING {}",
            assignment, DONOR_COLUMNS
        );

        let query = sqlx::query(&sql).bind(id).bind(Utc::now());
        let query = match update {
            DonorUpdate::Location(location) => query.bind(location.coordinates.to_vec()),
            DonorUpdate::Availability(available) => query.bind(available),
            DonorUpdate::Donation(date) => query.bind(date),
            DonorUpdate::Verified | DonorUpdate::Removed => query,
        };

        let row = query
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Donor {} not found", id)))?;

        tracing::debug!(donor_id = %id, "Updated donor");
        donor_from_row(&row)
    }

    async fn list_donors(&self, filter: &DonorFilter) -> Result<Vec<Donor>, RepositoryError> {
        let query = format!(
            r#"
            SELECT {}
            FROM donors
            WHERE removed_at IS NULL
              AND ($1::text IS NULL OR blood_group = $1)
              AND ($2::boolean IS NULL OR availability = $2)
            ORDER BY created_at, id
            "#,
            DONOR_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(filter.blood_group.map(|g| g.as_str()))
            .bind(filter.available)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(donor_from_row).collect()
    }

    async fn find_candidates(&self, query: &DonorQuery) -> Result<Vec<Donor>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM donors
            WHERE removed_at IS NULL
              AND ($1::boolean = FALSE OR availability = TRUE)
              AND (cardinality($2::text[]) = 0 OR blood_group = ANY($2))
              AND location[2] BETWEEN $3 AND $4
              AND location[1] BETWEEN $5 AND $6
            "#,
            DONOR_COLUMNS
        );

        let groups: Vec<String> = query.groups.iter().map(|g| g.as_str().to_string()).collect();
        let bbox = &query.bounding_box;

        let rows = sqlx::query(&sql)
            .bind(query.available_only)
            .bind(groups)
            .bind(bbox.min_lat)
            .bind(bbox.max_lat)
            .bind(bbox.min_lon)
            .bind(bbox.max_lon)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("Fetched {} donor candidates from PostgreSQL", rows.len());

        rows.iter().map(donor_from_row).collect()
    }

    async fn health_check(&self) -> Result<bool, RepositoryError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl RequestRepository for PostgresRepository {
    async fn insert_request(&self, request: BloodRequest) -> Result<BloodRequest, RepositoryError> {
        let query = r#"
            INSERT INTO blood_requests (
                id, requester_name, requester_phone, blood_group, units_required,
                hospital_name, hospital_address, location, urgency, status,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#;

        sqlx::query(query)
            .bind(request.id)
            .bind(&request.requester_name)
            .bind(&request.requester_phone)
            .bind(request.blood_group.as_str())
            .bind(i64::from(request.units_required))
            .bind(&request.hospital_name)
            .bind(&request.hospital_address)
            .bind(request.location.coordinates.to_vec())
            .bind(request.urgency.as_str())
            .bind(request.status.as_str())
            .bind(request.created_at)
            .bind(request.updated_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!(request_id = %request.id, "Inserted blood request");
        Ok(request)
    }

    async fn get_request(&self, id: Uuid) -> Result<BloodRequest, RepositoryError> {
        let query = format!("SELECT {} FROM blood_requests WHERE id = $1", REQUEST_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Request {} not found", id)))?;

        request_from_row(&row)
    }

    async fn list_requests(&self) -> Result<Vec<BloodRequest>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM blood_requests ORDER BY created_at DESC, id",
            REQUEST_COLUMNS
        );

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter().map(request_from_row).collect()
    }

    async fn find_requests(&self, query: &RequestQuery) -> Result<Vec<BloodRequest>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM blood_requests
            WHERE (cardinality($1::text[]) = 0 OR status = ANY($1))
              AND location[2] BETWEEN $2 AND $3
              AND location[1] BETWEEN $4 AND $5
            "#,
            REQUEST_COLUMNS
        );

        let statuses: Vec<String> = query.statuses.iter().map(|s| s.as_str().to_string()).collect();
        let bbox = &query.bounding_box;

        let rows = sqlx::query(&sql)
            .bind(statuses)
            .bind(bbox.min_lat)
            .bind(bbox.max_lat)
            .bind(bbox.min_lon)
            .bind(bbox.max_lon)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(request_from_row).collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: RequestStatus,
    ) -> Result<BloodRequest, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let select = format!(
            "SELECT {} FROM blood_requests WHERE id = $1 FOR UPDATE",
            REQUEST_COLUMNS
        );
        let row = sqlx::query(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Request {} not found", id)))?;

        let mut request = request_from_row(&row)?;
        let next = request.status.transition_to(status)?;

        if next != request.status {
            let updated_at: DateTime<Utc> = Utc::now();
            sqlx::query("UPDATE blood_requests SET status = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(next.as_str())
                .bind(updated_at)
                .execute(&mut *tx)
                .await?;

            request.status = next;
            request.updated_at = updated_at;
        }

        tx.commit().await?;

        tracing::debug!(request_id = %id, status = %request.status, "Updated request status");
        Ok(request)
    }
}

#[async_trait]
impl CampaignRepository for PostgresRepository {
    async fn insert_campaign(&self, campaign: Campaign) -> Result<Campaign, RepositoryError> {
        let query = r#"
            INSERT INTO campaigns (
                id, title, description, city, address, location, campaign_date, time_slot,
                organizer, blood_groups_needed, poster_image_url, campaign_type,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#;

        sqlx::query(query)
            .bind(campaign.id)
            .bind(&campaign.title)
            .bind(&campaign.description)
            .bind(&campaign.city)
            .bind(&campaign.address)
            .bind(campaign.location.coordinates.to_vec())
            .bind(campaign.date)
            .bind(&campaign.time)
            .bind(&campaign.organizer)
            .bind(group_names(&campaign.blood_groups_needed))
            .bind(&campaign.poster_image_url)
            .bind(campaign.campaign_type.as_str())
            .bind(campaign.created_at)
            .bind(campaign.updated_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!(campaign_id = %campaign.id, "Inserted campaign");
        Ok(campaign)
    }

    async fn get_campaign(&self, id: Uuid) -> Result<Campaign, RepositoryError> {
        let query = format!("SELECT {} FROM campaigns WHERE id = $1", CAMPAIGN_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Campaign {} not found", id)))?;

        campaign_from_row(&row)
    }

    async fn list_campaigns(
        &self,
        filter: &CampaignFilter,
        today: NaiveDate,
    ) -> Result<Vec<Campaign>, RepositoryError> {
        let query = format!(
            r#"
            SELECT {}
            FROM campaigns
            WHERE ($1::text IS NULL OR city ILIKE $1)
              AND ($2::text IS NULL OR campaign_type = $2)
              AND ($3::date IS NULL OR campaign_date = $3)
              AND ($4::text IS NULL
                   OR ($4 = 'Upcoming' AND campaign_date > $5::date)
                   OR ($4 = 'Ongoing' AND campaign_date = $5::date)
                   OR ($4 = 'Completed' AND campaign_date < $5::date))
            ORDER BY campaign_date, id
            "#,
            CAMPAIGN_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(filter.city.as_deref().map(contains_pattern))
            .bind(filter.campaign_type.map(|t| t.as_str()))
            .bind(filter.date)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(today)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(campaign_from_row).collect()
    }

    async fn update_campaign(&self, id: Uuid, patch: CampaignPatch) -> Result<Campaign, RepositoryError> {
        let query = format!(
            r#"
            UPDATE campaigns SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                city = COALESCE($4, city),
                address = COALESCE($5, address),
                location = COALESCE($6, location),
                campaign_date = COALESCE($7, campaign_date),
                time_slot = COALESCE($8, time_slot),
                organizer = COALESCE($9, organizer),
                blood_groups_needed = COALESCE($10, blood_groups_needed),
                poster_image_url = COALESCE($11, poster_image_url),
                campaign_type = COALESCE($12, campaign_type),
                updated_at = $13
            WHERE id = $1
            RETURNING {}
            "#,
            CAMPAIGN_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(patch.title)
            .bind(patch.description)
            .bind(patch.city)
            .bind(patch.address)
            .bind(patch.location.map(|l| l.coordinates.to_vec()))
            .bind(patch.date)
            .bind(patch.time)
            .bind(patch.organizer)
            .bind(patch.blood_groups_needed.as_deref().map(group_names))
            .bind(patch.poster_image_url)
            .bind(patch.campaign_type.map(|t| t.as_str()))
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Campaign {} not found", id)))?;

        tracing::debug!(campaign_id = %id, "Updated campaign");
        campaign_from_row(&row)
    }

    async fn delete_campaign(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Campaign {} not found", id)));
        }
        Ok(())
    }
}

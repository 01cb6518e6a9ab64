// Model exports
pub mod campaign;
pub mod domain;
pub mod requests;
pub mod responses;

pub use campaign::{Campaign, CampaignFilter, CampaignPatch, CampaignStatus, CampaignType};
pub use domain::{
    BloodGroup, BloodRequest, BoundingBox, Donor, DonorFilter, DonorQuery, DonorUpdate,
    GeoJsonKind, GeoJsonPoint, GeoPoint, GroupFilter, MatchResult, RequestQuery, RequestStatus,
    Urgency, ValidationError, DONATION_DEFERRAL_DAYS,
};
pub use requests::{
    parse_day, parse_group_list, parse_group_param, CreateBloodRequest, CreateCampaignRequest,
    FilterDonorsQuery, ListCampaignsQuery, MatchPreviewQuery, NearbyDonorsQuery,
    NearbyRequestsQuery, RecordDonationRequest, RegisterDonorRequest, UpdateAvailabilityRequest,
    UpdateCampaignRequest, UpdateLocationRequest, UpdateStatusRequest,
};
pub use responses::{
    format_distance_km, BloodRequestResponse, BroadcastResponse, CampaignResponse, DonorResponse,
    ErrorResponse, HealthResponse, LocationResponse, MatchPreviewResponse, MatchResponse,
    NearbyDonorResponse, NearbyRequestResponse, ALL_GROUPS_LABEL,
};

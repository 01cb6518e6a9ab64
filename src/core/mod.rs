// Core algorithm exports
pub mod compatibility;
pub mod distance;
pub mod filters;
pub mod matcher;

pub use compatibility::{can_donate_to, compatible_donor_groups};
pub use distance::{calculate_bounding_box, distance_km, haversine_distance, is_within_bounding_box};
pub use filters::{
    groups_for, is_match_candidate, matches_campaign_filter, matches_donor_filter, matches_group_filter,
};
pub use matcher::{rank_donors, DonorMatcher, MatchError, RequestLocator, SearchRadii};

//! RakhtSetu - donor matching and proximity notification service
//!
//! Finds blood donors near a hospital who can give to the patient's blood
//! group, and alerts them when a new request comes in.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    can_donate_to, compatible_donor_groups,
    distance::{calculate_bounding_box, haversine_distance},
    DonorMatcher, SearchRadii,
};
pub use models::{BloodGroup, BloodRequest, Donor, GeoPoint, MatchResult};

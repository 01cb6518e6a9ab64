use std::f64::consts::FRAC_PI_2;

use crate::models::{BoundingBox, GeoPoint};

/// Earth's radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Relative widening of the search box so points exactly on the circle survive rounding
const BOX_TOLERANCE: f64 = 1e-9;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Great-circle distance between two validated points in kilometers
#[inline]
pub fn distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    haversine_distance(a.latitude(), a.longitude(), b.latitude(), b.longitude())
}

/// Calculate a bounding box around a center point
///
/// Cheap pre-filter before the exact Haversine check. Uses the angular radius
/// `r / R`: latitude spans `lat ± r/R` and the longitude half-width is
/// `asin(sin(r/R) / cos(lat))`, which covers the circle at every latitude it
/// reaches, not only at the center.
///
/// When the circle reaches a pole or crosses the antimeridian the longitude
/// range is widened to the whole globe.
pub fn calculate_bounding_box(center: &GeoPoint, radius_km: f64) -> BoundingBox {
    let lat = center.latitude().to_radians();
    let lon = center.longitude().to_radians();
    let angular = radius_km / EARTH_RADIUS_KM * (1.0 + BOX_TOLERANCE);

    let min_lat = lat - angular;
    let max_lat = lat + angular;

    let (min_lon, max_lon) = if min_lat <= -FRAC_PI_2 || max_lat >= FRAC_PI_2 {
        (-180.0, 180.0)
    } else {
        let lon_delta = (angular.sin() / lat.cos()).asin();
        let (min_lon, max_lon) = ((lon - lon_delta).to_degrees(), (lon + lon_delta).to_degrees());
        if min_lon < -180.0 || max_lon > 180.0 {
            (-180.0, 180.0)
        } else {
            (min_lon, max_lon)
        }
    };

    BoundingBox {
        min_lat: min_lat.to_degrees().max(-90.0),
        max_lat: max_lat.to_degrees().min(90.0),
        min_lon,
        max_lon,
    }
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(lat: f64, lon: f64, bbox: &BoundingBox) -> bool {
    lat >= bbox.min_lat && lat <= bbox.max_lat && lon >= bbox.min_lon && lon <= bbox.max_lon
}

//! # Location Validation & Distance
//!
//! The single source of truth for what counts as a valid location.
//! Cart creation, location backfill from a creator's profile, and the
//! consistency auditor all normalize through [`normalize_location`].

use super::decode::RawLocation;
use super::value_objects::GeoPoint;

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Check that a raw location carries a usable coordinate pair.
///
/// Usable means present, exactly two elements, both finite.
pub fn location_shape_valid(raw: Option<&RawLocation>) -> bool {
    raw.and_then(|loc| loc.coordinates.as_deref())
        .is_some_and(|coords| coords.len() == 2 && coords.iter().all(|c| c.is_finite()))
}

/// Normalizes raw location data into a [`GeoPoint`]. Never fails.
///
/// A missing or malformed coordinate pair is replaced wholesale with the
/// `fallback` location. With valid coordinates, blank or missing address
/// and city default to `"Not specified"` and a blank or missing pincode
/// defaults to `"000000"`.
pub fn normalize_location(raw: Option<&RawLocation>, fallback: &GeoPoint) -> GeoPoint {
    if !location_shape_valid(raw) {
        return fallback.clone();
    }
    // Shape checked above.
    let loc = match raw {
        Some(loc) => loc,
        None => return fallback.clone(),
    };
    let coords = loc.coordinates.as_deref().unwrap_or(&[]);
    let coordinates = [
        coords.first().copied().unwrap_or(fallback.coordinates[0]),
        coords.get(1).copied().unwrap_or(fallback.coordinates[1]),
    ];

    GeoPoint {
        coordinates,
        address: non_blank(loc.address.as_deref(), GeoPoint::NOT_SPECIFIED),
        city: non_blank(loc.city.as_deref(), GeoPoint::NOT_SPECIFIED),
        pincode: non_blank(loc.pincode.as_deref(), GeoPoint::DEFAULT_PINCODE),
    }
}

fn non_blank(value: Option<&str>, default: &str) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => default.to_string(),
    }
}

/// Great-circle distance in kilometres between two `[longitude, latitude]`
/// points, by the haversine formula.
pub fn haversine_km(a: [f64; 2], b: [f64; 2]) -> f64 {
    let (lon1, lat1) = (a[0].to_radians(), a[1].to_radians());
    let (lon2, lat2) = (b[0].to_radians(), b[1].to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

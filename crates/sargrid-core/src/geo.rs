//! Planar coordinate math for search grids.
//!
//! Converts meter offsets to degree offsets with an equirectangular
//! approximation around a reference latitude. Accurate to well under a meter
//! at the few-kilometer extents a field search covers. The longitude
//! conversion divides by cos(latitude), so it degenerates toward the poles;
//! grids are validated to the normal latitude range but a grid centered at
//! 89.9 degrees will come out distorted, which is acceptable because nobody
//! lays a search grid there.

/// Meters spanned by one degree of latitude, constant at every latitude.
pub const METERS_PER_LAT_DEGREE: f64 = 111_320.0;

/// Convert a north-south distance in meters to degrees of latitude.
#[must_use]
pub fn meters_to_degrees_lat(meters: f64) -> f64 {
    meters / METERS_PER_LAT_DEGREE
}

/// Convert an east-west distance in meters to degrees of longitude at the
/// given latitude. Meridians converge with latitude, so the same distance
/// spans more degrees the farther it sits from the equator.
#[must_use]
pub fn meters_to_degrees_lon(meters: f64, latitude: f64) -> f64 {
    meters / (METERS_PER_LAT_DEGREE * latitude.to_radians().cos())
}

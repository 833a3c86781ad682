//! Spherical Web Mercator projection (EPSG:3857).
//!
//! Longitudes and latitudes are in degrees, projected coordinates in meters.
//! Latitudes are clamped to the square-world limit before projecting, so the
//! poles map onto the top and bottom edges of the projected world.

use std::f64::consts::PI;

/// Sphere radius used by EPSG:3857 (WGS84 semi-major axis).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude at which the projected world becomes square (degrees).
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Half the projected world width in meters.
pub const MAX_EXTENT: f64 = 20_037_508.342_789_244;

/// Project geographic coordinates to Web Mercator meters.
///
/// Returns `None` for non-finite input or latitudes beyond the poles.
pub fn forward(lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
    if !lon_deg.is_finite() || !lat_deg.is_finite() || lat_deg.abs() > 90.0 {
        return None;
    }
    let lat = lat_deg.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = EARTH_RADIUS * lon_deg.to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + lat / 2.0).tan().ln();
    Some((x, y))
}

/// Unproject Web Mercator meters to geographic degrees.
pub fn inverse(x: f64, y: f64) -> Option<(f64, f64)> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    Some((lon, lat))
}

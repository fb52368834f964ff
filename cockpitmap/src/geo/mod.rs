//! Geographic primitives shared by the feed, controller and overlays.
//!
//! Everything that reaches the camera is validated here first: the
//! zero-sentinel (0, 0) is the platform's "no fix" value and is never a
//! usable coordinate.

mod types;


pub use types::{
    CoordError, FixSource, GeoBounds, GeoPoint, Place, PositionFix, RouteInfo, MAX_LAT, MAX_LON,
    MIN_LAT, MIN_LON,
};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance between two points in meters (haversine).
pub fn haversine_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Initial bearing from `a` to `b` in degrees, `[0, 360)`.
pub fn initial_bearing_deg(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    normalize_bearing(y.atan2(x).to_degrees())
}

/// Wrap any finite angle into `[0, 360)`.
#[inline]
pub fn normalize_bearing(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

//! Geographic type definitions

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Valid latitude range
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Errors raised when building points from untrusted input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    /// The (0, 0) pair the platform reports when it has no fix.
    #[error("Coordinate (0, 0) is the no-fix sentinel")]
    ZeroSentinel,
}

/// A latitude/longitude pair in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point without validation.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a point, rejecting out-of-range values and the zero-sentinel.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        if !latitude.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&latitude) {
            return Err(CoordError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(MIN_LON..=MAX_LON).contains(&longitude) {
            return Err(CoordError::InvalidLongitude(longitude));
        }
        let point = Self::new(latitude, longitude);
        if point.is_zero_sentinel() {
            return Err(CoordError::ZeroSentinel);
        }
        Ok(point)
    }

    /// `true` for exactly (0, 0), the "no fix" value.
    #[inline]
    pub fn is_zero_sentinel(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    /// Finite, in range, and not the zero-sentinel.
    #[inline]
    pub fn is_valid(&self) -> bool {
        Self::try_new(self.latitude, self.longitude).is_ok()
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        super::haversine_m(self, other)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Which provider produced a fix. Diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FixSource {
    /// Platform satellite positioning.
    PlatformGnss,
    /// Platform network (cell/wifi) positioning.
    PlatformNetwork,
    /// The map SDK's own location engine.
    SdkEngine,
    /// Recorded drive played back from a file.
    #[default]
    Replay,
    /// Any other provider, by name.
    Named(String),
}

impl fmt::Display for FixSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixSource::PlatformGnss => write!(f, "gnss"),
            FixSource::PlatformNetwork => write!(f, "network"),
            FixSource::SdkEngine => write!(f, "sdk"),
            FixSource::Replay => write!(f, "replay"),
            FixSource::Named(name) => write!(f, "{}", name),
        }
    }
}

/// A single location observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    /// Where the device was.
    pub point: GeoPoint,

    /// Direction of travel in degrees (0 = north, clockwise), if known.
    #[serde(default)]
    pub bearing: Option<f64>,

    /// Horizontal accuracy radius in meters, if known.
    #[serde(default)]
    pub accuracy: Option<f64>,

    /// Provider that produced the fix.
    #[serde(default)]
    pub source: FixSource,

    /// Observation time, milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp_ms: u64,
}

impl PositionFix {
    /// Create a fix with no bearing or accuracy.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            point: GeoPoint::new(latitude, longitude),
            bearing: None,
            accuracy: None,
            source: FixSource::default(),
            timestamp_ms: 0,
        }
    }

    /// Set the bearing.
    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = Some(bearing);
        self
    }

    /// Set the accuracy radius.
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Set the source tag.
    pub fn with_source(mut self, source: FixSource) -> Self {
        self.source = source;
        self
    }

    /// Set the observation time.
    pub fn with_timestamp_ms(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    /// Whether this fix may be acted on (see [`GeoPoint::is_valid`]).
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.point.is_valid()
    }
}

/// Axis-aligned bounds around a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    /// Bounds enclosing every point, or `None` for an empty slice.
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self {
            min_lat: first.latitude,
            max_lat: first.latitude,
            min_lon: first.longitude,
            max_lon: first.longitude,
        };
        for p in &points[1..] {
            bounds.min_lat = bounds.min_lat.min(p.latitude);
            bounds.max_lat = bounds.max_lat.max(p.latitude);
            bounds.min_lon = bounds.min_lon.min(p.longitude);
            bounds.max_lon = bounds.max_lon.max(p.longitude);
        }
        Some(bounds)
    }

    /// Center of the bounds.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    /// Whether `point` lies inside (inclusive).
    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lon..=self.max_lon).contains(&point.longitude)
    }
}

/// A named place, typically a search result chosen as destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub point: GeoPoint,
    #[serde(default)]
    pub address: String,
}

impl Place {
    pub fn new(name: impl Into<String>, point: GeoPoint) -> Self {
        Self {
            name: name.into(),
            point,
            address: String::new(),
        }
    }
}

/// A drive route returned by the routing backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub id: String,
    /// Total length in meters.
    pub distance_m: f64,
    /// Expected travel time in seconds.
    pub duration_s: u64,
    /// Route geometry, start to end.
    pub polyline: Vec<GeoPoint>,
    /// Planning strategy label from the backend.
    #[serde(default)]
    pub strategy: String,
}

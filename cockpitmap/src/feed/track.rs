//! Direction-of-travel derivation from recent positions.
//!
//! Many fixes arrive without a bearing (network positioning never has one,
//! and GNSS drops it when stationary). The feed keeps a short window of
//! forwarded positions and derives a bearing from the oldest to the newest
//! sample when the vehicle has moved far enough for the result to be
//! meaningful.

use std::collections::VecDeque;

use crate::geo::{initial_bearing_deg, GeoPoint};

/// Default number of positions retained.
pub const DEFAULT_TRACK_WINDOW: usize = 10;

/// Minimum distance between oldest and newest sample for a reliable track.
pub const DEFAULT_MIN_TRACK_DISTANCE_M: f64 = 10.0;

/// Rolling window of recent positions (oldest first).
#[derive(Debug, Clone)]
pub struct TrackHistory {
    samples: VecDeque<GeoPoint>,
    max_samples: usize,
    min_distance_m: f64,
}

impl Default for TrackHistory {
    fn default() -> Self {
        Self::new(DEFAULT_TRACK_WINDOW, DEFAULT_MIN_TRACK_DISTANCE_M)
    }
}

impl TrackHistory {
    /// Create a history with the given window size and distance threshold.
    ///
    /// A window below two samples can never produce a track, so it is raised
    /// to two.
    pub fn new(max_samples: usize, min_distance_m: f64) -> Self {
        let max_samples = max_samples.max(2);
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
            min_distance_m,
        }
    }

    /// Record a forwarded position.
    pub fn record(&mut self, point: GeoPoint) {
        self.samples.push_back(point);
        while self.samples.len() > self.max_samples {
            self.samples.pop_front();
        }
    }

    /// Bearing from the oldest to the newest sample, in degrees `[0, 360)`.
    ///
    /// Returns `None` with fewer than two samples or when the positions are
    /// too close together for the direction to be trusted.
    pub fn derived_bearing(&self) -> Option<f64> {
        if self.samples.len() < 2 {
            return None;
        }

        let oldest = self.samples.front()?;
        let newest = self.samples.back()?;

        if oldest.distance_m(newest) < self.min_distance_m {
            return None;
        }

        Some(initial_bearing_deg(oldest, newest))
    }

    /// Number of samples held.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Most recent position.
    pub fn latest(&self) -> Option<GeoPoint> {
        self.samples.back().copied()
    }

    /// Forget all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

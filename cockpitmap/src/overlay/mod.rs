//! Map overlays: the destination marker and the route polyline.
//!
//! [`OverlayManager`] keeps at most one of each on an [`OverlaySurface`].
//! Showing a destination or a route asks the follow controller for a
//! one-shot camera move through [`FramingTarget`](crate::follow::FramingTarget);
//! clearing never moves the camera.

mod manager;
mod recording;

pub use manager::{
    OverlayConfig, OverlayManager, DEFAULT_DESTINATION_ZOOM, DEFAULT_MARKER_HIT_RADIUS_M,
    DEFAULT_ROUTE_PADDING_PX,
};
pub use recording::{OverlayCall, RecordingOverlay};

use std::fmt;

use crate::geo::{GeoPoint, Place};

/// Opaque handle to something drawn on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(pub u64);

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay#{}", self.0)
    }
}

/// Drawing primitives provided by the map SDK.
pub trait OverlaySurface: Send {
    fn add_marker(&mut self, place: &Place) -> OverlayId;

    fn remove_marker(&mut self, id: OverlayId);

    /// Draw a polyline through `points` in order.
    fn add_polyline(&mut self, points: &[GeoPoint]) -> OverlayId;

    fn remove_polyline(&mut self, id: OverlayId);
}

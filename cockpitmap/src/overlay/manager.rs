//! Destination marker and route polyline bookkeeping.

use crate::follow::FramingTarget;
use crate::geo::{GeoPoint, Place, RouteInfo};

use super::{OverlayId, OverlaySurface};

/// Padding around a route when framing it.
pub const DEFAULT_ROUTE_PADDING_PX: u32 = 120;

/// A long press this close to the destination marker hits it.
pub const DEFAULT_MARKER_HIT_RADIUS_M: f64 = 100.0;

/// Zoom used when focusing a new destination.
pub const DEFAULT_DESTINATION_ZOOM: f32 = 15.0;

/// Overlay tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    pub route_padding_px: u32,
    pub marker_hit_radius_m: f64,
    pub destination_zoom: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            route_padding_px: DEFAULT_ROUTE_PADDING_PX,
            marker_hit_radius_m: DEFAULT_MARKER_HIT_RADIUS_M,
            destination_zoom: DEFAULT_DESTINATION_ZOOM,
        }
    }
}

/// Keeps at most one destination marker and one route polyline.
pub struct OverlayManager {
    config: OverlayConfig,
    surface: Box<dyn OverlaySurface>,
    destination: Option<(Place, OverlayId)>,
    route: Option<(RouteInfo, OverlayId)>,
}

impl OverlayManager {
    pub fn new(config: OverlayConfig, surface: impl OverlaySurface + 'static) -> Self {
        Self {
            config,
            surface: Box::new(surface),
            destination: None,
            route: None,
        }
    }

    pub fn destination(&self) -> Option<&Place> {
        self.destination.as_ref().map(|(place, _)| place)
    }

    pub fn route(&self) -> Option<&RouteInfo> {
        self.route.as_ref().map(|(route, _)| route)
    }

    /// Replace the destination marker and focus the camera on it.
    ///
    /// Returns `false` (and leaves the old marker) if the place has no
    /// usable coordinates.
    pub fn show_destination(&mut self, place: Place, framing: &mut dyn FramingTarget) -> bool {
        if !place.point.is_valid() {
            tracing::debug!(name = %place.name, "Ignoring destination without coordinates");
            return false;
        }
        self.clear_destination();

        let id = self.surface.add_marker(&place);
        tracing::debug!(name = %place.name, point = %place.point, %id, "Destination marker shown");
        framing.focus_on(place.point, self.config.destination_zoom);
        self.destination = Some((place, id));
        true
    }

    pub fn clear_destination(&mut self) {
        if let Some((_, id)) = self.destination.take() {
            self.surface.remove_marker(id);
        }
    }

    /// Replace the route polyline and frame it once.
    ///
    /// Sentinel points are dropped. A route with nothing left to draw only
    /// clears the previous one.
    pub fn show_route(&mut self, mut route: RouteInfo, framing: &mut dyn FramingTarget) -> bool {
        self.clear_route();

        route.polyline.retain(GeoPoint::is_valid);
        if route.polyline.is_empty() {
            tracing::debug!(route = %route.id, "Route has no drawable points");
            return false;
        }

        let id = self.surface.add_polyline(&route.polyline);
        tracing::info!(
            route = %route.id,
            points = route.polyline.len(),
            distance_m = route.distance_m,
            "Route drawn"
        );
        framing.frame_bounds(&route.polyline, self.config.route_padding_px);
        self.route = Some((route, id));
        true
    }

    pub fn clear_route(&mut self) {
        if let Some((_, id)) = self.route.take() {
            self.surface.remove_polyline(id);
        }
    }

    pub fn clear_all(&mut self) {
        self.clear_destination();
        self.clear_route();
    }

    /// The destination, if `point` is within the hit radius of its marker.
    pub fn long_press_hit(&self, point: GeoPoint) -> Option<&Place> {
        let (place, _) = self.destination.as_ref()?;
        (place.point.distance_m(&point) <= self.config.marker_hit_radius_m).then_some(place)
    }
}

impl std::fmt::Debug for OverlayManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayManager")
            .field("destination", &self.destination)
            .field("route", &self.route.as_ref().map(|(r, id)| (&r.id, id)))
            .finish()
    }
}

//! Camera command surface.
//!
//! The narrow contract the follow-mode controller drives. A concrete map SDK
//! sits behind [`CameraSurface`]; the controller never sees more of the SDK
//! than these operations.
//!
//! # Idempotence
//!
//! Moving the camera to where it already is must be a silent no-op in the
//! implementation. The controller does not filter redundant commands beyond
//! issuing at most one `animate_to` per fix.

mod recording;

pub use recording::{CameraCommand, RecordingCamera};

use std::fmt;

use crate::geo::{GeoPoint, PositionFix};

/// Camera presentation style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraStyle {
    /// North-up, flat, user owns the viewport.
    #[default]
    Browse,
    /// Tilted, rotated with the direction of travel.
    Navigation,
}

impl fmt::Display for CameraStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraStyle::Browse => write!(f, "browse"),
            CameraStyle::Navigation => write!(f, "navigation"),
        }
    }
}

/// Base map layer, numbered as the map SDK numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapLayer {
    #[default]
    Normal,
    Satellite,
    Night,
    Navi,
}

impl MapLayer {
    /// SDK constant for this layer.
    pub fn sdk_type(&self) -> i32 {
        match self {
            MapLayer::Normal => 1,
            MapLayer::Satellite => 2,
            MapLayer::Night => 3,
            MapLayer::Navi => 4,
        }
    }

    /// Layer for an SDK constant.
    pub fn from_sdk_type(value: i32) -> Option<Self> {
        match value {
            1 => Some(MapLayer::Normal),
            2 => Some(MapLayer::Satellite),
            3 => Some(MapLayer::Night),
            4 => Some(MapLayer::Navi),
            _ => None,
        }
    }
}

/// Operations the controller needs from the map viewport.
///
/// All calls are fire-and-forget. Overlapping animations are coalesced by
/// the implementation.
pub trait CameraSurface: Send {
    /// Cut to `point` without animation.
    fn move_instant(&mut self, point: GeoPoint, zoom: Option<f32>);

    /// Animate to `point`, optionally changing zoom, tilt and rotation.
    fn animate_to(
        &mut self,
        point: GeoPoint,
        zoom: Option<f32>,
        tilt: Option<f32>,
        bearing: Option<f32>,
    );

    /// Set the camera tilt in degrees.
    fn set_tilt(&mut self, tilt: f32);

    /// Frame all `points` with `padding_px` of screen margin.
    fn fit_bounds(&mut self, points: &[GeoPoint], padding_px: u32);

    /// Switch between browse-look and nav-look presentation.
    fn set_style(&mut self, style: CameraStyle);

    /// Zoom in (positive) or out (negative) relative to the current zoom.
    fn zoom_by(&mut self, delta: f32);

    /// Change the base map layer.
    fn set_layer(&mut self, layer: MapLayer);

    /// Device location as the SDK currently sees it. May lag the feed.
    fn current_fix(&self) -> Option<PositionFix>;
}

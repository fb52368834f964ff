//! In-memory camera that records every command it receives.
//!
//! Clones share the same command log, so a test (or the CLI) can hand one
//! clone to the controller and inspect the other.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{CameraStyle, CameraSurface, MapLayer};
use crate::geo::{GeoPoint, PositionFix};

/// A camera operation as issued by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraCommand {
    MoveInstant {
        point: GeoPoint,
        zoom: Option<f32>,
    },
    AnimateTo {
        point: GeoPoint,
        zoom: Option<f32>,
        tilt: Option<f32>,
        bearing: Option<f32>,
    },
    SetTilt(f32),
    FitBounds {
        points: Vec<GeoPoint>,
        padding_px: u32,
    },
    SetStyle(CameraStyle),
    ZoomBy(f32),
    SetLayer(MapLayer),
}

impl CameraCommand {
    /// Whether this is an `AnimateTo`.
    pub fn is_animate(&self) -> bool {
        matches!(self, CameraCommand::AnimateTo { .. })
    }
}

#[derive(Debug, Default)]
struct RecordingInner {
    commands: Vec<CameraCommand>,
    current_fix: Option<PositionFix>,
}

/// Camera surface that appends each call to a shared log.
#[derive(Debug, Clone, Default)]
pub struct RecordingCamera {
    inner: Arc<Mutex<RecordingInner>>,
}

impl RecordingCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set what `current_fix` reports.
    pub fn set_current_fix(&self, fix: Option<PositionFix>) {
        self.inner.lock().current_fix = fix;
    }

    /// Snapshot of all commands so far.
    pub fn commands(&self) -> Vec<CameraCommand> {
        self.inner.lock().commands.clone()
    }

    /// Number of commands so far.
    pub fn len(&self) -> usize {
        self.inner.lock().commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().commands.is_empty()
    }

    /// Number of `AnimateTo` commands so far.
    pub fn animate_count(&self) -> usize {
        self.inner
            .lock()
            .commands
            .iter()
            .filter(|c| c.is_animate())
            .count()
    }

    /// Take and clear the command log.
    pub fn drain(&self) -> Vec<CameraCommand> {
        std::mem::take(&mut self.inner.lock().commands)
    }

    fn push(&self, command: CameraCommand) {
        self.inner.lock().commands.push(command);
    }
}

impl CameraSurface for RecordingCamera {
    fn move_instant(&mut self, point: GeoPoint, zoom: Option<f32>) {
        self.push(CameraCommand::MoveInstant { point, zoom });
    }

    fn animate_to(
        &mut self,
        point: GeoPoint,
        zoom: Option<f32>,
        tilt: Option<f32>,
        bearing: Option<f32>,
    ) {
        self.push(CameraCommand::AnimateTo {
            point,
            zoom,
            tilt,
            bearing,
        });
    }

    fn set_tilt(&mut self, tilt: f32) {
        self.push(CameraCommand::SetTilt(tilt));
    }

    fn fit_bounds(&mut self, points: &[GeoPoint], padding_px: u32) {
        self.push(CameraCommand::FitBounds {
            points: points.to_vec(),
            padding_px,
        });
    }

    fn set_style(&mut self, style: CameraStyle) {
        self.push(CameraCommand::SetStyle(style));
    }

    fn zoom_by(&mut self, delta: f32) {
        self.push(CameraCommand::ZoomBy(delta));
    }

    fn set_layer(&mut self, layer: MapLayer) {
        self.push(CameraCommand::SetLayer(layer));
    }

    fn current_fix(&self) -> Option<PositionFix> {
        self.inner.lock().current_fix.clone()
    }
}

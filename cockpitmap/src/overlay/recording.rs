//! Overlay surface that records calls instead of drawing.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{OverlayId, OverlaySurface};
use crate::geo::{GeoPoint, Place};

/// An overlay operation as issued by the manager.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCall {
    AddMarker { id: OverlayId, place: Place },
    RemoveMarker(OverlayId),
    AddPolyline { id: OverlayId, points: Vec<GeoPoint> },
    RemovePolyline(OverlayId),
}

#[derive(Debug, Default)]
struct RecordingInner {
    calls: Vec<OverlayCall>,
    next_id: u64,
}

/// Records overlay calls; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingOverlay {
    inner: Arc<Mutex<RecordingInner>>,
}

impl RecordingOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<OverlayCall> {
        self.inner.lock().calls.clone()
    }

    /// Take and clear the call log.
    pub fn drain(&self) -> Vec<OverlayCall> {
        std::mem::take(&mut self.inner.lock().calls)
    }

    fn next_id(inner: &mut RecordingInner) -> OverlayId {
        inner.next_id += 1;
        OverlayId(inner.next_id)
    }
}

impl OverlaySurface for RecordingOverlay {
    fn add_marker(&mut self, place: &Place) -> OverlayId {
        let mut inner = self.inner.lock();
        let id = Self::next_id(&mut inner);
        inner.calls.push(OverlayCall::AddMarker {
            id,
            place: place.clone(),
        });
        id
    }

    fn remove_marker(&mut self, id: OverlayId) {
        self.inner.lock().calls.push(OverlayCall::RemoveMarker(id));
    }

    fn add_polyline(&mut self, points: &[GeoPoint]) -> OverlayId {
        let mut inner = self.inner.lock();
        let id = Self::next_id(&mut inner);
        inner.calls.push(OverlayCall::AddPolyline {
            id,
            points: points.to_vec(),
        });
        id
    }

    fn remove_polyline(&mut self, id: OverlayId) {
        self.inner.lock().calls.push(OverlayCall::RemovePolyline(id));
    }
}

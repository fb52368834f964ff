//! Camera follow mode.
//!
//! Decides whether the map camera tracks the vehicle or stays where the
//! user put it, and applies the nav-look (navigation style, tilt, heading)
//! when tracking. See [`FollowController`] for the state machine and
//! [`FollowService`] for the tokio host that feeds it.
//!
//! # Example
//!
//! ```ignore
//! let controller = FollowController::new(FollowConfig::default(), camera);
//! let feed = LocationFeed::new(FeedConfig::default()).with_provider(gnss);
//! let (handle, join) = FollowService::new(controller, feed)
//!     .with_store(LastLocationStore::new(path))
//!     .spawn();
//!
//! handle.set_following(true);
//! handle.on_touch_detected(); // pauses, resumes after 5s of quiet
//! handle.shutdown();
//! let controller = join.await?;
//! ```

mod config;
mod controller;
mod service;
mod state;
mod timer;

pub use config::{
    FollowConfig, BROWSE_TILT, DEFAULT_FIRST_FIX_ZOOM, DEFAULT_LOCATE_ZOOM, DEFAULT_NAV_TILT,
    DEFAULT_NAV_ZOOM,
};
pub use controller::{FollowController, ZOOM_STEP};
pub use service::{FollowCommand, FollowHandle, FollowService};
pub use state::{FollowEvent, FollowState, FollowStatus};
pub use timer::{ResumeTimer, DEFAULT_RESUME_DELAY};

use crate::geo::GeoPoint;

/// Entry points for one-shot camera moves requested by other components.
///
/// Implemented by [`FollowController`] for synchronous hosts and by
/// [`FollowHandle`] when the controller runs in a [`FollowService`]. The
/// controller drops these requests while it is following.
pub trait FramingTarget {
    /// Fit the camera to the given points with padding in pixels.
    fn frame_bounds(&mut self, points: &[GeoPoint], padding_px: u32);

    /// Animate to a point at the given zoom.
    fn focus_on(&mut self, point: GeoPoint, zoom: f32);
}

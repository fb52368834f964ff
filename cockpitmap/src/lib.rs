//! CockpitMap - camera follow mode for an in-vehicle map.
//!
//! Decides, fix by fix and touch by touch, whether the map camera tracks
//! the vehicle or stays where the driver put it.
//!
//! # Modules
//!
//! - [`geo`] - points, fixes, distances and bearings
//! - [`feed`] - merges location providers into one fix stream
//! - [`camera`] - the camera surface the controller drives
//! - [`follow`] - the follow-mode state machine and its tokio host
//! - [`overlay`] - destination marker and route polyline
//! - [`config`] - `~/.cockpitmap/config.ini`
//! - [`store`] - last known location on disk
//! - [`logging`] - tracing subscriber setup

pub mod camera;
pub mod config;
pub mod feed;
pub mod follow;
pub mod geo;
pub mod logging;
pub mod overlay;
pub mod store;

pub use camera::{CameraStyle, CameraSurface, MapLayer};
pub use feed::{LocationFeed, LocationProvider};
pub use follow::{FollowController, FollowHandle, FollowService, FollowState};
pub use geo::{GeoPoint, PositionFix};

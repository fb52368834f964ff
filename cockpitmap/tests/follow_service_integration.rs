//! Integration tests for the follow service.
//!
//! These tests drive the complete path with a paused tokio clock:
//! - ChannelProvider → LocationFeed → FollowService → camera
//! - touch pause and timed resume
//! - teardown with a pending resume
//! - overlays framing through the handle
//! - last known location restore and persist
//!
//! Run with: `cargo test --test follow_service_integration`

use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use cockpitmap::camera::{CameraCommand, CameraStyle, RecordingCamera};
use cockpitmap::feed::{ChannelProvider, FeedConfig, LocationFeed};
use cockpitmap::follow::{FollowConfig, FollowController, FollowHandle, FollowService, FollowState};
use cockpitmap::geo::{GeoPoint, PositionFix, RouteInfo};
use cockpitmap::overlay::{OverlayConfig, OverlayManager, RecordingOverlay};
use cockpitmap::store::LastLocationStore;

// ============================================================================
// Helper Functions
// ============================================================================

struct Harness {
    handle: FollowHandle,
    join: JoinHandle<FollowController>,
    camera: RecordingCamera,
    fixes: mpsc::UnboundedSender<PositionFix>,
}

impl Harness {
    fn start() -> Self {
        Self::start_with(None)
    }

    fn start_with(store: Option<LastLocationStore>) -> Self {
        let camera = RecordingCamera::new();
        let controller = FollowController::new(FollowConfig::default(), camera.clone());
        let (provider, fixes) = ChannelProvider::new("gnss");
        let feed = LocationFeed::new(FeedConfig::default()).with_provider(provider);

        let mut service = FollowService::new(controller, feed);
        if let Some(store) = store {
            service = service.with_store(store);
        }
        let (handle, join) = service.spawn();

        Self {
            handle,
            join,
            camera,
            fixes,
        }
    }

    fn send_fix(&self, lat: f64, lon: f64, bearing: Option<f64>, timestamp_ms: u64) {
        let mut fix = PositionFix::new(lat, lon).with_timestamp_ms(timestamp_ms);
        fix.bearing = bearing;
        self.fixes.send(fix).unwrap();
    }

    fn state(&self) -> FollowState {
        self.handle.status().state
    }

    fn animations(&self) -> Vec<CameraCommand> {
        self.camera
            .commands()
            .into_iter()
            .filter(CameraCommand::is_animate)
            .collect()
    }
}

/// Let every spawned task run until idle.
async fn settle() {
    for _ in 0..3 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

/// Harness already in `Following` at (39.90, 116.40) with a clean camera log.
async fn following() -> Harness {
    let h = Harness::start();
    h.send_fix(39.90, 116.40, Some(0.0), 1);
    settle().await;
    h.handle.set_following(true);
    settle().await;
    assert_eq!(h.state(), FollowState::Following);
    h.camera.drain();
    h
}

fn assert_animate(command: &CameraCommand, lat: f64, lon: f64, tilt: f32, bearing: f32) {
    match command {
        CameraCommand::AnimateTo {
            point,
            tilt: Some(t),
            bearing: Some(b),
            ..
        } => {
            assert_eq!(*point, GeoPoint::new(lat, lon));
            assert_eq!(*t, tilt);
            assert_eq!(*b, bearing);
        }
        other => panic!("expected animate_to, got {other:?}"),
    }
}

// ============================================================================
// Follow Scenario
// ============================================================================

/// Two fixes, follow on, touch, fixes during the pause, then resume.
#[tokio::test(start_paused = true)]
async fn test_end_to_end_follow_scenario() {
    let h = Harness::start();

    h.send_fix(39.90, 116.40, Some(0.0), 1);
    h.send_fix(39.91, 116.41, Some(10.0), 2);
    settle().await;
    assert_eq!(h.state(), FollowState::Previewing);
    assert!(h.animations().is_empty(), "preview only centers once");

    h.handle.set_following(true);
    settle().await;
    let animations = h.animations();
    assert_eq!(animations.len(), 1);
    assert_animate(&animations[0], 39.91, 116.41, 45.0, 10.0);
    h.camera.drain();

    h.handle.on_touch_detected();
    settle().await;
    assert_eq!(h.state(), FollowState::FollowingPausedByUser);

    h.send_fix(39.92, 116.42, Some(20.0), 3);
    h.send_fix(39.93, 116.43, Some(30.0), 4);
    settle().await;
    assert!(h.animations().is_empty(), "no follow while paused");

    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;

    assert_eq!(h.state(), FollowState::Following);
    let animations = h.animations();
    assert_eq!(animations.len(), 1);
    assert_animate(&animations[0], 39.93, 116.43, 45.0, 30.0);
}

/// Following again while already following repeats the same entry action.
#[tokio::test(start_paused = true)]
async fn test_repeated_follow_request_is_idempotent() {
    let h = following().await;

    h.handle.set_following(true);
    settle().await;
    let first = h.camera.drain();

    h.handle.set_following(true);
    settle().await;
    let second = h.camera.drain();

    assert_eq!(first, second);
    assert_eq!(
        first[0],
        CameraCommand::SetStyle(CameraStyle::Navigation)
    );
    assert_eq!(h.state(), FollowState::Following);
}

// ============================================================================
// Pause and Resume
// ============================================================================

/// The quiet period counts from the last touch.
#[tokio::test(start_paused = true)]
async fn test_touch_debounce_times_from_last_touch() {
    let h = following().await;

    h.handle.on_touch_detected();
    settle().await;
    tokio::time::advance(Duration::from_secs(3)).await;

    h.handle.on_touch_detected();
    settle().await;
    tokio::time::advance(Duration::from_secs(3)).await;
    settle().await;
    assert_eq!(h.state(), FollowState::FollowingPausedByUser);
    assert!(h.animations().is_empty());

    tokio::time::advance(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(h.state(), FollowState::Following);
    assert_eq!(h.animations().len(), 1);
}

/// Ending follow while paused cancels the resume for good.
#[tokio::test(start_paused = true)]
async fn test_explicit_stop_wins_over_pending_resume() {
    let h = following().await;

    h.handle.on_touch_detected();
    settle().await;
    h.handle.set_following(false);
    settle().await;
    assert_eq!(h.state(), FollowState::Previewing);
    assert!(!h.handle.status().resume_pending);

    h.send_fix(39.95, 116.45, Some(0.0), 10);
    tokio::time::advance(Duration::from_secs(30)).await;
    settle().await;

    assert_eq!(h.state(), FollowState::Previewing);
    assert!(h.animations().is_empty());
    assert_eq!(
        h.camera.commands(),
        vec![
            CameraCommand::SetStyle(CameraStyle::Browse),
            CameraCommand::SetTilt(0.0),
        ]
    );
}

/// A touch delivered alongside a fix pauses before the fix is applied.
#[tokio::test(start_paused = true)]
async fn test_touch_beats_same_tick_fix() {
    let h = following().await;

    h.handle.on_touch_detected();
    h.send_fix(39.95, 116.45, Some(0.0), 10);
    settle().await;

    assert_eq!(h.state(), FollowState::FollowingPausedByUser);
    assert!(h.animations().is_empty());
}

// ============================================================================
// Teardown
// ============================================================================

/// Nothing reaches the camera after teardown, even with a resume pending.
#[tokio::test(start_paused = true)]
async fn test_teardown_with_pending_resume() {
    let h = following().await;

    h.handle.on_touch_detected();
    settle().await;
    assert!(h.handle.status().resume_pending);

    h.handle.shutdown();
    let controller = h.join.await.unwrap();
    assert!(controller.is_torn_down());
    h.camera.drain();

    let _ = h.fixes.send(PositionFix::new(39.99, 116.49));
    h.handle.set_following(true);
    h.handle.on_touch_detected();
    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;

    assert!(h.camera.is_empty());
    assert!(h.handle.status().torn_down);
}

// ============================================================================
// Feed
// ============================================================================

/// Sentinel fixes never reach the camera; missing bearings are derived.
#[tokio::test(start_paused = true)]
async fn test_feed_filters_sentinel_and_fills_bearing() {
    let h = following().await;

    h.send_fix(0.0, 0.0, Some(90.0), 20);
    h.send_fix(39.901, 116.40, None, 21);
    settle().await;

    let animations = h.animations();
    assert_eq!(animations.len(), 1);
    match &animations[0] {
        CameraCommand::AnimateTo { point, bearing, .. } => {
            assert_eq!(*point, GeoPoint::new(39.901, 116.40));
            let bearing = bearing.expect("bearing derived from track");
            assert!(bearing < 1.0 || bearing > 359.0, "heading north, got {bearing}");
        }
        other => panic!("expected animate_to, got {other:?}"),
    }
}

// ============================================================================
// Overlays
// ============================================================================

fn route(points: Vec<GeoPoint>) -> RouteInfo {
    RouteInfo {
        id: "r1".to_string(),
        distance_m: 5_000.0,
        duration_s: 600,
        polyline: points,
        strategy: "fastest".to_string(),
    }
}

/// Route framing is honoured while previewing and dropped while following.
#[tokio::test(start_paused = true)]
async fn test_route_framing_through_handle() {
    let h = Harness::start();
    let mut overlays = OverlayManager::new(OverlayConfig::default(), RecordingOverlay::new());
    let mut framing = h.handle.clone();
    let points = vec![GeoPoint::new(39.90, 116.40), GeoPoint::new(39.95, 116.45)];

    h.send_fix(39.90, 116.40, Some(0.0), 1);
    settle().await;
    h.camera.drain();

    overlays.show_route(route(points.clone()), &mut framing);
    settle().await;
    assert_eq!(
        h.camera.commands(),
        vec![CameraCommand::FitBounds {
            points: points.clone(),
            padding_px: 120,
        }]
    );

    h.handle.set_following(true);
    settle().await;
    h.camera.drain();

    overlays.show_route(route(points), &mut framing);
    settle().await;
    assert!(h.camera.is_empty(), "framing dropped while following");
    assert!(overlays.route().is_some());
}

// ============================================================================
// Last Known Location
// ============================================================================

/// Restores on start, then persists the latest fix on shutdown.
#[tokio::test(start_paused = true)]
async fn test_last_location_restore_and_persist() {
    let dir = TempDir::new().unwrap();
    let store = LastLocationStore::new(dir.path().join("last_location.json"));
    store.save(&PositionFix::new(31.23, 121.47)).unwrap();

    let h = Harness::start_with(Some(store.clone()));
    settle().await;
    assert_eq!(
        h.camera.commands(),
        vec![CameraCommand::MoveInstant {
            point: GeoPoint::new(31.23, 121.47),
            zoom: Some(15.0),
        }]
    );

    h.send_fix(39.90, 116.40, None, 1);
    settle().await;
    assert_eq!(h.camera.len(), 2, "first live fix still centers");

    h.handle.shutdown();
    h.join.await.unwrap();

    assert_eq!(store.load().unwrap(), Some(GeoPoint::new(39.90, 116.40)));
}

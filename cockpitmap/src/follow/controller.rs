//! Follow-mode controller.
//!
//! Owns the camera and decides, per event, whether the program or the user
//! drives it. All camera moves (per-fix follow, nav-look, locate, one-shot
//! framing) go through this type so there is exactly one writer.
//!
//! # State Machine
//!
//! ```text
//!                 first fix                 follow(true)
//!     ┌──────┐ ─────────────► ┌────────────┐ ──────────► ┌───────────┐
//!     │ Idle │                │ Previewing │             │ Following │◄──┐
//!     └──────┘ ──────────────────────────────────────────► └───────────┘   │
//!        first fix while follow was requested     ▲  │ touch               │
//!                                  follow(false)  │  ▼                     │
//!                                      ┌──────────┴───────────┐  resume    │
//!                                      │ FollowingPausedByUser│ ───────────┘
//!                                      └──────────────────────┘  timer
//!                                        touch: restart timer
//! ```
//!
//! Entering `Following` applies the nav-look (navigation style, tilt,
//! bearing-aligned `animate_to` of the last fix). Leaving it for
//! `Previewing` reverts to the browse look. Pausing only stops the
//! per-fix animation; the camera is left where the user put it.
//!
//! Time is passed in explicitly as a [`tokio::time::Instant`] so the
//! controller can be driven synchronously or by [`super::FollowService`].

use tokio::time::Instant;

use crate::camera::{CameraStyle, CameraSurface, MapLayer};
use crate::feed::normalize;
use crate::geo::{GeoPoint, PositionFix};

use super::config::{FollowConfig, BROWSE_TILT};
use super::state::{FollowEvent, FollowState, FollowStatus};
use super::timer::ResumeTimer;
use super::FramingTarget;

/// Zoom step for the zoom buttons.
pub const ZOOM_STEP: f32 = 1.0;

/// Decides who drives the camera and issues every camera move.
pub struct FollowController {
    config: FollowConfig,
    camera: Box<dyn CameraSurface>,
    state: FollowState,
    /// `FollowRequested(true)` arrived while `Idle`.
    pending_follow: bool,
    last_fix: Option<PositionFix>,
    /// Set once a live fix has moved the camera.
    first_fix_centered: bool,
    resume_timer: ResumeTimer,
    torn_down: bool,
}

impl FollowController {
    /// Create a controller in `Idle` that drives `camera`.
    pub fn new(config: FollowConfig, camera: impl CameraSurface + 'static) -> Self {
        Self::with_boxed_camera(config, Box::new(camera))
    }

    pub fn with_boxed_camera(config: FollowConfig, camera: Box<dyn CameraSurface>) -> Self {
        let resume_timer = ResumeTimer::new(config.resume_delay);
        Self {
            config,
            camera,
            state: FollowState::Idle,
            pending_follow: false,
            last_fix: None,
            first_fix_centered: false,
            resume_timer,
            torn_down: false,
        }
    }

    pub fn state(&self) -> FollowState {
        self.state
    }

    pub fn config(&self) -> &FollowConfig {
        &self.config
    }

    pub fn last_fix(&self) -> Option<&PositionFix> {
        self.last_fix.as_ref()
    }

    pub fn has_pending_follow(&self) -> bool {
        self.pending_follow
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// When the armed resume timer is due, if any.
    pub fn resume_deadline(&self) -> Option<Instant> {
        self.resume_timer.deadline()
    }

    pub fn status(&self) -> FollowStatus {
        FollowStatus {
            state: self.state,
            pending_follow: self.pending_follow,
            resume_pending: self.resume_timer.is_pending(),
            last_fix: self.last_fix.clone(),
            torn_down: self.torn_down,
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Dispatch one event.
    pub fn handle(&mut self, event: FollowEvent, now: Instant) {
        if self.torn_down {
            tracing::trace!(event = event.name(), "Controller torn down, ignoring event");
            return;
        }
        match event {
            FollowEvent::FixReceived(fix) => self.on_fix(fix),
            FollowEvent::UserTouchDetected => self.on_touch_detected(now),
            FollowEvent::FollowRequested(enabled) => self.set_following(enabled),
            FollowEvent::ResumeTimerFired => self.on_resume_timer(now),
        }
    }

    /// Dispatch a batch of events that became ready together.
    ///
    /// Touches are applied before anything else in the batch, so a touch
    /// always wins over a fix or timer firing delivered in the same tick.
    pub fn handle_tick<I>(&mut self, events: I, now: Instant)
    where
        I: IntoIterator<Item = FollowEvent>,
    {
        let (touches, rest): (Vec<_>, Vec<_>) = events
            .into_iter()
            .partition(|e| matches!(e, FollowEvent::UserTouchDetected));
        for event in touches.into_iter().chain(rest) {
            self.handle(event, now);
        }
    }

    /// Record a fix and, when following, move the camera to it.
    pub fn on_fix(&mut self, fix: PositionFix) {
        if self.torn_down {
            return;
        }
        let Some(fix) = normalize(fix) else {
            tracing::debug!("Dropping invalid fix");
            return;
        };
        self.last_fix = Some(fix.clone());

        match self.state {
            FollowState::Idle => {
                if self.pending_follow {
                    self.pending_follow = false;
                    self.enter_following();
                } else {
                    self.transition(FollowState::Previewing);
                    if !self.first_fix_centered {
                        self.camera
                            .move_instant(fix.point, Some(self.config.first_fix_zoom));
                        self.first_fix_centered = true;
                    }
                }
            }
            FollowState::Following => self.follow_fix(&fix),
            FollowState::Previewing | FollowState::FollowingPausedByUser => {
                tracing::trace!(state = %self.state, point = %fix.point, "Fix stored");
            }
        }
    }

    /// A touch or drag on the map.
    ///
    /// In `Following` this pauses auto-follow and arms the resume timer;
    /// while paused it restarts the countdown.
    pub fn on_touch_detected(&mut self, now: Instant) {
        if self.torn_down {
            return;
        }
        match self.state {
            FollowState::Following => {
                self.transition(FollowState::FollowingPausedByUser);
                self.resume_timer.schedule(now);
            }
            FollowState::FollowingPausedByUser => {
                self.resume_timer.schedule(now);
                tracing::debug!(
                    delay_ms = self.config.resume_delay.as_millis() as u64,
                    "Touch while paused, resume timer restarted"
                );
            }
            FollowState::Idle | FollowState::Previewing => {}
        }
    }

    /// Start (`true`) or end (`false`) navigation follow.
    ///
    /// Requesting follow before any fix arrives is remembered and applied
    /// on the first fix.
    pub fn set_following(&mut self, enabled: bool) {
        if self.torn_down {
            return;
        }
        if enabled {
            match self.state {
                FollowState::Idle => {
                    if !self.pending_follow {
                        tracing::info!("Follow requested before first fix, deferring");
                    }
                    self.pending_follow = true;
                }
                FollowState::Previewing
                | FollowState::Following
                | FollowState::FollowingPausedByUser => self.enter_following(),
            }
        } else {
            self.pending_follow = false;
            match self.state {
                FollowState::Following | FollowState::FollowingPausedByUser => {
                    self.resume_timer.cancel();
                    self.transition(FollowState::Previewing);
                    self.camera.set_style(CameraStyle::Browse);
                    self.camera.set_tilt(BROWSE_TILT);
                }
                FollowState::Idle | FollowState::Previewing => {}
            }
        }
    }

    /// The resume timer reports it elapsed.
    ///
    /// Ignored unless the controller is paused and the timer is armed and
    /// due at `now`; a late firing after cancel or restart does nothing.
    pub fn on_resume_timer(&mut self, now: Instant) {
        if self.torn_down {
            return;
        }
        if self.state != FollowState::FollowingPausedByUser {
            tracing::trace!(state = %self.state, "Stale resume timer ignored");
            return;
        }
        if self.resume_timer.fire(now) {
            tracing::debug!("Quiet period elapsed, resuming follow");
            self.enter_following();
        }
    }

    /// Fire the resume timer if it is due at `now`.
    ///
    /// Convenience for synchronous hosts polling the clock.
    pub fn poll_resume(&mut self, now: Instant) {
        if self
            .resume_timer
            .deadline()
            .is_some_and(|deadline| now >= deadline)
        {
            self.on_resume_timer(now);
        }
    }

    // =========================================================================
    // One-shot camera requests
    // =========================================================================

    /// Seed the camera with a persisted position on cold start.
    ///
    /// Does nothing once a live fix has moved the camera, and does not
    /// count as that first move: the first live fix still centers.
    pub fn restore_last_known(&mut self, point: GeoPoint) -> bool {
        if self.torn_down || self.first_fix_centered || self.state != FollowState::Idle {
            return false;
        }
        if !point.is_valid() {
            tracing::debug!(%point, "Ignoring invalid stored location");
            return false;
        }
        tracing::info!(%point, "Restoring last known location");
        self.camera
            .move_instant(point, Some(self.config.first_fix_zoom));
        true
    }

    /// Center on the best current position without changing state.
    ///
    /// Prefers the surface's own fix, falls back to the last feed fix.
    pub fn locate_me(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        let target = self
            .camera
            .current_fix()
            .filter(PositionFix::is_valid)
            .or_else(|| self.last_fix.clone());
        match target {
            Some(fix) => {
                self.camera
                    .animate_to(fix.point, Some(self.config.locate_zoom), None, None);
                true
            }
            None => {
                tracing::debug!("Locate requested with no position available");
                false
            }
        }
    }

    /// Fit the camera to `points`. Dropped while following.
    pub fn frame_bounds(&mut self, points: &[GeoPoint], padding_px: u32) -> bool {
        if !self.accepts_one_shot("frame_bounds") {
            return false;
        }
        let valid: Vec<GeoPoint> = points.iter().copied().filter(GeoPoint::is_valid).collect();
        if valid.is_empty() {
            return false;
        }
        self.camera.fit_bounds(&valid, padding_px);
        true
    }

    /// Animate to `point` at `zoom`. Dropped while following.
    pub fn focus_on(&mut self, point: GeoPoint, zoom: f32) -> bool {
        if !self.accepts_one_shot("focus_on") || !point.is_valid() {
            return false;
        }
        self.camera.animate_to(point, Some(zoom), None, None);
        true
    }

    /// Step the zoom level.
    ///
    /// Honoured in every state, `Following` included: per-fix follow moves
    /// leave the zoom alone, so a step here sticks until the next nav-look.
    pub fn zoom_by(&mut self, delta: f32) {
        if !self.torn_down {
            self.camera.zoom_by(delta);
        }
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(-ZOOM_STEP);
    }

    pub fn set_layer(&mut self, layer: MapLayer) {
        if !self.torn_down {
            self.camera.set_layer(layer);
        }
    }

    /// Stop issuing camera commands for good.
    ///
    /// Idempotent. Cancels the resume timer and drops any pending follow.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.resume_timer.cancel();
        self.pending_follow = false;
        self.torn_down = true;
        tracing::info!(state = %self.state, "Follow controller torn down");
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn accepts_one_shot(&self, request: &'static str) -> bool {
        if self.torn_down {
            return false;
        }
        if self.state == FollowState::Following {
            tracing::debug!(request, "Dropping one-shot camera move while following");
            return false;
        }
        true
    }

    fn enter_following(&mut self) {
        self.resume_timer.cancel();
        self.transition(FollowState::Following);
        self.camera.set_style(CameraStyle::Navigation);

        match self.last_fix.clone() {
            Some(fix) => {
                self.camera.animate_to(
                    fix.point,
                    Some(self.config.nav_zoom),
                    Some(self.config.nav_tilt),
                    fix.bearing.map(|b| b as f32),
                );
                self.first_fix_centered = true;
            }
            None => tracing::debug!("Following without a fix, waiting for feed"),
        }
    }

    fn follow_fix(&mut self, fix: &PositionFix) {
        self.camera.animate_to(
            fix.point,
            None,
            Some(self.config.nav_tilt),
            fix.bearing.map(|b| b as f32),
        );
    }

    fn transition(&mut self, to: FollowState) {
        if self.state == to {
            return;
        }
        tracing::info!(from = %self.state, to = %to, "Follow state transition");
        self.state = to;
    }
}

impl FramingTarget for FollowController {
    fn frame_bounds(&mut self, points: &[GeoPoint], padding_px: u32) {
        FollowController::frame_bounds(self, points, padding_px);
    }

    fn focus_on(&mut self, point: GeoPoint, zoom: f32) {
        FollowController::focus_on(self, point, zoom);
    }
}

impl std::fmt::Debug for FollowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FollowController")
            .field("state", &self.state)
            .field("pending_follow", &self.pending_follow)
            .field("resume_deadline", &self.resume_timer.deadline())
            .field("torn_down", &self.torn_down)
            .finish()
    }
}

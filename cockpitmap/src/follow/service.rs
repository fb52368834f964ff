//! Async host for the follow controller.
//!
//! Runs one [`FollowController`] on a tokio task and feeds it from three
//! sources: the location feed, touch notifications from the map surface,
//! and commands from the business layer. The controller is only ever
//! touched from this task, which serialises all camera writes.
//!
//! ```text
//!   LocationFeed ──fixes──┐
//!   FollowHandle ─touch───┼──► select (biased) ──► tick ──► FollowController ──► CameraSurface
//!   FollowHandle ─cmds────┤                                      │
//!   resume deadline ──────┘                                      └──► watch<FollowStatus>
//! ```
//!
//! Every wake-up drains everything already queued and applies it as one
//! tick: touches first, then one-shot commands, then follow requests and
//! fixes in arrival order, then the timer.
//!
//! Teardown (via [`FollowHandle::shutdown`], a parent cancellation token,
//! or dropping every handle) cancels the resume timer, stops the feed,
//! closes the input channels and persists the last fix.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::camera::MapLayer;
use crate::feed::LocationFeed;
use crate::geo::{GeoPoint, PositionFix};
use crate::store::LastLocationStore;

use super::controller::FollowController;
use super::state::{FollowEvent, FollowStatus};
use super::FramingTarget;

/// Requests from the business layer.
#[derive(Debug, Clone, PartialEq)]
pub enum FollowCommand {
    SetFollowing(bool),
    LocateMe,
    FrameBounds {
        points: Vec<GeoPoint>,
        padding_px: u32,
    },
    FocusOn {
        point: GeoPoint,
        zoom: f32,
    },
    ZoomBy(f32),
    SetLayer(MapLayer),
}

/// Cloneable handle to a running [`FollowService`].
#[derive(Debug, Clone)]
pub struct FollowHandle {
    commands: mpsc::UnboundedSender<FollowCommand>,
    touches: mpsc::UnboundedSender<()>,
    status: watch::Receiver<FollowStatus>,
    shutdown: CancellationToken,
}

impl FollowHandle {
    /// Start or end navigation follow.
    pub fn set_following(&self, enabled: bool) -> bool {
        self.send(FollowCommand::SetFollowing(enabled))
    }

    /// Report a touch or drag on the map surface.
    ///
    /// Safe to call at high frequency; the service coalesces touches that
    /// arrive in the same tick.
    pub fn on_touch_detected(&self) -> bool {
        self.touches.send(()).is_ok()
    }

    pub fn locate_me(&self) -> bool {
        self.send(FollowCommand::LocateMe)
    }

    pub fn zoom_in(&self) -> bool {
        self.send(FollowCommand::ZoomBy(super::controller::ZOOM_STEP))
    }

    pub fn zoom_out(&self) -> bool {
        self.send(FollowCommand::ZoomBy(-super::controller::ZOOM_STEP))
    }

    pub fn set_layer(&self, layer: MapLayer) -> bool {
        self.send(FollowCommand::SetLayer(layer))
    }

    /// Send a raw command. Returns `false` once the service has stopped.
    pub fn send(&self, command: FollowCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Latest published status.
    pub fn status(&self) -> FollowStatus {
        self.status.borrow().clone()
    }

    /// A receiver that observes every status change.
    pub fn subscribe(&self) -> watch::Receiver<FollowStatus> {
        self.status.clone()
    }

    /// Ask the service to tear down.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled() && !self.commands.is_closed()
    }
}

impl FramingTarget for FollowHandle {
    fn frame_bounds(&mut self, points: &[GeoPoint], padding_px: u32) {
        self.send(FollowCommand::FrameBounds {
            points: points.to_vec(),
            padding_px,
        });
    }

    fn focus_on(&mut self, point: GeoPoint, zoom: f32) {
        self.send(FollowCommand::FocusOn { point, zoom });
    }
}

/// Builder for the follow task.
pub struct FollowService {
    controller: FollowController,
    feed: LocationFeed,
    store: Option<LastLocationStore>,
    shutdown: CancellationToken,
}

impl FollowService {
    pub fn new(controller: FollowController, feed: LocationFeed) -> Self {
        Self {
            controller,
            feed,
            store: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Restore from and persist to `store`.
    pub fn with_store(mut self, store: LastLocationStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Tear down when `parent` is cancelled.
    pub fn with_parent_token(mut self, parent: &CancellationToken) -> Self {
        self.shutdown = parent.child_token();
        self
    }

    /// Start the feed and spawn the service task.
    ///
    /// Must be called from within a tokio runtime. The join handle yields
    /// the torn-down controller.
    pub fn spawn(self) -> (FollowHandle, JoinHandle<FollowController>) {
        let FollowService {
            mut controller,
            mut feed,
            store,
            shutdown,
        } = self;

        if let Some(store) = &store {
            match store.load() {
                Ok(Some(point)) => {
                    controller.restore_last_known(point);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    path = %store.path().display(),
                    error = %e,
                    "Failed to load last known location"
                ),
            }
        }

        let (fix_tx, fix_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (touch_tx, touch_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(controller.status());

        feed.start(move |fix| {
            let _ = fix_tx.send(fix);
        });
        tracing::info!(
            providers = feed.active_providers(),
            "Follow service started"
        );

        let handle = FollowHandle {
            commands: command_tx,
            touches: touch_tx,
            status: status_rx,
            shutdown: shutdown.clone(),
        };

        let service_loop = ServiceLoop {
            controller,
            feed,
            store,
            fix_rx,
            command_rx,
            touch_rx,
            status_tx,
            shutdown,
        };
        let join = tokio::spawn(service_loop.run());

        (handle, join)
    }
}

/// Inputs that were ready at one wake-up.
#[derive(Debug, Default)]
struct Tick {
    touches: usize,
    one_shots: Vec<FollowCommand>,
    events: Vec<FollowEvent>,
    timer_fired: bool,
}

impl Tick {
    fn push_command(&mut self, command: FollowCommand) {
        match command {
            FollowCommand::SetFollowing(enabled) => {
                self.events.push(FollowEvent::FollowRequested(enabled))
            }
            other => self.one_shots.push(other),
        }
    }

    fn push_fix(&mut self, fix: PositionFix) {
        self.events.push(FollowEvent::FixReceived(fix));
    }
}

struct ServiceLoop {
    controller: FollowController,
    feed: LocationFeed,
    store: Option<LastLocationStore>,
    fix_rx: mpsc::UnboundedReceiver<PositionFix>,
    command_rx: mpsc::UnboundedReceiver<FollowCommand>,
    touch_rx: mpsc::UnboundedReceiver<()>,
    status_tx: watch::Sender<FollowStatus>,
    shutdown: CancellationToken,
}

impl ServiceLoop {
    async fn run(mut self) -> FollowController {
        let mut fixes_open = true;

        loop {
            self.publish_status();

            let deadline = self.controller.resume_deadline();
            let sleep_target =
                deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));
            let mut tick = Tick::default();

            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => break,

                touch = self.touch_rx.recv() => {
                    let Some(()) = touch else { break };
                    tick.touches += 1;
                }

                command = self.command_rx.recv() => {
                    let Some(command) = command else { break };
                    tick.push_command(command);
                }

                fix = self.fix_rx.recv(), if fixes_open => match fix {
                    Some(fix) => tick.push_fix(fix),
                    None => fixes_open = false,
                },

                _ = sleep_until(sleep_target), if deadline.is_some() => {
                    tick.timer_fired = true;
                }
            }

            self.drain_ready(&mut tick, fixes_open);
            self.apply(tick, Instant::now());
        }

        self.finish();
        self.controller
    }

    fn drain_ready(&mut self, tick: &mut Tick, fixes_open: bool) {
        while let Ok(()) = self.touch_rx.try_recv() {
            tick.touches += 1;
        }
        while let Ok(command) = self.command_rx.try_recv() {
            tick.push_command(command);
        }
        if fixes_open {
            while let Ok(fix) = self.fix_rx.try_recv() {
                tick.push_fix(fix);
            }
        }
    }

    fn apply(&mut self, tick: Tick, now: Instant) {
        if tick.touches > 0 {
            tracing::trace!(touches = tick.touches, "Applying touches");
            self.controller.on_touch_detected(now);
        }

        for command in tick.one_shots {
            self.apply_one_shot(command);
        }

        let mut events = tick.events;
        if tick.timer_fired {
            events.push(FollowEvent::ResumeTimerFired);
        }
        self.controller.handle_tick(events, now);
        // A wake-up for other input can land after the deadline.
        self.controller.poll_resume(now);
    }

    fn apply_one_shot(&mut self, command: FollowCommand) {
        match command {
            FollowCommand::SetFollowing(enabled) => self.controller.set_following(enabled),
            FollowCommand::LocateMe => {
                self.controller.locate_me();
            }
            FollowCommand::FrameBounds { points, padding_px } => {
                self.controller.frame_bounds(&points, padding_px);
            }
            FollowCommand::FocusOn { point, zoom } => {
                self.controller.focus_on(point, zoom);
            }
            FollowCommand::ZoomBy(delta) => self.controller.zoom_by(delta),
            FollowCommand::SetLayer(layer) => self.controller.set_layer(layer),
        }
    }

    fn publish_status(&self) {
        let status = self.controller.status();
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }

    fn finish(&mut self) {
        self.controller.teardown();
        self.feed.stop();
        self.touch_rx.close();
        self.command_rx.close();

        if let (Some(store), Some(fix)) = (&self.store, self.controller.last_fix()) {
            match store.save(fix) {
                Ok(true) => tracing::debug!(point = %fix.point, "Saved last known location"),
                Ok(false) => {}
                Err(e) => tracing::warn!(error = %e, "Failed to save last known location"),
            }
        }

        self.publish_status();
        tracing::info!("Follow service stopped");
    }
}

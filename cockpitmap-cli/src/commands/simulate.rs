//! `cockpitmap simulate`: replay a recorded drive.
//!
//! Fixes from the track file are pushed through a [`ChannelProvider`] into
//! the location feed and the follow service, on the schedule given by each
//! fix's `offset_ms`. Follow requests and touches are injected at the
//! requested times. Every camera command is logged.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use serde::Deserialize;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use cockpitmap::camera::{CameraStyle, CameraSurface, MapLayer};
use cockpitmap::config::ConfigFile;
use cockpitmap::feed::{ChannelProvider, LocationFeed};
use cockpitmap::follow::{FollowController, FollowHandle, FollowService};
use cockpitmap::geo::{FixSource, GeoPoint, PositionFix};
use cockpitmap::logging::{default_log_dir, default_log_file, init_logging};
use cockpitmap::store::LastLocationStore;

use crate::error::CliError;

/// Extra time after the last scripted action so a pending resume can fire.
const SETTLE_MARGIN: Duration = Duration::from_secs(1);

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// JSON array of fixes, each with an `offset_ms`
    #[arg(long)]
    pub track: PathBuf,

    /// Start following at this many seconds into the drive
    #[arg(long, value_name = "S")]
    pub follow_at: Option<f64>,

    /// Touch the map at this many seconds (repeatable)
    #[arg(long = "touch-at", value_name = "S")]
    pub touch_at: Vec<f64>,

    /// Stop following at this many seconds
    #[arg(long, value_name = "S")]
    pub unfollow_at: Option<f64>,

    /// Replay speed multiplier
    #[arg(long, default_value = "1.0")]
    pub speed: f64,

    /// Configuration file (default: ~/.cockpitmap/config.ini)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Do not read or write the last known location
    #[arg(long)]
    pub no_persist: bool,
}

/// One fix in a track file.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackPoint {
    pub offset_ms: u64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub bearing: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

impl TrackPoint {
    fn to_fix(&self) -> PositionFix {
        let mut fix = PositionFix::new(self.latitude, self.longitude)
            .with_source(FixSource::Replay)
            .with_timestamp_ms(self.offset_ms);
        fix.bearing = self.bearing;
        fix.accuracy = self.accuracy;
        fix
    }
}

/// A scripted step of the replay.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Fix(PositionFix),
    Touch,
    Follow(bool),
}

/// Read and sort a track file.
pub fn load_track(path: &Path) -> Result<Vec<TrackPoint>, CliError> {
    let track_error = |reason: String| CliError::TrackFile {
        path: path.to_path_buf(),
        reason,
    };
    let contents = fs::read_to_string(path).map_err(|e| track_error(e.to_string()))?;
    let mut points: Vec<TrackPoint> =
        serde_json::from_str(&contents).map_err(|e| track_error(e.to_string()))?;
    if points.is_empty() {
        return Err(track_error("track has no fixes".to_string()));
    }
    points.sort_by_key(|p| p.offset_ms);
    Ok(points)
}

/// Merge fixes and injected actions into one timeline, scaled by `speed`.
///
/// Actions at the same instant keep this order: fixes, follow changes,
/// touches.
pub fn build_script(
    track: &[TrackPoint],
    args: &SimulateArgs,
) -> Result<Vec<(Duration, Action)>, CliError> {
    if !(args.speed.is_finite() && args.speed > 0.0) {
        return Err(CliError::InvalidArgument(format!(
            "--speed must be positive, got {}",
            args.speed
        )));
    }
    let at = |seconds: f64, flag: &str| -> Result<Duration, CliError> {
        Duration::try_from_secs_f64(seconds / args.speed).map_err(|_| {
            CliError::InvalidArgument(format!("{flag} must be a non-negative time, got {seconds}"))
        })
    };

    let mut script = track
        .iter()
        .map(|p| {
            let seconds = Duration::from_millis(p.offset_ms).as_secs_f64();
            let offset = Duration::try_from_secs_f64(seconds / args.speed).map_err(|_| {
                CliError::InvalidArgument(format!(
                    "--speed {} puts the fix at {} ms out of range",
                    args.speed, p.offset_ms
                ))
            })?;
            Ok((offset, Action::Fix(p.to_fix())))
        })
        .collect::<Result<Vec<(Duration, Action)>, CliError>>()?;

    if let Some(s) = args.follow_at {
        script.push((at(s, "--follow-at")?, Action::Follow(true)));
    }
    if let Some(s) = args.unfollow_at {
        script.push((at(s, "--unfollow-at")?, Action::Follow(false)));
    }
    for &s in &args.touch_at {
        script.push((at(s, "--touch-at")?, Action::Touch));
    }

    script.sort_by_key(|(offset, _)| *offset);
    Ok(script)
}

/// Camera surface that logs every command.
#[derive(Debug, Default)]
pub struct TracingCamera {
    commands: usize,
}

impl TracingCamera {
    /// Sequence number for the next command.
    fn next_seq(&mut self) -> usize {
        self.commands += 1;
        self.commands
    }
}

impl CameraSurface for TracingCamera {
    fn move_instant(&mut self, point: GeoPoint, zoom: Option<f32>) {
        let seq = self.next_seq();
        tracing::info!(seq, %point, ?zoom, "camera: move_instant");
    }

    fn animate_to(
        &mut self,
        point: GeoPoint,
        zoom: Option<f32>,
        tilt: Option<f32>,
        bearing: Option<f32>,
    ) {
        let seq = self.next_seq();
        tracing::info!(seq, %point, ?zoom, ?tilt, ?bearing, "camera: animate_to");
    }

    fn set_tilt(&mut self, tilt: f32) {
        let seq = self.next_seq();
        tracing::info!(seq, tilt, "camera: set_tilt");
    }

    fn fit_bounds(&mut self, points: &[GeoPoint], padding_px: u32) {
        let seq = self.next_seq();
        tracing::info!(seq, points = points.len(), padding_px, "camera: fit_bounds");
    }

    fn set_style(&mut self, style: CameraStyle) {
        let seq = self.next_seq();
        tracing::info!(seq, %style, "camera: set_style");
    }

    fn zoom_by(&mut self, delta: f32) {
        let seq = self.next_seq();
        tracing::info!(seq, delta, "camera: zoom_by");
    }

    fn set_layer(&mut self, layer: MapLayer) {
        let seq = self.next_seq();
        tracing::info!(seq, layer = layer.sdk_type(), "camera: set_layer");
    }

    fn current_fix(&self) -> Option<PositionFix> {
        None
    }
}

pub fn run(args: SimulateArgs) -> Result<(), CliError> {
    let config = super::config::load(args.config.as_deref())?;
    let track = load_track(&args.track)?;
    let script = build_script(&track, &args)?;

    let _logging = init_logging(&default_log_dir(), default_log_file())
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    let cancel = CancellationToken::new();
    let ctrlc_token = cancel.clone();
    ctrlc::set_handler(move || ctrlc_token.cancel())
        .map_err(|e| CliError::Runtime(format!("Failed to set signal handler: {}", e)))?;

    let store = (!args.no_persist).then(|| LastLocationStore::new(&config.storage.last_location));

    runtime.block_on(replay(config, store, script, cancel))
}

async fn replay(
    config: ConfigFile,
    store: Option<LastLocationStore>,
    script: Vec<(Duration, Action)>,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let resume_delay = config.follow.resume_delay;
    let controller = FollowController::new(config.follow, TracingCamera::default());
    let (provider, fixes) = ChannelProvider::new("replay");
    let feed = LocationFeed::new(config.feed).with_provider(provider);

    let mut service = FollowService::new(controller, feed).with_parent_token(&cancel);
    if let Some(store) = store {
        service = service.with_store(store);
    }
    let (handle, join) = service.spawn();

    tracing::info!(steps = script.len(), "Replay started");
    let start = Instant::now();
    let mut end = start;

    for (offset, action) in script {
        end = start + offset;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Replay interrupted");
                break;
            }
            _ = sleep_until(end) => {}
        }
        apply(&handle, &fixes, action);
    }

    if !cancel.is_cancelled() {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = sleep_until(end + resume_delay + SETTLE_MARGIN) => {}
        }
    }

    handle.shutdown();
    let controller = join
        .await
        .map_err(|e| CliError::Runtime(format!("Follow service failed: {}", e)))?;

    let status = handle.status();
    println!();
    println!("Replay finished");
    println!("  Final state: {} ({})", status.state, status.state.description());
    match controller.last_fix() {
        Some(fix) => println!("  Last fix:    {}", fix.point),
        None => println!("  Last fix:    none"),
    }
    Ok(())
}

fn apply(
    handle: &FollowHandle,
    fixes: &tokio::sync::mpsc::UnboundedSender<PositionFix>,
    action: Action,
) {
    match action {
        Action::Fix(fix) => {
            if fixes.send(fix).is_err() {
                tracing::warn!("Replay provider closed, fix dropped");
            }
        }
        Action::Touch => {
            tracing::info!("Simulated touch");
            handle.on_touch_detected();
        }
        Action::Follow(enabled) => {
            tracing::info!(enabled, "Simulated follow request");
            handle.set_following(enabled);
        }
    }
}

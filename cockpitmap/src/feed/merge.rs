//! Provider merging and fix normalization.

use std::sync::Arc;

use parking_lot::Mutex;

use super::provider::{FixSink, LocationProvider};
use super::track::{TrackHistory, DEFAULT_MIN_TRACK_DISTANCE_M, DEFAULT_TRACK_WINDOW};
use crate::geo::{normalize_bearing, PositionFix};

type FixCallback = dyn Fn(PositionFix) + Send + Sync;

/// Tuning for the feed's normalization stage.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Positions kept for bearing derivation.
    pub track_window: usize,
    /// Minimum movement before a derived bearing is trusted (meters).
    pub min_track_distance_m: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            track_window: DEFAULT_TRACK_WINDOW,
            min_track_distance_m: DEFAULT_MIN_TRACK_DISTANCE_M,
        }
    }
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Fixes delivered to the subscriber.
    pub forwarded: u64,
    /// Zero-sentinel or out-of-range fixes dropped.
    pub rejected: u64,
    /// Same observation reported again (usually by a second provider).
    pub duplicates: u64,
}

#[derive(Default)]
struct MergeState {
    active_generation: Option<u64>,
    callback: Option<Arc<FixCallback>>,
    last_forwarded: Option<PositionFix>,
    track: TrackHistory,
    stats: FeedStats,
}

/// State shared between the feed and the sinks it hands out.
#[derive(Default)]
pub(crate) struct FeedShared {
    state: Mutex<MergeState>,
}

impl FeedShared {
    pub(super) fn is_current(&self, generation: u64) -> bool {
        self.state.lock().active_generation == Some(generation)
    }

    /// Normalize, de-duplicate and forward one raw fix.
    ///
    /// The subscriber is called outside the lock so it may call back into
    /// the feed.
    pub(super) fn dispatch(&self, generation: u64, raw: PositionFix) -> bool {
        let (callback, fix) = {
            let mut state = self.state.lock();
            if state.active_generation != Some(generation) {
                return false;
            }

            let Some(mut fix) = normalize(raw) else {
                state.stats.rejected += 1;
                tracing::trace!("Dropped invalid location fix");
                return false;
            };

            if let Some(last) = &state.last_forwarded {
                if last.point == fix.point && last.timestamp_ms == fix.timestamp_ms {
                    state.stats.duplicates += 1;
                    return false;
                }
            }

            state.track.record(fix.point);
            if fix.bearing.is_none() {
                fix.bearing = state.track.derived_bearing();
            }

            state.last_forwarded = Some(fix.clone());
            state.stats.forwarded += 1;

            match &state.callback {
                Some(callback) => (Arc::clone(callback), fix),
                None => return false,
            }
        };

        callback(fix);
        true
    }

    fn activate(&self, generation: u64, callback: Arc<FixCallback>, config: &FeedConfig) {
        let mut state = self.state.lock();
        state.active_generation = Some(generation);
        state.callback = Some(callback);
        state.last_forwarded = None;
        state.track = TrackHistory::new(config.track_window, config.min_track_distance_m);
    }

    fn deactivate(&self) {
        let mut state = self.state.lock();
        state.active_generation = None;
        state.callback = None;
    }

    fn stats(&self) -> FeedStats {
        self.state.lock().stats
    }

    fn last_forwarded(&self) -> Option<PositionFix> {
        self.state.lock().last_forwarded.clone()
    }
}

/// Validate and clean a raw fix. `None` means drop it.
pub(crate) fn normalize(mut fix: PositionFix) -> Option<PositionFix> {
    if !fix.is_valid() {
        return None;
    }
    fix.bearing = fix
        .bearing
        .filter(|b| b.is_finite())
        .map(normalize_bearing);
    fix.accuracy = fix.accuracy.filter(|a| a.is_finite() && *a >= 0.0);
    Some(fix)
}

/// Merges any number of providers into one last-fix-wins stream.
///
/// # Example
///
/// ```ignore
/// let (provider, tx) = ChannelProvider::new("gnss");
/// let mut feed = LocationFeed::new(FeedConfig::default()).with_provider(provider);
///
/// feed.start(move |fix| {
///     let _ = fixes_tx.send(fix);
/// });
/// // ...
/// feed.stop();
/// ```
pub struct LocationFeed {
    config: FeedConfig,
    providers: Vec<Box<dyn LocationProvider>>,
    /// Indexes of providers whose registration succeeded.
    registered: Vec<usize>,
    shared: Arc<FeedShared>,
    generation: u64,
    running: bool,
}

impl LocationFeed {
    /// Create a feed with no providers.
    pub fn new(config: FeedConfig) -> Self {
        Self {
            config,
            providers: Vec::new(),
            registered: Vec::new(),
            shared: Arc::new(FeedShared::default()),
            generation: 0,
            running: false,
        }
    }

    /// Add a provider (builder style).
    pub fn with_provider(mut self, provider: impl LocationProvider + 'static) -> Self {
        self.add_provider(Box::new(provider));
        self
    }

    /// Add a provider. Takes effect on the next `start`.
    pub fn add_provider(&mut self, provider: Box<dyn LocationProvider>) {
        self.providers.push(provider);
    }

    /// Register with every provider and deliver valid fixes to `callback`.
    ///
    /// Providers that fail to register are logged and skipped. Starting a
    /// running feed restarts it with the new callback.
    pub fn start<F>(&mut self, callback: F)
    where
        F: Fn(PositionFix) + Send + Sync + 'static,
    {
        if self.running {
            tracing::debug!("Location feed restarted");
            self.stop();
        }

        self.generation += 1;
        self.shared
            .activate(self.generation, Arc::new(callback), &self.config);

        for (index, provider) in self.providers.iter_mut().enumerate() {
            let sink = FixSink::new(Arc::clone(&self.shared), self.generation);
            match provider.register(sink) {
                Ok(()) => {
                    tracing::debug!(provider = provider.name(), "Location provider registered");
                    self.registered.push(index);
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "Location provider unavailable, continuing without it"
                    );
                }
            }
        }

        self.running = true;
        tracing::info!(
            active = self.registered.len(),
            configured = self.providers.len(),
            "Location feed started"
        );
    }

    /// Unregister from all providers. Safe to call any number of times.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }

        // Sinks go inert before providers are told, so late fixes are dropped
        self.shared.deactivate();

        for index in self.registered.drain(..) {
            if let Some(provider) = self.providers.get_mut(index) {
                provider.unregister();
            }
        }

        self.running = false;
        tracing::info!("Location feed stopped");
    }

    /// Whether `start` is in effect.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of providers currently delivering.
    pub fn active_providers(&self) -> usize {
        self.registered.len()
    }

    /// Number of configured providers.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// The newest fix delivered to the subscriber.
    pub fn last_fix(&self) -> Option<PositionFix> {
        self.shared.last_forwarded()
    }

    /// Diagnostic counters since construction.
    pub fn stats(&self) -> FeedStats {
        self.shared.stats()
    }
}

impl Drop for LocationFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for LocationFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationFeed")
            .field("config", &self.config)
            .field("providers", &self.providers.len())
            .field("registered", &self.registered)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ProviderError;
    use crate::geo::FixSource;

    /// Provider whose sink the test drives directly.
    #[derive(Default)]
    struct ManualProvider {
        sink: Arc<Mutex<Option<FixSink>>>,
        unregister_calls: Arc<Mutex<u32>>,
    }

    impl LocationProvider for ManualProvider {
        fn name(&self) -> &str {
            "manual"
        }

        fn register(&mut self, sink: FixSink) -> Result<(), ProviderError> {
            *self.sink.lock() = Some(sink);
            Ok(())
        }

        fn unregister(&mut self) {
            *self.unregister_calls.lock() += 1;
        }
    }

    struct BrokenProvider;

    impl LocationProvider for BrokenProvider {
        fn name(&self) -> &str {
            "broken"
        }

        fn register(&mut self, _sink: FixSink) -> Result<(), ProviderError> {
            Err(ProviderError::PermissionDenied)
        }

        fn unregister(&mut self) {
            panic!("unregister must not be called for a failed registration");
        }
    }

    fn collecting_feed() -> (
        LocationFeed,
        Arc<Mutex<Option<FixSink>>>,
        Arc<Mutex<u32>>,
        Arc<Mutex<Vec<PositionFix>>>,
    ) {
        let provider = ManualProvider::default();
        let sink = Arc::clone(&provider.sink);
        let unregisters = Arc::clone(&provider.unregister_calls);
        let mut feed = LocationFeed::new(FeedConfig::default()).with_provider(provider);

        let received = Arc::new(Mutex::new(Vec::new()));
        let out = Arc::clone(&received);
        feed.start(move |fix| out.lock().push(fix));

        (feed, sink, unregisters, received)
    }

    fn push(sink: &Arc<Mutex<Option<FixSink>>>, fix: PositionFix) -> bool {
        sink.lock().as_ref().unwrap().push(fix)
    }

    #[test]
    fn test_valid_fix_forwarded() {
        let (feed, sink, _, received) = collecting_feed();

        assert!(push(&sink, PositionFix::new(39.90, 116.40).with_bearing(0.0)));

        assert_eq!(received.lock().len(), 1);
        assert_eq!(feed.stats().forwarded, 1);
        assert_eq!(feed.last_fix().unwrap().point.latitude, 39.90);
    }

    #[test]
    fn test_zero_sentinel_never_forwarded() {
        let (feed, sink, _, received) = collecting_feed();

        assert!(!push(&sink, PositionFix::new(0.0, 0.0)));
        assert!(!push(&sink, PositionFix::new(95.0, 10.0)));
        assert!(!push(&sink, PositionFix::new(f64::NAN, 10.0)));

        assert!(received.lock().is_empty());
        assert_eq!(feed.stats().rejected, 3);
        assert!(feed.last_fix().is_none());
    }

    #[test]
    fn test_same_observation_from_two_providers_deduplicated() {
        let (feed, sink, _, received) = collecting_feed();
        let fix = PositionFix::new(39.90, 116.40).with_timestamp_ms(1_000);

        assert!(push(&sink, fix.clone().with_source(FixSource::PlatformGnss)));
        assert!(!push(&sink, fix.with_source(FixSource::SdkEngine)));

        assert_eq!(received.lock().len(), 1);
        assert_eq!(feed.stats().duplicates, 1);
    }

    #[test]
    fn test_bearing_and_accuracy_normalized() {
        let (_feed, sink, _, received) = collecting_feed();

        push(
            &sink,
            PositionFix::new(39.90, 116.40)
                .with_bearing(-10.0)
                .with_accuracy(-1.0),
        );

        let fix = received.lock()[0].clone();
        assert_eq!(fix.bearing, Some(350.0));
        assert_eq!(fix.accuracy, None);
    }

    #[test]
    fn test_missing_bearing_derived_from_track() {
        let (_feed, sink, _, received) = collecting_feed();

        push(&sink, PositionFix::new(39.900, 116.40).with_timestamp_ms(1));
        push(&sink, PositionFix::new(39.901, 116.40).with_timestamp_ms(2));

        let fixes = received.lock().clone();
        assert_eq!(fixes[0].bearing, None, "one sample cannot give a track");
        let derived = fixes[1].bearing.unwrap();
        assert!(derived < 1.0 || derived > 359.0, "got {}", derived);
    }

    #[test]
    fn test_reported_bearing_kept() {
        let (_feed, sink, _, received) = collecting_feed();

        push(&sink, PositionFix::new(39.900, 116.40).with_timestamp_ms(1));
        push(
            &sink,
            PositionFix::new(39.901, 116.40)
                .with_bearing(42.0)
                .with_timestamp_ms(2),
        );

        assert_eq!(received.lock()[1].bearing, Some(42.0));
    }

    #[test]
    fn test_failed_provider_does_not_block_others() {
        let good = ManualProvider::default();
        let sink = Arc::clone(&good.sink);
        let mut feed = LocationFeed::new(FeedConfig::default())
            .with_provider(BrokenProvider)
            .with_provider(good);

        let received = Arc::new(Mutex::new(Vec::new()));
        let out = Arc::clone(&received);
        feed.start(move |fix| out.lock().push(fix));

        assert!(feed.is_running());
        assert_eq!(feed.provider_count(), 2);
        assert_eq!(feed.active_providers(), 1);

        push(&sink, PositionFix::new(39.90, 116.40));
        assert_eq!(received.lock().len(), 1);

        // BrokenProvider::unregister panics if called
        feed.stop();
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (mut feed, _sink, unregisters, _) = collecting_feed();

        feed.stop();
        feed.stop();
        assert!(!feed.is_running());
        assert_eq!(*unregisters.lock(), 1);
    }

    #[test]
    fn test_stop_before_start_is_safe() {
        let mut feed = LocationFeed::new(FeedConfig::default()).with_provider(BrokenProvider);
        feed.stop();
        assert!(!feed.is_running());
    }

    #[test]
    fn test_sink_inert_after_stop() {
        let (mut feed, sink, _, received) = collecting_feed();
        let stale = sink.lock().clone().unwrap();

        feed.stop();

        assert!(!stale.is_live());
        assert!(!stale.push(PositionFix::new(39.90, 116.40)));
        assert!(received.lock().is_empty());
    }

    #[test]
    fn test_restart_invalidates_old_sinks() {
        let (mut feed, sink, _, _) = collecting_feed();
        let old = sink.lock().clone().unwrap();

        let second = Arc::new(Mutex::new(Vec::new()));
        let out = Arc::clone(&second);
        feed.start(move |fix| out.lock().push(fix));

        assert!(!old.push(PositionFix::new(39.90, 116.40)));
        assert!(push(&sink, PositionFix::new(39.90, 116.40)));
        assert_eq!(second.lock().len(), 1);
    }

    #[test]
    fn test_normalize_keeps_valid_fix() {
        let fix = PositionFix::new(0.0, 116.4).with_bearing(360.0);
        let normalized = normalize(fix).unwrap();
        assert_eq!(normalized.bearing, Some(0.0));
    }
}

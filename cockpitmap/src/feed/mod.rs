//! Location feed.
//!
//! Merges fixes from several location providers (the platform's GNSS and
//! network services, the map SDK's own engine, a recorded drive) into one
//! stream that consumers treat as last-fix-wins.
//!
//! # Pipeline
//!
//! ```text
//! Provider A ──┐
//!              ├──► FixSink ──► normalize ──► de-duplicate ──► bearing fill ──► callback
//! Provider B ──┘              (sentinel,      (same point      (TrackHistory)
//!                              range)          and time)
//! ```
//!
//! A provider that fails to register is logged and skipped; the feed never
//! fails because of one. `stop()` is idempotent and turns every outstanding
//! [`FixSink`] inert before providers are unregistered.

mod merge;
mod provider;
mod track;

pub use merge::{FeedConfig, FeedStats, LocationFeed};
pub use provider::{ChannelProvider, FixSink, LocationProvider, ProviderError};
pub use track::{TrackHistory, DEFAULT_MIN_TRACK_DISTANCE_M, DEFAULT_TRACK_WINDOW};

pub(crate) use merge::normalize;
